pub mod climate;

pub use climate::*;
