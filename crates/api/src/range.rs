use time::{format_description::FormatItem, macros::format_description, Date};

/// Strict `YYYY-MM-DD`; anything else is rejected before reaching the data layer.
pub const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// A validated, ordered query window. Both bounds are inclusive and
/// `start <= end` always holds after [`normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

/// Earliest and latest observation dates in the dataset, derived per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetBounds {
    pub first_date: Date,
    pub last_date: Date,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("'{0}' is not a valid date, please use the format YYYY-MM-DD")]
    InvalidDateFormat(String),
    #[error("date {date} is above the dataset limit, last date: {last_date}")]
    AboveUpperBound { date: Date, last_date: Date },
    #[error("date {date} is below the dataset limit, initial date: {first_date}")]
    BelowLowerBound { date: Date, first_date: Date },
}

pub fn parse_date(raw: &str) -> Result<Date, RangeError> {
    Date::parse(raw, DATE_FORMAT).map_err(|_| RangeError::InvalidDateFormat(raw.to_string()))
}

/// Normalizes parsed dates into a query window inside the dataset bounds.
///
/// A missing end defaults to the newest data. When both dates are supplied
/// the range is treated as directionless input and out-of-order bounds are
/// swapped rather than rejected. A range that falls outside the bounds is an
/// error, never clamped.
pub fn normalize(
    start: Date,
    end: Option<Date>,
    bounds: DatasetBounds,
) -> Result<DateRange, RangeError> {
    let supplied_end = end.is_some();
    let end = end.unwrap_or(bounds.last_date);

    // Swap only applies to the two-argument path
    let (start, end) = if supplied_end && start > end {
        (end, start)
    } else {
        (start, end)
    };

    if end > bounds.last_date {
        return Err(RangeError::AboveUpperBound {
            date: end,
            last_date: bounds.last_date,
        });
    }
    if start < bounds.first_date {
        return Err(RangeError::BelowLowerBound {
            date: start,
            first_date: bounds.first_date,
        });
    }
    if start > end {
        // Single-argument path with a start past the newest observation
        return Err(RangeError::AboveUpperBound {
            date: start,
            last_date: bounds.last_date,
        });
    }

    Ok(DateRange { start, end })
}
