//! Input validation shared by the record book and the predictor.
//!
//! The record book rejects bad records before they are stored; the predictor
//! runs the same checks on entry and fails fast instead of deriving a
//! nonsensical date.

use crate::{Error, OvulationRecord, PeriodRecord, Result};
use chrono::NaiveDate;

/// Wire format for calendar dates
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT).map_err(|e| {
        Error::InvalidInput(format!(
            "Invalid date format '{}': {}. Use YYYY-MM-DD",
            input, e
        ))
    })
}

/// Check the period invariant `end_date >= start_date`
pub fn validate_period(period: &PeriodRecord) -> Result<()> {
    match period.end_date {
        Some(end) if end < period.start_date => Err(Error::InvalidInput(format!(
            "Period {} ends ({}) before it starts ({})",
            period.id, end, period.start_date
        ))),
        _ => Ok(()),
    }
}

/// Check that dates are sorted newest first (ties allowed)
pub fn ensure_newest_first<I>(dates: I, what: &str) -> Result<()>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let mut previous: Option<NaiveDate> = None;
    for date in dates {
        if let Some(prev) = previous {
            if date > prev {
                return Err(Error::InvalidInput(format!(
                    "{} must be ordered newest first ({} follows {})",
                    what, date, prev
                )));
            }
        }
        previous = Some(date);
    }
    Ok(())
}

/// Validate a period history as handed to the predictor
pub fn validate_period_history(periods: &[PeriodRecord]) -> Result<()> {
    for period in periods {
        validate_period(period)?;
    }
    ensure_newest_first(periods.iter().map(|p| p.start_date), "period records")
}

/// Validate an ovulation history as handed to the predictor
pub fn validate_ovulation_history(ovulations: &[OvulationRecord]) -> Result<()> {
    ensure_newest_first(
        ovulations.iter().map(|o| o.ovulation_date),
        "ovulation records",
    )
}
