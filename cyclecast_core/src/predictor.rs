//! Cycle predictor: forecasts and statistics over a user's history.
//!
//! Every function here is a pure computation over the records it is given.
//! Histories must be ordered newest first. Sparse history is reported through
//! the `status` field of a forecast rather than as an error; only malformed
//! records produce `Error::InvalidInput`.
//!
//! ## Period forecast
//!
//! 1. Take at most `history_limit` records
//! 2. Average the gaps between adjacent period starts
//! 3. Add the rounded average to the newest start date
//! 4. Grade confidence from the gap standard deviation (needs 3 gaps)
//!
//! ## Ovulation forecast
//!
//! 1. Match each recent ovulation to the newest period starting on or before it
//! 2. Average the plausible offsets, or fall back to the default offset
//! 3. Project from the newest period start, rolling forward one cycle if
//!    that lands before `today`

use crate::config::PredictionParams;
use crate::stats::{self, average_cycle_length, cycle_lengths, regularity_of, round_tenth};
use crate::validate::{validate_ovulation_history, validate_period_history};
use crate::{
    Confidence, CycleStats, Error, FertileWindow, OvulationForecast, OvulationRecord,
    PeriodForecast, PeriodRecord, Result,
};
use chrono::{Duration, NaiveDate};

const NOT_ENOUGH_PERIODS: &str = "Not enough data to predict. Need at least 2 period records.";
const NO_PERIODS: &str = "No period data found. Need at least one period record.";

/// Forecast the start of the next period
pub fn predict_next_period(
    periods: &[PeriodRecord],
    params: &PredictionParams,
) -> Result<PeriodForecast> {
    validate_period_history(periods)?;
    let periods = recent(periods, params.history_limit);

    let (Some(last), Some(avg_cycle)) = (periods.first(), average_cycle_length(periods)) else {
        tracing::info!(
            "Period forecast skipped: {} record(s) available",
            periods.len()
        );
        return Ok(PeriodForecast {
            predicted_date: None,
            confidence: Confidence::Low,
            average_cycle_length: None,
            cycles_analyzed: 0,
            status: Some(NOT_ENOUGH_PERIODS.into()),
        });
    };

    let lengths = cycle_lengths(periods);
    tracing::debug!("Cycle lengths (newest first): {:?}", lengths);

    let predicted_date = add_days(last.start_date, avg_cycle)?;

    // A single gap still gives a usable estimate, just not a regularity grade.
    let confidence = regularity_of(&lengths, params)
        .map(|r| r.confidence())
        .unwrap_or(Confidence::Medium);

    Ok(PeriodForecast {
        predicted_date: Some(predicted_date),
        confidence,
        average_cycle_length: Some(round_tenth(avg_cycle)),
        cycles_analyzed: lengths.len(),
        status: None,
    })
}

/// Forecast the next ovulation relative to `today`
pub fn predict_next_ovulation(
    periods: &[PeriodRecord],
    ovulations: &[OvulationRecord],
    today: NaiveDate,
    params: &PredictionParams,
) -> Result<OvulationForecast> {
    validate_period_history(periods)?;
    validate_ovulation_history(ovulations)?;
    let periods = recent(periods, params.history_limit);
    let ovulations = recent(ovulations, params.history_limit);

    let Some(last) = periods.first() else {
        tracing::info!("Ovulation forecast skipped: no period records");
        return Ok(OvulationForecast {
            predicted_date: None,
            confidence: Confidence::Low,
            average_ovulation_day: None,
            ovulation_records_analyzed: 0,
            status: Some(NO_PERIODS.into()),
        });
    };

    let offsets = ovulation_offsets(periods, ovulations, params.max_ovulation_offset);
    tracing::debug!("Matched ovulation offsets: {:?}", offsets);

    let samples: Vec<f64> = offsets.iter().map(|&o| o as f64).collect();
    let (avg_offset, confidence) = match stats::mean(&samples) {
        Some(avg) if offsets.len() >= params.min_offsets_for_high => (avg, Confidence::High),
        Some(avg) => (avg, Confidence::Medium),
        None => (params.default_ovulation_offset as f64, Confidence::Low),
    };

    let mut predicted = add_days(last.start_date, avg_offset)?;

    if predicted < today {
        // With a single period there is no cycle length to roll forward by;
        // the stale date is returned as is.
        match average_cycle_length(periods) {
            Some(avg_cycle) => {
                let next_period = add_days(last.start_date, avg_cycle)?;
                predicted = add_days(next_period, avg_offset)?;
                tracing::debug!(
                    "Ovulation estimate was in the past, rolled forward to {}",
                    predicted
                );
            }
            None => {
                tracing::debug!(
                    "Ovulation estimate {} is before {} but only one period is recorded",
                    predicted,
                    today
                );
            }
        }
    }

    Ok(OvulationForecast {
        predicted_date: Some(predicted),
        confidence,
        average_ovulation_day: Some(round_tenth(avg_offset)),
        ovulation_records_analyzed: offsets.len(),
        status: None,
    })
}

/// Aggregate statistics over the full history
pub fn cycle_stats(
    periods: &[PeriodRecord],
    ovulations: &[OvulationRecord],
    params: &PredictionParams,
) -> Result<CycleStats> {
    validate_period_history(periods)?;

    let mut summary = CycleStats {
        total_periods: periods.len(),
        total_ovulations: ovulations.len(),
        ..CycleStats::default()
    };

    let lengths = cycle_lengths(periods);
    if let Some(avg) = average_cycle_length(periods) {
        summary.average_cycle_length = Some(round_tenth(avg));
        summary.cycle_regularity = regularity_of(&lengths, params);
        summary.shortest_cycle = lengths.iter().copied().min();
        summary.longest_cycle = lengths.iter().copied().max();
    }

    let period_lengths: Vec<f64> = periods
        .iter()
        .filter_map(PeriodRecord::length_days)
        .map(|l| l as f64)
        .collect();
    summary.average_period_length = stats::mean(&period_lengths).map(round_tenth);

    Ok(summary)
}

/// Offsets (in days) from period start to each ovulation that falls within
/// `[0, max_offset]` of the newest period starting on or before it.
///
/// Each ovulation is claimed by at most one period; one that lands too far
/// from its period is dropped rather than matched to an older period.
pub fn ovulation_offsets(
    periods: &[PeriodRecord],
    ovulations: &[OvulationRecord],
    max_offset: i64,
) -> Vec<i64> {
    ovulations
        .iter()
        .filter_map(|ovulation| {
            periods
                .iter()
                .find(|p| p.start_date <= ovulation.ovulation_date)
                .map(|p| (ovulation.ovulation_date - p.start_date).num_days())
        })
        .filter(|offset| (0..=max_offset).contains(offset))
        .collect()
}

/// Fertile window ending on the predicted ovulation day
pub fn fertile_window(
    forecast: &OvulationForecast,
    params: &PredictionParams,
) -> Option<FertileWindow> {
    let ovulation_day = forecast.predicted_date?;
    let lead = Duration::try_days(params.fertile_days_before_ovulation)?;
    let fertile_start = ovulation_day.checked_sub_signed(lead)?;
    Some(FertileWindow {
        fertile_start,
        fertile_end: ovulation_day,
        ovulation_day,
    })
}

/// Newest `limit` entries of a newest-first history
fn recent<T>(records: &[T], limit: usize) -> &[T] {
    &records[..records.len().min(limit)]
}

/// Shift a date by a fractional day count rounded to the nearest day
fn add_days(date: NaiveDate, days: f64) -> Result<NaiveDate> {
    let out_of_range =
        || Error::InvalidInput(format!("{} + {} days is out of range", date, days.round()));
    if !days.is_finite() {
        return Err(out_of_range());
    }
    Duration::try_days(days.round() as i64)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(out_of_range)
}
