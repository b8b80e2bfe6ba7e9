//! Small statistics helpers used by the predictor.

use crate::config::PredictionParams;
use crate::{PeriodRecord, Regularity};

/// Arithmetic mean; `None` for an empty sample
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); needs at least two values
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let variance =
        values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Round to one decimal place for reporting
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Day gaps between adjacent period starts of a newest-first history.
///
/// N records yield N - 1 lengths.
pub fn cycle_lengths(periods: &[PeriodRecord]) -> Vec<i64> {
    periods
        .windows(2)
        .map(|w| (w[0].start_date - w[1].start_date).num_days())
        .collect()
}

/// Mean cycle length at full precision; needs at least two periods
pub fn average_cycle_length(periods: &[PeriodRecord]) -> Option<f64> {
    let lengths: Vec<f64> = cycle_lengths(periods).into_iter().map(|l| l as f64).collect();
    mean(&lengths)
}

/// Classify variability from the standard deviation of cycle lengths
pub fn classify_regularity(std_dev: f64, params: &PredictionParams) -> Regularity {
    if std_dev <= params.high_confidence_stdev {
        Regularity::VeryRegular
    } else if std_dev <= params.medium_confidence_stdev {
        Regularity::Regular
    } else {
        Regularity::Irregular
    }
}

/// Regularity of a set of cycle lengths, or `None` when the sample is
/// smaller than three lengths
pub fn regularity_of(lengths: &[i64], params: &PredictionParams) -> Option<Regularity> {
    if lengths.len() < 3 {
        return None;
    }
    let values: Vec<f64> = lengths.iter().map(|&l| l as f64).collect();
    sample_std_dev(&values).map(|sd| classify_regularity(sd, params))
}
