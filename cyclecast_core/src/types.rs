//! Core domain types for the cycle tracking system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Period and ovulation records (owned by the record book)
//! - Partial updates applied to stored records
//! - Forecasts and statistics derived by the predictor

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Record Types
// ============================================================================

/// Vocabulary accepted for `cervical_mucus` at the CLI boundary.
///
/// The core stores whatever label it is given.
pub const CERVICAL_MUCUS_VALUES: &[&str] = &["dry", "sticky", "creamy", "watery", "egg-white"];

/// A recorded period. An absent `end_date` marks a period still in progress.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PeriodRecord {
    pub id: Uuid,
    pub user_id: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub flow_intensity: Option<String>,
    pub symptoms: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PeriodRecord {
    /// Create an open period starting on `start_date`
    pub fn new(user_id: impl Into<String>, start_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            start_date,
            end_date: None,
            flow_intensity: None,
            symptoms: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_end(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Inclusive length in days, if the period has ended
    pub fn length_days(&self) -> Option<i64> {
        self.end_date.map(|end| (end - self.start_date).num_days() + 1)
    }
}

/// A recorded ovulation marker
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OvulationRecord {
    pub id: Uuid,
    pub user_id: String,
    pub ovulation_date: NaiveDate,
    pub basal_body_temperature: Option<f64>,
    pub cervical_mucus: Option<String>,
    pub symptoms: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OvulationRecord {
    pub fn new(user_id: impl Into<String>, ovulation_date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            ovulation_date,
            basal_body_temperature: None,
            cervical_mucus: None,
            symptoms: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a stored period. `None` leaves a field untouched.
///
/// For optional fields `Some(None)` clears the stored value; on `end_date`
/// that reopens the period.
#[derive(Clone, Debug, Default)]
pub struct PeriodUpdate {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub flow_intensity: Option<Option<String>>,
    pub symptoms: Option<Option<String>>,
}

/// Partial update for a stored ovulation record, same conventions as
/// [`PeriodUpdate`]
#[derive(Clone, Debug, Default)]
pub struct OvulationUpdate {
    pub ovulation_date: Option<NaiveDate>,
    pub basal_body_temperature: Option<Option<f64>>,
    pub cervical_mucus: Option<Option<String>>,
    pub symptoms: Option<Option<String>>,
}

// ============================================================================
// Derived Types
// ============================================================================

/// Coarse label for how much a forecast can be trusted
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        };
        f.write_str(label)
    }
}

/// Cycle-length variability class
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Regularity {
    #[serde(rename = "very regular")]
    VeryRegular,
    #[serde(rename = "regular")]
    Regular,
    #[serde(rename = "irregular")]
    Irregular,
}

impl Regularity {
    /// Confidence a period forecast earns from this regularity
    pub fn confidence(self) -> Confidence {
        match self {
            Regularity::VeryRegular => Confidence::High,
            Regularity::Regular => Confidence::Medium,
            Regularity::Irregular => Confidence::Low,
        }
    }
}

impl fmt::Display for Regularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Regularity::VeryRegular => "very regular",
            Regularity::Regular => "regular",
            Regularity::Irregular => "irregular",
        };
        f.write_str(label)
    }
}

/// Forecast of the next period start
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PeriodForecast {
    pub predicted_date: Option<NaiveDate>,
    pub confidence: Confidence,
    /// Mean cycle length rounded to one decimal
    pub average_cycle_length: Option<f64>,
    pub cycles_analyzed: usize,
    /// Explains why no date could be produced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Forecast of the next ovulation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OvulationForecast {
    pub predicted_date: Option<NaiveDate>,
    pub confidence: Confidence,
    /// Mean offset from period start in days, rounded to one decimal
    pub average_ovulation_day: Option<f64>,
    pub ovulation_records_analyzed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Estimated fertile days leading up to a predicted ovulation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FertileWindow {
    pub fertile_start: NaiveDate,
    pub fertile_end: NaiveDate,
    pub ovulation_day: NaiveDate,
}

/// Aggregate statistics over a user's full history
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct CycleStats {
    pub total_periods: usize,
    pub total_ovulations: usize,
    pub average_cycle_length: Option<f64>,
    pub cycle_regularity: Option<Regularity>,
    pub average_period_length: Option<f64>,
    pub shortest_cycle: Option<i64>,
    pub longest_cycle: Option<i64>,
}
