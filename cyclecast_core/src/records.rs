//! Record book: per-user period and ovulation records.
//!
//! This is the collaborator that feeds the predictor. It validates records on
//! the way in and hands them back ordered newest first.

use crate::validate::validate_period;
use crate::{Error, OvulationRecord, OvulationUpdate, PeriodRecord, PeriodUpdate, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use uuid::Uuid;

/// All stored records, across users
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct RecordBook {
    #[serde(default)]
    pub periods: Vec<PeriodRecord>,
    #[serde(default)]
    pub ovulations: Vec<OvulationRecord>,
}

impl RecordBook {
    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// A user's periods, newest start date first
    pub fn periods_for(&self, user_id: &str) -> Vec<PeriodRecord> {
        let mut periods: Vec<PeriodRecord> = self
            .periods
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        periods.sort_by_key(|p| (Reverse(p.start_date), Reverse(p.created_at)));
        periods
    }

    /// A user's `limit` most recent periods
    pub fn recent_periods(&self, user_id: &str, limit: usize) -> Vec<PeriodRecord> {
        let mut periods = self.periods_for(user_id);
        periods.truncate(limit);
        periods
    }

    /// A user's ovulation records, newest first
    pub fn ovulations_for(&self, user_id: &str) -> Vec<OvulationRecord> {
        let mut ovulations: Vec<OvulationRecord> = self
            .ovulations
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        ovulations.sort_by_key(|o| (Reverse(o.ovulation_date), Reverse(o.created_at)));
        ovulations
    }

    pub fn recent_ovulations(&self, user_id: &str, limit: usize) -> Vec<OvulationRecord> {
        let mut ovulations = self.ovulations_for(user_id);
        ovulations.truncate(limit);
        ovulations
    }

    // ------------------------------------------------------------------------
    // Periods
    // ------------------------------------------------------------------------

    pub fn add_period(&mut self, period: PeriodRecord) -> Result<()> {
        validate_period(&period)?;
        tracing::debug!("Adding period {} for user {}", period.id, period.user_id);
        self.periods.push(period);
        Ok(())
    }

    pub fn period(&self, user_id: &str, id: Uuid) -> Result<&PeriodRecord> {
        self.periods
            .iter()
            .find(|p| p.id == id && p.user_id == user_id)
            .ok_or_else(|| Error::NotFound(format!("period {}", id)))
    }

    /// Apply a partial update; the result must still satisfy the period invariant
    pub fn update_period(
        &mut self,
        user_id: &str,
        id: Uuid,
        update: PeriodUpdate,
    ) -> Result<PeriodRecord> {
        let period = self
            .periods
            .iter_mut()
            .find(|p| p.id == id && p.user_id == user_id)
            .ok_or_else(|| Error::NotFound(format!("period {}", id)))?;

        let mut updated = period.clone();
        if let Some(start) = update.start_date {
            updated.start_date = start;
        }
        if let Some(end) = update.end_date {
            updated.end_date = end;
        }
        if let Some(flow) = update.flow_intensity {
            updated.flow_intensity = flow;
        }
        if let Some(symptoms) = update.symptoms {
            updated.symptoms = symptoms;
        }
        validate_period(&updated)?;
        updated.updated_at = Utc::now();

        *period = updated.clone();
        Ok(updated)
    }

    /// Add imported periods, skipping any this user already holds by id.
    /// Returns how many were added.
    pub fn merge_periods(&mut self, periods: Vec<PeriodRecord>) -> Result<usize> {
        let mut added = 0;
        for mut period in periods {
            if let Some(existing) = self.periods.iter().find(|p| p.id == period.id) {
                if existing.user_id == period.user_id {
                    tracing::debug!("Skipping period {}: already recorded", period.id);
                    continue;
                }
                period.id = Uuid::new_v4();
            }
            self.add_period(period)?;
            added += 1;
        }
        Ok(added)
    }

    pub fn remove_period(&mut self, user_id: &str, id: Uuid) -> Result<PeriodRecord> {
        let idx = self
            .periods
            .iter()
            .position(|p| p.id == id && p.user_id == user_id)
            .ok_or_else(|| Error::NotFound(format!("period {}", id)))?;
        Ok(self.periods.remove(idx))
    }

    // ------------------------------------------------------------------------
    // Ovulations
    // ------------------------------------------------------------------------

    pub fn add_ovulation(&mut self, ovulation: OvulationRecord) -> Result<()> {
        tracing::debug!(
            "Adding ovulation {} for user {}",
            ovulation.id,
            ovulation.user_id
        );
        self.ovulations.push(ovulation);
        Ok(())
    }

    pub fn ovulation(&self, user_id: &str, id: Uuid) -> Result<&OvulationRecord> {
        self.ovulations
            .iter()
            .find(|o| o.id == id && o.user_id == user_id)
            .ok_or_else(|| Error::NotFound(format!("ovulation record {}", id)))
    }

    pub fn update_ovulation(
        &mut self,
        user_id: &str,
        id: Uuid,
        update: OvulationUpdate,
    ) -> Result<OvulationRecord> {
        let ovulation = self
            .ovulations
            .iter_mut()
            .find(|o| o.id == id && o.user_id == user_id)
            .ok_or_else(|| Error::NotFound(format!("ovulation record {}", id)))?;

        if let Some(date) = update.ovulation_date {
            ovulation.ovulation_date = date;
        }
        if let Some(temperature) = update.basal_body_temperature {
            ovulation.basal_body_temperature = temperature;
        }
        if let Some(mucus) = update.cervical_mucus {
            ovulation.cervical_mucus = mucus;
        }
        if let Some(symptoms) = update.symptoms {
            ovulation.symptoms = symptoms;
        }
        ovulation.updated_at = Utc::now();

        Ok(ovulation.clone())
    }

    /// Add imported ovulation records, skipping any this user already holds
    pub fn merge_ovulations(&mut self, ovulations: Vec<OvulationRecord>) -> Result<usize> {
        let mut added = 0;
        for mut ovulation in ovulations {
            if let Some(existing) = self.ovulations.iter().find(|o| o.id == ovulation.id) {
                if existing.user_id == ovulation.user_id {
                    tracing::debug!("Skipping ovulation {}: already recorded", ovulation.id);
                    continue;
                }
                ovulation.id = Uuid::new_v4();
            }
            self.add_ovulation(ovulation)?;
            added += 1;
        }
        Ok(added)
    }

    pub fn remove_ovulation(&mut self, user_id: &str, id: Uuid) -> Result<OvulationRecord> {
        let idx = self
            .ovulations
            .iter()
            .position(|o| o.id == id && o.user_id == user_id)
            .ok_or_else(|| Error::NotFound(format!("ovulation record {}", id)))?;
        Ok(self.ovulations.remove(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn book_with_periods(user: &str, starts: &[&str]) -> RecordBook {
        let mut book = RecordBook::default();
        for start in starts {
            book.add_period(PeriodRecord::new(user, date(start))).unwrap();
        }
        book
    }

    #[test]
    fn test_periods_sorted_newest_first() {
        let book = book_with_periods("alice", &["2024-01-01", "2024-02-26", "2024-01-29"]);

        let starts: Vec<NaiveDate> = book
            .periods_for("alice")
            .iter()
            .map(|p| p.start_date)
            .collect();
        assert_eq!(
            starts,
            vec![date("2024-02-26"), date("2024-01-29"), date("2024-01-01")]
        );
    }

    #[test]
    fn test_recent_periods_capped() {
        let book = book_with_periods(
            "alice",
            &["2024-01-01", "2024-02-01", "2024-03-01", "2024-04-01"],
        );

        let recent = book.recent_periods("alice", 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].start_date, date("2024-04-01"));
        assert_eq!(recent[1].start_date, date("2024-03-01"));
    }

    #[test]
    fn test_users_are_isolated() {
        let mut book = book_with_periods("alice", &["2024-01-01"]);
        let bob_period = PeriodRecord::new("bob", date("2024-01-05"));
        let bob_id = bob_period.id;
        book.add_period(bob_period).unwrap();

        assert_eq!(book.periods_for("alice").len(), 1);
        assert_eq!(book.periods_for("bob").len(), 1);
        assert!(matches!(book.period("alice", bob_id), Err(Error::NotFound(_))));
        assert!(book.remove_period("alice", bob_id).is_err());
        assert_eq!(book.periods.len(), 2);
    }

    #[test]
    fn test_invalid_period_rejected() {
        let mut book = RecordBook::default();
        let period = PeriodRecord::new("alice", date("2024-01-10")).with_end(date("2024-01-01"));

        assert!(matches!(book.add_period(period), Err(Error::InvalidInput(_))));
        assert!(book.periods.is_empty());
    }

    #[test]
    fn test_update_period_fields() {
        let mut book = book_with_periods("alice", &["2024-01-01"]);
        let id = book.periods[0].id;

        let updated = book
            .update_period(
                "alice",
                id,
                PeriodUpdate {
                    end_date: Some(Some(date("2024-01-05"))),
                    flow_intensity: Some(Some("heavy".into())),
                    ..PeriodUpdate::default()
                },
            )
            .unwrap();

        assert_eq!(updated.end_date, Some(date("2024-01-05")));
        assert_eq!(updated.flow_intensity.as_deref(), Some("heavy"));
        assert_eq!(book.period("alice", id).unwrap().length_days(), Some(5));

        // Clearing the end date reopens the period
        book.update_period(
            "alice",
            id,
            PeriodUpdate {
                end_date: Some(None),
                ..PeriodUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(book.period("alice", id).unwrap().end_date, None);
    }

    #[test]
    fn test_rejected_update_leaves_record_untouched() {
        let mut book = RecordBook::default();
        let period = PeriodRecord::new("alice", date("2024-01-01")).with_end(date("2024-01-05"));
        let id = period.id;
        book.add_period(period).unwrap();

        let result = book.update_period(
            "alice",
            id,
            PeriodUpdate {
                start_date: Some(date("2024-01-09")),
                ..PeriodUpdate::default()
            },
        );

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(book.period("alice", id).unwrap().start_date, date("2024-01-01"));
    }

    #[test]
    fn test_ovulation_crud() {
        let mut book = RecordBook::default();
        let mut record = OvulationRecord::new("alice", date("2024-01-14"));
        record.cervical_mucus = Some("egg-white".into());
        let id = record.id;
        book.add_ovulation(record).unwrap();
        book.add_ovulation(OvulationRecord::new("alice", date("2024-02-11")))
            .unwrap();

        let listed = book.ovulations_for("alice");
        assert_eq!(listed[0].ovulation_date, date("2024-02-11"));
        assert_eq!(book.recent_ovulations("alice", 1).len(), 1);

        let updated = book
            .update_ovulation(
                "alice",
                id,
                OvulationUpdate {
                    basal_body_temperature: Some(Some(36.7)),
                    ..OvulationUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.basal_body_temperature, Some(36.7));
        assert_eq!(updated.cervical_mucus.as_deref(), Some("egg-white"));

        let removed = book.remove_ovulation("alice", id).unwrap();
        assert_eq!(removed.id, id);
        assert!(matches!(book.ovulation("alice", id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_update_clears_optional_fields() {
        let mut book = RecordBook::default();
        let mut period = PeriodRecord::new("alice", date("2024-01-01"));
        period.flow_intensity = Some("heavy".into());
        period.symptoms = Some("cramps".into());
        let period_id = period.id;
        book.add_period(period).unwrap();

        let cleared = book
            .update_period(
                "alice",
                period_id,
                PeriodUpdate {
                    flow_intensity: Some(None),
                    ..PeriodUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(cleared.flow_intensity, None);
        assert_eq!(cleared.symptoms.as_deref(), Some("cramps"));

        let mut ovulation = OvulationRecord::new("alice", date("2024-01-14"));
        ovulation.basal_body_temperature = Some(36.6);
        ovulation.cervical_mucus = Some("watery".into());
        let ovulation_id = ovulation.id;
        book.add_ovulation(ovulation).unwrap();

        let cleared = book
            .update_ovulation(
                "alice",
                ovulation_id,
                OvulationUpdate {
                    basal_body_temperature: Some(None),
                    cervical_mucus: Some(None),
                    ..OvulationUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(cleared.basal_body_temperature, None);
        assert_eq!(cleared.cervical_mucus, None);
        assert_eq!(book.ovulation("alice", ovulation_id).unwrap().cervical_mucus, None);
    }

    #[test]
    fn test_merge_skips_records_already_held() {
        let mut book = book_with_periods("alice", &["2024-01-01", "2024-01-29"]);
        let mut reimport = book.periods_for("alice");
        reimport.push(PeriodRecord::new("alice", date("2024-02-26")));

        assert_eq!(book.merge_periods(reimport.clone()).unwrap(), 1);
        assert_eq!(book.periods_for("alice").len(), 3);

        // Same ids under another user become new records
        let for_bob: Vec<PeriodRecord> = reimport
            .into_iter()
            .map(|mut p| {
                p.user_id = "bob".into();
                p
            })
            .collect();
        assert_eq!(book.merge_periods(for_bob).unwrap(), 3);
        assert_eq!(book.periods_for("bob").len(), 3);
        assert_eq!(book.periods.len(), 6);

        let ovulation = OvulationRecord::new("alice", date("2024-01-14"));
        assert_eq!(book.merge_ovulations(vec![ovulation.clone()]).unwrap(), 1);
        assert_eq!(book.merge_ovulations(vec![ovulation]).unwrap(), 0);
        assert_eq!(book.ovulations_for("alice").len(), 1);
    }
}
