//! CSV export and import of a user's records.
//!
//! Exports overwrite the target file and always carry a header row. Imports
//! build records for the importing user, keeping the exported `id` when the
//! row has one so the record book can recognise records it already holds.
//! Rows that fail to parse are logged and skipped.

use crate::records::RecordBook;
use crate::validate::{parse_date, validate_period};
use crate::{Error, OvulationRecord, PeriodRecord, Result};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use uuid::Uuid;

/// A period as a CSV row
#[derive(Debug, Serialize, Deserialize)]
struct PeriodRow {
    #[serde(default)]
    id: Option<String>,
    start_date: String,
    end_date: Option<String>,
    flow_intensity: Option<String>,
    symptoms: Option<String>,
}

impl From<&PeriodRecord> for PeriodRow {
    fn from(period: &PeriodRecord) -> Self {
        PeriodRow {
            id: Some(period.id.to_string()),
            start_date: period.start_date.to_string(),
            end_date: period.end_date.map(|d| d.to_string()),
            flow_intensity: period.flow_intensity.clone(),
            symptoms: period.symptoms.clone(),
        }
    }
}

impl PeriodRow {
    fn into_record(self, user_id: &str) -> Result<PeriodRecord> {
        let mut period = PeriodRecord::new(user_id, parse_date(&self.start_date)?);
        if let Some(id) = parse_row_id(self.id.as_deref())? {
            period.id = id;
        }
        period.end_date = self.end_date.as_deref().map(parse_date).transpose()?;
        period.flow_intensity = self.flow_intensity;
        period.symptoms = self.symptoms;
        validate_period(&period)?;
        Ok(period)
    }
}

/// An ovulation record as a CSV row
#[derive(Debug, Serialize, Deserialize)]
struct OvulationRow {
    #[serde(default)]
    id: Option<String>,
    ovulation_date: String,
    basal_body_temperature: Option<f64>,
    cervical_mucus: Option<String>,
    symptoms: Option<String>,
}

impl From<&OvulationRecord> for OvulationRow {
    fn from(ovulation: &OvulationRecord) -> Self {
        OvulationRow {
            id: Some(ovulation.id.to_string()),
            ovulation_date: ovulation.ovulation_date.to_string(),
            basal_body_temperature: ovulation.basal_body_temperature,
            cervical_mucus: ovulation.cervical_mucus.clone(),
            symptoms: ovulation.symptoms.clone(),
        }
    }
}

impl OvulationRow {
    fn into_record(self, user_id: &str) -> Result<OvulationRecord> {
        let mut ovulation = OvulationRecord::new(user_id, parse_date(&self.ovulation_date)?);
        if let Some(id) = parse_row_id(self.id.as_deref())? {
            ovulation.id = id;
        }
        ovulation.basal_body_temperature = self.basal_body_temperature;
        ovulation.cervical_mucus = self.cervical_mucus;
        ovulation.symptoms = self.symptoms;
        Ok(ovulation)
    }
}

/// Write a user's periods to CSV, newest first. Returns the row count.
pub fn export_periods(book: &RecordBook, user_id: &str, path: &Path) -> Result<usize> {
    let rows: Vec<PeriodRow> = book.periods_for(user_id).iter().map(PeriodRow::from).collect();
    write_rows(&rows, path)?;
    tracing::info!("Exported {} periods to {:?}", rows.len(), path);
    Ok(rows.len())
}

/// Write a user's ovulation records to CSV, newest first
pub fn export_ovulations(book: &RecordBook, user_id: &str, path: &Path) -> Result<usize> {
    let rows: Vec<OvulationRow> = book
        .ovulations_for(user_id)
        .iter()
        .map(OvulationRow::from)
        .collect();
    write_rows(&rows, path)?;
    tracing::info!("Exported {} ovulation records to {:?}", rows.len(), path);
    Ok(rows.len())
}

/// Read periods from CSV as new records owned by `user_id`
pub fn import_periods(path: &Path, user_id: &str) -> Result<Vec<PeriodRecord>> {
    let rows: Vec<PeriodRow> = read_rows(path)?;
    let periods: Vec<PeriodRecord> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(idx, row)| match row.into_record(user_id) {
            Ok(period) => Some(period),
            Err(e) => {
                tracing::warn!("Skipping period row {}: {}", idx + 1, e);
                None
            }
        })
        .collect();
    tracing::info!("Imported {} periods from {:?}", periods.len(), path);
    Ok(periods)
}

/// Read ovulation records from CSV as new records owned by `user_id`
pub fn import_ovulations(path: &Path, user_id: &str) -> Result<Vec<OvulationRecord>> {
    let rows: Vec<OvulationRow> = read_rows(path)?;
    let ovulations: Vec<OvulationRecord> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(idx, row)| match row.into_record(user_id) {
            Ok(ovulation) => Some(ovulation),
            Err(e) => {
                tracing::warn!("Skipping ovulation row {}: {}", idx + 1, e);
                None
            }
        })
        .collect();
    tracing::info!("Imported {} ovulation records from {:?}", ovulations.len(), path);
    Ok(ovulations)
}

fn parse_row_id(raw: Option<&str>) -> Result<Option<Uuid>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => Uuid::parse_str(raw)
            .map(Some)
            .map_err(|e| Error::InvalidInput(format!("Invalid record id '{}': {}", raw, e))),
    }
}

fn write_rows<R: Serialize>(rows: &[R], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;
    Ok(())
}

fn read_rows<R: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<R>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut rows = Vec::new();
    for (idx, result) in reader.deserialize::<R>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row {}: {}", idx + 1, e);
            }
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample_book() -> RecordBook {
        let mut book = RecordBook::default();
        let mut first = PeriodRecord::new("alice", date("2024-01-01")).with_end(date("2024-01-05"));
        first.flow_intensity = Some("medium".into());
        book.add_period(first).unwrap();
        book.add_period(PeriodRecord::new("alice", date("2024-01-29")))
            .unwrap();
        book.add_period(PeriodRecord::new("bob", date("2024-01-10")))
            .unwrap();

        let mut ovulation = OvulationRecord::new("alice", date("2024-01-14"));
        ovulation.basal_body_temperature = Some(36.6);
        ovulation.cervical_mucus = Some("egg-white".into());
        book.add_ovulation(ovulation).unwrap();
        book
    }

    #[test]
    fn test_export_only_includes_user() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("periods.csv");

        let count = export_periods(&sample_book(), "alice", &path).unwrap();
        assert_eq!(count, 2);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("id,start_date,end_date,flow_intensity,symptoms"));
        assert!(contents.contains("2024-01-29"));
        assert!(!contents.contains("2024-01-10"));
    }

    #[test]
    fn test_export_then_import_periods() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("periods.csv");
        export_periods(&sample_book(), "alice", &path).unwrap();

        let imported = import_periods(&path, "carol").unwrap();
        assert_eq!(imported.len(), 2);
        assert!(imported.iter().all(|p| p.user_id == "carol"));

        let closed = imported
            .iter()
            .find(|p| p.start_date == date("2024-01-01"))
            .unwrap();
        assert_eq!(closed.end_date, Some(date("2024-01-05")));
        assert_eq!(closed.flow_intensity.as_deref(), Some("medium"));

        let open = imported
            .iter()
            .find(|p| p.start_date == date("2024-01-29"))
            .unwrap();
        assert_eq!(open.end_date, None);
    }

    #[test]
    fn test_import_skips_bad_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("periods.csv");
        std::fs::write(
            &path,
            "start_date,end_date,flow_intensity,symptoms\n\
             2024-01-01,2024-01-04,light,\n\
             not-a-date,,,\n\
             2024-02-10,2024-02-01,,\n\
             2024-03-01,,,cramps\n",
        )
        .unwrap();

        let imported = import_periods(&path, "alice").unwrap();
        assert_eq!(imported.len(), 2);
        assert_eq!(imported[1].symptoms.as_deref(), Some("cramps"));
    }

    #[test]
    fn test_ovulation_export_and_import() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out").join("ovulations.csv");

        let count = export_ovulations(&sample_book(), "alice", &path).unwrap();
        assert_eq!(count, 1);

        let imported = import_ovulations(&path, "alice").unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].ovulation_date, date("2024-01-14"));
        assert_eq!(imported[0].basal_body_temperature, Some(36.6));
        assert_eq!(imported[0].cervical_mucus.as_deref(), Some("egg-white"));
    }

    #[test]
    fn test_import_keeps_exported_ids() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("periods.csv");
        let book = sample_book();
        export_periods(&book, "alice", &path).unwrap();

        let imported = import_periods(&path, "alice").unwrap();
        let mut ids: Vec<Uuid> = imported.iter().map(|p| p.id).collect();
        let mut expected: Vec<Uuid> = book.periods_for("alice").iter().map(|p| p.id).collect();
        ids.sort();
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_import_skips_malformed_id() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("ovulations.csv");
        std::fs::write(
            &path,
            "id,ovulation_date,basal_body_temperature,cervical_mucus,symptoms\n\
             not-a-uuid,2024-01-14,,,\n\
             ,2024-02-11,36.5,,\n",
        )
        .unwrap();

        let imported = import_ovulations(&path, "alice").unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].ovulation_date, date("2024-02-11"));
    }
}
