use std::io::Write;
use std::path::Path;

use chrono::{NaiveDateTime, NaiveTime};

use super::filter::FilteredView;
use super::model::columns;
use crate::error::ExportError;

pub const DEFAULT_EXPORT_NAME: &str = "filtered_marine_pollution.csv";

/// Columns written by the export, in order.
pub const EXPORT_COLUMNS: [&str; 6] = [
    columns::COUNTRY,
    columns::INC_DATE,
    columns::POLLUTION_TYPE,
    columns::MATERIAL,
    columns::LATITUDE,
    columns::LONGITUDE,
];

/// Date-only when the time is midnight, full timestamp otherwise.
pub fn format_incident_date(dt: &NaiveDateTime) -> String {
    if dt.time() == NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Write the filtered view as UTF-8 CSV with a header row.
pub fn write_csv<W: Write>(view: &FilteredView, writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(EXPORT_COLUMNS)?;
    for rec in view.records() {
        let date = rec
            .incident_date
            .as_ref()
            .map(format_incident_date)
            .unwrap_or_default();
        wtr.write_record([
            rec.country.as_deref().unwrap_or(""),
            date.as_str(),
            rec.pollution_type.as_str(),
            rec.material.as_deref().unwrap_or(""),
            rec.latitude.to_string().as_str(),
            rec.longitude.to_string().as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Export to a file, replacing it if present.
pub fn export_csv(view: &FilteredView, path: &Path) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    write_csv(view, std::io::BufWriter::new(file))?;
    log::info!("Exported {} incidents to {}", view.len(), path.display());
    Ok(())
}
