use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

/// Source column names.
pub mod columns {
    pub const INC_DATE: &str = "inc_date";
    pub const POLLUTION_QTY: &str = "pollution_qty";
    pub const LATITUDE: &str = "LAT_1";
    pub const LONGITUDE: &str = "LONG";
    pub const COUNTRY: &str = "Country";
    pub const POLLUTION_TYPE: &str = "pollution_type";
    pub const MATERIAL: &str = "material";
    pub const AWARE_ANS: &str = "aware_ans";
}

// ---------------------------------------------------------------------------
// CellValue – a single cell as read from the source file
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring what spreadsheet readers hand back.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Null,
}

static NULL_CELL: CellValue = CellValue::Null;

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::DateTime(d) => write!(f, "{}", d.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    /// Lenient numeric view: numbers as-is, numeric text parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Text view for pass-through columns. Null and blank text are absent;
    /// non-blank text is returned untouched.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::String(s) if s.trim().is_empty() => None,
            CellValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// RawTable – rows straight out of a reader, before normalization
// ---------------------------------------------------------------------------

/// Untyped table produced by the format readers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    /// Rows may be shorter than `columns`; missing trailing cells read as null.
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&NULL_CELL)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// IncidentRecord – one row of the canonical table
// ---------------------------------------------------------------------------

/// A single cleaned pollution incident.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentRecord {
    pub country: Option<String>,
    pub incident_date: Option<NaiveDateTime>,
    pub pollution_quantity: Option<f64>,
    /// Canonical label, never blank.
    pub pollution_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub material: Option<String>,
    pub aware_ans: Option<String>,
    /// Remaining non-note columns, passed through by name.
    pub extra: BTreeMap<String, CellValue>,
}

impl IncidentRecord {
    /// Calendar date of the incident, time-of-day dropped.
    pub fn incident_day(&self) -> Option<NaiveDate> {
        self.incident_date.map(|dt| dt.date())
    }
}

// ---------------------------------------------------------------------------
// IncidentTable – the canonical, immutable dataset
// ---------------------------------------------------------------------------

/// The cleaned dataset with pre-computed indices for the filter widgets.
///
/// There are no mutable accessors: once built, a table only ever yields
/// derived views.
#[derive(Debug, Clone)]
pub struct IncidentTable {
    records: Vec<IncidentRecord>,
    has_awareness: bool,
    countries: BTreeSet<String>,
    pollution_types: BTreeSet<String>,
    date_bounds: Option<(NaiveDate, NaiveDate)>,
}

impl IncidentTable {
    /// Build indices from the cleaned records. `has_awareness` tells whether
    /// the source carried an `aware_ans` column at all.
    pub fn from_records(records: Vec<IncidentRecord>, has_awareness: bool) -> Self {
        let mut countries = BTreeSet::new();
        let mut pollution_types = BTreeSet::new();
        let mut date_bounds: Option<(NaiveDate, NaiveDate)> = None;

        for rec in &records {
            if let Some(c) = &rec.country {
                countries.insert(c.clone());
            }
            pollution_types.insert(rec.pollution_type.clone());
            if let Some(day) = rec.incident_day() {
                date_bounds = Some(match date_bounds {
                    Some((lo, hi)) => (lo.min(day), hi.max(day)),
                    None => (day, day),
                });
            }
        }

        IncidentTable {
            records,
            has_awareness,
            countries,
            pollution_types,
            date_bounds,
        }
    }

    pub fn records(&self) -> &[IncidentRecord] {
        &self.records
    }

    pub fn has_awareness(&self) -> bool {
        self.has_awareness
    }

    /// Distinct non-absent countries, sorted.
    pub fn countries(&self) -> &BTreeSet<String> {
        &self.countries
    }

    /// Distinct canonical pollution types, sorted.
    pub fn pollution_types(&self) -> &BTreeSet<String> {
        &self.pollution_types
    }

    /// Earliest and latest known incident day.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        self.date_bounds
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal record for tests across the data layer.
    pub(crate) fn record(country: &str, ptype: &str, date: Option<&str>) -> IncidentRecord {
        IncidentRecord {
            country: Some(country.to_string()),
            incident_date: date.map(|d| {
                NaiveDate::parse_from_str(d, "%Y-%m-%d")
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap()
            }),
            pollution_quantity: None,
            pollution_type: ptype.to_string(),
            latitude: 1.0,
            longitude: 100.0,
            material: None,
            aware_ans: None,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn table_indexes_countries_types_and_dates() {
        let mut no_country = record("x", "Unknown", Some("2019-12-31"));
        no_country.country = None;
        let table = IncidentTable::from_records(
            vec![
                record("Indonesia", "Limbah Plastik", Some("2020-03-01")),
                record("Malaysia", "Tumpahan Minyak", None),
                no_country,
            ],
            false,
        );

        assert_eq!(table.len(), 3);
        assert_eq!(
            table.countries().iter().collect::<Vec<_>>(),
            ["Indonesia", "Malaysia"]
        );
        assert_eq!(table.pollution_types().len(), 3);
        let (lo, hi) = table.date_bounds().unwrap();
        assert_eq!(lo, NaiveDate::from_ymd_opt(2019, 12, 31).unwrap());
        assert_eq!(hi, NaiveDate::from_ymd_opt(2020, 3, 1).unwrap());
    }

    #[test]
    fn cell_text_and_numbers() {
        assert_eq!(CellValue::String(" 12.5 ".into()).as_f64(), Some(12.5));
        assert_eq!(CellValue::String("abc".into()).as_f64(), None);
        assert_eq!(CellValue::Integer(3).as_text().as_deref(), Some("3"));
        assert_eq!(CellValue::String("   ".into()).as_text(), None);
        assert_eq!(CellValue::String(" net ".into()).as_text().as_deref(), Some(" net "));
        assert!(CellValue::Null.as_text().is_none());
    }

    #[test]
    fn raw_table_short_rows_read_as_null() {
        let raw = RawTable {
            columns: vec!["a".into(), "b".into()],
            rows: vec![vec![CellValue::Integer(1)]],
        };
        assert_eq!(raw.column_index("b"), Some(1));
        assert!(raw.cell(0, 1).is_null());
        assert!(raw.cell(5, 0).is_null());
    }
}
