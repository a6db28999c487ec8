use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::model::{columns, CellValue, IncidentRecord, IncidentTable, RawTable};
use crate::config::NormalizationRules;
use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Normalizer – compiled pollution-type rules
// ---------------------------------------------------------------------------

/// Pollution-type rules compiled for lookup: tokens case-folded, synonym
/// chains resolved to their final target.
#[derive(Debug, Clone)]
pub struct Normalizer {
    noise: HashSet<String>,
    synonyms: HashMap<String, String>,
    unknown_label: String,
    unknown_key: String,
    missing_column_label: String,
    missing_column_key: String,
    note_prefix: String,
}

impl Normalizer {
    pub fn new(rules: &NormalizationRules) -> Result<Self, ConfigError> {
        let unknown_label = rules.unknown_label.trim().to_string();
        if unknown_label.is_empty() {
            return Err(ConfigError::BlankLabel("unknown_label"));
        }
        let missing_column_label = rules.missing_column_label.trim().to_string();
        if missing_column_label.is_empty() {
            return Err(ConfigError::BlankLabel("missing_column_label"));
        }

        let noise = rules.noise_tokens.iter().map(|t| casefold(t)).collect();
        let folded: HashMap<String, String> = rules
            .synonyms
            .iter()
            .map(|(k, v)| (casefold(k), casefold(v)))
            .collect();
        let synonyms = resolve_chains(&folded)?;

        Ok(Normalizer {
            noise,
            synonyms,
            unknown_key: casefold(&unknown_label),
            unknown_label,
            missing_column_key: casefold(&missing_column_label),
            missing_column_label,
            note_prefix: rules.note_prefix.clone(),
        })
    }

    /// Map a raw `pollution_type` cell to its canonical label.
    pub fn normalize(&self, raw: Option<&str>) -> String {
        let Some(raw) = raw else {
            return self.unknown_label.clone();
        };
        let folded = casefold(raw);
        if folded.is_empty() || folded == self.unknown_key || self.noise.contains(&folded) {
            return self.unknown_label.clone();
        }
        if folded == self.missing_column_key {
            return self.missing_column_label.clone();
        }

        let resolved = self.synonyms.get(&folded).unwrap_or(&folded);
        if self.noise.contains(resolved) || *resolved == self.unknown_key {
            return self.unknown_label.clone();
        }
        if *resolved == self.missing_column_key {
            return self.missing_column_label.clone();
        }
        title_case(resolved)
    }

    pub fn unknown_label(&self) -> &str {
        &self.unknown_label
    }

    pub fn missing_column_label(&self) -> &str {
        &self.missing_column_label
    }

    /// Free-text commentary columns dropped on load. A blank prefix drops
    /// nothing.
    pub fn is_note_column(&self, name: &str) -> bool {
        !self.note_prefix.is_empty() && name.starts_with(&self.note_prefix)
    }
}

fn casefold(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Follow every synonym to its final target so one lookup suffices.
fn resolve_chains(map: &HashMap<String, String>) -> Result<HashMap<String, String>, ConfigError> {
    let mut resolved = HashMap::with_capacity(map.len());
    for start in map.keys() {
        let mut seen = HashSet::new();
        let mut current = start;
        seen.insert(current);
        while let Some(next) = map.get(current) {
            if next == current {
                break;
            }
            if !seen.insert(next) {
                return Err(ConfigError::SynonymCycle(start.clone()));
            }
            current = next;
        }
        resolved.insert(start.clone(), current.clone());
    }
    Ok(resolved)
}

/// Uppercase a letter when it starts the string or follows a non-letter,
/// lowercase it otherwise.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_letter = false;
    for ch in s.chars() {
        if ch.is_alphabetic() {
            if prev_letter {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_letter = true;
        } else {
            out.push(ch);
            prev_letter = false;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tolerant cell coercion
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

// Month-first before day-first, matching what the data entry tool produced.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y"];

/// Read an incident date. Anything unparseable is `None`, never an error.
pub fn parse_incident_date(cell: &CellValue) -> Option<NaiveDateTime> {
    match cell {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::String(s) => parse_date_text(s.trim()),
        _ => None,
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDateTime> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Read a finite number; text is parsed, everything else is `None`.
pub fn parse_number(cell: &CellValue) -> Option<f64> {
    cell.as_f64().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// RawTable → IncidentTable
// ---------------------------------------------------------------------------

const KNOWN: &[&str] = &[
    columns::INC_DATE,
    columns::POLLUTION_QTY,
    columns::LATITUDE,
    columns::LONGITUDE,
    columns::COUNTRY,
    columns::MATERIAL,
    columns::POLLUTION_TYPE,
    columns::AWARE_ANS,
];

/// Clean a raw table into the canonical incident table.
///
/// Fails only when a required column is missing; every row-level problem is
/// absorbed (unknown dates and quantities, sentinel pollution types, rows
/// without coordinates dropped).
pub fn build_table(raw: &RawTable, normalizer: &Normalizer) -> Result<IncidentTable> {
    // Note columns are invisible from here on, even if they shadow a known name.
    let column = |name: &str| -> Option<usize> {
        raw.column_index(name)
            .filter(|_| !normalizer.is_note_column(name))
    };
    let required = |name: &str| -> Result<usize> {
        column(name).with_context(|| format!("missing required column '{name}'"))
    };

    let date_idx = required(columns::INC_DATE)?;
    let qty_idx = required(columns::POLLUTION_QTY)?;
    let lat_idx = required(columns::LATITUDE)?;
    let lon_idx = required(columns::LONGITUDE)?;
    let country_idx = required(columns::COUNTRY)?;
    let material_idx = required(columns::MATERIAL)?;
    let type_idx = column(columns::POLLUTION_TYPE);
    let aware_idx = column(columns::AWARE_ANS);

    let note_count = raw
        .columns
        .iter()
        .filter(|c| normalizer.is_note_column(c))
        .count();
    let extra_cols: Vec<(usize, &String)> = raw
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| !normalizer.is_note_column(c) && !KNOWN.contains(&c.as_str()))
        .collect();

    if type_idx.is_none() {
        log::warn!(
            "Column '{}' not found; every row labelled '{}'",
            columns::POLLUTION_TYPE,
            normalizer.missing_column_label()
        );
    }

    let mut records = Vec::with_capacity(raw.len());
    let mut dropped = 0usize;

    for row in 0..raw.len() {
        let (Some(latitude), Some(longitude)) = (
            parse_number(raw.cell(row, lat_idx)),
            parse_number(raw.cell(row, lon_idx)),
        ) else {
            dropped += 1;
            continue;
        };

        let pollution_type = match type_idx {
            Some(idx) => {
                let text = raw.cell(row, idx).as_text();
                normalizer.normalize(text.as_deref())
            }
            None => normalizer.missing_column_label().to_string(),
        };

        let extra: BTreeMap<String, CellValue> = extra_cols
            .iter()
            .map(|(idx, name)| ((*name).clone(), raw.cell(row, *idx).clone()))
            .collect();

        records.push(IncidentRecord {
            country: raw.cell(row, country_idx).as_text(),
            incident_date: parse_incident_date(raw.cell(row, date_idx)),
            pollution_quantity: parse_number(raw.cell(row, qty_idx)),
            pollution_type,
            latitude,
            longitude,
            material: raw.cell(row, material_idx).as_text(),
            aware_ans: aware_idx.and_then(|idx| raw.cell(row, idx).as_text()),
            extra,
        });
    }

    let table = IncidentTable::from_records(records, aware_idx.is_some());
    log::info!(
        "Loaded {} incidents ({} rows without coordinates dropped, {} note columns dropped)",
        table.len(),
        dropped,
        note_count
    );
    log::info!(
        "{} distinct pollution types after normalization",
        table.pollution_types().len()
    );
    if log::log_enabled!(log::Level::Debug) {
        let ranking = super::summary::count_pollution_types(table.records());
        for (label, count) in ranking.iter().take(10) {
            log::debug!("  {label}: {count}");
        }
    }

    Ok(table)
}
