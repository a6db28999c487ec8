use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};

use super::filter::FilteredView;
use super::model::{IncidentRecord, IncidentTable};

// ---------------------------------------------------------------------------
// Headline counts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub incidents: usize,
    pub countries: usize,
    pub pollution_types: usize,
}

impl Summary {
    pub fn of(view: &FilteredView) -> Self {
        let records = view.records();
        let countries: BTreeSet<&str> = records
            .iter()
            .filter_map(|r| r.country.as_deref())
            .collect();
        let types: BTreeSet<&str> = records.iter().map(|r| r.pollution_type.as_str()).collect();
        Summary {
            incidents: records.len(),
            countries: countries.len(),
            pollution_types: types.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// Monthly trend
// ---------------------------------------------------------------------------

/// Incidents per calendar month, keyed by the first day of the month and
/// sorted chronologically. Rows with unknown dates are skipped.
pub fn monthly_trend(view: &FilteredView) -> Vec<(NaiveDate, usize)> {
    let mut buckets: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for day in view.records().iter().filter_map(IncidentRecord::incident_day) {
        if let Some(month) = day.with_day(1) {
            *buckets.entry(month).or_default() += 1;
        }
    }
    buckets.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Pollution-type ranking
// ---------------------------------------------------------------------------

/// Which rows a ranking was computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingSource {
    Filtered,
    /// The filters matched nothing, so the full table was ranked instead.
    AllData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRanking {
    pub entries: Vec<(String, usize)>,
    pub source: RankingSource,
    pub top_n: usize,
}

impl CategoryRanking {
    pub fn is_fallback(&self) -> bool {
        self.source == RankingSource::AllData
    }

    pub fn title(&self) -> String {
        match self.source {
            RankingSource::Filtered => format!("Top {} Pollution Types (Filtered Data)", self.top_n),
            RankingSource::AllData => format!("Top {} Pollution Types (All Data)", self.top_n),
        }
    }
}

/// Frequency of each pollution type, count descending then label ascending.
pub fn count_pollution_types(records: &[IncidentRecord]) -> Vec<(String, usize)> {
    rank(records.iter().map(|r| r.pollution_type.as_str()))
}

fn rank<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, n)| (k.to_string(), n))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Top-`top_n` pollution types of the view. An empty view over a non-empty
/// table ranks the whole table and flags the fallback.
pub fn rank_pollution_types(
    view: &FilteredView,
    table: &IncidentTable,
    top_n: usize,
) -> CategoryRanking {
    let (records, source) = if view.is_empty() && !table.is_empty() {
        (table.records(), RankingSource::AllData)
    } else {
        (view.records(), RankingSource::Filtered)
    };
    let mut entries = count_pollution_types(records);
    entries.truncate(top_n);
    CategoryRanking {
        entries,
        source,
        top_n,
    }
}

// ---------------------------------------------------------------------------
// Awareness responses
// ---------------------------------------------------------------------------

/// Distribution of non-null `aware_ans` answers, most common first.
pub fn awareness_distribution(view: &FilteredView) -> Vec<(String, usize)> {
    rank(view.records().iter().filter_map(|r| r.aware_ans.as_deref()))
}

// ---------------------------------------------------------------------------
// Filter widget options
// ---------------------------------------------------------------------------

/// Choices offered by the filter widgets, drawn from the canonical table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    pub countries: Vec<String>,
    pub pollution_types: Vec<String>,
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
}

impl FilterOptions {
    /// With no known dates the picker spans `1900-01-01 ..= today`.
    pub fn from_table(table: &IncidentTable, today: NaiveDate) -> Self {
        let (mut min_date, max_date) = table.date_bounds().unwrap_or_else(|| {
            let floor = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN);
            (floor, today)
        });
        if min_date > max_date {
            min_date = max_date;
        }
        FilterOptions {
            countries: table.countries().iter().cloned().collect(),
            pollution_types: table.pollution_types().iter().cloned().collect(),
            min_date,
            max_date,
        }
    }
}
