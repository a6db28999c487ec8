use chrono::NaiveDate;

use super::model::{IncidentRecord, IncidentTable};

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Closed calendar-date interval, `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// An inverted range (`start` after `end`) collapses to the single day
    /// `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if start > end {
            log::warn!("Date range {start} .. {end} is inverted; using {end} only");
            return DateRange { start: end, end };
        }
        DateRange { start, end }
    }

    pub fn single_day(day: NaiveDate) -> Self {
        DateRange {
            start: day,
            end: day,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// The user's current selections. `None` means "no filter" for that
/// predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub country: Option<String>,
    pub pollution_type: Option<String>,
    pub date_range: Option<DateRange>,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.country.is_none() && self.pollution_type.is_none() && self.date_range.is_none()
    }

    /// Whether a single record passes every active predicate.
    ///
    /// A record with an unknown date fails whenever a date range is active:
    /// it can be neither proven inside nor outside the range.
    pub fn matches(&self, rec: &IncidentRecord) -> bool {
        if let Some(country) = &self.country {
            if rec.country.as_ref() != Some(country) {
                return false;
            }
        }
        if let Some(ptype) = &self.pollution_type {
            if rec.pollution_type != *ptype {
                return false;
            }
        }
        if let Some(range) = &self.date_range {
            match rec.incident_day() {
                Some(day) if range.contains(day) => {}
                _ => return false,
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Records passing the filters, in canonical-table order. Owns its rows, so
/// it stays valid independently of the table it came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredView {
    records: Vec<IncidentRecord>,
}

impl FilteredView {
    pub fn records(&self) -> &[IncidentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Return indices of incidents that pass all active filters, ascending.
pub fn filtered_indices(table: &IncidentTable, filters: &FilterState) -> Vec<usize> {
    table
        .records()
        .iter()
        .enumerate()
        .filter(|(_, rec)| filters.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

/// Build the filtered view. Pure: the table is only read.
pub fn apply_filters(table: &IncidentTable, filters: &FilterState) -> FilteredView {
    let records: Vec<IncidentRecord> = table
        .records()
        .iter()
        .filter(|rec| filters.matches(rec))
        .cloned()
        .collect();
    log::debug!(
        "Filter {:?}: {} of {} incidents",
        filters,
        records.len(),
        table.len()
    );
    FilteredView { records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;
    use proptest::prelude::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sample() -> IncidentTable {
        IncidentTable::from_records(
            vec![
                record("Indonesia", "Tumpahan Minyak", Some("2021-01-10")),
                record("Malaysia", "Limbah Plastik", Some("2021-02-01")),
                record("Indonesia", "Limbah Plastik", None),
                record("Indonesia", "Tumpahan Minyak", Some("2021-02-01")),
                record("Fiji", "Unknown", Some("2021-03-15")),
            ],
            false,
        )
    }

    #[test]
    fn no_predicates_returns_everything_in_order() {
        let table = sample();
        let view = apply_filters(&table, &FilterState::default());
        assert_eq!(view.records(), table.records());
        assert_eq!(filtered_indices(&table, &FilterState::default()), [0, 1, 2, 3, 4]);
    }

    #[test]
    fn unknown_country_is_empty_not_error() {
        let filters = FilterState {
            country: Some("Atlantis".into()),
            ..FilterState::default()
        };
        assert!(apply_filters(&sample(), &filters).is_empty());
    }

    #[test]
    fn predicates_combine_with_and() {
        let filters = FilterState {
            country: Some("Indonesia".into()),
            pollution_type: Some("Limbah Plastik".into()),
            date_range: None,
        };
        assert_eq!(filtered_indices(&sample(), &filters), [2]);
    }

    #[test]
    fn single_day_range_matches_that_day_and_skips_unknown_dates() {
        let mut table_rows = sample().records().to_vec();
        // Same day, afternoon: time-of-day must not matter.
        let mut late = record("Malaysia", "Unknown", None);
        late.incident_date = day("2021-02-01").and_hms_opt(17, 30, 0);
        table_rows.push(late);
        let table = IncidentTable::from_records(table_rows, false);

        let filters = FilterState {
            date_range: Some(DateRange::single_day(day("2021-02-01"))),
            ..FilterState::default()
        };
        assert_eq!(filtered_indices(&table, &filters), [1, 3, 5]);
    }

    #[test]
    fn unknown_dates_kept_without_date_predicate() {
        let filters = FilterState {
            country: Some("Indonesia".into()),
            ..FilterState::default()
        };
        assert_eq!(filtered_indices(&sample(), &filters), [0, 2, 3]);
    }

    #[test]
    fn inverted_range_collapses_to_end_day() {
        let range = DateRange::new(day("2021-03-15"), day("2021-01-10"));
        assert_eq!(range.start(), day("2021-01-10"));
        assert_eq!(range.end(), day("2021-01-10"));

        let filters = FilterState {
            date_range: Some(range),
            ..FilterState::default()
        };
        assert_eq!(filtered_indices(&sample(), &filters), [0]);
    }

    #[test]
    fn filtering_leaves_table_untouched() {
        let table = sample();
        let before = table.records().to_vec();
        let filters = FilterState {
            country: Some("Fiji".into()),
            ..FilterState::default()
        };
        let _ = apply_filters(&table, &filters);
        assert_eq!(table.records(), &before[..]);
    }

    proptest! {
        #[test]
        fn view_is_ordered_subset_and_deterministic(
            country in proptest::option::of(prop_oneof![
                Just("Indonesia".to_string()),
                Just("Malaysia".to_string()),
                Just("Fiji".to_string()),
            ]),
            from in 0i64..90,
            len in -10i64..90,
        ) {
            let table = sample();
            let base = day("2021-01-01");
            let range = DateRange::new(
                base + chrono::Duration::days(from),
                base + chrono::Duration::days(from + len),
            );
            let filters = FilterState { country, pollution_type: None, date_range: Some(range) };

            let idx = filtered_indices(&table, &filters);
            prop_assert!(idx.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(&idx, &filtered_indices(&table, &filters));

            let view = apply_filters(&table, &filters);
            let expected: Vec<_> = idx.iter().map(|&i| table.records()[i].clone()).collect();
            prop_assert_eq!(view.records(), &expected[..]);
            for rec in view.records() {
                let d = rec.incident_day().unwrap();
                prop_assert!(range.contains(d));
            }
        }
    }
}
