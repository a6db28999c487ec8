use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use marine_dashboard::config::DashboardConfig;
use marine_dashboard::data::cache::DatasetCache;
use marine_dashboard::data::export::export_csv;
use marine_dashboard::data::filter::{apply_filters, DateRange, FilterState, FilteredView};
use marine_dashboard::data::model::IncidentTable;
use marine_dashboard::data::normalize::Normalizer;
use marine_dashboard::data::summary::{
    awareness_distribution, monthly_trend, rank_pollution_types, CategoryRanking, FilterOptions,
    Summary,
};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,
    normalizer: Normalizer,
    cache: DatasetCache,

    /// Canonical table (None until a load succeeds).
    pub table: Option<Arc<IncidentTable>>,
    /// Choices for the filter widgets, from the canonical table.
    pub options: Option<FilterOptions>,

    pub filters: FilterState,
    /// Date pickers keep their values while the date filter is switched off.
    pub date_filter_enabled: bool,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,

    /// Derived from `table` + `filters` on every change.
    pub view: FilteredView,
    pub summary: Summary,
    pub ranking: Option<CategoryRanking>,
    pub trend: Vec<(NaiveDate, usize)>,
    pub awareness: Vec<(String, usize)>,

    /// Pollution type → colour, shared by map, bar and legend.
    pub color_map: ColorMap,

    /// Set when the dataset cannot be loaded; no dashboard is drawn.
    pub load_error: Option<String>,
    /// Non-fatal status line (exports).
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig, normalizer: Normalizer) -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            config,
            normalizer,
            cache: DatasetCache::new(),
            table: None,
            options: None,
            filters: FilterState::default(),
            date_filter_enabled: true,
            date_from: today,
            date_to: today,
            view: FilteredView::default(),
            summary: Summary::default(),
            ranking: None,
            trend: Vec::new(),
            awareness: Vec::new(),
            color_map: ColorMap::default(),
            load_error: None,
            status_message: None,
        }
    }

    /// Load (or fetch from cache) the configured source.
    pub fn load(&mut self) {
        let source = self.config.source.clone();
        match self
            .cache
            .get_or_load(&source.path, &source.sheet, &self.normalizer)
        {
            Ok(table) => {
                log::info!(
                    "Dataset {} ready: {} incidents, {} countries, {} pollution types",
                    source.path.display(),
                    table.len(),
                    table.countries().len(),
                    table.pollution_types().len()
                );
                self.set_table(table);
            }
            Err(e) => {
                log::error!("Failed to load data: {e}");
                self.clear_dataset();
                self.load_error = Some(e.to_string());
            }
        }
    }

    /// Switch to another file, keeping the configured sheet name.
    pub fn open(&mut self, path: PathBuf) {
        self.config.source.path = path;
        self.load();
    }

    /// Drop the cache and read the source again.
    pub fn reload(&mut self) {
        self.cache.invalidate();
        self.load();
    }

    /// Forget the current table and everything derived from it.
    fn clear_dataset(&mut self) {
        self.table = None;
        self.options = None;
        self.view = FilteredView::default();
        self.summary = Summary::default();
        self.ranking = None;
        self.trend.clear();
        self.awareness.clear();
        self.color_map = ColorMap::default();
        self.status_message = None;
    }

    /// Ingest a canonical table, reset filters to "everything" and the date
    /// pickers to the data's span.
    fn set_table(&mut self, table: Arc<IncidentTable>) {
        let today = chrono::Local::now().date_naive();
        let options = FilterOptions::from_table(&table, today);

        self.clear_dataset();
        self.color_map = ColorMap::new(&options.pollution_types);
        self.date_from = options.min_date;
        self.date_to = options.max_date;
        self.filters = FilterState::default();
        if self.date_filter_enabled {
            self.filters.date_range = Some(DateRange::new(self.date_from, self.date_to));
        }

        self.options = Some(options);
        self.table = Some(table);
        self.load_error = None;
        self.refilter();
    }

    /// Recompute the view and every summary after a filter change.
    pub fn refilter(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        self.view = apply_filters(table, &self.filters);
        self.summary = Summary::of(&self.view);
        self.ranking = Some(rank_pollution_types(
            &self.view,
            table,
            self.config.display.top_n,
        ));
        self.trend = monthly_trend(&self.view);
        self.awareness = awareness_distribution(&self.view);
    }

    pub fn set_country(&mut self, country: Option<String>) {
        self.filters.country = country;
        self.refilter();
    }

    pub fn set_pollution_type(&mut self, pollution_type: Option<String>) {
        self.filters.pollution_type = pollution_type;
        self.refilter();
    }

    /// Apply the picker values; they are clamped to the data's span.
    pub fn set_dates(&mut self, enabled: bool, from: NaiveDate, to: NaiveDate) {
        if let Some(opts) = &self.options {
            self.date_from = from.clamp(opts.min_date, opts.max_date);
            self.date_to = to.clamp(opts.min_date, opts.max_date);
        } else {
            self.date_from = from;
            self.date_to = to;
        }
        self.date_filter_enabled = enabled;
        self.filters.date_range = enabled.then(|| DateRange::new(self.date_from, self.date_to));
        self.refilter();
    }

    /// Write the current view as CSV and report the outcome in the status
    /// line.
    pub fn export_to(&mut self, path: &Path) {
        match export_csv(&self.view, path) {
            Ok(()) => {
                self.status_message = Some(format!(
                    "Exported {} incidents to {}",
                    self.view.len(),
                    path.display()
                ));
            }
            Err(e) => {
                log::error!("Export failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marine_dashboard::config::NormalizationRules;

    const CSV: &str = "\
inc_date,pollution_qty,LAT_1,LONG,Country,pollution_type,material,aware_ans
2021-01-04,10,-6.1,106.8,Indonesia,oil spill,crude,Yes
2021-03-09,2,3.1,101.7,Malaysia,plastic waste,bags,No
,2,3.2,101.8,Malaysia,plastic waste,bags,No
";

    fn state_for(dir: &tempfile::TempDir) -> AppState {
        let path = dir.path().join("incidents.csv");
        std::fs::write(&path, CSV).unwrap();
        let mut config = DashboardConfig::default();
        config.source.path = path;
        let normalizer = Normalizer::new(&NormalizationRules::default()).unwrap();
        let mut state = AppState::new(config, normalizer);
        state.load();
        state
    }

    #[test]
    fn load_sets_full_date_span_filter() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(&dir);
        assert!(state.load_error.is_none());
        assert_eq!(state.date_from, NaiveDate::from_ymd_opt(2021, 1, 4).unwrap());
        assert_eq!(state.date_to, NaiveDate::from_ymd_opt(2021, 3, 9).unwrap());
        // The undated row is hidden while the date filter is on.
        assert_eq!(state.view.len(), 2);
    }

    #[test]
    fn disabling_date_filter_shows_undated_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_for(&dir);
        let (from, to) = (state.date_from, state.date_to);
        state.set_dates(false, from, to);
        assert_eq!(state.view.len(), 3);
        state.set_country(Some("Malaysia".into()));
        assert_eq!(state.summary.incidents, 2);
        assert_eq!(state.awareness, vec![("No".to_string(), 2)]);
    }

    #[test]
    fn missing_file_sets_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_for(&dir);
        state.export_to(&dir.path().join("out.csv"));
        assert!(state.status_message.is_some());

        state.open(dir.path().join("gone.xlsx"));
        assert!(state.table.is_none());
        assert!(state.load_error.as_deref().unwrap().contains("not found"));
        assert!(state.options.is_none());
        assert!(state.view.is_empty());
        assert_eq!(state.summary, Summary::default());
        assert!(state.ranking.is_none());
        assert!(state.trend.is_empty());
        assert!(state.awareness.is_empty());
        assert!(state.status_message.is_none());
    }
}
