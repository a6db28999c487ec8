use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::loader::load_incidents;
use super::model::IncidentTable;
use super::normalize::Normalizer;
use crate::error::DataError;

/// Memoizes the canonical table for one source at a time.
///
/// Owned by the single thread driving the dashboard, so no locking. Changed
/// normalization rules only take effect after [`DatasetCache::invalidate`].
#[derive(Debug, Default)]
pub struct DatasetCache {
    entry: Option<CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    path: PathBuf,
    sheet: String,
    table: Arc<IncidentTable>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `(path, sheet)`, loading it on a miss.
    /// Failed loads are not cached.
    pub fn get_or_load(
        &mut self,
        path: &Path,
        sheet: &str,
        normalizer: &Normalizer,
    ) -> Result<Arc<IncidentTable>, DataError> {
        if let Some(entry) = &self.entry {
            if entry.path.as_path() == path && entry.sheet == sheet {
                return Ok(Arc::clone(&entry.table));
            }
        }

        let table = Arc::new(load_incidents(path, sheet, normalizer)?);
        self.entry = Some(CacheEntry {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
            table: Arc::clone(&table),
        });
        Ok(table)
    }

    /// Drop the cached table; the next `get_or_load` reads the file again.
    pub fn invalidate(&mut self) {
        if let Some(entry) = self.entry.take() {
            log::info!("Dropped cached dataset {}", entry.path.display());
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.entry.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalizationRules;

    const CSV: &str = "\
inc_date,pollution_qty,LAT_1,LONG,Country,pollution_type,material
2021-01-04,10,-6.1,106.8,Indonesia,oil spill,crude
";

    #[test]
    fn hit_returns_same_table_until_invalidated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("incidents.csv");
        std::fs::write(&path, CSV).unwrap();
        let normalizer = Normalizer::new(&NormalizationRules::default()).unwrap();

        let mut cache = DatasetCache::new();
        let first = cache.get_or_load(&path, "", &normalizer).unwrap();
        std::fs::remove_file(&path).unwrap();

        // Still served from memory although the file is gone.
        let second = cache.get_or_load(&path, "", &normalizer).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        cache.invalidate();
        assert!(!cache.is_loaded());
        assert!(matches!(
            cache.get_or_load(&path, "", &normalizer),
            Err(DataError::Unavailable { .. })
        ));
        assert!(!cache.is_loaded());
    }

    #[test]
    fn different_source_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        std::fs::write(&a, CSV).unwrap();
        std::fs::write(&b, CSV).unwrap();
        let normalizer = Normalizer::new(&NormalizationRules::default()).unwrap();

        let mut cache = DatasetCache::new();
        let ta = cache.get_or_load(&a, "", &normalizer).unwrap();
        let tb = cache.get_or_load(&b, "", &normalizer).unwrap();
        assert!(!Arc::ptr_eq(&ta, &tb));
        assert_eq!(ta.len(), tb.len());
    }
}
