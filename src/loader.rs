//! Cold-cache refresh and loading of every dataset table

use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use tracing::info;

use crate::download::{dataset_url, fetch_all, format_size, CacheManager, Fetch, DEFAULT_BASE_URL};
use crate::parser::{flatten_body, SublistAllocator};
use crate::schema::DatasetKind;
use crate::ui::{Phase, Ui};
use crate::writer::{DatasetTables, Table};

/// Loaded tables keyed by table name, sublists included
pub type DataDict = BTreeMap<String, Table>;

pub struct DataLoader<F: Fetch> {
    fetcher: F,
    cache: CacheManager,
    base_url: String,
}

impl<F: Fetch> DataLoader<F> {
    pub fn new(fetcher: F, cache: CacheManager) -> Self {
        Self {
            fetcher,
            cache,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Fetch whatever is not cached yet, then load every requested dataset
    pub fn load_game_data(&self, kinds: &[DatasetKind], ui: &mut impl Ui) -> Result<DataDict> {
        self.refresh_missing(kinds, ui)?;
        load_cached(&self.cache, kinds, ui)
    }

    /// Fetch, flatten and persist the datasets without a cached primary table
    ///
    /// Returns the kinds that were fetched. Cached datasets are never
    /// refreshed; remove their files to fetch them again.
    pub fn refresh_missing(&self, kinds: &[DatasetKind], ui: &mut impl Ui) -> Result<Vec<DatasetKind>> {
        ui.set_phase(Phase::Checking);

        let mut pending = Vec::new();
        for kind in kinds {
            if self.cache.is_cached(*kind) {
                ui.log(format!("{}: cached", kind));
            } else {
                pending.push(*kind);
            }
        }

        if pending.is_empty() {
            return Ok(pending);
        }

        ui.set_phase(Phase::Fetching);
        ui.set_info(format!("Requesting {} datasets from {}", pending.len(), self.base_url));

        let requests = pending
            .iter()
            .map(|kind| (*kind, dataset_url(&self.base_url, *kind)))
            .collect();
        let total = pending.len() as u64;
        let mut done = 0;
        let mut alloc = SublistAllocator::new();

        fetch_all(&self.fetcher, requests, |kind, body| {
            let body = body.with_context(|| format!("Failed to fetch {}", kind))?;

            ui.set_phase(Phase::Flattening);
            let tables = build_tables(kind, &body, &mut alloc)?;
            self.cache
                .store_dataset(&tables)
                .with_context(|| format!("Failed to cache {}", kind))?;

            done += 1;
            ui.set_progress(done, total, kind.key());
            let sublist_rows = tables.sublist.as_ref().map_or(0, Table::len);
            ui.log(format!(
                "{}: {} records, {} sublist rows ({})",
                kind,
                tables.primary.len(),
                sublist_rows,
                format_size(body.len() as u64)
            ));
            info!(
                "{}: cached {} records and {} sublist rows",
                kind,
                tables.primary.len(),
                sublist_rows
            );
            Ok(())
        })?;

        ui.clear_progress();
        Ok(pending)
    }
}

/// Parse, flatten and encode one response body
///
/// `alloc` is reset once the body is flattened, so one allocator serves
/// every dataset handled on a thread.
pub fn build_tables(kind: DatasetKind, body: &str, alloc: &mut SublistAllocator) -> Result<DatasetTables> {
    let dataset = flatten_body(kind, body, alloc).with_context(|| format!("Failed to flatten {}", kind))?;
    DatasetTables::encode(&dataset).with_context(|| format!("Failed to encode {}", kind))
}

/// Load the cached tables of the given datasets, skipping those not cached
pub fn load_cached(cache: &CacheManager, kinds: &[DatasetKind], ui: &mut impl Ui) -> Result<DataDict> {
    ui.set_phase(Phase::Loading);
    let mut data = DataDict::new();

    for kind in kinds {
        for key in std::iter::once(kind.key()).chain(kind.sublist_key()) {
            match cache.load(key)? {
                Some(table) => {
                    data.insert(key.to_string(), table);
                }
                None => ui.log(format!("{}: not cached", key)),
            }
        }
    }

    Ok(data)
}

/// Load one cached table by name
pub fn load_table(cache: &CacheManager, key: &str) -> Result<Table> {
    cache
        .load(key)?
        .ok_or_else(|| anyhow!("{} is not cached in {:?}", key, cache.cache_dir()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Cell;

    #[test]
    fn test_build_tables_names_the_failing_kind() {
        let err = build_tables(DatasetKind::Monsters, r#"[{"element2": 1}]"#, &mut SublistAllocator::new()).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.starts_with("Failed to flatten monsters"), "{}", message);
        assert!(message.contains("no known monster shape has 1 fields"), "{}", message);
    }

    #[test]
    fn test_build_tables_reports_encode_errors() {
        let body = r#"[{"min_cooldown": "five", "effect": "x", "max_cooldown": 1, "name": "y"}]"#;
        let err = build_tables(DatasetKind::ActiveSkills, body, &mut SublistAllocator::new()).unwrap_err();
        assert!(format!("{:#}", err).starts_with("Failed to encode active_skills"));
    }

    #[test]
    fn test_build_tables_truncates_long_names() {
        let long = "x".repeat(300);
        let body = format!(
            r#"[{{"min_cooldown": 1, "effect": "{}", "max_cooldown": 2, "name": "n"}}]"#,
            long
        );
        let tables = build_tables(DatasetKind::ActiveSkills, &body, &mut SublistAllocator::new()).unwrap();
        assert_eq!(tables.primary.get(0, "effect"), Some(Cell::text(&long[..128])));
    }
}
