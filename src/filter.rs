use crate::schema::DatasetKind;
use anyhow::{anyhow, bail, Result};
use tracing::info;

/// Resolves which datasets to process based on include/exclude filters
pub fn resolve_kinds(
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
) -> Result<Vec<DatasetKind>> {
    match (include, exclude) {
        (Some(_), Some(_)) => {
            bail!("Cannot use both --include and --exclude at the same time");
        }
        (Some(include_list), None) => {
            let mut kinds = parse_kinds(&include_list)?;
            kinds.sort();
            kinds.dedup();
            info!("Including {} datasets: {:?}", kinds.len(), include_list);
            Ok(kinds)
        }
        (None, Some(exclude_list)) => {
            let excluded = parse_kinds(&exclude_list)?;
            let kinds: Vec<DatasetKind> = DatasetKind::ALL
                .into_iter()
                .filter(|kind| !excluded.contains(kind))
                .collect();
            info!("Including {} datasets (after exclusions)", kinds.len());
            Ok(kinds)
        }
        (None, None) => Ok(DatasetKind::ALL.to_vec()),
    }
}

fn parse_kinds(names: &[String]) -> Result<Vec<DatasetKind>> {
    names
        .iter()
        .map(|name| {
            DatasetKind::from_key(name.trim()).ok_or_else(|| anyhow!("Unknown dataset: {}", name))
        })
        .collect()
}
