//! Least-cloud selection across split and unsplit Sentinel-2 granules.
//!
//! A granule spanning two UTM zones may be published as two complementary
//! halves alongside (or instead of) the full tile. Each half reports its own
//! cloud cover; a pair scores the mean of both halves. Within one granule
//! stub the lowest score wins, and a winning pair keeps both halves because
//! together they cover the footprint.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{CatalogError, Result};
use crate::record::CatalogRecord;

/// Where the published safe list is looked for when none is injected.
pub const DEFAULT_SAFE_LIST_PATH: &str = "static/safe-granule-orbit-list.txt";

/// Column header of the safe list.
pub const GRAN_ORB_COLUMN: &str = "gran-orb";

/// Known-good granule/orbit pairs (`T30UXB_ORB037`), i.e. tiles that are
/// not edge slivers.
pub trait SafeGranuleLookup: Send + Sync {
    fn contains(&self, gran_orb: &str) -> bool;

    /// Shown when nothing in a query matches.
    fn source_name(&self) -> String;
}

#[derive(Debug, Clone, Default)]
pub struct SafeGranuleSet {
    keys: HashSet<String>,
    source: String,
}

impl SafeGranuleSet {
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            source: "in-memory safe list".to_string(),
        }
    }

    /// Load a CSV with a `gran-orb` column, or a headerless file with one
    /// key per line.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CatalogError::SafeListNotFound {
                path: path.to_path_buf(),
            });
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut column = 0;
        let mut keys = HashSet::new();

        for (index, row) in reader.records().enumerate() {
            let row = row?;
            if index == 0 {
                if let Some(position) = row.iter().position(|field| field == GRAN_ORB_COLUMN) {
                    column = position;
                    continue;
                }
            }
            if let Some(key) = row.get(column).filter(|k| !k.is_empty()) {
                keys.insert(key.to_string());
            }
        }

        debug!(path = %path.display(), keys = keys.len(), "Loaded safe granule list");

        Ok(Self {
            keys,
            source: path.display().to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl SafeGranuleLookup for SafeGranuleSet {
    fn contains(&self, gran_orb: &str) -> bool {
        self.keys.contains(gran_orb)
    }

    fn source_name(&self) -> String {
        self.source.clone()
    }
}

/// Load the safe list from [`DEFAULT_SAFE_LIST_PATH`].
pub fn default_safe_list() -> Result<SafeGranuleSet> {
    SafeGranuleSet::from_path(PathBuf::from(DEFAULT_SAFE_LIST_PATH))
}

/// Keep, per granule stub, the record(s) with the lowest ranking cloud
/// cover among those whose granule/orbit pair is on the safe list.
///
/// Records without a granule, orbit or cloud cover cannot be ranked and are
/// dropped. Returned records carry their [`DedupKeys`](crate::record::DedupKeys)
/// and keep their input order.
pub fn find_minimum_cloud(
    records: &[CatalogRecord],
    safe_list: &dyn SafeGranuleLookup,
) -> Result<Vec<CatalogRecord>> {
    let candidates: Vec<(CatalogRecord, f64)> = records
        .iter()
        .filter_map(|record| {
            let keys = record.dedup_keys()?;
            let score = record.ranking_cloud_cover()?;
            if !safe_list.contains(&keys.gran_orb) {
                return None;
            }
            let mut record = record.clone();
            record.dedup_keys = Some(keys);
            Some((record, score))
        })
        .collect();

    if candidates.is_empty() {
        return Err(CatalogError::TooNarrow {
            source_name: safe_list.source_name(),
        });
    }

    let mut minimum: HashMap<String, f64> = HashMap::new();
    for (record, score) in &candidates {
        if let Some(keys) = &record.dedup_keys {
            minimum
                .entry(keys.granule_stub.clone())
                .and_modify(|m| *m = m.min(*score))
                .or_insert(*score);
        }
    }

    let selected: Vec<CatalogRecord> = candidates
        .into_iter()
        .filter(|(record, score)| {
            record
                .dedup_keys
                .as_ref()
                .and_then(|keys| minimum.get(&keys.granule_stub))
                .is_some_and(|m| score <= m)
        })
        .map(|(record, _)| record)
        .collect();

    info!(
        input = records.len(),
        granules = minimum.len(),
        selected = selected.len(),
        "Selected least-cloud granules"
    );

    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, cloud: f64) -> CatalogRecord {
        let mut record = CatalogRecord::new(title, format!("geonode:{}", title));
        record.granule_ref = crate::record::parse_granule_ref(title);
        record.orbit_ref = crate::record::parse_orbit_ref(title);
        record.cloud_cover = Some(cloud);
        record
    }

    #[test]
    fn test_lowest_per_granule() {
        let records = vec![
            record("S2A_d1_ll_T30UXB_ORB037_a", 0.4),
            record("S2B_d2_ll_T30UXB_ORB037_b", 0.1),
            record("S2A_d1_ll_T30UXC_ORB037_c", 0.3),
        ];
        let safe = SafeGranuleSet::from_keys(["T30UXB_ORB037", "T30UXC_ORB037"]);

        let selected = find_minimum_cloud(&records, &safe).unwrap();
        let titles: Vec<&str> = selected.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["S2B_d2_ll_T30UXB_ORB037_b", "S2A_d1_ll_T30UXC_ORB037_c"]);
        assert!(selected.iter().all(|r| r.dedup_keys.is_some()));
    }

    #[test]
    fn test_unranked_records_dropped() {
        let mut unranked = record("S2A_d1_ll_T30UXB_ORB037_a", 0.0);
        unranked.cloud_cover = None;
        let safe = SafeGranuleSet::from_keys(["T30UXB_ORB037"]);

        assert!(matches!(
            find_minimum_cloud(&[unranked], &safe),
            Err(CatalogError::TooNarrow { .. })
        ));
    }

    #[test]
    fn test_headerless_safe_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("safe.txt");
        std::fs::write(&path, "T30UXB_ORB037\nT30UXC_ORB037\n").unwrap();

        let safe = SafeGranuleSet::from_path(&path).unwrap();
        assert_eq!(safe.len(), 2);
        assert!(safe.contains("T30UXB_ORB037"));
    }

    #[test]
    fn test_indexed_safe_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("safe.csv");
        std::fs::write(&path, ",gran-orb\n0,T30UXB_ORB037\n1,T31UCT_ORB080\n").unwrap();

        let safe = SafeGranuleSet::from_path(&path).unwrap();
        assert_eq!(safe.len(), 2);
        assert!(safe.contains("T31UCT_ORB080"));
        assert!(!safe.contains("gran-orb"));
    }
}
