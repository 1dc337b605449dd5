//! Catalog records and the Sentinel-2 fields derived from them.
//!
//! Sentinel-2 titles follow `<mission>_<date>_<latlon>_<granule>_<orbit>_<rest>`,
//! e.g. `S2A_20190401_lat52lon099_T30UXB_ORB037_utm30n_osgb`. A split half
//! carries a `SPLIT<n>` suffix on the granule field.

use std::collections::HashMap;

use eods_common::BoundingBox;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Marker the provider appends to the granule of a split half.
pub const SPLIT_MARKER: &str = "SPLIT";

/// Length of the tile grid reference at the start of a granule field.
pub const GRANULE_STUB_LEN: usize = 6;

/// Keys used to match split and unsplit variants of one footprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DedupKeys {
    /// First three title fields plus the granule stub.
    pub title_stub: String,
    /// Granule stub plus orbit, the safe-list key.
    pub gran_orb: String,
    pub granule_stub: String,
}

/// One row of a catalog search result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogRecord {
    /// Empty when the catalog sends no title or `null`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    /// Stable layer identifier, e.g. `geonode:S2A_...`.
    pub alternate: String,
    #[serde(default, rename = "type")]
    pub record_type: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub srid: Option<String>,
    #[serde(default)]
    pub supplemental_information: Option<String>,
    #[serde(default, rename = "split_granule", deserialize_with = "split_granule_name")]
    pub split_granule_name: Option<String>,
    /// WGS84 footprint.
    #[serde(default, rename = "csw_wkt_geometry")]
    pub geometry_wkt: Option<String>,

    #[serde(skip)]
    pub granule_ref: Option<String>,
    #[serde(skip)]
    pub orbit_ref: Option<String>,
    #[serde(skip)]
    pub cloud_cover: Option<f64>,
    /// Cloud cover of the split partner, when it is in the same result set.
    #[serde(skip)]
    pub split_cloud_cover_partner: Option<f64>,
    /// Score compared during deduplication.
    #[serde(skip)]
    pub split_cloud_cover: Option<f64>,
    /// Set on records returned by deduplication.
    #[serde(skip)]
    pub dedup_keys: Option<DedupKeys>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// `split_granule` arrives either as `{"name": ...}`, a bare string or null.
fn split_granule_name<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Object(map)) => map
            .get("name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        Some(Value::String(name)) if !name.is_empty() => Some(name),
        _ => None,
    })
}

impl CatalogRecord {
    pub fn new(title: impl Into<String>, alternate: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            alternate: alternate.into(),
            record_type: None,
            date: None,
            srid: None,
            supplemental_information: None,
            split_granule_name: None,
            geometry_wkt: None,
            granule_ref: None,
            orbit_ref: None,
            cloud_cover: None,
            split_cloud_cover_partner: None,
            split_cloud_cover: None,
            dedup_keys: None,
        }
    }

    /// Fill `granule_ref`, `orbit_ref` and `cloud_cover` from the title and
    /// supplemental information.
    pub fn derive_sentinel2_fields(&mut self) {
        self.granule_ref = parse_granule_ref(&self.title);
        self.orbit_ref = parse_orbit_ref(&self.title);
        self.cloud_cover = self
            .supplemental_information
            .as_deref()
            .and_then(parse_cloud_cover);
    }

    pub fn is_split_component(&self) -> bool {
        self.alternate.contains(SPLIT_MARKER)
    }

    /// Cloud cover used when ranking records of one footprint.
    pub fn ranking_cloud_cover(&self) -> Option<f64> {
        self.split_cloud_cover.or(self.cloud_cover)
    }

    pub fn dedup_keys(&self) -> Option<DedupKeys> {
        let granule = self.granule_ref.as_deref()?;
        let orbit = self.orbit_ref.as_deref()?;
        let granule_stub: String = granule.chars().take(GRANULE_STUB_LEN).collect();

        let prefix: Vec<&str> = self.title.splitn(4, '_').take(3).collect();
        let title_stub = format!("{}_{}", prefix.join("_"), granule_stub);

        Some(DedupKeys {
            title_stub,
            gran_orb: format!("{}_{}", granule_stub, orbit),
            granule_stub,
        })
    }

    pub fn footprint_bbox(&self) -> Option<BoundingBox> {
        self.geometry_wkt
            .as_deref()
            .and_then(|wkt| BoundingBox::from_wkt(wkt).ok())
    }

    /// Part of the layer name after the workspace prefix.
    pub fn layer_stub(&self) -> &str {
        layer_stub(&self.alternate)
    }
}

/// `geonode:S2A_x` -> `S2A_x`; names without a prefix are returned unchanged.
pub fn layer_stub(layer_name: &str) -> &str {
    layer_name
        .split_once(':')
        .map_or(layer_name, |(_, stub)| stub)
}

/// Fourth `_`-separated field of the title.
pub fn parse_granule_ref(title: &str) -> Option<String> {
    title
        .splitn(5, '_')
        .nth(3)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Second to last field when the title is split into at most six fields.
pub fn parse_orbit_ref(title: &str) -> Option<String> {
    let fields: Vec<&str> = title.splitn(6, '_').collect();
    if fields.len() < 2 {
        return None;
    }
    Some(fields[fields.len() - 2].to_string()).filter(|s| !s.is_empty())
}

/// Sixth whitespace-separated token of the supplemental information, i.e.
/// the value following `ARCSI_CLOUD_COVER:`.
pub fn parse_cloud_cover(supplemental_information: &str) -> Option<f64> {
    supplemental_information
        .split_whitespace()
        .nth(5)
        .and_then(|token| token.parse::<f64>().ok())
}

/// Derive the Sentinel-2 fields of every record, then pair each split half
/// with its partner's cloud cover.
pub fn annotate_sentinel2(records: &mut [CatalogRecord]) {
    for record in records.iter_mut() {
        record.derive_sentinel2_fields();
    }
    annotate_split_cloud_cover(records);
}

/// Look up each split partner by `alternate` within `records` and set
/// `split_cloud_cover` to the mean of both halves. Records with no split
/// reference, or whose partner is absent, score their own cloud cover.
pub fn annotate_split_cloud_cover(records: &mut [CatalogRecord]) {
    let cloud_by_alternate: HashMap<String, Option<f64>> = records
        .iter()
        .map(|r| (r.alternate.clone(), r.cloud_cover))
        .collect();

    for record in records.iter_mut() {
        record.split_cloud_cover_partner = record
            .split_granule_name
            .as_ref()
            .and_then(|name| cloud_by_alternate.get(name).copied().flatten());

        record.split_cloud_cover = match (record.cloud_cover, record.split_cloud_cover_partner) {
            (Some(own), Some(partner)) => Some((own + partner) / 2.0),
            (own, _) => own,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TITLE: &str = "S2A_date_lat1lon2_T12ABC_ORB034_etc";

    #[test]
    fn test_title_fields() {
        assert_eq!(parse_granule_ref(TITLE).as_deref(), Some("T12ABC"));
        assert_eq!(parse_orbit_ref(TITLE).as_deref(), Some("ORB034"));
        assert_eq!(
            parse_granule_ref("S2A_date_lat1lon2_T12ABCSPLIT1_ORB034_etc").as_deref(),
            Some("T12ABCSPLIT1")
        );
    }

    #[test]
    fn test_long_title_keeps_orbit_position() {
        let title = "S2A_20190401_lat52lon099_T30UXB_ORB037_utm30n_osgb_vmsk_sharp_rad_srefdem_stdsref";
        assert_eq!(parse_orbit_ref(title).as_deref(), Some("ORB037"));
    }

    #[test]
    fn test_short_title() {
        assert_eq!(parse_granule_ref("keep_api_test"), None);
        assert_eq!(parse_orbit_ref("single"), None);
    }

    #[test]
    fn test_cloud_cover_token() {
        assert_eq!(
            parse_cloud_cover("Data Collection Time: time\nARCSI_CLOUD_COVER: 0.12345\netc"),
            Some(0.12345)
        );
        assert_eq!(parse_cloud_cover("No information provided"), None);
    }

    #[test]
    fn test_dedup_keys() {
        let mut record = CatalogRecord::new(
            "S2A_date_lat1lon2_T12ABCSPLIT1_ORB034_etc",
            "geonode:S2A_date_lat1lon2_T12ABCSPLIT1_ORB034_etc",
        );
        record.derive_sentinel2_fields();
        let keys = record.dedup_keys().unwrap();
        assert_eq!(keys.title_stub, "S2A_date_lat1lon2_T12ABC");
        assert_eq!(keys.gran_orb, "T12ABC_ORB034");
        assert_eq!(keys.granule_stub, "T12ABC");
    }

    #[test]
    fn test_split_partner_average() {
        let mut a = CatalogRecord::new(TITLE, "geonode:a");
        a.supplemental_information = Some("Data Collection Time: time\nARCSI_CLOUD_COVER: 0.1\netc".into());
        a.split_granule_name = Some("geonode:b".into());
        let mut b = CatalogRecord::new("S2A_date_lat1lon2_T12ABCSPLIT1_ORB034_etc", "geonode:b");
        b.supplemental_information = Some("Data Collection Time: time\nARCSI_CLOUD_COVER: 0.3\netc".into());
        b.split_granule_name = Some("geonode:a".into());

        let mut records = vec![a, b];
        annotate_sentinel2(&mut records);

        assert_eq!(records[0].split_cloud_cover_partner, Some(0.3));
        assert_eq!(records[1].split_cloud_cover_partner, Some(0.1));
        assert_eq!(records[0].split_cloud_cover, records[1].split_cloud_cover);
        assert!((records[0].split_cloud_cover.unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_split_granule_shapes() {
        let object: CatalogRecord = serde_json::from_str(
            r#"{"alternate": "geonode:a", "split_granule": {"name": "geonode:b"}}"#,
        )
        .unwrap();
        assert_eq!(object.split_granule_name.as_deref(), Some("geonode:b"));

        let null: CatalogRecord =
            serde_json::from_str(r#"{"alternate": "geonode:a", "split_granule": null}"#).unwrap();
        assert_eq!(null.split_granule_name, None);
    }

    #[test]
    fn test_null_title() {
        let mut record: CatalogRecord =
            serde_json::from_str(r#"{"alternate": "geonode:a", "title": null}"#).unwrap();
        assert_eq!(record.title, "");
        assert_eq!(record.alternate, "geonode:a");

        record.derive_sentinel2_fields();
        assert_eq!(record.granule_ref, None);
        assert!(record.dedup_keys().is_none());
    }

    #[test]
    fn test_layer_stub() {
        assert_eq!(layer_stub("geonode:S2A_x"), "S2A_x");
        assert_eq!(layer_stub("S2A_x"), "S2A_x");
    }
}
