//! What to submit: a payload template and its substitutions.

use std::collections::BTreeMap;

use eods_common::{BboxParseError, BoundingBox};
use wps_protocol::template::MIMETYPE_KEY;
use wps_protocol::BuiltinTemplates;

pub const LAYER_NAME_KEY: &str = "template_layer_name";
pub const OUTPUT_FORMAT_KEY: &str = "template_outputformat";
pub const LOWER_CORNER_KEY: &str = "template_ll";
pub const UPPER_CORNER_KEY: &str = "template_ur";
pub const CLIP_GEOMETRY_KEY: &str = "template_clip_geom";

/// One job to run.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    pub layer_name: String,
    pub template_id: String,
    pub substitutions: BTreeMap<String, String>,
}

impl JobRequest {
    /// `substitutions` must name the layer under `template_layer_name`
    /// if the template refers to it; `layer_name` is only used locally.
    pub fn new(
        layer_name: impl Into<String>,
        template_id: impl Into<String>,
        substitutions: BTreeMap<String, String>,
    ) -> Self {
        Self {
            layer_name: layer_name.into(),
            template_id: template_id.into(),
            substitutions,
        }
    }

    /// `gs:Download` of a whole layer.
    pub fn download(layer_name: &str, output_format: &str, mime_type: &str) -> Self {
        let substitutions = BTreeMap::from([
            (LAYER_NAME_KEY.to_string(), layer_name.to_string()),
            (OUTPUT_FORMAT_KEY.to_string(), output_format.to_string()),
            (MIMETYPE_KEY.to_string(), mime_type.to_string()),
        ]);
        Self::new(layer_name, BuiltinTemplates::GS_DOWNLOAD, substitutions)
    }

    /// `ras:CropCoverage` of a layer to `clip_wkt`.
    ///
    /// The requested coverage bounds are the layer's WGS84 `footprint_wkt`
    /// corners projected to British National Grid. `clip_wkt` must already
    /// be in EPSG:27700 and is passed through untouched.
    pub fn raster_crop(
        layer_name: &str,
        mime_type: &str,
        footprint_wkt: &str,
        clip_wkt: &str,
    ) -> Result<Self, BboxParseError> {
        let corners = BoundingBox::from_wkt(footprint_wkt)?.to_british_national_grid();
        BoundingBox::from_wkt(clip_wkt)?;
        let substitutions = BTreeMap::from([
            (LAYER_NAME_KEY.to_string(), layer_name.to_string()),
            (MIMETYPE_KEY.to_string(), mime_type.to_string()),
            (LOWER_CORNER_KEY.to_string(), corners.lower_left()),
            (UPPER_CORNER_KEY.to_string(), corners.upper_right()),
            (CLIP_GEOMETRY_KEY.to_string(), clip_wkt.to_string()),
        ]);
        Ok(Self::new(layer_name, BuiltinTemplates::RAS_CROP_COVERAGE, substitutions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_request() {
        let request = JobRequest::download("geonode:S2A_x", "image/tiff", "application/zip");
        assert_eq!(request.template_id, "gsdownload");
        assert_eq!(request.substitutions[LAYER_NAME_KEY], "geonode:S2A_x");
        assert_eq!(request.substitutions["template_mimetype"], "application/zip");
    }

    const FOOTPRINT: &str = "POLYGON((-2.4591467333 51.7495497809,-2.4591467333 51.8218717504,\
                             -2.34253580452 51.8218717504,-2.34253580452 51.7495497809,\
                             -2.4591467333 51.7495497809))";
    const CLIP: &str =
        "POLYGON((370000 207000, 375000 207000, 375000 212000, 370000 212000, 370000 207000))";

    fn corner(value: &str) -> (f64, f64) {
        let (x, y) = value.split_once(' ').unwrap();
        (x.parse().unwrap(), y.parse().unwrap())
    }

    #[test]
    fn test_crop_corners_from_projected_footprint() {
        let request =
            JobRequest::raster_crop("geonode:S2A_x", "application/zip", FOOTPRINT, CLIP).unwrap();

        let (llx, lly) = corner(&request.substitutions[LOWER_CORNER_KEY]);
        let (urx, ury) = corner(&request.substitutions[UPPER_CORNER_KEY]);
        assert!((llx - 368_399.602_560_229_7).abs() < 0.01);
        assert!((lly - 205_750.317_332_262_06).abs() < 0.01);
        assert!((urx - 376_487.607_107_436_6).abs() < 0.01);
        assert!((ury - 213_749.823_232_911_47).abs() < 0.01);
        assert_eq!(request.substitutions[CLIP_GEOMETRY_KEY], CLIP);
    }

    #[test]
    fn test_crop_rejects_bad_geometry() {
        assert!(JobRequest::raster_crop("l", "image/tiff", "nope", CLIP).is_err());
        assert!(JobRequest::raster_crop("l", "image/tiff", FOOTPRINT, "nope").is_err());
    }
}
