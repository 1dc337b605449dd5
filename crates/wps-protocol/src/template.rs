//! Execute-request payload rendering.
//!
//! A template is an XML document containing literal placeholder keys
//! (`template_layer_name`, `template_mimetype`, ...). Rendering is a plain
//! find/replace of every key with its value.

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

/// Placeholder whose value is written as a quoted XML attribute.
pub const MIMETYPE_KEY: &str = "template_mimetype";

const GS_DOWNLOAD: &str = include_str!("../templates/gsdownload.xml");
const RAS_CROP_COVERAGE: &str = include_str!("../templates/rascropcoverage.xml");

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("payload template '{0}' not found")]
    NotFound(String),

    #[error("failed to read payload template {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Builds a request body from a template id and a substitution map.
pub trait PayloadRenderer: Send + Sync {
    fn render(
        &self,
        template_id: &str,
        substitutions: &BTreeMap<String, String>,
    ) -> Result<String, TemplateError>;
}

/// Reduce `gsdownload_template.xml`, `gsdownload.xml` and `gsdownload` to
/// the same id.
pub fn normalize_template_id(template_id: &str) -> &str {
    let id = template_id.strip_suffix(".xml").unwrap_or(template_id);
    id.strip_suffix("_template").unwrap_or(id)
}

/// Replace every placeholder key in `template` with its value.
pub fn apply_substitutions(template: &str, substitutions: &BTreeMap<String, String>) -> String {
    substitutions
        .iter()
        .fold(template.to_string(), |doc, (key, value)| {
            if key == MIMETYPE_KEY {
                doc.replace(key.as_str(), &format!("\"{}\"", value))
            } else {
                doc.replace(key.as_str(), value)
            }
        })
}

/// Templates compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTemplates;

impl BuiltinTemplates {
    pub const GS_DOWNLOAD: &'static str = "gsdownload";
    pub const RAS_CROP_COVERAGE: &'static str = "rascropcoverage";

    pub fn get(template_id: &str) -> Option<&'static str> {
        match normalize_template_id(template_id) {
            Self::GS_DOWNLOAD => Some(GS_DOWNLOAD),
            Self::RAS_CROP_COVERAGE => Some(RAS_CROP_COVERAGE),
            _ => None,
        }
    }
}

impl PayloadRenderer for BuiltinTemplates {
    fn render(
        &self,
        template_id: &str,
        substitutions: &BTreeMap<String, String>,
    ) -> Result<String, TemplateError> {
        let template =
            Self::get(template_id).ok_or_else(|| TemplateError::NotFound(template_id.to_string()))?;
        Ok(apply_substitutions(template, substitutions))
    }
}

/// Reads `<dir>/<id>.xml`, falling back to [`BuiltinTemplates`] when the
/// file does not exist.
#[derive(Debug, Clone)]
pub struct FileTemplateRenderer {
    dir: PathBuf,
}

impl FileTemplateRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PayloadRenderer for FileTemplateRenderer {
    fn render(
        &self,
        template_id: &str,
        substitutions: &BTreeMap<String, String>,
    ) -> Result<String, TemplateError> {
        let candidates = [
            self.dir.join(template_id),
            self.dir.join(format!("{}.xml", normalize_template_id(template_id))),
        ];

        for path in candidates.iter().filter(|p| p.is_file()) {
            let template = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
                path: path.display().to_string(),
                source,
            })?;
            debug!(path = %path.display(), "Rendering payload template from file");
            return Ok(apply_substitutions(&template, substitutions));
        }

        BuiltinTemplates.render(template_id, substitutions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_normalize_template_id() {
        assert_eq!(normalize_template_id("gsdownload_template.xml"), "gsdownload");
        assert_eq!(normalize_template_id("gsdownload.xml"), "gsdownload");
        assert_eq!(normalize_template_id("gsdownload"), "gsdownload");
    }

    #[test]
    fn test_mimetype_is_quoted() {
        let out = apply_substitutions(
            "<a mimeType=template_mimetype>template_layer_name</a>",
            &subs(&[
                ("template_layer_name", "geonode:layer"),
                ("template_mimetype", "application/zip"),
            ]),
        );
        assert_eq!(out, "<a mimeType=\"application/zip\">geonode:layer</a>");
    }

    #[test]
    fn test_builtin_download_template() {
        let out = BuiltinTemplates
            .render(
                "gsdownload_template.xml",
                &subs(&[
                    ("template_layer_name", "geonode:S2A_test"),
                    ("template_outputformat", "image/tiff"),
                    ("template_mimetype", "application/zip"),
                ]),
            )
            .unwrap();
        assert!(out.contains("<ows:Identifier>gs:Download</ows:Identifier>"));
        assert!(out.contains("<wps:LiteralData>geonode:S2A_test</wps:LiteralData>"));
        assert!(out.contains("mimeType=\"application/zip\""));
        assert!(!out.contains("template_"));
    }

    #[test]
    fn test_unknown_template() {
        let err = BuiltinTemplates.render("nope", &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(_)));
    }

    #[test]
    fn test_file_renderer_prefers_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("custom.xml"), "<x>template_layer_name</x>").unwrap();

        let renderer = FileTemplateRenderer::new(dir.path());
        let out = renderer
            .render("custom", &subs(&[("template_layer_name", "lyr")]))
            .unwrap();
        assert_eq!(out, "<x>lyr</x>");

        // Falls back to the builtin set
        assert!(renderer.render("rascropcoverage", &BTreeMap::new()).is_ok());
    }
}
