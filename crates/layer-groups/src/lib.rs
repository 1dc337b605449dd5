//! Layer groups: named, server-side collections of catalog layers.
//!
//! [`create_layer_group`] and [`modify_layer_group`] validate their
//! arguments, then POST `{name?, abstract, layers}` to `/api/layer_groups/`
//! (or `/api/layer_groups/{id}/`) through [`post_to_layer_group_api`].

pub mod error;

use eods_common::{Connection, HttpBackend, HttpRequest};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, instrument};

pub use error::{LayerGroupError, Result};

/// JSON body of a create or modify request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerGroupPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub layers: Vec<String>,
}

fn validate_layers(layers: &[String]) -> Result<()> {
    if layers.is_empty() {
        return Err(LayerGroupError::Validation("list_of_layers is empty".into()));
    }
    if layers.iter().any(|layer| layer.trim().is_empty()) {
        return Err(LayerGroupError::Validation(
            "list_of_layers contains an empty layer name".into(),
        ));
    }
    Ok(())
}

/// Parse a layer group id given as text (e.g. on the command line).
pub fn parse_group_id(value: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| LayerGroupError::Validation("layer group ID is not an integer".into()))
}

/// POST `payload` to `url` and return the parsed JSON reply.
///
/// A non-2xx reply is `Err(Status)`, unless `quiet` is set, in which case
/// the error is logged and `Ok(None)` returned.
#[instrument(skip_all, fields(quiet = quiet))]
pub async fn post_to_layer_group_api(
    backend: &dyn HttpBackend,
    connection: &Connection,
    url: &str,
    payload: &LayerGroupPayload,
    quiet: bool,
) -> Result<Option<Value>> {
    let request = HttpRequest::post(url)
        .header("Authorization", format!("Bearer {}", connection.access_token))
        .json(serde_json::to_value(payload)?);

    let reply = backend
        .send(request)
        .await
        .map_err(|e| LayerGroupError::Transport(connection.redact(&e.to_string())))?;

    if !reply.is_success() {
        let failure = LayerGroupError::Status {
            status: reply.status,
            url: connection.redact(url),
        };
        if quiet {
            error!(error = %failure, "Error caught as exception");
            return Ok(None);
        }
        return Err(failure);
    }

    Ok(Some(reply.json()?))
}

/// Create a layer group named `name` holding `layers`.
#[instrument(skip_all, fields(name = %name, layers = layers.len()))]
pub async fn create_layer_group(
    backend: &dyn HttpBackend,
    connection: &Connection,
    layers: &[String],
    name: &str,
    abstract_text: &str,
) -> Result<Option<Value>> {
    validate_layers(layers)?;
    if name.trim().is_empty() {
        return Err(LayerGroupError::Validation(
            "layer group name string is empty".into(),
        ));
    }

    let payload = LayerGroupPayload {
        name: Some(name.to_string()),
        abstract_text: abstract_text.to_string(),
        layers: layers.to_vec(),
    };
    let response =
        post_to_layer_group_api(backend, connection, &connection.layer_group_url(None), &payload, false)
            .await?;
    info!("Layer group created");
    Ok(response)
}

/// Replace the layers and abstract of the layer group `group_id`.
#[instrument(skip_all, fields(group_id = group_id, layers = layers.len()))]
pub async fn modify_layer_group(
    backend: &dyn HttpBackend,
    connection: &Connection,
    layers: &[String],
    group_id: i64,
    abstract_text: &str,
) -> Result<Option<Value>> {
    validate_layers(layers)?;

    let payload = LayerGroupPayload {
        name: None,
        abstract_text: abstract_text.to_string(),
        layers: layers.to_vec(),
    };
    let url = connection.layer_group_url(Some(group_id));
    let response = post_to_layer_group_api(backend, connection, &url, &payload, false).await?;
    info!("Layer group modified");
    Ok(response)
}
