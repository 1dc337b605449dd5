use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayerGroupError {
    /// Bad arguments, detected before any request is sent.
    #[error("ERROR. {0}, aborting ...")]
    Validation(String),

    #[error("layer group request to {url} returned status {status}")]
    Status { status: u16, url: String },

    #[error("layer group request failed: {0}")]
    Transport(String),

    #[error("layer group response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LayerGroupError>;
