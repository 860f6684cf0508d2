use thiserror::Error;

/// Failures of the configuration store.
///
/// Per-frame simulation code never fails; only preset handling does.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no preset named `{0}`")]
    UnknownPreset(String),
    #[error("preset name must not be blank")]
    BlankPresetName,
    #[error("preset json: {0}")]
    Json(#[from] serde_json::Error),
}
