use std::fmt;

use crate::network::NetworkError;

/// Everything that can go wrong between receiving a model upload and getting
/// scores out of it.
#[derive(Debug)]
pub enum ModelError {
    /// The upload is neither a zip, a gzipped tar, nor a JSON model.
    UnsupportedArtifact,
    /// The archive has no entries.
    EmptyArchive,
    /// An archive entry would extract outside the scratch directory.
    UnsafePath(String),
    /// The selected entry is not something the loader can read as a model.
    NotAModel(String),
    /// The serving manifest does not declare the requested endpoint.
    EndpointNotFound { endpoint: String, available: Vec<String> },
    /// The serving endpoint declares no outputs.
    NoOutputs(String),
    /// A named-output result had nothing in it to resolve.
    EmptyOutput,
    /// A model file failed to parse or validate.
    Network { path: String, source: NetworkError },
    /// The forward pass rejected the batch.
    Inference(NetworkError),
    Manifest(serde_json::Error),
    Zip(zip::result::ZipError),
    Io(std::io::Error),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::UnsupportedArtifact => write!(
                f, "unsupported model artifact: expected a .zip, a .tar.gz or a JSON model file"
            ),
            ModelError::EmptyArchive => write!(f, "the model archive is empty"),
            ModelError::UnsafePath(p) => write!(f, "archive entry '{}' escapes the extraction directory", p),
            ModelError::NotAModel(p) => write!(f, "'{}' is not a loadable model", p),
            ModelError::EndpointNotFound { endpoint, available } => write!(
                f, "serving endpoint '{}' not found (available: {})", endpoint, available.join(", ")
            ),
            ModelError::NoOutputs(e) => write!(f, "serving endpoint '{}' declares no outputs", e),
            ModelError::EmptyOutput => write!(f, "model returned no outputs"),
            ModelError::Network { path, source } => write!(f, "could not load '{}': {}", path, source),
            ModelError::Inference(e) => write!(f, "inference failed: {}", e),
            ModelError::Manifest(e) => write!(f, "invalid signatures.json: {}", e),
            ModelError::Zip(e) => write!(f, "invalid zip archive: {}", e),
            ModelError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ModelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelError::Network { source, .. } => Some(source),
            ModelError::Inference(e) => Some(e),
            ModelError::Manifest(e) => Some(e),
            ModelError::Zip(e) => Some(e),
            ModelError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ModelError {
    fn from(e: std::io::Error) -> Self { ModelError::Io(e) }
}

impl From<zip::result::ZipError> for ModelError {
    fn from(e: zip::result::ZipError) -> Self { ModelError::Zip(e) }
}

pub type Result<T> = std::result::Result<T, ModelError>;
