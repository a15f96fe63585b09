use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::{Serialize, Deserialize};

use crate::{activation::activation::ActivationFunction, layers::dense::Layer};
use crate::network::metadata::ModelMetadata;

#[derive(Debug)]
pub enum NetworkError {
    /// The network has no layers at all.
    Empty,
    /// Layer `index` is internally inconsistent or does not fit its predecessor.
    BadLayer { index: usize, reason: String },
    /// The sample fed to `forward` has the wrong length.
    InputSize { expected: usize, actual: usize },
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::Empty => write!(f, "network has no layers"),
            NetworkError::BadLayer { index, reason } => write!(f, "layer {}: {}", index, reason),
            NetworkError::InputSize { expected, actual } => write!(
                f, "input length mismatch: network expects {} values, got {}", expected, actual
            ),
            NetworkError::Io(e) => write!(f, "{}", e),
            NetworkError::Json(e) => write!(f, "invalid network JSON: {}", e),
        }
    }
}

impl std::error::Error for NetworkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NetworkError::Io(e) => Some(e),
            NetworkError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for NetworkError {
    fn from(e: std::io::Error) -> Self { NetworkError::Io(e) }
}

impl From<serde_json::Error> for NetworkError {
    fn from(e: serde_json::Error) -> Self { NetworkError::Json(e) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ModelMetadata>,
}

impl Network {
    /// Builds a randomly initialised network from (size, input_size, activation) tuples.
    pub fn new(layer_specs: Vec<(usize, usize, ActivationFunction)>) -> Network {
        let layers = layer_specs.into_iter()
            .map(|(size, input_size, activation)| Layer::new(size, input_size, activation))
            .collect();
        Network { layers, metadata: None }
    }

    pub fn with_metadata(mut self, metadata: ModelMetadata) -> Network {
        self.metadata = Some(metadata);
        self
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.input_size())
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.size)
    }

    /// Labels bundled with the model, if any.
    pub fn output_labels(&self) -> Option<&[String]> {
        self.metadata.as_ref().and_then(|m| m.output_labels.as_deref())
    }

    /// Forward pass for a single sample.
    pub fn forward(&self, input: Vec<f64>) -> Result<Vec<f64>, NetworkError> {
        if self.layers.is_empty() {
            return Err(NetworkError::Empty);
        }
        if input.len() != self.input_size() {
            return Err(NetworkError::InputSize { expected: self.input_size(), actual: input.len() });
        }
        let mut current = input;
        for layer in &self.layers {
            current = layer.feed_from(current);
        }
        Ok(current)
    }

    /// Checks every layer's shape and that each layer consumes what the
    /// previous one produces. Deserialized networks must pass this before
    /// `forward` is called.
    pub fn validate(&self) -> Result<(), NetworkError> {
        if self.layers.is_empty() {
            return Err(NetworkError::Empty);
        }
        for (index, layer) in self.layers.iter().enumerate() {
            if let Some(reason) = layer.shape_problem() {
                return Err(NetworkError::BadLayer { index, reason });
            }
            if index > 0 {
                let prev = self.layers[index - 1].size;
                if layer.input_size() != prev {
                    return Err(NetworkError::BadLayer {
                        index,
                        reason: format!(
                            "expects {} inputs but the previous layer has {} neurons",
                            layer.input_size(), prev
                        ),
                    });
                }
            }
        }
        if let Some(input_type) = self.metadata.as_ref().and_then(|m| m.input_type.as_ref()) {
            if let Some(expected) = input_type.input_len() {
                if expected != self.input_size() {
                    return Err(NetworkError::BadLayer {
                        index: 0,
                        reason: format!(
                            "declared input {:?} is {} values but the layer takes {}",
                            input_type, expected, self.input_size()
                        ),
                    });
                }
            }
        }
        if let Some(labels) = self.output_labels() {
            if labels.len() != self.output_size() {
                return Err(NetworkError::BadLayer {
                    index: self.layers.len() - 1,
                    reason: format!(
                        "{} output labels bundled for {} outputs",
                        labels.len(), self.output_size()
                    ),
                });
            }
        }
        Ok(())
    }

    /// Serializes the network weights to a JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), NetworkError> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Deserializes and validates a network from any reader.
    pub fn from_reader(reader: impl Read) -> Result<Network, NetworkError> {
        let network: Network = serde_json::from_reader(std::io::BufReader::new(reader))?;
        network.validate()?;
        Ok(network)
    }

    /// Deserializes a network from a JSON file previously written by `save_json`.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Network, NetworkError> {
        let file = std::fs::File::open(path)?;
        Network::from_reader(file)
    }
}
