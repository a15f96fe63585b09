pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod model;
pub mod classify;
pub mod styles;
pub mod trends;
pub mod timer;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::{InputType, ModelMetadata, Network, NetworkError};
pub use model::{ImageBatch, InferenceModel, LoadStrategy, ModelError, ModelHandle, ModelLoader, ModelOutput};
pub use classify::{Classifier, ClassifyError, Guess, Prediction};
pub use styles::{StyleDescriptor, StyleLabel};
pub use trends::{TrendError, TrendPoint, TrendSeries};
pub use timer::Timer;
