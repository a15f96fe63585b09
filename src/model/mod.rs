pub mod archive;
pub mod error;
pub mod loader;
pub mod tensor;

pub use error::ModelError;
pub use loader::{FullModel, InferenceModel, LoadStrategy, ModelHandle, ModelLoader, ServingModel};
pub use tensor::{ImageBatch, ModelOutput};
