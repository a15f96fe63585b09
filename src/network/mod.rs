pub mod metadata;
pub mod network;

pub use metadata::{InputType, ModelMetadata};
pub use network::{Network, NetworkError};
