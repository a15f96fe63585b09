use crate::model::error::{ModelError, Result};

/// A dense NHWC batch of images, values already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBatch {
    /// `[batch, height, width, channels]`
    pub shape: [usize; 4],
    pub data: Vec<f64>,
}

impl ImageBatch {
    /// Wraps one `height × width × channels` image as a batch of size 1.
    pub fn single(height: usize, width: usize, channels: usize, data: Vec<f64>) -> ImageBatch {
        debug_assert_eq!(data.len(), height * width * channels);
        ImageBatch { shape: [1, height, width, channels], data }
    }

    pub fn batch_size(&self) -> usize {
        self.shape[0]
    }

    /// Values per image.
    pub fn sample_len(&self) -> usize {
        self.shape[1] * self.shape[2] * self.shape[3]
    }

    pub fn samples(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks(self.sample_len().max(1))
    }
}

/// What one inference call hands back.
///
/// Full models produce a single tensor; a serving endpoint may produce several
/// named tensors, kept in the order its signature declares them.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    Single(Vec<f64>),
    Named(Vec<(String, Vec<f64>)>),
}

impl ModelOutput {
    /// The score tensor to classify with: the single output, or the first
    /// declared named output.
    pub fn resolve(self) -> Result<Vec<f64>> {
        match self {
            ModelOutput::Single(v) => Ok(v),
            ModelOutput::Named(outputs) => outputs
                .into_iter()
                .next()
                .map(|(_, v)| v)
                .ok_or(ModelError::EmptyOutput),
        }
    }
}
