use serde::{Deserialize, Serialize};

/// Describes how to interpret the input fed to a Network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InputType {
    /// Comma-separated f64 values.
    Numeric,
    /// Grayscale image resized to width×height, normalized to [0, 1].
    ImageGrayscale { width: u32, height: u32 },
    /// RGB image resized to width×height, normalized to [0, 1], flattened as R,G,B,...
    ImageRgb { width: u32, height: u32 },
}

impl InputType {
    /// Values one sample of this type flattens to; `None` for `Numeric`,
    /// whose width is whatever the first layer takes.
    pub fn input_len(&self) -> Option<usize> {
        match *self {
            InputType::Numeric => None,
            InputType::ImageGrayscale { width, height } => Some(width as usize * height as usize),
            InputType::ImageRgb { width, height } => Some(width as usize * height as usize * 3),
        }
    }
}

/// Optional annotations attached to a saved Network.
/// All fields are Option<> so models without metadata deserialize cleanly.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelMetadata {
    pub description: Option<String>,
    /// Checked against the first layer's fan-in when the network is validated.
    pub input_type: Option<InputType>,
    /// Class labels in output-vector order (e.g. ["Baggy", "Bootcut", ...]).
    /// When present these override the built-in style list.
    pub output_labels: Option<Vec<String>>,
}
