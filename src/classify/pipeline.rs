use std::cmp::Ordering;
use std::fmt;

use image::DynamicImage;
use serde::Serialize;

use crate::classify::preprocess;
use crate::model::{ImageBatch, InferenceModel, ModelError};
use crate::styles::StyleLabel;
use crate::timer::Timer;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ClassifyError {
    Decode(image::ImageError),
    Model(ModelError),
    /// The model's score vector does not line up with the label list.
    OutputShapeMismatch { expected: usize, actual: usize },
    /// Top-2 needs at least two classes.
    TooFewClasses(usize),
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifyError::Decode(e) => write!(f, "could not decode image: {}", e),
            ClassifyError::Model(e) => write!(f, "{}", e),
            ClassifyError::OutputShapeMismatch { expected, actual } => write!(
                f, "model produced {} scores but there are {} labels", actual, expected
            ),
            ClassifyError::TooFewClasses(n) => write!(f, "need at least 2 classes, got {}", n),
        }
    }
}

impl std::error::Error for ClassifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClassifyError::Decode(e) => Some(e),
            ClassifyError::Model(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ModelError> for ClassifyError {
    fn from(e: ModelError) -> Self { ClassifyError::Model(e) }
}

impl From<image::ImageError> for ClassifyError {
    fn from(e: image::ImageError) -> Self { ClassifyError::Decode(e) }
}

pub type Result<T> = std::result::Result<T, ClassifyError>;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Guess {
    /// Position in the model's output vector.
    pub index: usize,
    pub label: String,
    /// Raw model score.
    pub score: f64,
    /// `score * 100`.
    pub confidence: f64,
}

impl Guess {
    fn new(index: usize, label: &str, score: f64) -> Guess {
        Guess { index, label: label.to_owned(), score, confidence: score * 100.0 }
    }

    /// The built-in style this label names, if any.
    pub fn style(&self) -> Option<StyleLabel> {
        StyleLabel::from_name(&self.label)
    }
}

/// Milliseconds spent per stage; zero for stages that did not run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Timings {
    pub image_load_ms: i64,
    pub image_resize_ms: i64,
    pub inference_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub primary: Guess,
    pub secondary: Guess,
    pub timings: Timings,
}

impl Prediction {
    /// Picks the two best-scoring labels out of a flat score vector.
    pub fn from_scores(scores: &[f64], labels: &[String]) -> Result<Prediction> {
        if scores.len() != labels.len() {
            return Err(ClassifyError::OutputShapeMismatch {
                expected: labels.len(),
                actual: scores.len(),
            });
        }
        let (first, second) = top_two(scores)?;
        Ok(Prediction {
            primary: Guess::new(first, &labels[first], scores[first]),
            secondary: Guess::new(second, &labels[second], scores[second]),
            timings: Timings::default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Descending by score; NaN sorts after every number.
fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true)   => Ordering::Equal,
        (true, false)  => Ordering::Greater,
        (false, true)  => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// All indices ordered best first. Equal scores keep their original order,
/// so the lower index wins a tie.
pub fn rank(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| descending(scores[a], scores[b]));
    order
}

/// Indices of the best and second-best score.
pub fn top_two(scores: &[f64]) -> Result<(usize, usize)> {
    if scores.len() < 2 {
        return Err(ClassifyError::TooFewClasses(scores.len()));
    }
    let order = rank(scores);
    Ok((order[0], order[1]))
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Runs photos through a loaded model and names the result.
pub struct Classifier<'m> {
    model: &'m dyn InferenceModel,
    labels: Vec<String>,
}

impl<'m> Classifier<'m> {
    /// Uses the labels bundled with the model, falling back to the five
    /// built-in styles.
    pub fn new(model: &'m dyn InferenceModel) -> Self {
        let labels = model.labels()
            .map(|l| l.to_vec())
            .unwrap_or_else(StyleLabel::default_labels);
        Classifier { model, labels }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// One forward pass over a ready batch.
    pub fn classify_batch(&self, batch: &ImageBatch) -> Result<Prediction> {
        let mut t = Timer::new_start("Running inference");
        let scores = self.model.predict(batch)?.resolve()?;
        t.stop();

        let mut prediction = Prediction::from_scores(&scores, &self.labels)?;
        prediction.timings.inference_ms = t.millis();
        Ok(prediction)
    }

    pub fn classify_image(&self, image: &DynamicImage) -> Result<Prediction> {
        let mut t = Timer::new_start("Resizing image");
        let batch = preprocess::to_batch(image);
        t.stop();

        let mut prediction = self.classify_batch(&batch)?;
        prediction.timings.image_resize_ms = t.millis();
        Ok(prediction)
    }

    /// Decodes an uploaded JPEG/PNG and classifies it.
    pub fn classify_bytes(&self, data: &[u8]) -> Result<Prediction> {
        let mut t = Timer::new_start("Load image from memory");
        let image = preprocess::decode(data)?;
        t.stop();

        let mut prediction = self.classify_image(&image)?;
        prediction.timings.image_load_ms = t.millis();
        Ok(prediction)
    }
}
