pub mod pipeline;
pub mod preprocess;

pub use pipeline::{rank, top_two, ClassifyError, Classifier, Guess, Prediction, Timings};
