use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer{
    pub size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction
}

impl Layer {
    pub fn new(size: usize, input_size: usize, activation: ActivationFunction) -> Layer {
        Layer {
            size,
            weights: Matrix::random(input_size, size),
            biases: Matrix::random(1, size),
            activator: activation
        }
    }

    /// Number of values this layer consumes.
    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    /// `act(x·W + b)` for a single sample. The caller guarantees
    /// `input.len() == self.input_size()`.
    pub fn feed_from(&self, input: Vec<f64>) -> Vec<f64> {
        let z = Matrix::row(input).dot(&self.weights) + self.biases.clone();
        self.activator.apply(&z.data[0])
    }

    /// Checks that the stored matrices agree with `size` and with each other.
    pub fn shape_problem(&self) -> Option<String> {
        if !self.weights.is_rectangular() || !self.biases.is_rectangular() {
            return Some("weights or biases are not rectangular".into());
        }
        if self.weights.cols != self.size {
            return Some(format!(
                "weights have {} columns but the layer has {} neurons",
                self.weights.cols, self.size
            ));
        }
        if self.biases.rows != 1 || self.biases.cols != self.size {
            return Some(format!(
                "biases are {}x{}, expected 1x{}",
                self.biases.rows, self.biases.cols, self.size
            ));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_layer_computes_affine_map() {
        let layer = Layer {
            size: 2,
            weights: Matrix::from_data(vec![vec![1.0, 0.0], vec![0.0, 2.0]]),
            biases: Matrix::row(vec![0.5, -1.0]),
            activator: ActivationFunction::Identity,
        };
        assert_eq!(layer.feed_from(vec![3.0, 4.0]), vec![3.5, 7.0]);
    }

    #[test]
    fn random_layer_is_well_formed() {
        let layer = Layer::new(4, 3, ActivationFunction::ReLU);
        assert_eq!(layer.input_size(), 3);
        assert!(layer.shape_problem().is_none());
    }

    #[test]
    fn bias_width_mismatch_is_reported() {
        let mut layer = Layer::new(2, 2, ActivationFunction::Sigmoid);
        layer.biases = Matrix::row(vec![0.0; 3]);
        assert!(layer.shape_problem().unwrap().contains("biases"));
    }
}
