use rand::prelude::*;
use serde::{Serialize, Deserialize};
use std::ops::{Add, Mul};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    pub fn random(rows: usize, cols: usize) -> Matrix {
        let mut rng = rand::thread_rng();
        let mut res = Matrix::zeros(rows, cols);

        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = rng.gen::<f64>() * 2.0 - 1.0;
            }
        }

        res
    }

    /// A single-row matrix, the shape a layer consumes.
    pub fn row(values: Vec<f64>) -> Matrix {
        Matrix { rows: 1, cols: values.len(), data: vec![values] }
    }

    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data.first().map_or(0, |r| r.len()),
            data
        }
    }

    /// Matrix product without consuming either operand.
    ///
    /// Dense layers hold large weight matrices (an RGB 224x224 input layer has
    /// 150 528 rows), so the forward pass multiplies by reference.
    pub fn dot(&self, rhs: &Matrix) -> Matrix {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i][k];
                if a == 0.0 {
                    continue;
                }
                for j in 0..rhs.cols {
                    res.data[i][j] += a * rhs.data[k][j];
                }
            }
        }

        res
    }

    /// `true` when every row holds exactly `cols` values.
    pub fn is_rectangular(&self) -> bool {
        self.data.len() == self.rows && self.data.iter().all(|r| r.len() == self.cols)
    }
}

impl Add for Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = self;

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] += rhs.data[i][j];
            }
        }

        res
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        self.dot(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_matches_hand_computed_product() {
        let a = Matrix::from_data(vec![vec![1.0, 2.0]]);
        let b = Matrix::from_data(vec![vec![3.0, 4.0, 5.0], vec![6.0, 7.0, 8.0]]);
        let c = a * b;
        assert_eq!(c.rows, 1);
        assert_eq!(c.cols, 3);
        assert_eq!(c.data[0], vec![15.0, 18.0, 21.0]);
    }

    #[test]
    fn empty_data_has_zero_columns() {
        let m = Matrix::from_data(vec![]);
        assert_eq!((m.rows, m.cols), (0, 0));
        assert!(m.is_rectangular());
    }

    #[test]
    fn ragged_rows_are_detected() {
        let mut m = Matrix::zeros(2, 2);
        m.data[1].pop();
        assert!(!m.is_rectangular());
    }

    #[test]
    #[should_panic(expected = "incorrect sizes")]
    fn mismatched_add_panics() {
        let _ = Matrix::zeros(1, 2) + Matrix::zeros(1, 3);
    }
}
