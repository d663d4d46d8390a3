// Principal component analysis over embedding matrices.
//
// Fit computes the covariance of the mean-centered data and takes the top
// components from its SVD. Used to reduce a table before scoring
// (`pca_dimension`) and to project token samples to 2-D for visualization.

use nalgebra::{DMatrix, RowDVector, SVD};

use crate::embedding::Token;
use crate::error::{CalculatorError, CalculatorResult};

pub struct Pca {
    mean: RowDVector<f64>,
    components: DMatrix<f64>,
}

impl Pca {
    /// Fit `n_components` principal components to the rows of `x`.
    pub fn fit(x: &DMatrix<f64>, n_components: usize) -> CalculatorResult<Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_components == 0 || n_components > n_features {
            return Err(CalculatorError::Config(format!(
                "pca dimension {n_components} must be between 1 and {n_features}"
            )));
        }
        if n_samples < 2 {
            return Err(CalculatorError::Config(format!(
                "pca needs at least 2 samples, got {n_samples}"
            )));
        }

        let mean = x.row_mean();
        let centered_rows: Vec<RowDVector<f64>> = x.row_iter().map(|row| row - &mean).collect();
        let centered = DMatrix::from_rows(&centered_rows);

        let covariance = centered.transpose() * &centered / (n_samples as f64 - 1.0);
        let svd = SVD::new(covariance, true, true);
        let u = svd.u.ok_or_else(|| {
            CalculatorError::Config("pca decomposition did not converge".to_string())
        })?;

        Ok(Self {
            mean,
            components: u.columns(0, n_components).clone_owned(),
        })
    }

    /// Project the rows of `x` onto the fitted components.
    pub fn transform(&self, x: &DMatrix<f64>) -> DMatrix<f64> {
        let centered_rows: Vec<RowDVector<f64>> =
            x.row_iter().map(|row| row - &self.mean).collect();
        DMatrix::from_rows(&centered_rows) * &self.components
    }
}

/// Pack token embeddings into a row-per-token matrix.
pub fn embedding_matrix(tokens: &[Token]) -> DMatrix<f64> {
    let rows: Vec<RowDVector<f64>> = tokens
        .iter()
        .map(|t| RowDVector::from_row_slice(&t.embedding))
        .collect();
    DMatrix::from_rows(&rows)
}

/// Replace every token's embedding with its `dimension`-component projection.
pub fn reduce_tokens(tokens: &mut [Token], dimension: usize) -> CalculatorResult<()> {
    let x = embedding_matrix(tokens);
    let pca = Pca::fit(&x, dimension)?;
    let reduced = pca.transform(&x);
    for (token, row) in tokens.iter_mut().zip(reduced.row_iter()) {
        token.embedding = row.iter().copied().collect();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn projects_collinear_points_onto_first_component() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let pca = Pca::fit(&x, 2).expect("fit");
        let transformed = pca.transform(&x);
        let expected = DMatrix::from_row_slice(3, 2, &[-2.82842712, 0.0, 0.0, 0.0, 2.82842712, 0.0]);
        assert_abs_diff_eq!(transformed, expected, epsilon = 1e-6);
    }

    #[test]
    fn single_component_projection() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let pca = Pca::fit(&x, 1).expect("fit");
        let transformed = pca.transform(&x);
        let expected = DMatrix::from_row_slice(3, 1, &[-2.82842712, 0.0, 2.82842712]);
        assert_abs_diff_eq!(transformed, expected, epsilon = 1e-6);
    }

    #[test]
    fn zero_or_oversized_dimension_rejected() {
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        assert!(Pca::fit(&x, 0).is_err());
        assert!(Pca::fit(&x, 3).is_err());
    }

    #[test]
    fn single_sample_rejected() {
        let x = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        assert!(Pca::fit(&x, 1).is_err());
    }

    #[test]
    fn reduce_tokens_rewrites_embeddings() {
        let mut tokens = vec![
            Token {
                word: "a".to_string(),
                position: 0,
                line_num: 0,
                embedding: vec![1.0, 2.0, 3.0],
            },
            Token {
                word: "b".to_string(),
                position: 1,
                line_num: 0,
                embedding: vec![2.0, 4.0, 6.0],
            },
            Token {
                word: "c".to_string(),
                position: 0,
                line_num: 1,
                embedding: vec![3.0, 6.0, 9.0],
            },
        ];

        reduce_tokens(&mut tokens, 2).expect("reduce");
        assert!(tokens.iter().all(|t| t.embedding.len() == 2));
    }
}
