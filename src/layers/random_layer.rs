//! Conditioning maps for conditional adversarial adaptation (CDAN).
//!
//! See "Conditional Adversarial Domain Adaptation", Long et al. 2018.
use std::borrow::Borrow;

use tch::{nn, Kind, Tensor};

use crate::{AdaptError, Result};

pub const DEFAULT_OUTPUT_DIM: i64 = 1024;

/// Combines several feature sources through fixed random projections.
///
/// Each source `i` of width `input_dims[i]` is projected by its own
/// standard-normal `(input_dims[i], output_dim)` matrix, the projections are
/// multiplied elementwise and the product is divided by
/// `output_dim^(1/k)` for `k` sources.
///
/// The matrices are registered as non-trainable variables: they are never
/// returned by `VarStore::trainable_variables` and move along with
/// `VarStore::set_device`.
#[derive(Debug)]
pub struct RandomLayer {
    matrices: Vec<Tensor>,
    output_dim: i64,
}

impl RandomLayer {
    pub fn new<'a, T: Borrow<nn::Path<'a>>>(
        vs: T,
        input_dims: &[i64],
        output_dim: i64,
    ) -> RandomLayer {
        let vs = vs.borrow();
        let matrices = input_dims
            .iter()
            .enumerate()
            .map(|(index, &input_dim)| {
                let dims = [input_dim, output_dim];
                let mut matrix = vs.zeros_no_train(&format!("random_matrix{index}"), &dims);
                let values = Tensor::randn(dims, (Kind::Float, vs.device()));
                tch::no_grad(|| matrix.copy_(&values));
                matrix
            })
            .collect();
        RandomLayer { matrices, output_dim }
    }

    pub fn output_dim(&self) -> i64 {
        self.output_dim
    }

    pub fn matrices(&self) -> &[Tensor] {
        &self.matrices
    }

    /// The divisor applied to the combined projections.
    pub fn scale(&self) -> f64 {
        (self.output_dim as f64).powf(1.0 / self.matrices.len() as f64)
    }

    /// Projects and combines one `(N, input_dims[i])` tensor per source into
    /// a `(N, output_dim)` tensor.
    pub fn forward(&self, xs: &[&Tensor]) -> Result<Tensor> {
        if xs.is_empty() {
            return Err(AdaptError::EmptyInput);
        }
        if xs.len() != self.matrices.len() {
            return Err(AdaptError::InputCount { expected: self.matrices.len(), actual: xs.len() });
        }
        let mut projections = xs.iter().zip(self.matrices.iter()).map(|(x, m)| x.f_mm(m));
        let mut combined = match projections.next() {
            Some(first) => first?.f_div_scalar(self.scale())?,
            None => return Err(AdaptError::EmptyInput),
        };
        for projection in projections {
            combined = combined.f_mul(&projection?)?;
        }
        Ok(combined)
    }
}

/// Outer product of class predictions `(N, C)` and features `(N, F)`,
/// flattened to `(N, C * F)`.
pub fn multilinear_map(features: &Tensor, predictions: &Tensor) -> Result<Tensor> {
    let (batch, feature_dim) = features.size2()?;
    let (_, num_classes) = predictions.size2()?;
    let outer = predictions.f_unsqueeze(2)?.f_bmm(&features.f_unsqueeze(1)?)?;
    Ok(outer.f_view([batch, num_classes * feature_dim])?)
}
