//! Causal truncation of padded convolution outputs.
use tch::nn::Module;
use tch::Tensor;

/// Removes the trailing `chomp_size` timesteps of a `(N, C, L)` tensor.
///
/// A convolution with dilation `d`, kernel `k` and symmetric padding
/// `p = (k - 1) * d` produces `L + p` timesteps; chomping `p` of them
/// leaves exactly `L` causal outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chomp1d {
    chomp_size: i64,
}

impl Chomp1d {
    pub fn new(chomp_size: i64) -> Chomp1d {
        Chomp1d { chomp_size }
    }

    pub fn chomp_size(&self) -> i64 {
        self.chomp_size
    }
}

impl Module for Chomp1d {
    fn forward(&self, xs: &Tensor) -> Tensor {
        if self.chomp_size == 0 {
            return xs.shallow_clone();
        }
        let len = xs.size()[2];
        xs.narrow(2, 0, len - self.chomp_size).contiguous()
    }
}
