//! Process-wide libtorch settings.
use std::sync::Once;

use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendOptions {
    /// Let cuDNN benchmark the convolution algorithms for each input shape.
    /// The dilated temporal convolutions benefit the most from it.
    pub cudnn_benchmark: bool,
}

impl Default for BackendOptions {
    fn default() -> Self {
        BackendOptions { cudnn_benchmark: true }
    }
}

static INIT: Once = Once::new();

/// Applies `options` to the libtorch global context.
///
/// Only the first call has an effect; model builders never call this.
pub fn init_backend(options: BackendOptions) {
    INIT.call_once(|| {
        tch::Cuda::cudnn_set_benchmark(options.cudnn_benchmark);
        info!(
            cudnn_benchmark = options.cudnn_benchmark,
            cuda = tch::Cuda::is_available(),
            "initialized torch backend"
        );
    });
}
