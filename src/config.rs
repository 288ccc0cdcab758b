//! Architecture hyper-parameters.
//!
//! A single [`ModelConfig`] describes every network of a domain adaptation
//! setup: the student and teacher encoders, the task heads and the domain
//! discriminators. Builders read it once at construction time and never
//! mutate it.
//!
//! The configuration is usually stored as JSON next to the training run:
//!
//! ```no_run
//! use tch_domain_adapt::{ModelConfig, Role};
//!
//! let cfg = ModelConfig::from_json("configs/har.json")?;
//! assert_eq!(cfg.embedding_dim(Role::Student), cfg.features_len * cfg.final_out_channels);
//! # Ok::<(), tch_domain_adapt::AdaptError>(())
//! ```
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backbones::TcnNorm;
use crate::Result;

/// Which of the two encoders of a distillation setup a network belongs to.
///
/// The teacher side reads the `*_t` channel widths of [`ModelConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Student,
    Teacher,
}

/// Hyper-parameters shared by all the networks of the crate.
///
/// Every field except `disc_t_input_dim` and `tcn_norm` is required when
/// deserializing; the [`Default`] implementation is only meant as a starting
/// point for code and is sized for 9-channel inertial activity windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of channels of the raw time-series.
    pub input_channels: i64,
    /// Width of the first convolution stage of the student encoder.
    pub mid_channels: i64,
    /// Width of the first convolution stage of the teacher encoder.
    pub mid_channels_t: i64,
    /// Number of output channels of the student encoder.
    pub final_out_channels: i64,
    /// Number of output channels of the teacher encoder.
    pub final_out_channels_t: i64,
    /// Kernel size of the first convolution.
    pub kernel_size: i64,
    /// Stride of the first convolution / residual stage.
    pub stride: i64,
    /// Dropout probability applied after the first CNN stage.
    pub dropout: f64,
    /// Length of the time axis after adaptive pooling.
    pub features_len: i64,
    /// Temporal block widths: both blocks use the last entry, and the second
    /// block gets a projection shortcut when the first entry differs from it.
    pub tcn_layers: Vec<i64>,
    /// Kernel size of the temporal blocks.
    pub tcn_kernel_size: i64,
    /// Normalization used inside the temporal blocks.
    #[serde(default)]
    pub tcn_norm: TcnNorm,
    /// Hidden width of the CoDATS classifier.
    pub hidden_dim: i64,
    /// Number of task classes.
    pub num_classes: i64,
    /// Hidden width of the domain discriminators.
    pub disc_hid_dim: i64,
    /// Input width of the teacher discriminator, defaults to the teacher
    /// embedding width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disc_t_input_dim: Option<i64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            input_channels: 9,
            mid_channels: 64,
            mid_channels_t: 64,
            final_out_channels: 128,
            final_out_channels_t: 128,
            kernel_size: 5,
            stride: 1,
            dropout: 0.5,
            features_len: 1,
            tcn_layers: vec![75, 150],
            tcn_kernel_size: 17,
            tcn_norm: TcnNorm::Batch,
            hidden_dim: 500,
            num_classes: 6,
            disc_hid_dim: 64,
            disc_t_input_dim: None,
        }
    }
}

/// The encoder-related part of a [`ModelConfig`], resolved for one [`Role`].
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderConfig {
    pub input_channels: i64,
    pub mid_channels: i64,
    pub final_out_channels: i64,
    pub kernel_size: i64,
    pub stride: i64,
    pub dropout: f64,
    pub features_len: i64,
    pub tcn_layers: Vec<i64>,
    pub tcn_kernel_size: i64,
    pub tcn_norm: TcnNorm,
}

impl ModelConfig {
    /// Parses a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a configuration from a JSON file.
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Writes the configuration as pretty-printed JSON.
    pub fn to_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn mid_channels(&self, role: Role) -> i64 {
        match role {
            Role::Student => self.mid_channels,
            Role::Teacher => self.mid_channels_t,
        }
    }

    pub fn final_out_channels(&self, role: Role) -> i64 {
        match role {
            Role::Student => self.final_out_channels,
            Role::Teacher => self.final_out_channels_t,
        }
    }

    /// Width of the flattened embedding produced by the pooled encoders.
    pub fn embedding_dim(&self, role: Role) -> i64 {
        self.features_len * self.final_out_channels(role)
    }

    /// Input width of the teacher-side discriminator.
    pub fn teacher_disc_input_dim(&self) -> i64 {
        self.disc_t_input_dim.unwrap_or_else(|| self.embedding_dim(Role::Teacher))
    }

    pub fn encoder(&self, role: Role) -> EncoderConfig {
        EncoderConfig {
            input_channels: self.input_channels,
            mid_channels: self.mid_channels(role),
            final_out_channels: self.final_out_channels(role),
            kernel_size: self.kernel_size,
            stride: self.stride,
            dropout: self.dropout,
            features_len: self.features_len,
            tcn_layers: self.tcn_layers.clone(),
            tcn_kernel_size: self.tcn_kernel_size,
            tcn_norm: self.tcn_norm,
        }
    }
}

impl EncoderConfig {
    /// Width of the flattened embedding produced by the pooled encoders.
    pub fn embedding_dim(&self) -> i64 {
        self.features_len * self.final_out_channels
    }

    /// Output width of the temporal convolutional encoder.
    pub fn tcn_out_dim(&self) -> i64 {
        self.tcn_layers.last().copied().unwrap_or(self.input_channels)
    }
}
