//! # quill-model
//!
//! Microstructure signal inference with a deterministic latency envelope.
//!
//! This crate provides:
//! - [`features::MicrostructureFeatures`]: the 12-dimensional feature
//!   vector and its extractor
//! - [`network::MicroDnn`]: a fixed-topology 12-8-3 dense network whose
//!   `predict` pads wall-clock execution to a constant
//! - [`signal::RegimeClassifier`]: mapping of model output and realized
//!   volatility onto a market regime
//!
//! ## Example
//!
//! ```rust
//! use quill_model::features::MicrostructureFeatures;
//! use quill_model::network::MicroDnn;
//!
//! let model = MicroDnn::random(42, 400);
//! let prediction = model.predict(&MicrostructureFeatures::default());
//! let total: f64 = prediction.probabilities.iter().sum();
//! assert!((total - 1.0).abs() < 1e-9);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod features;
pub mod network;
pub mod signal;

pub use features::{FeatureExtractor, MicrostructureFeatures};
pub use network::{MicroDnn, Prediction};
pub use signal::RegimeClassifier;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::features::{FeatureExtractor, MicrostructureFeatures};
    pub use crate::network::{MicroDnn, Prediction};
    pub use crate::signal::RegimeClassifier;
}
