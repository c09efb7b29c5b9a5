//! Dense feed-forward networks
//!
//! Small per-role networks with momentum SGD, L2 regularisation, inverted
//! dropout and multiplicative learning-rate decay.

mod activation;
mod dense;

pub use activation::Activation;
pub use dense::{DenseNetwork, TrainOutcome};
