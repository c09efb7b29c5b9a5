//! Activation functions with derivatives taken on the activated value.

use serde::{Deserialize, Serialize};

/// Inputs are clamped to this magnitude before any exponential.
const EXP_CLAMP: f32 = 500.0;

/// Slope of the leaky ReLU below zero
const LEAKY_SLOPE: f32 = 0.01;

/// Supported activation functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// Logistic sigmoid
    Sigmoid,
    /// Hyperbolic tangent
    Tanh,
    /// Leaky ReLU with slope 0.01 below zero
    LeakyRelu,
    /// x * sigmoid(x)
    Swish,
}

impl Activation {
    /// Apply the activation to a pre-activation value.
    ///
    /// NaN maps to 0 and everything else is clamped to [-500, 500], so the
    /// result is always finite.
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        let x = sanitize(x);
        match self {
            Activation::Sigmoid => sigmoid(x),
            Activation::Tanh => x.tanh(),
            Activation::LeakyRelu => {
                if x > 0.0 {
                    x
                } else {
                    LEAKY_SLOPE * x
                }
            }
            Activation::Swish => x * sigmoid(x),
        }
    }

    /// Derivative expressed in terms of the activated output `a`.
    ///
    /// Swish has no closed form in `a`; the usual approximation
    /// `sig(a) + a * sig(a) * (1 - sig(a))` is used.
    #[inline]
    pub fn derivative(self, a: f32) -> f32 {
        let a = sanitize(a);
        match self {
            Activation::Sigmoid => a * (1.0 - a),
            Activation::Tanh => 1.0 - a * a,
            Activation::LeakyRelu => {
                if a > 0.0 {
                    1.0
                } else {
                    LEAKY_SLOPE
                }
            }
            Activation::Swish => {
                let s = sigmoid(a);
                s + a * s * (1.0 - s)
            }
        }
    }

    /// Whether He initialisation suits this activation better than Xavier
    pub fn prefers_he_init(self) -> bool {
        matches!(self, Activation::LeakyRelu)
    }
}

#[inline]
fn sanitize(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(-EXP_CLAMP, EXP_CLAMP)
    }
}

/// Two-branch logistic that never divides inf by inf
#[inline]
fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
