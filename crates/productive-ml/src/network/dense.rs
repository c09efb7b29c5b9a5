//! Feed-forward network trained one sample at a time.
//!
//! Weight matrix `i` maps layer `i` to layer `i + 1` and has shape
//! `(layer[i], layer[i + 1])`, so a forward step is `a · W + b` on a row
//! vector. Updates use momentum SGD with an L2 penalty on weights:
//!
//! ```text
//! Δ = lr · (grad − l2 · w) + momentum · Δ_prev
//! w = w + Δ
//! ```
//!
//! where `grad` is the outer product of the previous layer's (post-dropout)
//! activation and the layer delta, with the error taken as `target − output`.

use crate::config::TrainingParams;
use crate::error::{MlError, Result};
use crate::network::Activation;
use crate::role::Architecture;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Loss and accuracy of one training call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainOutcome {
    /// Mean squared error over the output components
    pub loss: f32,
    /// Fraction of output components within tolerance of the target
    pub accuracy: f32,
}

/// Activations recorded during a forward pass
struct ForwardTrace {
    /// Input to each weight layer (post-dropout for hidden layers)
    inputs: Vec<Array1<f32>>,
    /// Activated output of each weight layer, before dropout
    activated: Vec<Array1<f32>>,
    /// Inverted-dropout scale per hidden unit (0 or 1/(1-p)); `None` when no dropout ran
    masks: Vec<Option<Array1<f32>>>,
}

impl ForwardTrace {
    fn output(&self) -> &Array1<f32> {
        // Every network has at least one weight layer.
        &self.activated[self.activated.len() - 1]
    }
}

/// Dense feed-forward network with momentum SGD
#[derive(Debug, Clone)]
pub struct DenseNetwork {
    architecture: Architecture,
    params: TrainingParams,
    learning_rate: f32,
    weights: Vec<Array2<f32>>,
    biases: Vec<Array1<f32>>,
    weight_velocity: Vec<Array2<f32>>,
    bias_velocity: Vec<Array1<f32>>,
    rng: StdRng,
}

impl DenseNetwork {
    /// Build a network with randomly initialised weights.
    ///
    /// Leaky-ReLU networks use He-normal initialisation, all others
    /// Xavier-uniform. Biases and velocities start at zero.
    pub fn new(architecture: Architecture, params: TrainingParams, seed: u64) -> Result<Self> {
        let sizes = architecture.layer_sizes();
        if sizes.iter().any(|&s| s == 0) {
            return Err(MlError::Config(format!(
                "layer widths must be non-zero, got {:?}",
                sizes
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut weights = Vec::with_capacity(sizes.len() - 1);
        let mut biases = Vec::with_capacity(sizes.len() - 1);

        for pair in sizes.windows(2) {
            let (fan_in, fan_out) = (pair[0], pair[1]);
            let w = if architecture.activation.prefers_he_init() {
                let std = (2.0 / fan_in as f64).sqrt();
                let normal = Normal::new(0.0, std)
                    .map_err(|e| MlError::Config(format!("He initialisation: {}", e)))?;
                Array2::from_shape_fn((fan_in, fan_out), |_| normal.sample(&mut rng) as f32)
            } else {
                let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
                Array2::from_shape_fn((fan_in, fan_out), |_| rng.gen_range(-limit..limit))
            };
            weights.push(w);
            biases.push(Array1::zeros(fan_out));
        }

        let weight_velocity = weights.iter().map(|w| Array2::zeros(w.raw_dim())).collect();
        let bias_velocity = biases.iter().map(|b| Array1::zeros(b.raw_dim())).collect();

        Ok(Self {
            learning_rate: params.learning_rate,
            architecture,
            params,
            weights,
            biases,
            weight_velocity,
            bias_velocity,
            rng,
        })
    }

    /// Network shape
    pub fn architecture(&self) -> &Architecture {
        &self.architecture
    }

    /// Input width
    pub fn input_dim(&self) -> usize {
        self.architecture.input_dim
    }

    /// Output width
    pub fn output_dim(&self) -> usize {
        self.architecture.output_dim
    }

    /// Current (possibly decayed) learning rate
    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// Hyperparameters the network was built with
    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Weight matrices, one per layer transition
    pub fn weights(&self) -> &[Array2<f32>] {
        &self.weights
    }

    /// Bias vectors, one per layer transition
    pub fn biases(&self) -> &[Array1<f32>] {
        &self.biases
    }

    /// Forward pass. With `training` set, hidden layers apply inverted dropout.
    pub fn forward(&mut self, input: &[f32], training: bool) -> Result<Vec<f32>> {
        self.check_input(input)?;
        let dropout = if training { self.params.dropout } else { 0.0 };
        let trace = self.propagate(input, dropout);
        Ok(trace.output().to_vec())
    }

    /// Inference without dropout
    pub fn predict(&self, input: &[f32]) -> Result<Vec<f32>> {
        self.check_input(input)?;
        let trace = propagate(
            &self.weights,
            &self.biases,
            self.architecture.activation,
            input,
            None,
        );
        Ok(trace.output().to_vec())
    }

    /// One gradient step on a single sample.
    ///
    /// Widths are validated and the loss checked for finiteness before any
    /// parameter changes, so a failed call leaves the network untouched.
    pub fn train(&mut self, input: &[f32], target: &[f32]) -> Result<TrainOutcome> {
        self.check_input(input)?;
        if target.len() != self.architecture.output_dim {
            return Err(MlError::dimension_mismatch(
                "training target",
                self.architecture.output_dim,
                target.len(),
            ));
        }

        let trace = self.propagate(input, self.params.dropout);
        let output = trace.output();
        let target = ArrayView1::from(target);

        let mut error = &target - output;
        let loss = error.mapv(|e| e * e).mean().unwrap_or(0.0);
        if !loss.is_finite() {
            return Err(MlError::NumericInstability(format!(
                "non-finite loss {} during training",
                loss
            )));
        }
        let accuracy = self.accuracy(output.view(), target);

        let activation = self.architecture.activation;
        let layers = self.weights.len();
        let mut weight_grads = Vec::with_capacity(layers);
        let mut bias_grads = Vec::with_capacity(layers);

        for i in (0..layers).rev() {
            let mut delta = &error * &trace.activated[i].mapv(|a| activation.derivative(a));
            if let Some(mask) = &trace.masks[i] {
                delta *= mask;
            }

            let prev = trace.inputs[i].view().insert_axis(Axis(1));
            let grad = prev.dot(&delta.view().insert_axis(Axis(0)));

            if i > 0 {
                error = self.weights[i].dot(&delta);
            }
            weight_grads.push(grad);
            bias_grads.push(delta);
        }
        weight_grads.reverse();
        bias_grads.reverse();

        self.apply_gradients(weight_grads, bias_grads);

        if self.params.adaptive_lr && self.learning_rate > self.params.min_learning_rate {
            self.learning_rate =
                (self.learning_rate * self.params.lr_decay).max(self.params.min_learning_rate);
        }

        Ok(TrainOutcome { loss, accuracy })
    }

    fn apply_gradients(&mut self, weight_grads: Vec<Array2<f32>>, bias_grads: Vec<Array1<f32>>) {
        let lr = self.learning_rate;
        let momentum = self.params.momentum;
        let l2 = self.params.l2_regularization;

        for (i, grad) in weight_grads.into_iter().enumerate() {
            let decay = self.weights[i].mapv(|w| w * l2);
            let mut step = (grad - &decay) * lr;
            step.scaled_add(momentum, &self.weight_velocity[i]);
            self.weights[i] += &step;
            self.weight_velocity[i] = step;
        }

        for (i, grad) in bias_grads.into_iter().enumerate() {
            let mut step = grad * lr;
            step.scaled_add(momentum, &self.bias_velocity[i]);
            self.biases[i] += &step;
            self.bias_velocity[i] = step;
        }
    }

    fn accuracy(&self, output: ArrayView1<'_, f32>, target: ArrayView1<'_, f32>) -> f32 {
        let tolerance = self.params.accuracy_tolerance;
        let correct = output
            .iter()
            .zip(target.iter())
            .filter(|(o, t)| (*o - *t).abs() < tolerance)
            .count();
        correct as f32 / output.len() as f32
    }

    fn check_input(&self, input: &[f32]) -> Result<()> {
        if input.len() != self.architecture.input_dim {
            return Err(MlError::dimension_mismatch(
                "network input",
                self.architecture.input_dim,
                input.len(),
            ));
        }
        Ok(())
    }

    fn propagate(&mut self, input: &[f32], dropout: f32) -> ForwardTrace {
        let rng = if dropout > 0.0 {
            Some((dropout, &mut self.rng))
        } else {
            None
        };
        propagate(
            &self.weights,
            &self.biases,
            self.architecture.activation,
            input,
            rng,
        )
    }
}

/// Free function so the RNG can be borrowed mutably alongside the weights.
fn propagate(
    weights: &[Array2<f32>],
    biases: &[Array1<f32>],
    activation: Activation,
    input: &[f32],
    mut dropout: Option<(f32, &mut StdRng)>,
) -> ForwardTrace {
    let layers = weights.len();
    let mut inputs = Vec::with_capacity(layers);
    let mut activated = Vec::with_capacity(layers);
    let mut masks = Vec::with_capacity(layers);

    let mut current = Array1::from(input.to_vec());
    for (i, (w, b)) in weights.iter().zip(biases.iter()).enumerate() {
        let out = (current.dot(w) + b).mapv(|z| activation.apply(z));
        inputs.push(current);

        let is_hidden = i + 1 < layers;
        let (next, mask) = match dropout.as_mut() {
            Some((p, rng)) if is_hidden => {
                let keep = 1.0 / (1.0 - *p);
                let mask = Array1::from_shape_fn(out.len(), |_| {
                    if rng.gen::<f32>() < *p {
                        0.0
                    } else {
                        keep
                    }
                });
                (&out * &mask, Some(mask))
            }
            _ => (out.clone(), None),
        };

        activated.push(out);
        masks.push(mask);
        current = next;
    }

    ForwardTrace {
        inputs,
        activated,
        masks,
    }
}
