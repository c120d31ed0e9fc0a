mod activation;
mod error;

use std::{num::NonZeroUsize, sync::Arc, time::Instant};

use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView1, Axis, array};
use parking_lot::RwLock;
use rand::Rng;
use tokio_util::sync::CancellationToken;

pub use error::{NetworkError, Result};

use crate::dashboard::NetworkView;
use activation::{sigmoid, sigmoid_prime_from_output};

/// A network shared between the trainer (writer) and the dashboard (reader).
pub type SharedNetwork = Arc<RwLock<Network>>;

/// A fully connected feed-forward network trained with full-batch gradient descent.
///
/// Activations are stored per node layer with one column per sample, so
/// `layers[i]` has shape `(nodes_i, samples)` and `layers[0]` holds the inputs.
/// The targets live in `output`, shaped `(samples, output_nodes)`.
pub struct Network {
    layers: Vec<Array2<f64>>,
    weights: Vec<Array2<f64>>,
    biases: Vec<Array2<f64>>,
    output: Array2<f64>,
    rate: f64,
    error: f64,
    time: f64,
}

impl Network {
    /// Creates a new network over a dataset.
    ///
    /// # Args
    /// * `sizes` - Node count of every layer, input first and output last.
    /// * `rate` - The learning rate.
    /// * `inputs` - Input samples, one row per sample.
    /// * `targets` - Expected outputs, one row per sample.
    /// * `rng` - Source for the initial weights.
    ///
    /// # Errors
    /// Returns a `NetworkError` if `sizes` describes fewer than two layers, a
    /// layer without nodes, or if the dataset does not match the layer sizes.
    pub fn new<R: Rng>(
        sizes: &[usize],
        rate: f64,
        inputs: Array2<f64>,
        targets: Array2<f64>,
        rng: &mut R,
    ) -> Result<Self> {
        if sizes.len() < 2 {
            return Err(NetworkError::TooFewLayers { got: sizes.len() });
        }

        if let Some(index) = sizes.iter().position(|&n| n == 0) {
            return Err(NetworkError::ZeroSizedLayer { index });
        }

        let input_size = sizes[0];
        let output_size = sizes[sizes.len() - 1];

        let checks = [
            ("input columns", inputs.ncols(), input_size),
            ("target columns", targets.ncols(), output_size),
            ("target rows", targets.nrows(), inputs.nrows()),
        ];

        for (what, got, expected) in checks {
            if got != expected {
                return Err(NetworkError::ShapeMismatch {
                    what,
                    got,
                    expected,
                });
            }
        }

        let samples = inputs.nrows();
        if samples == 0 {
            return Err(NetworkError::ShapeMismatch {
                what: "samples",
                got: 0,
                expected: 1,
            });
        }

        let mut layers = Vec::with_capacity(sizes.len());
        layers.push(inputs.reversed_axes());
        layers.extend(sizes[1..].iter().map(|&n| Array2::zeros((n, samples))));

        let weights = sizes
            .windows(2)
            .map(|pair| {
                Array2::from_shape_fn((pair[1], pair[0]), |_| rng.random_range(-1.0_f64..1.0))
            })
            .collect();

        let biases = sizes[1..].iter().map(|&n| Array2::zeros((n, 1))).collect();

        Ok(Self {
            layers,
            weights,
            biases,
            output: targets,
            rate,
            error: 0.,
            time: 0.,
        })
    }

    /// Creates a `2-4-1` network over the four XOR samples.
    pub fn xor<R: Rng>(rate: f64, rng: &mut R) -> Result<Self> {
        let inputs = array![[0., 0.], [0., 1.], [1., 0.], [1., 1.]];
        let targets = array![[0.], [1.], [1.], [0.]];
        Self::new(&[2, 4, 1], rate, inputs, targets, rng)
    }

    /// Propagates the stored inputs through every layer.
    fn forward(&mut self) {
        for i in 0..self.weights.len() {
            let z = self.weights[i].dot(&self.layers[i]) + &self.biases[i];
            self.layers[i + 1] = z.mapv_into(sigmoid);
        }
    }

    /// Runs a single gradient descent step over the whole dataset.
    ///
    /// # Returns
    /// The mean squared error of the forward pass that preceded the update.
    pub fn train_epoch(&mut self) -> f64 {
        self.forward();

        let samples = self.output.nrows() as f64;
        let predicted = &self.layers[self.layers.len() - 1];
        let diff = predicted - &self.output.t();
        self.error = diff.mapv(|d| d * d).mean().unwrap_or(0.);

        let mut delta = diff * sigmoid_prime_from_output(predicted);
        for i in (0..self.weights.len()).rev() {
            let grad_w = delta.dot(&self.layers[i].t()) / samples;
            let grad_b = delta.sum_axis(Axis(1)).insert_axis(Axis(1)) / samples;

            if i > 0 {
                delta = self.weights[i].t().dot(&delta)
                    * sigmoid_prime_from_output(&self.layers[i]);
            }

            self.weights[i].scaled_add(-self.rate, &grad_w);
            self.biases[i].scaled_add(-self.rate, &grad_b);
        }

        self.error
    }

    /// Trains for `epochs` steps and adds the elapsed wall time to `time`.
    ///
    /// # Returns
    /// The error of the last epoch.
    pub fn train(&mut self, epochs: usize) -> f64 {
        let started = Instant::now();
        for _ in 0..epochs {
            self.train_epoch();
        }

        self.time += started.elapsed().as_secs_f64();
        self.error
    }

    /// Evaluates a single sample without touching the stored activations.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if `input` does not match the input layer.
    pub fn predict(&self, input: ArrayView1<f64>) -> Result<Array1<f64>> {
        let expected = self.layers[0].nrows();
        if input.len() != expected {
            return Err(NetworkError::ShapeMismatch {
                what: "input",
                got: input.len(),
                expected,
            });
        }

        let mut a = input.to_owned().insert_axis(Axis(1));
        for (w, b) in self.weights.iter().zip(&self.biases) {
            a = (w.dot(&a) + b).mapv_into(sigmoid);
        }

        Ok(a.remove_axis(Axis(1)))
    }
}

impl NetworkView for Network {
    fn layers(&self) -> &[Array2<f64>] {
        &self.layers
    }

    fn output(&self) -> &Array2<f64> {
        &self.output
    }

    fn rate(&self) -> f64 {
        self.rate
    }

    fn error(&self) -> f64 {
        self.error
    }

    fn time(&self) -> f64 {
        self.time
    }
}

/// Trains a shared network, holding the write lock for `chunk` epochs at a time
/// so readers are never blocked for the whole run.
///
/// Stops early, between chunks, once `cancel` is cancelled.
///
/// # Returns
/// The error of the last epoch.
pub fn train_shared(
    network: &SharedNetwork,
    epochs: usize,
    chunk: NonZeroUsize,
    cancel: &CancellationToken,
) -> f64 {
    info!(epochs = epochs; "training started");

    let mut done = 0;
    let mut error = network.read().error();
    while done < epochs {
        if cancel.is_cancelled() {
            info!(epoch = done, error = error; "training cancelled");
            return error;
        }

        let step = chunk.get().min(epochs - done);
        error = network.write().train(step);
        done += step;
        debug!(epoch = done, error = error; "training progress");
    }

    info!(epochs = epochs, error = error; "training finished");
    log_predictions(&network.read());
    error
}

/// Logs what the network predicts for each of its stored input samples.
fn log_predictions(network: &Network) {
    for sample in network.layers[0].columns() {
        if let Ok(prediction) = network.predict(sample) {
            info!("prediction for {sample}: {prediction}");
        }
    }
}
