use ndarray::Array2;

pub fn sigmoid(z: f64) -> f64 {
    1. / (1. + (-z).exp())
}

/// Derivative of the sigmoid expressed in terms of its output `a = sigmoid(z)`.
pub fn sigmoid_prime_from_output(a: &Array2<f64>) -> Array2<f64> {
    a.mapv(|a| a * (1. - a))
}
