use anyhow::{ensure, Result};
use flappy_core::rng::SeededRng;
use flappy_core::{Controller, DecisionError, Observation};
use serde::{Deserialize, Serialize};

const INPUTS: usize = 3;

/// Feed-forward net with one tanh hidden layer and a single tanh output.
///
/// Weights are stored flat: each hidden unit's input weights followed by its
/// bias, then the output weights followed by the output bias.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Network {
    hidden_units: usize,
    weights: Vec<f64>,
    /// Divides raw observations so inputs land roughly in `[0, 1]`.
    input_scale: f64,
}

impl Network {
    pub fn weight_count(hidden_units: usize) -> usize {
        hidden_units * (INPUTS + 1) + hidden_units + 1
    }

    pub fn from_weights(hidden_units: usize, weights: Vec<f64>, input_scale: f64) -> Result<Self> {
        ensure!(hidden_units > 0, "network needs at least one hidden unit");
        ensure!(
            weights.len() == Self::weight_count(hidden_units),
            "expected {} weights for {hidden_units} hidden units, got {}",
            Self::weight_count(hidden_units),
            weights.len()
        );
        ensure!(
            input_scale.is_finite() && input_scale > 0.0,
            "input scale must be positive, got {input_scale}"
        );
        Ok(Self {
            hidden_units,
            weights,
            input_scale,
        })
    }

    /// Weights drawn uniformly from `[-1, 1)`.
    pub fn random(hidden_units: usize, input_scale: f64, rng: &mut SeededRng) -> Result<Self> {
        let weights = (0..Self::weight_count(hidden_units))
            .map(|_| rng.next_unit() * 2.0 - 1.0)
            .collect();
        Self::from_weights(hidden_units, weights, input_scale)
    }

    #[inline]
    pub fn hidden_units(&self) -> usize {
        self.hidden_units
    }

    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[inline]
    pub fn input_scale(&self) -> f64 {
        self.input_scale
    }

    /// Same topology with a different weight vector.
    pub fn with_weights(&self, weights: Vec<f64>) -> Result<Self> {
        Self::from_weights(self.hidden_units, weights, self.input_scale)
    }

    pub fn activate(&self, inputs: [f64; INPUTS]) -> f64 {
        let (hidden_weights, output_weights) =
            self.weights.split_at(self.hidden_units * (INPUTS + 1));
        let mut sum = output_weights[self.hidden_units];
        for (unit, row) in hidden_weights.chunks_exact(INPUTS + 1).enumerate() {
            let pre = row[..INPUTS]
                .iter()
                .zip(inputs)
                .fold(row[INPUTS], |acc, (weight, input)| acc + weight * input);
            sum += output_weights[unit] * pre.tanh();
        }
        sum.tanh()
    }
}

impl Controller for Network {
    fn decide(&mut self, observation: &Observation) -> Result<f64, DecisionError> {
        let inputs = [
            observation.height / self.input_scale,
            observation.top_gap_distance / self.input_scale,
            observation.bottom_gap_distance / self.input_scale,
        ];
        let output = self.activate(inputs);
        if output.is_finite() {
            Ok(output)
        } else {
            Err(DecisionError::new(format!("network produced {output}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(height: f64, top: f64, bottom: f64) -> Observation {
        Observation {
            height,
            top_gap_distance: top,
            bottom_gap_distance: bottom,
        }
    }

    #[test]
    fn weight_count_matches_layout() {
        assert_eq!(Network::weight_count(1), 6);
        assert_eq!(Network::weight_count(6), 31);
        assert!(Network::from_weights(2, vec![0.0; 10], 800.0).is_err());
        assert!(Network::from_weights(2, vec![0.0; 11], 0.0).is_err());
    }

    #[test]
    fn zero_weights_never_jump() {
        let mut network = Network::from_weights(4, vec![0.0; 21], 800.0).expect("valid shape");
        let decision = network
            .decide(&observation(350.0, 200.0, 0.0))
            .expect("finite output");
        assert_eq!(decision, 0.0);
    }

    #[test]
    fn output_follows_hand_set_weights() {
        // One hidden unit reading only height; output copies it.
        let weights = vec![2.0, 0.0, 0.0, 0.0, 3.0, 0.0];
        let network = Network::from_weights(1, weights, 800.0).expect("valid shape");
        let expected = (3.0 * (2.0f64 * 0.5).tanh()).tanh();
        assert!((network.activate([0.5, 0.0, 0.0]) - expected).abs() < 1e-12);
        assert!(network.activate([0.5, 0.0, 0.0]) > 0.5);
        assert!(network.activate([-0.5, 0.0, 0.0]) < -0.5);
    }

    #[test]
    fn poisoned_weights_report_a_decision_error() {
        let mut weights = vec![0.0; 6];
        weights[5] = f64::NAN;
        let mut network = Network::from_weights(1, weights, 800.0).expect("valid shape");
        assert!(network.decide(&observation(1.0, 1.0, 1.0)).is_err());
    }

    #[test]
    fn random_weights_are_reproducible_and_bounded() {
        let a = Network::random(6, 800.0, &mut SeededRng::new(17)).expect("valid shape");
        let b = Network::random(6, 800.0, &mut SeededRng::new(17)).expect("valid shape");
        assert_eq!(a, b);
        assert!(a.weights().iter().all(|w| (-1.0..1.0).contains(w)));
    }
}
