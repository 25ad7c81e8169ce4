//! Cyclic (recurrent) network execution.
//!
//! No layering exists for a graph with cycles, so evaluation runs a fixed
//! number of synchronous relaxation passes: each pass accumulates every
//! connection into a separate pre-activation buffer, so reads see only the
//! previous pass's post-activations, never a value written this pass, and
//! then applies the activation function to every non-input node. More
//! passes approximate steady state better at proportional cost; the count
//! is a caller-chosen constant.
//!
//! Post-activations persist across calls, modeling recurrent memory.
//! Callers needing independent trials must call [`CyclicNetwork::reset`].

use crate::activation::{apply_segment_to, Activation};
use crate::graph::WeightedDigraph;

/// A decoded recurrent network.
///
/// Output nodes occupy the fixed dense index range directly after the
/// inputs; a cyclic graph has no topological order that could assign them
/// anywhere better.
#[derive(Debug, Clone)]
pub struct CyclicNetwork {
    conn_sources: Vec<usize>,
    conn_targets: Vec<usize>,
    conn_weights: Vec<f64>,
    /// Pre-activation accumulator, zeroed after every pass.
    pre: Vec<f64>,
    /// Post-activation values; persistent state between calls.
    post: Vec<f64>,
    input_count: usize,
    output_count: usize,
    passes: usize,
    bounded_output: bool,
    activation: Activation,
    vectorized: bool,
}

impl CyclicNetwork {
    /// Build an executor over the graph as-is.
    ///
    /// # Panics
    ///
    /// Panics if `passes` is zero; a call that runs no relaxation pass is a
    /// caller programming error, not a decodable configuration.
    pub(crate) fn new(
        graph: WeightedDigraph,
        input_count: usize,
        output_count: usize,
        activation: Activation,
        passes: usize,
        bounded_output: bool,
        vectorized: bool,
    ) -> Self {
        assert!(passes >= 1, "cyclic networks need at least one pass");
        let n = graph.node_count();
        let connections = graph.into_connections();
        Self {
            conn_sources: connections.iter().map(|c| c.source).collect(),
            conn_targets: connections.iter().map(|c| c.target).collect(),
            conn_weights: connections.iter().map(|c| c.weight).collect(),
            pre: vec![0.0; n],
            post: vec![0.0; n],
            input_count,
            output_count,
            passes,
            bounded_output,
            activation,
            vectorized,
        }
    }

    /// Run the configured number of relaxation passes and read the outputs.
    ///
    /// Non-input state carries over from the previous call.
    ///
    /// # Panics
    ///
    /// Panics if input or output length doesn't match the network.
    pub fn activate_into(&mut self, inputs: &[f64], outputs: &mut [f64]) {
        assert_eq!(
            inputs.len(),
            self.input_count,
            "Input length mismatch: expected {}, got {}",
            self.input_count,
            inputs.len()
        );
        assert_eq!(
            outputs.len(),
            self.output_count,
            "Output length mismatch: expected {}, got {}",
            self.output_count,
            outputs.len()
        );

        self.post[..self.input_count].copy_from_slice(inputs);

        for _ in 0..self.passes {
            for ci in 0..self.conn_sources.len() {
                let contribution = self.post[self.conn_sources[ci]] * self.conn_weights[ci];
                self.pre[self.conn_targets[ci]] += contribution;
            }

            apply_segment_to(
                self.activation,
                self.vectorized,
                &self.pre[self.input_count..],
                &mut self.post[self.input_count..],
            );

            for p in &mut self.pre {
                *p = 0.0;
            }
        }

        let output_range = self.input_count..self.input_count + self.output_count;
        if self.bounded_output {
            for (out, &post) in outputs.iter_mut().zip(&self.post[output_range]) {
                *out = post.clamp(0.0, 1.0);
            }
        } else {
            outputs.copy_from_slice(&self.post[output_range]);
        }
    }

    /// Like [`Self::activate_into`], allocating the output vector.
    ///
    /// # Panics
    ///
    /// Panics if input length doesn't match the network.
    pub fn activate(&mut self, inputs: &[f64]) -> Vec<f64> {
        let mut outputs = vec![0.0; self.output_count];
        self.activate_into(inputs, &mut outputs);
        outputs
    }

    /// Zero all non-input state, making the next call independent of
    /// everything that came before.
    pub fn reset(&mut self) {
        for p in &mut self.post[self.input_count..] {
            *p = 0.0;
        }
        for p in &mut self.pre {
            *p = 0.0;
        }
    }

    /// Number of input nodes.
    #[inline]
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.input_count
    }

    /// Number of output nodes.
    #[inline]
    #[must_use]
    pub fn output_count(&self) -> usize {
        self.output_count
    }

    /// Total number of nodes.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.post.len()
    }

    /// Relaxation passes per activation call.
    #[inline]
    #[must_use]
    pub fn passes(&self) -> usize {
        self.passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Connection;

    fn graph(node_count: usize, triples: &[(usize, usize, f64)]) -> WeightedDigraph {
        let connections = triples
            .iter()
            .map(|&(source, target, weight)| Connection {
                source,
                target,
                weight,
            })
            .collect();
        WeightedDigraph::new(node_count, connections)
    }

    #[test]
    fn test_recurrent_state_accumulates() {
        // input -> output, plus output self-loop: out_t = in + 0.5 * out_{t-1}.
        let g = graph(2, &[(0, 1, 1.0), (1, 1, 0.5)]);
        let mut net = CyclicNetwork::new(g, 1, 1, Activation::Identity, 1, false, false);

        assert_eq!(net.activate(&[2.0]), vec![2.0]);
        assert_eq!(net.activate(&[2.0]), vec![3.0]);
        assert_eq!(net.activate(&[2.0]), vec![3.5]);
    }

    #[test]
    fn test_reset_reproduces_first_output_exactly() {
        let g = graph(3, &[(0, 1, 0.8), (1, 2, -0.6), (2, 1, 1.1)]);
        let mut net = CyclicNetwork::new(g, 1, 1, Activation::LogisticSteep, 2, false, false);

        let first = net.activate(&[0.3]);
        let second = net.activate(&[0.3]);
        assert_ne!(first, second, "recurrent memory should change the output");

        net.reset();
        assert_eq!(net.activate(&[0.3]), first);
    }

    #[test]
    fn test_synchronous_update_uses_previous_pass_values() {
        // input -> hidden -> output with one pass per call: the signal takes
        // two calls to reach the output, because each pass reads only the
        // previous pass's post-activations.
        let g = graph(3, &[(0, 2, 0.5), (2, 1, 4.0)]);
        let mut net = CyclicNetwork::new(g, 1, 1, Activation::Identity, 1, false, false);

        assert_eq!(net.activate(&[1.0]), vec![0.0]);
        assert_eq!(net.activate(&[1.0]), vec![2.0]);
    }

    #[test]
    fn test_more_passes_propagate_further() {
        // Same chain, two passes per call: the signal arrives within one call.
        let g = graph(3, &[(0, 2, 0.5), (2, 1, 4.0)]);
        let mut net = CyclicNetwork::new(g, 1, 1, Activation::Identity, 2, false, false);
        assert_eq!(net.activate(&[1.0]), vec![2.0]);
    }

    #[test]
    fn test_bounded_output_clamps_reads_only() {
        let g = graph(2, &[(0, 1, 3.0)]);
        let mut net = CyclicNetwork::new(g, 1, 1, Activation::Identity, 1, true, false);

        assert_eq!(net.activate(&[2.0]), vec![1.0]);
        assert_eq!(net.activate(&[-2.0]), vec![0.0]);
    }

    #[test]
    fn test_connections_into_inputs_are_inert() {
        // A connection targeting an input accumulates nowhere visible;
        // inputs are overwritten by the caller every call.
        let g = graph(2, &[(0, 1, 1.0), (1, 0, 9.0)]);
        let mut net = CyclicNetwork::new(g, 1, 1, Activation::Identity, 1, false, false);
        assert_eq!(net.activate(&[1.5]), vec![1.5]);
        assert_eq!(net.activate(&[1.5]), vec![1.5]);
    }

    #[test]
    #[should_panic(expected = "at least one pass")]
    fn test_zero_passes_panics() {
        let g = graph(2, &[(0, 1, 1.0)]);
        let _ = CyclicNetwork::new(g, 1, 1, Activation::Identity, 0, false, false);
    }
}
