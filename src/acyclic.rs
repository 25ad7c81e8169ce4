//! Acyclic (feedforward) network decoding and execution.
//!
//! Decoding turns a cycle-free [`WeightedDigraph`] into a layered execution
//! plan: nodes are permuted so that dense index order is layer order, and
//! connections are bucketed by source layer. Execution is then a single
//! forward sweep. By the time a layer's nodes are activated, every
//! connection into them has already been applied, because all their
//! predecessors sit in earlier layers. O(nodes + connections) per call,
//! no iteration limit, no possibility of non-termination.

use crate::activation::{apply_segment, Activation};
use crate::decoder::DecodeError;
use crate::graph::{Connection, WeightedDigraph};

/// A decoded feedforward network.
///
/// Holds a single working activation buffer reused across calls; activation
/// takes `&mut self`, so a network instance is single-owner and cannot be
/// invoked concurrently. Independent instances are fully isolated.
#[derive(Debug, Clone)]
pub struct AcyclicNetwork {
    // Connection arrays, struct-of-arrays, sorted stably by source layer.
    conn_sources: Vec<usize>,
    conn_targets: Vec<usize>,
    conn_weights: Vec<f64>,
    // Per-layer end offsets into the node and connection arrays.
    layer_node_end: Vec<usize>,
    layer_conn_end: Vec<usize>,
    /// Layer of each node, in dense index order.
    node_layers: Vec<u32>,
    /// Dense indices of the output nodes, in output order.
    output_indices: Vec<usize>,
    /// Working activation vector, length = node count.
    activations: Vec<f64>,
    input_count: usize,
    activation: Activation,
    vectorized: bool,
}

impl AcyclicNetwork {
    /// Build the execution plan from a graph whose provisional indices place
    /// inputs at `0..input_count` and outputs directly after.
    ///
    /// Returns the network together with the node permutation (provisional
    /// index to final index) so the caller can fix up its ID map.
    pub(crate) fn compile(
        graph: WeightedDigraph,
        input_count: usize,
        output_count: usize,
        activation: Activation,
        vectorized: bool,
    ) -> Result<(Self, Vec<usize>), DecodeError> {
        let layers = graph
            .layer_assignment()
            .ok_or(DecodeError::CyclicGenome)?;
        let n = graph.node_count();

        // Stable sort by layer; inputs keep positions 0..input_count since
        // they sit at layer 0 with the smallest provisional indices.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| layers[i]);
        let mut perm = vec![0usize; n];
        for (new, &old) in order.iter().enumerate() {
            perm[old] = new;
        }
        debug_assert!((0..input_count).all(|i| perm[i] == i));

        let node_layers: Vec<u32> = order.iter().map(|&old| layers[old]).collect();
        let layer_count = node_layers.last().map_or(1, |&l| l as usize + 1);

        let mut connections: Vec<Connection> = graph
            .into_connections()
            .into_iter()
            .map(|c| Connection {
                source: perm[c.source],
                target: perm[c.target],
                weight: c.weight,
            })
            .collect();
        connections.sort_by_key(|c| node_layers[c.source]);

        let mut layer_node_end = vec![0usize; layer_count];
        for &l in &node_layers {
            layer_node_end[l as usize] += 1;
        }
        let mut layer_conn_end = vec![0usize; layer_count];
        for c in &connections {
            layer_conn_end[node_layers[c.source] as usize] += 1;
        }
        for l in 1..layer_count {
            layer_node_end[l] += layer_node_end[l - 1];
            layer_conn_end[l] += layer_conn_end[l - 1];
        }

        let output_indices: Vec<usize> = (0..output_count)
            .map(|i| perm[input_count + i])
            .collect();

        let network = Self {
            conn_sources: connections.iter().map(|c| c.source).collect(),
            conn_targets: connections.iter().map(|c| c.target).collect(),
            conn_weights: connections.iter().map(|c| c.weight).collect(),
            layer_node_end,
            layer_conn_end,
            node_layers,
            output_indices,
            activations: vec![0.0; n],
            input_count,
            activation,
            vectorized,
        };
        Ok((network, perm))
    }

    /// Evaluate the network, writing results into a caller-supplied buffer.
    ///
    /// No state survives between calls: the working vector is reset to the
    /// inputs plus zeroes every time, so repeated calls with the same inputs
    /// return bit-identical outputs.
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
            self.output_indices.len(),
            "Output length mismatch: expected {}, got {}",
            self.output_indices.len(),
            outputs.len()
        );

        self.activations[..self.input_count].copy_from_slice(inputs);
        for a in &mut self.activations[self.input_count..] {
            *a = 0.0;
        }

        // One sweep: apply layer l's outgoing connections, then activate
        // layer l+1. Skip connections land in their target's accumulator
        // early and are finished by the time that layer is activated.
        let mut ci = 0;
        let layer_count = self.layer_node_end.len();
        for l in 0..layer_count.saturating_sub(1) {
            let conn_end = self.layer_conn_end[l];
            while ci < conn_end {
                let contribution =
                    self.activations[self.conn_sources[ci]] * self.conn_weights[ci];
                self.activations[self.conn_targets[ci]] += contribution;
                ci += 1;
            }

            let start = self.layer_node_end[l];
            let end = self.layer_node_end[l + 1];
            apply_segment(
                self.activation,
                self.vectorized,
                &mut self.activations[start..end],
            );
        }
        debug_assert_eq!(ci, self.conn_sources.len());

        for (out, &idx) in outputs.iter_mut().zip(&self.output_indices) {
            *out = self.activations[idx];
        }
    }

    /// Evaluate the network, allocating the output vector.
    ///
    /// # Panics
    ///
    /// Panics if input length doesn't match the network.
    pub fn activate(&mut self, inputs: &[f64]) -> Vec<f64> {
        let mut outputs = vec![0.0; self.output_indices.len()];
        self.activate_into(inputs, &mut outputs);
        outputs
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
        self.output_indices.len()
    }

    /// Total number of nodes.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.activations.len()
    }

    /// Number of layers in the execution plan.
    #[inline]
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layer_node_end.len()
    }

    /// Layer of each node in dense index order, for diagnostics.
    #[inline]
    #[must_use]
    pub fn node_layers(&self) -> &[u32] {
        &self.node_layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_single_connection_identity() {
        // 2 inputs, 1 output, input0 -> output with weight 2.0.
        let g = graph(3, &[(0, 2, 2.0)]);
        let (mut net, _) =
            AcyclicNetwork::compile(g, 2, 1, Activation::Identity, false).unwrap();
        assert_eq!(net.activate(&[3.0, 0.0]), vec![6.0]);
    }

    #[test]
    fn test_repeated_activation_bit_identical() {
        let g = graph(5, &[(0, 3, 0.7), (1, 3, -1.3), (3, 4, 2.0), (0, 4, 0.1)]);
        let (mut net, _) =
            AcyclicNetwork::compile(g, 2, 1, Activation::LogisticSteep, false).unwrap();

        let first = net.activate(&[0.4, -0.9]);
        for _ in 0..10 {
            assert_eq!(net.activate(&[0.4, -0.9]), first);
        }
    }

    #[test]
    fn test_hidden_chain_hand_computed() {
        // input0 -> hidden(3) -> output(2), identity activation.
        let g = graph(4, &[(0, 3, 0.5), (3, 2, -3.0)]);
        let (mut net, _) =
            AcyclicNetwork::compile(g, 2, 1, Activation::Identity, false).unwrap();
        let out = net.activate(&[2.0, 100.0]);
        assert_eq!(out, vec![2.0 * 0.5 * -3.0]);
    }

    #[test]
    fn test_skip_connection_sums_both_paths() {
        // output(1) receives input0 both directly and via hidden(2).
        let g = graph(3, &[(0, 1, 1.0), (0, 2, 1.0), (2, 1, 1.0)]);
        let (mut net, _) =
            AcyclicNetwork::compile(g, 1, 1, Activation::Identity, false).unwrap();
        let out = net.activate(&[1.5]);
        assert_eq!(out, vec![1.5 + 1.5]);
    }

    #[test]
    fn test_output_moves_to_its_topological_layer() {
        // Output node (provisional index 1) is two layers deep; it must be
        // remapped rather than pinned after the inputs.
        let g = graph(3, &[(0, 2, 1.0), (2, 1, 1.0)]);
        let (net, perm) = AcyclicNetwork::compile(g, 1, 1, Activation::Identity, false).unwrap();
        assert_eq!(net.layer_count(), 3);
        assert_eq!(perm[0], 0);
        assert_eq!(perm[1], 2); // output settled at the deepest position
        assert_eq!(perm[2], 1);
    }

    #[test]
    fn test_cycle_rejected() {
        let g = graph(4, &[(0, 2, 1.0), (2, 3, 1.0), (3, 2, 1.0), (3, 1, 1.0)]);
        let err = AcyclicNetwork::compile(g, 1, 1, Activation::Identity, false).unwrap_err();
        assert_eq!(err, DecodeError::CyclicGenome);
    }

    #[test]
    fn test_layer_ordering_invariant_after_compile() {
        let g = graph(
            6,
            &[
                (0, 4, 1.0),
                (1, 4, 1.0),
                (4, 5, 1.0),
                (5, 2, 1.0),
                (0, 3, 1.0),
                (4, 3, 1.0),
            ],
        );
        let (net, perm) = AcyclicNetwork::compile(g, 2, 2, Activation::Identity, false).unwrap();
        let layers = net.node_layers();
        // Re-derive the connection list through the permutation and check
        // every connection climbs strictly.
        for (s, t) in [(0, 4), (1, 4), (4, 5), (5, 2), (0, 3), (4, 3)] {
            assert!(layers[perm[s]] < layers[perm[t]]);
        }
    }

    #[test]
    #[should_panic(expected = "Input length mismatch")]
    fn test_input_length_mismatch_panics() {
        let g = graph(3, &[(0, 2, 1.0)]);
        let (mut net, _) =
            AcyclicNetwork::compile(g, 2, 1, Activation::Identity, false).unwrap();
        net.activate(&[1.0]);
    }
}
