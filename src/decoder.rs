//! Genome decoding and executor selection.
//!
//! [`decode`] turns a [`NetworkGenome`] into an executable [`Phenome`]:
//! it builds the node-ID map, normalizes the connection triples into a dense
//! graph, and hands the graph to the executor selected by the genome's
//! acyclic/cyclic flag. The scalar versus vector-parallel activation path is
//! resolved here too, once per decode, from a hardware capability probe with
//! an explicit force-scalar override for reproducibility.

use serde::{Deserialize, Serialize};

use crate::acyclic::AcyclicNetwork;
use crate::cyclic::CyclicNetwork;
use crate::genome::{NetworkGenome, NetworkKind};
use crate::graph::{Connection, WeightedDigraph};
use crate::id_map::NodeIdMap;

/// Error type for decode failures.
///
/// Decoding is not retried: a failing genome is expected to be discarded by
/// the evolutionary loop that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Acyclic decode was invoked on a graph containing a cycle.
    CyclicGenome,
    /// A connection references a node ID absent from both the fixed ID
    /// range and the genome's hidden-node table.
    UnknownNodeId {
        /// The unmapped node ID.
        id: u64,
    },
    /// A connection in an acyclic genome targets an input node, which
    /// would dislodge the inputs from layer 0.
    InputConnectionTarget {
        /// The targeted input node ID.
        id: u64,
    },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::CyclicGenome => {
                write!(
                    f,
                    "genome contains cycles; feedforward decoding requires an acyclic graph"
                )
            }
            DecodeError::UnknownNodeId { id } => {
                write!(f, "connection references unknown node id {}", id)
            }
            DecodeError::InputConnectionTarget { id } => {
                write!(f, "connection targets input node {}", id)
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Scalar/vector activation path selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SimdPolicy {
    /// Use the vector-parallel path when the hardware supports it.
    #[default]
    Auto,
    /// Always use the scalar path, regardless of hardware.
    ForceScalar,
}

/// Decode-time configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeConfig {
    /// Relaxation passes per activation call for cyclic networks.
    pub cyclic_passes: usize,
    /// Clamp cyclic network outputs to [0, 1] when read.
    pub bounded_output: bool,
    /// Scalar/vector activation path selection.
    pub simd: SimdPolicy,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            cyclic_passes: 1,
            bounded_output: false,
            simd: SimdPolicy::Auto,
        }
    }
}

/// Common contract of decoded executable networks.
pub trait Network {
    /// Number of input nodes.
    fn input_count(&self) -> usize;

    /// Number of output nodes.
    fn output_count(&self) -> usize;

    /// Run the network forward, writing results into `outputs`.
    fn activate_into(&mut self, inputs: &[f64], outputs: &mut [f64]);

    /// Run the network forward, allocating the output vector.
    fn activate(&mut self, inputs: &[f64]) -> Vec<f64> {
        let mut outputs = vec![0.0; self.output_count()];
        self.activate_into(inputs, &mut outputs);
        outputs
    }

    /// Clear any state carried between activation calls.
    fn reset(&mut self);
}

impl Network for AcyclicNetwork {
    fn input_count(&self) -> usize {
        AcyclicNetwork::input_count(self)
    }

    fn output_count(&self) -> usize {
        AcyclicNetwork::output_count(self)
    }

    fn activate_into(&mut self, inputs: &[f64], outputs: &mut [f64]) {
        AcyclicNetwork::activate_into(self, inputs, outputs);
    }

    /// Nothing to clear: no state survives between calls.
    fn reset(&mut self) {}
}

impl Network for CyclicNetwork {
    fn input_count(&self) -> usize {
        CyclicNetwork::input_count(self)
    }

    fn output_count(&self) -> usize {
        CyclicNetwork::output_count(self)
    }

    fn activate_into(&mut self, inputs: &[f64], outputs: &mut [f64]) {
        CyclicNetwork::activate_into(self, inputs, outputs);
    }

    fn reset(&mut self) {
        CyclicNetwork::reset(self);
    }
}

/// A decoded genome: one of the two executor classes.
///
/// The executors share no state and no representation; this tagged variant
/// is the whole of their relationship.
#[derive(Debug, Clone)]
pub enum Phenome {
    /// Feedforward network.
    Acyclic(AcyclicNetwork),
    /// Recurrent network.
    Cyclic(CyclicNetwork),
}

impl Phenome {
    /// Which executor class this phenome decoded to.
    #[must_use]
    pub fn kind(&self) -> NetworkKind {
        match self {
            Phenome::Acyclic(_) => NetworkKind::Acyclic,
            Phenome::Cyclic(_) => NetworkKind::Cyclic,
        }
    }
}

impl Network for Phenome {
    fn input_count(&self) -> usize {
        match self {
            Phenome::Acyclic(net) => net.input_count(),
            Phenome::Cyclic(net) => net.input_count(),
        }
    }

    fn output_count(&self) -> usize {
        match self {
            Phenome::Acyclic(net) => net.output_count(),
            Phenome::Cyclic(net) => net.output_count(),
        }
    }

    fn activate_into(&mut self, inputs: &[f64], outputs: &mut [f64]) {
        match self {
            Phenome::Acyclic(net) => net.activate_into(inputs, outputs),
            Phenome::Cyclic(net) => net.activate_into(inputs, outputs),
        }
    }

    fn reset(&mut self) {
        match self {
            Phenome::Acyclic(net) => Network::reset(net),
            Phenome::Cyclic(net) => net.reset(),
        }
    }
}

/// Decode a genome into an executable network.
///
/// # Errors
///
/// Returns [`DecodeError::CyclicGenome`] when an acyclic-flagged genome
/// contains a cycle, and [`DecodeError::UnknownNodeId`] /
/// [`DecodeError::InputConnectionTarget`] for malformed connection triples.
pub fn decode(genome: &NetworkGenome, config: &DecodeConfig) -> Result<Phenome, DecodeError> {
    decode_with_map(genome, config).map(|(phenome, _)| phenome)
}

/// Decode a genome, additionally returning the node-ID map that fixes the
/// dense index assignment.
///
/// The map is not needed to run the network (the phenome stores only dense
/// indices), but callers that walk results back to the genome's ID space
/// (diagnostics, visualization) need it, usually via
/// [`NodeIdMap::create_inverse`].
///
/// # Errors
///
/// Same conditions as [`decode`].
pub fn decode_with_map(
    genome: &NetworkGenome,
    config: &DecodeConfig,
) -> Result<(Phenome, NodeIdMap), DecodeError> {
    let vectorized = resolve_simd(config.simd);

    match genome.kind {
        NetworkKind::Cyclic => {
            // Inputs and outputs are both fixed: a cyclic graph has no
            // topological order that could reassign the outputs.
            let fixed = genome.input_count + genome.output_count;
            let map = NodeIdMap::new(fixed, hidden_table(genome, fixed));
            let graph = build_graph(genome, &map, false)?;
            let network = CyclicNetwork::new(
                graph,
                genome.input_count,
                genome.output_count,
                genome.activation,
                config.cyclic_passes,
                config.bounded_output,
                vectorized,
            );
            Ok((Phenome::Cyclic(network), map))
        }
        NetworkKind::Acyclic => {
            // Only inputs are fixed. Outputs and hidden nodes first get
            // provisional indices in ID order; compiling the execution plan
            // then settles every non-input node at its topological layer.
            let fixed = genome.input_count;
            let mut table: Vec<(u64, usize)> = (0..genome.output_count)
                .map(|i| {
                    let id = genome.output_id(i);
                    (id, id as usize)
                })
                .collect();
            table.extend(hidden_table(genome, genome.input_count + genome.output_count));
            let provisional = NodeIdMap::new(fixed, table);

            let graph = build_graph(genome, &provisional, true)?;
            let (network, perm) = AcyclicNetwork::compile(
                graph,
                genome.input_count,
                genome.output_count,
                genome.activation,
                vectorized,
            )?;

            let inverse = provisional.create_inverse();
            let final_table: Vec<(u64, usize)> = (fixed..provisional.len())
                .map(|prov_idx| {
                    let id = inverse.map(prov_idx).expect("index within map");
                    (id, perm[prov_idx])
                })
                .collect();
            let map = NodeIdMap::new(fixed, final_table);
            Ok((Phenome::Acyclic(network), map))
        }
    }
}

/// Table entries for the genome's hidden nodes: sorted by ID, assigned
/// consecutive dense indices starting at `first_index`.
fn hidden_table(genome: &NetworkGenome, first_index: usize) -> Vec<(u64, usize)> {
    let mut ids = genome.hidden_ids.clone();
    ids.sort_unstable();
    ids.into_iter()
        .enumerate()
        .map(|(rank, id)| (id, first_index + rank))
        .collect()
}

/// Normalize the genome's raw ID triples into a dense graph via the map.
fn build_graph(
    genome: &NetworkGenome,
    map: &NodeIdMap,
    reject_input_targets: bool,
) -> Result<WeightedDigraph, DecodeError> {
    let mut connections = Vec::with_capacity(genome.connections.len());
    for gene in &genome.connections {
        let source = map
            .map(gene.source)
            .ok_or(DecodeError::UnknownNodeId { id: gene.source })?;
        let target = map
            .map(gene.target)
            .ok_or(DecodeError::UnknownNodeId { id: gene.target })?;
        if reject_input_targets && target < genome.input_count {
            return Err(DecodeError::InputConnectionTarget { id: gene.target });
        }
        connections.push(Connection {
            source,
            target,
            weight: gene.weight,
        });
    }
    Ok(WeightedDigraph::new(map.len(), connections))
}

fn resolve_simd(policy: SimdPolicy) -> bool {
    match policy {
        SimdPolicy::ForceScalar => false,
        SimdPolicy::Auto => vector_support(),
    }
}

/// Whether the vector-parallel activation path is available on this build
/// and host.
#[must_use]
pub fn vector_support() -> bool {
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    {
        std::arch::is_x86_feature_detected!("sse2")
    }
    #[cfg(all(feature = "simd", target_arch = "aarch64"))]
    {
        // NEON is baseline on aarch64.
        true
    }
    #[cfg(not(all(
        feature = "simd",
        any(target_arch = "x86_64", target_arch = "aarch64")
    )))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Activation;

    fn scalar_config() -> DecodeConfig {
        DecodeConfig {
            simd: SimdPolicy::ForceScalar,
            ..DecodeConfig::default()
        }
    }

    #[test]
    fn test_decode_acyclic_single_connection() {
        let mut genome = NetworkGenome::new(NetworkKind::Acyclic, 2, 1, Activation::Identity);
        genome.connect(0, 2, 2.0);

        let mut phenome = decode(&genome, &scalar_config()).unwrap();
        assert_eq!(phenome.kind(), NetworkKind::Acyclic);
        assert_eq!(phenome.activate(&[3.0, 0.0]), vec![6.0]);
    }

    #[test]
    fn test_decode_cyclic_flag_wins_over_graph_shape() {
        // An acyclic graph in a cyclic-flagged genome still gets the
        // relaxation executor; the flag is metadata, never inferred.
        let mut genome = NetworkGenome::new(NetworkKind::Cyclic, 1, 1, Activation::Identity);
        genome.connect(0, 1, 1.0);

        let phenome = decode(&genome, &scalar_config()).unwrap();
        assert_eq!(phenome.kind(), NetworkKind::Cyclic);
    }

    #[test]
    fn test_decode_rejects_cycle_in_acyclic_genome() {
        let mut genome = NetworkGenome::new(NetworkKind::Acyclic, 1, 1, Activation::Identity);
        genome.add_hidden(50);
        genome.add_hidden(60);
        genome.connect(0, 50, 1.0);
        genome.connect(50, 60, 1.0);
        genome.connect(60, 50, 1.0);
        genome.connect(60, 1, 1.0);

        let err = decode(&genome, &scalar_config()).unwrap_err();
        assert_eq!(err, DecodeError::CyclicGenome);
    }

    #[test]
    fn test_decode_same_graph_accepted_when_cyclic() {
        let mut genome = NetworkGenome::new(NetworkKind::Cyclic, 1, 1, Activation::Identity);
        genome.add_hidden(50);
        genome.add_hidden(60);
        genome.connect(0, 50, 1.0);
        genome.connect(50, 60, 1.0);
        genome.connect(60, 50, 1.0);
        genome.connect(60, 1, 1.0);

        assert!(decode(&genome, &scalar_config()).is_ok());
    }

    #[test]
    fn test_unknown_node_id() {
        let mut genome = NetworkGenome::new(NetworkKind::Acyclic, 1, 1, Activation::Identity);
        genome.connect(0, 77, 1.0); // 77 was never declared

        let err = decode(&genome, &scalar_config()).unwrap_err();
        assert_eq!(err, DecodeError::UnknownNodeId { id: 77 });
    }

    #[test]
    fn test_input_connection_target_rejected_for_acyclic() {
        let mut genome = NetworkGenome::new(NetworkKind::Acyclic, 2, 1, Activation::Identity);
        genome.connect(0, 1, 1.0); // targets input node 1

        let err = decode(&genome, &scalar_config()).unwrap_err();
        assert_eq!(err, DecodeError::InputConnectionTarget { id: 1 });
    }

    #[test]
    fn test_decode_with_map_round_trip() {
        let mut genome = NetworkGenome::new(NetworkKind::Acyclic, 2, 1, Activation::Identity);
        genome.add_hidden(9_000_001);
        genome.connect(0, 9_000_001, 1.0);
        genome.connect(9_000_001, 2, 1.0);
        genome.connect(1, 2, 1.0);

        let (_, map) = decode_with_map(&genome, &scalar_config()).unwrap();
        assert_eq!(map.len(), 4);

        let inverse = map.create_inverse();
        for id in [0u64, 1, 2, 9_000_001] {
            let index = map.map(id).expect("declared id");
            assert_eq!(inverse.map(index), Some(id));
        }
        // Fixed-range identity holds for the inputs.
        assert_eq!(map.map(0), Some(0));
        assert_eq!(map.map(1), Some(1));
    }

    #[test]
    fn test_cyclic_map_fixes_outputs_after_inputs() {
        let mut genome = NetworkGenome::new(NetworkKind::Cyclic, 2, 2, Activation::Identity);
        genome.add_hidden(12_345);
        genome.connect(0, 2, 1.0);
        genome.connect(12_345, 3, 1.0);
        genome.connect(1, 12_345, 1.0);

        let (_, map) = decode_with_map(&genome, &scalar_config()).unwrap();
        // Inputs and outputs identity-mapped, hidden node first free slot.
        for id in 0..4u64 {
            assert_eq!(map.map(id), Some(id as usize));
        }
        assert_eq!(map.map(12_345), Some(4));
    }

    #[test]
    fn test_error_display() {
        assert!(DecodeError::CyclicGenome.to_string().contains("cycle"));
        assert!(DecodeError::UnknownNodeId { id: 7 }
            .to_string()
            .contains('7'));
        assert!(DecodeError::InputConnectionTarget { id: 1 }
            .to_string()
            .contains("input"));
    }

    #[test]
    fn test_phenome_reset_through_trait() {
        let mut genome = NetworkGenome::new(NetworkKind::Cyclic, 1, 1, Activation::Identity);
        genome.connect(0, 1, 1.0);
        genome.connect(1, 1, 0.5);

        let mut phenome = decode(&genome, &scalar_config()).unwrap();
        let first = phenome.activate(&[1.0]);
        let second = phenome.activate(&[1.0]);
        assert_ne!(first, second);

        phenome.reset();
        assert_eq!(phenome.activate(&[1.0]), first);
    }
}
