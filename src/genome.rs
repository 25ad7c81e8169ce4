//! Genome-side input contract for the decoder.
//!
//! The evolutionary machinery that breeds genomes lives outside this crate;
//! what the decoder consumes is the slice of a genome that determines the
//! phenotype: node IDs, weighted connection triples, input/output counts,
//! the acyclic/cyclic flag, and the chosen activation function.
//!
//! Node ID convention: input nodes occupy IDs `0..input_count`, output
//! nodes occupy `input_count..input_count + output_count`, and hidden nodes
//! carry arbitrary IDs at or above `input_count + output_count`, typically
//! sparse, widely-scattered values when IDs are derived from structural
//! hashes rather than a global counter.

use serde::{Deserialize, Serialize};

use crate::activation::Activation;

/// Whether a genome's graph is to be decoded as acyclic (feedforward) or
/// cyclic (recurrent).
///
/// This is genome metadata, not something inferred from the graph: an
/// acyclic graph inside a cyclic-flagged genome is still run by the cyclic
/// executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NetworkKind {
    /// Feedforward network, evaluated in one layered sweep.
    Acyclic,
    /// Possibly-recurrent network, evaluated by fixed-count relaxation.
    Cyclic,
}

/// A weighted directed connection between two node IDs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectionGene {
    /// ID of the source node.
    pub source: u64,
    /// ID of the target node.
    pub target: u64,
    /// Connection weight.
    pub weight: f64,
}

/// The decoder's view of a genome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkGenome {
    /// Number of input nodes; their IDs are `0..input_count`.
    pub input_count: usize,
    /// Number of output nodes; their IDs follow the inputs directly.
    pub output_count: usize,
    /// IDs of hidden nodes, arbitrary values at or above the fixed ranges.
    pub hidden_ids: Vec<u64>,
    /// Weighted connection triples in genome order.
    pub connections: Vec<ConnectionGene>,
    /// Acyclic/cyclic decode flag.
    pub kind: NetworkKind,
    /// Activation function applied by every non-input node.
    pub activation: Activation,
}

impl NetworkGenome {
    /// Create a genome with no hidden nodes and no connections.
    #[must_use]
    pub fn new(
        kind: NetworkKind,
        input_count: usize,
        output_count: usize,
        activation: Activation,
    ) -> Self {
        Self {
            input_count,
            output_count,
            hidden_ids: Vec::new(),
            connections: Vec::new(),
            kind,
            activation,
        }
    }

    /// ID of the `i`-th input node.
    #[inline]
    #[must_use]
    pub fn input_id(&self, i: usize) -> u64 {
        debug_assert!(i < self.input_count);
        i as u64
    }

    /// ID of the `i`-th output node.
    #[inline]
    #[must_use]
    pub fn output_id(&self, i: usize) -> u64 {
        debug_assert!(i < self.output_count);
        (self.input_count + i) as u64
    }

    /// Declare a hidden node.
    pub fn add_hidden(&mut self, id: u64) {
        debug_assert!(
            id >= (self.input_count + self.output_count) as u64,
            "hidden ID inside the fixed ranges"
        );
        self.hidden_ids.push(id);
    }

    /// Add a connection between two node IDs.
    pub fn connect(&mut self, source: u64, target: u64, weight: f64) {
        self.connections.push(ConnectionGene {
            source,
            target,
            weight,
        });
    }

    /// Total number of declared nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.input_count + self.output_count + self.hidden_ids.len()
    }
}
