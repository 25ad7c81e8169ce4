//! # NEAT Phenome
//!
//! Genome-to-phenotype decoding and network execution for `NeuroEvolution`
//! of Augmenting Topologies (NEAT).
//!
//! ## Features
//!
//! - **Sparse-to-Dense ID Mapping**: genomes name nodes with arbitrary,
//!   non-contiguous integer IDs; decoding remaps them onto `0..N` array
//!   positions with an identity-mapped fixed range and an explicit overflow
//!   table ([`NodeIdMap`])
//! - **Two Executor Classes**: cycle-free genomes compile to a layered
//!   single-sweep feedforward plan ([`AcyclicNetwork`]); recurrent genomes
//!   run fixed-count synchronous relaxation with persistent state
//!   ([`CyclicNetwork`])
//! - **Scalar and Vector-Parallel Activation**: every activation function
//!   has numerically equivalent scalar and (feature `simd`) four-lane
//!   vector forms, selected once at decode time with a force-scalar
//!   override for reproducibility
//!
//! ## Quick Start
//!
//! ```rust
//! use neat_phenome::{decode, Activation, DecodeConfig, Network, NetworkGenome, NetworkKind};
//!
//! // A 2-input, 1-output feedforward genome with one hidden node. Hidden
//! // IDs are arbitrary sparse values; inputs and outputs are contiguous.
//! let mut genome = NetworkGenome::new(NetworkKind::Acyclic, 2, 1, Activation::Identity);
//! genome.add_hidden(7_000_003);
//! genome.connect(0, 7_000_003, 0.5);
//! genome.connect(7_000_003, 2, 2.0);
//! genome.connect(1, 2, 1.0);
//!
//! let mut network = decode(&genome, &DecodeConfig::default()).unwrap();
//! let outputs = network.activate(&[3.0, 1.0]);
//! assert_eq!(outputs, vec![3.0 * 0.5 * 2.0 + 1.0]);
//! ```
//!
//! ## Architecture
//!
//! Decoding flows genome → [`NodeIdMap`] → [`WeightedDigraph`] →
//! executor. The acyclic decoder computes longest-path layers (Kahn's
//! algorithm), permutes nodes into layer order, and buckets connections by
//! source layer so one forward sweep suffices; the cyclic executor uses the
//! graph as-is with a dual pre/post activation buffer so each relaxation
//! pass reads only the previous pass's values.
//!
//! A decoded network owns one mutable working buffer and activates through
//! `&mut self`: one thread per live network instance, enforced by the
//! borrow checker. Independent instances (even two decodes of the same
//! genome) share nothing and run concurrently without synchronization.
//!
//! The evolutionary algorithm itself (selection, mutation, crossover,
//! speciation) and genome persistence live outside this crate; they consume
//! [`decode`] and drive [`Network::activate`] from a fitness callback.

pub mod activation;
pub mod acyclic;
pub mod cyclic;
pub mod decoder;
pub mod genome;
pub mod graph;
pub mod id_map;

// Re-exports for convenience
pub use activation::Activation;
pub use acyclic::AcyclicNetwork;
pub use cyclic::CyclicNetwork;
pub use decoder::{
    decode, decode_with_map, vector_support, DecodeConfig, DecodeError, Network, Phenome,
    SimdPolicy,
};
pub use genome::{ConnectionGene, NetworkGenome, NetworkKind};
pub use graph::{Connection, WeightedDigraph};
pub use id_map::{InverseNodeIdMap, NodeIdMap};
