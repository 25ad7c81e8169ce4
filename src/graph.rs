//! Normalized graph representation for decoded genomes.
//!
//! A [`WeightedDigraph`] holds a node count and connection triples whose
//! endpoints are already dense `0..node_count` indices, the output of
//! applying a [`crate::id_map::NodeIdMap`] to a genome's raw ID triples.
//! Longest-path layering runs on this form using Kahn's algorithm over a
//! CSR adjacency snapshot, which also doubles as cycle detection: a graph
//! whose nodes cannot all be processed contains a cycle.

/// A weighted directed connection between two dense node indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    /// Dense index of the source node.
    pub source: usize,
    /// Dense index of the target node.
    pub target: usize,
    /// Connection weight.
    pub weight: f64,
}

/// A directed weighted graph over a dense index space.
///
/// Immutable once built; shared read-only by the executors.
#[derive(Debug, Clone)]
pub struct WeightedDigraph {
    node_count: usize,
    connections: Vec<Connection>,
}

impl WeightedDigraph {
    /// Construct a graph from a node count and dense-index connections.
    ///
    /// Index bounds, finite weights, and (source, target) uniqueness are
    /// construction invariants owed by the decoder, checked in debug builds.
    #[must_use]
    pub fn new(node_count: usize, connections: Vec<Connection>) -> Self {
        debug_assert!(
            connections
                .iter()
                .all(|c| c.source < node_count && c.target < node_count),
            "connection endpoint out of bounds"
        );
        debug_assert!(
            connections.iter().all(|c| c.weight.is_finite()),
            "non-finite connection weight"
        );
        debug_assert!(
            {
                let mut pairs: Vec<_> = connections.iter().map(|c| (c.source, c.target)).collect();
                pairs.sort_unstable();
                pairs.windows(2).all(|w| w[0] != w[1])
            },
            "duplicate (source, target) connection"
        );
        Self {
            node_count,
            connections,
        }
    }

    /// Number of nodes in the graph.
    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// The graph's connections, in construction order.
    #[inline]
    #[must_use]
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Consume the graph, yielding its connections.
    #[must_use]
    pub fn into_connections(self) -> Vec<Connection> {
        self.connections
    }

    /// Compute the longest-path layer of every node, or `None` if the graph
    /// contains a cycle.
    ///
    /// Nodes with no predecessors sit at layer 0; every other node sits one
    /// past its deepest predecessor. This is the property that makes a
    /// single forward sweep sufficient: by the time a layer is processed,
    /// every predecessor of its nodes has already been finalized.
    #[must_use]
    pub fn layer_assignment(&self) -> Option<Vec<u32>> {
        let n = self.node_count;

        // Forward CSR adjacency.
        let mut counts = vec![0usize; n];
        for c in &self.connections {
            counts[c.source] += 1;
        }
        let mut offsets = Vec::with_capacity(n + 1);
        offsets.push(0usize);
        for &count in &counts {
            offsets.push(offsets.last().copied().unwrap_or(0) + count);
        }
        let mut targets = vec![0usize; self.connections.len()];
        let mut write_pos = offsets[..n].to_vec();
        for c in &self.connections {
            targets[write_pos[c.source]] = c.target;
            write_pos[c.source] += 1;
        }

        let mut in_degree = vec![0usize; n];
        for c in &self.connections {
            in_degree[c.target] += 1;
        }

        let mut layers = vec![0u32; n];
        let mut queue: std::collections::VecDeque<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &deg)| deg == 0)
            .map(|(idx, _)| idx)
            .collect();

        let mut processed = 0;
        while let Some(u) = queue.pop_front() {
            processed += 1;
            for &v in &targets[offsets[u]..offsets[u + 1]] {
                let candidate = layers[u].saturating_add(1);
                if candidate > layers[v] {
                    layers[v] = candidate;
                }
                in_degree[v] -= 1;
                if in_degree[v] == 0 {
                    queue.push_back(v);
                }
            }
        }

        if processed == n {
            Some(layers)
        } else {
            None
        }
    }
}
