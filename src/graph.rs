//! Incrementally maintained overlap graph over a fragment arena.
//!
//! Fragments live in an arena and are addressed by a stable [`FragmentId`]
//! handle. Edges are kept as successor and predecessor adjacency maps keyed by
//! handle index so that removing a fragment only touches its own edges.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::fragment::Fragment;
use crate::overlap::{Overlap, OverlapConfig};

/// Mapping from a handle index to weighted neighbour indices.
pub type Adjacency = Vec<HashMap<usize, usize>>;

/// Prefix for ids synthesised by [`OverlapGraph::merge_and_replace`].
pub const MERGED_PREFIX: &str = "MERGED_";

/// Stable handle to a fragment stored in an [`OverlapGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FragmentId(usize);

impl FragmentId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors returned by graph mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("fragment id {0} is already present in the graph")]
    DuplicateFragment(String),
    #[error("no live fragment for handle {0}")]
    UnknownFragment(FragmentId),
    #[error(
        "invalid overlap length {requested} for {source_id} -> {target_id} (recorded: {recorded})"
    )]
    InvalidOverlap {
        source_id: String,
        target_id: String,
        requested: usize,
        /// Recorded edge weight, 0 when no edge exists.
        recorded: usize,
    },
}

/// Directed overlap graph whose edge set always matches its fragment set.
#[derive(Debug, Clone)]
pub struct OverlapGraph {
    config: OverlapConfig,
    slots: Vec<Option<Fragment>>,
    by_id: HashMap<String, FragmentId>,
    successors: Adjacency,
    predecessors: Adjacency,
    live: usize,
    edge_count: usize,
    merge_counter: usize,
}

impl OverlapGraph {
    /// An empty graph scoring overlaps with `config`.
    pub fn new(config: OverlapConfig) -> Self {
        Self {
            config,
            slots: Vec::new(),
            by_id: HashMap::new(),
            successors: Vec::new(),
            predecessors: Vec::new(),
            live: 0,
            edge_count: 0,
            merge_counter: 0,
        }
    }

    /// Build the full graph over `fragments`, computing every ordered pair.
    pub fn build<I>(fragments: I, config: OverlapConfig) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = Fragment>,
    {
        let mut graph = Self::new(config);
        for fragment in fragments {
            graph.add_fragment(fragment)?;
        }
        log::info!(
            "Overlap graph built: {} fragments, {} edges",
            graph.len(),
            graph.edge_count()
        );
        Ok(graph)
    }

    pub fn config(&self) -> OverlapConfig {
        self.config
    }

    /// Number of live fragments.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Live fragments in handle order.
    pub fn fragments(&self) -> impl Iterator<Item = (FragmentId, &Fragment)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|f| (FragmentId(idx), f)))
    }

    /// All current edges, ordered by source handle then target handle.
    pub fn edges(&self) -> impl Iterator<Item = Overlap> + '_ {
        self.successors.iter().enumerate().flat_map(|(src, row)| {
            let mut targets: Vec<(usize, usize)> =
                row.iter().map(|(&dst, &length)| (dst, length)).collect();
            targets.sort_unstable();
            targets.into_iter().map(move |(dst, length)| Overlap {
                source: FragmentId(src),
                target: FragmentId(dst),
                length,
            })
        })
    }

    pub fn fragment(&self, id: FragmentId) -> Option<&Fragment> {
        self.slots.get(id.0).and_then(|slot| slot.as_ref())
    }

    /// Resolve a fragment id string to its handle.
    pub fn find(&self, id: &str) -> Option<FragmentId> {
        self.by_id.get(id).copied()
    }

    /// Recorded overlap length of `source -> target`, if an edge exists.
    pub fn overlap_between(&self, source: FragmentId, target: FragmentId) -> Option<usize> {
        self.successors
            .get(source.0)
            .and_then(|row| row.get(&target.0))
            .copied()
    }

    /// Insert `fragment` and compute its edges against every live fragment.
    pub fn add_fragment(&mut self, fragment: Fragment) -> Result<FragmentId, GraphError> {
        if self.by_id.contains_key(fragment.id()) {
            return Err(GraphError::DuplicateFragment(fragment.id().to_string()));
        }
        Ok(self.insert(fragment))
    }

    /// Remove a fragment together with every edge touching it.
    pub fn remove_fragment(&mut self, id: FragmentId) -> Result<Fragment, GraphError> {
        let fragment = self
            .slots
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(GraphError::UnknownFragment(id))?;

        let outgoing = std::mem::take(&mut self.successors[id.0]);
        for dst in outgoing.keys() {
            self.predecessors[*dst].remove(&id.0);
        }
        let incoming = std::mem::take(&mut self.predecessors[id.0]);
        for src in incoming.keys() {
            self.successors[*src].remove(&id.0);
        }
        self.edge_count -= outgoing.len() + incoming.len();

        self.by_id.remove(fragment.id());
        self.live -= 1;
        log::trace!(
            "Removed {} ({} out, {} in edges)",
            fragment.id(),
            outgoing.len(),
            incoming.len()
        );
        Ok(fragment)
    }

    /// Merge `source` and `target` along their recorded overlap.
    ///
    /// `overlap_len` must be positive and equal to the recorded weight of the
    /// `source -> target` edge; otherwise the graph is left untouched. The
    /// merged fragment receives a fresh `MERGED_<n>` id unique to this graph.
    pub fn merge_and_replace(
        &mut self,
        source: FragmentId,
        target: FragmentId,
        overlap_len: usize,
    ) -> Result<&Fragment, GraphError> {
        let source_fragment = self.fragment(source).ok_or(GraphError::UnknownFragment(source))?;
        let target_fragment = self.fragment(target).ok_or(GraphError::UnknownFragment(target))?;

        let recorded = self.overlap_between(source, target).unwrap_or(0);
        if overlap_len == 0 || overlap_len != recorded {
            return Err(GraphError::InvalidOverlap {
                source_id: source_fragment.id().to_string(),
                target_id: target_fragment.id().to_string(),
                requested: overlap_len,
                recorded,
            });
        }

        let sequence = source_fragment.merged_sequence(target_fragment, overlap_len);
        let id = self.next_merged_id();

        self.remove_fragment(source)?;
        self.remove_fragment(target)?;
        let merged = self.insert(Fragment::from_parts(id, sequence));
        self.fragment(merged).ok_or(GraphError::UnknownFragment(merged))
    }

    /// Serializable snapshot of the graph, sorted by fragment id.
    pub fn export(&self) -> GraphExport {
        let mut nodes: Vec<NodeExport> = self
            .fragments()
            .map(|(_, f)| NodeExport {
                id: f.id().to_string(),
                sequence: f.sequence().to_string(),
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut edges: Vec<EdgeExport> = self
            .edges()
            .filter_map(|edge| {
                Some(EdgeExport {
                    source: self.fragment(edge.source)?.id().to_string(),
                    target: self.fragment(edge.target)?.id().to_string(),
                    length: edge.length,
                })
            })
            .collect();
        edges.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));

        GraphExport { nodes, edges }
    }

    fn insert(&mut self, fragment: Fragment) -> FragmentId {
        let id = FragmentId(self.slots.len());
        let mut outgoing = HashMap::new();
        let mut incoming = HashMap::new();

        for (other, existing) in self.fragments() {
            let forward = self.config.overlap(fragment.sequence(), existing.sequence());
            if forward > 0 {
                outgoing.insert(other.0, forward);
            }
            let backward = self.config.overlap(existing.sequence(), fragment.sequence());
            if backward > 0 {
                incoming.insert(other.0, backward);
            }
        }

        for (&dst, &length) in &outgoing {
            self.predecessors[dst].insert(id.0, length);
        }
        for (&src, &length) in &incoming {
            self.successors[src].insert(id.0, length);
        }
        self.edge_count += outgoing.len() + incoming.len();

        log::trace!(
            "Inserted {} as {} ({} out, {} in edges)",
            fragment.id(),
            id,
            outgoing.len(),
            incoming.len()
        );
        self.by_id.insert(fragment.id().to_string(), id);
        self.slots.push(Some(fragment));
        self.successors.push(outgoing);
        self.predecessors.push(incoming);
        self.live += 1;
        id
    }

    fn next_merged_id(&mut self) -> String {
        loop {
            let candidate = format!("{}{}", MERGED_PREFIX, self.merge_counter);
            self.merge_counter += 1;
            if !self.by_id.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

/// Node entry of a [`GraphExport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeExport {
    pub id: String,
    pub sequence: String,
}

/// Edge entry of a [`GraphExport`], endpoints named by fragment id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeExport {
    pub source: String,
    pub target: String,
    pub length: usize,
}

/// JSON-ready node and edge lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<EdgeExport>,
}
