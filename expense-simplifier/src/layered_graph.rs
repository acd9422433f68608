//! Layered graph and blocking flow (one phase of Dinic's algorithm)
//!
//! # Algorithm
//!
//! 1. BFS from the source over edges with positive capacity, assigning each
//!    user the level it is first discovered at. Once the sink is reached at
//!    level `D`, the rest of level `D - 1` is drained but no other user is
//!    admitted at level `D`.
//! 2. A single backward pass turns every head other than the sink with no
//!    surviving edges into a tombstone, and every edge into a removed head
//!    into a tombstone. Heads only point at later heads, so one pass prunes
//!    dead ends transitively.
//! 3. Edges recorded against user ids are rewritten to the position of the
//!    target head, and tombstones are dropped.
//! 4. An explicit-stack DFS from the source pushes the bottleneck capacity of
//!    every path into the sink until each shortest path has a saturated edge.
//!
//! # Layout
//!
//! ```text
//! [Head(s,0)] [Nbr->3] [Nbr->5] [Head(a,1)] [Nbr->7] [Head(b,1)] [Nbr->7] [Head(t,2)]
//! ```
//!
//! Every head is followed by its outgoing edges. The source head is always at
//! position 0 and the sink head is always last.

use debt_graph::{AugmentedDebtGraph, Cents, UserId};
use std::collections::VecDeque;

/// Entry of a [`LayeredGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayeredGraphNode {
    /// A user; the `Neighbor`s that follow are its outgoing edges
    Head {
        /// User this head stands for
        user_id: UserId,
        /// BFS distance from the source (0 for the source)
        level: u32,
    },

    /// Edge from the preceding head to the head at `head_idx`
    Neighbor {
        /// Position of the target head. Holds the target's user id while the
        /// graph is being built.
        head_idx: usize,
        /// Capacity available for moving money along the edge
        capacity: Cents,
        /// Flow assigned by the blocking flow, `<= capacity`
        flow: Cents,
    },

    /// Marks an entry for deletion during construction only
    Tombstone,
}

impl LayeredGraphNode {
    /// Whether this is a head
    pub fn is_head(&self) -> bool {
        matches!(self, LayeredGraphNode::Head { .. })
    }
}

/// Level graph from a source to a sink with a blocking flow assigned.
///
/// An empty graph means the sink is unreachable from the source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayeredGraph {
    nodes: Vec<LayeredGraphNode>,
}

/// DFS frame: a visit to one head along one path.
#[derive(Debug, Clone, Copy)]
struct Frame {
    /// Position of the head being visited
    node_idx: usize,
    /// Flow pushed into the sink through this visit so far
    flow: Cents,
    /// Bottleneck capacity inherited from the path
    capacity: Cents,
}

impl LayeredGraph {
    /// Build the level graph of `graph` from `source` to `sink` and saturate
    /// it with a blocking flow.
    ///
    /// `source == sink` is not supported.
    pub fn construct_blocking_flow(
        graph: &AugmentedDebtGraph,
        source: UserId,
        sink: UserId,
    ) -> Self {
        let (mut nodes, mut alive) = Self::build_levels(graph, source, sink);
        Self::prune(&mut nodes, &mut alive, sink);

        let mut layered_graph = Self {
            nodes: Self::resolve_indices(nodes, graph.num_users()),
        };
        layered_graph.assign_blocking_flow();
        layered_graph
    }

    /// BFS layering. Returns the raw node list with edges recorded against
    /// target user ids, plus which users may still appear in the result.
    fn build_levels(
        graph: &AugmentedDebtGraph,
        source: UserId,
        sink: UserId,
    ) -> (Vec<LayeredGraphNode>, Vec<bool>) {
        let mut nodes = Vec::new();
        let mut levels: Vec<Option<u32>> = vec![None; graph.num_users()];
        let mut queue = VecDeque::new();
        let mut sink_level: Option<u32> = None;

        levels[source] = Some(0);
        queue.push_back((source, 0u32));

        while let Some((user_id, level)) = queue.pop_front() {
            // Every shortest path into the sink is known once its level is reached.
            if Some(level) == sink_level {
                break;
            }

            nodes.push(LayeredGraphNode::Head { user_id, level });
            let next_level = level + 1;

            for (&neighbor_id, &capacity) in graph.debts_of(user_id) {
                if capacity <= 0 {
                    continue;
                }

                if neighbor_id == sink && sink_level.is_none() {
                    sink_level = Some(next_level);
                }

                match levels[neighbor_id] {
                    Some(neighbor_level) if neighbor_level != next_level => continue,
                    Some(_) => {}
                    None => {
                        if neighbor_id != sink && sink_level == Some(next_level) {
                            // Nothing discovered at the sink's level can reach it.
                            continue;
                        }
                        levels[neighbor_id] = Some(next_level);
                        queue.push_back((neighbor_id, next_level));
                    }
                }

                nodes.push(LayeredGraphNode::Neighbor {
                    head_idx: neighbor_id,
                    capacity,
                    flow: 0,
                });
            }
        }

        // The sink is never expanded, so its head is added by hand.
        if let Some(level) = sink_level {
            nodes.push(LayeredGraphNode::Head {
                user_id: sink,
                level,
            });
        }

        let sink_level = sink_level.unwrap_or(u32::MAX);
        let alive = levels
            .iter()
            .enumerate()
            .map(|(id, level)| match level {
                Some(level) => id == sink || *level < sink_level,
                None => false,
            })
            .collect();

        (nodes, alive)
    }

    /// Single backward pass marking dead heads and dangling edges as tombstones.
    fn prune(nodes: &mut [LayeredGraphNode], alive: &mut [bool], sink: UserId) {
        let mut live_neighbors = 0usize;

        for node in nodes.iter_mut().rev() {
            match *node {
                LayeredGraphNode::Head { user_id, .. } => {
                    if user_id != sink && live_neighbors == 0 {
                        alive[user_id] = false;
                        *node = LayeredGraphNode::Tombstone;
                    }
                    live_neighbors = 0;
                }
                LayeredGraphNode::Neighbor { head_idx, .. } => {
                    if alive[head_idx] {
                        live_neighbors += 1;
                    } else {
                        *node = LayeredGraphNode::Tombstone;
                    }
                }
                LayeredGraphNode::Tombstone => {}
            }
        }
    }

    /// Rewrite edge targets from user ids to final head positions and drop
    /// tombstones.
    fn resolve_indices(nodes: Vec<LayeredGraphNode>, num_users: usize) -> Vec<LayeredGraphNode> {
        let mut head_positions: Vec<Option<usize>> = vec![None; num_users];
        let mut position = 0;
        for node in &nodes {
            match *node {
                LayeredGraphNode::Head { user_id, .. } => {
                    head_positions[user_id] = Some(position);
                    position += 1;
                }
                LayeredGraphNode::Neighbor { .. } => position += 1,
                LayeredGraphNode::Tombstone => {}
            }
        }

        nodes
            .into_iter()
            .filter_map(|node| match node {
                LayeredGraphNode::Tombstone => None,
                LayeredGraphNode::Neighbor {
                    head_idx,
                    capacity,
                    flow,
                } => head_positions[head_idx].map(|head_idx| LayeredGraphNode::Neighbor {
                    head_idx,
                    capacity,
                    flow,
                }),
                head => Some(head),
            })
            .collect()
    }

    /// Iterative DFS assigning a blocking flow.
    ///
    /// Every head keeps a cursor on the first edge that may still carry flow
    /// during this phase. An edge is passed over for good once it is
    /// saturated or its target returned less than was offered, so dead ends
    /// are explored once per phase no matter how many paths reach them.
    fn assign_blocking_flow(&mut self) {
        let Some(sink_idx) = self.nodes.len().checked_sub(1) else {
            return;
        };

        // cursors[i] is only meaningful when `i` is a head position
        let mut cursors: Vec<usize> = (1..=self.nodes.len()).collect();
        let mut stack = vec![Frame {
            node_idx: 0,
            flow: 0,
            capacity: Cents::MAX,
        }];

        while let Some(frame) = stack.pop() {
            let returned = if frame.node_idx == sink_idx {
                frame.capacity
            } else if frame.flow == frame.capacity {
                frame.flow
            } else if let Some(&LayeredGraphNode::Neighbor {
                head_idx,
                capacity,
                flow,
            }) = self.nodes.get(cursors[frame.node_idx])
            {
                let bound = (frame.capacity - frame.flow).min(capacity - flow);
                stack.push(frame);
                if bound > 0 {
                    stack.push(Frame {
                        node_idx: head_idx,
                        flow: 0,
                        capacity: bound,
                    });
                } else {
                    // Saturated edge
                    cursors[frame.node_idx] += 1;
                }
                continue;
            } else {
                // Out of neighbors: report everything that reached the sink.
                frame.flow
            };

            if let Some(parent) = stack.last_mut() {
                let edge_idx = cursors[parent.node_idx];
                parent.flow += returned;
                if let Some(LayeredGraphNode::Neighbor { flow, .. }) = self.nodes.get_mut(edge_idx)
                {
                    *flow += returned;
                }
                if returned < frame.capacity {
                    cursors[parent.node_idx] += 1;
                }
            }
        }
    }

    /// Total flow leaving the source
    pub fn compute_flow(&self) -> Cents {
        self.nodes
            .iter()
            .skip(1)
            .take_while(|node| !node.is_head())
            .map(|node| match node {
                LayeredGraphNode::Neighbor { flow, .. } => *flow,
                _ => 0,
            })
            .sum()
    }

    /// Every edge carrying flow as `(from, to, flow)`, in layered order
    pub fn flows(&self) -> impl Iterator<Item = (UserId, UserId, Cents)> + '_ {
        let mut payer_id = None;

        self.nodes.iter().filter_map(move |node| match *node {
            LayeredGraphNode::Head { user_id, .. } => {
                payer_id = Some(user_id);
                None
            }
            LayeredGraphNode::Neighbor { head_idx, flow, .. } if flow > 0 => {
                match (payer_id, self.nodes.get(head_idx)) {
                    (Some(from), Some(&LayeredGraphNode::Head { user_id: to, .. })) => {
                        Some((from, to, flow))
                    }
                    _ => None,
                }
            }
            _ => None,
        })
    }

    /// Push every assigned flow back onto the residual view
    pub fn apply_flow(&self, graph: &mut AugmentedDebtGraph) {
        for (from, to, flow) in self.flows() {
            graph.push_flow(from, to, flow);
        }
    }

    /// Number of entries (heads plus edges)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no augmenting path exists
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over entries in order
    pub fn iter(&self) -> std::slice::Iter<'_, LayeredGraphNode> {
        self.nodes.iter()
    }

    /// All entries
    pub fn nodes(&self) -> &[LayeredGraphNode] {
        &self.nodes
    }
}

impl std::ops::Index<usize> for LayeredGraph {
    type Output = LayeredGraphNode;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.nodes[idx]
    }
}

impl<'a> IntoIterator for &'a LayeredGraph {
    type Item = &'a LayeredGraphNode;
    type IntoIter = std::slice::Iter<'a, LayeredGraphNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
