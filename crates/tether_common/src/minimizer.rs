//! Ordering minimization.
//!
//! Builds a graph with one vertex per action, one edge per closed causal link
//! and one edge per candidate ordering. Actions nothing leads into are
//! anchored to the start vertex with a weak edge so the traversal reaches
//! them. The orderings the preferred spanning tree uses are kept; any other
//! candidate is kept too unless the links and kept orderings already imply it.

use std::fmt;

use tracing::{debug, warn};

use crate::graph::DirectedGraph;
use crate::model::{Action, ActionId, CausalLink, LinkId, Ordering};

pub const LINK_PRIORITY: u32 = 1;
pub const ORDERING_PRIORITY: u32 = 2;
pub const ANCHOR_PRIORITY: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanEdge {
    Link(LinkId),
    /// Index into the candidate ordering list.
    Ordering(usize),
    /// Start precedes an action with no other incoming edge.
    Anchor(ActionId),
}

impl fmt::Display for PlanEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanEdge::Link(id) => write!(f, "{}", id),
            PlanEdge::Ordering(index) => write!(f, "O{}", index),
            PlanEdge::Anchor(id) => write!(f, "A{}", id.0),
        }
    }
}

pub type PlanGraph = DirectedGraph<ActionId, PlanEdge>;

/// Graph of actions connected by their causal links. Open links add no edge.
pub fn graph_for_actions_and_links(
    name: &str,
    start: ActionId,
    actions: &[Action],
    links: &[CausalLink],
) -> PlanGraph {
    let mut graph = PlanGraph::new(name);
    for action in actions {
        graph.add_vertex(action.id(), action.id() == start);
    }
    for (index, link) in links.iter().enumerate() {
        let Some(producer) = link.producer else {
            continue;
        };
        if let Err(err) = graph.add_edge(
            PlanEdge::Link(LinkId(index)),
            producer,
            link.consumer,
            LINK_PRIORITY,
        ) {
            warn!("Skipping link edge in {}: {}", name, err);
        }
    }
    graph
}

/// Return the subset of `orderings` that, with the links, implies the rest.
///
/// The graph must already hold the actions and links; the orderings and the
/// start anchors are added to it.
pub fn remove_dominated_orderings(graph: &mut PlanGraph, orderings: &[Ordering]) -> Vec<Ordering> {
    for (index, ordering) in orderings.iter().enumerate() {
        if let Err(err) = graph.add_edge(
            PlanEdge::Ordering(index),
            ordering.predecessor,
            ordering.successor,
            ORDERING_PRIORITY,
        ) {
            warn!("Skipping ordering edge in {}: {}", graph.name(), err);
        }
    }
    add_start_anchors(graph);

    graph.mark_preferred_spanning_tree();

    let mut kept: Vec<bool> = (0..orderings.len())
        .map(|index| graph.is_edge_marked(&PlanEdge::Ordering(index)))
        .collect();

    // Links plus kept orderings must still imply every dropped candidate.
    let mut implied = PlanGraph::new(graph.name());
    for (id, source, target, priority) in graph.edges() {
        let keep = match id {
            PlanEdge::Link(_) => true,
            PlanEdge::Ordering(index) => kept[*index],
            PlanEdge::Anchor(_) => false,
        };
        if keep {
            add_implied_edge(&mut implied, *id, *source, *target, priority);
        }
    }
    for (index, ordering) in orderings.iter().enumerate() {
        if kept[index] || implied.path_exists(&ordering.predecessor, &ordering.successor) {
            continue;
        }
        debug!(
            "Keeping ordering {} -> {} in {}: not implied by the spanning tree",
            ordering.predecessor,
            ordering.successor,
            graph.name()
        );
        kept[index] = true;
        add_implied_edge(
            &mut implied,
            PlanEdge::Ordering(index),
            ordering.predecessor,
            ordering.successor,
            ORDERING_PRIORITY,
        );
    }

    let minimal: Vec<Ordering> = orderings
        .iter()
        .zip(&kept)
        .filter(|(_, keep)| **keep)
        .map(|(ordering, _)| *ordering)
        .collect();

    debug!(
        "Kept {} of {} candidate orderings in {}",
        minimal.len(),
        orderings.len(),
        graph.name()
    );
    minimal
}

/// Connect the start vertex to every other vertex with no incoming edge.
fn add_start_anchors(graph: &mut PlanGraph) {
    let Some(&start) = graph.start() else {
        return;
    };
    let unanchored: Vec<ActionId> = graph
        .vertex_names()
        .filter(|&&id| id != start && graph.in_degree(&id) == 0)
        .copied()
        .collect();
    for id in unanchored {
        if let Err(err) = graph.add_edge(PlanEdge::Anchor(id), start, id, ANCHOR_PRIORITY) {
            warn!("Skipping anchor edge in {}: {}", graph.name(), err);
        }
    }
}

fn add_implied_edge(graph: &mut PlanGraph, id: PlanEdge, source: ActionId, target: ActionId, priority: u32) {
    if let Err(err) = graph.add_edge(id, source, target, priority) {
        warn!("Skipping edge in {}: {}", graph.name(), err);
    }
}
