//! Plan compiler: total order in, least-commitment partial order out.
//!
//! 1. Encode the sequence with synthetic start and goal actions.
//! 2. Extract causal links by scanning backward, pairing each precondition
//!    with the closest earlier action that produces it.
//! 3. Resolve threats with orderings consistent with the given total order,
//!    record the ones that cannot be resolved, then minimize the orderings.

use tracing::{debug, info, warn};

use crate::minimizer;
use crate::model::{
    Action, ActionId, Assignment, CausalLink, LinkId, Ordering, PartialOrderPlan, Threat,
    GOAL_OPERATOR, START_OPERATOR,
};

/// Compile a grounded action sequence into a partial-order plan.
///
/// Never fails: open preconditions and unresolved threats are reported as
/// data and logged.
pub fn compile(
    name: &str,
    action_sequence: &[Action],
    start: &[Assignment],
    goal: &[Assignment],
) -> (PartialOrderPlan, Vec<Threat>) {
    let encoded = encode_total_order_plan(action_sequence, start, goal);
    extract_partial_order_plan(name, encoded)
}

/// Wrap the sequence in start and goal actions and stamp every location.
pub fn encode_total_order_plan(
    action_sequence: &[Action],
    start: &[Assignment],
    goal: &[Assignment],
) -> Vec<Action> {
    let mut encoded = Vec::with_capacity(action_sequence.len() + 2);
    encoded.push(Action::new(START_OPERATOR, Vec::new(), start.to_vec()));
    for action in action_sequence {
        let mut action = action.clone();
        action.clear_relations();
        encoded.push(action);
    }
    encoded.push(Action::new(GOAL_OPERATOR, goal.to_vec(), Vec::new()));

    for (location, action) in encoded.iter_mut().enumerate() {
        action.location = location;
    }
    encoded
}

fn extract_partial_order_plan(name: &str, mut actions: Vec<Action>) -> (PartialOrderPlan, Vec<Threat>) {
    let links = extract_causal_links(name, &mut actions);
    let (orderings, threats) = extract_orderings(name, &mut actions, &links);
    anchor_unconstrained_actions(&mut actions);

    let start_action = ActionId(0);
    let goal_action = ActionId(actions.len().saturating_sub(1));

    info!(
        "Compiled plan {}: {} actions, {} links, {} orderings, {} threats",
        name,
        actions.len(),
        links.len(),
        orderings.len(),
        threats.len()
    );

    let plan = PartialOrderPlan {
        name: name.to_string(),
        actions,
        links,
        orderings,
        start_action,
        goal_action,
    };
    (plan, threats)
}

/// Build the causal links of an encoded sequence and wire the link relations
/// of every action.
///
/// Scans from the goal back to the start. Each effect closes every open link
/// whose condition it equals, so a precondition's producer is always the
/// closest earlier action that establishes it. Links left open are kept with
/// no producer.
pub fn extract_causal_links(name: &str, actions: &mut [Action]) -> Vec<CausalLink> {
    let mut links: Vec<CausalLink> = Vec::new();
    let mut open: Vec<LinkId> = Vec::new();

    for index in (0..actions.len()).rev() {
        let producer = actions[index].id();

        for effect_index in 0..actions[index].effects.len() {
            let effect = &actions[index].effects[effect_index];
            let (closed, still_open): (Vec<LinkId>, Vec<LinkId>) = open
                .iter()
                .partition(|&&id| links[id.0].condition == *effect);
            open = still_open;

            for id in closed {
                links[id.0].producer = Some(producer);
                let consumer = links[id.0].consumer;
                actions[index].successor_links.push(id);
                actions[index].successor_actions.push(consumer);
                actions[consumer.0].predecessor_links.push(id);
                actions[consumer.0].predecessor_actions.push(producer);
            }
        }

        for precondition in &actions[index].preconditions {
            open.push(LinkId(links.len()));
            links.push(CausalLink {
                condition: precondition.clone(),
                producer: None,
                consumer: producer,
            });
        }
    }

    if !open.is_empty() {
        warn!("Missing producers for {} conditions in plan {}", open.len(), name);
        for id in &open {
            let link = &links[id.0];
            warn!(
                "  condition {} of action {}",
                link.condition, actions[link.consumer.0]
            );
        }
    }
    links
}

/// Orderings that resolve threats consistently with the total order, reduced
/// to a minimal set and wired into the action relations.
fn extract_orderings(
    name: &str,
    actions: &mut [Action],
    links: &[CausalLink],
) -> (Vec<Ordering>, Vec<Threat>) {
    let mut graph = minimizer::graph_for_actions_and_links(name, ActionId(0), actions, links);
    let mut candidates: Vec<Ordering> = Vec::new();
    let mut threats = Vec::new();

    for (index, link) in links.iter().enumerate() {
        // Nothing establishes an open link, so there is nothing to protect.
        let Some(producer) = link.producer else {
            continue;
        };
        let consumer = link.consumer;
        let producer_location = actions[producer.0].location;
        let consumer_location = actions[consumer.0].location;

        for action in actions.iter().filter(|a| a.threatens(&link.condition)) {
            let threat = action.id();
            if action.location <= producer_location {
                if threat != producer && !graph.path_exists(&threat, &producer) {
                    push_unique(&mut candidates, Ordering {
                        predecessor: threat,
                        successor: producer,
                    });
                }
            } else if consumer_location <= action.location {
                if threat != consumer && !graph.path_exists(&consumer, &threat) {
                    push_unique(&mut candidates, Ordering {
                        predecessor: consumer,
                        successor: threat,
                    });
                }
            } else {
                threats.push(Threat {
                    link: LinkId(index),
                    action: threat,
                });
            }
        }
    }

    let minimal = minimizer::remove_dominated_orderings(&mut graph, &candidates);
    for ordering in &minimal {
        actions[ordering.successor.0]
            .predecessor_actions
            .push(ordering.predecessor);
        actions[ordering.predecessor.0]
            .successor_actions
            .push(ordering.successor);
    }
    (minimal, threats)
}

fn push_unique(orderings: &mut Vec<Ordering>, ordering: Ordering) {
    if !orderings.contains(&ordering) {
        orderings.push(ordering);
    }
}

/// The start action precedes everything; make that explicit for actions that
/// no link or ordering places after another action.
fn anchor_unconstrained_actions(actions: &mut [Action]) {
    let Some((start, rest)) = actions.split_first_mut() else {
        return;
    };
    for action in rest.iter_mut() {
        if action.predecessor_actions.is_empty() {
            debug!("Anchoring unconstrained action {} after start", action);
            action.predecessor_actions.push(start.id());
            start.successor_actions.push(action.id());
        }
    }
}
