//! Tests for causal link extraction, threat resolution and ordering
//! minimization.

use tether_common::compiler::{compile, encode_total_order_plan, extract_causal_links};
use tether_common::model::{
    Action, ActionId, Assignment, CompileDiagnostic, LinkId, PartialOrderPlan, TotalOrderPlan,
};

fn a(variable: &str, value: &str) -> Assignment {
    Assignment::new(variable, value)
}

fn action(name: &str, pre: Vec<Assignment>, eff: Vec<Assignment>) -> Action {
    Action::new(name, pre, eff)
}

fn find_link(plan: &PartialOrderPlan, condition: &Assignment, producer: &str, consumer: &str) -> Option<LinkId> {
    plan.link_ids().find(|&id| {
        let link = plan.link(id);
        link.condition == *condition
            && link.producer.map(|p| plan.action(p).operator.as_str()) == Some(producer)
            && plan.action(link.consumer).operator == consumer
    })
}

fn ordering_names(plan: &PartialOrderPlan) -> Vec<(String, String)> {
    plan.orderings
        .iter()
        .map(|o| {
            (
                plan.action(o.predecessor).operator.clone(),
                plan.action(o.successor).operator.clone(),
            )
        })
        .collect()
}

fn id_of(plan: &PartialOrderPlan, name: &str) -> ActionId {
    plan.action_named(name).unwrap().id()
}

// =============================================================================
// Scenario A: start={P:true,Q:true}, goal={P:false}, A1 then A2
// =============================================================================

fn scenario_a() -> TotalOrderPlan {
    TotalOrderPlan::new(
        "plan_1",
        vec![
            action("A1", vec![a("P", "true"), a("Q", "true")], vec![a("Q", "false")]),
            action("A2", vec![a("Q", "false")], vec![a("P", "false")]),
        ],
        vec![a("P", "true"), a("Q", "true")],
        vec![a("P", "false")],
    )
}

#[test]
fn test_scenario_a_links() {
    let plan = scenario_a();
    let pop = &plan.partial_order_plan;

    assert_eq!(pop.links.len(), 4);
    assert!(find_link(pop, &a("P", "true"), "start", "A1").is_some());
    assert!(find_link(pop, &a("Q", "true"), "start", "A1").is_some());
    assert!(find_link(pop, &a("Q", "false"), "A1", "A2").is_some());
    assert!(find_link(pop, &a("P", "false"), "A2", "goal").is_some());

    assert!(pop.orderings.is_empty());
    assert!(plan.threats.is_empty());
    assert!(pop.open_links().is_empty());
    assert!(pop.uncovered_preconditions().is_empty());
    assert!(plan.diagnostics().is_empty());
}

#[test]
fn test_scenario_a_relations() {
    let plan = scenario_a();
    let pop = &plan.partial_order_plan;
    let start = id_of(pop, "start");
    let a1 = id_of(pop, "A1");
    let a2 = id_of(pop, "A2");
    let goal = id_of(pop, "goal");

    assert_eq!(pop.start_action, start);
    assert_eq!(pop.goal_action, goal);
    assert!(pop.action(start).successor_actions.iter().all(|&s| s == a1));
    assert_eq!(pop.action(start).successor_links.len(), 2);
    assert_eq!(pop.action(a1).predecessor_links.len(), 2);
    assert_eq!(pop.action(a1).successor_actions, vec![a2]);
    assert_eq!(pop.action(a2).successor_actions, vec![goal]);
    assert_eq!(pop.action(goal).predecessor_actions, vec![a2]);
    assert!(pop.action(goal).successor_actions.is_empty());
}

#[test]
fn test_encoded_sequence() {
    let plan = scenario_a();
    let encoded = plan.encoded_sequence();
    let names: Vec<&str> = encoded.iter().map(|a| a.operator.as_str()).collect();
    assert_eq!(names, vec!["start", "A1", "A2", "goal"]);
    for (index, action) in encoded.iter().enumerate() {
        assert_eq!(action.location, index);
        assert_eq!(action.id(), ActionId(index));
    }
    // The input sequence is kept as given.
    assert_eq!(plan.action_sequence.len(), 2);
    assert!(plan.action_sequence[0].successor_actions.is_empty());
}

// =============================================================================
// Producer choice
// =============================================================================

#[test]
fn test_producer_is_closest_earlier_action() {
    let sequence = vec![
        action("P1", vec![], vec![a("X", "1")]),
        action("P2", vec![], vec![a("X", "1")]),
        action("C", vec![a("X", "1")], vec![]),
    ];
    let mut encoded = encode_total_order_plan(&sequence, &[], &[]);
    let links = extract_causal_links("closest", &mut encoded);

    assert_eq!(links.len(), 1);
    assert_eq!(links[0].producer, Some(ActionId(2)));
    assert_eq!(links[0].consumer, ActionId(3));
}

#[test]
fn test_one_effect_serves_every_consumer() {
    let (pop, threats) = compile(
        "shared",
        &[
            action("P", vec![], vec![a("X", "1")]),
            action("C1", vec![a("X", "1")], vec![a("Y", "1")]),
            action("C2", vec![a("X", "1")], vec![a("Z", "1")]),
        ],
        &[],
        &[a("Y", "1"), a("Z", "1")],
    );

    assert!(find_link(&pop, &a("X", "1"), "P", "C1").is_some());
    assert!(find_link(&pop, &a("X", "1"), "P", "C2").is_some());
    assert!(pop.open_links().is_empty());
    assert!(threats.is_empty());
}

#[test]
fn test_open_precondition_is_kept() {
    let plan = TotalOrderPlan::new(
        "open",
        vec![action("C", vec![a("Y", "1")], vec![a("G", "1")])],
        vec![],
        vec![a("G", "1")],
    );
    let pop = &plan.partial_order_plan;

    let open = pop.open_links();
    assert_eq!(open.len(), 1);
    let link = pop.link(open[0]);
    assert_eq!(link.condition, a("Y", "1"));
    assert_eq!(link.producer, None);
    assert_eq!(pop.action(link.consumer).operator, "C");

    assert_eq!(
        plan.diagnostics(),
        vec![CompileDiagnostic::OpenPrecondition { link: open[0] }]
    );
    assert_eq!(pop.uncovered_preconditions(), vec![(id_of(pop, "C"), a("Y", "1"))]);
}

// =============================================================================
// Threats and orderings
// =============================================================================

#[test]
fn test_sequential_chain_needs_no_orderings() {
    let (pop, threats) = compile(
        "chain",
        &[
            action("a", vec![a("x", "0")], vec![a("x", "1")]),
            action("b", vec![a("x", "1")], vec![a("y", "1")]),
            action("c", vec![a("y", "1")], vec![a("z", "1")]),
        ],
        &[a("x", "0")],
        &[a("z", "1")],
    );

    assert!(pop.orderings.is_empty());
    assert!(threats.is_empty());
    assert_eq!(pop.links.len(), 4);
}

#[test]
fn test_clobber_after_consumer_orders_consumer_first() {
    let (pop, threats) = compile(
        "after",
        &[
            action("B", vec![a("C", "true")], vec![a("G1", "true")]),
            action("D", vec![], vec![a("C", "false"), a("G2", "true")]),
        ],
        &[a("C", "true")],
        &[a("G1", "true"), a("G2", "true")],
    );

    assert!(threats.is_empty());
    assert_eq!(ordering_names(&pop), vec![("B".to_string(), "D".to_string())]);

    let b = id_of(&pop, "B");
    let d = id_of(&pop, "D");
    assert!(pop.action(b).successor_actions.contains(&d));
    assert_eq!(pop.action(d).predecessor_actions, vec![b]);
}

#[test]
fn test_clobber_before_producer_orders_it_first() {
    let (pop, threats) = compile(
        "before",
        &[
            action("D", vec![a("R", "1")], vec![a("C", "false")]),
            action("P", vec![], vec![a("C", "true")]),
            action("B", vec![a("C", "true")], vec![a("G", "true")]),
        ],
        &[a("R", "1")],
        &[a("G", "true")],
    );

    assert!(threats.is_empty());
    assert_eq!(ordering_names(&pop), vec![("D".to_string(), "P".to_string())]);
    let p = id_of(&pop, "P");
    assert_eq!(pop.action(p).predecessor_actions, vec![id_of(&pop, "D")]);
}

#[test]
fn test_ordering_implied_by_links_is_not_added() {
    // A2 clobbers P=true, but A1 -> A2 already follows from the Q link.
    let plan = scenario_a();
    let pop = &plan.partial_order_plan;
    assert!(pop.orderings.is_empty());
}

#[test]
fn test_ordering_into_unlinked_producer_is_kept() {
    // Neither C nor P consumes anything, so no link leads into them.
    let (pop, threats) = compile(
        "unlinked",
        &[
            action("C", vec![], vec![a("X", "no")]),
            action("P", vec![], vec![a("X", "yes")]),
            action("U", vec![a("X", "yes")], vec![]),
        ],
        &[],
        &[],
    );

    assert!(threats.is_empty());
    assert_eq!(ordering_names(&pop), vec![("C".to_string(), "P".to_string())]);
    let c = id_of(&pop, "C");
    let p = id_of(&pop, "P");
    assert_eq!(pop.action(p).predecessor_actions, vec![c]);
    assert_eq!(pop.action(c).predecessor_actions, vec![pop.start_action]);
}

#[test]
fn test_ordering_kept_when_links_reach_threat_another_way() {
    // D is reached from start through Z by links, but nothing puts it after B.
    let (pop, threats) = compile(
        "second_path",
        &[
            action("B", vec![a("C", "true")], vec![a("G1", "true")]),
            action("Z", vec![a("S", "1")], vec![a("R", "1")]),
            action("D", vec![a("R", "1")], vec![a("C", "false"), a("G2", "true")]),
        ],
        &[a("C", "true"), a("S", "1")],
        &[a("G1", "true"), a("G2", "true")],
    );

    assert!(threats.is_empty());
    assert_eq!(ordering_names(&pop), vec![("B".to_string(), "D".to_string())]);
    assert!(pop.action(id_of(&pop, "D")).predecessor_actions.contains(&id_of(&pop, "B")));
}

#[test]
fn test_interleaved_clobber_is_unresolved_threat() {
    let plan = TotalOrderPlan::new(
        "interleaved",
        vec![
            action("P", vec![], vec![a("C", "true")]),
            action("D", vec![], vec![a("C", "false")]),
            action("B", vec![a("C", "true")], vec![a("G", "true")]),
        ],
        vec![],
        vec![a("G", "true")],
    );
    let pop = &plan.partial_order_plan;

    assert_eq!(plan.threats.len(), 1);
    let threat = plan.threats[0];
    assert_eq!(pop.action(threat.action).operator, "D");
    assert_eq!(Some(threat.link), find_link(pop, &a("C", "true"), "P", "B"));
    assert!(plan
        .diagnostics()
        .contains(&CompileDiagnostic::UnresolvedThreat {
            link: threat.link,
            action: threat.action,
        }));
}

#[test]
fn test_unthreatened_link_is_never_in_a_threat() {
    let plan = scenario_a();
    let pop = &plan.partial_order_plan;
    let link = find_link(pop, &a("Q", "false"), "A1", "A2").unwrap();
    assert!(plan.threats.iter().all(|t| t.link != link));
}

#[test]
fn test_compile_is_deterministic() {
    let sequence = vec![
        action("B", vec![a("C", "true")], vec![a("G1", "true")]),
        action("D", vec![], vec![a("C", "false"), a("G2", "true")]),
    ];
    let start = vec![a("C", "true")];
    let goal = vec![a("G1", "true"), a("G2", "true")];

    let (first, first_threats) = compile("same", &sequence, &start, &goal);
    let (second, second_threats) = compile("same", &sequence, &start, &goal);

    assert_eq!(first.links, second.links);
    assert_eq!(first.orderings, second.orderings);
    assert_eq!(first_threats, second_threats);
}

#[test]
fn test_display_lists_links_and_orderings() {
    let plan = scenario_a();
    let text = plan.partial_order_plan.to_string();
    assert!(text.contains("POP plan_1:"));
    assert!(text.contains("Q=false: A1->A2"));
    assert!(text.contains("none"));
    assert!(plan.to_string().contains("TOP plan_1:"));
}
