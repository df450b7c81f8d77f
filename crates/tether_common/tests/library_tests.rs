//! Tests for loading plans and scenarios and for the JSON report.

use std::fs;

use tether_common::library::{self, PlanLibrary};
use tether_common::model::Assignment;
use tether_common::report::ScenarioOutput;
use tether_common::{DispatchStatus, TetherError};

const PLAN_1: &str = r#"{
    "plan_name": "plan_1",
    "start": {"P": true, "Q": true},
    "goal": {"P": false},
    "sequence": [
        {"action": "A1", "precondition": {"P": true, "Q": true}, "effect": {"Q": false}},
        {"action": "A2", "precondition": {"Q": false}, "effect": {"P": false}}
    ]
}"#;

const SCENARIO_OK: &str = r#"{
    "scenario_name": "scenario_ok",
    "plan_name": "plan_1",
    "start": {"P": true, "Q": true},
    "sequence": [
        {"action": "A1", "state_change": {"Q": false}},
        {"action": "A2", "state_change": {"P": false}}
    ]
}"#;

const SCENARIO_FAIL: &str = r#"{
    "scenario_name": "scenario_fail",
    "plan_name": "plan_1",
    "start": {"P": true, "Q": true},
    "sequence": [
        {"action": "A1", "state_change": {}},
        {"action": "A2", "state_change": {"P": false}}
    ]
}"#;

fn library() -> PlanLibrary {
    let mut library = PlanLibrary::new();
    library.load_plan_str(PLAN_1).unwrap();
    library.load_scenario_str(SCENARIO_OK).unwrap();
    library.load_scenario_str(SCENARIO_FAIL).unwrap();
    library
}

#[test]
fn test_parse_plan_keeps_json_text_of_values() {
    let plan = library::parse_plan(PLAN_1).unwrap();
    assert_eq!(plan.name, "plan_1");
    assert_eq!(plan.action_sequence.len(), 2);
    assert!(plan.start.contains(&Assignment::new("P", "true")));
    assert_eq!(plan.goal, vec![Assignment::new("P", "false")]);
    assert_eq!(plan.partial_order_plan.links.len(), 4);
}

#[test]
fn test_string_values_are_kept_verbatim() {
    let plan = library::parse_plan(
        r#"{"plan_name": "p", "start": {"in_air": "False"}, "goal": {"in_air": "True"},
            "sequence": [{"action": "launch", "precondition": {"in_air": "False"},
                          "effect": {"in_air": "True"}}]}"#,
    )
    .unwrap();
    assert_eq!(plan.start, vec![Assignment::new("in_air", "False")]);
    assert!(plan.partial_order_plan.open_links().is_empty());
}

#[test]
fn test_invalid_plans_are_rejected() {
    let reserved = r#"{"plan_name": "p", "sequence": [{"action": "goal"}]}"#;
    let err = library::parse_plan(reserved).unwrap_err();
    assert!(matches!(err, TetherError::InvalidPlan(_)));

    let nested = r#"{"plan_name": "p", "start": {"P": [1, 2]}}"#;
    assert!(matches!(library::parse_plan(nested).unwrap_err(), TetherError::InvalidPlan(_)));

    let unnamed = r#"{"plan_name": " "}"#;
    assert_eq!(library::parse_plan(unnamed).unwrap_err().code(), -33004);

    let malformed = r#"{"sequence": []}"#;
    assert!(matches!(library::parse_plan(malformed).unwrap_err(), TetherError::Json(_)));
}

#[test]
fn test_scenario_parsing() {
    let scenario = library::parse_scenario(SCENARIO_OK).unwrap();
    assert_eq!(scenario.name, "scenario_ok");
    assert_eq!(scenario.plan_name, "plan_1");
    assert_eq!(scenario.stages.len(), 2);
    assert_eq!(scenario.stages[0].state_change.get("Q").map(String::as_str), Some("false"));
    assert!(!scenario.is_interactive());

    let stages = scenario.encoded_stages();
    assert_eq!(stages.len(), 4);
    assert_eq!(stages[0].action, "start");
    assert_eq!(stages[3].action, "goal");
    assert!(stages[3].state_change.is_empty());
}

#[test]
fn test_dispatch_registered_scenarios() {
    let library = library();

    let ok = library.dispatch_scenario("scenario_ok").unwrap();
    assert_eq!(ok.status, DispatchStatus::Success);

    let fail = library.dispatch_scenario("scenario_fail").unwrap();
    assert_eq!(fail.status, DispatchStatus::AbortedConflict);
    assert_eq!(fail.conflicts[0].condition, Assignment::new("Q", "false"));
}

#[test]
fn test_lookup_errors() {
    let library = library();
    assert!(matches!(library.plan("nope"), Err(TetherError::UnknownPlan(_))));
    assert!(matches!(library.scenario("nope"), Err(TetherError::UnknownScenario(_))));
    assert!(matches!(
        library.dispatch_scenario("nope"),
        Err(TetherError::UnknownScenario(_))
    ));

    let mut orphan = PlanLibrary::new();
    orphan.load_scenario_str(SCENARIO_OK).unwrap();
    assert!(matches!(
        orphan.dispatch_scenario("scenario_ok"),
        Err(TetherError::UnknownPlan(_))
    ));
}

#[test]
fn test_scenario_for_other_plan_is_rejected() {
    let plan = library::parse_plan(&PLAN_1.replace("plan_1", "plan_2")).unwrap();
    let scenario = library::parse_scenario(SCENARIO_OK).unwrap();

    let err = library::dispatch_scenario(&plan, &scenario).unwrap_err();
    assert!(matches!(err, TetherError::ScenarioMismatch { .. }));
    assert_eq!(err.code(), -33005);
}

#[test]
fn test_names_and_scenarios_for_plan() {
    let library = library();
    assert_eq!(library.plan_names(), vec!["plan_1"]);
    assert_eq!(library.scenario_names(), vec!["scenario_fail", "scenario_ok"]);
    assert_eq!(library.scenarios_for("plan_1").len(), 2);
    assert!(library.scenarios_for("plan_2").is_empty());
}

#[test]
fn test_load_directories() {
    let dir = tempfile::tempdir().unwrap();
    let plans = dir.path().join("plans");
    let scenarios = dir.path().join("scenarios");
    fs::create_dir_all(&plans).unwrap();
    fs::create_dir_all(&scenarios).unwrap();
    fs::write(plans.join("plan_1.json"), PLAN_1).unwrap();
    fs::write(plans.join("notes.txt"), "not a plan").unwrap();
    fs::write(scenarios.join("ok.json"), SCENARIO_OK).unwrap();
    fs::write(scenarios.join("fail.json"), SCENARIO_FAIL).unwrap();

    let mut library = PlanLibrary::new();
    assert_eq!(library.load_plan_dir(&plans).unwrap(), 1);
    assert_eq!(library.load_scenario_dir(&scenarios).unwrap(), 2);
    assert!(library.plan("plan_1").is_ok());
    assert!(library.dispatch_scenario("scenario_ok").unwrap().success());
}

#[test]
fn test_missing_file_is_io_error() {
    let mut library = PlanLibrary::new();
    let err = library.load_plan_file("/nonexistent/plan.json").unwrap_err();
    assert!(matches!(err, TetherError::Io(_)));
}

#[test]
fn test_scenario_output_json() {
    let library = library();
    let plan = library.plan("plan_1").unwrap();
    let report = library.dispatch_scenario("scenario_fail").unwrap();

    let json = ScenarioOutput::new(plan, Some(&report)).to_json_pretty().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["plan_name"], "plan_1");
    assert_eq!(value["partial_plan"]["links"].as_array().map(Vec::len), Some(4));
    assert_eq!(value["monitored_execution"]["status"], "aborted_conflict");
    assert_eq!(value["monitored_execution"]["completed"][0], "start");

    let compiled_only = ScenarioOutput::new(plan, None).to_json_pretty().unwrap();
    assert!(compiled_only.contains("partial_plan"));
    assert!(!compiled_only.contains("monitored_execution"));
}

#[test]
fn test_shipped_scenarios_succeed() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let mut library = PlanLibrary::new();
    library.load_plan_dir(root.join("plans")).unwrap();
    library.load_scenario_dir(root.join("scenarios")).unwrap();

    let names: Vec<String> = library.scenario_names().into_iter().map(String::from).collect();
    assert!(!names.is_empty());
    for name in &names {
        if library.scenario(name).unwrap().is_interactive() {
            continue;
        }
        let report = library.dispatch_scenario(name).unwrap();
        assert!(report.success(), "{} ended {}", name, report.status);
    }
}
