//! Command implementations for tetherctl.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use tether_common::actor::{Actor, ActorKind, InteractiveActor, SimulatedActor};
use tether_common::config::TetherConfig;
use tether_common::library::{self, PlanLibrary};
use tether_common::model::CompileDiagnostic;
use tether_common::report::ScenarioOutput;
use tether_common::{DispatchReport, Dispatcher, TotalOrderPlan};
use tracing::info;

fn load_plan(path: &Path) -> Result<TotalOrderPlan> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading plan {}", path.display()))?;
    Ok(library::parse_plan(&content)?)
}

fn print_diagnostics(plan: &TotalOrderPlan) {
    let pop = &plan.partial_order_plan;
    let diagnostics = plan.diagnostics();
    if diagnostics.is_empty() {
        println!("No diagnostics.");
        return;
    }
    println!("Diagnostics:");
    for diagnostic in diagnostics {
        match diagnostic {
            CompileDiagnostic::OpenPrecondition { link } => {
                println!("   open precondition {}", pop.describe_link(link));
            }
            CompileDiagnostic::UnresolvedThreat { link, action } => {
                println!(
                    "   {} threatens {}",
                    pop.action(action).operator,
                    pop.describe_link(link)
                );
            }
        }
    }
}

pub fn compile(path: &Path, json: bool) -> Result<()> {
    let plan = load_plan(path)?;
    if json {
        println!("{}", ScenarioOutput::new(&plan, None).to_json_pretty()?);
        return Ok(());
    }
    print!("{}", plan);
    println!();
    print!("{}", plan.partial_order_plan);
    print_diagnostics(&plan);
    Ok(())
}

fn print_report(plan: &TotalOrderPlan, report: &DispatchReport, json: bool) -> Result<()> {
    if json {
        println!("{}", ScenarioOutput::new(plan, Some(report)).to_json_pretty()?);
        return Ok(());
    }
    let pop = &plan.partial_order_plan;
    println!("Dispatch of {}: {}", plan.name, report.status);
    println!("   Completed: {}", report.completed_operators(pop).join(", "));
    println!("   Final state: {}", report.final_state);
    for conflict in &report.conflicts {
        println!("   Conflict: {} on {}", conflict, pop.describe_link(conflict.link));
    }
    Ok(())
}

pub fn dispatch(
    config: &TetherConfig,
    plan_path: &Path,
    scenario_path: Option<&Path>,
    actor: Option<&str>,
    json: bool,
) -> Result<()> {
    let plan = load_plan(plan_path)?;
    let kind = match actor {
        Some(name) => ActorKind::parse(name).ok_or_else(|| anyhow!("unknown actor: {}", name))?,
        None if scenario_path.is_some() => ActorKind::Scripted,
        None => config.dispatch.actor,
    };

    let report = match kind {
        ActorKind::Scripted => {
            let path = scenario_path.ok_or_else(|| anyhow!("the scripted actor needs --scenario"))?;
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading scenario {}", path.display()))?;
            let scenario = library::parse_scenario(&content)?;
            if scenario.is_interactive() {
                info!("Scenario {} has no stages; switching to interactive", scenario.name);
                run(&plan, interactive_actor(config))?
            } else {
                library::dispatch_scenario(&plan, &scenario)?
            }
        }
        ActorKind::Simulated => run(
            &plan,
            Box::new(SimulatedActor::new("simulated", config.dispatch.policy)),
        )?,
        ActorKind::Interactive => run(&plan, interactive_actor(config))?,
    };

    print_report(&plan, &report, json)?;
    if !report.success() {
        bail!("dispatch of {} ended: {}", plan.name, report.status);
    }
    Ok(())
}

fn interactive_actor(config: &TetherConfig) -> Box<dyn Actor> {
    Box::new(InteractiveActor::new(
        "operator",
        std::io::stdin().lock(),
        std::io::stdout(),
        config.dispatch.ask_completion,
    ))
}

fn run(plan: &TotalOrderPlan, actor: Box<dyn Actor>) -> Result<DispatchReport> {
    let name = format!("{}/{}", plan.name, actor.name());
    Ok(Dispatcher::new(name, &plan.partial_order_plan, actor).dispatch()?)
}

pub fn replay(config: &TetherConfig) -> Result<()> {
    let mut library = PlanLibrary::new();
    let plans = library
        .load_plan_dir(&config.library.plan_dir)
        .with_context(|| format!("loading plans from {}", config.library.plan_dir))?;
    let scenarios = library
        .load_scenario_dir(&config.library.scenario_dir)
        .with_context(|| format!("loading scenarios from {}", config.library.scenario_dir))?;
    info!("Loaded {} plans and {} scenarios", plans, scenarios);

    let names: Vec<String> = library.scenario_names().into_iter().map(String::from).collect();
    let mut failures = 0;
    for name in &names {
        if library.scenario(name)?.is_interactive() {
            println!("{}: skipped (interactive)", name);
            continue;
        }
        match library.dispatch_scenario(name) {
            Ok(report) => {
                println!("{}: {}", name, report.status);
                if !report.success() {
                    failures += 1;
                }
            }
            Err(e) => {
                println!("{}: error: {}", name, e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} scenarios did not succeed", failures, names.len());
    }
    Ok(())
}

pub fn init_config(path: &Path) -> Result<()> {
    TetherConfig::save_default(path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
