//! Terminal-driven actor: a person chooses actions and reports changes.

use std::io::{BufRead, Write};

use super::Actor;
use crate::error::{Result, TetherError};
use crate::model::{Action, ActionId, State, StateDelta};

pub struct InteractiveActor<R, W> {
    name: String,
    input: R,
    output: W,
    ask_completion: bool,
}

impl<R: BufRead, W: Write> InteractiveActor<R, W> {
    /// With `ask_completion`, execution waits for the user to confirm each
    /// action is done.
    pub fn new(name: impl Into<String>, input: R, output: W, ask_completion: bool) -> Self {
        Self {
            name: name.into(),
            input,
            output,
            ask_completion,
        }
    }

    fn prompt(&mut self, text: &str) -> Result<String> {
        write!(self.output, "{}", text)?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(TetherError::Actor(format!("{}: input closed", self.name)));
        }
        Ok(line.trim().to_string())
    }
}

impl<R: BufRead, W: Write> Actor for InteractiveActor<R, W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn select_enabled_action(&mut self, candidates: &[&Action]) -> Result<Option<ActionId>> {
        if candidates.is_empty() {
            writeln!(self.output, "No enabled actions.")?;
            return Ok(None);
        }
        let max = candidates.len() - 1;
        loop {
            writeln!(self.output, "Choose action")?;
            for (index, action) in candidates.iter().enumerate() {
                writeln!(self.output, "   {}: {}", index, action)?;
            }
            let answer = self.prompt(&format!("Integer from 0 to {}: ", max))?;
            match answer.parse::<usize>() {
                Ok(index) if index <= max => return Ok(Some(candidates[index].id())),
                _ => writeln!(self.output, "{} not an index in [0, {}].", answer, max)?,
            }
        }
    }

    fn execute_action(&mut self, action: &Action) -> Result<()> {
        if self.ask_completion {
            let text = format!("{}: Perform {} and hit return. ", self.name, action.operator);
            self.prompt(&text)?;
        } else {
            writeln!(self.output, "Dispatches {}.", action.operator)?;
        }
        Ok(())
    }

    fn observe_state_change(&mut self, current_state: &State) -> Result<StateDelta> {
        writeln!(self.output, "Current state: {}", current_state)?;
        writeln!(self.output, "   What changed?")?;
        let mut changes = StateDelta::new();
        loop {
            let variable = self.prompt("      Variable name or return for none: ")?;
            if variable.is_empty() {
                break;
            }
            let value = self.prompt(&format!("      Value of {}: ", variable))?;
            changes.insert(variable, value);
        }
        Ok(changes)
    }
}
