use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

use crate::client::InventoryClient;
use crate::controller::{Action, Controller, Outcome, Ticket};
use crate::form::{Field, FormState};
use crate::output;

pub const HELP: &str = "\
commands:
  set <field> <value>   fill a form field
  unset <field>         reset a form field
  create | update | restock | retrieve | delete | search | clear
  show                  print the form and last results
  help                  this text
  quit | exit           leave the shell
fields: id, name, quantity, restock_level, restock_count, condition,
        first_entry_date, last_restock_date";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellCommand {
    Set(Field, String),
    Unset(Field),
    Run(Action),
    Show,
    Help,
    Quit,
    Empty,
}

pub fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(ShellCommand::Empty);
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    let parse_field = |raw: &str| {
        Field::parse(raw).ok_or_else(|| format!("unknown field '{raw}'"))
    };
    match head.to_ascii_lowercase().as_str() {
        "set" => {
            let (field, value) = match rest.split_once(char::is_whitespace) {
                Some((field, value)) => (field, value.trim()),
                None if !rest.is_empty() => (rest, ""),
                None => return Err("usage: set <field> <value>".to_string()),
            };
            Ok(ShellCommand::Set(parse_field(field)?, value.to_string()))
        }
        "unset" if !rest.is_empty() => Ok(ShellCommand::Unset(parse_field(rest)?)),
        "unset" => Err("usage: unset <field>".to_string()),
        "show" => Ok(ShellCommand::Show),
        "help" | "?" => Ok(ShellCommand::Help),
        "quit" | "exit" => Ok(ShellCommand::Quit),
        other => Action::parse(other)
            .map(ShellCommand::Run)
            .ok_or_else(|| format!("unknown command '{other}', try 'help'")),
    }
}

fn prompt(interactive: bool) {
    if interactive {
        print!("invctl> ");
        let _ = std::io::stdout().flush();
    }
}

/// Unwraps a finished request task. A task that panicked or was cancelled
/// yields nothing; its ticket is simply never completed.
fn settle(joined: Result<(Ticket, Outcome), JoinError>) -> Option<(Ticket, Outcome)> {
    match joined {
        Ok(done) => Some(done),
        Err(e) => {
            warn!(error = %e, "request task ended without a response");
            None
        }
    }
}

/// Runs the command loop until `quit` or end of input.
///
/// Input is read on the same task that applies completions, while every
/// request runs in its own spawned task, so a slow call never blocks typing.
/// At end of input the loop waits for outstanding requests before returning.
pub async fn run_session<R>(
    input: R,
    client: InventoryClient,
    mut controller: Controller,
    interactive: bool,
) -> Result<FormState, String>
where
    R: AsyncBufRead + Unpin,
{
    let mut tasks: JoinSet<(Ticket, Outcome)> = JoinSet::new();
    let mut lines = input.lines();
    let mut input_open = true;

    if interactive {
        println!("{HELP}");
    }
    prompt(interactive);

    loop {
        if !input_open && tasks.is_empty() {
            break;
        }
        tokio::select! {
            line = lines.next_line(), if input_open => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        input_open = false;
                        continue;
                    }
                    Err(e) => return Err(format!("failed to read input: {e}")),
                };
                match parse_command(&line) {
                    Ok(ShellCommand::Empty) => {}
                    Ok(ShellCommand::Quit) => break,
                    Ok(ShellCommand::Help) => println!("{HELP}"),
                    Ok(ShellCommand::Show) => output::print_state(controller.state(), true),
                    Ok(ShellCommand::Set(field, value)) => controller.set_field(field, value),
                    Ok(ShellCommand::Unset(field)) => controller.reset_field(field),
                    Ok(ShellCommand::Run(action)) => {
                        let ticket = controller.dispatch(action);
                        match ticket.request.clone() {
                            Some(request) => {
                                println!(
                                    ":: {} #{} {} {}",
                                    action,
                                    ticket.generation,
                                    request.method,
                                    request.target()
                                );
                                let client = client.clone();
                                tasks.spawn(async move {
                                    let outcome = client.execute(&request).await;
                                    (ticket, outcome)
                                });
                            }
                            None => output::print_state(controller.state(), false),
                        }
                    }
                    Err(e) => println!(":: {e}"),
                }
                prompt(interactive && input_open);
            }
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                let Some((ticket, outcome)) = settle(joined) else {
                    prompt(interactive && input_open);
                    continue;
                };
                let applied = controller.complete(&ticket, &outcome);
                if applied.is_stale() {
                    debug!(generation = ticket.generation, "superseded response ignored");
                    println!(":: {} #{} superseded", ticket.action, ticket.generation);
                } else {
                    println!();
                    output::print_state(controller.state(), applied.results);
                }
                prompt(interactive && input_open);
            }
        }
    }

    tasks.abort_all();
    Ok(controller.into_state())
}
