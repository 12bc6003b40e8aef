//! Interactive review loop
//!
//! Reads commands from stdin, forwards them to the workflow, and prints the
//! resulting state. Failed commands are reported and the loop continues.

use std::fmt;

use tokio::io::{AsyncBufReadExt, BufReader};

use relann_client::ReviewWorkflow;
use relann_core::{Category, Validity};
use relann_review::{IngestOutcome, ReviewUpdate, SessionSnapshot};

use crate::command::{Command, HELP};

/// Terminal rendering of a session snapshot
pub struct SessionView<'a>(pub &'a SessionSnapshot);

impl fmt::Display for SessionView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.0;
        let Some(sentence) = &snapshot.sentence else {
            return writeln!(f, "no sentence under review");
        };
        writeln!(f, "sentence: {sentence}")?;

        let candidates = snapshot.candidates();
        for category in Category::PREDICTED {
            writeln!(f, "{category}:")?;
            for view in candidates.iter().filter(|v| v.location.category == category) {
                let mark = match view.validity {
                    Validity::Valid => "[x]",
                    Validity::Invalid => "[ ]",
                };
                write!(f, "  {mark} {:>2} {}", view.location.index, view.triple)?;
                if view.duplicates > 0 {
                    write!(f, "  (+{} linked)", view.duplicates)?;
                }
                writeln!(f)?;
            }
        }

        writeln!(f, "{}:", Category::User)?;
        for (index, triple) in snapshot.user.iter().enumerate() {
            writeln!(f, "  [+] {index:>2} {triple}")?;
        }
        Ok(())
    }
}

fn show(workflow: &ReviewWorkflow) {
    print!("{}", SessionView(&workflow.session().snapshot()));
}

fn report_ingest(outcome: IngestOutcome) {
    match outcome {
        IngestOutcome::Applied => {}
        IngestOutcome::Cleared => println!("no candidates extracted"),
        IngestOutcome::Stale => println!("extraction answered an earlier sentence; ignored"),
    }
}

/// Run one command; returns `false` when the reviewer quits
async fn execute(workflow: &mut ReviewWorkflow, command: Command) -> anyhow::Result<bool> {
    match command {
        Command::Event(event) => match workflow.apply(event)? {
            ReviewUpdate::Validity(_) | ReviewUpdate::UserInstances(_) => {
                show(workflow);
            }
            ReviewUpdate::Confirmed(confirmation) => {
                println!(
                    "{} accepted, {} rejected",
                    confirmation.accepted.len(),
                    confirmation.rejected.len()
                );
            }
        },
        Command::List => show(workflow),
        Command::Stats => {
            let stats = workflow.session().stats();
            println!(
                "{} candidates ({} valid, {} invalid), {} user instances, {} linked groups, {:.0}% accepted",
                stats.candidates,
                stats.valid,
                stats.invalid,
                stats.user_instances,
                stats.duplicate_groups,
                stats.acceptance_rate() * 100.0
            );
        }
        Command::Submit(sentence) => {
            report_ingest(workflow.submit(sentence).await?);
            show(workflow);
        }
        Command::Next => {
            let (_, outcome) = workflow.next_sentence().await?;
            report_ingest(outcome);
            show(workflow);
        }
        Command::Confirm => {
            let outcome = workflow.confirm().await?;
            if let Some(warning) = outcome.confirmation.warning {
                println!("warning: {warning}");
            }
            println!(
                "stored {} accepted and {} rejected instances",
                outcome.confirmation.accepted.len(),
                outcome.confirmation.rejected.len()
            );
        }
        Command::Skip => {
            workflow.skip().await?;
            println!("skipped");
        }
        Command::Help => println!("{HELP}"),
        Command::Quit => return Ok(false),
    }
    Ok(true)
}

/// Read commands from stdin until `q` or end of input
pub async fn run(workflow: &mut ReviewWorkflow) -> anyhow::Result<()> {
    show(workflow);
    println!("h for help");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("error: {e:#}");
                continue;
            }
        };
        match execute(workflow, command).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                tracing::debug!(error = %e, "command failed");
                println!("error: {e:#}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relann_core::{ExtractionResponse, Triple};
    use relann_review::ReviewSession;

    #[test]
    fn test_render_empty() {
        let rendered = SessionView(&ReviewSession::new().snapshot()).to_string();
        assert_eq!(rendered, "no sentence under review\n");
    }

    #[test]
    fn test_render_marks_and_links() {
        let mut session = ReviewSession::new();
        let ticket = session.begin("Mary is Harry.");
        session.ingest(
            &ticket,
            ExtractionResponse {
                model_prediction: vec![Triple::new("Mary", "is", "Harry")],
                dp_prediction: vec![Triple::new("Mary", "is", "Harry")],
                ner_oie_prediction: vec![],
            },
        );
        session.toggle(Category::Model, 0).unwrap();
        session.add_user("Harry", "is", "Mary").unwrap();

        let rendered = SessionView(&session.snapshot()).to_string();
        assert!(rendered.contains("[x]  0 (Mary, is, Harry)  (+1 linked)"));
        assert!(rendered.contains("[+]  0 (Harry, is, Mary)"));
        assert!(rendered.contains("NER-OIE:\nUSER:"));
    }
}
