//! Interactive review commands
//!
//! One line of reviewer input becomes one [`Command`]. Commands that change
//! review state carry a [`ReviewEvent`] for the session.

use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use relann_core::{Category, Validity};
use relann_review::ReviewEvent;

pub const HELP: &str = "\
commands:
  t <cat> <i>             toggle candidate i of category (MODEL, DP, NER-OIE)
  v <cat> <i>             mark candidate valid
  x <cat> <i>             mark candidate invalid
  a <e1> | <rel> | <e2>   add a user instance
  r <i>                   remove user instance i
  l                       list candidates
  stats                   show review counts
  p <sentence>            review another sentence
  n                       fetch the next sentence from the queue
  c                       confirm and persist
  s                       skip this sentence
  h                       this help
  q                       quit";

/// One line of reviewer input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Event(ReviewEvent),
    List,
    Stats,
    Submit(String),
    Next,
    Confirm,
    Skip,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> anyhow::Result<Self> {
        let line = line.trim();
        let (head, rest) = line
            .split_once(char::is_whitespace)
            .map(|(head, rest)| (head, rest.trim()))
            .unwrap_or((line, ""));

        let command = match head.to_lowercase().as_str() {
            "t" | "toggle" => {
                let (category, index) = parse_address(rest)?;
                Command::Event(ReviewEvent::Toggle { category, index })
            }
            "v" | "valid" => set_validity(rest, Validity::Valid)?,
            "x" | "invalid" => set_validity(rest, Validity::Invalid)?,
            "a" | "add" => {
                let parts: Vec<&str> = rest.split('|').map(str::trim).collect();
                let [entity1, relation, entity2] = parts.as_slice() else {
                    bail!("expected: a <e1> | <rel> | <e2>");
                };
                Command::Event(ReviewEvent::AddUser {
                    entity1: entity1.to_string(),
                    relation: relation.to_string(),
                    entity2: entity2.to_string(),
                })
            }
            "r" | "remove" => {
                let index = rest
                    .parse()
                    .with_context(|| format!("invalid index: {rest:?}"))?;
                Command::Event(ReviewEvent::RemoveUser { index })
            }
            "l" | "list" => Command::List,
            "stats" => Command::Stats,
            "p" | "predict" if !rest.is_empty() => Command::Submit(rest.to_string()),
            "n" | "next" => Command::Next,
            "c" | "confirm" => Command::Confirm,
            "s" | "skip" => Command::Skip,
            "h" | "help" | "?" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            _ => bail!("unknown command: {line:?} (h for help)"),
        };
        Ok(command)
    }
}

fn parse_address(rest: &str) -> anyhow::Result<(Category, usize)> {
    let mut parts = rest.split_whitespace();
    let (Some(category), Some(index), None) = (parts.next(), parts.next(), parts.next()) else {
        bail!("expected: <cat> <i>");
    };
    let category: Category = category.parse()?;
    let index = index
        .parse()
        .map_err(|_| anyhow!("invalid index: {index:?}"))?;
    Ok((category, index))
}

fn set_validity(rest: &str, value: Validity) -> anyhow::Result<Command> {
    let (category, index) = parse_address(rest)?;
    Ok(Command::Event(ReviewEvent::SetValidity {
        category,
        index,
        value,
    }))
}
