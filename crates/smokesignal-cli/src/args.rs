//! Command-line parsing.

use anyhow::{anyhow, bail, Result};
use smokesignal_core::models::AdminResource;

pub const USAGE: &str = "\
Usage: smokesignal <command> [args]

Commands:
  login [--email EMAIL]               Sign in (password is prompted)
  logout                              Sign out and forget the stored session
  whoami                              Show the signed-in user
  health                              Check that the API server is up
  get <resource>... [--limit N]       Fetch one or more collections as JSON
  set-status <resource> <id> <status> Update a contact, franchise or event status
  delete <resource> <id>              Delete an item
  help                                Show this message

Resources: products, combos, orders, customers, contacts, franchise, events,
           discounts, reviews, newsletter, analytics, blog

Environment: SMOKESIGNAL_API_URL, SMOKESIGNAL_STORAGE (file|keyring|memory),
             SMOKESIGNAL_PASSWORD, RUST_LOG";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Login { email: Option<String> },
    Logout,
    Whoami,
    Health,
    Get { resources: Vec<AdminResource>, limit: Option<usize> },
    SetStatus { resource: AdminResource, id: String, status: String },
    Delete { resource: AdminResource, id: String },
    Help,
}

impl Command {
    /// Commands that need a signed-in session before any request is made
    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            Command::Get { .. } | Command::SetStatus { .. } | Command::Delete { .. }
        )
    }
}

fn resource(arg: &str) -> Result<AdminResource> {
    arg.parse().map_err(|e: String| anyhow!(e))
}

pub fn parse(args: &[String]) -> Result<Command> {
    let Some((name, rest)) = args.split_first() else {
        return Ok(Command::Help);
    };

    match name.as_str() {
        "help" | "--help" | "-h" => Ok(Command::Help),
        "logout" => Ok(Command::Logout),
        "whoami" => Ok(Command::Whoami),
        "health" => Ok(Command::Health),
        "login" => {
            let email = match rest {
                [] => None,
                [flag, email] if flag == "--email" || flag == "-e" => Some(email.clone()),
                _ => bail!("login takes only --email EMAIL"),
            };
            Ok(Command::Login { email })
        }
        "get" => {
            let mut resources = Vec::new();
            let mut limit = None;
            let mut iter = rest.iter();
            while let Some(arg) = iter.next() {
                if arg == "--limit" || arg == "-n" {
                    let value = iter.next().ok_or_else(|| anyhow!("--limit needs a number"))?;
                    limit = Some(value.parse().map_err(|_| anyhow!("Invalid limit: {}", value))?);
                } else {
                    resources.push(resource(arg)?);
                }
            }
            if resources.is_empty() {
                bail!("get needs at least one resource");
            }
            if limit.is_some() && resources != [AdminResource::Orders] {
                bail!("--limit only applies to orders");
            }
            Ok(Command::Get { resources, limit })
        }
        "set-status" => match rest {
            [res, id, status] => Ok(Command::SetStatus {
                resource: resource(res)?,
                id: id.clone(),
                status: status.clone(),
            }),
            _ => bail!("set-status needs <resource> <id> <status>"),
        },
        "delete" => match rest {
            [res, id] => Ok(Command::Delete {
                resource: resource(res)?,
                id: id.clone(),
            }),
            _ => bail!("delete needs <resource> <id>"),
        },
        other => bail!("Unknown command: {}", other),
    }
}
