use std::str::FromStr;

use gpu::Layer;
use runtime::Session;
use scene::Address;

pub const HELP: &str = "\
commands:
  toggle <path>     flip a node and everything below it
  select <path>     select a node and everything below it
  deselect <path>   deselect a node and everything below it
  expand <path>     show a node's children in the tree
  collapse <path>   hide a node's children
  show <layer> [on|off]
                    switch earth, lines, points, orbits or blending
  reload            re-read the document and clear the selection
  tree              print the selection tree
  quit              stop the viewer
paths are '/'-separated names as printed by `tree`; a repeated name
among siblings is written name#2, name#3, ... e.g. Orbits/SAT-1#2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Toggle(String),
    Select(String),
    Deselect(String),
    Expand(String),
    Collapse(String),
    /// `None` flips the layer.
    Show(Layer, Option<bool>),
    Reload,
    Tree,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line
            .split_once(char::is_whitespace)
            .map(|(w, r)| (w, r.trim()))
            .unwrap_or((line, ""));
        let path = || rest.to_string();
        match word {
            "toggle" => Ok(Command::Toggle(path())),
            "select" => Ok(Command::Select(path())),
            "deselect" => Ok(Command::Deselect(path())),
            "expand" => Ok(Command::Expand(path())),
            "collapse" => Ok(Command::Collapse(path())),
            "show" => parse_show(rest),
            "reload" => Ok(Command::Reload),
            "tree" => Ok(Command::Tree),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("unknown command {other:?} (try `help`)")),
        }
    }
}

/// Applies one command to the session and returns the text to print.
pub fn execute(session: &mut Session, command: &Command) -> Result<String, String> {
    match command {
        Command::Toggle(path) => {
            let address = find(session, path)?;
            match session.toggle(&address) {
                Some(true) => Ok(format!("selected {path}")),
                Some(false) => Ok(format!("deselected {path}")),
                None => Err(format!("no node at {path:?}")),
            }
        }
        Command::Select(path) | Command::Deselect(path) => {
            let selected = matches!(command, Command::Select(_));
            let address = find(session, path)?;
            session.set_selected(&address, selected);
            Ok(format!(
                "{} {path}",
                if selected { "selected" } else { "deselected" }
            ))
        }
        Command::Expand(path) => {
            let address = find(session, path)?;
            session.expand(&address);
            Ok(session.outline())
        }
        Command::Collapse(path) => {
            let address = find(session, path)?;
            session.collapse(&address);
            Ok(session.outline())
        }
        Command::Show(layer, on) => {
            let on = on.unwrap_or(!session.layers().get(*layer));
            Ok(session.set_layer(*layer, on).to_string())
        }
        Command::Reload => {
            session.reload();
            Ok(session.outline())
        }
        Command::Tree => Ok(session.outline()),
        Command::Help => Ok(HELP.to_string()),
        Command::Quit => Ok(String::new()),
    }
}

fn parse_show(args: &str) -> Result<Command, String> {
    let mut words = args.split_whitespace();
    let layer: Layer = words
        .next()
        .ok_or("usage: show <layer> [on|off]")?
        .parse()?;
    let on = match words.next() {
        None => None,
        Some("on") => Some(true),
        Some("off") => Some(false),
        Some(other) => return Err(format!("expected on or off, got {other:?}")),
    };
    Ok(Command::Show(layer, on))
}

fn find(session: &Session, path: &str) -> Result<Address, String> {
    session
        .find(path)
        .ok_or_else(|| format!("no node at {path:?}"))
}
