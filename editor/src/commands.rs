//! Line-oriented commands driving the editor.
//!
//! Each line is one command; words are separated by whitespace and names
//! containing spaces can be quoted with `"`.

use std::str::FromStr;

use vellum_core::scene::actions::MoveDirection;

/// A parsed command line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `add <name>`
    AddLayer(String),
    /// `remove`, deletes the active layer
    RemoveLayer,
    /// `rename <layer> <name>`
    RenameLayer { layer: String, to: String },
    /// `up` / `down`, moves the active layer
    MoveLayer(MoveDirection),
    /// `select <layer>`
    SelectLayer(String),
    /// `hide <layer>` / `show <layer>`
    SetVisibility { layer: String, visible: bool },
    /// `lock <layer>` / `unlock <layer>`
    SetLocked { layer: String, locked: bool },
    /// `pick <entity>`
    PickEntity(String),
    /// `move <x> <y>`, moves the picked entity
    MoveEntity { x: f32, y: f32 },
    Undo,
    Redo,
    /// `save`, marks the current state as saved
    Save,
    Layers,
    Entities,
    History,
    Help,
    Quit,
}

/// Why a command line could not be parsed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command \"{0}\", try \"help\"")]
    Unknown(String),
    #[error("\"{command}\" expects {expected}")]
    Usage {
        command: &'static str,
        expected: &'static str,
    },
    #[error("\"{0}\" is not a number")]
    InvalidNumber(String),
    #[error("unterminated quote")]
    UnterminatedQuote,
}

pub const HELP: &str = "\
commands:
  add <name>            add a layer and make it active
  remove                delete the active layer and its entities
  rename <layer> <name> rename a layer
  up | down             move the active layer
  select <layer>        make a layer active
  hide | show <layer>   hide or show a layer
  lock | unlock <layer> lock or unlock a layer
  pick <entity>         select an entity
  move <x> <y>          move the selected entity
  undo | redo
  save                  mark the current state as saved
  layers | entities | history
  help | quit";

fn split_words(line: &str) -> Result<Vec<String>, CommandError> {
    let mut words = Vec::new();
    let mut chars = line.trim().chars().peekable();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        let mut word = String::new();
        if c == '"' {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') => break,
                    Some(c) => word.push(c),
                    None => return Err(CommandError::UnterminatedQuote),
                }
            }
        } else {
            while let Some(&c) = chars.peek()
                && !c.is_whitespace()
            {
                word.push(c);
                chars.next();
            }
        }
        words.push(word);
    }
    Ok(words)
}

fn number(word: &str) -> Result<f32, CommandError> {
    word.parse()
        .map_err(|_| CommandError::InvalidNumber(word.to_string()))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words = split_words(line)?;
        let Some((head, args)) = words.split_first() else {
            return Err(CommandError::Empty);
        };

        let one = |command: &'static str| match args {
            [name] => Ok(name.clone()),
            _ => Err(CommandError::Usage {
                command,
                expected: "one name",
            }),
        };
        let none = |command: &'static str, result: Command| {
            if args.is_empty() {
                Ok(result)
            } else {
                Err(CommandError::Usage {
                    command,
                    expected: "no arguments",
                })
            }
        };

        match head.to_ascii_lowercase().as_str() {
            "add" => one("add").map(Command::AddLayer),
            "remove" => none("remove", Command::RemoveLayer),
            "rename" => match args {
                [layer, to] => Ok(Command::RenameLayer {
                    layer: layer.clone(),
                    to: to.clone(),
                }),
                _ => Err(CommandError::Usage {
                    command: "rename",
                    expected: "a layer and a new name",
                }),
            },
            "up" => none("up", Command::MoveLayer(MoveDirection::Up)),
            "down" => none("down", Command::MoveLayer(MoveDirection::Down)),
            "select" => one("select").map(Command::SelectLayer),
            "hide" => one("hide").map(|layer| Command::SetVisibility {
                layer,
                visible: false,
            }),
            "show" => one("show").map(|layer| Command::SetVisibility {
                layer,
                visible: true,
            }),
            "lock" => one("lock").map(|layer| Command::SetLocked {
                layer,
                locked: true,
            }),
            "unlock" => one("unlock").map(|layer| Command::SetLocked {
                layer,
                locked: false,
            }),
            "pick" => one("pick").map(Command::PickEntity),
            "move" => match args {
                [x, y] => Ok(Command::MoveEntity {
                    x: number(x)?,
                    y: number(y)?,
                }),
                _ => Err(CommandError::Usage {
                    command: "move",
                    expected: "two coordinates",
                }),
            },
            "undo" => none("undo", Command::Undo),
            "redo" => none("redo", Command::Redo),
            "save" => none("save", Command::Save),
            "layers" => none("layers", Command::Layers),
            "entities" => none("entities", Command::Entities),
            "history" => none("history", Command::History),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            _ => Err(CommandError::Unknown(head.clone())),
        }
    }
}
