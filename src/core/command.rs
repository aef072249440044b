//! Command vocabulary and classification
//!
//! An input line is a command only when it matches one of the fixed shapes
//! exactly; everything else is literal document text.

use std::sync::LazyLock;

use regex_lite::Regex;

/// A recognized editor command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `L` - list the entire document
    List,
    /// `L n` - list line n
    ListLine(usize),
    /// `L n m` - list lines n through m
    ListRange(usize, usize),
    /// `D` - delete the last line
    Delete,
    /// `D n` - delete line n
    DeleteLine(usize),
    /// `D n m` - delete lines n through m
    DeleteRange(usize, usize),
    /// `I` - toggle insert mode at the current tail
    Insert,
    /// `I n` - enter insert mode pinned at line n
    InsertAt(usize),
    /// `E` - save and exit
    Exit,
}

/// Shape shared by the argument-taking commands: one capital letter, then
/// up to two numbers, each separated by exactly one whitespace character.
static COMMAND_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([LDI])(?:\s([0-9]+)(?:\s([0-9]+))?)?$").expect("Invalid command shape regex")
});

/// Classify an input line as a command, or `None` for literal text.
///
/// The match is exact: lowercase letters, extra arguments, and numbers too
/// large to represent all fall through to literal text.
pub fn classify(input: &str) -> Option<Command> {
    // E takes no arguments, so match it outright.
    if input == "E" {
        return Some(Command::Exit);
    }

    let caps = COMMAND_SHAPE.captures(input)?;
    let first = match caps.get(2) {
        Some(num) => Some(num.as_str().parse::<usize>().ok()?),
        None => None,
    };
    let second = match caps.get(3) {
        Some(num) => Some(num.as_str().parse::<usize>().ok()?),
        None => None,
    };

    match (&caps[1], first, second) {
        ("L", None, None) => Some(Command::List),
        ("L", Some(n), None) => Some(Command::ListLine(n)),
        ("L", Some(n), Some(m)) => Some(Command::ListRange(n, m)),
        ("D", None, None) => Some(Command::Delete),
        ("D", Some(n), None) => Some(Command::DeleteLine(n)),
        ("D", Some(n), Some(m)) => Some(Command::DeleteRange(n, m)),
        ("I", None, None) => Some(Command::Insert),
        ("I", Some(n), None) => Some(Command::InsertAt(n)),
        // I with two numbers is not in the vocabulary
        _ => None,
    }
}
