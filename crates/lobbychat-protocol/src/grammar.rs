//! Command grammar: turning one inbound line into an [`IntentKind`].
//!
//! The grammar is a trait so the connection layer doesn't care how
//! commands are spelled. [`PrefixGrammar`] is the one the server ships
//! with: a prefix character followed by a keyword, e.g. `!create general`.

use crate::{IntentKind, ProtocolError};

/// The default command prefix.
pub const DEFAULT_PREFIX: char = '!';

/// Parses inbound lines into intents.
///
/// Implementations must be total over "plain" text: a line that is not a
/// command is a [`IntentKind::Message`], never an error. Errors are only
/// for recognised commands that are malformed.
pub trait CommandGrammar: Send + Sync + 'static {
    /// Parses a single line (delimiter already stripped).
    fn parse(&self, line: &str) -> Result<IntentKind, ProtocolError>;

    /// The character that introduces a command, shown in help texts.
    fn prefix(&self) -> char;
}

/// `<prefix><keyword> [argument]` grammar.
///
/// | line | intent |
/// |---|---|
/// | `!create <name>` | [`IntentKind::CreateRoom`] |
/// | `!enter <name>` / `!join <name>` | [`IntentKind::JoinRoom`] |
/// | `!leave` | [`IntentKind::LeaveRoom`] |
/// | `!list` | [`IntentKind::ListRooms`] |
/// | `!name <new>` | [`IntentKind::Rename`] |
/// | `!help` | [`IntentKind::Help`] |
/// | `!quit` | [`IntentKind::Quit`] |
/// | anything else | [`IntentKind::Message`] with the raw line |
///
/// The keyword must be followed by whitespace or the end of the line, so
/// `!listen up` is an ordinary message.
#[derive(Debug, Clone, Copy)]
pub struct PrefixGrammar {
    prefix: char,
}

impl PrefixGrammar {
    /// Creates a grammar using `prefix` as the command marker.
    pub fn new(prefix: char) -> Self {
        Self { prefix }
    }
}

impl Default for PrefixGrammar {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl CommandGrammar for PrefixGrammar {
    fn parse(&self, line: &str) -> Result<IntentKind, ProtocolError> {
        let Some(rest) = line.strip_prefix(self.prefix) else {
            return Ok(IntentKind::Message(line.to_owned()));
        };

        let (keyword, arg) = match rest.split_once(char::is_whitespace) {
            Some((keyword, arg)) => (keyword, arg.trim()),
            None => (rest, ""),
        };

        let kind = match keyword {
            "create" => IntentKind::CreateRoom(required(arg, "create")?),
            "enter" | "join" => IntentKind::JoinRoom(required(arg, "enter")?),
            "leave" => IntentKind::LeaveRoom,
            "list" => IntentKind::ListRooms,
            "name" => IntentKind::Rename(required(arg, "name")?),
            "help" => IntentKind::Help,
            "quit" => IntentKind::Quit,
            _ => IntentKind::Message(line.to_owned()),
        };
        Ok(kind)
    }

    fn prefix(&self) -> char {
        self.prefix
    }
}

fn required(arg: &str, command: &'static str) -> Result<String, ProtocolError> {
    if arg.is_empty() {
        Err(ProtocolError::MissingArgument(command))
    } else {
        Ok(arg.to_owned())
    }
}
