//! Every fixed line the server sends to clients, and the chat-line format.
//!
//! Lines never carry a trailing delimiter; the transport adds one.

use std::fmt;

use chrono::{DateTime, TimeZone};

/// Prefix for informational notices.
pub const NOTE_PREFIX: &str = "Note: ";
/// Prefix for user-error replies.
pub const ERROR_PREFIX: &str = "Error: ";

/// Sent to every member when a room is reclaimed for inactivity.
pub const ROOM_DELETED: &str = "Note: Chat room is being deleted due to inactivity.";
/// Opens a history replay.
pub const LOG_BEGIN: &str = "================BEGIN LOG================";
/// Closes a history replay.
pub const LOG_END: &str = "================END LOG================";
/// First line of a room listing.
pub const ROOM_LIST_HEADER: &str = "Chat Rooms:";

/// Greeting sent once a client is admitted.
pub fn welcome(prefix: char) -> String {
    format!(
        "Welcome to the lobbychat server! To get started, type \"{prefix}help\" to retrieve a list of commands."
    )
}

/// The command reference, one line per command.
pub fn help(prefix: char) -> Vec<String> {
    vec![
        "Commands and Usage:".to_owned(),
        format!("{prefix}help - lists all commands."),
        format!("{prefix}list - lists all chat rooms that are active."),
        format!("{prefix}name param - changes your name to param."),
        format!("{prefix}create chan - creates a channel called chan."),
        format!("{prefix}enter chan - enters a chat named chan."),
        format!("{prefix}leave - leaves the current channel."),
        format!("{prefix}quit - quits the chat client."),
    ]
}

/// Confirmation to the creator of a room.
pub fn room_created(room: &str) -> String {
    format!("{NOTE_PREFIX}Created the room {{{room}}}.")
}

/// Broadcast when someone joins.
pub fn joined(name: &str) -> String {
    format!("{NOTE_PREFIX}[{name}] has joined the room.")
}

/// Broadcast when someone leaves.
pub fn left(name: &str) -> String {
    format!("{NOTE_PREFIX}[{name}] has left the room.")
}

/// Broadcast to a room when a member renames.
pub fn renamed_public(old: &str, new: &str) -> String {
    format!("{NOTE_PREFIX}[{old}] changed their name to [{new}].")
}

/// Sent only to the renamer when they rename in the lobby.
pub fn renamed_private(new: &str) -> String {
    format!("{NOTE_PREFIX}Changed their name to [{new}].")
}

/// A user-error reply.
pub fn error(err: &impl fmt::Display) -> String {
    format!("{ERROR_PREFIX}{err}")
}

/// A chat message as broadcast to a room: `<time> [<name>] <text>`,
/// with the time in 12-hour form (`3:04PM`).
pub fn chat_line<Tz>(at: &DateTime<Tz>, name: &str, text: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    format!("{} [{name}] {text}", at.format("%-I:%M%p"))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_chat_line_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 15, 4, 0).unwrap();
        assert_eq!(chat_line(&at, "alice", "hi"), "3:04PM [alice] hi");

        let morning = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        assert_eq!(chat_line(&morning, "bob", "gm"), "9:30AM [bob] gm");
    }

    #[test]
    fn test_notices() {
        assert_eq!(room_created("general"), "Note: Created the room {general}.");
        assert_eq!(joined("Anon"), "Note: [Anon] has joined the room.");
        assert_eq!(left("Anon"), "Note: [Anon] has left the room.");
        assert_eq!(
            renamed_public("Anon", "alice"),
            "Note: [Anon] changed their name to [alice]."
        );
        assert_eq!(
            renamed_private("alice"),
            "Note: Changed their name to [alice]."
        );
    }

    #[test]
    fn test_help_uses_prefix() {
        let lines = help('/');
        assert_eq!(lines[0], "Commands and Usage:");
        assert!(lines[1..].iter().all(|l| l.starts_with('/')));
        assert!(welcome('/').contains("\"/help\""));
    }

    #[test]
    fn test_error_line() {
        assert_eq!(error(&"nope"), "Error: nope");
    }
}
