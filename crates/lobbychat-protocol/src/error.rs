//! Error types for the protocol layer.

/// Errors that can occur while turning an inbound line into an intent.
///
/// The `Display` text is shown to the client as-is after the error
/// prefix, so it is written for the person at the keyboard.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// A command that needs an argument was sent without one,
    /// e.g. a bare `!create`.
    #[error("The {0} command needs an argument.")]
    MissingArgument(&'static str),
}
