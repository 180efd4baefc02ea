//! Protocol layer for lobbychat.
//!
//! This crate defines what the chat core and its connections say to each
//! other:
//!
//! - **Types** ([`ClientId`], [`Intent`], [`IntentKind`]): who is asking
//!   and what they want.
//! - **Grammar** ([`CommandGrammar`] trait, [`PrefixGrammar`]): how one
//!   inbound text line becomes an [`IntentKind`].
//! - **Text** ([`text`]): every fixed line the server sends back, plus
//!   the chat-line formatter.
//! - **Errors** ([`ProtocolError`]): what can go wrong while parsing.
//!
//! ```text
//! Transport (lines) → Protocol (Intent) → Lobby (rooms, clients)
//! ```

mod error;
mod grammar;
pub mod text;
mod types;

pub use error::ProtocolError;
pub use grammar::{CommandGrammar, PrefixGrammar, DEFAULT_PREFIX};
pub use types::{ClientId, Intent, IntentKind};
