//! Lobby configuration.

use std::time::Duration;

use lobbychat_protocol::DEFAULT_PREFIX;
use serde::{Deserialize, Serialize};

/// Longest room lifetime the lobby will schedule: 100 years. Larger values
/// would overflow the deadline arithmetic.
pub const MAX_ROOM_TTL_SECS: u64 = 100 * 365 * 24 * 60 * 60;

/// Configuration for the lobby actor.
///
/// Every field has a default, so a config file only needs to mention
/// what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbyConfig {
    /// Maximum number of connected clients. Connections beyond this are
    /// accepted and immediately closed.
    pub max_clients: usize,

    /// How long (in seconds) a room may go without a broadcast before it
    /// is reclaimed. Default: 7 days. Capped at [`MAX_ROOM_TTL_SECS`].
    pub room_ttl_secs: u64,

    /// Capacity of the lobby's inbound command channel. Producers wait
    /// when it is full.
    pub channel_size: usize,

    /// Display name given to every newly connected client.
    pub default_name: String,

    /// Character that introduces a command. Used by the connection layer
    /// to parse lines and by the lobby to render help texts.
    pub command_prefix: char,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            max_clients: 12,
            room_ttl_secs: 7 * 24 * 60 * 60,
            channel_size: 64,
            default_name: "Anon".to_owned(),
            command_prefix: DEFAULT_PREFIX,
        }
    }
}

impl LobbyConfig {
    /// Room inactivity window as a [`Duration`], capped at
    /// [`MAX_ROOM_TTL_SECS`].
    pub fn room_ttl(&self) -> Duration {
        Duration::from_secs(self.room_ttl_secs.min(MAX_ROOM_TTL_SECS))
    }

    /// Fixes values the runtime cannot work with.
    ///
    /// - `channel_size` is raised to at least 1 (tokio rejects 0).
    /// - an empty `default_name` falls back to `"Anon"`.
    /// - `room_ttl_secs` is lowered to [`MAX_ROOM_TTL_SECS`].
    pub fn validated(mut self) -> Self {
        if self.channel_size == 0 {
            tracing::warn!("channel_size of 0 is not usable, using 1");
            self.channel_size = 1;
        }
        if self.default_name.trim().is_empty() {
            tracing::warn!("empty default_name, using \"Anon\"");
            self.default_name = "Anon".to_owned();
        }
        if self.room_ttl_secs > MAX_ROOM_TTL_SECS {
            tracing::warn!(
                room_ttl_secs = self.room_ttl_secs,
                "room_ttl_secs too large, using {MAX_ROOM_TTL_SECS}"
            );
            self.room_ttl_secs = MAX_ROOM_TTL_SECS;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lobby_config_default() {
        let config = LobbyConfig::default();
        assert_eq!(config.max_clients, 12);
        assert_eq!(config.room_ttl(), Duration::from_secs(604_800));
        assert_eq!(config.channel_size, 64);
        assert_eq!(config.default_name, "Anon");
        assert_eq!(config.command_prefix, '!');
    }

    #[test]
    fn test_lobby_config_partial_json_uses_defaults() {
        let config: LobbyConfig =
            serde_json::from_str(r#"{ "max_clients": 3, "room_ttl_secs": 60 }"#)
                .unwrap();
        assert_eq!(config.max_clients, 3);
        assert_eq!(config.room_ttl(), Duration::from_secs(60));
        assert_eq!(config.default_name, "Anon");
    }

    #[test]
    fn test_validated_fixes_unusable_values() {
        let config = LobbyConfig {
            channel_size: 0,
            default_name: "  ".into(),
            ..LobbyConfig::default()
        }
        .validated();
        assert_eq!(config.channel_size, 1);
        assert_eq!(config.default_name, "Anon");
    }

    #[test]
    fn test_validated_caps_room_ttl() {
        let config = LobbyConfig {
            room_ttl_secs: u64::MAX,
            ..LobbyConfig::default()
        };
        assert_eq!(config.room_ttl(), Duration::from_secs(MAX_ROOM_TTL_SECS));

        let config = config.validated();
        assert_eq!(config.room_ttl_secs, MAX_ROOM_TTL_SECS);
    }
}
