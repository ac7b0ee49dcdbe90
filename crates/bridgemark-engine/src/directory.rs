//! Read-only lookups into the bridge's identity, portal and message stores.
//!
//! The formatter treats every lookup failure the same as a miss: the mention
//! falls back to literal text. Implementations still report errors so the
//! formatter can log them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Message, Portal, PortalKey, Puppet, User};

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("directory backend unavailable: {0}")]
    Unavailable(String),

    #[error("lookup of {key} failed: {reason}")]
    Failed { key: String, reason: String },
}

pub type LookupResult<T> = Result<Option<T>, LookupError>;

/// Users, puppets, portals and room aliases.
pub trait Directory {
    /// Resolves a `#alias:server` to a `!room:server` id.
    fn resolve_alias(&self, alias: &str) -> LookupResult<String>;
    fn portal_by_room_id(&self, room_id: &str) -> LookupResult<Portal>;
    fn portal_by_channel_id(&self, channel_id: &str) -> LookupResult<Portal>;
    fn puppet_by_mxid(&self, mxid: &str) -> LookupResult<Puppet>;
    fn puppet_by_discord_id(&self, discord_id: &str) -> LookupResult<Puppet>;
    fn user_by_mxid(&self, mxid: &str) -> LookupResult<User>;
}

/// Messages bridged in the past, keyed by their Matrix event id.
pub trait MessageHistory {
    fn message_by_event_id(&self, portal: &PortalKey, event_id: &str) -> LookupResult<Message>;
}

/// A directory held entirely in memory.
///
/// Deserializes from a TOML/JSON fixture, which is how the CLI and the tests
/// provide bridge state without a database.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InMemoryDirectory {
    pub users: Vec<User>,
    pub puppets: Vec<Puppet>,
    pub portals: Vec<Portal>,
    pub messages: Vec<Message>,
    /// Room alias to room id.
    pub aliases: HashMap<String, String>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.users.push(user);
        self
    }

    pub fn with_puppet(mut self, puppet: Puppet) -> Self {
        self.puppets.push(puppet);
        self
    }

    pub fn with_portal(mut self, portal: Portal) -> Self {
        self.portals.push(portal);
        self
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>, room_id: impl Into<String>) -> Self {
        self.aliases.insert(alias.into(), room_id.into());
        self
    }
}

impl Directory for InMemoryDirectory {
    fn resolve_alias(&self, alias: &str) -> LookupResult<String> {
        Ok(self.aliases.get(alias).cloned())
    }

    fn portal_by_room_id(&self, room_id: &str) -> LookupResult<Portal> {
        Ok(self.portals.iter().find(|p| p.room_id == room_id).cloned())
    }

    fn portal_by_channel_id(&self, channel_id: &str) -> LookupResult<Portal> {
        Ok(self
            .portals
            .iter()
            .find(|p| p.channel_id() == channel_id)
            .cloned())
    }

    fn puppet_by_mxid(&self, mxid: &str) -> LookupResult<Puppet> {
        Ok(self.puppets.iter().find(|p| p.mxid == mxid).cloned())
    }

    fn puppet_by_discord_id(&self, discord_id: &str) -> LookupResult<Puppet> {
        Ok(self
            .puppets
            .iter()
            .find(|p| p.discord_id == discord_id)
            .cloned())
    }

    fn user_by_mxid(&self, mxid: &str) -> LookupResult<User> {
        Ok(self.users.iter().find(|u| u.mxid == mxid).cloned())
    }
}

impl MessageHistory for InMemoryDirectory {
    fn message_by_event_id(&self, portal: &PortalKey, event_id: &str) -> LookupResult<Message> {
        Ok(self
            .messages
            .iter()
            .find(|m| m.mxid == event_id && m.channel_id == portal.channel_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portal(channel: &str, room: &str) -> Portal {
        Portal {
            key: PortalKey::new(channel),
            room_id: room.into(),
            guild_id: Some("900".into()),
            name: Some("general".into()),
        }
    }

    #[test]
    fn portal_lookups_by_either_side() {
        let dir = InMemoryDirectory::new().with_portal(portal("100", "!a:hs"));

        assert_eq!(
            dir.portal_by_room_id("!a:hs").unwrap().map(|p| p.key.channel_id),
            Some("100".to_string())
        );
        assert_eq!(
            dir.portal_by_channel_id("100").unwrap().map(|p| p.room_id),
            Some("!a:hs".to_string())
        );
        assert!(dir.portal_by_room_id("!b:hs").unwrap().is_none());
    }

    #[test]
    fn messages_are_scoped_to_their_portal() {
        let dir = InMemoryDirectory::new().with_message(Message {
            discord_id: "555".into(),
            channel_id: "100".into(),
            thread_id: None,
            mxid: "$ev".into(),
        });

        assert!(
            dir.message_by_event_id(&PortalKey::new("100"), "$ev")
                .unwrap()
                .is_some()
        );
        assert!(
            dir.message_by_event_id(&PortalKey::new("200"), "$ev")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn deserializes_from_toml_shape() {
        let json = r##"{
            "puppets": [{"discord_id": "42", "mxid": "@_discord_42:hs"}],
            "aliases": {"#room:hs": "!a:hs"}
        }"##;
        let dir: InMemoryDirectory = serde_json::from_str(json).unwrap();

        assert_eq!(dir.resolve_alias("#room:hs").unwrap().as_deref(), Some("!a:hs"));
        assert_eq!(
            dir.puppet_by_discord_id("42").unwrap().map(|p| p.mxid),
            Some("@_discord_42:hs".to_string())
        );
        assert!(dir.users.is_empty());
    }
}
