//! Bridge entities the formatter reads while converting.
//!
//! These are read-only views of records owned by the surrounding bridge.
//! The formatter never creates or mutates them.

use serde::{Deserialize, Serialize};

/// A Matrix user of the bridge, optionally logged in to Discord.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub mxid: String,
    #[serde(default)]
    pub discord_id: Option<String>,
}

impl User {
    pub fn new(mxid: impl Into<String>) -> Self {
        Self {
            mxid: mxid.into(),
            discord_id: None,
        }
    }

    pub fn with_discord_id(mut self, discord_id: impl Into<String>) -> Self {
        self.discord_id = Some(discord_id.into());
        self
    }
}

/// The Matrix ghost user standing in for a Discord user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puppet {
    pub discord_id: String,
    pub mxid: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Identifies a portal: a Discord channel, plus the receiving user for DMs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortalKey {
    pub channel_id: String,
    #[serde(default)]
    pub receiver: Option<String>,
}

impl PortalKey {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            receiver: None,
        }
    }
}

/// A Matrix room bridged to a Discord channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Portal {
    pub key: PortalKey,
    pub room_id: String,
    /// `None` for private channels (DMs and group DMs).
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Portal {
    pub fn channel_id(&self) -> &str {
        &self.key.channel_id
    }
}

/// A message known to exist on both sides of the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub discord_id: String,
    pub channel_id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    pub mxid: String,
}

impl Message {
    /// The channel Discord actually stores the message in: the thread if the
    /// message was posted in one, otherwise the parent channel.
    pub fn proto_channel_id(&self) -> &str {
        self.thread_id.as_deref().unwrap_or(&self.channel_id)
    }
}

/// Per-call context: who is acting, and in which portal.
#[derive(Debug, Clone, Copy)]
pub struct FormatterContext<'a> {
    pub user: &'a User,
    pub portal: Option<&'a Portal>,
}

impl<'a> FormatterContext<'a> {
    pub fn new(user: &'a User) -> Self {
        Self { user, portal: None }
    }

    pub fn in_portal(mut self, portal: &'a Portal) -> Self {
        self.portal = Some(portal);
        self
    }
}
