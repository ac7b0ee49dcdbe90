//! # Mention resolution
//!
//! Turns a reference to a user, room or message on one network into the
//! literal that names the same entity on the other network.
//!
//! Resolution never fails outward. A reference the directory cannot resolve,
//! including one whose lookup errored, degrades to [`Resolution::Fallback`]
//! carrying the text the sender saw.

pub mod matrix_uri;

use std::fmt::Display;

use crate::directory::{Directory, LookupResult, MessageHistory};
use crate::inline::DiscordMention;
use crate::model::{FormatterContext, Portal};
use crate::options::FormatterOptions;

pub use matrix_uri::{MatrixUri, parse_matrix_uri};

/// The kind of Matrix entity a raw identifier names, by its sigil.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MentionReference<'a> {
    RoomAlias(&'a str),
    RoomId(&'a str),
    UserId(&'a str),
    /// Empty, or a sigil with no mention form.
    Plain,
}

impl<'a> MentionReference<'a> {
    pub fn parse(raw: &'a str) -> Self {
        match raw.as_bytes().first() {
            Some(b'#') => MentionReference::RoomAlias(raw),
            Some(b'!') => MentionReference::RoomId(raw),
            Some(b'@') => MentionReference::UserId(raw),
            _ => MentionReference::Plain,
        }
    }
}

/// Outcome of resolving a mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<T = String> {
    Resolved(T),
    /// The original display text, to be emitted as-is.
    Fallback(String),
}

impl Resolution<String> {
    pub fn into_text(self) -> String {
        match self {
            Resolution::Resolved(text) | Resolution::Fallback(text) => text,
        }
    }
}

/// A Matrix pill: a link to an entity, labelled with its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pill {
    pub href: String,
    pub label: String,
}

pub struct MentionResolver<'f, D> {
    directory: &'f D,
    options: &'f FormatterOptions,
}

impl<'f, D: Directory + MessageHistory> MentionResolver<'f, D> {
    pub fn new(directory: &'f D, options: &'f FormatterOptions) -> Self {
        Self { directory, options }
    }

    /// Resolves a Matrix reference found in an inbound link to Discord syntax.
    ///
    /// `event_id` is set when the link points at a specific message, in which
    /// case a room reference becomes a message permalink.
    pub fn resolve_pill(
        &self,
        display: &str,
        reference: &str,
        event_id: Option<&str>,
        ctx: &FormatterContext<'_>,
    ) -> Resolution {
        let event_id = event_id.filter(|e| !e.is_empty());
        match MentionReference::parse(reference) {
            MentionReference::Plain => Resolution::Fallback(display.to_string()),
            MentionReference::RoomAlias(alias) => {
                match found("alias", alias, self.directory.resolve_alias(alias)) {
                    Some(room_id) => self.resolve_room(display, &room_id, event_id),
                    None => Resolution::Fallback(display.to_string()),
                }
            }
            MentionReference::RoomId(room_id) => self.resolve_room(display, room_id, event_id),
            MentionReference::UserId(mxid) => self.resolve_user(display, mxid, ctx),
        }
    }

    fn resolve_room(&self, display: &str, room_id: &str, event_id: Option<&str>) -> Resolution {
        let Some(portal) = found("portal", room_id, self.directory.portal_by_room_id(room_id))
        else {
            return Resolution::Fallback(display.to_string());
        };

        let Some(event_id) = event_id else {
            return Resolution::Resolved(format!("<#{}>", portal.channel_id()));
        };

        match found(
            "message",
            event_id,
            self.directory.message_by_event_id(&portal.key, event_id),
        ) {
            Some(message) => Resolution::Resolved(format!(
                "{}/{}/{}/{}",
                self.options.permalink_base,
                self.guild_segment(&portal),
                message.proto_channel_id(),
                message.discord_id
            )),
            None => Resolution::Fallback(display.to_string()),
        }
    }

    fn guild_segment<'p>(&'p self, portal: &'p Portal) -> &'p str {
        match portal.guild_id.as_deref() {
            Some(guild) if !guild.is_empty() => guild,
            _ => &self.options.private_channel_placeholder,
        }
    }

    /// Puppets first, then bridge users. The acting user is last so a
    /// context built outside the directory still resolves its own mxid.
    fn resolve_user(&self, display: &str, mxid: &str, ctx: &FormatterContext<'_>) -> Resolution {
        if let Some(puppet) = found("puppet", mxid, self.directory.puppet_by_mxid(mxid)) {
            return Resolution::Resolved(format!("<@{}>", puppet.discord_id));
        }

        let user = found("user", mxid, self.directory.user_by_mxid(mxid))
            .or_else(|| (ctx.user.mxid == mxid).then(|| ctx.user.clone()));
        match user.and_then(|u| u.discord_id).filter(|id| !id.is_empty()) {
            Some(discord_id) => Resolution::Resolved(format!("<@{discord_id}>")),
            None => Resolution::Fallback(display.to_string()),
        }
    }

    /// Resolves a Discord mention tag in an outbound message to a Matrix pill.
    ///
    /// `literal` is the tag as written, used when the target is unknown.
    pub fn resolve_discord_mention(
        &self,
        mention: &DiscordMention,
        literal: &str,
    ) -> Resolution<Pill> {
        match mention {
            DiscordMention::User(id) => {
                match found("puppet", id, self.directory.puppet_by_discord_id(id)) {
                    Some(puppet) => Resolution::Resolved(Pill {
                        href: format!("{}{}", self.options.matrix_to_base, puppet.mxid),
                        label: puppet.display_name.unwrap_or_else(|| id.clone()),
                    }),
                    None => Resolution::Fallback(literal.to_string()),
                }
            }
            DiscordMention::Channel(id) => {
                match found("portal", id, self.directory.portal_by_channel_id(id)) {
                    Some(portal) => Resolution::Resolved(Pill {
                        href: format!("{}{}", self.options.matrix_to_base, portal.room_id),
                        label: format!("#{}", portal.name.as_deref().unwrap_or(id)),
                    }),
                    None => Resolution::Fallback(literal.to_string()),
                }
            }
            DiscordMention::Role(id) => Resolution::Fallback(format!("@&{id}")),
            DiscordMention::Emoji { name, .. } => Resolution::Fallback(format!(":{name}:")),
        }
    }
}

/// Collapses a lookup result to found-or-not, logging why it was not.
fn found<T>(what: &str, key: impl Display, result: LookupResult<T>) -> Option<T> {
    match result {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            log::debug!("no {what} found for {key}, mention left as text");
            None
        }
        Err(err) => {
            log::warn!("{what} lookup for {key} failed, mention left as text: {err}");
            None
        }
    }
}
