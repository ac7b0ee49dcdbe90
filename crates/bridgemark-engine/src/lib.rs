pub mod content;
pub mod directory;
pub mod escape;
pub mod formatter;
pub mod inbound;
pub mod inline;
pub mod mention;
pub mod model;
pub mod options;
pub mod outbound;

// Re-export key types for easier usage
pub use content::{MessageContent, MessageFormat};
pub use directory::{Directory, InMemoryDirectory, LookupError, LookupResult, MessageHistory};
pub use escape::Escaper;
pub use formatter::Formatter;
pub use inline::DiscordMention;
pub use mention::{MentionReference, MentionResolver, Pill, Resolution};
pub use model::{FormatterContext, Message, Portal, PortalKey, Puppet, User};
pub use options::FormatterOptions;
