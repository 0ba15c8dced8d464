pub mod directory;
pub mod messenger;
pub mod rest;
pub mod transcript;

pub use directory::{Channel, ChannelKind, Directory, Guild, Member};
pub use messenger::{ChannelMessage, Messenger};
pub use rest::RestPlatform;
pub use transcript::{ChannelLogExporter, ExportOptions, Transcript, TranscriptExporter};
