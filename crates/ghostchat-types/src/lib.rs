pub mod embeds;
pub mod error;
pub mod events;
pub mod models;
