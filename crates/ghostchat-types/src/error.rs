use thiserror::Error;

/// Failures that abort a manager operation and surface to the caller.
///
/// Unknown rooms and already-closed rooms are NOT errors: those paths return
/// `Ok(None)` so a stale interaction never crashes the relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A referenced guild, member, channel, or category does not exist on the
    /// platform.
    #[error("could not resolve {what} {id}")]
    Resolution { what: &'static str, id: String },

    /// A platform call on the fatal path (channel creation, announcement
    /// delivery) failed.
    #[error("platform request failed: {0}")]
    Platform(#[source] anyhow::Error),

    /// A store query failed. Logged at the call site; never retried.
    #[error("persistence failure: {0}")]
    Persistence(#[source] anyhow::Error),
}

pub type RelayResult<T> = Result<T, RelayError>;
