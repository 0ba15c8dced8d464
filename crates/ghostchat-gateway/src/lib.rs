pub mod handlers;
pub mod interaction;
pub mod registry;
pub mod routes;

pub use interaction::{Interaction, InteractionKind, InteractionResponse};
pub use registry::{Context, Registry};
pub use routes::{GatewayState, router};
