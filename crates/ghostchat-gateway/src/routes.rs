use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use tracing::debug;

use crate::interaction::{Interaction, InteractionResponse};
use crate::registry::{Context, Registry};

#[derive(Clone)]
pub struct GatewayState {
    pub ctx: Arc<Context>,
    pub registry: Arc<Registry>,
}

/// The interaction webhook surface: the platform POSTs user actions here.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/interactions", post(handle_interaction))
        .with_state(state)
}

async fn handle_interaction(
    State(state): State<GatewayState>,
    Json(interaction): Json<Interaction>,
) -> Json<InteractionResponse> {
    debug!(
        "Interaction {:?} {} from {} ({})",
        interaction.kind, interaction.name, interaction.user.username, interaction.user.id
    );
    Json(state.registry.dispatch(&state.ctx, &interaction).await)
}
