#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code so a bad environment fails with a log
// line instead of a panic.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, http::StatusCode, middleware};
use claimgate::config::{RejectionFormat, ServerConfig};
use claimgate::{ClaimSchema, Gate, GateConfig, JsonField, KeyMaterial, TokenCodec, gate};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "claimgate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let schema = match ClaimSchema::load(&config.schema_path) {
        Ok(schema) => schema,
        Err(e) => {
            tracing::error!("Failed to load claim schema: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: schema={}, header={}, algorithm={:?}, listen_port={}",
        schema.name(),
        config.header_name,
        config.algorithm,
        config.listen_port
    );

    let codec = Arc::new(TokenCodec::with_algorithm(schema, config.algorithm));
    let gate_config = GateConfig::new(
        config.header_name.clone(),
        codec,
        KeyMaterial::secret(config.secret.clone()),
    );
    let token_gate = match Gate::new(gate_config) {
        Ok(token_gate) => token_gate,
        Err(e) => {
            tracing::error!("Failed to build gate: {e}");
            std::process::exit(1);
        }
    };
    let token_gate = match config.rejection_format {
        RejectionFormat::Text => token_gate,
        RejectionFormat::Json => token_gate.with_responder(JsonField::new("bad_token")),
    };

    // Every path answers with a forward-auth verdict: 204 when the token
    // passes, the gate's 403 otherwise.
    let app = Router::new()
        .fallback(|| async { StatusCode::NO_CONTENT })
        .layer(middleware::from_fn_with_state(
            Arc::new(token_gate),
            gate::enforce,
        ));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.listen_port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}
