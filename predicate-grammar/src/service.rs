use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use predicate_core::{PredicateConfig, DEFAULT_BIND_ADDRESS};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::error::PredicateError;
use crate::validator::Validator;

/// Body returned when a filter is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub valid: bool,
    pub predicate: Value,
    pub depth: usize,
    pub fields: Vec<String>,
}

/// Body returned when a filter is rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl From<&PredicateError> for ErrorResponse {
    fn from(value: &PredicateError) -> Self {
        Self {
            code: "invalid_filter".to_string(),
            message: value.to_string(),
            path: value.path().map(str::to_string),
        }
    }
}

#[derive(Clone)]
struct PredicateServiceState {
    validator: Validator,
}

/// Configuration for the validation API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

fn default_bind_address() -> String {
    DEFAULT_BIND_ADDRESS.to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl From<&PredicateConfig> for ServiceConfig {
    fn from(config: &PredicateConfig) -> Self {
        Self {
            bind_address: config.bind_address.clone(),
        }
    }
}

/// Helper used by host applications to compose the validation router.
#[derive(Clone)]
pub struct PredicateApiBuilder {
    state: PredicateServiceState,
}

impl PredicateApiBuilder {
    pub fn new(validator: Validator) -> Self {
        Self {
            state: PredicateServiceState { validator },
        }
    }

    pub fn into_router(self) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/predicates/validate", post(validate_predicate))
            .with_state(self.state)
    }

    /// Spawns an HTTP server binding to the configured address.
    pub async fn serve(self, config: ServiceConfig) -> anyhow::Result<oneshot::Sender<()>> {
        let (tx, rx) = oneshot::channel();
        let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
        let app = self.into_router();

        tokio::spawn(async move {
            info!(address = %config.bind_address, "starting predicate service");
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = rx.await;
                })
                .await
                .ok();
        });

        Ok(tx)
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn validate_predicate(
    State(state): State<PredicateServiceState>,
    Json(payload): Json<Value>,
) -> Result<Json<ValidationResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.validator.validate(&payload) {
        Ok(predicate) => Ok(Json(ValidationResponse {
            valid: true,
            depth: predicate.depth(),
            fields: predicate
                .field_paths()
                .into_iter()
                .map(|path| path.as_str().to_string())
                .collect(),
            predicate: predicate.to_value(),
        })),
        Err(err) => {
            warn!(error = %err, "rejected filter");
            Err((StatusCode::BAD_REQUEST, Json(ErrorResponse::from(&err))))
        }
    }
}
