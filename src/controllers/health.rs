use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::domain::tts::CircuitBreaker;
use crate::infrastructure::queue::JobQueue;
use crate::infrastructure::tts::ProviderRegistry;

pub struct HealthController {
    registry: Arc<ProviderRegistry>,
    breaker: Arc<CircuitBreaker>,
    job_queue: Arc<JobQueue>,
}

impl HealthController {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        breaker: Arc<CircuitBreaker>,
        job_queue: Arc<JobQueue>,
    ) -> Self {
        Self {
            registry,
            breaker,
            job_queue,
        }
    }

    /// GET /health - Liveness
    pub async fn health() -> impl IntoResponse {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    }

    /// GET /health/ready - Providers, breaker counters and workers
    pub async fn health_ready(State(controller): State<Arc<HealthController>>) -> impl IntoResponse {
        let providers = controller.registry.names();
        let open_circuits: Vec<String> = providers
            .iter()
            .filter(|name| controller.breaker.is_open(name))
            .cloned()
            .collect();

        // ready as long as one registered provider can still be tried
        let ready = providers.len() > open_circuits.len();
        let status = if ready {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };

        (
            status,
            Json(json!({
                "status": if ready { "ready" } else { "not_ready" },
                "providers": providers,
                "circuit_breaker": {
                    "threshold": controller.breaker.threshold(),
                    "failures": controller.breaker.snapshot(),
                    "open": open_circuits,
                },
                "workers": controller.job_queue.worker_count(),
            })),
        )
    }
}
