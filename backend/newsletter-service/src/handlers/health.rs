/// Liveness and readiness probes
use crate::state::AppState;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct ComponentCheck {
    pub status: ComponentStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub status: ComponentStatus,
    pub checks: HashMap<String, ComponentCheck>,
    pub timestamp: String,
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "newsletter-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// 200 once the backing store answers, 503 otherwise
pub async fn ready(state: web::Data<AppState>) -> HttpResponse {
    let mut checks = HashMap::new();

    let check = match &state.db {
        Some(pool) => {
            let start = Instant::now();
            let result = sqlx::query("SELECT 1").fetch_one(pool).await;
            let latency_ms = Some(start.elapsed().as_millis() as u64);
            match result {
                Ok(_) => ComponentCheck {
                    status: ComponentStatus::Healthy,
                    message: "PostgreSQL connection successful".to_string(),
                    latency_ms,
                },
                Err(e) => ComponentCheck {
                    status: ComponentStatus::Unhealthy,
                    message: format!("PostgreSQL connection failed: {}", e),
                    latency_ms,
                },
            }
        }
        None => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "in-memory store".to_string(),
            latency_ms: None,
        },
    };

    let ready = check.status == ComponentStatus::Healthy;
    checks.insert("store".to_string(), check);

    let response = ReadinessResponse {
        ready,
        status: if ready {
            ComponentStatus::Healthy
        } else {
            ComponentStatus::Unhealthy
        },
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}
