//! # API Server Module
//!
//! ## Purpose
//! REST API server exposing KB search and ticket pattern matching, plus
//! health, statistics, and pattern-reload endpoints for operations.
//!
//! ## Input/Output Specification
//! - **Input**: HTTP requests with search queries and ticket text
//! - **Output**: JSON responses in a uniform `{ success, data | error }`
//!   envelope consistent with the rest of the application
//! - **Endpoints**: `/search`, `/tickets/match`, `/patterns/reload`,
//!   `/health`, `/stats`
//!
//! ## Key Features
//! - Validation failures answered as 400s without server-fault logging
//! - Internal failures answered opaquely with a correlation reference
//! - Optional CORS support for web frontends

use crate::engine::{PatternMatchRequest, SearchRequest};
use crate::errors::SearchError;
use crate::utils::Timer;
use crate::AppState;
use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use serde::Serialize;
use serde_json::json;

/// API server wrapping the search service
pub struct ApiServer {
    app_state: AppState,
}

/// Error payload inside the response envelope
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiError {
    message: String,
    category: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

impl ApiServer {
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }

    /// Run the API server until shutdown
    pub async fn run(self) -> crate::Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.app_state.config.server.host, self.app_state.config.server.port
        );
        let enable_cors = self.app_state.config.server.enable_cors;

        tracing::info!("Starting API server on {}", bind_addr);

        let app_state = self.app_state.clone();
        HttpServer::new(move || {
            let cors = if enable_cors {
                Cors::permissive()
            } else {
                Cors::default()
            };
            App::new()
                .wrap(cors)
                .app_data(web::Data::new(app_state.clone()))
                .route("/search", web::post().to(search_handler))
                .route("/tickets/match", web::post().to(match_handler))
                .route("/patterns/reload", web::post().to(reload_handler))
                .route("/health", web::get().to(health_handler))
                .route("/stats", web::get().to(stats_handler))
        })
        .bind(&bind_addr)
        .map_err(|e| SearchError::internal(format!("Failed to bind server to {bind_addr}: {e}")))?
        .run()
        .await
        .map_err(|e| SearchError::internal(format!("Server error: {e}")))?;

        Ok(())
    }
}

fn success<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "success": true, "data": data }))
}

/// Translate an engine error into the response envelope.
///
/// Validation problems are the caller's fault and are not logged as server
/// faults; everything else is logged with its correlation reference and
/// surfaced opaquely.
fn failure(error: SearchError) -> HttpResponse {
    if error.is_client_error() {
        tracing::debug!("Rejected request: {}", error);
        let payload = ApiError {
            message: error.to_string(),
            category: error.category(),
            correlation_id: None,
        };
        return HttpResponse::BadRequest().json(json!({ "success": false, "error": payload }));
    }

    tracing::error!("Request failed ({}): {}", error.category(), error);
    let correlation_id = match &error {
        SearchError::Internal { correlation_id, .. } => correlation_id.to_string(),
        _ => uuid::Uuid::new_v4().to_string(),
    };
    let payload = ApiError {
        message: "Internal server error".to_string(),
        category: "internal",
        correlation_id: Some(correlation_id),
    };
    HttpResponse::InternalServerError().json(json!({ "success": false, "error": payload }))
}

/// KB search endpoint handler
async fn search_handler(
    app_state: web::Data<AppState>,
    request: web::Json<SearchRequest>,
) -> ActixResult<HttpResponse> {
    let timer = Timer::new("search");
    let response = app_state.service.search(request.into_inner()).await;
    timer.stop();

    Ok(match response {
        Ok(data) => success(data),
        Err(e) => failure(e),
    })
}

/// Ticket pattern-match endpoint handler
async fn match_handler(
    app_state: web::Data<AppState>,
    request: web::Json<PatternMatchRequest>,
) -> ActixResult<HttpResponse> {
    let timer = Timer::new("match_ticket");
    let response = app_state.service.match_ticket(request.into_inner()).await;
    timer.stop();

    Ok(match response {
        Ok(data) => success(data),
        Err(e) => failure(e),
    })
}

/// Pattern reload endpoint handler
async fn reload_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(match app_state.service.reload_patterns().await {
        Ok(active) => success(json!({ "activePatterns": active })),
        Err(e) => failure(e),
    })
}

/// Health check endpoint handler
async fn health_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(match app_state.service.health_check().await {
        Ok(()) => success(json!({ "status": "healthy" })),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(json!({
                "success": false,
                "error": { "message": "unhealthy", "category": "health" },
            }))
        }
    })
}

/// Statistics endpoint handler
async fn stats_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(match app_state.service.stats().await {
        Ok(stats) => success(stats),
        Err(e) => failure(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::SearchService;
    use crate::repository::{InMemoryArticleRepository, InMemoryPatternRepository};
    use actix_web::test;
    use std::sync::Arc;

    async fn state() -> AppState {
        let config = Arc::new(Config::default());
        let service = SearchService::new(
            config.clone(),
            Arc::new(InMemoryArticleRepository::new(Vec::new())),
            Arc::new(InMemoryPatternRepository::new(Vec::new())),
        )
        .await
        .unwrap();
        AppState {
            config,
            service: Arc::new(service),
        }
    }

    #[actix_web::test]
    async fn search_envelope_reports_validation_errors() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state().await))
                .route("/search", web::post().to(search_handler)),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/search")
            .set_json(serde_json::json!({ "query": "   " }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), 400);

        let body = test::read_body(response).await;
        let envelope: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(envelope["success"], false);
        assert!(envelope["error"]["message"]
            .as_str()
            .unwrap()
            .contains("query"));
    }

    #[actix_web::test]
    async fn search_envelope_wraps_results() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state().await))
                .route("/search", web::post().to(search_handler)),
        )
        .await;

        let request = test::TestRequest::post()
            .uri("/search")
            .set_json(serde_json::json!({ "query": "password" }))
            .to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), 200);

        let body = test::read_body(response).await;
        let envelope: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(envelope["success"], true);
        assert_eq!(envelope["data"]["total"], 0);
    }
}
