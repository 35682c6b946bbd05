/// HTTP surface consumed by the HR platform back-end.
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use eval_common::capability::TextGenerator;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::analyzer::ViolationAnalyzer;
use crate::error::AppError;
use crate::member::analyze_member;
use crate::model::{
    AnalysisResult, EvaluationTemplate, GuideViolationReport, MemberEvaluation,
    PromotionCandidate, ViolationRequest,
};
use crate::promotion::recommend_promotions;

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn TextGenerator>,
    pub analyzer: ViolationAnalyzer,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/analyze/member", post(member))
        .route("/api/analyze/promotion", post(promotion))
        .route("/api/analyze/violation", post(violation))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Config(_) | AppError::InvalidChunking { .. } => StatusCode::BAD_REQUEST,
            AppError::EmptyIndex => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Retrieval(_) | AppError::Generation(_) | AppError::MalformedOutput(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!(status = status.as_u16(), error = %self, "request failed");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn member(
    State(state): State<AppState>,
    Json(body): Json<MemberEvaluation>,
) -> Result<Json<AnalysisResult>, AppError> {
    Ok(Json(analyze_member(state.generator.as_ref(), &body).await?))
}

async fn promotion(
    State(state): State<AppState>,
    Json(body): Json<Vec<EvaluationTemplate>>,
) -> Result<Json<Vec<PromotionCandidate>>, AppError> {
    Ok(Json(recommend_promotions(state.generator.as_ref(), &body).await?))
}

async fn violation(
    State(state): State<AppState>,
    Json(body): Json<ViolationRequest>,
) -> Result<Json<Vec<GuideViolationReport>>, AppError> {
    Ok(Json(state.analyzer.analyze(&body.template, &body.guide).await?))
}
