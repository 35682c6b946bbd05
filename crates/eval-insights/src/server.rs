/// MCP server exposing the evaluation analyses as tools.
///
/// Exposes three tools:
/// - `analyze_violations`: Guideline violation reports for one evaluation template
/// - `analyze_member`: Strengths, improvements and action plan for one employee
/// - `recommend_promotions`: Top growth candidates with a promotion rationale
use std::sync::Arc;

use eval_common::capability::TextGenerator;
use rmcp::{
    Json, ServerHandler,
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::*,
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analyzer::ViolationAnalyzer;
use crate::member::analyze_member;
use crate::model::{
    AnalysisResult, EvaluationTemplate, GuideViolationReport, MemberEvaluation,
    PromotionCandidate, ViolationRequest,
};
use crate::promotion::recommend_promotions;

#[derive(Clone)]
pub struct EvalInsightsServer {
    generator: Arc<dyn TextGenerator>,
    analyzer: ViolationAnalyzer,
    tool_router: ToolRouter<EvalInsightsServer>,
}

impl EvalInsightsServer {
    pub fn new(generator: Arc<dyn TextGenerator>, analyzer: ViolationAnalyzer) -> Self {
        Self {
            generator,
            analyzer,
            tool_router: Self::tool_router(),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RecommendPromotionsParams {
    /// Dashboard evaluation templates, in any order.
    templates: Vec<EvaluationTemplate>,
}

#[derive(Debug, Serialize, JsonSchema)]
struct ViolationReportsResponse {
    reports: Vec<GuideViolationReport>,
}

#[derive(Debug, Serialize, JsonSchema)]
struct PromotionsResponse {
    candidates: Vec<PromotionCandidate>,
}

#[tool_router]
impl EvalInsightsServer {
    #[tool(description = "Check one evaluation template against an evaluation guideline. Returns one report per manager group with guideline violations or a skewed rank distribution; groups without findings are omitted.")]
    async fn analyze_violations(
        &self,
        Parameters(params): Parameters<ViolationRequest>,
    ) -> Result<Json<ViolationReportsResponse>, String> {
        info!(template_id = params.template.id, "analyze_violations called");
        let reports = self
            .analyzer
            .analyze(&params.template, &params.guide)
            .await
            .map_err(|e| format!("violation analysis failed: {e}"))?;
        Ok(Json(ViolationReportsResponse { reports }))
    }

    #[tool(description = "Summarise one employee's evaluation into strengths, improvements and an action plan of at least two steps.")]
    async fn analyze_member(
        &self,
        Parameters(params): Parameters<MemberEvaluation>,
    ) -> Result<Json<AnalysisResult>, String> {
        let result = analyze_member(self.generator.as_ref(), &params)
            .await
            .map_err(|e| format!("member analysis failed: {e}"))?;
        Ok(Json(result))
    }

    #[tool(description = "Rank employees by average total-score growth across evaluation templates and return the top three with a recommended next grade, core competencies and reason.")]
    async fn recommend_promotions(
        &self,
        Parameters(params): Parameters<RecommendPromotionsParams>,
    ) -> Result<Json<PromotionsResponse>, String> {
        let candidates = recommend_promotions(self.generator.as_ref(), &params.templates)
            .await
            .map_err(|e| format!("promotion recommendation failed: {e}"))?;
        Ok(Json(PromotionsResponse { candidates }))
    }
}

#[tool_handler]
impl ServerHandler for EvalInsightsServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_06_18,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "eval-insights".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "HR evaluation analysis server. Use analyze_violations with the guideline text \
and an evaluation template to audit manager grading, analyze_member for an individual \
narrative summary, and recommend_promotions with the dashboard history to pick promotion \
candidates."
                    .to_string(),
            ),
        }
    }
}
