use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// --- Evaluation data (inbound, camelCase from the HR back-end) ---

/// One evaluation template with its per-manager evaluation groups.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EvaluationTemplate {
    #[serde(rename = "evaluationTemplateId")]
    pub id: i64,
    #[serde(rename = "evaluationTemplateName")]
    pub name: String,
    #[serde(default)]
    pub evaluations: Vec<EvaluationGroup>,
}

/// All evaluatees graded by one manager within a template.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EvaluationGroup {
    #[serde(rename = "evaluationManagerName")]
    pub manager_name: String,
    #[serde(rename = "evaluationDepartmentName")]
    pub department_name: String,
    #[serde(default)]
    pub evaluatees: Vec<Evaluatee>,
}

/// The id, total score, department and job grade are only sent with dashboard data
/// (promotion analysis); violation analysis reads the name and form items.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Evaluatee {
    #[serde(rename = "evaluationEvaluateeId", default)]
    pub id: Option<i64>,
    #[serde(rename = "evaluationEvaluateeName")]
    pub name: String,
    #[serde(rename = "evaluationEvaluateeDepartmentName", default)]
    pub department_name: Option<String>,
    #[serde(rename = "evaluationEvaluateeGrade", default)]
    pub grade: Option<String>,
    #[serde(rename = "evaluationEvaluateeTotalScore", default)]
    pub total_score: Option<f64>,
    #[serde(rename = "formItems", default)]
    pub form_items: Vec<FormItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FormItem {
    #[serde(rename = "formItemName")]
    pub name: String,
    #[serde(rename = "formItemScore", default)]
    pub score: Option<f64>,
    #[serde(rename = "formItemRank", default)]
    pub rank: Option<String>,
    #[serde(rename = "formItemEvaluateePerformance", default)]
    pub performance: Option<String>,
    #[serde(rename = "formItemComment", default)]
    pub comment: Option<String>,
}

impl FormItem {
    /// The rank label, with blank strings treated as ungraded.
    pub fn graded_rank(&self) -> Option<&str> {
        self.rank.as_deref().map(str::trim).filter(|r| !r.is_empty())
    }
}

/// Body of a violation analysis request.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ViolationRequest {
    /// Raw text of the evaluation guideline.
    pub guide: String,
    pub template: EvaluationTemplate,
}

// --- Violation findings (outbound) ---

/// A single guideline finding, either from the generation model or the rank
/// distribution rule. The wire keys are the Korean labels the HR back-end reads; the
/// English names are accepted on input as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ViolationRecord {
    #[serde(rename = "피평가자", alias = "evaluatee")]
    pub evaluatee: String,
    #[serde(rename = "항목", alias = "item")]
    pub item: String,
    #[serde(rename = "위반 사유", alias = "reason")]
    pub reason: String,
}

/// Findings for one manager group of one template.
///
/// Only built through [`GuideViolationReport::from_findings`], which refuses an empty
/// violation list.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuideViolationReport {
    evaluation_template_id: i64,
    evaluation_template_name: String,
    manager_name: String,
    department_name: String,
    violations: Vec<ViolationRecord>,
}

impl GuideViolationReport {
    pub fn from_findings(
        template: &EvaluationTemplate,
        group: &EvaluationGroup,
        violations: Vec<ViolationRecord>,
    ) -> Option<Self> {
        if violations.is_empty() {
            return None;
        }
        Some(Self {
            evaluation_template_id: template.id,
            evaluation_template_name: template.name.clone(),
            manager_name: group.manager_name.clone(),
            department_name: group.department_name.clone(),
            violations,
        })
    }

    pub fn violations(&self) -> &[ViolationRecord] {
        &self.violations
    }
}

// --- Member narrative analysis (snake_case, as sent by the HR back-end) ---

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MemberEvaluation {
    pub template_name: String,
    pub employee_name: String,
    pub employee_department: String,
    pub employee_grade: String,
    pub total_score: f64,
    pub total_rank: String,
    pub form_items: Vec<MemberFormItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MemberFormItem {
    pub item_name: String,
    pub score: f64,
    /// Weight of the item in the total score, in percent.
    pub weight: f64,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisResult {
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub action_plan: Vec<String>,
}

// --- Promotion recommendation ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PromotionCandidate {
    pub name: String,
    pub department: String,
    pub current_grade: String,
    pub recommended_grade: String,
    /// Mean score change between consecutive evaluations.
    pub growth_rate: f64,
    pub core_competencies: Vec<String>,
    pub reason: String,
}
