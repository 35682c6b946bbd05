/// Narrative analysis of one employee's evaluation: strengths, improvements and an
/// action plan, written by the generation model.
use eval_common::capability::TextGenerator;
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::AppError;
use crate::model::{AnalysisResult, MemberEvaluation};
use crate::reply::parse_json_reply;

/// Used when the model leaves out the action plan.
const FALLBACK_ACTION_PLAN: [&str; 2] = [
    "매주 개인 업무 목표를 명확히 설정하고 실행 결과를 점검한다",
    "업무 종료 후 개선 사항을 정리하여 다음 업무에 반영한다",
];

const PROMPT_TEMPLATE: &str = r#"너는 기업 인사팀에서 사용하는 평가 분석 AI야.

아래 사원 평가 데이터를 기반으로 분석해.

출력 규칙 (매우 중요):
- 반드시 strengths, improvements, action_plan 3개 필드를 모두 포함할 것
- 각 필드는 문자열 배열
- action_plan은 절대 생략하지 말 것
- action_plan은 최소 2개 이상
- 실행 가능한 행동 단위로 작성

[평가 템플릿]
{template_name}

[사원 정보]
이름: {employee_name}
부서: {employee_department}
직급: {employee_grade}

[최종 점수]
{total_score}

[최종 등급]
{total_rank}

[세부 평가 항목]
{items}

출력 예시(JSON 형식):
{
  "strengths": [
    "업무 수행 안정성이 높고 일정 관리가 우수함"
  ],
  "improvements": [
    "문제 해결 과정에서 주도적인 접근이 필요함"
  ],
  "action_plan": [
    "매주 개인 업무 목표를 명확히 설정하고 실행 결과를 점검한다",
    "분기별 역량 개선 계획을 수립하고 팀장 피드백을 받는다"
  ]
}

조건:
- 반드시 JSON 형식
- 한국어
- 실무 인사평가 스타일
"#;

/// Reply shape before the action plan fallback is applied.
#[derive(Deserialize)]
struct RawAnalysis {
    strengths: Vec<String>,
    improvements: Vec<String>,
    #[serde(default)]
    action_plan: Option<Vec<String>>,
}

pub fn render_prompt(member: &MemberEvaluation) -> String {
    let items = member
        .form_items
        .iter()
        .map(|i| {
            format!(
                "- {}: {}점 (가중치 {}%) / 코멘트: {}",
                i.item_name, i.score, i.weight, i.comment
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    PROMPT_TEMPLATE
        .replace("{template_name}", &member.template_name)
        .replace("{employee_name}", &member.employee_name)
        .replace("{employee_department}", &member.employee_department)
        .replace("{employee_grade}", &member.employee_grade)
        .replace("{total_score}", &member.total_score.to_string())
        .replace("{total_rank}", &member.total_rank)
        .replace("{items}", &items)
}

/// Parse the model reply. A missing or empty action plan is replaced by a fixed
/// two-step plan; anything else that does not fit is `MalformedOutput`.
pub fn parse_analysis(reply: &str) -> Result<AnalysisResult, AppError> {
    let raw: RawAnalysis = parse_json_reply(reply)
        .map_err(|e| AppError::MalformedOutput(format!("member analysis: {e}")))?;

    let action_plan = match raw.action_plan {
        Some(plan) if !plan.is_empty() => plan,
        _ => {
            warn!("action_plan missing from member analysis, using the default plan");
            FALLBACK_ACTION_PLAN.iter().map(|s| s.to_string()).collect()
        }
    };

    Ok(AnalysisResult {
        strengths: raw.strengths,
        improvements: raw.improvements,
        action_plan,
    })
}

pub async fn analyze_member(
    generator: &dyn TextGenerator,
    member: &MemberEvaluation,
) -> Result<AnalysisResult, AppError> {
    let prompt = render_prompt(member);
    let reply = generator
        .generate(&prompt)
        .await
        .map_err(AppError::Generation)?;
    let result = parse_analysis(&reply)?;
    info!(
        employee = %member.employee_name,
        strengths = result.strengths.len(),
        improvements = result.improvements.len(),
        "member analysis complete"
    );
    Ok(result)
}
