/// Generation-backed guideline violation detection for one evaluation group.
///
/// Flow per group: retrieve the guideline passages closest to the group's evaluation
/// text, render the audit prompt, make exactly one generation call, and parse the reply.
/// A reply that is neither the no-violation sentinel nor a JSON array of findings is
/// logged and counted as "no findings": an uncertain answer must not fail the batch.
/// Transport failures of the generation call are real errors and propagate.
use eval_common::capability::{EmbeddingProvider, TextGenerator};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::index::SemanticIndex;
use crate::model::ViolationRecord;
use crate::reply::strip_code_fence;

/// Exact reply meaning "nothing to report".
pub const NO_VIOLATION: &str = "위반 없음";

/// Guideline passages retrieved per group.
const RETRIEVAL_TOP_K: usize = 3;

const PROMPT_TEMPLATE: &str = r#"너는 기업 인사팀의 평가 감사 담당이다.
너의 일은 평가 가이드 위반 여부를 판단하는 것뿐이다. 설명이나 요약은 하지 않는다.

아래 [고정 등급 기준], [평가 가이드 발췌], [평가 데이터]를 비교해서
명백한 평가 가이드 위반만 찾아라.

[고정 등급 기준]
- S: 81~100
- A: 61~80
- B: 41~60
- C: 21~40
- F: 0~20

위반으로 보는 경우는 다음 세 가지뿐이다:
1. 점수가 해당 등급의 점수 범위를 벗어난 경우
2. 실적 내용과 점수/등급이 명백히 맞지 않는 경우
3. 평가 코멘트가 실적과 논리적으로 이어지지 않는 경우

다음은 절대 위반이 아니다:
- 점수와 등급이 기준에 정확히 맞는 경우
- 실적, 점수, 등급, 코멘트가 서로 일관된 경우

문장 작성 규칙:
- 어려운 용어를 쓰지 않는다
- "점수 범위", "기준 불일치", "논리적 일관성" 같은 표현을 쓰지 않는다
- 사람에게 설명하듯 쉽게 쓴다

[평가 가이드 발췌]
{guide_context}

[평가 데이터]
{evaluation_data}

출력 규칙:
- 위반이 하나도 없으면 정확히 다음 문장만 출력한다: 위반 없음
- 위반이 있을 때만 JSON 배열을 출력한다
- 위반이 아닌 항목은 JSON에 넣지 않는다
- JSON 밖에 설명, 판단 요약, 중간 해설을 쓰지 않는다

JSON 형식:
[
  {
    "피평가자": "...",
    "항목": "...",
    "위반 사유": "쉽고 간단한 문장으로 설명"
  }
]
"#;

/// Render the audit prompt for one group.
pub fn render_prompt(guide_context: &str, evaluation_data: &str) -> String {
    PROMPT_TEMPLATE
        .replace("{guide_context}", guide_context)
        .replace("{evaluation_data}", evaluation_data)
}

/// Why a reply produced no findings although it was not the sentinel.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReply {
    #[error("reply is neither the sentinel nor a JSON array")]
    NotAnArray,
    #[error("reply is not valid JSON: {0}")]
    InvalidJson(String),
}

/// Parse a generation reply into findings.
///
/// - the sentinel (after trimming and fence removal) → no findings
/// - a JSON array → one record per element that has the three string fields and a
///   non-blank reason; other elements are dropped
/// - anything else → `MalformedReply`
pub fn parse_violations(reply: &str) -> Result<Vec<ViolationRecord>, MalformedReply> {
    let cleaned = strip_code_fence(reply);
    let unquoted = cleaned.trim_matches('"').trim();
    if unquoted == NO_VIOLATION || unquoted.eq_ignore_ascii_case("no violation") {
        return Ok(Vec::new());
    }
    if !cleaned.starts_with('[') {
        return Err(MalformedReply::NotAnArray);
    }

    let elements: Vec<Value> =
        serde_json::from_str(cleaned).map_err(|e| MalformedReply::InvalidJson(e.to_string()))?;
    let total = elements.len();
    let records: Vec<ViolationRecord> = elements
        .into_iter()
        .filter_map(|element| serde_json::from_value::<ViolationRecord>(element).ok())
        .filter(|record| !record.reason.trim().is_empty())
        .collect();
    if records.len() < total {
        debug!(
            kept = records.len(),
            dropped = total - records.len(),
            "dropped violation entries without the required fields"
        );
    }
    Ok(records)
}

/// Retrieval + generation for groups of one template.
///
/// Holds only shared references; one instance serves every group of a request.
pub struct ViolationGenerator<'a> {
    generator: &'a dyn TextGenerator,
    embedder: &'a dyn EmbeddingProvider,
    index: Option<&'a SemanticIndex>,
}

impl<'a> ViolationGenerator<'a> {
    /// `index` is `None` when the guideline is empty; the prompt then carries no guideline
    /// passages and only the fixed grade table.
    pub fn new(
        generator: &'a dyn TextGenerator,
        embedder: &'a dyn EmbeddingProvider,
        index: Option<&'a SemanticIndex>,
    ) -> Self {
        Self {
            generator,
            embedder,
            index,
        }
    }

    /// Findings for one group's formatted evaluation text.
    pub async fn detect(
        &self,
        manager: &str,
        evaluation_text: &str,
    ) -> Result<Vec<ViolationRecord>, AppError> {
        let guide_context = match self.index {
            Some(index) => index
                .query(self.embedder, evaluation_text, RETRIEVAL_TOP_K)
                .await?
                .iter()
                .map(|segment| segment.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            None => String::new(),
        };

        let prompt = render_prompt(&guide_context, evaluation_text);
        let reply = self
            .generator
            .generate(&prompt)
            .await
            .map_err(AppError::Generation)?;

        match parse_violations(&reply) {
            Ok(records) => Ok(records),
            Err(reason) => {
                warn!(
                    manager,
                    %reason,
                    reply_chars = reply.chars().count(),
                    "generation reply is not a violation list, treating as no findings"
                );
                Ok(Vec::new())
            }
        }
    }
}
