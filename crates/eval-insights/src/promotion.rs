/// Promotion recommendation from dashboard history.
///
/// Candidates are the evaluatees whose total score grew fastest across templates.
/// Ranking is deterministic; the model only writes the core competencies and the
/// recommendation reason for each selected candidate.
use std::collections::HashMap;

use eval_common::capability::TextGenerator;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::AppError;
use crate::model::{Evaluatee, EvaluationTemplate, FormItem, PromotionCandidate};
use crate::reply::parse_json_reply;

/// Candidates recommended per request.
pub const TOP_CANDIDATES: usize = 3;

/// Job grades, lowest first.
const GRADE_ORDER: [&str; 6] = ["사원", "주임", "대리", "과장", "차장", "부장"];

const PROMPT_TEMPLATE: &str = r#"너는 기업 인사팀의 승진 심사 AI야.

아래 사원 정보를 기반으로
- 핵심 역량 (1~3개)
- 승진 추천 사유
를 작성해.

출력 형식:
{"core_competencies": ["..."], "reason": "..."}

[사원 정보]
이름: {name}
부서: {department}
현재 직급: {grade}
전 분기 대비 성장률: {growth_rate}%

[평가 항목 점수]
{items}

조건:
- 반드시 JSON 형식으로만 응답
- 한국어
- 실무 인사평가 스타일
- 추상적인 표현 금지
"#;

/// An evaluatee selected for a recommendation, with their latest profile.
#[derive(Debug, Clone)]
pub struct GrowthCandidate {
    pub name: String,
    pub department: String,
    pub grade: String,
    pub form_items: Vec<FormItem>,
    /// Mean change between consecutive total scores, rounded to two decimals.
    pub growth: f64,
}

#[derive(Deserialize)]
struct PromotionReply {
    core_competencies: Vec<String>,
    reason: String,
}

struct ScoreHistory<'a> {
    scores: Vec<f64>,
    latest: &'a Evaluatee,
}

/// Next job grade. Unknown grades and the top grade are returned unchanged.
pub fn recommend_grade(current: &str) -> String {
    GRADE_ORDER
        .iter()
        .position(|g| *g == current)
        .and_then(|i| GRADE_ORDER.get(i + 1))
        .copied()
        .unwrap_or(current)
        .to_string()
}

/// The `n` evaluatees with the highest average score growth.
///
/// Templates are taken in id order. Only evaluatees with an id and at least two total
/// scores qualify. Equal growth keeps first-seen order.
pub fn extract_top_candidates(templates: &[EvaluationTemplate], n: usize) -> Vec<GrowthCandidate> {
    let mut ordered: Vec<&EvaluationTemplate> = templates.iter().collect();
    ordered.sort_by_key(|t| t.id);

    let mut histories: Vec<ScoreHistory<'_>> = Vec::new();
    let mut position: HashMap<i64, usize> = HashMap::new();
    for evaluatee in ordered
        .iter()
        .flat_map(|t| t.evaluations.iter())
        .flat_map(|g| g.evaluatees.iter())
    {
        let (Some(id), Some(score)) = (evaluatee.id, evaluatee.total_score) else {
            continue;
        };
        match position.get(&id) {
            Some(&i) => {
                histories[i].scores.push(score);
                histories[i].latest = evaluatee;
            }
            None => {
                position.insert(id, histories.len());
                histories.push(ScoreHistory {
                    scores: vec![score],
                    latest: evaluatee,
                });
            }
        }
    }

    let mut candidates: Vec<GrowthCandidate> = histories
        .into_iter()
        .filter(|h| h.scores.len() >= 2)
        .map(|h| {
            let deltas: Vec<f64> = h.scores.windows(2).map(|w| w[1] - w[0]).collect();
            let mean = deltas.iter().sum::<f64>() / deltas.len() as f64;
            GrowthCandidate {
                name: h.latest.name.clone(),
                department: h.latest.department_name.clone().unwrap_or_default(),
                grade: h.latest.grade.clone().unwrap_or_default(),
                form_items: h.latest.form_items.clone(),
                growth: (mean * 100.0).round() / 100.0,
            }
        })
        .collect();

    candidates.sort_by(|a, b| b.growth.total_cmp(&a.growth));
    candidates.truncate(n);
    candidates
}

pub fn render_prompt(candidate: &GrowthCandidate) -> String {
    let items = candidate
        .form_items
        .iter()
        .filter_map(|i| i.score.map(|score| format!("- {}: {}점", i.name, score)))
        .collect::<Vec<_>>()
        .join("\n");

    PROMPT_TEMPLATE
        .replace("{name}", &candidate.name)
        .replace("{department}", &candidate.department)
        .replace("{grade}", &candidate.grade)
        .replace("{growth_rate}", &candidate.growth.to_string())
        .replace("{items}", &items)
}

/// Rank the history and ask the model to justify each of the top candidates.
pub async fn recommend_promotions(
    generator: &dyn TextGenerator,
    templates: &[EvaluationTemplate],
) -> Result<Vec<PromotionCandidate>, AppError> {
    let candidates = extract_top_candidates(templates, TOP_CANDIDATES);
    debug!(
        templates = templates.len(),
        candidates = candidates.len(),
        "promotion candidates ranked"
    );

    let mut results = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let reply = generator
            .generate(&render_prompt(&candidate))
            .await
            .map_err(AppError::Generation)?;
        let parsed: PromotionReply = parse_json_reply(&reply).map_err(|e| {
            AppError::MalformedOutput(format!("promotion reason for {}: {e}", candidate.name))
        })?;

        results.push(PromotionCandidate {
            recommended_grade: recommend_grade(&candidate.grade),
            name: candidate.name,
            department: candidate.department,
            current_grade: candidate.grade,
            growth_rate: candidate.growth,
            core_competencies: parsed.core_competencies,
            reason: parsed.reason,
        });
    }
    info!(recommended = results.len(), "promotion recommendation complete");
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EvaluationGroup;
    use crate::test_support::{FailingGenerator, StubGenerator};

    fn evaluatee(id: i64, name: &str, grade: &str, score: Option<f64>) -> Evaluatee {
        Evaluatee {
            id: Some(id),
            name: name.to_string(),
            department_name: Some("개발팀".to_string()),
            grade: Some(grade.to_string()),
            total_score: score,
            form_items: vec![
                FormItem {
                    name: "업무 성과".to_string(),
                    score: score.map(|s| s - 5.0),
                    rank: None,
                    performance: None,
                    comment: None,
                },
                FormItem {
                    name: "협업".to_string(),
                    score: None,
                    rank: None,
                    performance: None,
                    comment: None,
                },
            ],
        }
    }

    fn template(id: i64, evaluatees: Vec<Evaluatee>) -> EvaluationTemplate {
        EvaluationTemplate {
            id,
            name: format!("평가 {id}"),
            evaluations: vec![EvaluationGroup {
                manager_name: "김팀장".to_string(),
                department_name: "개발팀".to_string(),
                evaluatees,
            }],
        }
    }

    /// Four evaluatees over three templates, deliberately given out of id order.
    fn history() -> Vec<EvaluationTemplate> {
        vec![
            template(
                3,
                vec![
                    evaluatee(1, "가사원", "주임", Some(90.0)),
                    evaluatee(2, "나대리", "대리", Some(70.0)),
                    evaluatee(3, "다과장", "부장", Some(80.0)),
                    evaluatee(4, "라사원", "사원", Some(50.0)),
                ],
            ),
            template(
                1,
                vec![
                    evaluatee(1, "가사원", "사원", Some(60.0)),
                    evaluatee(2, "나대리", "대리", Some(80.0)),
                    evaluatee(3, "다과장", "부장", Some(60.0)),
                    evaluatee(4, "라사원", "사원", Some(40.0)),
                    evaluatee(5, "마신입", "사원", Some(99.0)),
                ],
            ),
            template(
                2,
                vec![
                    evaluatee(1, "가사원", "사원", Some(75.0)),
                    evaluatee(2, "나대리", "대리", None),
                    evaluatee(3, "다과장", "부장", Some(70.0)),
                    evaluatee(4, "라사원", "사원", Some(45.0)),
                ],
            ),
        ]
    }

    #[test]
    fn next_grade_follows_the_ladder() {
        assert_eq!(recommend_grade("사원"), "주임");
        assert_eq!(recommend_grade("차장"), "부장");
        assert_eq!(recommend_grade("부장"), "부장");
        assert_eq!(recommend_grade("인턴"), "인턴");
    }

    #[test]
    fn candidates_are_ranked_by_mean_growth() {
        let top = extract_top_candidates(&history(), 3);
        let ranked: Vec<(&str, f64)> = top.iter().map(|c| (c.name.as_str(), c.growth)).collect();
        // 가사원 60→75→90, 다과장 60→70→80, 라사원 40→45→50, 나대리 80→70.
        assert_eq!(ranked, vec![("가사원", 15.0), ("다과장", 10.0), ("라사원", 5.0)]);
    }

    #[test]
    fn latest_profile_wins() {
        let top = extract_top_candidates(&history(), 1);
        assert_eq!(top[0].grade, "주임");
        assert_eq!(top[0].form_items[0].score, Some(85.0));
    }

    #[test]
    fn single_evaluation_and_missing_ids_do_not_qualify() {
        let mut anonymous = evaluatee(9, "바사원", "사원", Some(10.0));
        anonymous.id = None;
        let templates = vec![
            template(1, vec![evaluatee(5, "마신입", "사원", Some(99.0)), anonymous.clone()]),
            template(2, vec![anonymous]),
        ];
        assert!(extract_top_candidates(&templates, 3).is_empty());
    }

    #[test]
    fn growth_is_rounded_to_two_decimals() {
        let templates = vec![
            template(1, vec![evaluatee(1, "가사원", "사원", Some(60.0))]),
            template(2, vec![evaluatee(1, "가사원", "사원", Some(61.0))]),
            template(3, vec![evaluatee(1, "가사원", "사원", Some(60.0))]),
            template(4, vec![evaluatee(1, "가사원", "사원", Some(61.0))]),
        ];
        // Deltas 1, -1, 1 → 0.333...
        assert_eq!(extract_top_candidates(&templates, 3)[0].growth, 0.33);
    }

    #[test]
    fn prompt_lists_only_scored_items() {
        let top = extract_top_candidates(&history(), 1);
        let prompt = render_prompt(&top[0]);
        assert!(prompt.contains("이름: 가사원\n부서: 개발팀\n현재 직급: 주임\n전 분기 대비 성장률: 15%"));
        assert!(prompt.contains("[평가 항목 점수]\n- 업무 성과: 85점\n"));
        assert!(!prompt.contains("협업"));
    }

    #[tokio::test]
    async fn recommendations_combine_ranking_and_reply() {
        let generator = StubGenerator::always(
            r#"```json
{"core_competencies":["문제 해결","일정 관리"],"reason":"세 분기 연속 점수가 올랐습니다."}
```"#,
        );
        let results = recommend_promotions(&generator, &history()).await.unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(generator.prompts().len(), 3);
        assert_eq!(
            results[0],
            PromotionCandidate {
                name: "가사원".to_string(),
                department: "개발팀".to_string(),
                current_grade: "주임".to_string(),
                recommended_grade: "대리".to_string(),
                growth_rate: 15.0,
                core_competencies: vec!["문제 해결".to_string(), "일정 관리".to_string()],
                reason: "세 분기 연속 점수가 올랐습니다.".to_string(),
            }
        );
        assert_eq!(results[1].recommended_grade, "부장");
    }

    #[tokio::test]
    async fn unparseable_reply_is_malformed() {
        let generator = StubGenerator::always("추천 사유: 성실함");
        assert!(matches!(
            recommend_promotions(&generator, &history()).await,
            Err(AppError::MalformedOutput(_))
        ));
    }

    #[tokio::test]
    async fn no_history_needs_no_generation() {
        let results = recommend_promotions(&FailingGenerator, &[]).await.unwrap();
        assert!(results.is_empty());
    }
}
