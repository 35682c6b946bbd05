/// Rank distribution rule: a manager who hands the same rank to nearly everyone is
/// flagged, independent of what the generation model says.
use crate::model::{EvaluationGroup, ViolationRecord};

/// Fewer ranked items than this are never flagged.
pub const MIN_RANKED_ITEMS: usize = 10;
/// Share of one label, in percent, at which the distribution is flagged.
pub const DOMINANT_SHARE_PERCENT: usize = 85;

pub const GROUP_WIDE_SUBJECT: &str = "전체";
pub const DISTRIBUTION_ITEM: &str = "평가자 등급 분포";

/// Rank labels of a group in evaluatee/item order; unranked items are skipped.
pub fn group_ranks(group: &EvaluationGroup) -> Vec<&str> {
    group
        .evaluatees
        .iter()
        .flat_map(|e| e.form_items.iter())
        .filter_map(|item| item.graded_rank())
        .collect()
}

/// One record per label whose share of `ranks` is at least 85%.
///
/// Labels are reported in first-seen order. The percentage in the reason is floored.
pub fn detect_rank_anomalies(ranks: &[&str]) -> Vec<ViolationRecord> {
    let total = ranks.len();
    if total < MIN_RANKED_ITEMS {
        return Vec::new();
    }

    let mut counts: Vec<(&str, usize)> = Vec::new();
    for &rank in ranks {
        match counts.iter_mut().find(|(label, _)| *label == rank) {
            Some((_, count)) => *count += 1,
            None => counts.push((rank, 1)),
        }
    }

    counts
        .into_iter()
        .filter(|&(_, count)| count * 100 >= total * DOMINANT_SHARE_PERCENT)
        .map(|(label, count)| ViolationRecord {
            evaluatee: GROUP_WIDE_SUBJECT.to_string(),
            item: DISTRIBUTION_ITEM.to_string(),
            reason: format!(
                "{label} 등급이 전체 항목의 {}%로 너무 많이 사용되었습니다.",
                count * 100 / total
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repeated(label: &'static str, n: usize) -> Vec<&'static str> {
        std::iter::repeat(label).take(n).collect()
    }

    #[test]
    fn below_minimum_is_never_flagged() {
        assert!(detect_rank_anomalies(&repeated("A", 9)).is_empty());
        assert!(detect_rank_anomalies(&[]).is_empty());
    }

    #[test]
    fn dominant_label_is_flagged_with_floor_percentage() {
        let mut ranks = repeated("A", 9);
        ranks.push("B");
        let records = detect_rank_anomalies(&ranks);
        assert_eq!(
            records,
            vec![ViolationRecord {
                evaluatee: "전체".to_string(),
                item: "평가자 등급 분포".to_string(),
                reason: "A 등급이 전체 항목의 90%로 너무 많이 사용되었습니다.".to_string(),
            }]
        );
    }

    #[test]
    fn even_split_is_not_flagged() {
        let mut ranks = repeated("A", 5);
        ranks.extend(repeated("B", 5));
        assert!(detect_rank_anomalies(&ranks).is_empty());
    }

    #[test]
    fn exact_threshold_is_flagged() {
        // 17 of 20 is exactly 85%.
        let mut ranks = repeated("S", 17);
        ranks.extend(repeated("A", 3));
        let records = detect_rank_anomalies(&ranks);
        assert_eq!(records.len(), 1);
        assert!(records[0].reason.contains("85%"));
    }

    #[test]
    fn percentage_is_floored() {
        // 11 of 12 is 91.66%.
        let mut ranks = repeated("S", 11);
        ranks.push("B");
        assert!(detect_rank_anomalies(&ranks)[0].reason.contains("91%"));
    }

    #[test]
    fn all_identical_reports_full_share() {
        let records = detect_rank_anomalies(&repeated("S", 12));
        assert_eq!(records.len(), 1);
        assert!(records[0].reason.starts_with("S 등급"));
        assert!(records[0].reason.contains("100%"));
    }
}
