use crate::model::{EvaluationGroup, EvaluationTemplate, GuideViolationReport, ViolationRecord};

/// Combine both finding sources of one group: model findings first, then the rank
/// distribution findings. `None` when the group has nothing to report.
pub fn merge_group_findings(
    template: &EvaluationTemplate,
    group: &EvaluationGroup,
    generated: Vec<ViolationRecord>,
    anomalies: Vec<ViolationRecord>,
) -> Option<GuideViolationReport> {
    let mut violations = generated;
    violations.extend(anomalies);
    GuideViolationReport::from_findings(template, group, violations)
}
