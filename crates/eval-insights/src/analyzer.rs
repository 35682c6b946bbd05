/// Violation analysis pipeline for one evaluation template.
///
/// Per request: chunk the guideline and build an ephemeral index (skipped for an empty
/// guideline), then for every manager group Format → Retrieve → Generate → Detect
/// anomalies → Merge. Groups run concurrently up to `concurrency`; reports come back in
/// template group order. Any fatal group error aborts the whole request.
use std::sync::Arc;

use eval_common::capability::{EmbeddingProvider, TextGenerator};
use futures::{StreamExt, TryStreamExt};
use sha2::{Digest, Sha256};
use tracing::{debug, info, info_span, Instrument};

use crate::anomaly::{detect_rank_anomalies, group_ranks};
use crate::chunker::ChunkConfig;
use crate::error::AppError;
use crate::format::format_group;
use crate::index::SemanticIndex;
use crate::model::{EvaluationGroup, EvaluationTemplate, GuideViolationReport};
use crate::report::merge_group_findings;
use crate::violation::ViolationGenerator;

#[derive(Clone)]
pub struct ViolationAnalyzer {
    generator: Arc<dyn TextGenerator>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunking: ChunkConfig,
    concurrency: usize,
}

impl ViolationAnalyzer {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        embedder: Arc<dyn EmbeddingProvider>,
        chunking: ChunkConfig,
        concurrency: usize,
    ) -> Self {
        Self {
            generator,
            embedder,
            chunking,
            concurrency: concurrency.max(1),
        }
    }

    /// Reports for every group of `template` that has at least one finding.
    pub async fn analyze(
        &self,
        template: &EvaluationTemplate,
        guide: &str,
    ) -> Result<Vec<GuideViolationReport>, AppError> {
        let span = info_span!(
            "violation_analysis",
            template_id = template.id,
            guide_digest = %guide_digest(guide),
        );
        self.analyze_template(template, guide).instrument(span).await
    }

    async fn analyze_template(
        &self,
        template: &EvaluationTemplate,
        guide: &str,
    ) -> Result<Vec<GuideViolationReport>, AppError> {
        let segments = self.chunking.split(guide);
        debug!(
            chunk_size = self.chunking.chunk_size(),
            overlap = self.chunking.overlap(),
            segments = segments.len(),
            "guideline chunked"
        );
        let index = if segments.is_empty() {
            info!("empty guideline, analysing without retrieval");
            None
        } else {
            Some(SemanticIndex::build(self.embedder.as_ref(), segments).await?)
        };

        let generator = ViolationGenerator::new(
            self.generator.as_ref(),
            self.embedder.as_ref(),
            index.as_ref(),
        );

        let pending: Vec<_> = template
            .evaluations
            .iter()
            .map(|group| analyze_group(&generator, template, group))
            .collect();
        let reports: Vec<Option<GuideViolationReport>> = futures::stream::iter(pending)
            .buffered(self.concurrency)
            .try_collect()
            .await?;

        let reports: Vec<GuideViolationReport> = reports.into_iter().flatten().collect();
        info!(
            groups = template.evaluations.len(),
            reports = reports.len(),
            violations = reports.iter().map(|r| r.violations().len()).sum::<usize>(),
            "violation analysis complete"
        );
        Ok(reports)
    }
}

async fn analyze_group(
    generator: &ViolationGenerator<'_>,
    template: &EvaluationTemplate,
    group: &EvaluationGroup,
) -> Result<Option<GuideViolationReport>, AppError> {
    let manager = group.manager_name.as_str();
    let text = format_group(group);
    let generated = generator.detect(manager, &text).await?;
    let anomalies = detect_rank_anomalies(&group_ranks(group));

    info!(
        manager,
        generated = generated.len(),
        anomalies = anomalies.len(),
        "group analysed"
    );
    Ok(merge_group_findings(template, group, generated, anomalies))
}

/// Short, stable fingerprint of the guideline for log correlation.
fn guide_digest(guide: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(guide.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    hash[..12].to_string()
}
