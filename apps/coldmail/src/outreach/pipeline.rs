//! Outreach Pipeline — page text in, one email per extracted posting out.
//!
//! Flow: store.load → extractor.extract → for each posting: store.query(skills) →
//!       composer.compose(posting, links).
//!
//! Emails come back in extraction order. With the default concurrency of 1 postings are
//! drafted strictly one after another; higher values overlap the model calls through an
//! ordered buffer, so the order guarantee still holds.

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::outreach::composer::EmailComposer;
use crate::outreach::extractor::JobExtractor;
use crate::outreach::models::JobPosting;
use crate::outreach::PipelineError;
use crate::portfolio::{LinkStore, LoadOutcome};

/// What to do when one posting's email cannot be drafted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the run; emails already drafted are discarded.
    #[default]
    FailFast,
    /// Keep going; report the failed postings next to the drafted emails.
    BestEffort,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail_fast" | "fail-fast" => Ok(FailurePolicy::FailFast),
            "best_effort" | "best-effort" => Ok(FailurePolicy::BestEffort),
            other => Err(format!(
                "unknown failure policy '{other}' (expected fail_fast or best_effort)"
            )),
        }
    }
}

/// A posting that was skipped under `FailurePolicy::BestEffort`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostingFailure {
    /// Position of the posting in extraction order.
    pub index: usize,
    pub role: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub emails: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<PostingFailure>,
}

pub struct Pipeline {
    store: Arc<dyn LinkStore>,
    extractor: JobExtractor,
    composer: EmailComposer,
    concurrency: usize,
}

impl Pipeline {
    pub fn new(store: Arc<dyn LinkStore>, extractor: JobExtractor, composer: EmailComposer) -> Self {
        Self {
            store,
            extractor,
            composer,
            concurrency: 1,
        }
    }

    /// Maximum postings drafted at once. Values below 1 are treated as 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn store(&self) -> &dyn LinkStore {
        self.store.as_ref()
    }

    /// Runs the pipeline, aborting on the first failure of any step.
    pub async fn run(&self, text: &str) -> Result<Vec<String>, PipelineError> {
        let run_id = Uuid::new_v4();
        async {
            let postings = self.prepare(text).await?;
            let emails = stream::iter(self.drafts(&postings))
                .buffered(self.concurrency)
                .try_collect::<Vec<_>>()
                .await?;

            info!(emails = emails.len(), "Pipeline run complete");
            Ok::<_, PipelineError>(emails)
        }
        .instrument(info_span!("pipeline_run", %run_id, policy = "fail_fast"))
        .await
    }

    /// Runs the pipeline, skipping postings whose retrieval or composition fails.
    /// Store load and extraction failures still abort the run.
    pub async fn run_best_effort(&self, text: &str) -> Result<PipelineReport, PipelineError> {
        let run_id = Uuid::new_v4();
        async {
            let postings = self.prepare(text).await?;
            let results: Vec<Result<String, PipelineError>> =
                stream::iter(self.drafts(&postings))
                    .buffered(self.concurrency)
                    .collect()
                    .await;

            let mut report = PipelineReport::default();
            for (index, (posting, result)) in postings.iter().zip(results).enumerate() {
                match result {
                    Ok(email) => report.emails.push(email),
                    Err(e) => {
                        warn!(index, role = posting.role_label(), error = %e, "Skipping posting");
                        report.failures.push(PostingFailure {
                            index,
                            role: posting.role_label().to_string(),
                            message: e.to_string(),
                        });
                    }
                }
            }

            info!(
                emails = report.emails.len(),
                failures = report.failures.len(),
                "Pipeline run complete"
            );
            Ok::<_, PipelineError>(report)
        }
        .instrument(info_span!("pipeline_run", %run_id, policy = "best_effort"))
        .await
    }

    pub async fn run_with_policy(
        &self,
        text: &str,
        policy: FailurePolicy,
    ) -> Result<PipelineReport, PipelineError> {
        match policy {
            FailurePolicy::FailFast => self.run(text).await.map(|emails| PipelineReport {
                emails,
                failures: Vec::new(),
            }),
            FailurePolicy::BestEffort => self.run_best_effort(text).await,
        }
    }

    async fn prepare(&self, text: &str) -> Result<Vec<JobPosting>, PipelineError> {
        match self.store.load().await? {
            LoadOutcome::Loaded { records } => info!(records, "Portfolio loaded"),
            LoadOutcome::AlreadyLoaded => debug!("Portfolio already loaded"),
        }

        let postings = self.extractor.extract(text).await?;
        info!(jobs_count = postings.len(), "Jobs extracted");
        Ok(postings)
    }

    /// One unstarted draft future per posting, in extraction order.
    ///
    /// Collected before streaming: a `map` closure over borrowed postings makes the
    /// run future fail axum's `Send` check for handlers.
    fn drafts<'a>(
        &'a self,
        postings: &'a [JobPosting],
    ) -> Vec<impl Future<Output = Result<String, PipelineError>> + 'a> {
        postings
            .iter()
            .enumerate()
            .map(|(index, posting)| self.draft(index, posting))
            .collect()
    }

    async fn draft(&self, index: usize, posting: &JobPosting) -> Result<String, PipelineError> {
        let skills = posting.skills();
        debug!(index, ?skills, "Querying portfolio links");
        let links = self.store.query(skills)?;
        debug!(index, ?links, "Links retrieved");

        info!(index, role = posting.role_label(), "Generating email for job");
        Ok(self.composer.compose(posting, &links).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::llm_client::testing::{api_error, FnModel, ScriptedModel};
    use crate::llm_client::{ChatModel, LlmError};
    use crate::outreach::composer::Persona;
    use crate::outreach::ExtractionError;
    use crate::portfolio::{PortfolioRecord, PortfolioStore, StoreError};

    const EXTRACTION_MARKER: &str = "### SCRAPED TEXT FROM WEBSITE:";

    fn store() -> Arc<PortfolioStore> {
        Arc::new(PortfolioStore::from_records(vec![
            PortfolioRecord::from_techstack("Python", "L1"),
            PortfolioRecord::from_techstack("React, TypeScript", "L2"),
        ]))
    }

    fn pipeline_with(model: Arc<dyn ChatModel>, store: Arc<dyn LinkStore>) -> Pipeline {
        Pipeline::new(
            store,
            JobExtractor::new(model.clone()),
            EmailComposer::new(model, Persona::default()),
        )
    }

    /// Returns `postings` for extraction prompts and echoes composition prompts back.
    fn echo_model(postings: &'static str) -> Arc<dyn ChatModel> {
        Arc::new(FnModel(move |prompt: &str| {
            if prompt.starts_with(EXTRACTION_MARKER) {
                Ok(postings.to_string())
            } else {
                Ok(prompt.to_string())
            }
        }))
    }

    /// Composition replies arrive slower for earlier postings.
    struct StaggeredModel {
        postings: &'static str,
    }

    #[async_trait]
    impl ChatModel for StaggeredModel {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            if prompt.starts_with(EXTRACTION_MARKER) {
                return Ok(self.postings.to_string());
            }
            let (delay, name) = if prompt.contains("\"role\": \"First\"") {
                (300, "first")
            } else if prompt.contains("\"role\": \"Second\"") {
                (200, "second")
            } else {
                (100, "third")
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(format!("email for {name}"))
        }
    }

    const THREE_POSTINGS: &str =
        r#"[{"role": "First"}, {"role": "Second"}, {"role": "Third"}]"#;

    #[tokio::test]
    async fn test_single_posting_references_role_and_matching_link() {
        let pipeline = pipeline_with(
            echo_model(
                r#"{"role": "Software Engineer", "experience": "3 years",
                    "skills": ["Python", "AWS"], "description": "..."}"#,
            ),
            store(),
        );

        let emails = pipeline.run("careers page text").await.unwrap();

        assert_eq!(emails.len(), 1);
        assert!(emails[0].contains("Software Engineer"));
        assert!(emails[0].contains("L1"));
        assert!(!emails[0].contains("L2"));
    }

    #[tokio::test]
    async fn test_emails_follow_extraction_order() {
        let pipeline = pipeline_with(echo_model(THREE_POSTINGS), store());

        let emails = pipeline.run("careers page text").await.unwrap();

        assert_eq!(emails.len(), 3);
        assert!(emails[0].contains("\"First\""));
        assert!(emails[1].contains("\"Second\""));
        assert!(emails[2].contains("\"Third\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_drafting_keeps_extraction_order() {
        let pipeline = pipeline_with(
            Arc::new(StaggeredModel {
                postings: THREE_POSTINGS,
            }),
            store(),
        )
        .with_concurrency(3);

        let emails = pipeline.run("careers page text").await.unwrap();

        assert_eq!(
            emails,
            vec!["email for first", "email for second", "email for third"]
        );
    }

    #[tokio::test]
    async fn test_runs_can_be_spawned_onto_the_runtime() {
        let pipeline = Arc::new(pipeline_with(echo_model(THREE_POSTINGS), store()).with_concurrency(2));
        let text = "careers page text".to_string();

        let fail_fast = tokio::spawn({
            let pipeline = pipeline.clone();
            let text = text.clone();
            async move { pipeline.run_with_policy(&text, FailurePolicy::FailFast).await }
        });
        let best_effort = tokio::spawn(async move {
            pipeline.run_with_policy(&text, FailurePolicy::BestEffort).await
        });

        let fail_fast = fail_fast.await.unwrap().unwrap();
        let best_effort = best_effort.await.unwrap().unwrap();
        assert_eq!(fail_fast.emails.len(), 3);
        assert_eq!(fail_fast.emails, best_effort.emails);
    }

    #[tokio::test]
    async fn test_posting_without_skills_gets_no_links() {
        let pipeline = pipeline_with(echo_model(r#"[{"role": "Designer"}]"#), store());

        let emails = pipeline.run("careers page text").await.unwrap();

        assert!(emails[0].contains("portfolio: []"));
    }

    #[tokio::test]
    async fn test_no_postings_means_no_emails() {
        let model = Arc::new(ScriptedModel::replying("[]"));
        let pipeline = pipeline_with(model.clone(), store());

        let emails = pipeline.run("").await.unwrap();

        assert!(emails.is_empty());
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_second_composition_failure_aborts_fail_fast_run() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(r#"[{"role": "A", "skills": ["Python"]}, {"role": "B"}]"#.to_string()),
            Ok("email for A".to_string()),
            Err(api_error(500, "model overloaded")),
        ]));
        let pipeline = pipeline_with(model.clone(), store());

        let err = pipeline.run("careers page text").await.unwrap_err();

        match err {
            PipelineError::Composition(e) => assert_eq!(e.role(), "B"),
            other => panic!("expected composition error, got {other:?}"),
        }
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn test_second_composition_failure_is_reported_best_effort() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok(r#"[{"role": "A", "skills": ["Python"]}, {"role": "B"}]"#.to_string()),
            Ok("email for A".to_string()),
            Err(api_error(500, "model overloaded")),
        ]));
        let pipeline = pipeline_with(model, store());

        let report = pipeline
            .run_with_policy("careers page text", FailurePolicy::BestEffort)
            .await
            .unwrap();

        assert_eq!(report.emails, vec!["email for A"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.failures[0].role, "B");
        assert!(report.failures[0].message.contains("model overloaded"));
    }

    #[tokio::test]
    async fn test_extraction_failure_aborts_before_composition() {
        let model = Arc::new(ScriptedModel::new(vec![
            Ok("not json at all".to_string()),
            Ok("unused".to_string()),
        ]));
        let pipeline = pipeline_with(model.clone(), store());

        let err = pipeline
            .run_with_policy("careers page text", FailurePolicy::BestEffort)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Extraction(ExtractionError::Unparseable)
        ));
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_store_aborts_before_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Arc::new(PortfolioStore::from_csv(dir.path().join("missing.csv")));
        let model = Arc::new(ScriptedModel::replying("[]"));
        let pipeline = pipeline_with(model.clone(), missing);

        let err = pipeline.run("careers page text").await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Store(StoreError::Unavailable { .. })
        ));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_repeated_runs_reuse_loaded_store() {
        let shared = store();
        let pipeline = pipeline_with(echo_model(r#"{"role": "X", "skills": ["Python"]}"#), shared.clone());

        let first = pipeline.run("page").await.unwrap();
        let second = pipeline.run("page").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(shared.record_count(), 2);
    }

    #[test]
    fn test_failure_policy_parses_config_values() {
        assert_eq!("fail_fast".parse::<FailurePolicy>().unwrap(), FailurePolicy::FailFast);
        assert_eq!("Best-Effort".parse::<FailurePolicy>().unwrap(), FailurePolicy::BestEffort);
        assert!("sometimes".parse::<FailurePolicy>().is_err());
    }
}
