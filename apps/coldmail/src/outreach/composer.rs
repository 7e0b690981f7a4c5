//! Email Composer — writes one cold email for one posting in the configured persona.
//!
//! The model reply is returned verbatim. No retry and no post-processing.

use std::sync::Arc;

use tracing::{debug, info};

use crate::llm_client::prompts::NO_PREAMBLE_INSTRUCTION;
use crate::llm_client::{preview, ChatModel};
use crate::outreach::models::JobPosting;
use crate::outreach::prompts::{DEFAULT_COMPANY_PITCH, WRITE_EMAIL_PROMPT_TEMPLATE};
use crate::outreach::CompositionError;

/// Who the email is from.
#[derive(Debug, Clone, PartialEq)]
pub struct Persona {
    pub sender_name: String,
    pub sender_title: String,
    pub company_name: String,
    pub company_pitch: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            sender_name: "Praveen".to_string(),
            sender_title: "business development executive".to_string(),
            company_name: "XYZ".to_string(),
            company_pitch: DEFAULT_COMPANY_PITCH.to_string(),
        }
    }
}

pub struct EmailComposer {
    llm: Arc<dyn ChatModel>,
    persona: Persona,
}

impl EmailComposer {
    pub fn new(llm: Arc<dyn ChatModel>, persona: Persona) -> Self {
        Self { llm, persona }
    }

    pub async fn compose(
        &self,
        job: &JobPosting,
        links: &[String],
    ) -> Result<String, CompositionError> {
        info!(
            role = job.role_label(),
            skills = ?job.skills(),
            links_count = links.len(),
            "Invoking email composition"
        );

        let prompt = self.build_prompt(job, links)?;
        let email = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|source| CompositionError::Model {
                role: job.role_label().to_string(),
                source,
            })?;

        debug!(
            content_preview = %preview(&email, 300),
            "LLM email content preview"
        );
        Ok(email)
    }

    fn build_prompt(&self, job: &JobPosting, links: &[String]) -> Result<String, CompositionError> {
        let serialize_error = |source| CompositionError::Serialize {
            role: job.role_label().to_string(),
            source,
        };
        let job_description = serde_json::to_string_pretty(job).map_err(serialize_error)?;
        let link_list = serde_json::to_string(links).map_err(serialize_error)?;

        // Persona fields first so text from the posting is never re-scanned for placeholders.
        Ok(WRITE_EMAIL_PROMPT_TEMPLATE
            .replace("{sender_name}", &self.persona.sender_name)
            .replace("{sender_title}", &self.persona.sender_title)
            .replace("{company_pitch}", &self.persona.company_pitch)
            .replace("{company_name}", &self.persona.company_name)
            .replace("{no_preamble_instruction}", NO_PREAMBLE_INSTRUCTION)
            .replace("{link_list}", &link_list)
            .replace("{job_description}", &job_description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::{api_error, ScriptedModel};

    fn posting() -> JobPosting {
        JobPosting {
            role: Some("Software Engineer".to_string()),
            experience: Some("3 years".to_string()),
            skills: Some(vec!["Python".to_string(), "AWS".to_string()]),
            description: Some("Build data pipelines.".to_string()),
        }
    }

    fn links() -> Vec<String> {
        vec![
            "https://example.com/python-portfolio".to_string(),
            "https://example.com/aws-portfolio".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_reply_is_returned_verbatim() {
        let reply = "Subject: Scaling your data team\n\nDear Hiring Manager,\n...\n";
        let model = Arc::new(ScriptedModel::replying(reply));
        let composer = EmailComposer::new(model.clone(), Persona::default());

        let email = composer.compose(&posting(), &links()).await.unwrap();

        assert_eq!(email, reply);
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn test_prompt_embeds_job_links_and_persona() {
        let model = Arc::new(ScriptedModel::replying("email"));
        let persona = Persona {
            sender_name: "Asha".to_string(),
            sender_title: "account lead".to_string(),
            company_name: "Acme Labs".to_string(),
            company_pitch: "Acme Labs ships data platforms.".to_string(),
        };
        let composer = EmailComposer::new(model.clone(), persona);

        composer.compose(&posting(), &links()).await.unwrap();

        let prompt = &model.prompts()[0];
        assert!(prompt.contains("\"role\": \"Software Engineer\""));
        assert!(prompt.contains("\"Python\""));
        assert!(prompt.contains("https://example.com/python-portfolio"));
        assert!(prompt.contains("You are Asha, a account lead at Acme Labs."));
        assert!(prompt.contains("Acme Labs ships data platforms."));
        assert!(prompt.contains(NO_PREAMBLE_INSTRUCTION));
        assert!(!prompt.contains("{company_name}"));
    }

    #[tokio::test]
    async fn test_braces_in_posting_are_not_substituted() {
        let model = Arc::new(ScriptedModel::replying("email"));
        let composer = EmailComposer::new(model.clone(), Persona::default());
        let job = JobPosting {
            description: Some("Template literal {sender_name} in our docs".to_string()),
            ..posting()
        };

        composer.compose(&job, &[]).await.unwrap();

        assert!(model.prompts()[0].contains("Template literal {sender_name} in our docs"));
    }

    #[tokio::test]
    async fn test_model_failure_is_composition_error_with_role() {
        let model = Arc::new(ScriptedModel::new(vec![
            Err(api_error(500, "model overloaded")),
            Ok("never used".to_string()),
        ]));
        let composer = EmailComposer::new(model.clone(), Persona::default());

        let err = composer.compose(&posting(), &links()).await.unwrap_err();

        assert_eq!(err.role(), "Software Engineer");
        assert!(err.to_string().contains("model overloaded"));
        assert_eq!(model.calls(), 1);
    }
}
