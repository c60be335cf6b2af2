//! Turns transcripts into answers: activation, knowledge base, language model.

pub mod activation;
pub mod knowledge;
pub mod llm;

use std::sync::Arc;

use crate::core::config::Config;
use crate::core::format::DisplayChunk;
use crate::core::session::{PresentationHandle, Session};

pub use activation::{Command, parse_command};
pub use knowledge::KnowledgeBase;
pub use llm::{AnswerError, LanguageModel};

pub const THINKING: &str = "Thinking...";
pub const APOLOGY: &str = "Sorry, I encountered an error while processing your request.";
pub const NOTHING_TO_REPEAT: &str = "I haven't answered anything yet. Ask me a question!";

pub struct Assistant {
    knowledge: KnowledgeBase,
    /// `None` runs in demo mode.
    model: Option<LanguageModel>,
}

impl Assistant {
    pub fn new(knowledge: KnowledgeBase, model: Option<LanguageModel>) -> Self {
        Self { knowledge, model }
    }

    pub fn from_config(config: &Config) -> Self {
        let knowledge = KnowledgeBase::load_or_empty(config.knowledge_path.as_deref());
        if knowledge.is_empty() {
            log::debug!("Knowledge base is empty; every question goes to the model");
        }
        let model = config
            .openai_config
            .clone()
            .map(|c| LanguageModel::new(c, config.model_id.clone()));
        if model.is_none() {
            log::info!("No API key configured; using demo answers");
        }
        Self::new(knowledge, model)
    }

    /// Answer from the knowledge base when it applies, else from the model.
    pub async fn answer(&self, question: &str) -> Result<String, AnswerError> {
        if let Some(answer) = self.knowledge.answer(question) {
            log::debug!("Answered from knowledge base");
            return Ok(answer);
        }
        match &self.model {
            Some(model) => model.complete(question).await,
            None => Ok(llm::demo_answer(question)),
        }
    }

    /// Handle one final transcript for `session`. Returns the started
    /// presentation, or `None` when the transcript did not address the assistant.
    pub async fn handle_transcript(
        &self,
        session: &Arc<Session>,
        transcript: &str,
    ) -> Option<PresentationHandle> {
        let text = transcript.trim();
        if text.is_empty() {
            return None;
        }
        session.note_activity();
        session.echo_transcript(text);

        let Some(command) = parse_command(text) else {
            log::debug!("session {}: no activation phrase in {:?}", session.id(), text);
            return None;
        };
        log::info!("session {}: {:?}", session.id(), command);

        let handle = match command {
            Command::Repeat => match session.last_answer() {
                Some(answer) => session.present_answer(&answer),
                None => session.present_chunks(vec![DisplayChunk::single(NOTHING_TO_REPEAT)]),
            },
            Command::Ask(question) => {
                session.show_status(THINKING);
                match self.answer(&question).await {
                    Ok(answer) => session.present_answer(&answer),
                    Err(e) => {
                        log::warn!("session {}: answer failed: {}", session.id(), e);
                        session.present_chunks(vec![DisplayChunk::single(APOLOGY)])
                    }
                }
            }
        };
        Some(handle)
    }
}
