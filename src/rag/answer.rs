//! Grounded answering: retrieved context plus question, sent to an LLM.

use crate::llm::LLMClient;
use crate::rag::retriever::Retriever;
use crate::types::Result;
use crate::utils::toml_config::RagConfig;
use std::sync::Arc;
use tracing::{debug, info};

/// Build the answer prompt from joined context and the user's question.
pub fn build_prompt(context: &str, query: &str) -> String {
    format!(
        "Answer the question based on the context below:\n\nContext:\n{}\n\nQuestion: {}\nAnswer:",
        context, query
    )
}

/// Retrieval limits and generation budget for one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerSettings {
    pub top_k: usize,
    pub max_context_chars: usize,
    pub max_tokens: usize,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

impl AnswerSettings {
    pub fn from_config(config: &RagConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            max_context_chars: config.retrieval.max_context_chars,
            max_tokens: config.generation.max_tokens,
        }
    }
}

/// Retrieves context for a question and asks the LLM to answer from it.
pub struct AnswerEngine {
    retriever: Retriever,
    llm: Arc<dyn LLMClient>,
    settings: AnswerSettings,
}

impl AnswerEngine {
    pub fn new(retriever: Retriever, llm: Arc<dyn LLMClient>, settings: AnswerSettings) -> Self {
        Self {
            retriever,
            llm,
            settings,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn settings(&self) -> AnswerSettings {
        self.settings
    }

    /// Prompt that [`answer`](Self::answer) would send for `query`.
    pub async fn prompt_for(&self, query: &str) -> Result<String> {
        let context = self
            .retriever
            .retrieve(query, self.settings.top_k, self.settings.max_context_chars)
            .await?
            .join("\n");
        Ok(build_prompt(&context, query))
    }

    /// Answer `query` from retrieved context. The reply is trimmed.
    pub async fn answer(&self, query: &str) -> Result<String> {
        let prompt = self.prompt_for(query).await?;
        debug!(prompt_chars = prompt.chars().count(), "Built answer prompt");

        let answer = self.llm.generate(&prompt, self.settings.max_tokens).await?;
        info!(model = self.llm.model_name(), "Generated answer");
        Ok(answer.trim().to_string())
    }
}
