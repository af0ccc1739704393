//! Answer synthesizer trait and an offline extractive implementation.

use async_trait::async_trait;
use tracing::debug;

use crate::context::EMPTY_CONTEXT_MARKER;
use crate::error::Result;

/// Answer returned by [`ExtractiveSynthesizer`] when nothing was retrieved.
pub const NO_RELEVANT_INFORMATION: &str = "No relevant information found.";

/// An external capability that turns prompts into natural-language text.
///
/// Implementations wrap a language model behind a single call. The pipeline
/// wraps every call in a timeout, so implementations need not enforce one.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Generate an answer from system instructions and a user prompt.
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Answers by quoting the retrieved context verbatim.
///
/// Needs no model: the answer is the context section of the user prompt, or
/// [`NO_RELEVANT_INFORMATION`] if the context is empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveSynthesizer;

#[async_trait]
impl Synthesizer for ExtractiveSynthesizer {
    async fn generate(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
        // Fragment text is whitespace-normalized, so the first delimiter ends the context.
        let context = match user_prompt.strip_prefix("Context:\n") {
            Some(rest) if rest.starts_with(EMPTY_CONTEXT_MARKER) => "",
            Some(rest) => {
                rest.split_once("\n\nQuestion: ").map(|(context, _)| context.trim()).unwrap_or_default()
            }
            None => "",
        };

        debug!(provider = "Extractive", context_len = context.len(), "synthesizing answer");

        if context.is_empty() || context == EMPTY_CONTEXT_MARKER {
            Ok(NO_RELEVANT_INFORMATION.to_string())
        } else {
            Ok(context.to_string())
        }
    }
}
