//! Context assembly for answer synthesis.
//!
//! Turns ranked fragments into numbered, attributed blocks plus a parallel
//! list of [`Source`]s. Nothing here talks to the synthesizer.

use crate::document::{AssembledContext, ScoredFragment, Source};

/// Separator placed between context blocks.
pub const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// System instructions sent with every synthesis request.
pub const SYSTEM_PROMPT: &str = "You are a personal knowledge assistant. Answer the question \
using only the numbered notes in the context. Cite notes by their number, e.g. [1]. If the \
context is empty or does not contain the answer, say that no relevant information was found \
in the stored notes.";

/// Marker used in the user prompt when nothing was retrieved.
pub const EMPTY_CONTEXT_MARKER: &str = "(no stored notes matched this question)";

/// Formats ranked fragments into a context payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextAssembler {
    max_chars: Option<usize>,
}

impl ContextAssembler {
    /// An assembler with no length budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// An assembler that drops trailing blocks once the context would exceed `max_chars`.
    ///
    /// The highest-ranked block is always kept.
    pub fn with_max_chars(max_chars: Option<usize>) -> Self {
        Self { max_chars }
    }

    /// Build the context text and sources, preserving rank order.
    pub fn assemble(&self, scored: &[ScoredFragment], _question: &str) -> AssembledContext {
        let mut context_text = String::new();
        let mut sources = Vec::with_capacity(scored.len());

        for (index, item) in scored.iter().enumerate() {
            let block = format_block(index + 1, item);

            if let Some(max) = self.max_chars {
                let extra = if context_text.is_empty() { 0 } else { BLOCK_SEPARATOR.len() };
                let projected = context_text.chars().count() + extra + block.chars().count();
                if !sources.is_empty() && projected > max {
                    break;
                }
            }

            if !context_text.is_empty() {
                context_text.push_str(BLOCK_SEPARATOR);
            }
            context_text.push_str(&block);
            sources.push(Source {
                document_id: item.fragment.document_id.clone(),
                snippet: item.fragment.text.clone(),
                score: item.score,
            });
        }

        AssembledContext { context_text, sources }
    }
}

fn format_block(rank: usize, item: &ScoredFragment) -> String {
    format!(
        "[{rank}] document: {} | score: {:.3}\n{}",
        item.fragment.document_id, item.score, item.fragment.text
    )
}

/// Assemble without a length budget.
pub fn assemble(scored: &[ScoredFragment], question: &str) -> AssembledContext {
    ContextAssembler::new().assemble(scored, question)
}

/// Build the user prompt handed to the synthesizer.
pub fn build_user_prompt(question: &str, context: &AssembledContext) -> String {
    let context_text = if context.context_text.is_empty() {
        EMPTY_CONTEXT_MARKER
    } else {
        context.context_text.as_str()
    };
    format!("Context:\n{context_text}\n\nQuestion: {question}")
}
