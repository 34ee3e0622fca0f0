//! Prompt assembly
//!
//! Two templates: a grounded one when retrieval found excerpts, and an
//! ungrounded one when it came back empty. Both carry a window of recent
//! conversation history so follow-up questions keep their context.

use crate::types::{response::preview_of, ConversationMessage, ScoredChunk};

/// How many trailing history messages are kept in the prompt
pub const HISTORY_WINDOW: usize = 6;

/// Assembles the final prompt sent to the generation backend
pub struct PromptAssembler;

impl PromptAssembler {
    /// Build the prompt for a question, the retrieved excerpts, and the
    /// conversation history
    pub fn assemble(
        question: &str,
        retrieved: &[ScoredChunk],
        history: &[ConversationMessage],
    ) -> String {
        let history_block = Self::build_history(history);

        if retrieved.is_empty() {
            Self::ungrounded_prompt(question, &history_block)
        } else {
            let context = Self::build_context(retrieved);
            Self::grounded_prompt(question, &context, &history_block)
        }
    }

    /// Format retrieved chunks as labelled excerpts
    pub fn build_context(retrieved: &[ScoredChunk]) -> String {
        retrieved
            .iter()
            .map(|result| {
                format!(
                    "[Source: {}]\n{}",
                    result.chunk.source_label(),
                    result.chunk.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }

    /// Render the last few history messages, one line each, with the
    /// content shortened to a preview
    fn build_history(history: &[ConversationMessage]) -> String {
        if history.is_empty() {
            return String::new();
        }

        let start = history.len().saturating_sub(HISTORY_WINDOW);
        let lines = history[start..]
            .iter()
            .map(|message| format!("{}: {}", message.role.label(), preview_of(&message.content)))
            .collect::<Vec<_>>()
            .join("\n");

        format!("\nHistorique de la conversation:\n{}\n", lines)
    }

    fn grounded_prompt(question: &str, context: &str, history_block: &str) -> String {
        format!(
            r#"Tu es l'assistant de l'université. Tu réponds aux questions des étudiants en t'appuyant UNIQUEMENT sur les extraits de documents fournis ci-dessous.

Règles importantes:
- Réponds en français de manière claire et concise
- Base-toi UNIQUEMENT sur les extraits fournis. Si l'information n'y figure pas, dis que tu ne peux pas répondre avec certitude et suggère de contacter le secrétariat
- Cite les documents utilisés (nom du fichier)
- Sois professionnel et bienveillant

Extraits de documents:
{context}
{history_block}
Question: {question}"#,
            context = context,
            history_block = history_block,
            question = question
        )
    }

    fn ungrounded_prompt(question: &str, history_block: &str) -> String {
        format!(
            r#"Tu es l'assistant de l'université. Aucun document de l'université ne correspond à cette question.

Règles importantes:
- Réponds en français de manière générale et prudente
- Précise qu'aucun document de l'université ne correspond à la question
- Suggère de contacter le secrétariat pour une réponse fiable
- Sois professionnel et bienveillant
{history_block}
Question: {question}"#,
            history_block = history_block,
            question = question
        )
    }
}
