use crate::models::RetrievedChunk;
use crate::session::QaTurn;

/// Cap on annotated context characters per prompt. Retrieval order is by
/// descending similarity, so the lowest-similarity chunks fall off first.
pub const MAX_CONTEXT_CHARS: usize = 12_000;

const SYSTEM_INSTRUCTION: &str = "You are a helpful board game rules assistant.\n\n\
Answer the question based ONLY on the context provided below.\n\
If the answer is not in the context, say \"I don't know based on the provided rulebook.\"";

const CHUNK_DELIMITER: &str = "\n\n---\n\n";

/// Assemble a grounded prompt: fixed system instruction, retrieved chunks
/// in similarity order with their provenance, the conversation so far, and
/// the verbatim question.
pub fn format_rag_prompt(chunks: &[RetrievedChunk], history: &[QaTurn], question: &str) -> String {
    let mut context_parts: Vec<String> = Vec::new();
    let mut used_chars = 0usize;

    for chunk in chunks {
        let annotated = format!(
            "[Source: {} | Page: {}]\n{}",
            chunk.source, chunk.page, chunk.text
        );
        let cost = annotated.chars().count() + CHUNK_DELIMITER.len();
        if used_chars + cost > MAX_CONTEXT_CHARS && !context_parts.is_empty() {
            break;
        }
        used_chars += cost;
        context_parts.push(annotated);
    }

    let mut prompt = String::from(SYSTEM_INSTRUCTION);
    prompt.push_str("\n\nContext:\n");
    prompt.push_str(&context_parts.join(CHUNK_DELIMITER));

    if !history.is_empty() {
        prompt.push_str("\n\n---\n\nConversation so far:\n");
        for turn in history {
            prompt.push_str("Q: ");
            prompt.push_str(&turn.question);
            prompt.push_str("\nA: ");
            prompt.push_str(&turn.answer);
            prompt.push('\n');
        }
    }

    prompt.push_str("\n\n---\n\nQuestion: ");
    prompt.push_str(question);
    prompt.push_str("\nAnswer:");
    prompt
}
