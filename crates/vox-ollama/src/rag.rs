//! Prompt construction for grounded answers.

use vox_core::Chunk;

/// Build the RAG prompt with context.
pub fn build_rag_prompt(question: &str, context: &[Chunk]) -> String {
    let mut prompt = String::new();

    prompt.push_str("Context:\n");
    for (i, chunk) in context.iter().enumerate() {
        prompt.push_str(&format!("\n[{}] From: {}\n", i + 1, chunk.document_id));
        prompt.push_str(chunk.text.trim());
        prompt.push('\n');
    }

    prompt.push_str(&format!("\nQuestion: {}\n\n", question.trim()));
    prompt.push_str("Answer:");

    prompt
}

/// Build the system prompt for RAG.
pub fn build_system_prompt() -> String {
    r#"You answer questions about uploaded documents, interviews and recordings using only the provided context.

Guidelines:
- Base your answers on the context provided
- If the context doesn't contain enough information, say so
- Be concise but thorough
- When relevant, cite the numbered excerpts your answer is based on
- Do not make up information not present in the context"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vox_core::SpanClass;

    #[test]
    fn test_build_rag_prompt() {
        let context = vec![
            Chunk::new("interview-1", SpanClass::Short, 0, "Q: pricing is too high.\n"),
            Chunk::new("interview-2", SpanClass::Short, 4, "A: we plan to lower prices."),
        ];

        let prompt = build_rag_prompt("What did users say about pricing?", &context);

        assert!(prompt.starts_with("Context:\n"));
        assert!(prompt.contains("[1] From: interview-1\nQ: pricing is too high.\n"));
        assert!(prompt.contains("[2] From: interview-2\nA: we plan to lower prices."));
        assert!(prompt.ends_with("Question: What did users say about pricing?\n\nAnswer:"));
    }
}
