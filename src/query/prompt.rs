//! Grounding prompt assembly.

const PREAMBLE: &str = "You are a helpful AI assistant. Use the following context to answer the question.\nIf you cannot find the answer in the context, say so - do not make up information.";

/// Builds the prompt sent to the generation backend: instruction preamble,
/// retrieved context in distance order, then the user's question.
pub fn grounding_prompt(query: &str, context: &[String]) -> String {
    let context_block = context.join("\n\n");
    format!("{PREAMBLE}\n\nContext:\n{context_block}\n\nQuestion: {query}\n\nAnswer:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_context_in_order_and_query() {
        let context = vec!["first chunk".to_string(), "second chunk".to_string()];
        let prompt = grounding_prompt("what happened?", &context);

        let first = prompt.find("first chunk").unwrap();
        let second = prompt.find("second chunk").unwrap();
        assert!(first < second);
        assert!(prompt.contains("Question: what happened?"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn prompt_instructs_grounded_answers() {
        let prompt = grounding_prompt("q", &[]);
        assert!(prompt.contains("do not make up information"));
    }
}
