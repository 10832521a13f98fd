//! Prompt templates for document analysis

/// Prompt builder for analysis requests
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the analysis prompt. `text` is embedded as given; truncate it first.
    pub fn build_analysis_prompt(text: &str, query: &str) -> String {
        format!(
            r#"Analyze this text and answer the following query:
Text: {text}...
Query: {query}

Provide:
1. Direct answer to the query
2. Supporting evidence
3. Key findings
4. Limitations of the analysis
"#,
            text = text,
            query = query
        )
    }

    /// First `max_chars` characters of `text`, never splitting a character
    pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
        match text.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => &text[..byte_idx],
            None => text,
        }
    }
}
