//! Choice-select prompt for batch relevance scoring

/// Instructions sent as the system message.
///
/// The model answers with one `Doc: N, Relevance: S` line per passage.
pub const SYSTEM_PROMPT: &str = "\
You judge search results for a power systems and renewable energy \
knowledge base. A question and a numbered list of documents follow. \
Rate how well each document helps answer the question on a scale from \
0 to 10, where 0 means unrelated and 10 means it answers the question \
directly.

Answer with one line per document and nothing else:
Doc: 1, Relevance: 7
Doc: 2, Relevance: 0";

/// Messages for one batch; documents are numbered from 1 in slice order
pub fn build_rerank_messages(query: &str, passages: &[&str]) -> serde_json::Value {
    let documents: Vec<String> = passages
        .iter()
        .enumerate()
        .map(|(i, text)| format!("Document {}:\n{}", i + 1, text.trim()))
        .collect();
    let user_content = format!("Question: {}\n\n{}", query, documents.join("\n\n"));

    serde_json::json!([
        {"role": "system", "content": SYSTEM_PROMPT},
        {"role": "user", "content": user_content}
    ])
}
