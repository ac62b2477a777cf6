//! Prompt template for term-list query expansion

/// Expansion prompt; `{query}` and `{max_expansions}` are substituted.
pub const EXPANSION_PROMPT: &str = "\
You are a power systems and renewable energy expert.
Your task is to expand the user's query with related technical terms, synonyms, and acronyms.

User Query: {query}

Generate up to {max_expansions} related terms that would help find relevant \
information about this query.
Focus on:
1. Technical synonyms (e.g., \"PV\" for \"solar panels\")
2. Related acronyms (e.g., \"BESS\" for \"battery energy storage\")
3. Domain-specific terminology (e.g., \"MPPT\" for solar optimization)
4. Alternative phrasings of the same concept

Return ONLY the expansion terms, one per line, without explanations.
If the query is already very specific with technical terms, return fewer or no expansions.

Expansion terms:";

/// Fill in the expansion prompt
pub fn build_prompt(query: &str, max_expansions: usize) -> String {
    EXPANSION_PROMPT
        .replace("{max_expansions}", &max_expansions.to_string())
        .replace("{query}", query)
}

/// Build the messages array for an OpenAI-compatible chat completions request.
pub fn build_messages(prompt: &str) -> serde_json::Value {
    serde_json::json!([
        {"role": "user", "content": prompt}
    ])
}
