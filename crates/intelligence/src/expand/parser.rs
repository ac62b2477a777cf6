//! Output parser for term-list expansion responses
//!
//! One term per line. Tolerant: blank lines and `#` comment lines are
//! skipped, list bullets and numbering are stripped.

/// Parse model output into at most `max_terms` expansion terms.
///
/// Returns an empty vec if no usable line is found (caller falls back to
/// the unexpanded query).
pub fn parse_terms(text: &str, max_terms: usize) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(strip_list_marker)
        .filter(|term| !term.is_empty())
        .take(max_terms)
        .map(str::to_string)
        .collect()
}

/// Drop a leading "-", "*", "•", "3." or "3)" list marker
fn strip_list_marker(line: &str) -> &str {
    for bullet in ['-', '*', '•'] {
        if let Some(rest) = line.strip_prefix(bullet) {
            if is_marker_end(rest) {
                return rest.trim();
            }
        }
    }

    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            if is_marker_end(rest) {
                return rest.trim();
            }
        }
    }
    line
}

fn is_marker_end(rest: &str) -> bool {
    rest.is_empty() || rest.starts_with(char::is_whitespace)
}
