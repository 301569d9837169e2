//! Balanced-brace extraction of JSON objects from raw LLM output.
//!
//! Models wrap JSON in prose or code fences more often than not, and a
//! greedy `{.*}` pattern breaks on nested braces. This scanner walks
//! the text with a bracket-depth counter, honoring string literals and
//! escapes, and returns the first complete `{...}` object.

/// Extract the first balanced `{...}` substring, if any.
///
/// Never panics; returns `None` when the text holds no complete object
/// (including the unterminated case).
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }

    None
}
