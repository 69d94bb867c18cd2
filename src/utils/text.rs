/// Remove a surrounding Markdown code fence (```sql ... ```), if any
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };

    // Drop the info string (e.g. "sql", "googlesql") on the opening line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);
    body.trim().to_string()
}

/// Truncate to at most `max_chars` characters, appending "..." when cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_sql_fence() {
        assert_eq!(strip_code_fences("```sql\nSELECT 1;\n```"), "SELECT 1;");
        assert_eq!(strip_code_fences("  ```\nSELECT 2\n```  "), "SELECT 2");
    }

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(strip_code_fences("  SELECT 1  "), "SELECT 1");
    }

    #[test]
    fn unterminated_fence_keeps_body() {
        assert_eq!(strip_code_fences("```sql\nSELECT 3"), "SELECT 3");
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate_chars("héllo world", 5), "héllo...");
        assert_eq!(truncate_chars("short", 10), "short");
    }
}
