//! Recover a JSON object from free-form model output.
//!
//! Models asked for "JSON only" still wrap the object in markdown fences or
//! surround it with prose. [`extract_json_object`] strips fences first and
//! then falls back to the first balanced `{...}` span.

/// Returns the first JSON object candidate in `content`, or `None` when no
/// balanced object is present.
pub fn extract_json_object(content: &str) -> Option<&str> {
    let unfenced = strip_code_fence(content).unwrap_or(content);
    first_balanced_object(unfenced)
}

/// Body of the first ```` ```json ```` (or bare ```` ``` ````) block.
fn strip_code_fence(content: &str) -> Option<&str> {
    let start = content.find("```")?;
    let after_ticks = &content[start + 3..];
    let body_start = match after_ticks.find('\n') {
        Some(newline) if is_language_tag(&after_ticks[..newline]) => newline + 1,
        _ => 0,
    };
    let body = &after_ticks[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

fn is_language_tag(tag: &str) -> bool {
    let tag = tag.trim();
    tag.is_empty() || tag.chars().all(|c| c.is_ascii_alphanumeric())
}

fn first_balanced_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in content[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
