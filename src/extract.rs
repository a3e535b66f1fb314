const FENCE: &str = "```";

/// Isolates the JSON object embedded in a model reply.
///
/// Code fences (with or without a language tag) are removed wherever they
/// occur, then the span from the first `{` to the last `}` is taken. When no
/// such span exists the fence-stripped text is returned unchanged so that the
/// parser downstream reports a real syntax error.
pub fn extract_json(raw: &str) -> String {
    let stripped = strip_fences(raw.trim());
    let text = stripped.trim();
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => text[start..=end].to_string(),
        _ => text.to_string(),
    }
}

fn strip_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find(FENCE) {
        out.push_str(&rest[..idx]);
        rest = skip_fence_tail(&rest[idx + FENCE.len()..]);
    }
    out.push_str(rest);
    out
}

/// Drops an optional language tag and the line break that ends the fence line.
fn skip_fence_tail(after: &str) -> &str {
    let tag_len = after
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '+'))
        .unwrap_or(after.len());
    let after_tag = &after[tag_len..];
    let tag_ends_line = after_tag.is_empty() || after_tag.starts_with('\n') || after_tag.starts_with("\r\n");
    let rest = if tag_ends_line { after_tag } else { after };
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')).unwrap_or(rest)
}
