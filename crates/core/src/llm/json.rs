/// Best-effort extraction of a JSON object from model text: strips Markdown
/// fences, otherwise takes the first '{' through the last '}'.
pub fn extract_json(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.starts_with("```") {
        let mut inner = trimmed;
        if let Some(after_first) = inner.splitn(2, '\n').nth(1) {
            inner = after_first;
        }
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
        return Some(inner.trim().to_string());
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(trimmed[start..=end].trim().to_string())
}

/// Deserializes a model reply into `T`, tolerating fenced or prose-wrapped
/// JSON.
pub fn parse_object<T: serde::de::DeserializeOwned>(text: &str) -> anyhow::Result<T> {
    let json_str = extract_json(text).unwrap_or_else(|| text.trim().to_string());
    serde_json::from_str(&json_str)
        .map_err(|e| anyhow::anyhow!("model output is not valid JSON for the expected schema: {e}"))
}
