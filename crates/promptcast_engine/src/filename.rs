/// Default number of prompt characters considered for a filename.
pub const DEFAULT_PREFIX_LEN: usize = 30;

const EMPTY_FRAGMENT: &str = "image";

/// Artifact filename: `{disambiguator}_{sanitized prompt prefix}.png`.
pub fn artifact_filename(disambiguator: &str, prompt: &str, prefix_len: usize) -> String {
    let fragment = sanitize_prompt_prefix(prompt, prefix_len);
    format!("{disambiguator}_{fragment}.png")
}

/// Keeps only `[A-Za-z0-9 _-]` from the first `prefix_len` characters of the
/// prompt, trimmed. Falls back to `image` when nothing survives.
pub fn sanitize_prompt_prefix(prompt: &str, prefix_len: usize) -> String {
    let kept: String = prompt
        .chars()
        .take(prefix_len)
        .filter(|c| is_allowed(*c))
        .collect();
    let trimmed = kept.trim();
    if trimmed.is_empty() {
        EMPTY_FRAGMENT.to_string()
    } else {
        trimmed.to_string()
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-')
}
