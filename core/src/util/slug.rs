//! Repository name derivation.
//!
//! The repo name must be a pure function of the objective so a re-invoked
//! run lands on the same repository and the idempotent host operations can
//! pick up where the previous run stopped.

const MAX_SLUG_LEN: usize = 40;

/// Derive a host-safe repository slug from a natural-language objective.
///
/// Rules:
/// 1. Lowercase
/// 2. Alphanumerics kept, everything else becomes `-`
/// 3. Consecutive separators collapse
/// 4. Leading/trailing separators stripped
/// 5. Maximum length 40 chars (cut at a separator where possible)
pub fn repo_slug(objective: &str) -> String {
    let mut slug = String::with_capacity(objective.len().min(MAX_SLUG_LEN));
    let mut last_dash = true;

    for ch in objective.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.extend(ch.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        if let Some(idx) = slug.rfind('-') {
            slug.truncate(idx);
        }
    }

    if slug.is_empty() {
        "autoforge-run".to_string()
    } else {
        slug
    }
}
