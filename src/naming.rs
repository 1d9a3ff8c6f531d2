//! Lookup-key normalization shared by the indexer and the applier.

use heck::ToKebabCase;

/// Normalize a display name or attribute reference to a kebab-case key.
///
/// Case is folded before word splitting, so `"branD 5"` and `"bRand 5"` both
/// become `"brand-5"`. Returns `None` when nothing word-like remains.
pub fn normalize(name: &str) -> Option<String> {
    let key = name.to_lowercase().to_kebab_case();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}
