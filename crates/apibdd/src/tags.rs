//! Tag normalisation and skip-tag matching.
//!
//! Tags are stored in `@tag` form, de-duplicated, in declaration order, so a
//! scenario's effective tag set is deterministic regardless of how the
//! feature file spelled them.

use std::collections::HashSet;

/// Tag that marks a scenario as skipped.
pub const IGNORE_TAG: &str = "@ignore";

/// Return `tag` trimmed and prefixed with `@`.
///
/// # Examples
/// ```
/// use apibdd::tags::normalise_tag;
///
/// assert_eq!(normalise_tag(" smoke "), "@smoke");
/// assert_eq!(normalise_tag("@smoke"), "@smoke");
/// ```
#[must_use]
pub fn normalise_tag(tag: &str) -> String {
    let trimmed = tag.trim();
    if trimmed.starts_with('@') {
        trimmed.to_string()
    } else {
        format!("@{trimmed}")
    }
}

/// Extend `target` with `additions`, preserving order and removing
/// duplicates. Both inputs may contain un-normalised values.
pub fn extend_tag_set(target: &mut Vec<String>, additions: &[String]) {
    for tag in target.iter_mut() {
        *tag = normalise_tag(tag);
    }

    let mut seen = HashSet::new();
    target.retain(|tag| seen.insert(tag.clone()));

    for tag in additions {
        let formatted = normalise_tag(tag);
        if seen.insert(formatted.clone()) {
            target.push(formatted);
        }
    }
}

/// Merge two tag sets into a new normalised, de-duplicated set.
///
/// # Examples
/// ```
/// use apibdd::tags::merge_tag_sets;
///
/// let feature = vec!["@api".to_string(), "slow".to_string()];
/// let scenario = vec!["api".to_string(), "@ignore".to_string()];
/// assert_eq!(merge_tag_sets(&feature, &scenario), ["@api", "@slow", "@ignore"]);
/// ```
#[must_use]
pub fn merge_tag_sets(base: &[String], additions: &[String]) -> Vec<String> {
    let mut merged = base.to_vec();
    extend_tag_set(&mut merged, additions);
    merged
}

/// Return the first tag in `tags` that matches one of `skip_tags`.
///
/// Matching ignores ASCII case, so `@Ignore` and `@IGNORE` both select the
/// ignore tag.
#[must_use]
pub fn find_skip_tag<'a>(tags: &'a [String], skip_tags: &[String]) -> Option<&'a str> {
    tags.iter()
        .find(|tag| {
            skip_tags
                .iter()
                .any(|skip| normalise_tag(skip).eq_ignore_ascii_case(&normalise_tag(tag)))
        })
        .map(String::as_str)
}
