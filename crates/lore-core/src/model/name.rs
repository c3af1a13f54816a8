//! Character and card name comparison.

/// Compares two names ignoring surrounding whitespace and case, using full
/// Unicode lowercasing so `Éowyn` and `éowyn` are the same name.
#[must_use]
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .eq(b.trim().chars().flat_map(char::to_lowercase))
}
