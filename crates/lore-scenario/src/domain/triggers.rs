//! Keyword-triggered story card lookup.

use lore_core::model::StoryCard;

/// Cards whose triggers appear in `text` or whose name matches one of
/// `present`, in card order and without duplicates.
///
/// Matching is case-insensitive substring matching on trimmed, non-blank
/// triggers.
#[must_use]
pub fn triggered_cards<'a, S: AsRef<str>>(
    cards: &'a [StoryCard],
    text: &str,
    present: &[S],
) -> Vec<&'a StoryCard> {
    cards
        .iter()
        .filter(|card| {
            card.is_triggered_by(text) || present.iter().any(|name| card.has_name(name.as_ref()))
        })
        .collect()
}
