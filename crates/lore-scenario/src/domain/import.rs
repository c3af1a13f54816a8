//! Markdown scenario documents.
//!
//! A document is YAML front matter between `---` lines followed by a Markdown
//! body:
//!
//! ```text
//! ---
//! title: The Drowned Bell
//! tags: [mystery, coastal]
//! plot_essentials: The bell rings only for the guilty.
//! cards:
//!   - name: Mira
//!     type: character
//!     triggers: [innkeeper]
//! ---
//! Fog rolls over Saltmere as the bell tolls again.
//!
//! ## Card: Mira
//! The innkeeper of the Gull's Rest. She hears everything.
//! ```
//!
//! Body text before the first `## Card:` heading becomes the plot story.
//! Each `## Card: <Name>` section becomes a card whose entry is the section's
//! paragraph text; front matter cards with the same name supply the type,
//! triggers and notes.

use lore_core::error::DomainError;
use lore_core::model::{Plot, ScenarioStatus, same_name};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::commands::CardDraft;

const CARD_HEADING_PREFIX: &str = "Card:";

/// A parsed scenario document, ready to be persisted.
#[derive(Debug, Clone)]
pub struct ScenarioDocument {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub status: ScenarioStatus,
    pub plot: Plot,
    pub cards: Vec<CardDraft>,
    /// Hex SHA-256 of the raw document.
    pub source_hash: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FrontMatter {
    title: String,
    description: String,
    tags: Vec<String>,
    status: ScenarioStatus,
    ai_instructions: String,
    story_summary: String,
    plot_essentials: String,
    authors_note: String,
    third_person: bool,
    cards: Vec<CardDraft>,
}

#[derive(Debug)]
struct CardSection {
    name: String,
    paragraphs: Vec<String>,
}

/// Hex-encoded SHA-256 of a document.
#[must_use]
pub fn source_hash(source: &str) -> String {
    format!("{:x}", Sha256::digest(source.as_bytes()))
}

/// Parses a scenario document.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the front matter is missing,
/// unterminated or not valid YAML, or if it has no title.
pub fn parse_scenario_document(source: &str) -> Result<ScenarioDocument, DomainError> {
    let (yaml, body) = split_front_matter(source)?;
    let front: FrontMatter = serde_yaml::from_str(yaml)
        .map_err(|e| DomainError::Validation(format!("invalid front matter: {e}")))?;
    if front.title.trim().is_empty() {
        return Err(DomainError::Validation(
            "front matter must define a title".to_owned(),
        ));
    }

    let (story, sections) = parse_body(body);
    let cards = merge_cards(front.cards, sections);

    Ok(ScenarioDocument {
        title: front.title.trim().to_owned(),
        description: front.description,
        tags: front.tags,
        status: front.status,
        plot: Plot {
            story,
            ai_instructions: front.ai_instructions,
            story_summary: front.story_summary,
            plot_essentials: front.plot_essentials,
            authors_note: front.authors_note,
            third_person: front.third_person,
        },
        cards,
        source_hash: source_hash(source),
    })
}

fn split_front_matter(source: &str) -> Result<(&str, &str), DomainError> {
    let source = source.trim_start_matches('\u{feff}');
    let rest = source
        .strip_prefix("---")
        .and_then(|r| r.strip_prefix("\r\n").or_else(|| r.strip_prefix('\n')))
        .ok_or_else(|| {
            DomainError::Validation("document must start with YAML front matter".to_owned())
        })?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Ok((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err(DomainError::Validation(
        "front matter is not terminated by ---".to_owned(),
    ))
}

fn parse_body(body: &str) -> (String, Vec<CardSection>) {
    let mut story_end = body.len();
    let mut sections: Vec<CardSection> = Vec::new();
    let mut in_card = false;
    let mut heading: Option<(usize, String)> = None;
    let mut paragraph: Option<String> = None;

    for (event, range) in Parser::new(body).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H2,
                ..
            }) => heading = Some((range.start, String::new())),
            Event::End(TagEnd::Heading(HeadingLevel::H2)) => {
                let Some((start, text)) = heading.take() else {
                    continue;
                };
                match text.trim().strip_prefix(CARD_HEADING_PREFIX) {
                    Some(name) if !name.trim().is_empty() => {
                        if sections.is_empty() {
                            story_end = start;
                        }
                        sections.push(CardSection {
                            name: name.trim().to_owned(),
                            paragraphs: Vec::new(),
                        });
                        in_card = true;
                    }
                    _ => in_card = false,
                }
            }
            Event::Start(Tag::Paragraph) => paragraph = Some(String::new()),
            Event::End(TagEnd::Paragraph) => {
                if let (Some(text), true) = (paragraph.take(), in_card) {
                    if let Some(section) = sections.last_mut() {
                        section.paragraphs.push(text.trim().to_owned());
                    }
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, heading_text)) = heading.as_mut() {
                    heading_text.push_str(&text);
                } else if let Some(paragraph_text) = paragraph.as_mut() {
                    paragraph_text.push_str(&text);
                }
            }
            Event::SoftBreak => {
                if let Some(paragraph_text) = paragraph.as_mut() {
                    paragraph_text.push(' ');
                }
            }
            Event::HardBreak => {
                if let Some(paragraph_text) = paragraph.as_mut() {
                    paragraph_text.push('\n');
                }
            }
            _ => {}
        }
    }

    (body[..story_end].trim().to_owned(), sections)
}

fn merge_cards(mut declared: Vec<CardDraft>, sections: Vec<CardSection>) -> Vec<CardDraft> {
    let mut cards = Vec::with_capacity(declared.len() + sections.len());
    for section in sections {
        let entry = section.paragraphs.join("\n\n");
        let mut card = match declared
            .iter()
            .position(|d| same_name(&d.name, &section.name))
        {
            Some(index) => declared.remove(index),
            None => CardDraft {
                name: section.name.clone(),
                ..CardDraft::default()
            },
        };
        if !entry.is_empty() {
            card.entry = entry;
        }
        if card.triggers.is_empty() {
            card.triggers = vec![section.name];
        }
        cards.push(card);
    }
    cards.extend(declared);
    cards
}

#[cfg(test)]
mod tests {
    use lore_core::model::StoryCardType;

    use super::*;

    const DOCUMENT: &str = "---
title: The Drowned Bell
description: A coastal mystery
tags: [mystery, coastal]
status: published
plot_essentials: The bell rings only for the guilty.
cards:
  - name: Mira
    type: character
    triggers: [innkeeper, Mira]
  - name: Aria
    type: pc
    entry: A wandering cartographer.
---
Fog rolls over *Saltmere* as the bell tolls again.

## Card: Mira
The innkeeper of the Gull's Rest.
She hears everything.

Her brother drowned last spring.

## Card: The Bell Tower
A crooked tower on the cliffs.

## Author notes
This paragraph belongs to no card.
";

    #[test]
    fn test_parse_scenario_document_reads_front_matter_and_story() {
        // Act
        let doc = parse_scenario_document(DOCUMENT).unwrap();

        // Assert
        assert_eq!(doc.title, "The Drowned Bell");
        assert_eq!(doc.tags, vec!["mystery", "coastal"]);
        assert_eq!(doc.status, ScenarioStatus::Published);
        assert_eq!(
            doc.plot.story,
            "Fog rolls over *Saltmere* as the bell tolls again."
        );
        assert_eq!(
            doc.plot.plot_essentials,
            "The bell rings only for the guilty."
        );
        assert_eq!(doc.source_hash.len(), 64);
    }

    #[test]
    fn test_parse_scenario_document_merges_body_cards_with_front_matter() {
        // Act
        let doc = parse_scenario_document(DOCUMENT).unwrap();

        // Assert
        let names: Vec<&str> = doc.cards.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Mira", "The Bell Tower", "Aria"]);

        let mira = &doc.cards[0];
        assert_eq!(mira.card_type, StoryCardType::Character);
        assert_eq!(mira.triggers, vec!["innkeeper", "Mira"]);
        assert_eq!(
            mira.entry,
            "The innkeeper of the Gull's Rest. She hears everything.\n\nHer brother drowned last spring."
        );

        let tower = &doc.cards[1];
        assert_eq!(tower.card_type, StoryCardType::Custom);
        assert_eq!(tower.triggers, vec!["The Bell Tower"]);
        assert_eq!(tower.entry, "A crooked tower on the cliffs.");

        assert_eq!(doc.cards[2].card_type, StoryCardType::PlayingCharacter);
        assert_eq!(doc.cards[2].entry, "A wandering cartographer.");
    }

    #[test]
    fn test_parse_scenario_document_requires_front_matter() {
        let result = parse_scenario_document("# Just a heading\n");

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_parse_scenario_document_requires_title() {
        let result = parse_scenario_document("---\ndescription: untitled\n---\nBody\n");

        match result {
            Err(DomainError::Validation(msg)) => assert!(msg.contains("title")),
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_scenario_document_rejects_unterminated_front_matter() {
        let result = parse_scenario_document("---\ntitle: Open\nBody\n");

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_source_hash_is_stable_and_content_sensitive() {
        assert_eq!(source_hash("abc"), source_hash("abc"));
        assert_ne!(source_hash("abc"), source_hash("abd"));
        assert_eq!(
            source_hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
