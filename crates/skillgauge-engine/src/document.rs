//! Document construction
//!
//! Turns raw markdown into a [`SkillDocument`]: extracts a declared title
//! from YAML frontmatter (`name:`) or the first `#` heading, and classifies
//! the document type exactly once. The crawler/cache layer owns retrieval;
//! this module only normalizes what it is handed.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use skillgauge_types::SkillDocument;
use tracing::warn;

use crate::classify::classify;

/// Frontmatter fields we care about; unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct Frontmatter {
    name: Option<String>,
    #[allow(dead_code)]
    description: Option<String>,
}

fn frontmatter_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"^---\s*\n([\s\S]*?)\n---\s*\n").expect("frontmatter pattern must compile")
    })
}

fn heading_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?m)^#\s+(.+)$").expect("heading pattern must compile"))
}

/// Title declared in YAML frontmatter, if any.
fn frontmatter_title(content: &str) -> Option<String> {
    let captures = frontmatter_regex().captures(content)?;
    let yaml = captures.get(1)?.as_str();

    match serde_yaml::from_str::<Frontmatter>(yaml) {
        Ok(meta) => meta.name.filter(|name| !name.trim().is_empty()),
        Err(e) => {
            warn!("ignoring unparseable frontmatter: {e}");
            None
        }
    }
}

/// First `#` heading in the body, if any.
fn first_heading(content: &str) -> Option<String> {
    heading_regex()
        .captures(content)
        .map(|c| c[1].trim().to_string())
}

/// Build a normalized [`SkillDocument`] from raw markdown.
///
/// `key` is the stable identity (file stem or crawler-assigned name). The
/// declared title falls back from frontmatter to the first heading; a
/// document with neither keeps `title: None` and displays under its key.
pub fn build_document(key: impl Into<String>, content: impl Into<String>) -> SkillDocument {
    let key = key.into();
    let content = content.into();

    let title = frontmatter_title(&content).or_else(|| first_heading(&content));
    let doc_type = classify(&content);

    SkillDocument::new(key, title, content, doc_type)
}
