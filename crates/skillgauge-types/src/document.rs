use serde::{Deserialize, Serialize};

/// Structural kind of a skill document, decided once at construction.
///
/// The two kinds are scored under different rubric variants: an index
/// document is a navigation layer over external rule files and is not
/// expected to carry inline steps or code examples of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillType {
    /// A complete standalone procedure: steps, examples, expected output.
    SelfContained,
    /// A pointer/aggregator document referencing other rule files.
    Index,
}

impl SkillType {
    /// Human-oriented label used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::SelfContained => "self-contained",
            Self::Index => "index",
        }
    }
}

impl std::fmt::Display for SkillType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A normalized skill document.
///
/// Immutable after construction: `doc_type` is inferred exactly once and the
/// content is never mutated afterwards. `key` is the stable identity used
/// for cache rows and for correlating batched service responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDocument {
    /// Stable identity key (file stem or crawler-assigned name).
    pub key: String,
    /// Declared title from frontmatter or first heading, if any.
    pub title: Option<String>,
    /// Full raw markdown content.
    pub content: String,
    /// Inferred document type.
    pub doc_type: SkillType,
}

impl SkillDocument {
    pub fn new(
        key: impl Into<String>,
        title: Option<String>,
        content: impl Into<String>,
        doc_type: SkillType,
    ) -> Self {
        Self {
            key: key.into(),
            title,
            content: content.into(),
            doc_type,
        }
    }

    /// Title if declared, otherwise the identity key.
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_key() {
        let doc = SkillDocument::new("db-migrations", None, "# x", SkillType::SelfContained);
        assert_eq!(doc.display_name(), "db-migrations");

        let doc = SkillDocument::new(
            "db-migrations",
            Some("Database Migration Safety".into()),
            "# x",
            SkillType::SelfContained,
        );
        assert_eq!(doc.display_name(), "Database Migration Safety");
    }

    #[test]
    fn skill_type_serde_uses_snake_case() {
        let json = serde_json::to_string(&SkillType::SelfContained).unwrap();
        assert_eq!(json, "\"self_contained\"");
        let back: SkillType = serde_json::from_str("\"index\"").unwrap();
        assert_eq!(back, SkillType::Index);
    }
}
