//! Skill type detection
//!
//! Self-contained: all guidance, steps, and examples live in one file.
//! Index: acts as a directory pointing to other rule/skill files.
//!
//! Classification is deterministic and side-effect free, and runs once per
//! document before scoring because it selects the rubric variant. An
//! inconclusive document defaults to self-contained, the stricter rubric.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use skillgauge_types::SkillType;

/// Phrases and reference shapes that mark a navigation/aggregator document.
const INDEX_SIGNALS: &[&str] = &[
    r"read individual rule files",
    r"rules/[\w-]+\.md",
    r"see.*\.md",
    r"refer to.*\.md",
    r"full compiled document",
    r"agents\.md",
    r"for detailed explanations",
    r"each rule file contains",
    r"rule categories",
    r"quick reference",
];

/// At least this many index signals classify a document as an index.
const INDEX_SIGNAL_THRESHOLD: usize = 2;
/// At least this many backtick-quoted `.md` references classify as an index.
const FILE_REF_THRESHOLD: usize = 3;

fn index_signal_regexes() -> &'static Vec<Regex> {
    static REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        INDEX_SIGNALS
            .iter()
            .map(|p| Regex::new(p).expect("index signal pattern must compile"))
            .collect()
    })
}

fn file_ref_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"`[\w/-]+\.md`").expect("file ref pattern must compile"))
}

fn code_block_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"```[\w]*\n").expect("code block pattern must compile"))
}

/// Classify a document's content as index or self-contained.
pub fn classify(content: &str) -> SkillType {
    let lower = content.to_lowercase();

    let index_hits = index_signal_regexes()
        .iter()
        .filter(|re| re.is_match(&lower))
        .count();
    let file_refs = file_ref_regex().find_iter(content).count();

    if index_hits >= INDEX_SIGNAL_THRESHOLD || file_refs >= FILE_REF_THRESHOLD {
        SkillType::Index
    } else {
        SkillType::SelfContained
    }
}

/// Classification with the signals that led to it, for reports.
#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub doc_type: SkillType,
    /// Index signal patterns that matched.
    pub index_signals: Vec<String>,
    /// First few backtick-quoted `.md` references found.
    pub file_references: Vec<String>,
    /// Number of fenced code blocks in the document.
    pub code_blocks: usize,
}

/// Classify and explain the decision.
pub fn explain(content: &str) -> ClassificationReport {
    let lower = content.to_lowercase();

    let index_signals = INDEX_SIGNALS
        .iter()
        .zip(index_signal_regexes())
        .filter(|(_, re)| re.is_match(&lower))
        .map(|(pattern, _)| (*pattern).to_string())
        .collect();

    let file_references = file_ref_regex()
        .find_iter(content)
        .take(5)
        .map(|m| m.as_str().to_string())
        .collect();

    ClassificationReport {
        doc_type: classify(content),
        index_signals,
        file_references,
        code_blocks: code_block_regex().find_iter(content).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_DOC: &str = "\
# Coding Rules

Quick reference for the rule set. Read individual rule files for details:

- `rules/naming.md` - naming conventions
- `rules/errors.md` - error handling
- `rules/testing.md` - test layout
";

    const SELF_CONTAINED_DOC: &str = "\
# Database Migration Safety

## Steps

1. Check the migration is reversible
2. Test locally before staging

## Example

```sql
ALTER TABLE users ADD COLUMN email_address VARCHAR(255);
```
";

    #[test]
    fn detects_index_document() {
        assert_eq!(classify(INDEX_DOC), SkillType::Index);
    }

    #[test]
    fn detects_self_contained_document() {
        assert_eq!(classify(SELF_CONTAINED_DOC), SkillType::SelfContained);
    }

    #[test]
    fn inconclusive_defaults_to_self_contained() {
        // No steps, no examples, one index signal: below both thresholds.
        let doc = "# Rules\n\nQuick reference for the team. Ask in chat for details.";
        assert_eq!(classify(doc), SkillType::SelfContained);
    }

    #[test]
    fn classification_is_stable() {
        for _ in 0..3 {
            assert_eq!(classify(INDEX_DOC), SkillType::Index);
        }
    }

    #[test]
    fn explain_reports_signals() {
        let report = explain(INDEX_DOC);
        assert_eq!(report.doc_type, SkillType::Index);
        assert!(report.index_signals.contains(&"quick reference".to_string()));
        assert_eq!(report.file_references.len(), 3);
        assert_eq!(report.code_blocks, 0);

        let report = explain(SELF_CONTAINED_DOC);
        assert_eq!(report.doc_type, SkillType::SelfContained);
        assert_eq!(report.code_blocks, 1);
    }
}
