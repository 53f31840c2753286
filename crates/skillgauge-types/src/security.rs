use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of a single finding. Variant order is the escalation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => f.write_str("LOW"),
            Self::Medium => f.write_str("MEDIUM"),
            Self::High => f.write_str("HIGH"),
            Self::Critical => f.write_str("CRITICAL"),
        }
    }
}

/// Aggregate risk of a document. Variant order is the escalation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl From<Severity> for RiskLevel {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Low => Self::Low,
            Severity::Medium => Self::Medium,
            Severity::High => Self::High,
            Severity::Critical => Self::Critical,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Install recommendation derived from the merged risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recommendation {
    Install,
    Review,
    Reject,
}

impl Recommendation {
    /// INSTALL for SAFE/LOW, REVIEW for MEDIUM, REJECT for HIGH/CRITICAL.
    pub fn from_risk(risk: RiskLevel) -> Self {
        match risk {
            RiskLevel::Safe | RiskLevel::Low => Self::Install,
            RiskLevel::Medium => Self::Review,
            RiskLevel::High | RiskLevel::Critical => Self::Reject,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Install => "INSTALL",
            Self::Review => "REVIEW",
            Self::Reject => "REJECT",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Which detector produced a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingSource {
    /// Deterministic content-signature match.
    Pattern,
    /// Probabilistic service-based analysis.
    Model,
}

/// Category of a security finding.
///
/// The pattern catalog emits the fixed variants; model findings arrive as
/// free text and are mapped onto a variant where a keyword is recognizable,
/// falling back to `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FindingCategory {
    SensitiveFileAccess,
    Exfiltration,
    PromptInjection,
    InsecureCrypto,
    VulnerabilityInjection,
    Deception,
    SuppressedWarnings,
    Other(String),
}

impl FindingCategory {
    pub fn label(&self) -> &str {
        match self {
            Self::SensitiveFileAccess => "sensitive_file_access",
            Self::Exfiltration => "exfiltration",
            Self::PromptInjection => "prompt_injection",
            Self::InsecureCrypto => "insecure_crypto",
            Self::VulnerabilityInjection => "vulnerability_injection",
            Self::Deception => "deception",
            Self::SuppressedWarnings => "suppressed_warnings",
            Self::Other(raw) => raw,
        }
    }

    /// Pattern-detector hits in these categories are ground truth: one match
    /// forces the merged result to CRITICAL / REJECT.
    pub fn is_critical_class(&self) -> bool {
        matches!(self, Self::Exfiltration | Self::PromptInjection)
    }
}

impl From<String> for FindingCategory {
    fn from(raw: String) -> Self {
        let lower = raw.to_lowercase();
        if lower.contains("exfil") || lower.contains("leak") || lower.contains("data theft") {
            Self::Exfiltration
        } else if lower.contains("injection") && lower.contains("prompt") {
            Self::PromptInjection
        } else if lower.contains("sensitive") || lower.contains("credential") {
            Self::SensitiveFileAccess
        } else if lower.contains("crypto") || lower.contains("hash") {
            Self::InsecureCrypto
        } else if lower.contains("vulnerab") || lower.contains("backdoor") {
            Self::VulnerabilityInjection
        } else if lower.contains("decep") || lower.contains("social") || lower.contains("mislead")
        {
            Self::Deception
        } else if lower.contains("warn") || lower.contains("suppress") {
            Self::SuppressedWarnings
        } else {
            Self::Other(raw)
        }
    }
}

impl From<FindingCategory> for String {
    fn from(category: FindingCategory) -> Self {
        category.label().to_string()
    }
}

impl std::fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One detected security issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityFinding {
    pub source: FindingSource,
    pub category: FindingCategory,
    pub description: String,
    /// Quoted fragment of the document that triggered the finding.
    pub evidence: String,
    pub severity: Severity,
}

/// Merged scan outcome for one document.
///
/// `risk_level` and `recommendation` are computed by [`ScanResult::from_findings`]
/// only; neither detector asserts them directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub id: Uuid,
    pub doc_key: String,
    pub findings: Vec<SecurityFinding>,
    pub risk_level: RiskLevel,
    pub recommendation: Recommendation,
    #[serde(default)]
    pub summary: String,
    pub scanned_at: DateTime<Utc>,
}

impl ScanResult {
    /// Merge policy over all findings from both detectors.
    ///
    /// Order-independent: risk is the maximum severity across findings, and
    /// any critical-class pattern hit forces CRITICAL / REJECT regardless of
    /// what the model detector returned.
    pub fn from_findings(
        doc_key: impl Into<String>,
        findings: Vec<SecurityFinding>,
        summary: String,
    ) -> Self {
        let max_severity = findings.iter().map(|f| f.severity).max();
        let mut risk_level = max_severity.map(RiskLevel::from).unwrap_or(RiskLevel::Safe);

        let forced_critical = findings
            .iter()
            .any(|f| f.source == FindingSource::Pattern && f.category.is_critical_class());
        if forced_critical {
            risk_level = RiskLevel::Critical;
        }

        Self {
            id: Uuid::new_v4(),
            doc_key: doc_key.into(),
            findings,
            risk_level,
            recommendation: Recommendation::from_risk(risk_level),
            summary,
            scanned_at: Utc::now(),
        }
    }

    pub fn pattern_hits(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.source == FindingSource::Pattern)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(source: FindingSource, category: FindingCategory, severity: Severity) -> SecurityFinding {
        SecurityFinding {
            source,
            category,
            description: "test".into(),
            evidence: String::new(),
            severity,
        }
    }

    #[test]
    fn severity_escalation_order() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
        assert!(RiskLevel::Safe < RiskLevel::Critical);
    }

    #[test]
    fn no_findings_is_safe_install() {
        let scan = ScanResult::from_findings("demo", vec![], String::new());
        assert_eq!(scan.risk_level, RiskLevel::Safe);
        assert_eq!(scan.recommendation, Recommendation::Install);
    }

    #[test]
    fn risk_is_max_severity_across_sources() {
        let scan = ScanResult::from_findings(
            "demo",
            vec![
                finding(FindingSource::Model, FindingCategory::Deception, Severity::Low),
                finding(
                    FindingSource::Model,
                    FindingCategory::InsecureCrypto,
                    Severity::High,
                ),
            ],
            String::new(),
        );
        assert_eq!(scan.risk_level, RiskLevel::High);
        assert_eq!(scan.recommendation, Recommendation::Reject);
    }

    #[test]
    fn critical_class_pattern_hit_forces_reject() {
        // Even a lone MEDIUM-severity pattern hit escalates when the
        // category is critical-class.
        let scan = ScanResult::from_findings(
            "demo",
            vec![finding(
                FindingSource::Pattern,
                FindingCategory::Exfiltration,
                Severity::Medium,
            )],
            String::new(),
        );
        assert_eq!(scan.risk_level, RiskLevel::Critical);
        assert_eq!(scan.recommendation, Recommendation::Reject);
    }

    #[test]
    fn model_critical_category_does_not_force() {
        // The override applies to pattern hits only; a model finding in the
        // same category contributes through its severity alone.
        let scan = ScanResult::from_findings(
            "demo",
            vec![finding(
                FindingSource::Model,
                FindingCategory::Exfiltration,
                Severity::Medium,
            )],
            String::new(),
        );
        assert_eq!(scan.risk_level, RiskLevel::Medium);
        assert_eq!(scan.recommendation, Recommendation::Review);
    }

    #[test]
    fn recommendation_bands() {
        assert_eq!(Recommendation::from_risk(RiskLevel::Safe), Recommendation::Install);
        assert_eq!(Recommendation::from_risk(RiskLevel::Low), Recommendation::Install);
        assert_eq!(Recommendation::from_risk(RiskLevel::Medium), Recommendation::Review);
        assert_eq!(Recommendation::from_risk(RiskLevel::High), Recommendation::Reject);
        assert_eq!(Recommendation::from_risk(RiskLevel::Critical), Recommendation::Reject);
    }

    #[test]
    fn category_parses_free_text() {
        assert_eq!(
            FindingCategory::from("Data Exfiltration Attempt".to_string()),
            FindingCategory::Exfiltration
        );
        assert_eq!(
            FindingCategory::from("prompt injection".to_string()),
            FindingCategory::PromptInjection
        );
        assert!(matches!(
            FindingCategory::from("quantum nonsense".to_string()),
            FindingCategory::Other(_)
        ));
    }

    #[test]
    fn category_serde_roundtrip() {
        let json = serde_json::to_string(&FindingCategory::Exfiltration).unwrap();
        assert_eq!(json, "\"exfiltration\"");
        let back: FindingCategory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FindingCategory::Exfiltration);
    }
}
