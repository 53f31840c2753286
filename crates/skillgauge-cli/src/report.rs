//! Text report rendering
//!
//! Human-readable layouts for the four result objects. JSON output is just
//! the serialized result; everything here is presentation only.

use skillgauge_engine::{BatchAnalysis, Rubric, BUCKET_LABELS};
use skillgauge_types::{
    FindingSource, RankedSkill, ScanResult, ScoreResult, TechProfile, Tier, Verdict,
};

const RULE_HEAVY: &str =
    "==============================================================";
const RULE_LIGHT: &str =
    "--------------------------------------------------------------";

fn verdict_note(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Install => "recommended",
        Verdict::Maybe => "depends on your project",
        Verdict::Skip => "not recommended",
    }
}

fn score_bar(score: u8) -> String {
    let filled = usize::from(score) / 5;
    format!("{}{}", "#".repeat(filled), ".".repeat(20 - filled))
}

/// Quality evaluation report.
pub fn render_evaluation(name: &str, rubric: &Rubric, result: &ScoreResult) -> String {
    let mut lines = Vec::new();
    lines.push(RULE_HEAVY.to_string());
    lines.push(format!("  Skill quality report: {name}"));
    lines.push(RULE_HEAVY.to_string());
    lines.push(String::new());
    lines.push(format!(
        "  Weighted score:  {:.1} / 100",
        result.weighted_score
    ));
    lines.push(format!(
        "  Verdict:         {} ({})",
        result.verdict,
        verdict_note(result.verdict)
    ));
    lines.push(format!("  Document type:   {}", result.skill_type));
    lines.push(String::new());

    lines.push(RULE_LIGHT.to_string());
    lines.push("  Dimension scores".to_string());
    lines.push(RULE_LIGHT.to_string());
    for dim in rubric.dimensions() {
        let score = result.dimension_score(dim.key);
        lines.push(format!(
            "  {:<24} [{}] {:>3}/100  (weight {:.0}%)",
            dim.name,
            score_bar(score),
            score,
            dim.weight * 100.0
        ));
        if let Some(detail) = result.dimensions.get(dim.key) {
            for weakness in detail.weaknesses.iter().take(2) {
                lines.push(format!("    - {weakness}"));
            }
            for strength in detail.strengths.iter().take(1) {
                lines.push(format!("    + {strength}"));
            }
        }
        lines.push(String::new());
    }

    if !result.summary.is_empty() {
        lines.push(RULE_LIGHT.to_string());
        lines.push("  Overall".to_string());
        lines.push(RULE_LIGHT.to_string());
        lines.push(format!("  {}", result.summary));
        lines.push(String::new());
    }

    if !result.top_issues.is_empty() {
        lines.push(RULE_LIGHT.to_string());
        lines.push("  Top issues".to_string());
        lines.push(RULE_LIGHT.to_string());
        for (i, issue) in result.top_issues.iter().enumerate() {
            lines.push(format!("  {}. {issue}", i + 1));
        }
        lines.push(String::new());
    }

    let suggestions: Vec<&String> = rubric
        .dimensions()
        .iter()
        .filter_map(|dim| result.dimensions.get(dim.key))
        .flat_map(|detail| detail.suggestions.iter())
        .take(5)
        .collect();
    if !suggestions.is_empty() {
        lines.push(RULE_LIGHT.to_string());
        lines.push("  Suggestions".to_string());
        lines.push(RULE_LIGHT.to_string());
        for suggestion in suggestions {
            lines.push(format!("  > {suggestion}"));
        }
        lines.push(String::new());
    }

    lines.push(RULE_HEAVY.to_string());
    lines.push(String::new());
    lines.push("  Note: a high score reflects documentation quality, not usefulness".to_string());
    lines.push("  for your project. Run `skillgauge recommend` for stack-aware ranking.".to_string());
    lines.join("\n")
}

/// Security scan report.
pub fn render_scan(name: &str, scan: &ScanResult) -> String {
    let mut lines = Vec::new();
    lines.push(RULE_HEAVY.to_string());
    lines.push(format!("  Security scan report: {name}"));
    lines.push(RULE_HEAVY.to_string());
    lines.push(format!("  Risk level:      {}", scan.risk_level));
    lines.push(format!("  Recommendation:  {}", scan.recommendation));
    lines.push(format!(
        "  Findings:        {} total, {} from pattern matching",
        scan.findings.len(),
        scan.pattern_hits()
    ));
    if !scan.summary.is_empty() {
        lines.push(String::new());
        lines.push(format!("  {}", scan.summary));
    }

    if scan.findings.is_empty() {
        lines.push(String::new());
        lines.push("  No security issues found.".to_string());
    } else {
        lines.push(String::new());
        lines.push(RULE_LIGHT.to_string());
        lines.push("  Findings".to_string());
        lines.push(RULE_LIGHT.to_string());
        for finding in &scan.findings {
            let source = match finding.source {
                FindingSource::Pattern => "pattern",
                FindingSource::Model => "model",
            };
            lines.push(format!(
                "  [{}] {} ({source}) - {}",
                finding.severity, finding.category, finding.description
            ));
            if !finding.evidence.is_empty() {
                let evidence: String = finding.evidence.chars().take(100).collect();
                lines.push(format!("    >> {evidence}"));
            }
        }
    }

    lines.push(RULE_HEAVY.to_string());
    lines.join("\n")
}

fn tier_heading(tier: Tier) -> &'static str {
    match tier {
        Tier::MustInstall => "MUST INSTALL",
        Tier::Install => "INSTALL",
        Tier::Maybe => "MAYBE",
        Tier::Skip => "SKIP",
    }
}

/// Tiered recommendation report.
pub fn render_recommendations(
    profile: &TechProfile,
    ranked: &[RankedSkill],
    show_skip: bool,
) -> String {
    let mut lines = Vec::new();
    lines.push(RULE_HEAVY.to_string());
    lines.push("  Skill recommendations".to_string());
    lines.push(format!("  Stack:        {}", profile.stack));
    lines.push(format!("  Project type: {}", profile.project_type));
    lines.push(RULE_HEAVY.to_string());

    let count = |tier: Tier| ranked.iter().filter(|r| r.tier == tier).count();
    lines.push(String::new());
    lines.push(format!(
        "  {} candidates: {} must-install, {} install, {} maybe, {} skip",
        ranked.len(),
        count(Tier::MustInstall),
        count(Tier::Install),
        count(Tier::Maybe),
        count(Tier::Skip),
    ));

    let mut tiers = vec![Tier::MustInstall, Tier::Install, Tier::Maybe];
    if show_skip {
        tiers.push(Tier::Skip);
    }
    for tier in tiers {
        let entries: Vec<&RankedSkill> = ranked.iter().filter(|r| r.tier == tier).collect();
        if entries.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(RULE_LIGHT.to_string());
        lines.push(format!("  {}", tier_heading(tier)));
        lines.push(RULE_LIGHT.to_string());
        for entry in entries {
            lines.push(format!(
                "  {:<35} quality={:>5.1}  relevance={:>3}  composite={:>5.1}",
                entry.title, entry.quality, entry.relevance, entry.composite
            ));
            if !entry.reason.is_empty() {
                lines.push(format!("    -> {}", entry.reason));
            }
        }
    }

    lines.push(String::new());
    lines.push(RULE_HEAVY.to_string());
    lines.push(String::new());
    lines.push("  Tip: only high-relevance, high-quality skills are worth installing.".to_string());
    lines.push("  Generic topics (coding style, git conventions) are already covered;".to_string());
    lines.push("  prefer skills specific to your stack or team conventions.".to_string());
    lines.join("\n")
}

/// Distribution summary after a batch evaluation.
pub fn render_analysis(analysis: &BatchAnalysis) -> String {
    let mut lines = Vec::new();
    lines.push(RULE_HEAVY.to_string());
    lines.push("  Batch evaluation analysis".to_string());
    lines.push(RULE_HEAVY.to_string());
    lines.push(String::new());
    lines.push(format!("  Evaluated:  {}", analysis.count));
    lines.push(format!("  Mean score: {:.1}", analysis.mean));
    lines.push(format!("  Highest:    {:.1}", analysis.max));
    lines.push(format!("  Lowest:     {:.1}", analysis.min));

    lines.push(String::new());
    lines.push(RULE_LIGHT.to_string());
    lines.push("  Score distribution".to_string());
    lines.push(RULE_LIGHT.to_string());
    for (label, count) in BUCKET_LABELS.iter().zip(analysis.buckets) {
        lines.push(format!("  {label:>8}  {} {count}", "#".repeat(count)));
    }

    lines.push(String::new());
    lines.push(RULE_LIGHT.to_string());
    lines.push("  Verdicts".to_string());
    lines.push(RULE_LIGHT.to_string());
    let total = analysis.count.max(1);
    for (label, count) in [
        ("INSTALL", analysis.install),
        ("MAYBE", analysis.maybe),
        ("SKIP", analysis.skip),
    ] {
        lines.push(format!(
            "  {label:<8} {count} ({:.0}%)",
            count as f64 / total as f64 * 100.0
        ));
    }

    lines.push(String::new());
    lines.push(RULE_LIGHT.to_string());
    lines.push("  Top scores".to_string());
    lines.push(RULE_LIGHT.to_string());
    for (key, score) in &analysis.top {
        lines.push(format!("  {score:>5.1}  {key}"));
    }

    lines.push(String::new());
    lines.push(RULE_LIGHT.to_string());
    lines.push("  Bottom scores".to_string());
    lines.push(RULE_LIGHT.to_string());
    for (key, score) in &analysis.bottom {
        lines.push(format!("  {score:>5.1}  {key}"));
    }

    lines.push(String::new());
    lines.push(RULE_LIGHT.to_string());
    lines.push("  Score/verdict inconsistencies".to_string());
    lines.push(RULE_LIGHT.to_string());
    if analysis.inconsistencies.is_empty() {
        lines.push("  None: stored verdicts agree with stored scores.".to_string());
    } else {
        for (key, score, verdict) in &analysis.inconsistencies {
            lines.push(format!("  !! {key}  score={score:.1}  verdict={verdict}"));
        }
    }

    lines.push(String::new());
    lines.push(RULE_HEAVY.to_string());
    lines.join("\n")
}
