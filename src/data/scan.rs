//! Security-scan findings and their digests.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use super::cwe::{self, CweTable};
use crate::error::ReportError;

/// Number of CWEs listed in the insights digest.
pub const TOP_CWES: usize = 5;

/// Fallback remediation line when no tip was generated.
pub const DEFAULT_REMEDIATION: &str = "See CWE documentation.";

/// Grouping key for findings without a CWE.
pub const UNKNOWN_CWE: &str = "Unknown";

/// Finding severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Exploitable with severe impact.
    Critical,
    /// Serious weakness.
    High,
    /// Moderate weakness.
    Medium,
    /// Minor weakness.
    Low,
    /// Informational, and anything unrecognised.
    Info,
}

impl Severity {
    /// All severities in digest order.
    pub const ALL: [Self; 5] = [
        Self::Critical,
        Self::High,
        Self::Medium,
        Self::Low,
        Self::Info,
    ];

    /// Case-insensitive parse; anything unrecognised is `Info`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            _ => Self::Info,
        }
    }

    /// Weight used for the risk score.
    pub const fn score(self) -> u32 {
        match self {
            Self::Critical => 5,
            Self::High => 4,
            Self::Medium => 3,
            Self::Low => 2,
            Self::Info => 1,
        }
    }

    /// Section icon.
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Critical => "🛑",
            Self::High => "🔴",
            Self::Medium => "🟠",
            Self::Low => "🟡",
            Self::Info => "🔵",
        }
    }

    /// Whether the section is flagged as a priority.
    pub const fn is_priority(self) -> bool {
        matches!(self, Self::Critical | Self::High)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Info => "Info",
        })
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map_or(Self::Info, Self::parse))
    }
}

/// One reported issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFinding {
    /// What was found.
    pub description: String,
    /// How bad it is.
    #[serde(default = "default_severity")]
    pub severity: Severity,
    /// Associated weakness, e.g. `CWE-89`.
    #[serde(default)]
    pub cwe_id: Option<String>,
}

const fn default_severity() -> Severity {
    Severity::Info
}

impl ScanFinding {
    fn cwe_key(&self) -> &str {
        self.cwe_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .unwrap_or(UNKNOWN_CWE)
    }
}

/// Reads a JSON array of findings from `path`.
///
/// Only a missing file is [`ReportError::InputNotFound`]; content that is not
/// UTF-8 JSON of the expected shape is [`ReportError::MalformedScanInput`].
pub fn load_findings(path: &Path) -> Result<Vec<ScanFinding>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(ReportError::InputNotFound(path.to_path_buf()).into());
        }
        Err(e) => {
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to read scan input {}", path.display())));
        }
    };
    let content = String::from_utf8(bytes).map_err(|e| ReportError::MalformedScanInput {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let findings: Vec<ScanFinding> =
        serde_json::from_str(&content).map_err(|e| ReportError::MalformedScanInput {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    debug!(path = %path.display(), findings = findings.len(), "Loaded scan findings");
    Ok(findings)
}

/// Parses the model's answer to a file-scan prompt.
///
/// Accepts a bare JSON array or one wrapped in a fenced code block.
pub fn parse_model_findings(answer: &str) -> Result<Vec<ScanFinding>> {
    let body = strip_code_fence(answer.trim());
    serde_json::from_str(body).map_err(|e| {
        anyhow::Error::from(ReportError::GenerationFailed(format!(
            "model did not return a JSON array of issues: {e}"
        )))
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Findings grouped by severity, input order preserved within a group.
pub fn group_by_severity(findings: &[ScanFinding]) -> BTreeMap<Severity, Vec<&ScanFinding>> {
    let mut groups: BTreeMap<Severity, Vec<&ScanFinding>> =
        Severity::ALL.iter().map(|s| (*s, Vec::new())).collect();
    for finding in findings {
        groups.entry(finding.severity).or_default().push(finding);
    }
    groups
}

/// Plain-text severity digest.
pub fn security_summary(findings: &[ScanFinding]) -> String {
    let mut lines = vec![format!("🔒 Security Scan Summary\n{}", "=".repeat(28))];

    for (severity, issues) in group_by_severity(findings) {
        let mut header = format!("{} {severity} Issues ({})", severity.icon(), issues.len());
        if severity.is_priority() {
            header.push_str(" [PRIORITY!]");
        }
        lines.push(header);

        if issues.is_empty() {
            lines.push("  - None found".to_string());
        }
        for issue in issues {
            lines.push(format!(
                "  - {}\n    Severity: {} | CWE: {}",
                issue.description,
                issue.severity,
                issue.cwe_id.as_deref().unwrap_or("N/A")
            ));
        }
        lines.push(String::new());
    }

    lines.push("Legend: 🛑 Critical | 🔴 High | 🟠 Medium | 🟡 Low | 🔵 Info".to_string());
    lines.join("\n")
}

/// Overall risk bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    /// At least 80% of the maximum score.
    High,
    /// At least 50% of the maximum score.
    Medium,
    /// Below 50%.
    Low,
}

impl RiskLevel {
    /// Bucket for a risk percentage.
    pub const fn from_percent(percent: u32) -> Self {
        if percent >= 80 {
            Self::High
        } else if percent >= 50 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "🔥 High",
            Self::Medium => "🟠 Medium",
            Self::Low => "🟢 Low",
        })
    }
}

/// CWE frequency analysis of a finding list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CweInsights {
    /// Number of findings analysed.
    pub total_findings: usize,
    /// Number of distinct CWE identifiers.
    pub unique_cwes: usize,
    /// Most common CWEs with their counts, at most [`TOP_CWES`].
    pub top_cwes: Vec<(String, usize)>,
    /// Total severity score as a percentage of the maximum.
    pub risk_percent: u32,
    /// Bucket for `risk_percent`.
    pub risk_level: RiskLevel,
}

impl CweInsights {
    /// Analyses `findings`.
    pub fn analyze(findings: &[ScanFinding]) -> Self {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        let mut total_score = 0u32;
        for finding in findings {
            *counts.entry(finding.cwe_key()).or_insert(0) += 1;
            total_score += finding.severity.score();
        }

        let mut top_cwes: Vec<(String, usize)> = counts
            .iter()
            .map(|(id, count)| ((*id).to_string(), *count))
            .collect();
        top_cwes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_cwes.truncate(TOP_CWES);

        let max_score = findings.len() as u32 * Severity::Critical.score();
        let risk_percent = if max_score == 0 {
            0
        } else {
            total_score * 100 / max_score
        };

        Self {
            total_findings: findings.len(),
            unique_cwes: counts.len(),
            top_cwes,
            risk_percent,
            risk_level: RiskLevel::from_percent(risk_percent),
        }
    }

    /// Renders the digest. `tips` maps CWE ids to remediation tips; ids
    /// without a tip get [`DEFAULT_REMEDIATION`].
    pub fn render(&self, table: &CweTable, tips: &HashMap<String, String>) -> String {
        let mut lines = vec![format!("🧠 CodeQL CWE Insights\n{}", "=".repeat(28))];

        let Some((top_id, top_count)) = self.top_cwes.first() else {
            lines.push("No CWEs found.".to_string());
            return lines.join("\n");
        };

        lines.push(format!(
            "Executive Summary:\n- Total findings: {}\n- Unique CWEs: {}\n- Top CWE: {top_id} ({top_count} findings)\n- Risk Score: {} ({}%)",
            self.total_findings, self.unique_cwes, self.risk_level, self.risk_percent
        ));
        lines.push(format!("\nTop {TOP_CWES} Most Common CWEs:"));

        for (cwe_id, count) in &self.top_cwes {
            let entry = table.get(cwe_id);
            let title = entry.map_or(cwe_id.as_str(), |e| e.title.as_str());
            let description = entry.map_or("", |e| e.description.as_str());
            let remediation = tips
                .get(cwe_id)
                .map(String::as_str)
                .filter(|tip| !tip.is_empty())
                .unwrap_or(DEFAULT_REMEDIATION);
            lines.push(format!(
                "{cwe_id} ({title}) - {count} finding(s)\n   Description: {description}\n   Remediation: {remediation}\n   🔗 {}",
                cwe::mitre_link(cwe_id)
            ));
        }

        lines.push(format!(
            "\nRisk Score: {} ({}%)",
            self.risk_level, self.risk_percent
        ));
        lines.push("\nLegend: 🛑 Critical | 🔴 High | 🟠 Medium | 🟡 Low | 🔵 Info".to_string());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(description: &str, severity: Severity, cwe_id: Option<&str>) -> ScanFinding {
        ScanFinding {
            description: description.to_string(),
            severity,
            cwe_id: cwe_id.map(str::to_string),
        }
    }

    #[test]
    fn severity_parsing_is_lenient() {
        assert_eq!(Severity::parse("HIGH"), Severity::High);
        assert_eq!(Severity::parse(" critical "), Severity::Critical);
        assert_eq!(Severity::parse("warning"), Severity::Info);
    }

    #[test]
    fn findings_deserialize_with_defaults() {
        let json = r#"[
            {"description": "a", "severity": "Medium", "cwe_id": "CWE-79"},
            {"description": "b", "severity": null, "cwe_id": null},
            {"description": "c"}
        ]"#;
        let findings: Vec<ScanFinding> = serde_json::from_str(json).unwrap();
        assert_eq!(findings[0].severity, Severity::Medium);
        assert_eq!(findings[1].severity, Severity::Info);
        assert_eq!(findings[2].cwe_id, None);
    }

    #[test]
    fn load_reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();

        let err = load_findings(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::InputNotFound(_))
        ));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, r#"{"description": "not an array"}"#).unwrap();
        let err = load_findings(&bad).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::MalformedScanInput { .. })
        ));
    }

    #[test]
    fn undecodable_input_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let binary = dir.path().join("scan.sarif");
        fs::write(&binary, [b'[', 0xff, 0xfe, b']']).unwrap();
        let err = load_findings(&binary).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::MalformedScanInput { .. })
        ));
        assert_eq!(crate::error::exit_code_for(&err), 5);
    }

    #[test]
    fn unreadable_input_is_not_reported_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_findings(dir.path()).unwrap_err();
        assert!(err.downcast_ref::<ReportError>().is_none());
        assert_eq!(crate::error::exit_code_for(&err), 1);
        assert!(err.to_string().contains("Failed to read scan input"));
    }

    #[test]
    fn model_findings_tolerate_fences() {
        let fenced = "```json\n[{\"description\": \"eval\", \"severity\": \"high\", \"cwe_id\": \"CWE-94\"}]\n```";
        let findings = parse_model_findings(fenced).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::High);

        assert!(parse_model_findings("[]").unwrap().is_empty());

        let err = parse_model_findings("I found no issues.").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::GenerationFailed(_))
        ));
    }

    #[test]
    fn security_summary_lists_every_section() {
        let findings = vec![
            finding("SQL built from input", Severity::High, Some("CWE-89")),
            finding("Debug logging enabled", Severity::Info, None),
        ];
        insta::assert_snapshot!(security_summary(&findings), @r"
        🔒 Security Scan Summary
        ============================
        🛑 Critical Issues (0) [PRIORITY!]
          - None found

        🔴 High Issues (1) [PRIORITY!]
          - SQL built from input
            Severity: High | CWE: CWE-89

        🟠 Medium Issues (0)
          - None found

        🟡 Low Issues (0)
          - None found

        🔵 Info Issues (1)
          - Debug logging enabled
            Severity: Info | CWE: N/A

        Legend: 🛑 Critical | 🔴 High | 🟠 Medium | 🟡 Low | 🔵 Info
        ");
    }

    #[test]
    fn insights_rank_cwes_and_score_risk() {
        let findings = vec![
            finding("a", Severity::Critical, Some("CWE-89")),
            finding("b", Severity::Critical, Some("CWE-89")),
            finding("c", Severity::High, Some("CWE-79")),
            finding("d", Severity::Low, None),
        ];
        let insights = CweInsights::analyze(&findings);
        assert_eq!(insights.total_findings, 4);
        assert_eq!(insights.unique_cwes, 3);
        assert_eq!(
            insights.top_cwes,
            vec![
                ("CWE-89".to_string(), 2),
                ("CWE-79".to_string(), 1),
                (UNKNOWN_CWE.to_string(), 1),
            ]
        );
        // (5 + 5 + 4 + 2) / 20
        assert_eq!(insights.risk_percent, 80);
        assert_eq!(insights.risk_level, RiskLevel::High);
    }

    #[test]
    fn insights_keep_only_top_five() {
        let findings: Vec<ScanFinding> = (0..7)
            .map(|i| finding("x", Severity::Low, Some(&format!("CWE-{i}"))))
            .collect();
        let insights = CweInsights::analyze(&findings);
        assert_eq!(insights.top_cwes.len(), TOP_CWES);
        assert_eq!(insights.unique_cwes, 7);
        assert_eq!(insights.risk_percent, 40);
        assert_eq!(insights.risk_level, RiskLevel::Low);
    }

    #[test]
    fn render_uses_tips_and_table() {
        let table = CweTable::load().unwrap();
        let findings = vec![
            finding("a", Severity::Medium, Some("CWE-89")),
            finding("b", Severity::Medium, Some("CWE-1234")),
        ];
        let insights = CweInsights::analyze(&findings);
        assert_eq!(insights.risk_level, RiskLevel::Medium);

        let mut tips = HashMap::new();
        tips.insert("CWE-89".to_string(), "Use parameterized queries.".to_string());
        let text = insights.render(&table, &tips);

        assert!(text.contains("CWE-89 (Improper Neutralization of Special Elements used in an SQL Command ('SQL Injection')) - 1 finding(s)"));
        assert!(text.contains("Remediation: Use parameterized queries."));
        assert!(text.contains("CWE-1234 (CWE-1234) - 1 finding(s)"));
        assert!(text.contains(&format!("Remediation: {DEFAULT_REMEDIATION}")));
        assert!(text.contains("https://cwe.mitre.org/data/definitions/1234.html"));
        assert!(text.contains("Risk Score: 🟠 Medium (60%)"));
    }

    #[test]
    fn empty_input_has_no_cwes() {
        let table = CweTable::load().unwrap();
        let insights = CweInsights::analyze(&[]);
        assert_eq!(insights.risk_percent, 0);
        assert!(insights.render(&table, &HashMap::new()).ends_with("No CWEs found."));
    }
}
