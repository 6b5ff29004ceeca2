//! Report assembly: the coordinator's merge step as an explicit algorithm.
//!
//! Role outputs are decomposed into `{section, source, text}` entries,
//! deduplicated by a normalized source+text key, and concatenated in a
//! fixed section order. Sections without data are rendered with an
//! explicit marker rather than dropped, and a consolidated source list
//! closes the artifact.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::agent::RoleOutput;
use crate::roles::{ResearchMode, RoleKind};

const NO_DATA_MARKER: &str = "_No data available._";

/// Fixed report sections, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection {
    Overview,
    Financials,
    Research,
    Videos,
}

impl ReportSection {
    pub fn heading(&self) -> &'static str {
        match self {
            ReportSection::Overview => "Company Overview",
            ReportSection::Financials => "Financial Data",
            ReportSection::Research => "In-Depth Research",
            ReportSection::Videos => "Video Coverage",
        }
    }

    fn for_role(kind: RoleKind) -> Option<Self> {
        match kind {
            RoleKind::WebInfo => Some(ReportSection::Overview),
            RoleKind::Finance => Some(ReportSection::Financials),
            RoleKind::Research => Some(ReportSection::Research),
            RoleKind::Video => Some(ReportSection::Videos),
            // The standalone stock lookup never feeds the merged report.
            RoleKind::StockQuote => None,
        }
    }
}

/// One deduplicatable unit of report content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionEntry {
    pub section: ReportSection,
    pub source: Option<String>,
    pub text: String,
}

/// The final merged research report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchArtifact {
    pub company: String,
    pub mode: ResearchMode,
    pub markdown: String,
    pub sources: Vec<String>,
}

/// Accumulates role outputs and renders the merged artifact.
pub struct ReportBuilder {
    company: String,
    mode: ResearchMode,
    entries: Vec<SectionEntry>,
    sources: Vec<String>,
    seen: HashSet<String>,
}

impl ReportBuilder {
    pub fn new(company: impl Into<String>, mode: ResearchMode) -> Self {
        Self {
            company: company.into(),
            mode,
            entries: Vec::new(),
            sources: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Decompose one role output into entries, dropping duplicates already
    /// contributed by an earlier role.
    pub fn push_output(&mut self, output: &RoleOutput) {
        let Some(section) = ReportSection::for_role(output.kind) else {
            return;
        };

        let primary_source = output.sources.first().cloned();
        for block in split_blocks(&output.body) {
            let entry = SectionEntry {
                section,
                source: primary_source.clone(),
                text: block,
            };
            if self.seen.insert(dedup_key(&entry)) {
                self.entries.push(entry);
            }
        }

        for url in &output.sources {
            if !self.sources.contains(url) {
                self.sources.push(url.clone());
            }
        }
    }

    /// Render the artifact with sections in fixed order.
    pub fn build(self) -> ResearchArtifact {
        let sections: &[ReportSection] = match self.mode {
            ResearchMode::Basic => &[
                ReportSection::Overview,
                ReportSection::Financials,
                ReportSection::Research,
            ],
            ResearchMode::Pro => &[
                ReportSection::Overview,
                ReportSection::Financials,
                ReportSection::Research,
                ReportSection::Videos,
            ],
        };

        let mut markdown = format!("# Company Research Report: {}\n", self.company);
        for section in sections {
            markdown.push_str(&format!("\n## {}\n\n", section.heading()));
            let blocks: Vec<&str> = self
                .entries
                .iter()
                .filter(|entry| entry.section == *section)
                .map(|entry| entry.text.as_str())
                .collect();
            if blocks.is_empty() {
                markdown.push_str(NO_DATA_MARKER);
                markdown.push('\n');
            } else {
                markdown.push_str(&blocks.join("\n\n"));
                markdown.push('\n');
            }
        }

        markdown.push_str("\n## Sources\n\n");
        if self.sources.is_empty() {
            markdown.push_str(NO_DATA_MARKER);
            markdown.push('\n');
        } else {
            for (idx, url) in self.sources.iter().enumerate() {
                markdown.push_str(&format!("{}. {}\n", idx + 1, url));
            }
        }

        ResearchArtifact {
            company: self.company,
            mode: self.mode,
            markdown,
            sources: self.sources,
        }
    }
}

/// Split a markdown body into paragraph-level blocks.
fn split_blocks(body: &str) -> Vec<String> {
    body.split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(str::to_string)
        .collect()
}

/// Dedup key: normalized source + text, so the same fact surfaced by two
/// roles collapses to one mention.
fn dedup_key(entry: &SectionEntry) -> String {
    let mut key = normalize(entry.source.as_deref().unwrap_or(""));
    key.push('|');
    key.push_str(&normalize(&entry.text));
    key
}

fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_was_space = false;
        } else if !last_was_space && !out.is_empty() {
            out.push(' ');
            last_was_space = true;
        }
    }
    out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(kind: RoleKind, body: &str, sources: &[&str]) -> RoleOutput {
        RoleOutput {
            kind,
            body: body.to_string(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn duplicate_facts_across_roles_collapse_to_one_mention() {
        let mut builder = ReportBuilder::new("Acme Corp", ResearchMode::Basic);
        builder.push_output(&output(
            RoleKind::WebInfo,
            "Acme was founded in 1947.",
            &["https://acme.test/about"],
        ));
        // Research agent surfaces the identical fact with cosmetic differences.
        builder.push_output(&output(
            RoleKind::Research,
            "  Acme was founded in 1947!  ",
            &["https://acme.test/about"],
        ));

        let artifact = builder.build();
        assert_eq!(artifact.markdown.matches("founded in 1947").count(), 1);
    }

    #[test]
    fn sections_render_in_fixed_order_with_markers_for_gaps() {
        let mut builder = ReportBuilder::new("Acme Corp", ResearchMode::Pro);
        builder.push_output(&output(RoleKind::Research, "Deep analysis.", &[]));

        let artifact = builder.build();
        let md = &artifact.markdown;

        let overview = md.find("## Company Overview").unwrap();
        let financials = md.find("## Financial Data").unwrap();
        let research = md.find("## In-Depth Research").unwrap();
        let videos = md.find("## Video Coverage").unwrap();
        assert!(overview < financials && financials < research && research < videos);

        // Empty sections are marked, not omitted.
        assert_eq!(md.matches(NO_DATA_MARKER).count(), 4); // overview, financials, videos, sources
    }

    #[test]
    fn basic_mode_omits_the_video_section_entirely() {
        let builder = ReportBuilder::new("Acme Corp", ResearchMode::Basic);
        let artifact = builder.build();
        assert!(!artifact.markdown.contains("## Video Coverage"));
    }

    #[test]
    fn stock_quote_output_never_enters_the_report() {
        let mut builder = ReportBuilder::new("Acme Corp", ResearchMode::Basic);
        builder.push_output(&output(RoleKind::StockQuote, "ACME trades at $12.", &[]));
        let artifact = builder.build();
        assert!(!artifact.markdown.contains("$12"));
    }

    #[test]
    fn sources_are_consolidated_without_duplicates() {
        let mut builder = ReportBuilder::new("Acme Corp", ResearchMode::Basic);
        builder.push_output(&output(
            RoleKind::WebInfo,
            "Overview text.",
            &["https://a.test", "https://b.test"],
        ));
        builder.push_output(&output(
            RoleKind::Research,
            "Research text.",
            &["https://b.test", "https://c.test"],
        ));

        let artifact = builder.build();
        assert_eq!(
            artifact.sources,
            vec!["https://a.test", "https://b.test", "https://c.test"]
        );
    }

    #[test]
    fn normalization_ignores_case_punctuation_and_spacing() {
        assert_eq!(normalize("Acme,  Corp!"), normalize("acme corp"));
        assert_ne!(normalize("Acme Corp"), normalize("Acme Inc"));
    }
}
