//! Consensus over the diagnostics of independent analysis pipelines.
//!
//! Every pipeline analyzes the same source and returns its own diagnostic
//! list. The engine normalizes them, groups them by (line, category), and
//! splits the groups into confirmed findings (reported by at least a quorum
//! of pipelines) and advisory findings (reported by fewer).

mod pipeline;

pub use pipeline::{Pipeline, PipelineConfig, PipelineReport};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::frontend::token::Token;
use crate::utils::{Category, Diagnostic};

/// One grouped finding, with the set of pipelines that reported it.
#[derive(Debug, Clone, Serialize)]
pub struct ConsensusRecord {
    pub line: u32,
    pub category: Category,
    /// Message of the highest-priority pipeline in the group.
    pub message: String,
    pub pipelines: BTreeSet<String>,
}

/// The merged result of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct ConsensusReport {
    /// Findings reported by at least a quorum of pipelines, ordered by
    /// line then category.
    pub confirmed: Vec<ConsensusRecord>,
    /// Findings below the quorum.
    pub advisory: Vec<ConsensusRecord>,
    /// Token stream of the reference (first) pipeline.
    pub tokens: Vec<Token>,
}

impl ConsensusReport {
    pub fn has_confirmed(&self) -> bool {
        !self.confirmed.is_empty()
    }

    pub fn confirmed_count(&self, category: Category) -> usize {
        self.confirmed
            .iter()
            .filter(|r| r.category == category)
            .count()
    }
}

/// Runs N pipelines and reconciles their diagnostics.
pub struct ConsensusEngine {
    pipelines: Vec<Pipeline>,
}

impl Default for ConsensusEngine {
    /// Three pipelines: two with the default analysis and one strict, so
    /// strictness-dependent findings stay advisory.
    fn default() -> Self {
        Self::new(vec![
            PipelineConfig::new("alpha"),
            PipelineConfig::new("beta"),
            PipelineConfig::strict("gamma"),
        ])
    }
}

impl ConsensusEngine {
    pub fn new(configs: Vec<PipelineConfig>) -> Self {
        Self {
            pipelines: configs.into_iter().map(Pipeline::new).collect(),
        }
    }

    pub fn pipeline_names(&self) -> Vec<&str> {
        self.pipelines.iter().map(Pipeline::name).collect()
    }

    /// Run every pipeline over the source and merge the reports.
    pub fn analyze(&self, source: &str) -> ConsensusReport {
        let reports = self
            .pipelines
            .iter()
            .map(|pipeline| pipeline.run(source))
            .collect();
        self.merge(reports)
    }

    /// Merge already-produced reports. Priority order is the order of the
    /// reports; the first report is the reference pipeline.
    pub fn merge(&self, reports: Vec<PipelineReport>) -> ConsensusReport {
        let quorum = quorum(reports.len());

        // Group key is the diagnostic signature; members keep the priority
        // of the pipeline that produced them.
        let mut groups: BTreeMap<(u32, Category), Vec<(usize, Diagnostic)>> = BTreeMap::new();
        for (priority, report) in reports.iter().enumerate() {
            for diagnostic in &report.diagnostics {
                let normalized = normalize(diagnostic);
                groups
                    .entry(normalized.signature())
                    .or_default()
                    .push((priority, normalized));
            }
        }

        let mut confirmed = Vec::new();
        let mut advisory = Vec::new();
        for ((line, category), mut members) in groups {
            members.sort_by_key(|(priority, _)| *priority);

            // Support is counted in distinct pipelines, so a pipeline that
            // reports the same signature twice still counts once.
            let pipelines: BTreeSet<String> = members
                .iter()
                .map(|(_, diagnostic)| diagnostic.pipeline.clone())
                .collect();
            let message = members
                .first()
                .map(|(_, diagnostic)| diagnostic.message.clone())
                .unwrap_or_default();

            let record = ConsensusRecord {
                line,
                category,
                message,
                pipelines,
            };
            if record.pipelines.len() >= quorum {
                confirmed.push(record);
            } else {
                advisory.push(record);
            }
        }

        let tokens = reports
            .into_iter()
            .next()
            .map(|report| report.tokens)
            .unwrap_or_default();

        log::info!(
            "consensus: {} confirmed, {} advisory (quorum {})",
            confirmed.len(),
            advisory.len(),
            quorum
        );

        ConsensusReport {
            confirmed,
            advisory,
            tokens,
        }
    }
}

/// Majority quorum: ceil(N / 2), and at least 1.
fn quorum(pipelines: usize) -> usize {
    (pipelines + 1) / 2
}

/// Bring a raw diagnostic into canonical form: trimmed message, and a line
/// number recovered from the message text when the record itself carries
/// none. External pipelines often embed "line N" (or "línea N") in prose.
fn normalize(diagnostic: &Diagnostic) -> Diagnostic {
    let mut normalized = diagnostic.clone();
    normalized.message = normalized.message.trim().to_string();
    if normalized.line == 0 {
        if let Some(line) = extract_line(&normalized.message) {
            normalized.line = line;
        }
    }
    normalized
}

fn extract_line(message: &str) -> Option<u32> {
    static LINE_RE: OnceLock<Regex> = OnceLock::new();
    let re = LINE_RE
        .get_or_init(|| Regex::new(r"(?i)\bl(?:ínea|inea|ine)\s+(\d+)").expect("line pattern"));
    re.captures(message)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn report(name: &str, diagnostics: Vec<Diagnostic>) -> PipelineReport {
        let diagnostics = diagnostics
            .into_iter()
            .map(|mut d| {
                d.pipeline = name.to_string();
                d
            })
            .collect();
        PipelineReport {
            name: name.to_string(),
            tokens: Vec::new(),
            diagnostics,
        }
    }

    #[test]
    fn test_quorum_is_majority() {
        assert_eq!(quorum(1), 1);
        assert_eq!(quorum(2), 1);
        assert_eq!(quorum(3), 2);
        assert_eq!(quorum(4), 2);
        assert_eq!(quorum(5), 3);
    }

    #[test]
    fn test_unanimous_finding_is_confirmed() {
        let engine = ConsensusEngine::default();
        let result = engine.analyze("var x = missing + 1;");
        assert_eq!(result.confirmed.len(), 1);
        assert!(result.advisory.is_empty());
        let record = &result.confirmed[0];
        assert_eq!(record.line, 1);
        assert_eq!(record.category, Category::Semantic);
        assert_eq!(record.pipelines.len(), 3);
    }

    #[test]
    fn test_minority_finding_is_advisory() {
        // Only the strict pipeline flags a mixed comparison.
        let engine = ConsensusEngine::default();
        let result = engine.analyze("var b = 1 == \"one\";");
        assert!(result.confirmed.is_empty());
        assert_eq!(result.advisory.len(), 1);
        assert_eq!(
            result.advisory[0].pipelines,
            BTreeSet::from(["gamma".to_string()])
        );
    }

    #[test]
    fn test_two_of_three_meets_quorum() {
        let engine = ConsensusEngine::new(vec![
            PipelineConfig::strict("a"),
            PipelineConfig::strict("b"),
            PipelineConfig::new("c"),
        ]);
        let result = engine.analyze("var b = 1 == \"one\";");
        assert_eq!(result.confirmed.len(), 1);
        assert_eq!(result.confirmed[0].pipelines.len(), 2);
    }

    #[test]
    fn test_representative_message_follows_priority_order() {
        let engine = ConsensusEngine::new(vec![
            PipelineConfig::new("first"),
            PipelineConfig::new("second"),
        ]);
        let reports = vec![
            report(
                "first",
                vec![Diagnostic::semantic(3, "primary wording")],
            ),
            report(
                "second",
                vec![Diagnostic::semantic(3, "secondary wording")],
            ),
        ];
        let result = engine.merge(reports);
        assert_eq!(result.confirmed.len(), 1);
        assert_eq!(result.confirmed[0].message, "primary wording");
    }

    #[test]
    fn test_line_recovered_from_message_text() {
        let engine = ConsensusEngine::new(vec![
            PipelineConfig::new("a"),
            PipelineConfig::new("b"),
        ]);
        let reports = vec![
            report("a", vec![Diagnostic::syntactic(7, "unexpected token")]),
            report(
                "b",
                vec![Diagnostic::syntactic(0, "Error sintáctico en línea 7")],
            ),
        ];
        let result = engine.merge(reports);
        assert_eq!(result.confirmed.len(), 1);
        assert_eq!(result.confirmed[0].line, 7);
        assert_eq!(result.confirmed[0].pipelines.len(), 2);
    }

    #[test]
    fn test_duplicates_within_a_pipeline_count_once() {
        let engine = ConsensusEngine::new(vec![
            PipelineConfig::new("a"),
            PipelineConfig::new("b"),
            PipelineConfig::new("c"),
        ]);
        let reports = vec![
            report(
                "a",
                vec![
                    Diagnostic::semantic(2, "dup one"),
                    Diagnostic::semantic(2, "dup two"),
                ],
            ),
            report("b", vec![]),
            report("c", vec![]),
        ];
        let result = engine.merge(reports);
        assert!(result.confirmed.is_empty());
        assert_eq!(result.advisory.len(), 1);
        assert_eq!(result.advisory[0].pipelines.len(), 1);
    }

    #[test]
    fn test_records_ordered_by_line_then_category() {
        let engine = ConsensusEngine::new(vec![PipelineConfig::new("solo")]);
        let reports = vec![report(
            "solo",
            vec![
                Diagnostic::semantic(9, "later"),
                Diagnostic::lexical(2, "early"),
                Diagnostic::syntactic(2, "also early"),
            ],
        )];
        let result = engine.merge(reports);
        let keys: Vec<(u32, Category)> = result
            .confirmed
            .iter()
            .map(|r| (r.line, r.category))
            .collect();
        assert_eq!(
            keys,
            vec![
                (2, Category::Lexical),
                (2, Category::Syntactic),
                (9, Category::Semantic)
            ]
        );
    }

    #[test]
    fn test_tokens_come_from_reference_pipeline() {
        let engine = ConsensusEngine::default();
        let result = engine.analyze("var x = 1;");
        // var, x, =, 1, ;, eof
        assert_eq!(result.tokens.len(), 6);
        assert!(result.confirmed.is_empty() && result.advisory.is_empty());
    }

    #[test]
    fn test_extract_line_variants() {
        assert_eq!(extract_line("error at line 12: bad token"), Some(12));
        assert_eq!(extract_line("Error léxico en línea 3"), Some(3));
        assert_eq!(extract_line("error en linea 44"), Some(44));
        assert_eq!(extract_line("no position here"), None);
    }
}
