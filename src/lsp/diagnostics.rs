//! Grammar engine offenses to LSP diagnostics

use tower_lsp::lsp_types::{
    Diagnostic, DiagnosticSeverity, NumberOrString, Position, Range, Url,
};
use tracing::{debug, warn};

use crate::config::uri_to_filename;
use crate::engine::{GrammarEngine, Location, Offense, Severity};
use crate::position::to_position;

/// `source` field of every published diagnostic
pub const DIAGNOSTIC_SOURCE: &str = "collie";

/// Offenses carry no end position, so ranges are this many characters wide
const APPROXIMATE_WIDTH: u32 = 10;

pub fn severity_to_lsp(severity: &Severity) -> DiagnosticSeverity {
    match severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Convention => DiagnosticSeverity::INFORMATION,
        Severity::Info => DiagnosticSeverity::HINT,
        Severity::Other(_) => DiagnosticSeverity::INFORMATION,
    }
}

pub fn offense_to_diagnostic(offense: &Offense) -> Diagnostic {
    let start = to_position(offense.location.unwrap_or(Location::new(1, 1)));
    let end = Position::new(start.line, start.character + APPROXIMATE_WIDTH);

    Diagnostic {
        range: Range::new(start, end),
        severity: Some(severity_to_lsp(&offense.severity)),
        code: Some(NumberOrString::String(
            offense
                .rule_name
                .clone()
                .unwrap_or_else(|| "unknown".to_string()),
        )),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: offense
            .message
            .clone()
            .unwrap_or_else(|| "Unknown error".to_string()),
        ..Default::default()
    }
}

/// Lints `text` and converts the findings.
///
/// Returns `None` when the engine fails, so callers keep the diagnostics of the
/// last analysis that completed.
pub fn lint_document(engine: &dyn GrammarEngine, uri: &Url, text: &str) -> Option<Vec<Diagnostic>> {
    let filename = uri_to_filename(uri);

    match engine.lint(text, &filename) {
        Ok(offenses) => {
            debug!("Lint of {} found {} offenses", uri, offenses.len());
            Some(offenses.iter().map(offense_to_diagnostic).collect())
        }
        Err(e) => {
            warn!("Lint failed for {}: {}", uri, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineError, MockGrammarEngine};
    use rstest::rstest;

    #[rstest]
    #[case("error", DiagnosticSeverity::ERROR)]
    #[case("warning", DiagnosticSeverity::WARNING)]
    #[case("convention", DiagnosticSeverity::INFORMATION)]
    #[case("info", DiagnosticSeverity::HINT)]
    #[case("refactor", DiagnosticSeverity::INFORMATION)]
    #[case("", DiagnosticSeverity::INFORMATION)]
    fn severity_to_lsp_maps_every_tag(#[case] tag: &str, #[case] expected: DiagnosticSeverity) {
        assert_eq!(severity_to_lsp(&Severity::from(tag)), expected);
    }

    #[test]
    fn offense_to_diagnostic_converts_location_and_fields() {
        let offense = Offense {
            location: Some(Location::new(3, 5)),
            severity: Severity::Warning,
            rule_name: Some("UnusedToken".to_string()),
            message: Some("Token FOO is never used".to_string()),
        };

        let diagnostic = offense_to_diagnostic(&offense);

        assert_eq!(
            diagnostic.range,
            Range::new(Position::new(2, 4), Position::new(2, 14))
        );
        assert_eq!(diagnostic.severity, Some(DiagnosticSeverity::WARNING));
        assert_eq!(
            diagnostic.code,
            Some(NumberOrString::String("UnusedToken".to_string()))
        );
        assert_eq!(diagnostic.source.as_deref(), Some("collie"));
        assert_eq!(diagnostic.message, "Token FOO is never used");
    }

    #[test]
    fn offense_to_diagnostic_fills_missing_fields() {
        let offense = Offense {
            location: None,
            severity: Severity::Error,
            rule_name: None,
            message: None,
        };

        let diagnostic = offense_to_diagnostic(&offense);

        assert_eq!(
            diagnostic.range,
            Range::new(Position::new(0, 0), Position::new(0, 10))
        );
        assert_eq!(
            diagnostic.code,
            Some(NumberOrString::String("unknown".to_string()))
        );
        assert_eq!(diagnostic.message, "Unknown error");
    }

    #[test]
    fn lint_document_converts_every_offense() {
        let mut engine = MockGrammarEngine::new();
        engine
            .expect_lint()
            .withf(|_, filename| filename == "/test/calc.y")
            .times(1)
            .returning(|_, _| {
                Ok(vec![Offense {
                    location: Some(Location::new(1, 1)),
                    severity: Severity::Error,
                    rule_name: Some("MissingStart".to_string()),
                    message: Some("No start rule".to_string()),
                }])
            });
        let uri = Url::parse("file:///test/calc.y").unwrap();

        let diagnostics = lint_document(&engine, &uri, "%%\n").unwrap();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message, "No start rule");
    }

    #[test]
    fn lint_document_returns_none_on_engine_failure() {
        let mut engine = MockGrammarEngine::new();
        engine.expect_lint().returning(|_, _| {
            Err(EngineError::Failed {
                status: "exit status: 2".to_string(),
                stderr: "crashed".to_string(),
            })
        });
        let uri = Url::parse("file:///test/calc.y").unwrap();

        assert!(lint_document(&engine, &uri, "%%\n").is_none());
    }
}
