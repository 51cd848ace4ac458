//! Grammar engine boundary
//! - ast.rs: AST and offense schema decoded from engine output
//! - process.rs: engine backed by an external `collie` executable

pub mod ast;
pub mod process;

pub use ast::{GrammarAst, Location, Offense, Severity};
pub use process::ProcessEngine;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to spawn grammar engine `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Grammar engine I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Grammar engine exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Failed to decode grammar engine output: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Grammar engine produced non UTF-8 output")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Parse, lint, format and autocorrect operations on grammar sources.
///
/// `filename` is only used by the engine for messages and config lookup.
#[cfg_attr(test, mockall::automock)]
pub trait GrammarEngine: Send {
    fn parse(&self, source: &str, filename: &str) -> Result<GrammarAst, EngineError>;

    fn lint(&self, source: &str, filename: &str) -> Result<Vec<Offense>, EngineError>;

    /// Returns `Ok(None)` when the source cannot be formatted
    fn format(&self, source: &str, filename: &str) -> Result<Option<String>, EngineError>;

    /// Never fails: falls back to `source` on any internal error
    fn autocorrect(&self, source: &str, filename: &str) -> String;
}
