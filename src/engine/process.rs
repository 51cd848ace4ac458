//! Grammar engine backed by an external executable
//!
//! Every call spawns `<command> <subcommand> --stdin-filename <file> [--config <path>]`
//! with the grammar source on stdin. `parse` and `lint` answer with JSON, `format` and
//! `autocorrect` with the rewritten source.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tracing::{debug, warn};

use crate::config::{DEFAULT_ENGINE_COMMAND, find_config};
use crate::engine::{EngineError, GrammarAst, GrammarEngine, Offense};

pub struct ProcessEngine {
    program: String,
    args: Vec<String>,
    config_path: Option<PathBuf>,
}

impl ProcessEngine {
    /// Creates an engine for `command`, which may carry leading arguments
    /// (e.g. `bundle exec collie`). The workspace root is searched for `.collie.yml`.
    pub fn new(command: &str, workspace_root: Option<&Path>) -> Self {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .unwrap_or_else(|| DEFAULT_ENGINE_COMMAND.to_string());
        let config_path = workspace_root.and_then(find_config);

        if let Some(path) = &config_path {
            debug!("Using grammar engine config {:?}", path);
        }

        Self {
            program,
            args: parts.collect(),
            config_path,
        }
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    fn command(&self, subcommand: &str, filename: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(subcommand)
            .arg("--stdin-filename")
            .arg(filename);
        if let Some(path) = &self.config_path {
            command.arg("--config").arg(path);
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }

    fn run(&self, subcommand: &str, source: &str, filename: &str) -> Result<Output, EngineError> {
        let mut child = self
            .command(subcommand, filename)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                command: self.program.clone(),
                source,
            })?;

        // stdin is written on its own thread while stdout/stderr are drained here
        let stdin = child.stdin.take();
        let input = source.to_string();
        let writer = std::thread::spawn(move || match stdin {
            Some(mut stdin) => stdin.write_all(input.as_bytes()),
            None => Ok(()),
        });

        let output = child.wait_with_output()?;
        if let Ok(Err(e)) = writer.join() {
            debug!("Grammar engine closed stdin early: {}", e);
        }

        Ok(output)
    }

    fn failed(output: &Output) -> EngineError {
        EngineError::Failed {
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
    }
}

impl GrammarEngine for ProcessEngine {
    fn parse(&self, source: &str, filename: &str) -> Result<GrammarAst, EngineError> {
        let output = self.run("parse", source, filename)?;
        if !output.status.success() {
            return Err(Self::failed(&output));
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    fn lint(&self, source: &str, filename: &str) -> Result<Vec<Offense>, EngineError> {
        let output = self.run("lint", source, filename)?;
        // A non-zero exit only signals that offenses were found, as long as a report came back
        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            if output.status.success() {
                return Ok(Vec::new());
            }
            return Err(Self::failed(&output));
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }

    fn format(&self, source: &str, filename: &str) -> Result<Option<String>, EngineError> {
        let output = self.run("format", source, filename)?;
        if !output.status.success() {
            debug!("Grammar engine could not format {}", filename);
            return Ok(None);
        }
        Ok(Some(String::from_utf8(output.stdout)?))
    }

    fn autocorrect(&self, source: &str, filename: &str) -> String {
        let corrected = self
            .run("autocorrect", source, filename)
            .and_then(|output| {
                if output.status.success() {
                    Ok(String::from_utf8(output.stdout)?)
                } else {
                    Err(Self::failed(&output))
                }
            });

        match corrected {
            Ok(text) => text,
            Err(e) => {
                warn!("Autocorrect failed for {}: {}", filename, e);
                source.to_string()
            }
        }
    }
}
