//! Child-process analysis engine.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use docaudit_core::AnalysisResult;
use tokio::process::Command;

use crate::engine::AnalysisEngine;
use crate::error::AnalysisError;

/// Runs the analysis engine as a child process.
///
/// The staged document path is appended as the final argument. The process
/// must print one JSON value on stdout and exit with status zero; any other
/// exit status is a failure whose message is the last non-empty stderr line,
/// with the document path masked.
///
/// The child is killed if the invocation is dropped before it exits.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    /// Creates an engine that runs `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Sets the arguments placed before the document path.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// The program being run.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The fixed arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

#[async_trait]
impl AnalysisEngine for CommandEngine {
    async fn analyze(&self, path: &Path) -> Result<AnalysisResult, AnalysisError> {
        tracing::debug!(program = %self.program, args = ?self.args, "spawning analysis engine");

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AnalysisError::Spawn(format!("{}: {e}", self.program)))?;

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| AnalysisError::engine(format!("engine process failed: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            tracing::warn!(status = %output.status, stderr = %stderr, "analysis engine failed");
            let message = failure_message(stderr, path)
                .unwrap_or_else(|| format!("analysis engine exited with {}", output.status));
            return Err(AnalysisError::Engine(message));
        }

        let value: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| AnalysisError::InvalidOutput(e.to_string()))?;

        Ok(AnalysisResult::new(value))
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Placeholder for the staged document in engine messages.
const DOCUMENT_TOKEN: &str = "<document>";

/// Reduces engine stderr to its last non-empty line, the exception summary
/// for tracebacks, and masks every mention of the staged document.
fn failure_message(stderr: &str, path: &Path) -> Option<String> {
    let line = stderr.lines().map(str::trim).rfind(|l| !l.is_empty())?;

    let mut message = line.replace(path.to_string_lossy().as_ref(), DOCUMENT_TOKEN);
    if let Some(name) = path.file_name().map(|n| n.to_string_lossy()) {
        if !name.is_empty() {
            message = message.replace(name.as_ref(), DOCUMENT_TOKEN);
        }
    }
    Some(message)
}
