//! Index regeneration after catalog changes.
//!
//! Downstream consumers read the catalog through generated index files. After
//! a mutation the store asks its [`Notifier`] to rebuild them. The production
//! implementation, [`ScriptNotifier`], runs the configured steps (by default
//! two Node scripts) in the project directory and captures their output.
//!
//! Regeneration is best-effort: the result is reported back as an
//! [`IndexReport`] and never undoes or fails the mutation that preceded it.

use crate::config::{IndexConfig, IndexStep};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("could not run index step '{step}': {source}")]
    Spawn {
        step: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured result of a regeneration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexOutput {
    /// Every step exited with status zero.
    pub success: bool,
    /// Output of all steps, each under a `[<step name>]` header.
    pub log: String,
}

/// Capability to rebuild downstream indexes from the on-disk catalog.
pub trait Notifier {
    fn regenerate(&self) -> Result<IndexOutput, NotifyError>;
}

impl<N: Notifier + ?Sized> Notifier for Box<N> {
    fn regenerate(&self) -> Result<IndexOutput, NotifyError> {
        (**self).regenerate()
    }
}

/// Notifier used when regeneration is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn regenerate(&self) -> Result<IndexOutput, NotifyError> {
        Ok(IndexOutput {
            success: true,
            log: String::new(),
        })
    }
}

/// Runs each configured step as an external process.
///
/// All steps run even if an earlier one fails; any non-zero exit makes the
/// whole run unsuccessful. A step that can't be started at all (e.g. `node`
/// is not installed) aborts with [`NotifyError::Spawn`].
#[derive(Debug, Clone)]
pub struct ScriptNotifier {
    working_dir: PathBuf,
    steps: Vec<IndexStep>,
}

impl ScriptNotifier {
    pub fn new(working_dir: impl Into<PathBuf>, steps: Vec<IndexStep>) -> Self {
        Self {
            working_dir: working_dir.into(),
            steps,
        }
    }
}

impl Notifier for ScriptNotifier {
    fn regenerate(&self) -> Result<IndexOutput, NotifyError> {
        let mut success = true;
        let mut sections = Vec::with_capacity(self.steps.len() * 3);

        for step in &self.steps {
            tracing::debug!(step = %step.name, program = %step.program, "running index step");
            let output = Command::new(&step.program)
                .args(&step.args)
                .current_dir(&self.working_dir)
                .output()
                .map_err(|source| NotifyError::Spawn {
                    step: step.name.clone(),
                    source,
                })?;

            if !output.status.success() {
                tracing::warn!(step = %step.name, status = %output.status, "index step failed");
                success = false;
            }
            sections.push(format!("[{}]", step.name));
            sections.push(String::from_utf8_lossy(&output.stdout).to_string());
            sections.push(String::from_utf8_lossy(&output.stderr).to_string());
        }

        Ok(IndexOutput {
            success,
            log: sections.join("\n"),
        })
    }
}

/// Build the notifier described by the `[index]` config section.
pub fn notifier_from_config(project_dir: &Path, config: &IndexConfig) -> Box<dyn Notifier> {
    if config.enabled && !config.steps.is_empty() {
        Box::new(ScriptNotifier::new(project_dir, config.steps.clone()))
    } else {
        Box::new(NoopNotifier)
    }
}

/// Outcome of regeneration as reported to the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexReport {
    /// All steps succeeded.
    Regenerated { log: String },
    /// At least one step exited non-zero.
    Incomplete { log: String },
    /// Regeneration could not be started.
    Unavailable { reason: String },
}

impl IndexReport {
    pub fn from_result(result: Result<IndexOutput, NotifyError>) -> Self {
        match result {
            Ok(out) if out.success => IndexReport::Regenerated { log: out.log },
            Ok(out) => IndexReport::Incomplete { log: out.log },
            Err(e) => IndexReport::Unavailable {
                reason: e.to_string(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, IndexReport::Regenerated { .. })
    }

    /// Captured step output, empty when regeneration never ran.
    pub fn log(&self) -> &str {
        match self {
            IndexReport::Regenerated { log } | IndexReport::Incomplete { log } => log,
            IndexReport::Unavailable { .. } => "",
        }
    }
}

impl fmt::Display for IndexReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexReport::Regenerated { .. } => write!(f, "Indexes regenerated"),
            IndexReport::Incomplete { .. } => {
                write!(f, "Warning: indexes could not be fully regenerated")
            }
            IndexReport::Unavailable { reason } => {
                write!(f, "Warning: index regeneration unavailable ({reason})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn step(name: &str, program: &str, args: &[&str]) -> IndexStep {
        IndexStep {
            name: name.to_string(),
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn noop_always_succeeds() {
        let out = NoopNotifier.regenerate().unwrap();
        assert!(out.success);
        assert!(out.log.is_empty());
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let tmp = TempDir::new().unwrap();
        let notifier = ScriptNotifier::new(
            tmp.path(),
            vec![step("gen", "catalog-admin-no-such-program", &[])],
        );
        let err = notifier.regenerate().unwrap_err();
        assert!(matches!(err, NotifyError::Spawn { ref step, .. } if step == "gen"));
    }

    #[cfg(unix)]
    #[test]
    fn step_output_is_captured_under_headers() {
        let tmp = TempDir::new().unwrap();
        let notifier = ScriptNotifier::new(
            tmp.path(),
            vec![
                step("first", "sh", &["-c", "echo one"]),
                step("second", "sh", &["-c", "echo two >&2"]),
            ],
        );
        let out = notifier.regenerate().unwrap();
        assert!(out.success);
        assert_eq!(out.log, "[first]\none\n\n\n[second]\n\ntwo\n");
    }

    #[cfg(unix)]
    #[test]
    fn any_failing_step_fails_the_run_but_all_steps_run() {
        let tmp = TempDir::new().unwrap();
        let notifier = ScriptNotifier::new(
            tmp.path(),
            vec![
                step("bad", "sh", &["-c", "exit 3"]),
                step("good", "sh", &["-c", "echo ran"]),
            ],
        );
        let out = notifier.regenerate().unwrap();
        assert!(!out.success);
        assert!(out.log.contains("[good]\nran"));
    }

    #[test]
    fn disabled_config_builds_noop() {
        let tmp = TempDir::new().unwrap();
        let config = IndexConfig {
            enabled: false,
            steps: vec![step("gen", "catalog-admin-no-such-program", &[])],
        };
        let notifier = notifier_from_config(tmp.path(), &config);
        assert!(notifier.regenerate().unwrap().success);
    }

    #[test]
    fn report_from_results() {
        let ok = IndexReport::from_result(Ok(IndexOutput {
            success: true,
            log: "x".into(),
        }));
        assert!(ok.is_ok());
        assert_eq!(ok.log(), "x");

        let partial = IndexReport::from_result(Ok(IndexOutput {
            success: false,
            log: "y".into(),
        }));
        assert!(!partial.is_ok());
        assert!(partial.to_string().starts_with("Warning"));
    }
}
