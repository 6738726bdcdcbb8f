//! The external program wrapped by the CLI.

use std::process::ExitStatus;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    Exit { program: String, status: ExitStatus },
}

impl CommandError {
    /// Exit code the CLI should terminate with.
    pub fn exit_code(&self) -> i32 {
        match self {
            CommandError::Exit { status, .. } => status.code().unwrap_or(1),
            CommandError::Spawn { .. } => 1,
        }
    }
}

/// A program invocation that can be run any number of times.
#[derive(Debug, Clone)]
pub struct ProgramTask {
    program: String,
    args: Vec<String>,
}

impl ProgramTask {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Run the program to completion with inherited stdio.
    pub async fn run(&self) -> Result<(), CommandError> {
        debug!(program = %self.program, args = ?self.args, "Spawning program");

        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .await
            .map_err(|source| CommandError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(CommandError::Exit {
                program: self.program.clone(),
                status,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success() {
        let task = ProgramTask::new("sh", ["-c", "exit 0"]);
        assert!(task.run().await.is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_code_is_preserved() {
        let task = ProgramTask::new("sh", ["-c", "exit 3"]);
        let error = task.run().await.unwrap_err();
        assert_eq!(error.exit_code(), 3);
        assert!(error.to_string().starts_with("sh exited with"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_program_sees_its_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let task = ProgramTask::new("touch", [marker.to_string_lossy().into_owned()]);

        task.run().await.unwrap();
        assert!(marker.exists());
    }

    #[tokio::test]
    async fn test_missing_program() {
        let task = ProgramTask::new("hermes-no-such-program", Vec::<String>::new());
        let error = task.run().await.unwrap_err();
        assert!(matches!(error, CommandError::Spawn { .. }));
        assert_eq!(error.exit_code(), 1);
        assert!(error.to_string().starts_with("failed to start hermes-no-such-program"));
    }
}
