// src/system/executor.rs

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, Stdio};

use thiserror::Error;

use crate::models::ExitStatus;

/// Outcome of one script execution: the mapped exit status and the full
/// captured output (stderr folded into stdout).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    pub status: ExitStatus,
    pub output: String,
}

/// Called for every output line as it arrives, in emission order.
pub type LineCallback<'a> = &'a dyn Fn(&str);

/// The seam between the interpreter and the platform shell. Production
/// code uses [`ShellExecutor`]; tests substitute a recording fake.
pub trait CommandExecutor {
    fn execute(
        &self,
        script: &str,
        directory: Option<&Path>,
        on_line: Option<LineCallback<'_>>,
    ) -> ExecResult;
}

#[derive(Error, Debug)]
enum ShellError {
    #[error("Could not run shell command: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Shell process provided no output handle.")]
    NoOutput,
}

/// Runs scripts through the platform shell (`sh -c`, `cmd /C` on
/// Windows). A working directory is entered and left inside the same
/// shell string, so the parent process never changes its own directory.
#[derive(Debug, Default)]
pub struct ShellExecutor;

impl ShellExecutor {
    pub fn new() -> Self {
        Self
    }

    fn run(
        &self,
        command_line: &str,
        on_line: Option<LineCallback<'_>>,
    ) -> Result<ExecResult, ShellError> {
        let mut child = shell_command(command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdout = child.stdout.take().ok_or(ShellError::NoOutput)?;
        let mut output = String::new();

        for line in BufReader::new(stdout).lines() {
            let line = line?;
            if let Some(callback) = on_line {
                callback(&line);
            }
            output.push_str(&line);
            output.push('\n');
        }

        let status = child.wait()?;
        Ok(ExecResult {
            status: if status.success() {
                ExitStatus::Success
            } else {
                ExitStatus::Failure
            },
            output,
        })
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute(
        &self,
        script: &str,
        directory: Option<&Path>,
        on_line: Option<LineCallback<'_>>,
    ) -> ExecResult {
        let command_line = build_command_string(script, directory);
        log::trace!("Executing command {command_line:?}");

        match self.run(&command_line, on_line) {
            Ok(result) => result,
            Err(err) => ExecResult {
                status: ExitStatus::Failure,
                output: err.to_string(),
            },
        }
    }
}

#[cfg(not(windows))]
fn shell_command(command_line: &str) -> StdCommand {
    let mut command = StdCommand::new("sh");
    command.arg("-c").arg(command_line);
    command
}

#[cfg(windows)]
fn shell_command(command_line: &str) -> StdCommand {
    let mut command = StdCommand::new("cmd");
    command.arg("/C").arg(command_line);
    command
}

/// Assembles the final shell string. Output redirection and the working
/// directory round-trip both live inside the shell invocation, so a
/// failing script cannot leak state into the parent process.
fn build_command_string(script: &str, directory: Option<&Path>) -> String {
    let main_command = format!("{script} 2>&1");

    let Some(directory) = directory else {
        return main_command;
    };

    let directory = dunce::simplified(directory);
    let return_path: PathBuf = directory.components().map(|_| "..").collect();

    format!(
        "cd {} && {} && cd {}",
        directory.display(),
        main_command,
        return_path.display()
    )
}
