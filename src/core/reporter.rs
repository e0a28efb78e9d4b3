// src/core/reporter.rs

use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::core::errors::{ErrorKind, Errors, RunError};

/// Formats accumulated diagnostics for the terminal: title and source
/// line in red, the file pointer dimmed, and the message aligned under
/// the offending column. The single user-facing output path for errors.
pub struct Reporter {
    file_path: PathBuf,
    multiple_errors: bool,
}

impl Reporter {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            multiple_errors: false,
        }
    }

    pub fn print_errors(&mut self, errors: &Errors) {
        self.multiple_errors = false;
        for error in errors.iter() {
            self.print_error(error);
        }
    }

    fn print_error(&mut self, error: &RunError) {
        match error.kind {
            ErrorKind::CommandNotFound => {
                println!("{}", format!("Error: {}", error.message).red());
            }
            ErrorKind::ExecutionFailure => {
                println!("{}", format!("Error: {}", error.message).red());
                println!("{}", format!("  → {}", self.file_path.display()).dimmed());
            }
            _ => self.print_located_error(error),
        }

        self.multiple_errors = true;
    }

    fn print_located_error(&self, error: &RunError) {
        if self.multiple_errors {
            println!("{}", " ...".red());
        } else {
            println!("{}", format!("Error: {}", error.kind.title()).red());
            println!("{}", format!("  → {}", self.file_path.display()).dimmed());
        }

        let Some(location) = &error.location else {
            println!("{}", format!("Error: {}", error.message).red());
            return;
        };

        println!(
            "{}",
            format!("{} | {}", location.line, location.line_text).red()
        );
        println!(
            "{}",
            caret_line(location.line, location.column, &error.message).red()
        );
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

/// The message line, with the `└─ ` elbow right-aligned so it sits under
/// the offending column of the printed source line.
fn caret_line(line: u32, column: u32, message: &str) -> String {
    format!(
        "{:>line_width$} | {:>column$}{message}",
        " ",
        "└─ ",
        line_width = count_digits(line) as usize,
        column = column.max(3) as usize,
    )
}

fn count_digits(mut number: u32) -> u32 {
    if number < 10 {
        return 1;
    }

    let mut count = 0;
    while number > 0 {
        number /= 10;
        count += 1;
    }
    count
}
