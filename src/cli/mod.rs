// src/cli/mod.rs

pub mod help;
pub mod hooks;

use anyhow::Result;
use colored::Colorize;

use crate::constants::VERSION;
use crate::core::errors::Errors;
use crate::core::instruction::OpCode;
use crate::core::interpreter::Interpreter;
use crate::core::loader::Loader;
use crate::core::parser::Parser;
use crate::core::paths::{self, ConfigSearch};
use crate::core::reporter::Reporter;
use crate::models::ExitStatus;
use crate::system::executor::ShellExecutor;

use help::Help;
use hooks::Hooks;

/// The run pipeline: compile the invocation, give the hooks a chance to
/// short-circuit, discover and load the configuration, interpret the
/// bytecode, and report whatever accumulated in the error sink.
pub struct Application;

impl Application {
    pub fn run(args: &[String]) -> Result<ExitStatus> {
        let source = source_from_arguments(args);
        log::debug!("Invocation source: {source:?}");

        let mut errors = Errors::new();
        let instruction = Parser::parse(&source, &mut errors);

        // Litr called without anything useful to do. Invocations that
        // produced diagnostics fall through so they get reported.
        if instruction.count() == 0 && !errors.has_errors() {
            println!("You can run `litr --help` to see what you can do here.");
            return Ok(ExitStatus::Failure);
        }

        // Hooks that need no configuration.
        let mut version_hooks = Hooks::new(&instruction);
        version_hooks.add(OpCode::Define, &["version", "v"], |_| {
            println!("{VERSION}");
        });
        if version_hooks.execute() {
            return Ok(ExitStatus::Success);
        }

        let config_path = match paths::find_config_file()? {
            ConfigSearch::Found(path) => path,
            ConfigSearch::NotFound => {
                println!("{}", "No configuration file found!".red());
                return Ok(ExitStatus::Failure);
            }
            ConfigSearch::Duplicate(directory) => {
                println!(
                    "{}",
                    format!(
                        "You defined both, litr.toml and .litr.toml in {}. \
                         This is probably an error and you only want one of them.",
                        directory.display()
                    )
                    .yellow()
                );
                return Ok(ExitStatus::Failure);
            }
        };

        let mut reporter = Reporter::new(&config_path);

        // Invocation problems come first; nothing gets executed.
        if errors.has_errors() {
            reporter.print_errors(&errors);
            errors.flush();
            return Ok(ExitStatus::Failure);
        }

        let config = Loader::from_file(&config_path, &mut errors);
        if errors.has_errors() {
            reporter.print_errors(&errors);
            errors.flush();
            return Ok(ExitStatus::Failure);
        }

        let mut help_hooks = Hooks::new(&instruction);
        help_hooks.add(OpCode::Define, &["help", "h"], |instruction| {
            Help::new(&config).print(instruction);
        });
        if help_hooks.execute() {
            return Ok(ExitStatus::Success);
        }

        let executor = ShellExecutor::new();
        let mut interpreter = Interpreter::new(&instruction, &config);
        interpreter.execute(&executor, &mut errors);

        if errors.has_errors() {
            reporter.print_errors(&errors);
            errors.flush();
            return Ok(ExitStatus::Failure);
        }

        Ok(ExitStatus::Success)
    }
}

/// Joins argv into the invocation source. Assignment values are wrapped
/// in quotes so the scanner sees a string literal (`--a=b` → `--a="b"`).
fn source_from_arguments(args: &[String]) -> String {
    let rewritten: Vec<String> = args
        .iter()
        .map(|argument| match argument.split_once('=') {
            Some((name, value)) => format!("{name}=\"{value}\""),
            None => argument.clone(),
        })
        .collect();

    rewritten.join(" ")
}
