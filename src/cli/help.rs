// src/cli/help.rs

use colored::Colorize;

use crate::cli::hooks;
use crate::constants::VERSION;
use crate::core::instruction::Instruction;
use crate::core::loader::Loader;
use crate::core::query::Query;
use crate::models::{Command, Parameter, ParameterType};

/// Renders `litr --help`: banner, usage, the command tree and the option
/// list. Reads the configuration exclusively through the query layer.
pub struct Help<'cfg> {
    config: &'cfg Loader,
    query: Query<'cfg>,
}

impl<'cfg> Help<'cfg> {
    pub fn new(config: &'cfg Loader) -> Self {
        Self {
            config,
            query: Query::new(config),
        }
    }

    pub fn print(&self, instruction: &Instruction) {
        let command_name = hooks::command_name_before(instruction, &["help", "h"]);
        print!("{}", self.render(command_name.as_deref()));
    }

    fn render(&self, command_name: Option<&str>) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "Litr - Language Independent Task Runner [version {VERSION}]\n"
        ));
        out.push_str(
            &format!(
                "  Configuration file found under: {}\n\n",
                self.config.file_path().display()
            )
            .dimmed()
            .to_string(),
        );

        match command_name {
            Some(name) => out.push_str(&format!(
                "Usage: litr {} [options]\n\n",
                name.replace('.', " ")
            )),
            None => out.push_str("Usage: litr command [options]\n\n"),
        }

        let commands = match command_name {
            Some(name) => self.query.child_commands(name),
            None => self.query.commands(),
        };

        if !commands.is_empty() {
            out.push_str("Commands:\n");
            let padding = commands
                .iter()
                .map(|command| command.name.len())
                .max()
                .unwrap_or(0)
                + 2;
            for command in commands {
                self.render_command(&mut out, command, padding, 1);
            }
            out.push('\n');
        }

        let parameters: Vec<&Parameter> = match command_name {
            Some(name) => self.query.command_parameters(name),
            None => self.query.parameters().iter().collect(),
        };

        if !parameters.is_empty() {
            out.push_str("Options:\n");
            for parameter in parameters {
                out.push_str(&render_parameter(parameter));
            }
        }

        out
    }

    fn render_command(&self, out: &mut String, command: &Command, padding: usize, depth: usize) {
        let indent = "  ".repeat(depth);
        match &command.description {
            Some(description) => out.push_str(&format!(
                "{indent}{:<padding$}{description}\n",
                command.name
            )),
            None => out.push_str(&format!("{indent}{}\n", command.name)),
        }

        if let Some(example) = &command.example {
            for line in example.lines() {
                out.push_str(&format!("{indent}  {}\n", line.dimmed()));
            }
        }

        for child in &command.child_commands {
            self.render_command(out, child, padding.saturating_sub(2), depth + 1);
        }
    }
}

fn render_parameter(parameter: &Parameter) -> String {
    let name = match &parameter.shortcut {
        Some(shortcut) => format!("-{shortcut}, --{}", parameter.name),
        None => format!("    --{}", parameter.name),
    };

    let mut line = format!("  {name:<18}{}", parameter.description);

    if let ParameterType::Array(options) = &parameter.ty {
        let listed: Vec<String> = options.iter().map(|option| format!("\"{option}\"")).collect();
        line.push_str(&format!(" (options: {})", listed.join(", ")));
    }
    if let Some(default) = &parameter.default_value {
        line.push_str(&format!(" [default: {default}]"));
    }

    line.push('\n');
    line
}
