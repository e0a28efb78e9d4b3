// src/core/query.rs

use crate::core::loader::Loader;
use crate::core::script::compiler;
use crate::models::{Command, Parameter};

/// Read-only lookups over the loaded configuration. All operations are
/// pure; results borrow from the loader.
#[derive(Debug, Clone, Copy)]
pub struct Query<'cfg> {
    config: &'cfg Loader,
}

impl<'cfg> Query<'cfg> {
    pub fn new(config: &'cfg Loader) -> Self {
        Self { config }
    }

    /// Resolves a command by its dotted name, walking child commands
    /// segment by segment.
    pub fn command(&self, name: &str) -> Option<&'cfg Command> {
        let mut parts = name.split('.');
        let first = parts.next()?;

        let mut command = command_by_name(first, self.config.commands())?;
        for part in parts {
            command = command_by_name(part, &command.child_commands)?;
        }

        Some(command)
    }

    /// Top-level commands in document order.
    pub fn commands(&self) -> &'cfg [Command] {
        self.config.commands()
    }

    /// Child commands of the named command; empty when the command does
    /// not exist or has no children.
    pub fn child_commands(&self, name: &str) -> &'cfg [Command] {
        self.command(name)
            .map_or(&[], |command| command.child_commands.as_slice())
    }

    /// Resolves a parameter by its long name, falling back to shortcuts.
    pub fn parameter(&self, name: &str) -> Option<&'cfg Parameter> {
        self.config
            .parameters()
            .iter()
            .find(|param| param.name == name)
            .or_else(|| {
                self.config
                    .parameters()
                    .iter()
                    .find(|param| param.shortcut.as_deref() == Some(name))
            })
    }

    /// All parameters in document order.
    pub fn parameters(&self) -> &'cfg [Parameter] {
        self.config.parameters()
    }

    /// The parameters actually referenced by the named command's scripts
    /// or by any of its descendants' scripts, in order of first
    /// appearance.
    pub fn command_parameters(&self, name: &str) -> Vec<&'cfg Parameter> {
        let Some(command) = self.command(name) else {
            return Vec::new();
        };

        self.used_parameters(command)
    }

    /// Same as [`Self::command_parameters`], for an already resolved
    /// command.
    pub fn used_parameters(&self, command: &Command) -> Vec<&'cfg Parameter> {
        let mut names = Vec::new();
        collect_used_names(command, &mut names);

        names
            .iter()
            .filter_map(|name| self.parameter(name))
            .collect()
    }
}

fn command_by_name<'a>(name: &str, commands: &'a [Command]) -> Option<&'a Command> {
    commands.iter().find(|command| command.name == name)
}

fn collect_used_names(command: &Command, names: &mut Vec<String>) {
    for script in &command.script {
        for name in compiler::collect_references(script) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    for child in &command.child_commands {
        collect_used_names(child, names);
    }
}
