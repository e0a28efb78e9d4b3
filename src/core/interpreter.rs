// src/core/interpreter.rs

use std::collections::HashMap;

use crate::core::errors::{ErrorKind, Errors, RunError};
use crate::core::instruction::{Instruction, OpCode};
use crate::core::loader::Loader;
use crate::core::query::Query;
use crate::core::script::compiler::Compiler;
use crate::models::{Command, ExitStatus, Output, ParameterType, Variable, VariableValue};
use crate::system::executor::CommandExecutor;

/// Walks the invocation bytecode: binds variables, validates them against
/// the configuration, expands each command's scripts and dispatches them
/// through the executor.
///
/// The scope stack mirrors the bytecode's control flow: `BeginScope`
/// pushes a frame, `Clear` pops it. The bottom frame holds the defaults
/// seeded from the configuration. Once `stop` is set no further scripts
/// are launched.
pub struct Interpreter<'run> {
    instruction: &'run Instruction,
    query: Query<'run>,
    offset: usize,
    current_variable: String,
    stop: bool,
    scope: Vec<HashMap<String, Variable>>,
}

/// Dots in a command path read awkwardly in messages; show spaces.
pub fn command_path_to_human_readable(path: &str) -> String {
    path.replace('.', " ")
}

impl<'run> Interpreter<'run> {
    pub fn new(instruction: &'run Instruction, config: &'run Loader) -> Self {
        let mut interpreter = Self {
            instruction,
            query: Query::new(config),
            offset: 0,
            current_variable: String::new(),
            stop: false,
            scope: vec![HashMap::new()],
        };

        interpreter.define_default_variables();
        interpreter
    }

    pub fn execute(&mut self, executor: &dyn CommandExecutor, errors: &mut Errors) {
        self.offset = 0;

        while self.offset < self.instruction.count() {
            if self.stop {
                return;
            }
            self.execute_instruction(executor, errors);
        }
    }

    /// Seed the bottom frame: booleans default to `false`, strings and
    /// arrays to their configured default.
    fn define_default_variables(&mut self) {
        let query = self.query;
        let frame = &mut self.scope[0];

        for param in query.parameters() {
            match &param.ty {
                ParameterType::Boolean => {
                    frame.insert(param.name.clone(), Variable::boolean(param.name.clone(), false));
                }
                ParameterType::String | ParameterType::Array(_) => {
                    if let Some(default) = &param.default_value {
                        frame.insert(
                            param.name.clone(),
                            Variable::string(param.name.clone(), default.clone()),
                        );
                    }
                }
            }
        }
    }

    fn execute_instruction(&mut self, executor: &dyn CommandExecutor, errors: &mut Errors) {
        let byte = self.instruction.read(self.offset);
        self.offset += 1;

        match OpCode::from_byte(byte) {
            Some(OpCode::Clear) => self.clear_scope(),
            Some(OpCode::Define) => self.define_variable(errors),
            Some(OpCode::Constant) => self.set_constant(errors),
            Some(OpCode::BeginScope) => self.begin_scope(),
            Some(OpCode::Execute) => self.call_instruction(executor, errors),
            // Forward compatibility: ignore unknown opcodes.
            None => {}
        }
    }

    fn read_current_value(&self) -> String {
        let index = self.instruction.read(self.offset);
        self.instruction.read_constant(index).to_string()
    }

    fn begin_scope(&mut self) {
        self.scope.push(HashMap::new());
        self.offset += 1;
    }

    fn clear_scope(&mut self) {
        self.scope.pop();
    }

    fn define_variable(&mut self, errors: &mut Errors) {
        let name = self.read_current_value();
        let query = self.query;

        let Some(param) = query.parameter(&name) else {
            self.handle_error(
                errors,
                RunError::new(
                    ErrorKind::CommandNotFound,
                    format!(
                        "Parameter with the name \"{name}\" is not defined.\n  Run `litr --help` to see a list of available options."
                    ),
                ),
            );
            return;
        };

        let variable = Variable::from_parameter(param);
        self.current_variable = variable.name.clone();
        if let Some(frame) = self.scope.last_mut() {
            frame.insert(variable.name.clone(), variable);
        }

        self.offset += 1;
    }

    fn set_constant(&mut self, errors: &mut Errors) {
        let value = self.read_current_value();
        let query = self.query;

        let Some(param) = query.parameter(&self.current_variable) else {
            self.offset += 1;
            return;
        };

        let new_value = match &param.ty {
            ParameterType::String => VariableValue::String(value),
            ParameterType::Array(options) => {
                if !options.iter().any(|option| option == &value) {
                    let listed: Vec<String> =
                        options.iter().map(|option| format!("\"{option}\"")).collect();
                    self.handle_error(
                        errors,
                        RunError::new(
                            ErrorKind::UnknownParamValue,
                            format!(
                                "Parameter value \"{value}\" is no valid option for \"{}\".\n  Available options are: {}",
                                param.name,
                                listed.join(", ")
                            ),
                        ),
                    );
                    return;
                }
                VariableValue::String(value)
            }
            ParameterType::Boolean => match value.as_str() {
                "true" => VariableValue::Boolean(true),
                "false" => VariableValue::Boolean(false),
                _ => {
                    self.handle_error(
                        errors,
                        RunError::new(
                            ErrorKind::MalformedParam,
                            format!(
                                "Parameter value \"{value}\" is not valid for boolean option \"{}\".\n  Please use \"false\", \"true\" or no value for true as well.",
                                param.name
                            ),
                        ),
                    );
                    return;
                }
            },
        };

        let name = self.current_variable.clone();
        if let Some(variable) = self.scope.last_mut().and_then(|frame| frame.get_mut(&name)) {
            variable.value = new_value;
        }

        self.offset += 1;
    }

    fn call_instruction(&mut self, executor: &dyn CommandExecutor, errors: &mut Errors) {
        let name = self.read_current_value();
        let query = self.query;

        let Some(command) = query.command(&name) else {
            self.handle_error(
                errors,
                RunError::new(
                    ErrorKind::CommandNotFound,
                    format!(
                        "Command \"{name}\" could not be found.\n  Run `litr --help` to see a list of commands."
                    ),
                ),
            );
            return;
        };

        log::debug!("Executing command \"{name}\"");
        self.call_command(command, &name, executor, errors);
        self.offset += 1;
    }

    fn call_command(
        &mut self,
        command: &Command,
        path: &str,
        executor: &dyn CommandExecutor,
        errors: &mut Errors,
    ) {
        self.validate_required_parameters(command, errors);
        if self.stop {
            return;
        }

        let silent = command.output == Output::Silent;
        let scripts = self.parse_scripts(command, errors);
        if self.stop {
            return;
        }

        let command_path = command_path_to_human_readable(path);

        if command.directory.is_empty() {
            self.run_scripts(&scripts, &command_path, None, silent, executor, errors);
        } else {
            for directory in &command.directory {
                if self.stop {
                    return;
                }
                self.run_scripts(
                    &scripts,
                    &command_path,
                    Some(directory.as_path()),
                    silent,
                    executor,
                    errors,
                );
            }
        }

        if self.stop {
            return;
        }

        self.call_child_commands(command, path, executor, errors);
    }

    fn call_child_commands(
        &mut self,
        command: &Command,
        path: &str,
        executor: &dyn CommandExecutor,
        errors: &mut Errors,
    ) {
        for child in &command.child_commands {
            if self.stop {
                return;
            }
            let child_path = format!("{path}.{}", child.name);
            self.call_command(child, &child_path, executor, errors);
        }
    }

    fn run_scripts(
        &mut self,
        scripts: &[String],
        command_path: &str,
        directory: Option<&std::path::Path>,
        silent: bool,
        executor: &dyn CommandExecutor,
        errors: &mut Errors,
    ) {
        for script in scripts {
            if self.stop {
                return;
            }

            let print_line = |line: &str| println!("{line}");
            let result = if silent {
                executor.execute(script, directory, None)
            } else {
                executor.execute(script, directory, Some(&print_line))
            };

            if result.status == ExitStatus::Failure {
                self.handle_error(
                    errors,
                    RunError::new(
                        ErrorKind::ExecutionFailure,
                        format!("Problem executing the command defined in \"{command_path}\"."),
                    ),
                );
                return;
            }
        }
    }

    fn parse_scripts(&mut self, command: &Command, errors: &mut Errors) -> Vec<String> {
        let variables = self.scope_variables();
        let mut scripts = Vec::new();

        for (script, location) in command.script.iter().zip(&command.locations) {
            let before = errors.len();
            let compiled = Compiler::compile(script, location, &variables, errors);
            if errors.len() > before {
                self.stop = true;
                break;
            }
            scripts.push(compiled);
        }

        scripts
    }

    /// Merged view over all scope frames; later frames win.
    fn scope_variables(&self) -> HashMap<String, Variable> {
        let mut variables = HashMap::new();
        for frame in &self.scope {
            for (name, variable) in frame {
                variables.insert(name.clone(), variable.clone());
            }
        }
        variables
    }

    fn validate_required_parameters(&mut self, command: &Command, errors: &mut Errors) {
        let query = self.query;

        for param in query.used_parameters(command) {
            if !self.is_variable_defined(&param.name) {
                self.handle_error(
                    errors,
                    RunError::new(
                        ErrorKind::ExecutionFailure,
                        format!(
                            "The parameter --{} is required. You should run the command again with the required parameter.",
                            param.name
                        ),
                    ),
                );
            }
        }
    }

    fn is_variable_defined(&self, name: &str) -> bool {
        self.scope_variables().get(name).is_some_and(|variable| {
            match &variable.value {
                // An empty string counts as not provided.
                VariableValue::String(value) => !value.is_empty(),
                VariableValue::Boolean(_) => true,
            }
        })
    }

    fn handle_error(&mut self, errors: &mut Errors, error: RunError) {
        self.stop = true;
        errors.push(error);
    }
}
