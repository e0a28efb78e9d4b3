// src/core/loader.rs

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use toml_edit::{Array, ImDocument, Item};

use crate::constants::RESERVED_PARAMETER_NAMES;
use crate::core::errors::{ErrorKind, Errors, RunError};
use crate::models::{Command, Location, Output, Parameter, ParameterType};

/// Loads the configuration file into the command and parameter trees.
///
/// The loader owns every parsed entity; lookups go through
/// [`crate::core::query::Query`], which borrows from here. Diagnostics are
/// collected exhaustively — a malformed command does not stop the rest of
/// the file from loading.
#[derive(Debug, Default)]
pub struct Loader {
    file_path: PathBuf,
    commands: Vec<Command>,
    parameters: Vec<Parameter>,
}

impl Loader {
    pub fn from_file(path: &Path, errors: &mut Errors) -> Self {
        match fs::read_to_string(path) {
            Ok(source) => Self::from_source(&source, path, errors),
            Err(err) => {
                errors.push(RunError::new(
                    ErrorKind::MalformedFile,
                    format!("Cannot read configuration file: {err}"),
                ));
                Self {
                    file_path: path.to_path_buf(),
                    ..Self::default()
                }
            }
        }
    }

    pub fn from_source(source: &str, path: impl Into<PathBuf>, errors: &mut Errors) -> Self {
        let mut loader = Self {
            file_path: path.into(),
            commands: Vec::new(),
            parameters: Vec::new(),
        };

        let document = match ImDocument::parse(source) {
            Ok(document) => document,
            Err(err) => {
                // The library message is already stripped of the source
                // excerpt; only the location is carried over.
                let mut error =
                    RunError::new(ErrorKind::MalformedFile, err.message().to_string());
                error.location = err.span().map(|span| location_from_span(source, &span));
                errors.push(error);
                return loader;
            }
        };

        let root = loader
            .file_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        if let Some(commands) = document.as_table().get("commands")
            && let Some(table) = commands.as_table_like()
        {
            for (name, definition) in table.iter() {
                let command = create_command(source, name, definition, &root, errors);
                loader.commands.push(command);
            }
        }

        if let Some(params) = document.as_table().get("params")
            && let Some(table) = params.as_table_like()
        {
            for (name, definition) in table.iter() {
                collect_parameter(source, name, definition, &mut loader.parameters, errors);
            }
        }

        log::debug!(
            "Loaded {} commands and {} parameters from {}",
            loader.commands.len(),
            loader.parameters.len(),
            loader.file_path.display()
        );

        loader
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

fn create_command(
    source: &str,
    name: &str,
    definition: &Item,
    root: &Path,
    errors: &mut Errors,
) -> Command {
    let mut command = Command::new(name);

    // Simple string form.
    if let Some(line) = definition.as_str() {
        command.script.push(line.to_string());
        command.locations.push(item_location(source, definition));
        return command;
    }

    // Simple string array form.
    if let Some(array) = definition.as_array() {
        add_script_array(source, &mut command, array, errors);
        return command;
    }

    // From here on it needs to be a table to be valid.
    let Some(table) = definition.as_table_like() else {
        errors.push(RunError::located(
            ErrorKind::MalformedCommand,
            "A command can be a string or a table.",
            item_location(source, definition),
        ));
        return command;
    };

    for (property, value) in table.iter() {
        match property {
            "script" => {
                if let Some(line) = value.as_str() {
                    command.script.push(line.to_string());
                    command.locations.push(item_location(source, value));
                } else if let Some(array) = value.as_array() {
                    add_script_array(source, &mut command, array, errors);
                } else {
                    errors.push(RunError::located(
                        ErrorKind::MalformedScript,
                        "A command script can be either a string or array of strings.",
                        item_location(source, value),
                    ));
                }
            }
            "description" => match value.as_str() {
                Some(text) => command.description = Some(text.to_string()),
                None => errors.push(RunError::located(
                    ErrorKind::MalformedCommand,
                    r#"The "description" can only be a string."#,
                    item_location(source, value),
                )),
            },
            "example" => match value.as_str() {
                Some(text) => command.example = Some(text.to_string()),
                None => errors.push(RunError::located(
                    ErrorKind::MalformedCommand,
                    r#"The "example" can only be a string."#,
                    item_location(source, value),
                )),
            },
            "dir" => add_directories(source, &mut command, value, root, errors),
            "output" => match value.as_str() {
                Some("unchanged") => command.output = Output::Unchanged,
                Some("silent") => command.output = Output::Silent,
                _ => errors.push(RunError::located(
                    ErrorKind::MalformedCommand,
                    r#"The "output" can either be "unchanged" or "silent"."#,
                    item_location(source, value),
                )),
            },
            _ => {
                // Any other table-valued property is a nested child
                // command; anything else is unknown.
                if value.as_table_like().is_some() {
                    let child = create_command(source, property, value, root, errors);
                    command.child_commands.push(child);
                } else {
                    errors.push(RunError::located(
                        ErrorKind::UnknownCommandProperty,
                        format!(
                            r#"The command property "{property}" does not exist. Please refer to the docs."#
                        ),
                        item_location(source, value),
                    ));
                }
            }
        }
    }

    command
}

fn add_script_array(source: &str, command: &mut Command, array: &Array, errors: &mut Errors) {
    for value in array.iter() {
        let Some(line) = value.as_str() else {
            errors.push(RunError::located(
                ErrorKind::MalformedScript,
                "A command script can be either a string or array of strings.",
                value
                    .span()
                    .map(|span| location_from_span(source, &span))
                    .unwrap_or_default(),
            ));
            // Stop after the first error to avoid being too verbose.
            break;
        };

        command.script.push(line.to_string());
        command.locations.push(
            value
                .span()
                .map(|span| location_from_span(source, &span))
                .unwrap_or_default(),
        );
    }
}

fn add_directories(
    source: &str,
    command: &mut Command,
    value: &Item,
    root: &Path,
    errors: &mut Errors,
) {
    const MESSAGE: &str = r#"A "dir" can either be a string or array of strings."#;

    if let Some(dir) = value.as_str() {
        command.directory.push(root.join(dir));
        return;
    }

    if let Some(array) = value.as_array() {
        for entry in array.iter() {
            match entry.as_str() {
                Some(dir) => command.directory.push(root.join(dir)),
                None => errors.push(RunError::located(
                    ErrorKind::MalformedCommand,
                    MESSAGE,
                    entry
                        .span()
                        .map(|span| location_from_span(source, &span))
                        .unwrap_or_default(),
                )),
            }
        }
        return;
    }

    errors.push(RunError::located(
        ErrorKind::MalformedCommand,
        MESSAGE,
        item_location(source, value),
    ));
}

fn collect_parameter(
    source: &str,
    name: &str,
    definition: &Item,
    parameters: &mut Vec<Parameter>,
    errors: &mut Errors,
) {
    if RESERVED_PARAMETER_NAMES.contains(&name) {
        errors.push(RunError::located(
            ErrorKind::ReservedParam,
            format!(r#"The parameter name "{name}" is reserved by Litr."#),
            item_location(source, definition),
        ));
        return;
    }

    // Simple string form: the string is the description.
    if let Some(description) = definition.as_str() {
        let mut parameter = Parameter::new(name);
        parameter.description = description.to_string();
        parameters.push(parameter);
        return;
    }

    let Some(table) = definition.as_table_like() else {
        errors.push(RunError::located(
            ErrorKind::MalformedParam,
            "A parameter needs to be a string or a table.",
            item_location(source, definition),
        ));
        return;
    };

    let mut parameter = Parameter::new(name);

    match table.get("description") {
        None => errors.push(RunError::located(
            ErrorKind::MalformedParam,
            r#"You're missing the "description" field."#,
            item_location(source, definition),
        )),
        Some(value) => match value.as_str() {
            Some(text) => parameter.description = text.to_string(),
            None => errors.push(RunError::located(
                ErrorKind::MalformedParam,
                r#"The "description" can only be a string."#,
                item_location(source, value),
            )),
        },
    }

    if let Some(value) = table.get("shortcut") {
        add_shortcut(source, &mut parameter, value, parameters, errors);
    }

    if let Some(value) = table.get("type") {
        add_type(source, &mut parameter, value, errors);
    }

    if let Some(value) = table.get("default") {
        add_default(source, &mut parameter, value, errors);
    }

    parameters.push(parameter);
}

fn add_shortcut(
    source: &str,
    parameter: &mut Parameter,
    value: &Item,
    existing: &[Parameter],
    errors: &mut Errors,
) {
    let Some(shortcut) = value.as_str() else {
        errors.push(RunError::located(
            ErrorKind::MalformedParam,
            r#"A "shortcut" can only be a string."#,
            item_location(source, value),
        ));
        return;
    };

    if RESERVED_PARAMETER_NAMES.contains(&shortcut) {
        errors.push(RunError::located(
            ErrorKind::ReservedParam,
            format!(r#"The shortcut name "{shortcut}" is reserved by Litr."#),
            item_location(source, value),
        ));
        return;
    }

    if shortcut.chars().count() != 1 {
        errors.push(RunError::located(
            ErrorKind::MalformedParam,
            r#"A "shortcut" can only be a single character."#,
            item_location(source, value),
        ));
        return;
    }

    if let Some(taken) = existing
        .iter()
        .find(|param| param.shortcut.as_deref() == Some(shortcut))
    {
        errors.push(RunError::located(
            ErrorKind::ValueAlreadyInUse,
            format!(
                r#"The shortcut name "{shortcut}" is already used for parameter "{}"."#,
                taken.name
            ),
            item_location(source, value),
        ));
        return;
    }

    parameter.shortcut = Some(shortcut.to_string());
}

fn add_type(source: &str, parameter: &mut Parameter, value: &Item, errors: &mut Errors) {
    if let Some(ty) = value.as_str() {
        match ty {
            "string" => parameter.ty = ParameterType::String,
            "boolean" => parameter.ty = ParameterType::Boolean,
            _ => errors.push(RunError::located(
                ErrorKind::UnknownParamValue,
                format!(
                    r#"The "type" option as string can only be "string" or "boolean". Provided value "{ty}" is not known."#
                ),
                item_location(source, value),
            )),
        }
        return;
    }

    if let Some(array) = value.as_array() {
        let mut options = Vec::new();
        for entry in array.iter() {
            match entry.as_str() {
                Some(option) => options.push(option.to_string()),
                None => errors.push(RunError::located(
                    ErrorKind::MalformedParam,
                    r#"The options provided in "type" are not all strings."#,
                    item_location(source, value),
                )),
            }
        }
        parameter.ty = ParameterType::Array(options);
        return;
    }

    errors.push(RunError::located(
        ErrorKind::MalformedParam,
        r#"A "type" can only be "string" or an array of options as strings."#,
        item_location(source, value),
    ));
}

fn add_default(source: &str, parameter: &mut Parameter, value: &Item, errors: &mut Errors) {
    let Some(default) = value.as_str() else {
        errors.push(RunError::located(
            ErrorKind::MalformedParam,
            r#"The field "default" needs to be a string."#,
            item_location(source, value),
        ));
        return;
    };

    if let ParameterType::Array(options) = &parameter.ty
        && !options.iter().any(|option| option == default)
    {
        errors.push(RunError::located(
            ErrorKind::MalformedParam,
            format!(r#"Cannot find default value "{default}" inside "type" list."#),
            item_location(source, value),
        ));
        return;
    }

    parameter.default_value = Some(default.to_string());
}

fn item_location(source: &str, item: &Item) -> Location {
    let span = match item {
        Item::Value(value) => value.span(),
        Item::Table(table) => table.span(),
        Item::ArrayOfTables(array) => array.span(),
        Item::None => None,
    };

    span.map(|span| location_from_span(source, &span))
        .unwrap_or_default()
}

fn location_from_span(source: &str, span: &Range<usize>) -> Location {
    let start = span.start.min(source.len());
    let prefix = &source[..start];

    let line = prefix.bytes().filter(|b| *b == b'\n').count() + 1;
    let line_start = prefix.rfind('\n').map_or(0, |index| index + 1);
    let line_end = source[line_start..]
        .find('\n')
        .map_or(source.len(), |index| line_start + index);

    Location::new(
        line as u32,
        (start - line_start) as u32 + 1,
        source[line_start..line_end].trim_end_matches('\r'),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(source: &str) -> (Loader, Vec<RunError>) {
        let mut errors = Errors::new();
        let loader = Loader::from_source(source, "/tmp/litr.toml", &mut errors);
        (loader, errors.iter().cloned().collect())
    }

    #[test]
    fn command_from_string_definition() {
        let (loader, errors) = load("[commands]\nbuild = \"echo hi\"\n");
        assert!(errors.is_empty());

        let command = &loader.commands()[0];
        assert_eq!(command.name, "build");
        assert_eq!(command.script, vec!["echo hi"]);
        assert_eq!(command.locations.len(), 1);
        assert_eq!(command.locations[0].line, 2);
        assert_eq!(command.locations[0].line_text, "build = \"echo hi\"");
    }

    #[test]
    fn command_from_array_definition() {
        let (loader, errors) = load("[commands]\nbuild = [\"echo a\", \"echo b\"]\n");
        assert!(errors.is_empty());

        let command = &loader.commands()[0];
        assert_eq!(command.script, vec!["echo a", "echo b"]);
        assert_eq!(command.script.len(), command.locations.len());
    }

    #[test]
    fn command_from_table_definition() {
        let source = r#"
[commands.build]
script = "cargo build"
description = "Build the project."
example = "litr build"
output = "silent"
"#;
        let (loader, errors) = load(source);
        assert!(errors.is_empty());

        let command = &loader.commands()[0];
        assert_eq!(command.script, vec!["cargo build"]);
        assert_eq!(command.description.as_deref(), Some("Build the project."));
        assert_eq!(command.example.as_deref(), Some("litr build"));
        assert_eq!(command.output, Output::Silent);
    }

    #[test]
    fn directories_resolve_against_the_config_directory() {
        let source = "[commands.build]\nscript = \"make\"\ndir = [\"a\", \"b\"]\n";
        let (loader, errors) = load(source);
        assert!(errors.is_empty());

        let command = &loader.commands()[0];
        assert_eq!(
            command.directory,
            vec![PathBuf::from("/tmp/a"), PathBuf::from("/tmp/b")]
        );
    }

    #[test]
    fn nested_child_commands() {
        let source = r#"
[commands.build]
script = "echo root"

[commands.build.cpp]
script = "echo cpp"
"#;
        let (loader, errors) = load(source);
        assert!(errors.is_empty());

        let command = &loader.commands()[0];
        assert_eq!(command.child_commands.len(), 1);
        assert_eq!(command.child_commands[0].name, "cpp");
        assert_eq!(command.child_commands[0].script, vec!["echo cpp"]);
    }

    #[test]
    fn commands_keep_document_order() {
        let (loader, errors) = load("[commands]\nzeta = \"z\"\nalpha = \"a\"\n");
        assert!(errors.is_empty());

        let names: Vec<&str> = loader.commands().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn unknown_command_property_is_reported() {
        let (_, errors) = load("[commands.build]\nscript = \"make\"\nwrong = 1\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::UnknownCommandProperty);
        assert_eq!(
            errors[0].message,
            r#"The command property "wrong" does not exist. Please refer to the docs."#
        );
    }

    #[test]
    fn malformed_script_array_stops_at_first_error() {
        let (loader, errors) = load("[commands]\nbuild = [\"echo a\", 1, 2]\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::MalformedScript);

        // The lines before the error survive.
        assert_eq!(loader.commands()[0].script, vec!["echo a"]);
    }

    #[test]
    fn command_with_wrong_definition_type() {
        let (_, errors) = load("[commands]\nbuild = 42\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::MalformedCommand);
        assert_eq!(errors[0].message, "A command can be a string or a table.");
    }

    #[test]
    fn output_value_is_validated() {
        let (_, errors) = load("[commands.build]\nscript = \"x\"\noutput = \"loud\"\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            r#"The "output" can either be "unchanged" or "silent"."#
        );
    }

    #[test]
    fn parameter_from_string_definition() {
        let (loader, errors) = load("[params]\ntarget = \"Build target.\"\n");
        assert!(errors.is_empty());

        let parameter = &loader.parameters()[0];
        assert_eq!(parameter.name, "target");
        assert_eq!(parameter.description, "Build target.");
        assert_eq!(parameter.ty, ParameterType::String);
        assert_eq!(parameter.shortcut, None);
    }

    #[test]
    fn parameter_from_table_definition() {
        let source = r#"
[params.target]
description = "Build target."
shortcut = "t"
type = ["debug", "release"]
default = "debug"
"#;
        let (loader, errors) = load(source);
        assert!(errors.is_empty());

        let parameter = &loader.parameters()[0];
        assert_eq!(parameter.shortcut.as_deref(), Some("t"));
        assert_eq!(
            parameter.ty,
            ParameterType::Array(vec!["debug".into(), "release".into()])
        );
        assert_eq!(parameter.default_value.as_deref(), Some("debug"));
    }

    #[test]
    fn boolean_parameter_type() {
        let source = "[params.nolog]\ndescription = \"No logs.\"\ntype = \"boolean\"\n";
        let (loader, errors) = load(source);
        assert!(errors.is_empty());
        assert_eq!(loader.parameters()[0].ty, ParameterType::Boolean);
    }

    #[test]
    fn reserved_parameter_name_is_rejected() {
        let (loader, errors) = load("[params]\nhelp = \"Nope.\"\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::ReservedParam);
        assert_eq!(
            errors[0].message,
            r#"The parameter name "help" is reserved by Litr."#
        );
        assert!(loader.parameters().is_empty());

        let location = errors[0].location.as_ref().expect("location");
        assert_eq!(location.line, 2);
    }

    #[test]
    fn reserved_shortcut_is_rejected() {
        let source = "[params.target]\ndescription = \"d\"\nshortcut = \"h\"\n";
        let (_, errors) = load(source);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::ReservedParam);
    }

    #[test]
    fn duplicate_shortcut_is_rejected() {
        let source = r#"
[params.target]
description = "d"
shortcut = "t"

[params.tool]
description = "d"
shortcut = "t"
"#;
        let (_, errors) = load(source);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::ValueAlreadyInUse);
        assert_eq!(
            errors[0].message,
            r#"The shortcut name "t" is already used for parameter "target"."#
        );
    }

    #[test]
    fn multi_character_shortcut_is_rejected() {
        let source = "[params.target]\ndescription = \"d\"\nshortcut = \"tt\"\n";
        let (_, errors) = load(source);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            r#"A "shortcut" can only be a single character."#
        );
    }

    #[test]
    fn missing_description_is_reported() {
        let (_, errors) = load("[params.target]\nshortcut = \"t\"\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            r#"You're missing the "description" field."#
        );
    }

    #[test]
    fn default_must_be_in_the_type_list() {
        let source = r#"
[params.target]
description = "d"
type = ["debug", "release"]
default = "staging"
"#;
        let (loader, errors) = load(source);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].message,
            r#"Cannot find default value "staging" inside "type" list."#
        );
        assert_eq!(loader.parameters()[0].default_value, None);
    }

    #[test]
    fn unknown_type_value_is_reported() {
        let source = "[params.target]\ndescription = \"d\"\ntype = \"number\"\n";
        let (_, errors) = load(source);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::UnknownParamValue);
    }

    #[test]
    fn syntax_errors_map_to_malformed_file() {
        let (_, errors) = load("[commands\nbuild = \"x\"\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::MalformedFile);
        assert!(errors[0].location.is_some());
    }

    #[test]
    fn duplicate_keys_map_to_malformed_file() {
        let (_, errors) = load("[commands]\nbuild = \"a\"\nbuild = \"b\"\n");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::MalformedFile);
        assert!(
            errors[0].message.contains("duplicate"),
            "got {:?}",
            errors[0].message
        );
    }

    #[test]
    fn diagnostics_collect_across_the_whole_file() {
        let source = r#"
[commands]
build = 42
run = "echo ok"

[params]
help = "reserved"
"#;
        let (loader, errors) = load(source);
        assert_eq!(errors.len(), 2);
        assert_eq!(loader.commands().len(), 2);
        assert_eq!(loader.commands()[1].script, vec!["echo ok"]);
    }

    #[test]
    fn script_and_location_lists_stay_parallel() {
        let source = r#"
[commands]
a = "one"
b = ["two", "three"]

[commands.c]
script = ["four"]
"#;
        let (loader, errors) = load(source);
        assert!(errors.is_empty());
        for command in loader.commands() {
            assert_eq!(command.script.len(), command.locations.len());
        }
    }

    #[test]
    fn location_column_points_at_the_value() {
        let (loader, errors) = load("[commands]\nbuild = \"echo hi\"\n");
        assert!(errors.is_empty());

        // The script value starts at the opening quote.
        let location = &loader.commands()[0].locations[0];
        assert_eq!(location.column, 9);
    }
}
