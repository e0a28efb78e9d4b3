// src/cli/hooks.rs

use std::rc::Rc;

use crate::core::instruction::{Instruction, OpCode};

type HookCallback<'run> = Rc<dyn Fn(&Instruction) + 'run>;

struct Hook<'run> {
    code: OpCode,
    value: String,
    callback: HookCallback<'run>,
}

/// Bytecode inspectors that run before the interpreter. A hook fires when
/// the bytecode contains its opcode with a matching constant (e.g.
/// `Define "help"`); a fired hook consumes the invocation and normal
/// execution is skipped.
pub struct Hooks<'run> {
    instruction: &'run Instruction,
    hooks: Vec<Hook<'run>>,
}

impl<'run> Hooks<'run> {
    pub fn new(instruction: &'run Instruction) -> Self {
        Self {
            instruction,
            hooks: Vec::new(),
        }
    }

    pub fn add(&mut self, code: OpCode, values: &[&str], callback: impl Fn(&Instruction) + 'run) {
        let callback: HookCallback<'run> = Rc::new(callback);
        for value in values {
            self.hooks.push(Hook {
                code,
                value: (*value).to_string(),
                callback: Rc::clone(&callback),
            });
        }
    }

    /// Walks the bytecode; the first matching hook runs and short-circuits.
    pub fn execute(&self) -> bool {
        let mut offset = 0;

        while offset < self.instruction.count() {
            let code = self.instruction.read(offset);
            offset += 1;

            for hook in &self.hooks {
                if code != hook.code as u8 {
                    continue;
                }
                let value = self
                    .instruction
                    .read_constant(self.instruction.read(offset));
                if value == hook.value {
                    (hook.callback)(self.instruction);
                    return true;
                }
            }

            if code != OpCode::Clear as u8 {
                offset += 1;
            }
        }

        false
    }
}

/// The dotted command path opened before one of the given parameter names
/// appears in the bytecode. Empty scope yields `None`; a parameter that
/// never occurs yields `None` as well.
pub fn command_name_before(instruction: &Instruction, names: &[&str]) -> Option<String> {
    let mut scope: Vec<String> = Vec::new();
    let mut offset = 0;

    while offset < instruction.count() {
        let code = OpCode::from_byte(instruction.read(offset));
        offset += 1;

        match code {
            Some(OpCode::BeginScope) => {
                let name = instruction.read_constant(instruction.read(offset));
                scope.push(name.to_string());
                offset += 1;
            }
            Some(OpCode::Clear) => {
                scope.pop();
            }
            Some(OpCode::Define) => {
                let name = instruction.read_constant(instruction.read(offset));
                offset += 1;
                if names.contains(&name) {
                    if scope.is_empty() {
                        return None;
                    }
                    return Some(scope.join("."));
                }
            }
            Some(_) => offset += 1,
            None => {}
        }
    }

    None
}
