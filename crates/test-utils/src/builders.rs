#![allow(dead_code)]

use serde_json::Value;
use zpsexec::reaction::{Reaction, ReactionError};
use zpsexec::script::{Script, Stage};

/// Builder for `Script` to simplify test setup.
#[derive(Default)]
pub struct ScriptBuilder {
    script: Script,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generate(mut self, language: &str) -> Self {
        self.script.generate.push(Stage::new(language));
        self
    }

    pub fn execute(mut self, language: &str) -> Self {
        self.script.execute.push(Stage::new(language));
        self
    }

    /// Execute stage carrying an extra `className` field.
    pub fn execute_class(mut self, language: &str, class_name: &str) -> Self {
        self.script.execute.push(
            Stage::new(language).with_field("className", Value::String(class_name.to_string())),
        );
        self
    }

    pub fn build(self) -> Script {
        self.script
    }
}

/// Error reaction with the given class and message.
pub fn error_reaction(class_name: &str, message: &str) -> Reaction {
    Reaction::Error(ReactionError {
        class_name: class_name.to_string(),
        message: message.to_string(),
        line_number: 7,
        phase: "execute".to_string(),
        skipped: false,
    })
}
