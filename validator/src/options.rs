use std::collections::BTreeSet;

use mdnb::config::language_set;
use serde::{Deserialize, Serialize};

use crate::checker::SyntaxChecker;
use crate::interpreter::InterpreterChecker;
use crate::tree_sitter_checker::TreeSitterChecker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckerKind {
    /// The language's own parser (`ast.parse`) in a subprocess.
    #[default]
    Interpreter,
    /// Static parse in process. More lenient than the interpreter: it accepts
    /// some Python 2 syntax.
    TreeSitter,
}

/// Validation settings, the `[check]` table of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckOptions {
    /// Fence tags to check, compared case-insensitively.
    pub languages: BTreeSet<String>,
    /// Treat blocks containing `>>>` prompts as session transcripts.
    pub strip_prompts: bool,
    pub checker: CheckerKind,
    /// Program used by the interpreter checker.
    pub interpreter: String,
}

impl Default for CheckOptions {
    fn default() -> Self {
        CheckOptions {
            languages: language_set(&["python", "py"]),
            strip_prompts: true,
            checker: CheckerKind::Interpreter,
            interpreter: "python3".to_string(),
        }
    }
}

impl CheckOptions {
    pub fn is_checked(&self, language: &str) -> bool {
        self.languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case(language))
    }

    /// The configured checker. When the interpreter cannot be started the
    /// tree-sitter checker takes its place, with a warning.
    pub fn build_checker(&self) -> Box<dyn SyntaxChecker> {
        match self.checker {
            CheckerKind::TreeSitter => Box::new(TreeSitterChecker::python()),
            CheckerKind::Interpreter => {
                let interpreter = InterpreterChecker::new(&self.interpreter);
                if interpreter.is_available() {
                    Box::new(interpreter)
                } else {
                    log::warn!(
                        "cannot start '{}', falling back to the tree-sitter parser",
                        self.interpreter
                    );
                    Box::new(TreeSitterChecker::python())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpreter_is_the_default() {
        assert_eq!(CheckOptions::default().checker, CheckerKind::Interpreter);
    }

    #[test]
    fn missing_interpreter_falls_back_to_tree_sitter() {
        let options = CheckOptions {
            interpreter: "mdnb-no-such-interpreter".to_string(),
            ..CheckOptions::default()
        };
        assert_eq!(options.build_checker().name(), "python");
    }

    #[test]
    fn tree_sitter_is_opt_in() {
        let options = CheckOptions {
            checker: CheckerKind::TreeSitter,
            ..CheckOptions::default()
        };
        assert_eq!(options.build_checker().name(), "python");
    }
}
