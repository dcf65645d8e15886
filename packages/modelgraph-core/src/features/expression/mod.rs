//! Expression contract
//!
//! The lifecycle only needs two operations from an expression library:
//! parse text into an [`Expression`] at definition time, and evaluate it
//! against an interpretation environment into a typed [`ValueSynth`].
//!
//! [`DefaultExpressionParser`] is a small reference grammar:
//! - literals: `12`, `1.5`, `"text"`, `'text'`, `true`, `false`, `null`, `[a, b]`
//! - dotted names: first segments name a namespace entry, the rest record fields
//! - unary `-` `!`, binary `+ - * / % == != < <= > >= && ||`, parentheses
//! - builtins `compare(a, b)`, `len(x)`, `lower(s)`

mod eval;
mod lexer;
mod parser;

use std::fmt;
use std::sync::Arc;

use crate::errors::{CompileError, CompileResult, InterpretResult};
use crate::features::element::InterpretEnv;
use crate::features::value_synth::ValueSynth;
use crate::shared::models::{FilePosition, ValueType};

pub use parser::{Ast, BinaryOp, UnaryOp};

/// Parsed, not yet type-checked expression
pub trait Expression: Send + Sync + fmt::Debug {
    fn text(&self) -> &str;

    fn position(&self) -> Option<&FilePosition>;

    /// Type-check against the environment and produce a synthesis.
    ///
    /// With a `target`, the result is converted to it or the call fails.
    fn evaluate(
        &self,
        target: Option<&ValueType>,
        env: &mut InterpretEnv,
    ) -> InterpretResult<Arc<dyn ValueSynth>>;
}

pub trait ExpressionParser: Send + Sync + fmt::Debug {
    fn parse(&self, text: &str, position: Option<FilePosition>) -> CompileResult<Arc<dyn Expression>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultExpressionParser;

impl ExpressionParser for DefaultExpressionParser {
    fn parse(&self, text: &str, position: Option<FilePosition>) -> CompileResult<Arc<dyn Expression>> {
        let ast = parser::parse(text).map_err(|(message, offset)| {
            let err = CompileError::new(format!(
                "Could not parse expression '{}': {}",
                text, message
            ));
            match &position {
                Some(pos) => err.at(pos.advance(offset as u32), 1),
                None => err,
            }
        })?;
        Ok(Arc::new(ParsedExpression {
            text: text.to_string(),
            position,
            ast,
        }))
    }
}

#[derive(Debug)]
struct ParsedExpression {
    text: String,
    position: Option<FilePosition>,
    ast: Ast,
}

impl Expression for ParsedExpression {
    fn text(&self) -> &str {
        &self.text
    }

    fn position(&self) -> Option<&FilePosition> {
        self.position.as_ref()
    }

    fn evaluate(
        &self,
        target: Option<&ValueType>,
        env: &mut InterpretEnv,
    ) -> InterpretResult<Arc<dyn ValueSynth>> {
        eval::evaluate(&self.ast, &self.text, target, env)
            .map_err(|err| err.at_opt(self.position.clone()))
    }
}
