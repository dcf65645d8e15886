//! Type checking and runtime evaluation of the default grammar

use std::any::Any;
use std::cmp::Ordering;
use std::sync::Arc;

use super::parser::{Ast, BinaryOp, UnaryOp};
use crate::errors::{InstantiateResult, InstantiationError, InterpretResult, TypeResolutionError};
use crate::features::element::InterpretEnv;
use crate::features::model_namespace::{ComponentId, ModelScope};
use crate::features::sort::natural_compare;
use crate::features::value_synth::{ComponentRef, ConvertSynth, ValueSynth};
use crate::shared::models::{InstanceType, LiveValue, ModelShape, Value, ValueType};

/// Type-checked node
#[derive(Debug)]
struct Node {
    ty: ValueType,
    kind: NodeKind,
}

#[derive(Debug)]
enum NodeKind {
    Const(Value),
    Read {
        synth: Arc<dyn ValueSynth>,
        fields: Vec<String>,
    },
    Unary(UnaryOp, Box<Node>),
    Binary(BinaryOp, Box<Node>, Box<Node>),
    Compare(Box<Node>, Box<Node>),
    Len(Box<Node>),
    Lower(Box<Node>),
    List(Vec<Node>),
}

pub(crate) fn evaluate(
    ast: &Ast,
    text: &str,
    target: Option<&ValueType>,
    env: &mut InterpretEnv,
) -> InterpretResult<Arc<dyn ValueSynth>> {
    // A bare reference keeps the component's own live container
    let synth: Arc<dyn ValueSynth> = match ast {
        Ast::Name(segments) if env.contains_path(&segments.join(".")) => {
            let resolved = env.resolve(&segments.join("."))?;
            if resolved.instance_type.shape == ModelShape::Value || target.is_none() {
                Arc::new(ComponentRef::new(resolved.id, resolved.instance_type))
            } else {
                checked_synth(ast, text, env)?
            }
        }
        _ => checked_synth(ast, text, env)?,
    };

    let Some(target) = target else {
        return Ok(synth);
    };
    let actual = synth.instance_type().element_type().cloned().unwrap_or_default();
    if target.is_assignable_from(&actual) || actual == ValueType::Any {
        Ok(synth)
    } else if target.can_convert_from(&actual) {
        Ok(ConvertSynth::wrap(synth, target))
    } else {
        Err(TypeResolutionError::new(format!(
            "Expression '{}' is of type {} and cannot be used as {}",
            text, actual, target
        )))
    }
}

fn checked_synth(ast: &Ast, text: &str, env: &mut InterpretEnv) -> InterpretResult<Arc<dyn ValueSynth>> {
    let node = check(ast, env)?;
    Ok(Arc::new(ExprSynth {
        ty: InstanceType::value(node.ty.clone()),
        text: text.to_string(),
        node,
    }))
}

fn check(ast: &Ast, env: &mut InterpretEnv) -> InterpretResult<Node> {
    match ast {
        Ast::Literal(value) => Ok(Node {
            ty: literal_type(value),
            kind: NodeKind::Const(value.clone()),
        }),
        Ast::Name(segments) => check_name(segments, env),
        Ast::Unary(op, operand) => {
            let operand = check(operand, env)?;
            let ty = match (op, &operand.ty) {
                (UnaryOp::Neg, ty) if ty.is_numeric() || *ty == ValueType::Any => operand.ty.clone(),
                (UnaryOp::Not, ValueType::Bool | ValueType::Any) => ValueType::Bool,
                (op, ty) => {
                    return Err(TypeResolutionError::new(format!(
                        "Operator '{}' cannot be applied to {}",
                        if *op == UnaryOp::Neg { "-" } else { "!" },
                        ty
                    )))
                }
            };
            Ok(Node {
                ty,
                kind: NodeKind::Unary(*op, Box::new(operand)),
            })
        }
        Ast::Binary(op, left, right) => {
            let left = check(left, env)?;
            let right = check(right, env)?;
            let ty = binary_type(*op, &left.ty, &right.ty)?;
            Ok(Node {
                ty,
                kind: NodeKind::Binary(*op, Box::new(left), Box::new(right)),
            })
        }
        Ast::Call(name, args) => check_call(name, args, env),
        Ast::List(items) => {
            let items = items
                .iter()
                .map(|item| check(item, env))
                .collect::<InterpretResult<Vec<_>>>()?;
            let element = match items.split_first() {
                Some((first, rest)) if rest.iter().all(|n| n.ty == first.ty) => first.ty.clone(),
                _ => ValueType::Any,
            };
            Ok(Node {
                ty: ValueType::list(element),
                kind: NodeKind::List(items),
            })
        }
    }
}

fn literal_type(value: &Value) -> ValueType {
    match value {
        Value::Bool(_) => ValueType::Bool,
        Value::Int(_) => ValueType::Int,
        Value::Float(_) => ValueType::Float,
        Value::Str(_) => ValueType::String,
        Value::Null | Value::List(_) | Value::Record { .. } => ValueType::Any,
    }
}

/// Longest resolvable prefix names the component; the rest are fields
fn check_name(segments: &[String], env: &mut InterpretEnv) -> InterpretResult<Node> {
    let full = segments.join(".");
    let split = (1..=segments.len())
        .rev()
        .find(|&k| env.contains_path(&segments[..k].join(".")));
    let Some(split) = split else {
        return Err(TypeResolutionError::new(format!("Nothing at '{}'", full)));
    };

    let resolved = env.resolve(&segments[..split].join("."))?;
    let element = resolved.instance_type.element_type().cloned().unwrap_or_default();
    let mut ty = match resolved.instance_type.shape {
        ModelShape::Value => element,
        shape if shape.is_collection() => ValueType::list(element),
        _ => {
            return Err(TypeResolutionError::new(format!(
                "'{}' is a {} and cannot be used as a value",
                resolved.id, resolved.instance_type
            )))
        }
    };

    let fields: Vec<String> = segments[split..].to_vec();
    for field in &fields {
        ty = match &ty {
            ValueType::Record(record) => record.field_type(field).cloned().ok_or_else(|| {
                TypeResolutionError::new(format!("Type {} has no field '{}'", record.name, field))
            })?,
            ValueType::Any => ValueType::Any,
            other => {
                return Err(TypeResolutionError::new(format!(
                    "Type {} has no field '{}'",
                    other, field
                )))
            }
        };
    }

    Ok(Node {
        ty,
        kind: NodeKind::Read {
            synth: resolved.synth,
            fields,
        },
    })
}

fn binary_type(op: BinaryOp, left: &ValueType, right: &ValueType) -> InterpretResult<ValueType> {
    use BinaryOp::*;
    let dynamic = *left == ValueType::Any || *right == ValueType::Any;
    let numeric = left.is_numeric() && right.is_numeric();
    let ty = match op {
        Add if *left == ValueType::String || *right == ValueType::String => Some(ValueType::String),
        Add | Sub | Mul | Div | Rem if numeric => Some(if *left == ValueType::Int && *right == ValueType::Int {
            ValueType::Int
        } else {
            ValueType::Float
        }),
        Add | Sub | Mul | Div | Rem if dynamic => Some(ValueType::Any),
        Eq | NotEq => Some(ValueType::Bool),
        Lt | LtEq | Gt | GtEq
            if dynamic || numeric || (left == right && left.has_natural_order()) =>
        {
            Some(ValueType::Bool)
        }
        And | Or
            if matches!(left, ValueType::Bool | ValueType::Any)
                && matches!(right, ValueType::Bool | ValueType::Any) =>
        {
            Some(ValueType::Bool)
        }
        _ => None,
    };
    ty.ok_or_else(|| {
        TypeResolutionError::new(format!(
            "Operator '{}' cannot be applied to {} and {}",
            op.symbol(),
            left,
            right
        ))
    })
}

fn check_call(name: &str, args: &[Ast], env: &mut InterpretEnv) -> InterpretResult<Node> {
    let mut checked = args
        .iter()
        .map(|arg| check(arg, env))
        .collect::<InterpretResult<Vec<_>>>()?;
    let arity = |n: usize| -> InterpretResult<()> {
        if args.len() == n {
            Ok(())
        } else {
            Err(TypeResolutionError::new(format!(
                "{}() takes {} argument(s), got {}",
                name,
                n,
                args.len()
            )))
        }
    };
    match name {
        "compare" => {
            arity(2)?;
            let right = checked.pop();
            let left = checked.pop();
            let (Some(left), Some(right)) = (left, right) else {
                return Err(TypeResolutionError::new("compare() takes 2 arguments"));
            };
            Ok(Node {
                ty: ValueType::Int,
                kind: NodeKind::Compare(Box::new(left), Box::new(right)),
            })
        }
        "len" | "lower" => {
            arity(1)?;
            let Some(arg) = checked.pop() else {
                return Err(TypeResolutionError::new(format!("{}() takes 1 argument", name)));
            };
            let accepted = match name {
                "len" => matches!(arg.ty, ValueType::String | ValueType::List(_) | ValueType::Any),
                _ => matches!(arg.ty, ValueType::String | ValueType::Any),
            };
            if !accepted {
                return Err(TypeResolutionError::new(format!(
                    "{}() cannot be applied to {}",
                    name, arg.ty
                )));
            }
            Ok(if name == "len" {
                Node {
                    ty: ValueType::Int,
                    kind: NodeKind::Len(Box::new(arg)),
                }
            } else {
                Node {
                    ty: ValueType::String,
                    kind: NodeKind::Lower(Box::new(arg)),
                }
            })
        }
        other => Err(TypeResolutionError::new(format!("Unknown function '{}'", other))),
    }
}

/// Synthesis of a checked expression; recomputed on every read
#[derive(Debug)]
struct ExprSynth {
    ty: InstanceType,
    text: String,
    node: Node,
}

impl ValueSynth for ExprSynth {
    fn instance_type(&self) -> &InstanceType {
        &self.ty
    }

    fn get(&self, scope: &Arc<ModelScope>) -> InstantiateResult<LiveValue> {
        let value = self.current(scope)?;
        Ok(LiveValue::constant(self.node.ty.clone(), value))
    }

    fn current(&self, scope: &Arc<ModelScope>) -> InstantiateResult<Value> {
        self.node
            .eval(scope)
            .map_err(|err| err.wrap(format!("Could not evaluate '{}'", self.text)))
    }

    fn components(&self) -> Vec<ComponentId> {
        let mut out = Vec::new();
        self.node.collect_components(&mut out);
        out
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Node {
    fn eval(&self, scope: &Arc<ModelScope>) -> InstantiateResult<Value> {
        match &self.kind {
            NodeKind::Const(value) => Ok(value.clone()),
            NodeKind::Read { synth, fields } => {
                let mut value = synth.current(scope)?;
                for field in fields {
                    value = match value {
                        Value::Null => Value::Null,
                        other => other.field(field).cloned().ok_or_else(|| {
                            InstantiationError::new(format!("{} has no field '{}'", other, field))
                        })?,
                    };
                }
                Ok(value)
            }
            NodeKind::Unary(op, operand) => {
                let value = operand.eval(scope)?;
                match (op, value) {
                    (_, Value::Null) => Ok(Value::Null),
                    (UnaryOp::Neg, Value::Int(i)) => i
                        .checked_neg()
                        .map(Value::Int)
                        .ok_or_else(|| InstantiationError::new(format!("Integer overflow in -{}", i))),
                    (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
                    (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (_, other) => Err(InstantiationError::new(format!("Bad operand {}", other))),
                }
            }
            NodeKind::Binary(op, left, right) => {
                let left = left.eval(scope)?;
                // Short-circuit boolean operators
                match (op, &left) {
                    (BinaryOp::And, Value::Bool(false)) => return Ok(Value::Bool(false)),
                    (BinaryOp::Or, Value::Bool(true)) => return Ok(Value::Bool(true)),
                    _ => {}
                }
                let right = right.eval(scope)?;
                apply_binary(*op, left, right)
            }
            NodeKind::Compare(left, right) => {
                let ordering = natural_compare(&left.eval(scope)?, &right.eval(scope)?);
                Ok(Value::Int(ordering as i64))
            }
            NodeKind::Len(arg) => match arg.eval(scope)? {
                Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                Value::List(items) => Ok(Value::Int(items.len() as i64)),
                Value::Null => Ok(Value::Null),
                other => Err(InstantiationError::new(format!("len() cannot be applied to {}", other))),
            },
            NodeKind::Lower(arg) => match arg.eval(scope)? {
                Value::Str(s) => Ok(Value::Str(s.to_lowercase())),
                Value::Null => Ok(Value::Null),
                other => Err(InstantiationError::new(format!("lower() cannot be applied to {}", other))),
            },
            NodeKind::List(items) => items
                .iter()
                .map(|item| item.eval(scope))
                .collect::<InstantiateResult<Vec<_>>>()
                .map(Value::List),
        }
    }

    fn collect_components(&self, out: &mut Vec<ComponentId>) {
        match &self.kind {
            NodeKind::Const(_) => {}
            NodeKind::Read { synth, .. } => out.extend(synth.components()),
            NodeKind::Unary(_, n) | NodeKind::Len(n) | NodeKind::Lower(n) => n.collect_components(out),
            NodeKind::Binary(_, a, b) | NodeKind::Compare(a, b) => {
                a.collect_components(out);
                b.collect_components(out);
            }
            NodeKind::List(items) => items.iter().for_each(|n| n.collect_components(out)),
        }
    }
}

fn apply_binary(op: BinaryOp, left: Value, right: Value) -> InstantiateResult<Value> {
    use BinaryOp::*;
    match op {
        Eq => return Ok(Value::Bool(values_equal(&left, &right))),
        NotEq => return Ok(Value::Bool(!values_equal(&left, &right))),
        _ => {}
    }
    if left.is_null() || right.is_null() {
        return Ok(match op {
            Lt | LtEq | Gt | GtEq => Value::Bool(false),
            _ => Value::Null,
        });
    }
    match op {
        And | Or => match (left.as_bool(), right.as_bool()) {
            (Some(a), Some(b)) => Ok(Value::Bool(if op == And { a && b } else { a || b })),
            _ => Err(InstantiationError::new(format!(
                "Operator '{}' needs booleans, got {} and {}",
                op.symbol(),
                left,
                right
            ))),
        },
        Lt | LtEq | Gt | GtEq => {
            let ordering = natural_compare(&left, &right);
            Ok(Value::Bool(match op {
                Lt => ordering == Ordering::Less,
                LtEq => ordering != Ordering::Greater,
                Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            }))
        }
        Add if matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)) => {
            Ok(Value::Str(format!("{}{}", left, right)))
        }
        _ => arithmetic(op, &left, &right),
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => (*a as f64) == *b,
        _ => left == right,
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> InstantiateResult<Value> {
    use BinaryOp::*;
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        let (a, b) = (*a, *b);
        let result = match op {
            Add => a.checked_add(b),
            Sub => a.checked_sub(b),
            Mul => a.checked_mul(b),
            Div | Rem if b == 0 => return Err(InstantiationError::new("Division by zero")),
            Div => a.checked_div(b),
            Rem => a.checked_rem(b),
            _ => None,
        };
        return result
            .map(Value::Int)
            .ok_or_else(|| InstantiationError::new(format!("Integer overflow in {} {} {}", a, op.symbol(), b)));
    }
    match (left.as_float(), right.as_float()) {
        (Some(a), Some(b)) => Ok(Value::Float(match op {
            Add => a + b,
            Sub => a - b,
            Mul => a * b,
            Div => a / b,
            _ => a % b,
        })),
        _ => Err(InstantiationError::new(format!(
            "Operator '{}' cannot be applied to {} and {}",
            op.symbol(),
            left,
            right
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::expression::{DefaultExpressionParser, ExpressionParser};
    use crate::features::model_namespace::{InterpretedModelSet, ModelSetBuilder};
    use crate::features::value_synth::ConstantValue;
    use crate::shared::models::{Identity, RecordType};

    fn fixture() -> (InterpretEnv, Arc<ModelScope>) {
        let row = RecordType::new("Row")
            .field("name", ValueType::String)
            .field("id", ValueType::Int);
        let mut builder = ModelSetBuilder::new(Identity::fresh(), "root");
        builder
            .add_value("x", Arc::new(ConstantValue::new(ValueType::Int, Value::Int(5))), None, None)
            .unwrap();
        builder
            .add_value("label", Arc::new(ConstantValue::new(ValueType::String, Value::str("Hi"))), None, None)
            .unwrap();
        builder
            .add_value(
                "row",
                Arc::new(ConstantValue::new(
                    ValueType::Record(row),
                    Value::record("Row", [("name", Value::str("b")), ("id", Value::Int(1))]),
                )),
                None,
                None,
            )
            .unwrap();
        let models = InterpretedModelSet::new(builder.seal(), None);
        let env = InterpretEnv::new(models.clone());
        let scope = ModelScope::instantiate(models, None);
        (env, scope)
    }

    fn run(text: &str, target: Option<&ValueType>) -> InterpretResult<(ValueType, InstantiateResult<Value>)> {
        let (mut env, scope) = fixture();
        let expr = DefaultExpressionParser.parse(text, None).map_err(|e| TypeResolutionError::new(e.to_string()))?;
        let synth = expr.evaluate(target, &mut env)?;
        let ty = synth.instance_type().element_type().cloned().unwrap_or_default();
        Ok((ty, synth.current(&scope)))
    }

    #[test]
    fn test_arithmetic_and_types() {
        let (ty, value) = run("x * 2 + 1", None).unwrap();
        assert_eq!(ty, ValueType::Int);
        assert_eq!(value.unwrap(), Value::Int(11));

        let (ty, value) = run("x / 2.0", None).unwrap();
        assert_eq!(ty, ValueType::Float);
        assert_eq!(value.unwrap(), Value::Float(2.5));
    }

    #[test]
    fn test_record_fields_and_builtins() {
        let (ty, value) = run("row.name + row.id", None).unwrap();
        assert_eq!(ty, ValueType::String);
        assert_eq!(value.unwrap(), Value::str("b1"));

        let (_, value) = run("compare(row.name, 'a')", None).unwrap();
        assert_eq!(value.unwrap(), Value::Int(1));
        let (_, value) = run("len(lower(label)) == 2 && !false", None).unwrap();
        assert_eq!(value.unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_conversion_to_target() {
        let (ty, value) = run("x", Some(&ValueType::String)).unwrap();
        assert_eq!(ty, ValueType::String);
        assert_eq!(value.unwrap(), Value::str("5"));

        let err = run("label", Some(&ValueType::Int)).unwrap_err();
        assert!(err.message().contains("cannot be used as int"), "{}", err);
    }

    #[test]
    fn test_unresolved_names_and_fields() {
        assert_eq!(run("nope + 1", None).unwrap_err().message(), "Nothing at 'nope'");
        let err = run("row.missing", None).unwrap_err();
        assert_eq!(err.message(), "Type Row has no field 'missing'");
        assert!(run("x.y", None).is_err());
    }

    #[test]
    fn test_type_errors() {
        let err = run("label - 1", None).unwrap_err();
        assert_eq!(err.message(), "Operator '-' cannot be applied to string and int");
        assert!(run("!x", None).is_err());
        assert!(run("frobnicate(x)", None).is_err());
    }

    #[test]
    fn test_runtime_division_by_zero() {
        let (_, value) = run("x / (x - 5)", None).unwrap();
        let err = value.unwrap_err();
        assert_eq!(err.chain_messages()[1], "Division by zero");
    }

    #[test]
    fn test_negating_min_int_overflows() {
        let (_, value) = run("-(x - 9223372036854775807 - 6)", None).unwrap();
        let err = value.unwrap_err();
        assert!(
            err.chain_messages().iter().any(|m| m.starts_with("Integer overflow in -")),
            "{}",
            err
        );
    }
}
