//! Interpreter for compiled condition expressions.
//!
//! 조건식은 `dice`, `familiars` 두 바인딩만 볼 수 있는 샌드박스에서 돈다.

use std::borrow::Cow;

use crate::models::Familiar;

use super::parser::{BinOp, Expr, UnaryOp};
use super::ConditionError;

#[derive(Debug, Clone)]
enum Value<'a> {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Cow<'a, str>),
    Dice(&'a [u32]),
    Familiars(&'a [Familiar]),
    Familiar(&'a Familiar),
}

struct Env<'a> {
    dice: &'a [u32],
    familiars: &'a [Familiar],
    it: Option<Value<'a>>,
}

/// 최상위 평가. 불리언이 아닌 결과는 오류다.
pub fn eval_condition(
    expr: &Expr,
    dice: &[u32],
    familiars: &[Familiar],
) -> Result<bool, ConditionError> {
    let env = Env { dice, familiars, it: None };
    match eval(expr, &env)? {
        Value::Bool(value) => Ok(value),
        other => Err(ConditionError::Eval(format!(
            "condition produced {} instead of a boolean",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Int(_) => "an integer",
        Value::Float(_) => "a number",
        Value::Bool(_) => "a boolean",
        Value::Str(_) => "a string",
        Value::Dice(_) => "the dice array",
        Value::Familiars(_) => "the familiar array",
        Value::Familiar(_) => "a familiar",
    }
}

fn eval<'a>(expr: &Expr, env: &Env<'a>) -> Result<Value<'a>, ConditionError> {
    match expr {
        Expr::Int(value) => Ok(Value::Int(*value)),
        Expr::Float(value) => Ok(Value::Float(*value)),
        Expr::Str(value) => Ok(Value::Str(Cow::Owned(value.clone()))),
        Expr::Bool(value) => Ok(Value::Bool(*value)),

        Expr::Ident(name) => match name.as_str() {
            "dice" => Ok(Value::Dice(env.dice)),
            "familiars" => Ok(Value::Familiars(env.familiars)),
            "it" => env
                .it
                .clone()
                .ok_or_else(|| ConditionError::Eval("'it' is only valid inside a predicate".into())),
            other => Err(ConditionError::Eval(format!("unknown identifier '{other}'"))),
        },

        Expr::Unary(op, inner) => {
            let value = eval(inner, env)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!as_bool(&value)?)),
                UnaryOp::Neg => match value {
                    Value::Int(v) => Ok(Value::Int(-v)),
                    Value::Float(v) => Ok(Value::Float(-v)),
                    other => Err(ConditionError::Eval(format!(
                        "cannot negate {}",
                        type_name(&other)
                    ))),
                },
            }
        }

        Expr::Binary(BinOp::Or, lhs, rhs) => {
            if as_bool(&eval(lhs, env)?)? {
                Ok(Value::Bool(true))
            } else {
                Ok(Value::Bool(as_bool(&eval(rhs, env)?)?))
            }
        }
        Expr::Binary(BinOp::And, lhs, rhs) => {
            if !as_bool(&eval(lhs, env)?)? {
                Ok(Value::Bool(false))
            } else {
                Ok(Value::Bool(as_bool(&eval(rhs, env)?)?))
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            let left = eval(lhs, env)?;
            let right = eval(rhs, env)?;
            apply_binop(*op, left, right)
        }

        Expr::Index(receiver, index) => {
            let receiver = eval(receiver, env)?;
            let index = match eval(index, env)? {
                Value::Int(v) => v,
                other => {
                    return Err(ConditionError::Eval(format!(
                        "index must be an integer, got {}",
                        type_name(&other)
                    )))
                }
            };
            if index < 0 {
                return Err(ConditionError::Eval(format!("negative index {index}")));
            }
            let index = index as usize;
            match receiver {
                Value::Dice(dice) => dice
                    .get(index)
                    .map(|&v| Value::Int(v as i64))
                    .ok_or_else(|| ConditionError::Eval(format!("dice index {index} out of range"))),
                Value::Familiars(familiars) => familiars.get(index).map(Value::Familiar).ok_or_else(
                    || ConditionError::Eval(format!("familiar index {index} out of range")),
                ),
                other => Err(ConditionError::Eval(format!(
                    "cannot index into {}",
                    type_name(&other)
                ))),
            }
        }

        Expr::Field(receiver, name) => match eval(receiver, env)? {
            Value::Familiar(familiar) => match name.as_str() {
                "name" => Ok(Value::Str(Cow::Borrowed(familiar.name.as_str()))),
                "rank" => Ok(Value::Str(Cow::Borrowed(
                    familiar.rank.map(|r| r.name()).unwrap_or(""),
                ))),
                "element" => Ok(Value::Str(Cow::Borrowed(familiar.element.as_str()))),
                "kind" => Ok(Value::Str(Cow::Borrowed(familiar.kind.as_str()))),
                other => Err(ConditionError::Eval(format!("unknown familiar field '{other}'"))),
            },
            other => Err(ConditionError::Eval(format!(
                "{} has no fields",
                type_name(&other)
            ))),
        },

        Expr::Call(name, args) => match name.as_str() {
            "sum" | "min" | "max" | "len" => {
                if args.len() != 1 {
                    return Err(ConditionError::Eval(format!(
                        "{name}() expects exactly one argument"
                    )));
                }
                let value = eval(&args[0], env)?;
                aggregate(name, &value)
            }
            other => Err(ConditionError::Eval(format!("unknown function '{other}'"))),
        },

        Expr::Method(receiver, name, args) => {
            let receiver = eval(receiver, env)?;
            match name.as_str() {
                "sum" | "min" | "max" | "len" => {
                    if !args.is_empty() {
                        return Err(ConditionError::Eval(format!(
                            ".{name}() takes no arguments"
                        )));
                    }
                    aggregate(name, &receiver)
                }
                "all" | "any" | "count" => {
                    if args.len() != 1 {
                        return Err(ConditionError::Eval(format!(
                            ".{name}() expects exactly one predicate"
                        )));
                    }
                    eval_predicate_method(name, &receiver, &args[0], env)
                }
                other => Err(ConditionError::Eval(format!("unknown method '{other}'"))),
            }
        }
    }
}

fn eval_predicate_method<'a>(
    name: &str,
    receiver: &Value<'a>,
    predicate: &Expr,
    env: &Env<'a>,
) -> Result<Value<'a>, ConditionError> {
    let items: Vec<Value<'a>> = match receiver {
        Value::Dice(dice) => dice.iter().map(|&v| Value::Int(v as i64)).collect(),
        Value::Familiars(familiars) => familiars.iter().map(Value::Familiar).collect(),
        other => {
            return Err(ConditionError::Eval(format!(
                ".{name}() is not defined on {}",
                type_name(other)
            )))
        }
    };

    let mut hits = 0usize;
    for item in items {
        let scoped = Env { dice: env.dice, familiars: env.familiars, it: Some(item) };
        if as_bool(&eval(predicate, &scoped)?)? {
            hits += 1;
        } else if name == "all" {
            return Ok(Value::Bool(false));
        }
    }

    match name {
        "all" => Ok(Value::Bool(true)),
        "any" => Ok(Value::Bool(hits > 0)),
        _ => Ok(Value::Int(hits as i64)),
    }
}

fn aggregate<'a>(name: &str, value: &Value<'a>) -> Result<Value<'a>, ConditionError> {
    match (name, value) {
        ("sum", Value::Dice(dice)) => Ok(Value::Int(dice.iter().map(|&v| v as i64).sum())),
        ("min", Value::Dice(dice)) => dice
            .iter()
            .min()
            .map(|&v| Value::Int(v as i64))
            .ok_or_else(|| ConditionError::Eval("min() of an empty array".into())),
        ("max", Value::Dice(dice)) => dice
            .iter()
            .max()
            .map(|&v| Value::Int(v as i64))
            .ok_or_else(|| ConditionError::Eval("max() of an empty array".into())),
        ("len", Value::Dice(dice)) => Ok(Value::Int(dice.len() as i64)),
        ("len", Value::Familiars(familiars)) => Ok(Value::Int(familiars.len() as i64)),
        (name, other) => Err(ConditionError::Eval(format!(
            "{name}() is not defined on {}",
            type_name(other)
        ))),
    }
}

fn apply_binop<'a>(op: BinOp, left: Value<'a>, right: Value<'a>) -> Result<Value<'a>, ConditionError> {
    match op {
        BinOp::Eq => Ok(Value::Bool(values_equal(&left, &right)?)),
        BinOp::Ne => Ok(Value::Bool(!values_equal(&left, &right)?)),
        BinOp::Ge | BinOp::Le | BinOp::Gt | BinOp::Lt => {
            let ordering = numeric_cmp(&left, &right)?;
            let result = match op {
                BinOp::Ge => ordering.is_ge(),
                BinOp::Le => ordering.is_le(),
                BinOp::Gt => ordering.is_gt(),
                _ => ordering.is_lt(),
            };
            Ok(Value::Bool(result))
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul => match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                _ => a * b,
            })),
            _ => {
                let a = as_f64(&left)?;
                let b = as_f64(&right)?;
                Ok(Value::Float(match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    _ => a * b,
                }))
            }
        },
        BinOp::Div => {
            let divisor = as_f64(&right)?;
            if divisor == 0.0 {
                return Err(ConditionError::Eval("division by zero".into()));
            }
            Ok(Value::Float(as_f64(&left)? / divisor))
        }
        BinOp::Or | BinOp::And => {
            Err(ConditionError::Eval("logical operator outside boolean context".into()))
        }
    }
}

fn values_equal(left: &Value, right: &Value) -> Result<bool, ConditionError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a == b),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Str(a), Value::Str(b)) => Ok(a == b),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            Ok(as_f64(left)? == as_f64(right)?)
        }
        _ => Err(ConditionError::Eval(format!(
            "cannot compare {} with {}",
            type_name(left),
            type_name(right)
        ))),
    }
}

fn numeric_cmp(left: &Value, right: &Value) -> Result<std::cmp::Ordering, ConditionError> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        return Ok(a.cmp(b));
    }
    let a = as_f64(left)?;
    let b = as_f64(right)?;
    a.partial_cmp(&b)
        .ok_or_else(|| ConditionError::Eval("numeric comparison was undefined".into()))
}

fn as_f64(value: &Value) -> Result<f64, ConditionError> {
    match value {
        Value::Int(v) => Ok(*v as f64),
        Value::Float(v) => Ok(*v),
        other => Err(ConditionError::Eval(format!(
            "expected a number, got {}",
            type_name(other)
        ))),
    }
}

fn as_bool(value: &Value) -> Result<bool, ConditionError> {
    match value {
        Value::Bool(v) => Ok(*v),
        other => Err(ConditionError::Eval(format!(
            "expected a boolean, got {}",
            type_name(other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::tokenize;
    use super::super::parser::parse;
    use super::*;
    use crate::models::{Familiar, Rank};

    fn eval_str(source: &str, dice: &[u32], familiars: &[Familiar]) -> Result<bool, ConditionError> {
        let expr = parse(&tokenize(source)?)?;
        eval_condition(&expr, dice, familiars)
    }

    fn fire_fox() -> Familiar {
        Familiar::new("f1", "화염 여우", Some(Rank::Epic), "fire", "beast")
    }

    fn water_turtle() -> Familiar {
        Familiar::new("f2", "물거북", Some(Rank::Rare), "water", "shell")
    }

    #[test]
    fn test_per_die_comparison() {
        assert!(eval_str("dice[0] >= 4", &[5, 1], &[]).unwrap());
        assert!(!eval_str("dice[0] >= 4", &[3, 6], &[]).unwrap());
    }

    #[test]
    fn test_aggregates() {
        let dice = [1, 2, 3];
        assert!(eval_str("sum(dice) == 6", &dice, &[]).unwrap());
        assert!(eval_str("min(dice) == 1 && max(dice) == 3", &dice, &[]).unwrap());
        assert!(eval_str("dice.sum() == 6", &dice, &[]).unwrap());
        assert!(eval_str("len(dice) == 3", &dice, &[]).unwrap());
    }

    #[test]
    fn test_predicate_methods() {
        assert!(eval_str("dice.all(it >= 2)", &[2, 3, 4], &[]).unwrap());
        assert!(!eval_str("dice.all(it >= 2)", &[1, 3, 4], &[]).unwrap());
        assert!(eval_str("dice.any(it == 6)", &[1, 6], &[]).unwrap());
        assert!(eval_str("dice.count(it >= 3) == 2", &[1, 3, 5], &[]).unwrap());
    }

    #[test]
    fn test_familiar_predicates() {
        let team = vec![fire_fox(), water_turtle()];
        assert!(eval_str("familiars.any(it.element == 'fire')", &[], &team).unwrap());
        assert!(!eval_str("familiars.all(it.element == 'fire')", &[], &team).unwrap());
        assert!(eval_str("familiars[0].rank == 'epic'", &[], &team).unwrap());
        assert!(eval_str("familiars.count(it.kind == 'beast') == 1", &[], &team).unwrap());
    }

    #[test]
    fn test_missing_rank_reads_as_empty_string() {
        let unranked = vec![Familiar::new("f", "미확인", None, "wind", "bird")];
        assert!(eval_str("familiars[0].rank == ''", &[], &unranked).unwrap());
    }

    #[test]
    fn test_arithmetic_and_division() {
        assert!(eval_str("dice[0] * 2 + 1 == 7", &[3], &[]).unwrap());
        assert!(eval_str("sum(dice) / len(dice) >= 2.5", &[2, 3], &[]).unwrap());
        assert!(eval_str("-dice[0] == 0 - 2", &[2], &[]).unwrap());
    }

    #[test]
    fn test_runtime_errors() {
        assert!(eval_str("dice[10] == 1", &[1, 2], &[]).is_err());
        assert!(eval_str("unknown_var == 1", &[], &[]).is_err());
        assert!(eval_str("dice", &[1], &[]).is_err());
        assert!(eval_str("sum(dice) / 0 > 1", &[1], &[]).is_err());
        assert!(eval_str("min(dice) > 0", &[], &[]).is_err());
        assert!(eval_str("familiars[0].power > 3", &[], &[fire_fox()]).is_err());
    }

    #[test]
    fn test_short_circuit_skips_rhs_errors() {
        // 좌변이 결론을 내면 우변의 오류는 평가되지 않는다
        assert!(eval_str("true || dice[10] == 1", &[], &[]).unwrap());
        assert!(!eval_str("false && dice[10] == 1", &[], &[]).unwrap());
    }
}
