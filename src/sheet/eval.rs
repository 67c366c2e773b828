//! Evaluator: dispatches by the AST's tag, single pass over lines
//! (spec.md §4.9).

use rust_decimal::Decimal;

use crate::decimal::DisplayPrecision;
use crate::error::SheetError;

use super::ast::{BinaryOp, Expr, Line, Spanned, UnaryOp};
use super::env::{Env, FunctionDef};
use super::parser::parse_line;
use super::value::{Query, QueryNode, Value};

/// The rendered outcome of one evaluated line (spec.md §4.9's "Line
/// result"). Errors abort only the current line.
#[derive(Debug, Clone)]
pub struct LineResult {
    pub text: String,
    pub bold: bool,
}

/// Evaluates every line of a sheet in order, mutating `env` as assignments
/// and function definitions are encountered. A line that errors still
/// contributes a result (the error message); evaluation continues with
/// subsequent lines using whatever the environment held before that line.
pub fn evaluate_sheet(env: &mut Env, source: &str) -> Vec<LineResult> {
    source.lines().map(|line| evaluate_line(env, line)).collect()
}

pub fn evaluate_line(env: &mut Env, line_text: &str) -> LineResult {
    let line = match parse_line(line_text) {
        Ok(line) => line,
        Err(e) => return LineResult { text: e.to_string(), bold: false },
    };

    match line {
        Line::Header(text) => LineResult { text, bold: true },
        Line::Assignment { id, expr } => match eval_expr(env, &expr) {
            Ok(value) => {
                let text = render(env, &value);
                env.assign(id, value);
                LineResult { text, bold: false }
            }
            Err(e) => LineResult { text: e.to_string(), bold: false },
        },
        Line::FunctionDefinition { id, params, body } => {
            env.define_function(id, FunctionDef { params, body });
            LineResult { text: String::new(), bold: false }
        }
        Line::Expression(expr) => match eval_expr(env, &expr) {
            Ok(value) => LineResult { text: render(env, &value), bold: false },
            Err(e) => LineResult { text: e.to_string(), bold: false },
        },
    }
}

fn render(env: &Env, value: &Value) -> String {
    match value {
        Value::Number(n) => n.format_locale(2),
        Value::Query(_) => "<query>".to_string(),
        Value::Function(_) => String::new(),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(|v| render(env, v)).collect::<Vec<_>>().join(", ")
        ),
    }
}

fn eval_expr(env: &Env, expr: &Spanned<Expr>) -> Result<Value, SheetError> {
    match &expr.value {
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Identifier(name) => env
            .variables
            .get(name)
            .cloned()
            .ok_or_else(|| SheetError::Undefined(name.clone())),
        Expr::Grouping(inner) => eval_expr(env, inner),
        Expr::Unary { op, expr: inner } => {
            let value = expect_number(env, inner)?;
            Ok(Value::Number(match op {
                UnaryOp::Plus => value,
                UnaryOp::Minus => -value,
            }))
        }
        Expr::Binary { op, lhs, rhs } => eval_binary(env, *op, lhs, rhs),
        Expr::Postings(literal) => Ok(Value::Query(Query::new(QueryNode::Like(literal.pattern.clone())))),
        Expr::Call { callee, args } => eval_call(env, callee, args),
    }
}

fn eval_binary(env: &Env, op: BinaryOp, lhs: &Spanned<Expr>, rhs: &Spanned<Expr>) -> Result<Value, SheetError> {
    match op {
        BinaryOp::And | BinaryOp::Or => {
            let left = expect_query(env, lhs)?;
            let right = expect_query(env, rhs)?;
            Ok(Value::Query(match op {
                BinaryOp::And => left.and(right),
                BinaryOp::Or => left.or(right),
                _ => unreachable!(),
            }))
        }
        _ => {
            let left = expect_number(env, lhs)?;
            let right = expect_number(env, rhs)?;
            let result = match op {
                BinaryOp::Add => left + right,
                BinaryOp::Sub => left - right,
                BinaryOp::Mul => left * right,
                BinaryOp::Div => {
                    if right.is_zero() {
                        return Err(SheetError::DivisionByZero);
                    }
                    left / right
                }
                BinaryOp::Pow => pow(left, right),
                BinaryOp::And | BinaryOp::Or => unreachable!(),
            };
            Ok(Value::Number(result))
        }
    }
}

fn pow(base: Decimal, exponent: Decimal) -> Decimal {
    use rust_decimal::prelude::ToPrimitive;
    let result = base.to_f64().unwrap_or(0.0).powf(exponent.to_f64().unwrap_or(0.0));
    Decimal::from_f64_retain(result).unwrap_or(Decimal::ZERO)
}

fn eval_call(env: &Env, callee: &str, args: &[Spanned<Expr>]) -> Result<Value, SheetError> {
    let def = env
        .functions
        .get(callee)
        .cloned()
        .ok_or_else(|| SheetError::Undefined(callee.to_string()))?;

    if def.params.len() != args.len() {
        return Err(SheetError::Arity {
            function: callee.to_string(),
            expected: def.params.len(),
            got: args.len(),
        });
    }

    let values = args.iter().map(|a| eval_expr(env, a)).collect::<Result<Vec<_>, _>>()?;
    let mut call_env = env
        .extend(&def.params, values)
        .ok_or(SheetError::StackOverflow)?;
    eval_expr(&mut call_env, &def.body)
}

fn expect_number(env: &Env, expr: &Spanned<Expr>) -> Result<Decimal, SheetError> {
    let value = eval_expr(env, expr)?;
    value.as_number().ok_or_else(|| SheetError::TypeError {
        expected: "Number".into(),
        got: value.type_name().into(),
    })
}

fn expect_query(env: &Env, expr: &Spanned<Expr>) -> Result<Query, SheetError> {
    let value = eval_expr(env, expr)?;
    value.as_query().cloned().ok_or_else(|| SheetError::TypeError {
        expected: "Query".into(),
        got: value.type_name().into(),
    })
}
