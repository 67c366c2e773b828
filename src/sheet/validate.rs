//! Diagnostic pass: walks the AST without evaluating it, powering the
//! editor's inline lint (spec.md §4.9).

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::ast::{Expr, Line, Spanned};
use super::parser::parse_line;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub line: u32,
    pub start: u32,
    pub end: u32,
    pub message: String,
}

/// Tracks the names a structurally-correct prior line would have bound, so
/// later lines can be checked for undefined references without actually
/// running any code.
#[derive(Default)]
struct KnownNames {
    variables: HashSet<String>,
    function_arity: HashMap<String, usize>,
}

pub fn validate(source: &str) -> Vec<Diagnostic> {
    let mut known = KnownNames::default();
    let mut diagnostics = Vec::new();

    for (line_no, text) in source.lines().enumerate() {
        let line_no = line_no as u32;
        match parse_line(text) {
            Ok(Line::Header(_)) => {}
            Ok(Line::Assignment { id, expr }) => {
                walk_expr(&expr, &known, line_no, &mut diagnostics);
                known.variables.insert(id);
            }
            Ok(Line::FunctionDefinition { id, params, body }) => {
                let mut scoped = KnownNames {
                    variables: known.variables.clone(),
                    function_arity: known.function_arity.clone(),
                };
                scoped.variables.extend(params.iter().cloned());
                walk_expr(&body, &scoped, line_no, &mut diagnostics);
                known.function_arity.insert(id, params.len());
            }
            Ok(Line::Expression(expr)) => {
                walk_expr(&expr, &known, line_no, &mut diagnostics);
            }
            Err(e) => diagnostics.push(Diagnostic {
                line: line_no,
                start: 0,
                end: text.len() as u32,
                message: e.to_string(),
            }),
        }
    }

    diagnostics
}

fn walk_expr(expr: &Spanned<Expr>, known: &KnownNames, line: u32, out: &mut Vec<Diagnostic>) {
    match &expr.value {
        Expr::Number(_) | Expr::Postings(_) => {}
        Expr::Identifier(name) => {
            if !known.variables.contains(name) {
                out.push(Diagnostic {
                    line,
                    start: expr.start,
                    end: expr.end,
                    message: format!("Undefined variable {name}"),
                });
            }
        }
        Expr::Unary { expr: inner, .. } | Expr::Grouping(inner) => {
            walk_expr(inner, known, line, out);
        }
        Expr::Binary { lhs, rhs, .. } => {
            walk_expr(lhs, known, line, out);
            walk_expr(rhs, known, line, out);
        }
        Expr::Call { callee, args } => {
            match known.function_arity.get(callee) {
                None => out.push(Diagnostic {
                    line,
                    start: expr.start,
                    end: expr.end,
                    message: format!("Undefined variable {callee}"),
                }),
                Some(expected) if *expected != args.len() => out.push(Diagnostic {
                    line,
                    start: expr.start,
                    end: expr.end,
                    message: format!(
                        "wrong number of arguments to '{callee}': expected {expected}, got {}",
                        args.len()
                    ),
                }),
                Some(_) => {}
            }
            for arg in args {
                walk_expr(arg, known, line, out);
            }
        }
    }
}
