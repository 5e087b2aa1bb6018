//! Expression evaluation against a set of bound variables.
//!
//! Evaluation is strict: any unbound identifier or division by zero
//! aborts with an error instead of producing NaN, so a strategy engine
//! can treat a failed evaluation as "no signal".

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::expr::{BinaryOp, CompareOp, Expr};

/// Tolerance used by the `==` and `!=` operators.
pub const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("unbound variable '{0}'")]
    Unbound(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("top-level expression is not a comparison")]
    NotComparison,
    #[error("comparison cannot be used as a value")]
    NestedComparison,
}

/// Evaluates a condition expression to a boolean.
///
/// The top-level node must be a comparison.
pub fn evaluate(expr: &Expr, vars: &HashMap<String, f64>) -> Result<bool, EvalError> {
    match expr {
        Expr::Compare { op, left, right } => {
            let lhs = evaluate_value(left, vars)?;
            let rhs = evaluate_value(right, vars)?;
            Ok(compare(*op, lhs, rhs))
        }
        _ => Err(EvalError::NotComparison),
    }
}

/// Evaluates an arithmetic sub-expression to a number.
pub fn evaluate_value(expr: &Expr, vars: &HashMap<String, f64>) -> Result<f64, EvalError> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Ident(name) => vars
            .get(name)
            .copied()
            .ok_or_else(|| EvalError::Unbound(name.clone())),
        Expr::Neg(inner) => Ok(-evaluate_value(inner, vars)?),
        Expr::Binary { op, left, right } => {
            let lhs = evaluate_value(left, vars)?;
            let rhs = evaluate_value(right, vars)?;
            match op {
                BinaryOp::Add => Ok(lhs + rhs),
                BinaryOp::Sub => Ok(lhs - rhs),
                BinaryOp::Mul => Ok(lhs * rhs),
                BinaryOp::Div => {
                    if rhs == 0.0 {
                        Err(EvalError::DivisionByZero)
                    } else {
                        Ok(lhs / rhs)
                    }
                }
            }
        }
        Expr::Compare { .. } => Err(EvalError::NestedComparison),
    }
}

fn compare(op: CompareOp, lhs: f64, rhs: f64) -> bool {
    match op {
        CompareOp::Gt => lhs > rhs,
        CompareOp::Lt => lhs < rhs,
        CompareOp::Ge => lhs >= rhs,
        CompareOp::Le => lhs <= rhs,
        CompareOp::Eq => (lhs - rhs).abs() < EPSILON,
        CompareOp::Ne => (lhs - rhs).abs() >= EPSILON,
    }
}
