//! Scalar expressions evaluated against a row and a bindings scope
//!
//! Comparisons go through the context's `ValueComparator`. Boolean logic is
//! SQL three-valued: `NULL` is neither true nor false.

use std::cmp::Ordering;
use std::fmt;

use crate::bindings::{BindingsArena, BindingsId};
use crate::types::{Row, Value, ValueComparator};

use super::errors::{ExecutorError, ExecutorResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    fn test(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Column of the current row
    Column(usize),
    Literal(Value),
    /// Value bound at a slot of the current scope
    BoundValue(usize),
    /// Column of the row bound at a slot of the current scope
    BoundField { slot: usize, column: usize },
    Compare {
        op: CompareOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
    IsNull(Box<Expression>),
}

/// What an expression can see while it is evaluated
pub struct EvalContext<'a> {
    pub bindings: &'a BindingsArena,
    pub scope: BindingsId,
    pub comparator: &'a dyn ValueComparator,
}

impl Expression {
    pub fn column(index: usize) -> Self {
        Expression::Column(index)
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(value.into())
    }

    pub fn compare(op: CompareOp, left: Expression, right: Expression) -> Self {
        Expression::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Or(Box::new(left), Box::new(right))
    }

    pub fn not(inner: Expression) -> Self {
        Expression::Not(Box::new(inner))
    }

    pub fn is_null(inner: Expression) -> Self {
        Expression::IsNull(Box::new(inner))
    }

    pub fn evaluate(&self, row: &Row, ctx: &EvalContext<'_>) -> ExecutorResult<Value> {
        match self {
            Expression::Column(index) => row.value(*index).cloned().ok_or_else(|| {
                ExecutorError::Evaluation(format!(
                    "column {} out of range for {}",
                    index,
                    row.row_type()
                ))
            }),
            Expression::Literal(value) => Ok(value.clone()),
            Expression::BoundValue(slot) => Ok(ctx.bindings.get_value(ctx.scope, *slot)?.clone()),
            Expression::BoundField { slot, column } => {
                let bound = ctx.bindings.get_row(ctx.scope, *slot)?;
                bound.value(*column).cloned().ok_or_else(|| {
                    ExecutorError::Evaluation(format!(
                        "column {} out of range for bound row {}",
                        column,
                        bound.row_type()
                    ))
                })
            }
            Expression::Compare { op, left, right } => {
                let l = left.evaluate(row, ctx)?;
                let r = right.evaluate(row, ctx)?;
                if l.is_null() || r.is_null() {
                    return Ok(Value::Null);
                }
                Ok(Value::Bool(op.test(ctx.comparator.compare(&l, &r))))
            }
            Expression::And(left, right) => {
                let l = truth(&left.evaluate(row, ctx)?)?;
                if l == Some(false) {
                    return Ok(Value::Bool(false));
                }
                let r = truth(&right.evaluate(row, ctx)?)?;
                Ok(match (l, r) {
                    (_, Some(false)) => Value::Bool(false),
                    (Some(true), Some(true)) => Value::Bool(true),
                    _ => Value::Null,
                })
            }
            Expression::Or(left, right) => {
                let l = truth(&left.evaluate(row, ctx)?)?;
                if l == Some(true) {
                    return Ok(Value::Bool(true));
                }
                let r = truth(&right.evaluate(row, ctx)?)?;
                Ok(match (l, r) {
                    (_, Some(true)) => Value::Bool(true),
                    (Some(false), Some(false)) => Value::Bool(false),
                    _ => Value::Null,
                })
            }
            Expression::Not(inner) => Ok(match truth(&inner.evaluate(row, ctx)?)? {
                Some(b) => Value::Bool(!b),
                None => Value::Null,
            }),
            Expression::IsNull(inner) => Ok(Value::Bool(inner.evaluate(row, ctx)?.is_null())),
        }
    }

    /// Evaluate as a filter condition: only `TRUE` passes
    pub fn matches(&self, row: &Row, ctx: &EvalContext<'_>) -> ExecutorResult<bool> {
        Ok(truth(&self.evaluate(row, ctx)?)? == Some(true))
    }
}

fn truth(value: &Value) -> ExecutorResult<Option<bool>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(*b)),
        other => Err(ExecutorError::Evaluation(format!(
            "expected a boolean, got {}",
            other
        ))),
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Column(i) => write!(f, "${}", i),
            Expression::Literal(v) => write!(f, "{}", v),
            Expression::BoundValue(slot) => write!(f, "?{}", slot),
            Expression::BoundField { slot, column } => write!(f, "?{}.{}", slot, column),
            Expression::Compare { op, left, right } => {
                write!(f, "({} {} {})", left, op.as_str(), right)
            }
            Expression::And(l, r) => write!(f, "({} AND {})", l, r),
            Expression::Or(l, r) => write!(f, "({} OR {})", l, r),
            Expression::Not(inner) => write!(f, "NOT {}", inner),
            Expression::IsNull(inner) => write!(f, "{} IS NULL", inner),
        }
    }
}
