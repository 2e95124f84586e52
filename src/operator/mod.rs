//! Operators and cursors
//!
//! An `Operator` tree is the compiled plan. `Operator::cursor()` mirrors it
//! into an `OperatorCursor` tree for one execution; rows are then pulled
//! from the root with `Cursor::next`.
//!
//! # Protocol
//!
//! - `open()` starts one bindings activation; opening an active cursor fails
//! - `next()` is legal only while active and returns `None` at end of stream
//! - `close()` is legal in any state, idempotent, and reaches every child
//! - a fatal error destroys the cursor that raised it
//!
//! ```ignore
//! let mut cursor = plan.cursor(&ctx);
//! let rows = collect(&mut cursor, &mut bindings)?;
//! ```

mod ancestor_lookup;
mod cursor;
mod errors;
mod expression;
mod filter;
mod flatten;
mod group_scan;
mod hkey_merge;
mod nested_loops;
mod node;
#[allow(clippy::module_inception)]
mod operator;
mod operator_cursor;
mod sort;
mod values_scan;

pub use cursor::{collect, drain, Cursor, CursorGuard, CursorState};
pub use errors::{ErrorKind, ExecutorError, ExecutorResult, Severity};
pub use expression::{CompareOp, EvalContext, Expression};
pub use flatten::{FlattenOptions, JoinType};
pub use operator::Operator;
pub use operator_cursor::OperatorCursor;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::BindingsArena;
    use crate::context::{ExecutionConfig, QueryContext};
    use crate::sort::{SortMode, SortSpec};
    use crate::store::MemoryStore;
    use crate::types::{RowType, Value};
    use std::sync::Arc;

    fn ctx() -> Arc<QueryContext> {
        Arc::new(QueryContext::new(
            Arc::new(MemoryStore::new()),
            ExecutionConfig::default(),
        ))
    }

    fn numbers(n: i64) -> Operator {
        Operator::values_scan(
            RowType::new(1, "n", 1),
            (0..n).map(|i| vec![Value::Int(i)]).collect(),
        )
    }

    fn ints(rows: &[crate::types::Row]) -> Vec<i64> {
        rows.iter().map(|r| r.values()[0].as_int().unwrap()).collect()
    }

    #[test]
    fn test_values_scan_replays_after_reopen() {
        let ctx = ctx();
        let mut bindings = BindingsArena::new();
        let mut cursor = numbers(3).cursor(&ctx);
        assert_eq!(ints(&collect(&mut cursor, &mut bindings).unwrap()), vec![0, 1, 2]);
        assert_eq!(cursor.state(), CursorState::Closed);
        assert_eq!(ints(&collect(&mut cursor, &mut bindings).unwrap()), vec![0, 1, 2]);
    }

    #[test]
    fn test_limit_and_skip() {
        let ctx = ctx();
        let mut bindings = BindingsArena::new();
        let mut cursor = Operator::limit(numbers(10), 2, Some(3)).cursor(&ctx);
        assert_eq!(ints(&collect(&mut cursor, &mut bindings).unwrap()), vec![2, 3, 4]);
    }

    #[test]
    fn test_select_three_valued() {
        let ctx = ctx();
        let mut bindings = BindingsArena::new();
        let row_type = RowType::new(1, "n", 1);
        let input = Operator::values_scan(
            Arc::clone(&row_type),
            vec![vec![Value::Int(1)], vec![Value::Null], vec![Value::Int(5)]],
        );
        let predicate = Expression::compare(CompareOp::Gt, Expression::column(0), Expression::literal(2));
        let mut cursor = Operator::select(input, row_type, predicate).cursor(&ctx);
        let rows = collect(&mut cursor, &mut bindings).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values()[0], Value::Int(5));
    }

    #[test]
    fn test_project() {
        let ctx = ctx();
        let mut bindings = BindingsArena::new();
        let input_type = RowType::new(1, "n", 1);
        let output_type = RowType::new(2, "p", 2);
        let plan = Operator::project(
            numbers(2),
            input_type,
            vec![
                Expression::column(0),
                Expression::compare(CompareOp::Eq, Expression::column(0), Expression::literal(1)),
            ],
            output_type,
        );
        let rows = collect(&mut plan.cursor(&ctx), &mut bindings).unwrap();
        let shown: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
        assert_eq!(shown, vec!["p(0, false)", "p(1, true)"]);
    }

    #[test]
    fn test_project_arity_mismatch_is_plan_error() {
        let ctx = ctx();
        let mut bindings = BindingsArena::new();
        let plan = Operator::project(
            numbers(1),
            RowType::new(1, "n", 1),
            vec![Expression::column(0)],
            RowType::new(2, "p", 2),
        );
        let mut cursor = plan.cursor(&ctx);
        let root = bindings.root();
        let err = cursor.open(&mut bindings, root).unwrap_err();
        assert_eq!(err.code(), "GQP_PLAN_INVALID");
        assert_eq!(cursor.state(), CursorState::Closed);
    }

    #[test]
    fn test_sort_operator() {
        let ctx = ctx();
        let mut bindings = BindingsArena::new();
        let plan = Operator::sort(
            numbers(5),
            RowType::new(1, "n", 1),
            SortSpec::desc(0),
            SortMode::PreserveDuplicates,
            Some(5),
        );
        let mut cursor = plan.cursor(&ctx);
        assert_eq!(ints(&collect(&mut cursor, &mut bindings).unwrap()), vec![4, 3, 2, 1, 0]);
        // Reopen sorts again
        assert_eq!(ints(&collect(&mut cursor, &mut bindings).unwrap()), vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_sort_insertion_limited_operator() {
        let ctx = ctx();
        let mut bindings = BindingsArena::new();
        let plan = Operator::sort_insertion_limited(
            numbers(100),
            RowType::new(1, "n", 1),
            SortSpec::desc(0),
            SortMode::PreserveDuplicates,
            3,
        );
        assert_eq!(
            ints(&collect(&mut plan.cursor(&ctx), &mut bindings).unwrap()),
            vec![99, 98, 97]
        );
    }

    #[test]
    fn test_nested_loops_binds_outer_row() {
        let ctx = ctx();
        let mut bindings = BindingsArena::new();
        let inner_type = RowType::new(3, "pair", 2);
        let inner = Operator::project(
            Operator::values_scan(RowType::new(2, "one", 1), vec![vec![Value::Int(0)]]),
            RowType::new(2, "one", 1),
            vec![
                Expression::BoundField { slot: 0, column: 0 },
                Expression::column(0),
            ],
            inner_type,
        );
        let plan = Operator::map_nested_loops(numbers(3), inner, 0);
        let rows = collect(&mut plan.cursor(&ctx), &mut bindings).unwrap();
        let shown: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
        assert_eq!(shown, vec!["pair(0, 0)", "pair(1, 0)", "pair(2, 0)"]);
        // Every per-row scope was released
        assert_eq!(bindings.live_scopes(), 1);
    }

    #[test]
    fn test_describe() {
        let plan = Operator::limit(
            Operator::sort(
                numbers(1),
                RowType::new(1, "n", 1),
                SortSpec::asc(0),
                SortMode::SuppressDuplicates,
                None,
            ),
            0,
            Some(1),
        );
        assert_eq!(
            plan.describe(),
            "Limit(skip 0, limit 1)\n  Sort($0 ASC, SUPPRESS_DUPLICATES)\n    ValuesScan(n#1, 1 rows)\n"
        );
    }
}
