//! Single-input row operators: type filter, select, project and limit

use std::sync::Arc;

use crate::bindings::{BindingsArena, BindingsId};
use crate::context::QueryContext;
use crate::types::{Row, RowType};

use super::cursor::Cursor;
use super::errors::{ExecutorError, ExecutorResult};
use super::expression::{EvalContext, Expression};
use super::node::Node;
use super::operator_cursor::OperatorCursor;

/// Passes only rows whose type is listed
pub(crate) struct FilterCursor {
    input: Box<OperatorCursor>,
    keep_types: Vec<Arc<RowType>>,
}

impl FilterCursor {
    pub(crate) fn new(input: OperatorCursor, keep_types: Vec<Arc<RowType>>) -> Self {
        Self {
            input: Box::new(input),
            keep_types,
        }
    }
}

impl Node for FilterCursor {
    fn open(&mut self, bindings: &mut BindingsArena, scope: BindingsId) -> ExecutorResult<()> {
        self.input.open(bindings, scope)
    }

    fn next(&mut self, bindings: &mut BindingsArena) -> ExecutorResult<Option<Row>> {
        while let Some(row) = self.input.next(bindings)? {
            if self.keep_types.iter().any(|t| row.is_type(t)) {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    fn close(&mut self) {
        self.input.close();
    }

    fn destroy(&mut self) {
        self.input.destroy();
    }
}

/// Rows of one type must satisfy a predicate; other rows pass untouched
pub(crate) struct SelectCursor {
    ctx: Arc<QueryContext>,
    input: Box<OperatorCursor>,
    row_type: Arc<RowType>,
    predicate: Expression,
    scope: Option<BindingsId>,
}

impl SelectCursor {
    pub(crate) fn new(
        ctx: &Arc<QueryContext>,
        input: OperatorCursor,
        row_type: Arc<RowType>,
        predicate: Expression,
    ) -> Self {
        Self {
            ctx: Arc::clone(ctx),
            input: Box::new(input),
            row_type,
            predicate,
            scope: None,
        }
    }
}

impl Node for SelectCursor {
    fn open(&mut self, bindings: &mut BindingsArena, scope: BindingsId) -> ExecutorResult<()> {
        self.input.open(bindings, scope)?;
        self.scope = Some(scope);
        Ok(())
    }

    fn next(&mut self, bindings: &mut BindingsArena) -> ExecutorResult<Option<Row>> {
        let scope = self.scope.ok_or_else(|| ExecutorError::Internal("select has no scope".into()))?;
        while let Some(row) = self.input.next(bindings)? {
            if !row.is_type(&self.row_type) {
                return Ok(Some(row));
            }
            let eval = EvalContext {
                bindings,
                scope,
                comparator: self.ctx.comparator(),
            };
            if self.predicate.matches(&row, &eval)? {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    fn close(&mut self) {
        self.scope = None;
        self.input.close();
    }

    fn destroy(&mut self) {
        self.scope = None;
        self.input.destroy();
    }
}

/// Replaces rows of one type with computed rows; the hkey is kept
pub(crate) struct ProjectCursor {
    ctx: Arc<QueryContext>,
    input: Box<OperatorCursor>,
    row_type: Arc<RowType>,
    expressions: Vec<Expression>,
    output_type: Arc<RowType>,
    scope: Option<BindingsId>,
}

impl ProjectCursor {
    pub(crate) fn new(
        ctx: &Arc<QueryContext>,
        input: OperatorCursor,
        row_type: Arc<RowType>,
        expressions: Vec<Expression>,
        output_type: Arc<RowType>,
    ) -> Self {
        Self {
            ctx: Arc::clone(ctx),
            input: Box::new(input),
            row_type,
            expressions,
            output_type,
            scope: None,
        }
    }
}

impl Node for ProjectCursor {
    fn open(&mut self, bindings: &mut BindingsArena, scope: BindingsId) -> ExecutorResult<()> {
        if self.expressions.len() != self.output_type.arity() {
            return Err(ExecutorError::PlanInvalid(format!(
                "{} expressions for {}",
                self.expressions.len(),
                self.output_type
            )));
        }
        self.input.open(bindings, scope)?;
        self.scope = Some(scope);
        Ok(())
    }

    fn next(&mut self, bindings: &mut BindingsArena) -> ExecutorResult<Option<Row>> {
        let scope = self.scope.ok_or_else(|| ExecutorError::Internal("project has no scope".into()))?;
        let Some(row) = self.input.next(bindings)? else {
            return Ok(None);
        };
        if !row.is_type(&self.row_type) {
            return Ok(Some(row));
        }
        let eval = EvalContext {
            bindings,
            scope,
            comparator: self.ctx.comparator(),
        };
        let values = self
            .expressions
            .iter()
            .map(|e| e.evaluate(&row, &eval))
            .collect::<ExecutorResult<Vec<_>>>()?;
        let mut projected = Row::new(Arc::clone(&self.output_type), values);
        if let Some(hkey) = row.hkey() {
            projected = projected.with_hkey(hkey.clone());
        }
        Ok(Some(projected))
    }

    fn close(&mut self) {
        self.scope = None;
        self.input.close();
    }

    fn destroy(&mut self) {
        self.scope = None;
        self.input.destroy();
    }
}

/// Skips `skip` rows, then passes at most `limit`
pub(crate) struct LimitCursor {
    input: Box<OperatorCursor>,
    skip: usize,
    limit: Option<usize>,
    skipped: usize,
    returned: usize,
}

impl LimitCursor {
    pub(crate) fn new(input: OperatorCursor, skip: usize, limit: Option<usize>) -> Self {
        Self {
            input: Box::new(input),
            skip,
            limit,
            skipped: 0,
            returned: 0,
        }
    }
}

impl Node for LimitCursor {
    fn open(&mut self, bindings: &mut BindingsArena, scope: BindingsId) -> ExecutorResult<()> {
        self.input.open(bindings, scope)?;
        self.skipped = 0;
        self.returned = 0;
        Ok(())
    }

    fn next(&mut self, bindings: &mut BindingsArena) -> ExecutorResult<Option<Row>> {
        if self.limit.map_or(false, |limit| self.returned >= limit) {
            return Ok(None);
        }
        while self.skipped < self.skip {
            if self.input.next(bindings)?.is_none() {
                return Ok(None);
            }
            self.skipped += 1;
        }
        let row = self.input.next(bindings)?;
        if row.is_some() {
            self.returned += 1;
        }
        Ok(row)
    }

    fn close(&mut self) {
        self.input.close();
    }

    fn destroy(&mut self) {
        self.input.destroy();
    }
}
