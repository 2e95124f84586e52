//! Sort operators
//!
//! The input is opened, drained into a sorter and closed during `open()`.
//! `next()` then reads the sorted cursor. Reopening sorts again.

use std::sync::Arc;

use crate::bindings::{BindingsArena, BindingsId};
use crate::context::QueryContext;
use crate::sort::{
    create_sorter, InsertionLimitedSorter, SortMode, SortOrder, SortSpec, SortedCursor, Sorter,
};
use crate::types::{Row, RowType};

use super::cursor::Cursor;
use super::errors::ExecutorResult;
use super::node::Node;
use super::operator_cursor::OperatorCursor;

pub(crate) enum SortStrategy {
    /// Memory or external, by estimate
    General { estimated_rows: Option<u64> },
    /// Keep only the first `limit` rows
    InsertionLimited { limit: usize },
}

pub(crate) struct SortCursor {
    ctx: Arc<QueryContext>,
    input: Box<OperatorCursor>,
    row_type: Arc<RowType>,
    spec: SortSpec,
    mode: SortMode,
    strategy: SortStrategy,
    sorter: Option<Box<dyn Sorter>>,
    sorted: Option<SortedCursor>,
}

impl SortCursor {
    pub(crate) fn new(
        ctx: &Arc<QueryContext>,
        input: OperatorCursor,
        row_type: Arc<RowType>,
        spec: SortSpec,
        mode: SortMode,
        strategy: SortStrategy,
    ) -> Self {
        Self {
            ctx: Arc::clone(ctx),
            input: Box::new(input),
            row_type,
            spec,
            mode,
            strategy,
            sorter: None,
            sorted: None,
        }
    }

    fn make_sorter(&self) -> Box<dyn Sorter> {
        match self.strategy {
            SortStrategy::General { estimated_rows } => create_sorter(
                &self.ctx,
                Arc::clone(&self.row_type),
                &self.spec,
                self.mode,
                estimated_rows,
            ),
            SortStrategy::InsertionLimited { limit } => {
                let order = Arc::new(SortOrder::new(
                    self.ctx.shared_comparator(),
                    &self.spec,
                    self.mode,
                    self.row_type.arity(),
                ));
                Box::new(InsertionLimitedSorter::new(
                    Arc::clone(&self.ctx),
                    Arc::clone(&self.row_type),
                    order,
                    limit,
                ))
            }
        }
    }

    fn release(&mut self) {
        if let Some(mut sorted) = self.sorted.take() {
            sorted.close();
        }
        if let Some(mut sorter) = self.sorter.take() {
            sorter.close();
        }
    }
}

impl Node for SortCursor {
    fn open(&mut self, bindings: &mut BindingsArena, scope: BindingsId) -> ExecutorResult<()> {
        self.release();
        self.input.open(bindings, scope)?;
        let mut sorter = self.make_sorter();
        let result = sorter.sort(self.input.as_mut(), bindings);
        self.input.close();
        self.sorter = Some(sorter);
        self.sorted = Some(result?);
        Ok(())
    }

    fn next(&mut self, bindings: &mut BindingsArena) -> ExecutorResult<Option<Row>> {
        match &mut self.sorted {
            Some(sorted) => sorted.next(bindings),
            None => Ok(None),
        }
    }

    fn close(&mut self) {
        self.release();
        self.input.close();
    }

    fn destroy(&mut self) {
        if let Some(mut sorted) = self.sorted.take() {
            sorted.destroy();
        }
        if let Some(mut sorter) = self.sorter.take() {
            sorter.close();
        }
        self.input.destroy();
    }
}
