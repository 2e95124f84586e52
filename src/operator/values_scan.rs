//! Literal rows

use std::sync::Arc;

use crate::bindings::{BindingsArena, BindingsId};
use crate::types::{Row, RowType, Value};

use super::errors::{ExecutorError, ExecutorResult};
use super::node::Node;

pub(crate) struct ValuesScanCursor {
    row_type: Arc<RowType>,
    rows: Arc<Vec<Vec<Value>>>,
    position: usize,
}

impl ValuesScanCursor {
    pub(crate) fn new(row_type: Arc<RowType>, rows: Arc<Vec<Vec<Value>>>) -> Self {
        Self {
            row_type,
            rows,
            position: 0,
        }
    }
}

impl Node for ValuesScanCursor {
    fn open(&mut self, _bindings: &mut BindingsArena, _scope: BindingsId) -> ExecutorResult<()> {
        if let Some(bad) = self.rows.iter().find(|r| r.len() != self.row_type.arity()) {
            return Err(ExecutorError::PlanInvalid(format!(
                "values row of {} columns for {}",
                bad.len(),
                self.row_type
            )));
        }
        self.position = 0;
        Ok(())
    }

    fn next(&mut self, _bindings: &mut BindingsArena) -> ExecutorResult<Option<Row>> {
        let Some(values) = self.rows.get(self.position) else {
            return Ok(None);
        };
        self.position += 1;
        Ok(Some(Row::new(Arc::clone(&self.row_type), values.clone())))
    }

    fn close(&mut self) {
        self.position = 0;
    }
}
