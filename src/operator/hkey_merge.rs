//! Merge of hkey-ordered streams
//!
//! Each input is already in hkey order. The merge always emits the input
//! head with the smallest hkey, so the output is in hkey order too and
//! every ancestor precedes its descendants.
//!
//! The merge is a union: a row whose hkey equals the last emitted one is
//! dropped. Among inputs holding the same hkey, the lowest index wins.

use crate::bindings::{BindingsArena, BindingsId};
use crate::hkey::HKey;
use crate::types::Row;

use super::cursor::Cursor;
use super::errors::{ExecutorError, ExecutorResult};
use super::node::Node;
use super::operator_cursor::OperatorCursor;

struct Input {
    cursor: OperatorCursor,
    head: Option<Row>,
    done: bool,
}

pub(crate) struct HKeyMergeCursor {
    inputs: Vec<Input>,
    last_emitted: Option<HKey>,
}

impl HKeyMergeCursor {
    pub(crate) fn new(inputs: Vec<OperatorCursor>) -> Self {
        Self {
            inputs: inputs
                .into_iter()
                .map(|cursor| Input {
                    cursor,
                    head: None,
                    done: false,
                })
                .collect(),
            last_emitted: None,
        }
    }

    fn fill_heads(&mut self, bindings: &mut BindingsArena) -> ExecutorResult<()> {
        for input in &mut self.inputs {
            if input.head.is_none() && !input.done {
                match input.cursor.next(bindings)? {
                    Some(row) => {
                        if row.hkey().is_none() {
                            return Err(ExecutorError::PlanInvalid(format!(
                                "hkey merge input {} produced {} without an hkey",
                                input.cursor.name(),
                                row
                            )));
                        }
                        input.head = Some(row);
                    }
                    None => input.done = true,
                }
            }
        }
        Ok(())
    }

    /// Index of the head with the smallest hkey, lowest index on ties
    fn smallest_head(&self) -> Option<usize> {
        let mut best: Option<(usize, &HKey)> = None;
        for (i, input) in self.inputs.iter().enumerate() {
            let Some(hkey) = input.head.as_ref().and_then(Row::hkey) else {
                continue;
            };
            if best.map_or(true, |(_, current)| hkey < current) {
                best = Some((i, hkey));
            }
        }
        best.map(|(i, _)| i)
    }
}

impl Node for HKeyMergeCursor {
    fn open(&mut self, bindings: &mut BindingsArena, scope: BindingsId) -> ExecutorResult<()> {
        if self.inputs.is_empty() {
            return Err(ExecutorError::PlanInvalid("hkey merge without inputs".into()));
        }
        self.last_emitted = None;
        for input in &mut self.inputs {
            input.head = None;
            input.done = false;
            input.cursor.open(bindings, scope)?;
        }
        Ok(())
    }

    fn next(&mut self, bindings: &mut BindingsArena) -> ExecutorResult<Option<Row>> {
        loop {
            self.fill_heads(bindings)?;
            let Some(row) = self.smallest_head().and_then(|i| self.inputs[i].head.take()) else {
                return Ok(None);
            };
            let hkey = row.hkey().cloned();
            if hkey.is_some() && hkey == self.last_emitted {
                continue;
            }
            self.last_emitted = hkey;
            return Ok(Some(row));
        }
    }

    fn close(&mut self) {
        self.last_emitted = None;
        for input in &mut self.inputs {
            input.head = None;
            input.done = false;
            input.cursor.close();
        }
    }

    fn destroy(&mut self) {
        self.last_emitted = None;
        for input in &mut self.inputs {
            input.head = None;
            input.cursor.destroy();
        }
    }
}
