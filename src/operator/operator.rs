//! Plan nodes
//!
//! An `Operator` is an immutable description. Its only behavior is
//! `cursor()`, which builds the matching tree of cursors for one execution.

use std::fmt;
use std::sync::Arc;

use crate::context::QueryContext;
use crate::sort::{SortMode, SortSpec};
use crate::store::GroupSchema;
use crate::types::{RowType, Value};

use super::ancestor_lookup::AncestorLookupCursor;
use super::expression::Expression;
use super::filter::{FilterCursor, LimitCursor, ProjectCursor, SelectCursor};
use super::flatten::{FlattenCursor, FlattenOptions, JoinType};
use super::group_scan::GroupScanCursor;
use super::hkey_merge::HKeyMergeCursor;
use super::nested_loops::NestedLoopsCursor;
use super::operator_cursor::{CursorKind, OperatorCursor};
use super::sort::{SortCursor, SortStrategy};
use super::values_scan::ValuesScanCursor;

#[derive(Debug, Clone)]
pub enum Operator {
    ValuesScan {
        row_type: Arc<RowType>,
        rows: Arc<Vec<Vec<Value>>>,
    },
    GroupScan {
        group: Arc<GroupSchema>,
        /// Scan only the subtree of the row bound at this slot
        branch_binding: Option<usize>,
    },
    Filter {
        input: Box<Operator>,
        keep_types: Vec<Arc<RowType>>,
    },
    Select {
        input: Box<Operator>,
        row_type: Arc<RowType>,
        predicate: Expression,
    },
    Project {
        input: Box<Operator>,
        row_type: Arc<RowType>,
        expressions: Vec<Expression>,
        output_type: Arc<RowType>,
    },
    Limit {
        input: Box<Operator>,
        skip: usize,
        limit: Option<usize>,
    },
    MapNestedLoops {
        outer: Box<Operator>,
        inner: Box<Operator>,
        binding_position: usize,
    },
    Flatten {
        input: Box<Operator>,
        parent_type: Arc<RowType>,
        child_type: Arc<RowType>,
        output_type: Arc<RowType>,
        join: JoinType,
        options: FlattenOptions,
    },
    HKeyMerge {
        inputs: Vec<Operator>,
    },
    AncestorLookup {
        input: Box<Operator>,
        group: Arc<GroupSchema>,
        row_type: Arc<RowType>,
        ancestor_types: Vec<Arc<RowType>>,
        keep_input: bool,
    },
    Sort {
        input: Box<Operator>,
        row_type: Arc<RowType>,
        spec: SortSpec,
        mode: SortMode,
        estimated_rows: Option<u64>,
    },
    SortInsertionLimited {
        input: Box<Operator>,
        row_type: Arc<RowType>,
        spec: SortSpec,
        mode: SortMode,
        limit: usize,
    },
}

impl Operator {
    pub fn values_scan(row_type: Arc<RowType>, rows: Vec<Vec<Value>>) -> Self {
        Operator::ValuesScan {
            row_type,
            rows: Arc::new(rows),
        }
    }

    pub fn group_scan(group: Arc<GroupSchema>) -> Self {
        Operator::GroupScan {
            group,
            branch_binding: None,
        }
    }

    /// Scan the subtree rooted at the row bound at `slot`
    pub fn branch_scan(group: Arc<GroupSchema>, slot: usize) -> Self {
        Operator::GroupScan {
            group,
            branch_binding: Some(slot),
        }
    }

    pub fn filter(input: Operator, keep_types: Vec<Arc<RowType>>) -> Self {
        Operator::Filter {
            input: Box::new(input),
            keep_types,
        }
    }

    pub fn select(input: Operator, row_type: Arc<RowType>, predicate: Expression) -> Self {
        Operator::Select {
            input: Box::new(input),
            row_type,
            predicate,
        }
    }

    pub fn project(
        input: Operator,
        row_type: Arc<RowType>,
        expressions: Vec<Expression>,
        output_type: Arc<RowType>,
    ) -> Self {
        Operator::Project {
            input: Box::new(input),
            row_type,
            expressions,
            output_type,
        }
    }

    pub fn limit(input: Operator, skip: usize, limit: Option<usize>) -> Self {
        Operator::Limit {
            input: Box::new(input),
            skip,
            limit,
        }
    }

    pub fn map_nested_loops(outer: Operator, inner: Operator, binding_position: usize) -> Self {
        Operator::MapNestedLoops {
            outer: Box::new(outer),
            inner: Box::new(inner),
            binding_position,
        }
    }

    /// Flatten `parent_type` rows with their `child_type` children into rows
    /// of a new type numbered `output_id`
    pub fn flatten(
        input: Operator,
        parent_type: Arc<RowType>,
        child_type: Arc<RowType>,
        output_id: u32,
        join: JoinType,
        options: FlattenOptions,
    ) -> Self {
        let output_type = RowType::flattened(output_id, &parent_type, &child_type);
        Operator::Flatten {
            input: Box::new(input),
            parent_type,
            child_type,
            output_type,
            join,
            options,
        }
    }

    pub fn hkey_merge(inputs: Vec<Operator>) -> Self {
        Operator::HKeyMerge { inputs }
    }

    /// For each `row_type` row, read its `ancestor_types` rows from the group
    pub fn ancestor_lookup(
        input: Operator,
        group: Arc<GroupSchema>,
        row_type: Arc<RowType>,
        ancestor_types: Vec<Arc<RowType>>,
        keep_input: bool,
    ) -> Self {
        Operator::AncestorLookup {
            input: Box::new(input),
            group,
            row_type,
            ancestor_types,
            keep_input,
        }
    }

    pub fn sort(
        input: Operator,
        row_type: Arc<RowType>,
        spec: SortSpec,
        mode: SortMode,
        estimated_rows: Option<u64>,
    ) -> Self {
        Operator::Sort {
            input: Box::new(input),
            row_type,
            spec,
            mode,
            estimated_rows,
        }
    }

    pub fn sort_insertion_limited(
        input: Operator,
        row_type: Arc<RowType>,
        spec: SortSpec,
        mode: SortMode,
        limit: usize,
    ) -> Self {
        Operator::SortInsertionLimited {
            input: Box::new(input),
            row_type,
            spec,
            mode,
            limit,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operator::ValuesScan { .. } => "ValuesScan",
            Operator::GroupScan { branch_binding: None, .. } => "GroupScan",
            Operator::GroupScan { .. } => "BranchScan",
            Operator::Filter { .. } => "Filter",
            Operator::Select { .. } => "Select",
            Operator::Project { .. } => "Project",
            Operator::Limit { .. } => "Limit",
            Operator::MapNestedLoops { .. } => "MapNestedLoops",
            Operator::Flatten { .. } => "Flatten",
            Operator::HKeyMerge { .. } => "HKeyMerge",
            Operator::AncestorLookup { .. } => "AncestorLookup",
            Operator::Sort { .. } => "Sort",
            Operator::SortInsertionLimited { .. } => "SortInsertionLimited",
        }
    }

    /// Type of the rows this operator produces, where there is exactly one
    pub fn output_type(&self) -> Option<Arc<RowType>> {
        match self {
            Operator::ValuesScan { row_type, .. }
            | Operator::Sort { row_type, .. }
            | Operator::SortInsertionLimited { row_type, .. } => Some(Arc::clone(row_type)),
            Operator::Project { output_type, .. } => Some(Arc::clone(output_type)),
            Operator::Filter { keep_types, .. } if keep_types.len() == 1 => {
                Some(Arc::clone(&keep_types[0]))
            }
            Operator::Limit { input, .. } | Operator::Select { input, .. } => input.output_type(),
            _ => None,
        }
    }

    /// Build the cursor tree for one execution
    pub fn cursor(&self, ctx: &Arc<QueryContext>) -> OperatorCursor {
        let kind = match self {
            Operator::ValuesScan { row_type, rows } => CursorKind::ValuesScan(
                ValuesScanCursor::new(Arc::clone(row_type), Arc::clone(rows)),
            ),
            Operator::GroupScan {
                group,
                branch_binding,
            } => CursorKind::GroupScan(GroupScanCursor::new(
                ctx,
                Arc::clone(group),
                *branch_binding,
            )),
            Operator::Filter { input, keep_types } => {
                CursorKind::Filter(FilterCursor::new(input.cursor(ctx), keep_types.clone()))
            }
            Operator::Select {
                input,
                row_type,
                predicate,
            } => CursorKind::Select(SelectCursor::new(
                ctx,
                input.cursor(ctx),
                Arc::clone(row_type),
                predicate.clone(),
            )),
            Operator::Project {
                input,
                row_type,
                expressions,
                output_type,
            } => CursorKind::Project(ProjectCursor::new(
                ctx,
                input.cursor(ctx),
                Arc::clone(row_type),
                expressions.clone(),
                Arc::clone(output_type),
            )),
            Operator::Limit { input, skip, limit } => {
                CursorKind::Limit(LimitCursor::new(input.cursor(ctx), *skip, *limit))
            }
            Operator::MapNestedLoops {
                outer,
                inner,
                binding_position,
            } => CursorKind::MapNestedLoops(NestedLoopsCursor::new(
                ctx,
                outer.cursor(ctx),
                inner.cursor(ctx),
                *binding_position,
            )),
            Operator::Flatten {
                input,
                parent_type,
                child_type,
                output_type,
                join,
                options,
            } => CursorKind::Flatten(FlattenCursor::new(
                ctx,
                input.cursor(ctx),
                Arc::clone(parent_type),
                Arc::clone(child_type),
                Arc::clone(output_type),
                *join,
                *options,
            )),
            Operator::HKeyMerge { inputs } => CursorKind::HKeyMerge(HKeyMergeCursor::new(
                inputs.iter().map(|op| op.cursor(ctx)).collect(),
            )),
            Operator::AncestorLookup {
                input,
                group,
                row_type,
                ancestor_types,
                keep_input,
            } => CursorKind::AncestorLookup(AncestorLookupCursor::new(
                ctx,
                input.cursor(ctx),
                Arc::clone(group),
                Arc::clone(row_type),
                ancestor_types.clone(),
                *keep_input,
            )),
            Operator::Sort {
                input,
                row_type,
                spec,
                mode,
                estimated_rows,
            } => CursorKind::Sort(SortCursor::new(
                ctx,
                input.cursor(ctx),
                Arc::clone(row_type),
                spec.clone(),
                *mode,
                SortStrategy::General {
                    estimated_rows: *estimated_rows,
                },
            )),
            Operator::SortInsertionLimited {
                input,
                row_type,
                spec,
                mode,
                limit,
            } => CursorKind::Sort(SortCursor::new(
                ctx,
                input.cursor(ctx),
                Arc::clone(row_type),
                spec.clone(),
                *mode,
                SortStrategy::InsertionLimited { limit: *limit },
            )),
        };
        OperatorCursor::new(self.name(), ctx, kind)
    }

    /// Indented plan description, one operator per line
    pub fn describe(&self) -> String {
        let mut out = String::new();
        self.describe_into(&mut out, 0);
        out
    }

    fn describe_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(self.name());
        out.push('(');
        out.push_str(&self.detail());
        out.push_str(")\n");
        for child in self.children() {
            child.describe_into(out, depth + 1);
        }
    }

    fn detail(&self) -> String {
        match self {
            Operator::ValuesScan { row_type, rows } => format!("{}, {} rows", row_type, rows.len()),
            Operator::GroupScan {
                group,
                branch_binding: None,
            } => group.name().to_string(),
            Operator::GroupScan {
                group,
                branch_binding: Some(slot),
            } => format!("{} under ?{}", group.name(), slot),
            Operator::Filter { keep_types, .. } => keep_types
                .iter()
                .map(|t| t.name().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            Operator::Select {
                row_type,
                predicate,
                ..
            } => format!("{}: {}", row_type, predicate),
            Operator::Project {
                row_type,
                expressions,
                ..
            } => format!(
                "{}: {}",
                row_type,
                expressions
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Operator::Limit { skip, limit, .. } => match limit {
                Some(l) => format!("skip {}, limit {}", skip, l),
                None => format!("skip {}", skip),
            },
            Operator::MapNestedLoops {
                binding_position, ..
            } => format!("bind ?{}", binding_position),
            Operator::Flatten {
                parent_type,
                child_type,
                join,
                ..
            } => format!("{} {} JOIN {}", parent_type, join, child_type),
            Operator::HKeyMerge { inputs } => format!("{} inputs", inputs.len()),
            Operator::AncestorLookup {
                group,
                row_type,
                ancestor_types,
                keep_input,
                ..
            } => format!(
                "{} in {} -> {}{}",
                row_type.name(),
                group.name(),
                ancestor_types
                    .iter()
                    .map(|t| t.name().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                if *keep_input { ", keep input" } else { "" }
            ),
            Operator::Sort { spec, mode, .. } => format!("{}, {}", spec, mode.as_str()),
            Operator::SortInsertionLimited {
                spec, mode, limit, ..
            } => format!("{}, {}, limit {}", spec, mode.as_str(), limit),
        }
    }

    fn children(&self) -> Vec<&Operator> {
        match self {
            Operator::ValuesScan { .. } | Operator::GroupScan { .. } => Vec::new(),
            Operator::Filter { input, .. }
            | Operator::Select { input, .. }
            | Operator::Project { input, .. }
            | Operator::Limit { input, .. }
            | Operator::Flatten { input, .. }
            | Operator::AncestorLookup { input, .. }
            | Operator::Sort { input, .. }
            | Operator::SortInsertionLimited { input, .. } => vec![input.as_ref()],
            Operator::MapNestedLoops { outer, inner, .. } => vec![outer.as_ref(), inner.as_ref()],
            Operator::HKeyMerge { inputs } => inputs.iter().collect(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}
