//! CLI command implementations

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::bindings::BindingsArena;
use crate::context::{ExecutionConfig, QueryContext};
use crate::observability::{MetricsSnapshot, Timer};
use crate::operator::{drain, Cursor, CursorGuard, Operator};
use crate::sort::{MemorySorter, MergeJoinSorter, SortMode, SortOrder, SortSpec, Sorter};
use crate::store::MemoryStore;
use crate::types::{Row, RowType, Value};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_response;

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::CheckConfig { config } => {
            let config = check_config(&config)?;
            write_response(serde_json::to_value(&config)?)
        }
        Command::SortBench {
            rows,
            config,
            run_rows,
        } => {
            let report = sort_bench(rows, config.as_deref(), run_rows)?;
            write_response(serde_json::to_value(&report)?)
        }
    }
}

/// Load and validate a config file
pub fn check_config(path: &Path) -> CliResult<ExecutionConfig> {
    Ok(ExecutionConfig::load(path)?)
}

/// Outcome of one `sort-bench` run
#[derive(Debug, Clone, Serialize)]
pub struct SortBenchReport {
    pub rows: u64,
    pub run_rows: usize,
    pub memory_elapsed_ms: u64,
    pub external_elapsed_ms: u64,
    pub identical: bool,
    pub metrics: MetricsSnapshot,
}

/// Sort `rows` synthetic rows with both sorters and require identical output.
///
/// Keys repeat every 1000 rows so stability is exercised too.
pub fn sort_bench(
    rows: u64,
    config_path: Option<&Path>,
    run_rows: Option<usize>,
) -> CliResult<SortBenchReport> {
    let mut config = match config_path {
        Some(path) => ExecutionConfig::load(path)?,
        None => ExecutionConfig::default(),
    };
    if let Some(run_rows) = run_rows {
        config = config.with_sort_run_rows(run_rows);
        config.validate()?;
    }
    let run_rows = config.sort_run_rows;

    let ctx = Arc::new(QueryContext::new(Arc::new(MemoryStore::new()), config));
    let row_type = RowType::new(1, "bench", 3);
    let input = Operator::values_scan(Arc::clone(&row_type), synthetic_rows(rows));
    let order = Arc::new(SortOrder::new(
        ctx.shared_comparator(),
        &SortSpec::asc(0),
        SortMode::PreserveDuplicates,
        row_type.arity(),
    ));

    let timer = Timer::new();
    let mut memory = MemorySorter::new(Arc::clone(&ctx), Arc::clone(&row_type), Arc::clone(&order));
    let in_memory = run_sorter(&ctx, &input, &mut memory)?;
    let memory_elapsed_ms = timer.elapsed_millis();

    let timer = Timer::new();
    let mut external = MergeJoinSorter::new(Arc::clone(&ctx), Arc::clone(&row_type), order);
    let spilled = run_sorter(&ctx, &input, &mut external)?;
    let external_elapsed_ms = timer.elapsed_millis();

    if let Some(at) = first_difference(&in_memory, &spilled) {
        return Err(CliError::sort_mismatch(at));
    }

    Ok(SortBenchReport {
        rows,
        run_rows,
        memory_elapsed_ms,
        external_elapsed_ms,
        identical: true,
        metrics: ctx.metrics().snapshot(),
    })
}

fn run_sorter(
    ctx: &Arc<QueryContext>,
    input: &Operator,
    sorter: &mut dyn Sorter,
) -> CliResult<Vec<Row>> {
    let mut bindings = BindingsArena::new();
    let root = bindings.root();
    let mut cursor = input.cursor(ctx);
    let mut guard = CursorGuard::open(&mut cursor, &mut bindings, root)?;
    let mut sorted = sorter.sort(guard.cursor(), &mut bindings)?;
    // The sorted cursor no longer needs its input
    drop(guard);
    let rows = drain(&mut sorted, &mut bindings);
    sorted.close();
    sorter.close();
    Ok(rows?)
}

fn synthetic_rows(rows: u64) -> Vec<Vec<Value>> {
    (0..rows)
        .map(|i| {
            let key = (i.wrapping_mul(2_654_435_761) % 1000) as i64;
            vec![
                Value::Int(key),
                Value::Text(format!("row-{}", i)),
                Value::Int(i as i64),
            ]
        })
        .collect()
}

fn first_difference(left: &[Row], right: &[Row]) -> Option<usize> {
    if let Some(at) = left.iter().zip(right).position(|(l, r)| l != r) {
        return Some(at);
    }
    (left.len() != right.len()).then(|| left.len().min(right.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_sort_bench_spills_and_matches() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("groupqp.json");
        let spill = dir.path().join("spill");
        fs::create_dir(&spill).unwrap();
        fs::write(
            &config_path,
            serde_json::json!({ "spill_dir": spill }).to_string(),
        )
        .unwrap();

        let report = sort_bench(2_000, Some(&config_path), Some(300)).unwrap();
        assert!(report.identical);
        assert_eq!(report.run_rows, 300);
        assert_eq!(report.metrics.spill_runs, 6);
        assert_eq!(report.metrics.memory_sorts, 1);
        assert_eq!(report.metrics.external_sorts, 1);
        assert_eq!(fs::read_dir(&spill).unwrap().count(), 0);
    }

    #[test]
    fn test_sort_bench_rejects_zero_run_rows() {
        let err = sort_bench(10, None, Some(0)).unwrap_err();
        assert_eq!(err.code_str(), "GQP_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_check_config_missing_file() {
        let err = check_config(Path::new("/no/such/groupqp.json")).unwrap_err();
        assert_eq!(err.code_str(), "GQP_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_first_difference() {
        let row_type = RowType::new(1, "t", 1);
        let a = Row::new(Arc::clone(&row_type), vec![Value::Int(1)]);
        let b = Row::new(row_type, vec![Value::Int(2)]);
        assert_eq!(first_difference(&[a.clone()], &[a.clone()]), None);
        assert_eq!(first_difference(&[a.clone()], &[b]), Some(0));
        assert_eq!(first_difference(&[a.clone(), a.clone()], &[a]), Some(1));
    }
}
