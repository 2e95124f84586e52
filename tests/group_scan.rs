//! Group Scan Tests
//!
//! Hierarchical scans over a customer/order/item group:
//! - Rows come back in hkey order, each parent followed by its subtree
//! - Ancestor and child links reflect what the scan observed
//! - Orphans are emitted and counted, never dropped
//! - Branch scans read exactly one subtree
//! - Flatten and hkey merge preserve hkey order
//! - Ancestor lookup reads parents by hkey prefix

use std::sync::Arc;

use groupqp::bindings::BindingsArena;
use groupqp::context::{ExecutionConfig, QueryContext};
use groupqp::hkey::HKey;
use groupqp::operator::{collect, Cursor, FlattenOptions, JoinType, Operator};
use groupqp::store::{GroupSchema, MemoryStore};
use groupqp::types::{Row, RowType, Value};

// =============================================================================
// Helper Functions
// =============================================================================

struct Fixture {
    store: Arc<MemoryStore>,
    group: Arc<GroupSchema>,
    customer: Arc<RowType>,
    order: Arc<RowType>,
    item: Arc<RowType>,
}

/// customer(cid, name) -> order(oid, cid) -> item(iid, oid)
fn fixture() -> Fixture {
    let customer = RowType::table(1, "customer", 2, 1);
    let order = RowType::table(2, "order", 2, 2);
    let item = RowType::table(3, "item", 2, 3);
    let group = GroupSchema::new("coi")
        .with_table(Arc::clone(&customer), None, vec![0])
        .unwrap()
        .with_table(Arc::clone(&order), Some(1), vec![0])
        .unwrap()
        .with_table(Arc::clone(&item), Some(2), vec![0])
        .unwrap();
    let store = Arc::new(MemoryStore::new());
    store.register_group(&group).unwrap();
    Fixture {
        store,
        group: Arc::new(group),
        customer,
        order,
        item,
    }
}

impl Fixture {
    fn insert(&self, row_type: &Arc<RowType>, parent: Option<&HKey>, values: Vec<Value>) -> HKey {
        let row = Row::new(Arc::clone(row_type), values);
        self.store.insert_row(&self.group, parent, &row).unwrap()
    }

    /// c1 { o10 { i100 }, o20 }, c2 { o30 }, orphan o40 under missing c3
    fn populate(&self) {
        let c1 = self.insert(&self.customer, None, vec![Value::Int(1), Value::from("ann")]);
        let o10 = self.insert(&self.order, Some(&c1), vec![Value::Int(10), Value::Int(1)]);
        self.insert(&self.item, Some(&o10), vec![Value::Int(100), Value::Int(10)]);
        self.insert(&self.order, Some(&c1), vec![Value::Int(20), Value::Int(1)]);
        let c2 = self.insert(&self.customer, None, vec![Value::Int(2), Value::from("bob")]);
        self.insert(&self.order, Some(&c2), vec![Value::Int(30), Value::Int(2)]);
        let missing = HKey::root(1, vec![Value::Int(3)]);
        self.insert(&self.order, Some(&missing), vec![Value::Int(40), Value::Int(3)]);
    }

    fn ctx(&self, config: ExecutionConfig) -> Arc<QueryContext> {
        Arc::new(QueryContext::new(self.store.clone(), config))
    }
}

fn hkeys(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .map(|r| r.hkey().map_or_else(|| "-".to_string(), |h| h.to_string()))
        .collect()
}

fn shown(rows: &[Row]) -> Vec<String> {
    rows.iter().map(|r| r.to_string()).collect()
}

fn linkage(row: &Row) -> (Option<String>, Option<String>) {
    (
        row.ancestor().map(|h| h.to_string()),
        row.child().map(|h| h.to_string()),
    )
}

// =============================================================================
// Hierarchical Order and Linkage
// =============================================================================

#[test]
fn test_scan_returns_hkey_order() {
    let f = fixture();
    f.populate();
    let ctx = f.ctx(ExecutionConfig::default());
    let mut bindings = BindingsArena::new();
    let rows = collect(&mut Operator::group_scan(Arc::clone(&f.group)).cursor(&ctx), &mut bindings)
        .unwrap();
    assert_eq!(
        hkeys(&rows),
        vec![
            "{1,1}",
            "{1,1,2,10}",
            "{1,1,2,10,3,100}",
            "{1,1,2,20}",
            "{1,2}",
            "{1,2,2,30}",
            "{1,3,2,40}",
        ]
    );
}

#[test]
fn test_linkage_customer_order_item() {
    let f = fixture();
    f.populate();
    let ctx = f.ctx(ExecutionConfig::default());
    let mut bindings = BindingsArena::new();
    let rows = collect(&mut Operator::group_scan(Arc::clone(&f.group)).cursor(&ctx), &mut bindings)
        .unwrap();

    // customer 1 -> order 10 -> item 100 -> order 20
    assert_eq!(linkage(&rows[0]), (None, Some("{1,1,2,10}".into())));
    assert_eq!(
        linkage(&rows[1]),
        (Some("{1,1}".into()), Some("{1,1,2,10,3,100}".into()))
    );
    assert_eq!(linkage(&rows[2]), (Some("{1,1,2,10}".into()), None));
    // The second order is followed by the next customer, not a child
    assert_eq!(linkage(&rows[3]), (Some("{1,1}".into()), None));
    assert_eq!(linkage(&rows[4]), (None, Some("{1,2,2,30}".into())));
}

#[test]
fn test_orphan_emitted_and_counted() {
    let f = fixture();
    f.populate();
    let ctx = f.ctx(ExecutionConfig::default());
    let mut bindings = BindingsArena::new();
    let rows = collect(&mut Operator::group_scan(Arc::clone(&f.group)).cursor(&ctx), &mut bindings)
        .unwrap();

    assert_eq!(rows.len(), 7);
    let orphans: Vec<&Row> = rows.iter().filter(|r| r.is_orphan()).collect();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].to_string(), "order(40, 3)");
    assert!(orphans[0].ancestor().is_none());
    assert_eq!(ctx.metrics().orphan_rows(), 1);
}

#[test]
fn test_deleted_parent_orphans_its_children() {
    let f = fixture();
    let c1 = f.insert(&f.customer, None, vec![Value::Int(1), Value::from("ann")]);
    let o10 = f.insert(&f.order, Some(&c1), vec![Value::Int(10), Value::Int(1)]);
    f.insert(&f.item, Some(&o10), vec![Value::Int(100), Value::Int(10)]);
    assert!(f.store.delete_row(&f.group, &o10).unwrap());

    let ctx = f.ctx(ExecutionConfig::default());
    let mut bindings = BindingsArena::new();
    let rows = collect(&mut Operator::group_scan(Arc::clone(&f.group)).cursor(&ctx), &mut bindings)
        .unwrap();
    assert_eq!(hkeys(&rows), vec!["{1,1}", "{1,1,2,10,3,100}"]);
    // The customer's next row is a grandchild, not a child
    assert!(rows[0].child().is_none());
    assert!(rows[1].is_orphan());
}

#[test]
fn test_small_batches_give_same_rows() {
    let f = fixture();
    f.populate();
    let mut bindings = BindingsArena::new();

    let whole = f.ctx(ExecutionConfig::default());
    let expected =
        collect(&mut Operator::group_scan(Arc::clone(&f.group)).cursor(&whole), &mut bindings)
            .unwrap();

    for batch in [1, 2, 3, 7] {
        let ctx = f.ctx(ExecutionConfig::default().with_scan_batch_size(batch));
        let rows =
            collect(&mut Operator::group_scan(Arc::clone(&f.group)).cursor(&ctx), &mut bindings)
                .unwrap();
        assert_eq!(rows, expected, "batch size {}", batch);
        assert!(ctx.metrics().snapshot().scan_batches >= (7 / batch) as u64);
    }
}

#[test]
fn test_zero_batch_size_still_reads_everything() {
    let f = fixture();
    f.populate();
    let ctx = f.ctx(ExecutionConfig::default().with_scan_batch_size(0));
    let mut bindings = BindingsArena::new();
    let rows = collect(&mut Operator::group_scan(Arc::clone(&f.group)).cursor(&ctx), &mut bindings)
        .unwrap();
    assert_eq!(rows.len(), 7);
    assert_eq!(ctx.metrics().snapshot().scan_batches, 8);
}

#[test]
fn test_empty_group() {
    let f = fixture();
    let ctx = f.ctx(ExecutionConfig::default());
    let mut bindings = BindingsArena::new();
    let rows = collect(&mut Operator::group_scan(Arc::clone(&f.group)).cursor(&ctx), &mut bindings)
        .unwrap();
    assert!(rows.is_empty());
}

// =============================================================================
// Branch Scans
// =============================================================================

#[test]
fn test_branch_scan_per_customer() {
    let f = fixture();
    f.populate();
    let ctx = f.ctx(ExecutionConfig::default());
    let mut bindings = BindingsArena::new();

    let customers = Operator::filter(
        Operator::group_scan(Arc::clone(&f.group)),
        vec![Arc::clone(&f.customer)],
    );
    let plan = Operator::map_nested_loops(customers, Operator::branch_scan(Arc::clone(&f.group), 0), 0);
    let rows = collect(&mut plan.cursor(&ctx), &mut bindings).unwrap();

    assert_eq!(
        hkeys(&rows),
        vec![
            "{1,1}",
            "{1,1,2,10}",
            "{1,1,2,10,3,100}",
            "{1,1,2,20}",
            "{1,2}",
            "{1,2,2,30}",
        ]
    );
    assert_eq!(bindings.live_scopes(), 1);
}

#[test]
fn test_branch_scan_below_root_links_to_known_ancestors() {
    let f = fixture();
    f.populate();
    let ctx = f.ctx(ExecutionConfig::default());
    let mut bindings = BindingsArena::new();

    let all = collect(&mut Operator::group_scan(Arc::clone(&f.group)).cursor(&ctx), &mut bindings)
        .unwrap();
    let order10 = all[1].clone();
    let orphans_before = ctx.metrics().orphan_rows();

    let root = bindings.root();
    let scope = bindings.create_bindings(root).unwrap();
    bindings.set_row(scope, 4, order10).unwrap();
    let mut branch = Operator::branch_scan(Arc::clone(&f.group), 4).cursor(&ctx);
    branch.open(&mut bindings, scope).unwrap();
    let mut rows = Vec::new();
    while let Some(row) = branch.next(&mut bindings).unwrap() {
        rows.push(row);
    }
    branch.close();
    bindings.release(scope).unwrap();

    assert_eq!(hkeys(&rows), vec!["{1,1,2,10}", "{1,1,2,10,3,100}"]);
    assert_eq!(linkage(&rows[0]).0, Some("{1,1}".into()));
    assert_eq!(ctx.metrics().orphan_rows(), orphans_before);
}

#[test]
fn test_branch_scan_excludes_sibling_sharing_byte_prefix() {
    // Text keys "a" and "a\0": the packed root of "a" is a byte prefix of
    // the packed root of "a\0", but only its own subtree is in range
    let account = RowType::table(1, "account", 1, 1);
    let entry = RowType::table(2, "entry", 2, 2);
    let group = Arc::new(
        GroupSchema::new("ae")
            .with_table(Arc::clone(&account), None, vec![0])
            .unwrap()
            .with_table(Arc::clone(&entry), Some(1), vec![0])
            .unwrap(),
    );
    let store = Arc::new(MemoryStore::new());
    store.register_group(&group).unwrap();
    for (name, id) in [("a", 1), ("a\0", 2)] {
        let parent = store
            .insert_row(&group, None, &Row::new(Arc::clone(&account), vec![Value::from(name)]))
            .unwrap();
        store
            .insert_row(
                &group,
                Some(&parent),
                &Row::new(Arc::clone(&entry), vec![Value::Int(id), Value::from(name)]),
            )
            .unwrap();
    }

    let ctx = Arc::new(QueryContext::new(store.clone(), ExecutionConfig::default()));
    let mut bindings = BindingsArena::new();
    let all = collect(&mut Operator::group_scan(Arc::clone(&group)).cursor(&ctx), &mut bindings)
        .unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].values()[0], Value::from("a"));

    let root = bindings.root();
    bindings.set_row(root, 0, all[0].clone()).unwrap();
    let mut branch = Operator::branch_scan(Arc::clone(&group), 0).cursor(&ctx);
    branch.open(&mut bindings, root).unwrap();
    let mut rows = Vec::new();
    while let Some(row) = branch.next(&mut bindings).unwrap() {
        rows.push(row);
    }
    branch.close();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].values()[0], Value::from("a"));
    assert_eq!(rows[1].values(), &[Value::Int(1), Value::from("a")][..]);
    assert_eq!(ctx.metrics().orphan_rows(), 0);
}

#[test]
fn test_branch_scan_needs_group_row() {
    let f = fixture();
    let ctx = f.ctx(ExecutionConfig::default());
    let mut bindings = BindingsArena::new();
    let root = bindings.root();
    bindings
        .set_row(root, 0, Row::new(RowType::new(9, "plain", 1), vec![Value::Int(1)]))
        .unwrap();

    let mut branch = Operator::branch_scan(Arc::clone(&f.group), 0).cursor(&ctx);
    let err = branch.open(&mut bindings, root).unwrap_err();
    assert_eq!(err.code(), "GQP_PLAN_INVALID");

    let unbound = Operator::branch_scan(Arc::clone(&f.group), 5)
        .cursor(&ctx)
        .open(&mut bindings, root)
        .unwrap_err();
    assert_eq!(unbound.code(), "GQP_UNBOUND_SLOT");
}

// =============================================================================
// Flatten
// =============================================================================

fn flatten_rows(f: &Fixture, join: JoinType, options: FlattenOptions) -> Vec<Row> {
    let ctx = f.ctx(ExecutionConfig::default());
    let mut bindings = BindingsArena::new();
    let plan = Operator::flatten(
        Operator::group_scan(Arc::clone(&f.group)),
        Arc::clone(&f.customer),
        Arc::clone(&f.order),
        50,
        join,
        options,
    );
    collect(&mut plan.cursor(&ctx), &mut bindings).unwrap()
}

fn populate_with_childless_customer(f: &Fixture) {
    f.populate();
    f.insert(&f.customer, None, vec![Value::Int(4), Value::from("dora")]);
}

#[test]
fn test_flatten_inner() {
    let f = fixture();
    populate_with_childless_customer(&f);
    let rows = flatten_rows(&f, JoinType::Inner, FlattenOptions::default());
    assert_eq!(
        shown(&rows),
        vec![
            "flatten(customer, order)(1, 'ann', 10, 1)",
            "item(100, 10)",
            "flatten(customer, order)(1, 'ann', 20, 1)",
            "flatten(customer, order)(2, 'bob', 30, 2)",
        ]
    );
    assert_eq!(
        hkeys(&rows),
        vec!["{1,1,2,10}", "{1,1,2,10,3,100}", "{1,1,2,20}", "{1,2,2,30}"]
    );
}

#[test]
fn test_flatten_left_emits_childless_parent() {
    let f = fixture();
    populate_with_childless_customer(&f);
    let rows = flatten_rows(&f, JoinType::Left, FlattenOptions::default());
    let last = rows.last().unwrap();
    assert_eq!(last.to_string(), "flatten(customer, order)(4, 'dora', NULL, NULL)");
    assert_eq!(last.hkey().unwrap().to_string(), "{1,4,2,NULL}");
    // The orphan order is not part of a left join
    assert!(!shown(&rows).iter().any(|s| s.contains("40")));
}

#[test]
fn test_flatten_right_emits_orphan() {
    let f = fixture();
    populate_with_childless_customer(&f);
    let rows = flatten_rows(&f, JoinType::Right, FlattenOptions::default());
    let texts = shown(&rows);
    assert!(texts.contains(&"flatten(customer, order)(NULL, NULL, 40, 3)".to_string()));
    assert!(!texts.iter().any(|s| s.contains("dora")));
}

#[test]
fn test_flatten_full_has_both_sides() {
    let f = fixture();
    populate_with_childless_customer(&f);
    let rows = flatten_rows(&f, JoinType::Full, FlattenOptions::default());
    assert_eq!(rows.len(), 6);
    assert_eq!(
        hkeys(&rows)[4..].to_vec(),
        vec!["{1,3,2,40}".to_string(), "{1,4,2,NULL}".to_string()]
    );
}

#[test]
fn test_flatten_keep_parent_passes_parents_through() {
    let f = fixture();
    f.populate();
    let options = FlattenOptions {
        keep_parent: true,
        keep_child: false,
    };
    let rows = flatten_rows(&f, JoinType::Inner, options);
    assert_eq!(rows[0].to_string(), "customer(1, 'ann')");
    assert_eq!(rows[1].to_string(), "flatten(customer, order)(1, 'ann', 10, 1)");
}

// =============================================================================
// HKey Merge
// =============================================================================

#[test]
fn test_hkey_merge_interleaves_by_hkey() {
    let f = fixture();
    f.populate();
    let ctx = f.ctx(ExecutionConfig::default());
    let mut bindings = BindingsArena::new();

    let only = |t: &Arc<RowType>| {
        Operator::filter(Operator::group_scan(Arc::clone(&f.group)), vec![Arc::clone(t)])
    };
    let merged = Operator::hkey_merge(vec![only(&f.order), only(&f.customer)]);
    let rows = collect(&mut merged.cursor(&ctx), &mut bindings).unwrap();

    let both = Operator::filter(
        Operator::group_scan(Arc::clone(&f.group)),
        vec![Arc::clone(&f.customer), Arc::clone(&f.order)],
    );
    let expected = collect(&mut both.cursor(&ctx), &mut bindings).unwrap();
    assert_eq!(hkeys(&rows), hkeys(&expected));
    assert_eq!(rows.len(), 6);
}

#[test]
fn test_hkey_merge_of_identical_inputs_emits_each_row_once() {
    let f = fixture();
    f.populate();
    let ctx = f.ctx(ExecutionConfig::default());
    let mut bindings = BindingsArena::new();

    let single = collect(&mut Operator::group_scan(Arc::clone(&f.group)).cursor(&ctx), &mut bindings)
        .unwrap();
    let merged = Operator::hkey_merge(vec![
        Operator::group_scan(Arc::clone(&f.group)),
        Operator::group_scan(Arc::clone(&f.group)),
    ]);
    let rows = collect(&mut merged.cursor(&ctx), &mut bindings).unwrap();
    assert_eq!(hkeys(&rows), hkeys(&single));
}

#[test]
fn test_hkey_merge_overlapping_inputs_is_union() {
    let f = fixture();
    f.populate();
    let ctx = f.ctx(ExecutionConfig::default());
    let mut bindings = BindingsArena::new();

    let only = |types: &[&Arc<RowType>]| {
        Operator::filter(
            Operator::group_scan(Arc::clone(&f.group)),
            types.iter().map(|t| Arc::clone(*t)).collect(),
        )
    };
    // Orders appear in both inputs
    let merged = Operator::hkey_merge(vec![
        only(&[&f.customer, &f.order]),
        only(&[&f.order, &f.item]),
    ]);
    let rows = collect(&mut merged.cursor(&ctx), &mut bindings).unwrap();

    let single = collect(&mut Operator::group_scan(Arc::clone(&f.group)).cursor(&ctx), &mut bindings)
        .unwrap();
    assert_eq!(hkeys(&rows), hkeys(&single));
    assert_eq!(rows.len(), 7);
}

#[test]
fn test_hkey_merge_rejects_rows_without_hkey() {
    let f = fixture();
    let ctx = f.ctx(ExecutionConfig::default());
    let mut bindings = BindingsArena::new();
    let plain = Operator::values_scan(RowType::new(9, "plain", 1), vec![vec![Value::Int(1)]]);
    let err = collect(&mut Operator::hkey_merge(vec![plain]).cursor(&ctx), &mut bindings)
        .unwrap_err();
    assert_eq!(err.code(), "GQP_PLAN_INVALID");
}

// =============================================================================
// Ancestor Lookup
// =============================================================================

fn lookup_rows(f: &Fixture, plan: Operator) -> Vec<String> {
    let ctx = f.ctx(ExecutionConfig::default());
    let mut bindings = BindingsArena::new();
    shown(&collect(&mut plan.cursor(&ctx), &mut bindings).unwrap())
}

fn only(f: &Fixture, row_type: &Arc<RowType>) -> Operator {
    Operator::filter(Operator::group_scan(Arc::clone(&f.group)), vec![Arc::clone(row_type)])
}

#[test]
fn test_ancestor_lookup_item_reads_order_and_customer() {
    let f = fixture();
    f.populate();
    // Listed out of order on purpose: output is still root first
    let plan = Operator::ancestor_lookup(
        only(&f, &f.item),
        Arc::clone(&f.group),
        Arc::clone(&f.item),
        vec![Arc::clone(&f.order), Arc::clone(&f.customer)],
        true,
    );
    assert_eq!(
        lookup_rows(&f, plan),
        vec!["customer(1, 'ann')", "order(10, 1)", "item(100, 10)"]
    );
}

#[test]
fn test_ancestor_lookup_skips_missing_parent() {
    let f = fixture();
    f.populate();
    let plan = Operator::ancestor_lookup(
        only(&f, &f.order),
        Arc::clone(&f.group),
        Arc::clone(&f.order),
        vec![Arc::clone(&f.customer)],
        true,
    );
    assert_eq!(
        lookup_rows(&f, plan),
        vec![
            "customer(1, 'ann')",
            "order(10, 1)",
            "customer(1, 'ann')",
            "order(20, 1)",
            "customer(2, 'bob')",
            "order(30, 2)",
            "order(40, 3)",
        ]
    );
}

#[test]
fn test_ancestor_lookup_rows_carry_their_hkey() {
    let f = fixture();
    f.populate();
    let ctx = f.ctx(ExecutionConfig::default());
    let mut bindings = BindingsArena::new();
    let plan = Operator::ancestor_lookup(
        only(&f, &f.item),
        Arc::clone(&f.group),
        Arc::clone(&f.item),
        vec![Arc::clone(&f.customer), Arc::clone(&f.order)],
        false,
    );
    let rows = collect(&mut plan.cursor(&ctx), &mut bindings).unwrap();
    assert_eq!(hkeys(&rows), vec!["{1,1}", "{1,1,2,10}"]);
}

#[test]
fn test_ancestor_lookup_other_types_follow_keep_input() {
    let f = fixture();
    f.populate();
    let plan = |keep_input: bool| {
        Operator::ancestor_lookup(
            Operator::filter(
                Operator::group_scan(Arc::clone(&f.group)),
                vec![Arc::clone(&f.customer), Arc::clone(&f.item)],
            ),
            Arc::clone(&f.group),
            Arc::clone(&f.item),
            vec![Arc::clone(&f.order)],
            keep_input,
        )
    };
    assert_eq!(
        lookup_rows(&f, plan(true)),
        vec![
            "customer(1, 'ann')",
            "order(10, 1)",
            "item(100, 10)",
            "customer(2, 'bob')",
        ]
    );
    assert_eq!(lookup_rows(&f, plan(false)), vec!["order(10, 1)"]);
}

#[test]
fn test_ancestor_lookup_after_merge() {
    let f = fixture();
    f.populate();
    let merged = Operator::hkey_merge(vec![only(&f, &f.item), only(&f, &f.item)]);
    let plan = Operator::ancestor_lookup(
        merged,
        Arc::clone(&f.group),
        Arc::clone(&f.item),
        vec![Arc::clone(&f.customer)],
        true,
    );
    assert_eq!(
        plan.describe(),
        "AncestorLookup(item in coi -> customer, keep input)\n  HKeyMerge(2 inputs)\n    Filter(item)\n      GroupScan(coi)\n    Filter(item)\n      GroupScan(coi)\n"
    );
    assert_eq!(lookup_rows(&f, plan), vec!["customer(1, 'ann')", "item(100, 10)"]);
}

#[test]
fn test_ancestor_lookup_rejects_non_ancestor() {
    let f = fixture();
    let ctx = f.ctx(ExecutionConfig::default());
    let mut bindings = BindingsArena::new();
    let plan = Operator::ancestor_lookup(
        only(&f, &f.order),
        Arc::clone(&f.group),
        Arc::clone(&f.order),
        vec![Arc::clone(&f.item)],
        true,
    );
    let err = collect(&mut plan.cursor(&ctx), &mut bindings).unwrap_err();
    assert_eq!(err.code(), "GQP_PLAN_INVALID");
}

#[test]
fn test_ancestor_lookup_needs_hkey() {
    let f = fixture();
    let ctx = f.ctx(ExecutionConfig::default());
    let mut bindings = BindingsArena::new();
    let plain = Operator::values_scan(Arc::clone(&f.order), vec![vec![Value::Int(1), Value::Int(1)]]);
    let plan = Operator::ancestor_lookup(
        plain,
        Arc::clone(&f.group),
        Arc::clone(&f.order),
        vec![Arc::clone(&f.customer)],
        true,
    );
    let err = collect(&mut plan.cursor(&ctx), &mut bindings).unwrap_err();
    assert_eq!(err.code(), "GQP_PLAN_INVALID");
}
