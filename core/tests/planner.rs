mod common;
use common::*;

use lexscan_core::catalog::{RelKind, Relation};
use lexscan_core::path::{pathlist_hook, Path, PlannerInfo, RangeTableEntry, RelOptInfo, RestrictInfo};
use lexscan_core::{choose_index, finalize, initialize, Catalog, Hooks, ScanConfig, ScanError, ScanNode, SCAN_NAME};
use std::cell::Cell;
use std::rc::Rc;

fn offered(hooks: &Hooks, catalog: &dyn Catalog, config: &ScanConfig, relid: u32) -> usize {
    let root = PlannerInfo { catalog, config };
    let mut rel = RelOptInfo::new(relid, vec!["id".into()], vec![]);
    hooks.set_rel_pathlist(&root, &mut rel, &RangeTableEntry { relid, inh: false });
    rel.custom_paths().count()
}

#[test]
fn test_path_is_offered_only_when_enabled() {
    let catalog = catalog();
    let mut hooks = Hooks::new();
    initialize(&mut hooks);

    let mut config = ScanConfig::default();
    assert_eq!(offered(&hooks, &catalog, &config, MEMOS), 0);
    config.enable();
    assert_eq!(offered(&hooks, &catalog, &config, MEMOS), 1);
}

#[test]
fn test_only_plain_tables_are_scanned() {
    let mut catalog = catalog();
    let mut parent = memos_relation();
    parent.oid = 20000;
    parent.name = "memos_partitioned".into();
    parent.kind = RelKind::PartitionedTable;
    catalog.add_relation(parent);
    catalog.add_index(lexscan_index(20001, "memos_partitioned_index", 20002, 20000));

    catalog.add_relation(Relation::new(20010, "memo_titles", RelKind::View, OWNER, vec![]));

    let mut hooks = Hooks::new();
    initialize(&mut hooks);
    let config = ScanConfig::enabled();
    assert_eq!(offered(&hooks, &catalog, &config, 20000), 0);
    assert_eq!(offered(&hooks, &catalog, &config, 20010), 0);
    assert_eq!(offered(&hooks, &catalog, &config, 99999), 0);
}

#[test]
fn test_tables_without_a_lexscan_index() {
    let mut catalog = catalog();
    catalog.add_relation(Relation::new(30000, "plain", RelKind::Relation, OWNER, vec![]));
    let mut btree = lexscan_index(30001, "plain_btree", 30002, 30000);
    btree.access_method = "btree".into();
    catalog.add_index(btree);

    let mut hooks = Hooks::new();
    initialize(&mut hooks);
    assert_eq!(offered(&hooks, &catalog, &ScanConfig::enabled(), 30000), 0);
}

#[test]
fn test_first_lexscan_index_is_chosen() {
    let mut catalog = catalog();
    catalog.add_index(lexscan_index(16395, "memos_second_index", 16396, MEMOS));
    let relation = catalog.relation(MEMOS).unwrap();
    assert_eq!(choose_index(&catalog, relation).map(|index| index.oid), Some(MEMOS_INDEX));

    let mut hooks = Hooks::new();
    initialize(&mut hooks);
    let config = ScanConfig::enabled();
    let root = PlannerInfo { catalog: &catalog, config: &config };
    let mut rel = RelOptInfo::new(MEMOS, vec![], vec![]);
    hooks.set_rel_pathlist(&root, &mut rel, &RangeTableEntry { relid: MEMOS, inh: false });
    let indexes: Vec<_> = rel.custom_paths().map(|path| path.index).collect();
    assert_eq!(indexes, vec![MEMOS_INDEX]);
}

#[test]
fn test_hooks_chain_and_restore() {
    let catalog = catalog();
    let config = ScanConfig::enabled();
    let calls = Rc::new(Cell::new(0));
    let mut hooks = Hooks::new();
    let counter = calls.clone();
    hooks.install_set_rel_pathlist_hook(Some(pathlist_hook(move |_, _, _| counter.set(counter.get() + 1))));

    let registration = initialize(&mut hooks);
    assert_eq!(offered(&hooks, &catalog, &config, MEMOS), 1);
    assert_eq!(calls.get(), 1);

    finalize(&mut hooks, registration);
    assert_eq!(offered(&hooks, &catalog, &config, MEMOS), 0);
    assert_eq!(calls.get(), 2);
    assert!(hooks.custom_scan_methods(SCAN_NAME).is_none());
}

#[test]
fn test_plan_carries_row_level_clauses() {
    let fixture = Fixture::new();
    let mut hooks = Hooks::new();
    initialize(&mut hooks);
    let root = PlannerInfo { catalog: &fixture.catalog, config: &fixture.config };
    let mut rel = RelOptInfo::new(
        MEMOS,
        vec!["title".into()],
        vec![
            RestrictInfo::new(lexql::parse_selection("price > 3 AND content %% 'rust'").unwrap()),
            RestrictInfo { clause: lexql::parse_selection("$1 = 1").unwrap(), pseudoconstant: true },
        ],
    );
    hooks.set_rel_pathlist(&root, &mut rel, &RangeTableEntry { relid: MEMOS, inh: false });
    assert!(matches!(rel.pathlist.first(), Some(Path::SeqScan { relid: MEMOS })));

    let path = rel.custom_paths().next().unwrap();
    let plan = path.methods.plan_custom_path(&rel, path, &rel.reltarget, &rel.baserestrictinfo);
    assert_eq!(plan.relid, MEMOS);
    assert_eq!(plan.index, MEMOS_INDEX);
    assert_eq!(plan.qual.len(), 1);
    assert_eq!(plan.scan_columns, vec!["title", "price", "content"]);
    assert!(path.methods.reparameterize_by_child(&root, &path.private, &rel).is_empty());
}

#[test]
fn test_scan_node_needs_registered_methods() {
    let fixture = Fixture::new();
    let mut hooks = Hooks::new();
    let registration = initialize(&mut hooks);
    let plan = fixture.plan_with(&hooks, &["id"], &[]).unwrap();
    assert!(ScanNode::new(&hooks, plan.clone()).is_ok());

    finalize(&mut hooks, registration);
    assert!(matches!(ScanNode::new(&hooks, plan), Err(ScanError::NotFound(_))));
}

#[test]
fn test_path_needs_every_column_in_the_index() {
    let catalog = catalog();
    let config = ScanConfig::enabled();
    let mut hooks = Hooks::new();
    initialize(&mut hooks);
    let root = PlannerInfo { catalog: &catalog, config: &config };
    let offered_for = |reltarget: &[&str], clause: &str| {
        let restrictions = vec![RestrictInfo::new(lexql::parse_selection(clause).unwrap())];
        let mut rel = RelOptInfo::new(MEMOS, reltarget.iter().map(|c| c.to_string()).collect(), restrictions);
        hooks.set_rel_pathlist(&root, &mut rel, &RangeTableEntry { relid: MEMOS, inh: false });
        rel.custom_paths().count()
    };

    assert_eq!(offered_for(&["id"], "note = 'x'"), 0);
    assert_eq!(offered_for(&["note"], "price > 3"), 0);
    assert_eq!(offered_for(&["id"], "NOT (note IS NULL)"), 0);
    assert_eq!(offered_for(&["id"], "missing = 1"), 0);
    assert_eq!(offered_for(&["id", "title"], "memos.price > 3 AND content %% 'rust'"), 1);
}
