mod common;
use common::*;

use lexql::ast::Literal;
use lexscan_core::{initialize, Datum, Hooks, LexScanState, ScanError};
use lexscan_engine::ReturnCode;

#[test]
fn test_full_text_contains_finds_one_memo() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let rows = fixture.scan(&["id", "title"], &["title %% 'answer'"], vec![])?;
    assert_eq!(memo_ids(&rows), vec![42]);
    assert_eq!(rows[0].get("title"), Some(&Datum::Varchar("The answer".into())));
    Ok(())
}

#[test]
fn test_range_condition() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let rows = fixture.scan(&["id"], &["price >= 60"], vec![])?;
    assert_eq!(memo_ids(&rows), vec![41, 42, 43, 44, 45, 46, 47, 48, 49]);
    Ok(())
}

#[test]
fn test_no_condition_reads_every_record_in_order() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let mut node = fixture.node(&["id"], &[]);
    node.begin(&fixture.estate())?;
    assert!(!node.is_filtered());

    let mut seen = Vec::new();
    while let Some(row) = node.next()? {
        seen.push(row.id);
    }
    assert_eq!(seen, (1..=ROWS as u32).collect::<Vec<_>>());
    assert!(node.next()?.is_none());
    node.end();
    Ok(())
}

#[test]
fn test_empty_sources_table() -> anyhow::Result<()> {
    let fixture = Fixture::with_rows(0);
    assert!(fixture.scan(&["id"], &["title %% 'answer'"], vec![])?.is_empty());
    assert!(fixture.scan(&["id"], &[], vec![])?.is_empty());
    Ok(())
}

#[test]
fn test_contains_is_case_insensitive() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let rows = fixture.scan(&["id"], &["content %% 'GROONGA'"], vec![])?;
    assert_eq!(memo_ids(&rows), (2..=ROWS).step_by(3).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn test_query_syntax() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let rows = fixture.scan(&["id"], &["content @@ 'rust OR internals'"], vec![])?;
    assert_eq!(rows.len(), 33);
    assert!(memo_ids(&rows).iter().all(|i| (i - 1) % 3 != 1));

    assert!(fixture.scan(&["id"], &["content @@ 'index -inverted'"], vec![])?.is_empty());
    Ok(())
}

#[test]
fn test_malformed_query_fails_the_scan() {
    let fixture = Fixture::new();
    let err = fixture.scan(&["id"], &["content @@ '('"], vec![]).unwrap_err();
    assert!(matches!(err, ScanError::Engine(e) if e.rc == ReturnCode::SyntaxError));
}

#[test]
fn test_timestamps() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let rows = fixture.scan(&["id", "created_at"], &["created_at < '2024-01-05'"], vec![])?;
    assert_eq!(memo_ids(&rows), vec![1, 2, 3]);
    assert_eq!(rows[0].get("created_at"), Some(&Datum::Timestamp(created_at(1))));
    Ok(())
}

#[test]
fn test_separate_clauses_all_apply() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let mut node = fixture.node(&["id"], &["content %% 'groonga'", "price < 20"]);
    node.begin(&fixture.estate())?;
    assert!(node.is_filtered());
    let mut found = Vec::new();
    while let Some(row) = node.next()? {
        found.push(row);
    }
    assert_eq!(memo_ids(&found), vec![2, 5, 8, 11]);
    Ok(())
}

#[test]
fn test_untranslatable_clause_is_rechecked() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let mut node = fixture.node(&["id"], &["id = 2.5"]);
    node.begin(&fixture.estate())?;
    assert!(!node.is_filtered());
    assert!(node.next()?.is_none());

    let rows = fixture.scan(&["id"], &["NOT price > 3 AND id < 4"], vec![])?;
    assert_eq!(memo_ids(&rows), vec![1, 2]);
    Ok(())
}

#[test]
fn test_rows_are_projected_onto_the_target_list() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let rows = fixture.scan(&["title"], &["price > 70"], vec![])?;
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row.values.len() == 1 && row.has_column("title") && !row.has_column("price")));
    Ok(())
}

#[test]
fn test_unindexed_columns_stay_with_the_host() {
    let fixture = Fixture::new();
    let mut hooks = Hooks::new();
    initialize(&mut hooks);
    assert!(fixture.plan_with(&hooks, &["id"], &["note = 'x'"]).is_none());
    assert!(fixture.plan_with(&hooks, &["id", "note"], &[]).is_none());
    assert!(fixture.plan_with(&hooks, &["id"], &["title %% 'answer' OR note = 'x'"]).is_none());

    // a plan that needs the column anyway cannot start
    let mut plan = fixture.plan(&["id"], &[]);
    plan.scan_columns.push("note".into());
    let mut state = LexScanState::new(&plan);
    assert!(matches!(state.begin(&fixture.estate()), Err(ScanError::NotFound(_))));
}

#[test]
fn test_params_and_rescan() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let mut node = fixture.node(&["id"], &["price >= $1"]);

    node.begin(&fixture.estate().with_params(vec![Literal::Integer(60)]))?;
    let mut first = Vec::new();
    while let Some(row) = node.next()? {
        first.push(row);
    }
    assert_eq!(first.len(), 9);

    // rescan halfway through a scan
    node.rescan(&fixture.estate().with_params(vec![Literal::Integer(30)]))?;
    assert!(node.next()?.is_some());
    node.rescan(&fixture.estate().with_params(vec![Literal::Float(70.0)]))?;
    let mut second = Vec::new();
    while let Some(row) = node.next()? {
        second.push(row);
    }
    assert_eq!(memo_ids(&second), vec![47, 48, 49]);
    node.end();

    let err = fixture.scan(&["id"], &["price >= $1"], vec![]).unwrap_err();
    assert!(matches!(err, ScanError::InvalidArgument(_)));
    Ok(())
}

#[test]
fn test_end_is_idempotent() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let mut node = fixture.node(&["id"], &["title %% 'memo'"]);
    node.end();
    node.begin(&fixture.estate())?;
    assert!(node.next()?.is_some());
    node.end();
    node.end();
    assert!(node.next()?.is_none());
    Ok(())
}

#[test]
fn test_end_after_failed_begin() {
    let fixture = Fixture::new();
    let plan = fixture.plan(&["id"], &["created_at > 'not a time'"]);
    let mut state = LexScanState::new(&plan);
    let err = state.begin(&fixture.estate()).unwrap_err();
    assert!(matches!(err, ScanError::InvalidArgument(_)));
    state.end();
    state.end();
    assert!(state.exec().unwrap().is_none());

    let mut node = fixture.node(&["id"], &["created_at > 'not a time'"]);
    assert!(node.begin(&fixture.estate()).is_err());
    node.end();
    node.end();
}

#[test]
fn test_explain() -> anyhow::Result<()> {
    let fixture = Fixture::new();
    let mut node = fixture.node(&["id"], &["title %% 'answer'"]);
    assert!(node.explain().starts_with("LexScan"));
    node.begin(&fixture.estate())?;
    assert_eq!(node.explain(), "LexScan: filtered");
    node.end();
    assert_eq!(node.explain(), "LexScan: ended");
    Ok(())
}
