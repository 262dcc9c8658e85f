#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use lexql::{ast::Literal, parse_selection};
use lexscan_core::catalog::{Attribute, IndexRelation, OperatorFamily, RelKind, Relation};
use lexscan_core::convert::{engine_type, to_engine_value};
use lexscan_core::lookup::{lexicon_name, sources_table_name, INDEX_COLUMN_NAME};
use lexscan_core::materialize::Materializer;
use lexscan_core::node::bind_predicate;
use lexscan_core::path::{CustomScanPlan, PlannerInfo, RangeTableEntry, RelOptInfo, RestrictInfo};
use lexscan_core::{
    initialize, Catalog, Datum, EState, Hooks, MemoryCatalog, Oid, ParamList, Row, ScanConfig, ScanNode, ScanResult, TypeId, ACCESS_METHOD,
};
use lexscan_engine::{Context, Id, Normalizer, Table, TableKind, Tokenizer};
use lexql::selection::filter::evaluate_predicate;
use std::str::FromStr;
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    // if LOG_LEVEL env var is set, use it
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        tracing_subscriber::fmt().with_max_level(Level::from_str(&level).unwrap()).with_test_writer().init();
    } else {
        tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init();
    }
}

pub const OWNER: Oid = 10;
pub const MEMOS: Oid = 16384;
pub const MEMOS_INDEX: Oid = 16390;
pub const FILE_NODE: Oid = 16391;
pub const ROWS: i32 = 50;

pub const INT4_OPS: Oid = 1;
pub const VARCHAR_OPS: Oid = 2;
pub const TEXT_FULL_TEXT_SEARCH_OPS: Oid = 3;
pub const FLOAT8_OPS: Oid = 4;
pub const TIMESTAMP_OPS: Oid = 5;

pub const CONTENTS: [&str; 3] = ["Rust search engine notes", "groonga and postgres", "inverted index internals"];

pub struct Fixture {
    pub catalog: MemoryCatalog,
    pub ctx: Context,
    pub config: ScanConfig,
}

pub fn memos_relation() -> Relation {
    Relation::new(
        MEMOS,
        "memos",
        RelKind::Relation,
        OWNER,
        vec![
            Attribute::new("id", TypeId::Int4),
            Attribute::new("title", TypeId::Varchar),
            Attribute::new("content", TypeId::Text),
            Attribute::new("price", TypeId::Float8),
            Attribute::new("created_at", TypeId::Timestamp),
            Attribute::new("note", TypeId::Text),
        ],
    )
}

pub fn lexscan_index(oid: Oid, name: &str, file_node: Oid, heap: Oid) -> IndexRelation {
    IndexRelation {
        oid,
        name: name.into(),
        kind: RelKind::Index,
        owner: OWNER,
        access_method: ACCESS_METHOD.into(),
        file_node,
        heap,
        key_columns: vec![0, 1, 2, 3, 4],
        opfamilies: vec![INT4_OPS, VARCHAR_OPS, TEXT_FULL_TEXT_SEARCH_OPS, FLOAT8_OPS, TIMESTAMP_OPS],
    }
}

pub fn catalog() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();
    catalog
        .add_operator_family(OperatorFamily::new(INT4_OPS, "int4_ops").with_ordering(&[TypeId::Int4]))
        .add_operator_family(
            OperatorFamily::new(VARCHAR_OPS, "varchar_ops").with_ordering(&[TypeId::Varchar]).with_full_text_search(&[TypeId::Varchar]),
        )
        .add_operator_family(OperatorFamily::new(TEXT_FULL_TEXT_SEARCH_OPS, "text_full_text_search_ops").with_full_text_search(&[TypeId::Text]))
        .add_operator_family(OperatorFamily::new(FLOAT8_OPS, "float8_ops").with_ordering(&[TypeId::Float8]))
        .add_operator_family(OperatorFamily::new(TIMESTAMP_OPS, "timestamp_ops").with_ordering(&[TypeId::Timestamp]));
    catalog.add_relation(memos_relation());
    catalog.add_index(lexscan_index(MEMOS_INDEX, "memos_index", FILE_NODE, MEMOS));
    catalog
}

pub fn title(i: i32) -> String {
    match i {
        42 => "The answer".to_string(),
        _ => format!("memo {i:02}"),
    }
}

pub fn content(i: i32) -> &'static str { CONTENTS[(i as usize - 1) % CONTENTS.len()] }

pub fn price(i: i32) -> Option<f64> { (i % 10 != 0).then(|| i as f64 * 1.5) }

pub fn created_at(i: i32) -> NaiveDateTime {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    start + Duration::days(i as i64)
}

/// Create the sources table and lexicons of `index` and fill them with `rows` memos
pub fn build_index(ctx: &Context, catalog: &MemoryCatalog, index: &IndexRelation, rows: i32, normalizer: Normalizer) -> Table {
    let relation = catalog.relation(index.heap).unwrap();
    let sources = ctx.create_table(Some(&sources_table_name(index.file_node)), TableKind::NoKey, None).unwrap();
    let columns: Vec<_> = index
        .key_columns
        .iter()
        .map(|attribute| &relation.attributes[*attribute])
        .map(|a| sources.create_column(&a.name, engine_type(a.type_id)).unwrap())
        .collect();
    // title and content get full text search lexicons
    for key in [1, 2] {
        let lexicon = ctx.create_lexicon(&lexicon_name(index.file_node, key), Tokenizer::Bigram, normalizer).unwrap();
        lexicon.create_index_column(INDEX_COLUMN_NAME, &columns[key]).unwrap();
    }
    for i in 1..=rows {
        let id = sources.add(None).unwrap();
        let values = [
            Some(Datum::Int4(i)),
            Some(Datum::Varchar(title(i))),
            Some(Datum::Text(content(i).to_string())),
            price(i).map(Datum::Float8),
            Some(Datum::Timestamp(created_at(i))),
        ];
        for (column, value) in columns.iter().zip(values) {
            if let Some(value) = value {
                column.set_value(id, to_engine_value(&value)).unwrap();
            }
        }
    }
    sources
}

impl Fixture {
    pub fn new() -> Self { Self::with_rows(ROWS) }

    pub fn with_rows(rows: i32) -> Self { Self::build(rows, Normalizer::Auto) }

    /// The memos fixture with lexicons that normalize text with `normalizer`
    pub fn with_normalizer(normalizer: Normalizer) -> Self { Self::build(ROWS, normalizer) }

    fn build(rows: i32, normalizer: Normalizer) -> Self {
        let catalog = catalog();
        let ctx = Context::new();
        build_index(&ctx, &catalog, catalog.index(MEMOS_INDEX).unwrap(), rows, normalizer);
        Self { catalog, ctx, config: ScanConfig::enabled() }
    }

    pub fn sources(&self) -> Table { self.ctx.table(&sources_table_name(FILE_NODE)).unwrap() }

    pub fn estate(&self) -> EState<'_> { EState::new(&self.catalog, &self.ctx, &self.config) }

    /// Plan a scan of memos through the planner hook
    pub fn plan(&self, targetlist: &[&str], clauses: &[&str]) -> CustomScanPlan {
        let mut hooks = Hooks::new();
        initialize(&mut hooks);
        self.plan_with(&hooks, targetlist, clauses).expect("no custom path was offered")
    }

    pub fn plan_with(&self, hooks: &Hooks, targetlist: &[&str], clauses: &[&str]) -> Option<CustomScanPlan> {
        let root = PlannerInfo { catalog: &self.catalog, config: &self.config };
        let restrictions = clauses.iter().map(|c| RestrictInfo::new(parse_selection(c).unwrap())).collect();
        let mut rel = RelOptInfo::new(MEMOS, targetlist.iter().map(|c| c.to_string()).collect(), restrictions);
        hooks.set_rel_pathlist(&root, &mut rel, &RangeTableEntry { relid: MEMOS, inh: false });
        let path = rel.custom_paths().next()?;
        Some(path.methods.plan_custom_path(&rel, path, &rel.reltarget, &rel.baserestrictinfo))
    }

    pub fn node(&self, targetlist: &[&str], clauses: &[&str]) -> ScanNode {
        let mut hooks = Hooks::new();
        initialize(&mut hooks);
        let plan = self.plan_with(&hooks, targetlist, clauses).expect("no custom path was offered");
        ScanNode::new(&hooks, plan).unwrap()
    }

    /// Rows the scan returns for `clauses`
    pub fn scan(&self, targetlist: &[&str], clauses: &[&str], params: Vec<Literal>) -> ScanResult<Vec<Row>> {
        let estate = self.estate().with_params(params);
        self.node(targetlist, clauses).collect(&estate)
    }

    /// Ids of every record satisfying all of `clauses`, by brute force over the sources table
    pub fn reference_ids(&self, clauses: &[&str], params: &[Literal]) -> Vec<Id> {
        let relation = self.catalog.relation(MEMOS).unwrap();
        let params = ParamList::new(params.to_vec());
        let columns: Vec<String> = ["id", "title", "content", "price", "created_at"].iter().map(|c| c.to_string()).collect();
        let materializer = Materializer::new(relation, &self.sources(), &columns, self.config.database_encoding).unwrap();
        let predicates: Vec<_> = clauses.iter().map(|c| bind_predicate(relation, &parse_selection(c).unwrap(), &params).unwrap()).collect();
        self.sources()
            .ids()
            .into_iter()
            .filter(|id| {
                let row = materializer.materialize(*id).unwrap();
                predicates.iter().all(|p| evaluate_predicate(&row, p, &[]).unwrap())
            })
            .collect()
    }
}

pub fn ids(rows: &[Row]) -> Vec<Id> { rows.iter().map(|r| r.id).collect() }

pub fn memo_ids(rows: &[Row]) -> Vec<i32> {
    rows.iter()
        .map(|r| match r.get("id") {
            Some(Datum::Int4(i)) => *i,
            other => panic!("unexpected id {other:?}"),
        })
        .collect()
}
