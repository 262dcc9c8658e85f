//! The executor side of the custom scan.
//!
//! `begin` compiles the plan's clauses, runs the selection once and opens a cursor. Each `exec`
//! advances the cursor by one record and materializes it. `end` releases the cursor and the selected
//! set; it may run any number of times, including after a `begin` that failed halfway.

use crate::catalog::Oid;
use crate::error::{ScanError, ScanResult};
use crate::lookup::sources_table;
use crate::materialize::{Materializer, Row};
use crate::node::{CustomExecMethods, EState, ExplainState};
use crate::path::CustomScanPlan;
use crate::search::ConditionCompiler;
use crate::SCAN_NAME;
use lexql::ast::Predicate;
use lexscan_engine::{Id, Order, SetOperation, Table, TableCursor, TableSelector};
use tracing::debug;

enum ScanCursor {
    /// Every record of the sources table
    Unfiltered { cursor: TableCursor },
    /// The records the search selected; the cursor reads `selected`, which the scan owns
    Filtered { cursor: TableCursor, selected: Table },
}

impl ScanCursor {
    fn next_id(&mut self) -> Option<Id> {
        match self {
            ScanCursor::Unfiltered { cursor } | ScanCursor::Filtered { cursor, .. } => cursor.next(),
        }
    }
}

enum Phase {
    Initial,
    Iterating { cursor: ScanCursor, materializer: Materializer },
    Exhausted,
    Ended,
}

pub struct LexScanState {
    relid: Oid,
    index: Oid,
    scan_columns: Vec<String>,
    qual: Vec<Predicate>,
    phase: Phase,
}

impl LexScanState {
    pub fn new(plan: &CustomScanPlan) -> Self {
        Self {
            relid: plan.relid,
            index: plan.index,
            scan_columns: plan.scan_columns.clone(),
            qual: plan.qual.clone(),
            phase: Phase::Initial,
        }
    }

    /// Whether the running scan reads a selected set rather than the whole sources table
    pub fn is_filtered(&self) -> bool { matches!(self.phase, Phase::Iterating { cursor: ScanCursor::Filtered { .. }, .. }) }

    pub fn begin(&mut self, estate: &EState) -> ScanResult<()> {
        self.end();
        self.phase = Phase::Initial;

        let relid = self.relid;
        let relation = estate.catalog.relation(relid).ok_or_else(|| ScanError::NotFound(format!("[scan][begin] relation {relid}")))?;
        let index = estate.catalog.index(self.index).ok_or_else(|| ScanError::NotFound(format!("[scan][begin] index {}", self.index)))?;
        let sources = sources_table(estate.ctx, index)?;
        if sources.is_empty() {
            debug!("[scan][begin] {}: no records", index.name);
            self.phase = Phase::Exhausted;
            return Ok(());
        }

        let encoding = estate.config.database_encoding;
        let materializer = Materializer::new(relation, &sources, &self.scan_columns, encoding)?;
        let compiler = ConditionCompiler::new(estate.ctx, estate.catalog, relation, index, &sources, encoding, &estate.params);
        let data = compiler.compile(&self.qual)?;

        let cursor = if data.is_empty_condition {
            ScanCursor::Unfiltered { cursor: TableCursor::open(&sources, Order::Ascending)? }
        } else {
            let selected = estate.ctx.create_result_table(&sources)?;
            TableSelector::open(&sources, &data.expression, SetOperation::Or)?.select(&selected)?;
            debug!("[scan][begin] {}: selected {} of {} records", index.name, selected.size(), sources.size());
            ScanCursor::Filtered { cursor: TableCursor::open(&selected, Order::Ascending)?, selected }
        };
        self.phase = Phase::Iterating { cursor, materializer };
        Ok(())
    }

    /// The next matching row, or `None` once the scan is exhausted
    pub fn exec(&mut self) -> ScanResult<Option<Row>> {
        if let Phase::Iterating { cursor, materializer } = &mut self.phase {
            if let Some(id) = cursor.next_id() {
                return materializer.materialize(id).map(Some);
            }
            self.phase = Phase::Exhausted;
        }
        Ok(None)
    }

    pub fn end(&mut self) {
        if let Phase::Iterating { cursor, .. } = std::mem::replace(&mut self.phase, Phase::Ended) {
            if let ScanCursor::Filtered { selected, .. } = cursor {
                debug!("[scan][end] dropping {} selected records", selected.size());
            }
        }
    }

    pub fn rescan(&mut self, estate: &EState) -> ScanResult<()> {
        self.end();
        self.begin(estate)
    }
}

impl CustomExecMethods for LexScanState {
    fn begin(&mut self, estate: &EState) -> ScanResult<()> { LexScanState::begin(self, estate) }

    fn exec(&mut self) -> ScanResult<Option<Row>> { LexScanState::exec(self) }

    fn end(&mut self) { LexScanState::end(self) }

    fn rescan(&mut self, estate: &EState) -> ScanResult<()> { LexScanState::rescan(self, estate) }

    fn explain(&self, es: &mut ExplainState) {
        let mode = match &self.phase {
            Phase::Iterating { cursor: ScanCursor::Filtered { .. }, .. } => "filtered",
            Phase::Iterating { cursor: ScanCursor::Unfiltered { .. }, .. } => "unfiltered",
            Phase::Initial => "not started",
            Phase::Exhausted => "exhausted",
            Phase::Ended => "ended",
        };
        es.property(SCAN_NAME, mode);
    }

    fn is_filtered(&self) -> bool { LexScanState::is_filtered(self) }
}

impl Drop for LexScanState {
    fn drop(&mut self) { self.end() }
}
