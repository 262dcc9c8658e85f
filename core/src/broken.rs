use crate::catalog::{Catalog, IndexRelation, Oid};
use crate::error::{ErrorLevel, ScanResult};
use crate::lookup::{lookup_lexicon, lookup_sources_table};
use crate::ACCESS_METHOD;
use lexscan_engine::{Context, Lexicon, Table};
use tracing::{debug, warn};

fn is_broken_table(table: &Table) -> bool { table.status().is_broken() || table.columns().iter().any(|column| column.status().is_broken()) }

fn is_broken_lexicon(lexicon: &Lexicon) -> bool {
    lexicon.status().is_broken() || lexicon.index_columns().iter().any(|column| column.status().is_broken())
}

fn is_broken(ctx: &Context, index: &IndexRelation) -> ScanResult<bool> {
    let Some(sources) = lookup_sources_table(ctx, index, ErrorLevel::Silent)? else {
        warn!("[broken-indexes] {}: sources table is missing", index.name);
        return Ok(true);
    };
    if is_broken_table(&sources) {
        return Ok(true);
    }
    // attributes without full text search have no lexicon
    for key in 0..index.key_columns.len() {
        if let Some(lexicon) = lookup_lexicon(ctx, index, key, ErrorLevel::Silent)? {
            if is_broken_lexicon(&lexicon) {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

/// Names of the lexscan indexes owned by `user` whose engine objects are missing, locked or corrupt
pub fn list_broken_indexes(catalog: &dyn Catalog, ctx: &Context, user: Oid) -> ScanResult<Vec<String>> {
    let mut broken = Vec::new();
    for index in catalog.indexes() {
        if index.owner != user || index.access_method != ACCESS_METHOD || index.kind.has_partitions() {
            continue;
        }
        if is_broken(ctx, index)? {
            broken.push(index.name.clone());
        }
    }
    debug!("[broken-indexes] {} broken indexes owned by {user}", broken.len());
    Ok(broken)
}
