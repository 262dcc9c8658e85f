//! Resolves the engine objects backing an index: one sources table per index, holding a column per
//! indexed attribute, and one lexicon per attribute, holding the `index` column over that attribute.

use crate::catalog::IndexRelation;
use crate::column_name;
use crate::config::DatabaseEncoding;
use crate::error::{ErrorLevel, ScanError, ScanResult};
use lexscan_engine::{Column, Context, IndexColumn, Lexicon, Table};

pub const INDEX_COLUMN_NAME: &str = "index";

pub fn sources_table_name(file_node: u32) -> String { format!("Sources{file_node}") }

pub fn lexicon_name(file_node: u32, attribute: usize) -> String { format!("Lexicon{file_node}_{attribute}") }

pub fn lookup_sources_table(ctx: &Context, index: &IndexRelation, level: ErrorLevel) -> ScanResult<Option<Table>> {
    let name = sources_table_name(index.file_node);
    match ctx.table(&name) {
        Some(table) => Ok(Some(table)),
        None => level.miss(|| format!("[lookup][sources] {name} of index {} does not exist", index.name)),
    }
}

/// The sources table of `index`, which must exist
pub fn sources_table(ctx: &Context, index: &IndexRelation) -> ScanResult<Table> {
    let name = sources_table_name(index.file_node);
    ctx.table(&name).ok_or_else(|| ScanError::NotFound(format!("[lookup][sources] {name} of index {} does not exist", index.name)))
}

/// Column of `table` storing the relational column `name`
pub fn lookup_column(table: &Table, name: &str, encoding: DatabaseEncoding, level: ErrorLevel) -> ScanResult<Option<Column>> {
    let encoded = column_name::encode(name, encoding)?;
    match table.column(&encoded) {
        Some(column) => Ok(Some(column)),
        None => level.miss(|| format!("[lookup][column] {}.{encoded} does not exist", table.name().unwrap_or("(anonymous)"))),
    }
}

pub fn lookup_lexicon(ctx: &Context, index: &IndexRelation, attribute: usize, level: ErrorLevel) -> ScanResult<Option<Lexicon>> {
    let name = lexicon_name(index.file_node, attribute);
    match ctx.lexicon(&name) {
        Some(lexicon) => Ok(Some(lexicon)),
        None => level.miss(|| format!("[lookup][lexicon] {name} of index {} does not exist", index.name)),
    }
}

pub fn lookup_index_column(ctx: &Context, index: &IndexRelation, attribute: usize, level: ErrorLevel) -> ScanResult<Option<IndexColumn>> {
    let Some(lexicon) = lookup_lexicon(ctx, index, attribute, level)? else {
        return Ok(None);
    };
    match lexicon.index_column(INDEX_COLUMN_NAME) {
        Some(column) => Ok(Some(column)),
        None => level.miss(|| format!("[lookup][index-column] {}.{INDEX_COLUMN_NAME} does not exist", lexicon.name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RelKind;
    use lexscan_engine::{DataType, Normalizer, TableKind, Tokenizer};

    fn index() -> IndexRelation {
        IndexRelation {
            oid: 20,
            name: "memos_title".into(),
            kind: RelKind::Index,
            owner: 1,
            access_method: crate::ACCESS_METHOD.into(),
            file_node: 16400,
            heap: 10,
            key_columns: vec![0],
            opfamilies: vec![1],
        }
    }

    #[test]
    fn test_names() {
        assert_eq!(sources_table_name(16400), "Sources16400");
        assert_eq!(lexicon_name(16400, 2), "Lexicon16400_2");
    }

    #[test]
    fn test_lookups_honor_error_level() -> anyhow::Result<()> {
        let ctx = Context::new();
        let index = index();
        assert!(lookup_sources_table(&ctx, &index, ErrorLevel::Silent)?.is_none());
        assert!(matches!(sources_table(&ctx, &index), Err(ScanError::NotFound(_))));
        assert!(matches!(lookup_lexicon(&ctx, &index, 0, ErrorLevel::Error), Err(ScanError::NotFound(_))));

        let sources = ctx.create_table(Some("Sources16400"), TableKind::NoKey, None)?;
        let title = sources.create_column("@0005ftitle", DataType::ShortText)?;
        let lexicon = ctx.create_lexicon("Lexicon16400_0", Tokenizer::Bigram, Normalizer::Auto)?;
        assert!(lookup_index_column(&ctx, &index, 0, ErrorLevel::Silent)?.is_none());
        lexicon.create_index_column(INDEX_COLUMN_NAME, &title)?;

        assert_eq!(sources_table(&ctx, &index)?, sources);
        assert_eq!(lookup_column(&sources, "_title", DatabaseEncoding::Utf8, ErrorLevel::Error)?, Some(title));
        assert!(lookup_column(&sources, "body", DatabaseEncoding::Utf8, ErrorLevel::Silent)?.is_none());
        assert!(lookup_index_column(&ctx, &index, 0, ErrorLevel::Error)?.is_some());
        Ok(())
    }
}
