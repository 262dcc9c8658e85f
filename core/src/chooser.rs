use crate::catalog::{Catalog, IndexRelation, Relation};
use crate::ACCESS_METHOD;
use tracing::debug;

/// The lexscan index a scan of `relation` reads: the first one in catalog order.
///
/// Further lexscan indexes on the same relation are never considered, even when one of them covers
/// more of the query's columns.
pub fn choose_index<'a>(catalog: &'a dyn Catalog, relation: &Relation) -> Option<&'a IndexRelation> {
    let chosen = catalog.index_list(relation).into_iter().find(|index| index.access_method == ACCESS_METHOD);
    match chosen {
        Some(index) => debug!("[chooser] {}: using index {} ({})", relation.name, index.name, index.oid),
        None => debug!("[chooser] {}: no {ACCESS_METHOD} index", relation.name),
    }
    chosen
}
