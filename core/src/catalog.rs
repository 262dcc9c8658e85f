//! The slice of the host catalog the scan reads: relations, their indexes and operator families.

use crate::datum::TypeId;
use indexmap::IndexMap;
use lexql::ast::ComparisonOperator;

pub type Oid = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelKind {
    Relation,
    PartitionedTable,
    View,
    MaterializedView,
    ForeignTable,
    Index,
    PartitionedIndex,
}

impl RelKind {
    /// Partitioned parents hold no rows of their own
    pub fn has_partitions(&self) -> bool { matches!(self, RelKind::PartitionedTable | RelKind::PartitionedIndex) }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub type_id: TypeId,
}

impl Attribute {
    pub fn new(name: &str, type_id: TypeId) -> Self { Self { name: name.to_string(), type_id } }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub oid: Oid,
    pub name: String,
    pub kind: RelKind,
    pub owner: Oid,
    pub attributes: Vec<Attribute>,
    /// Index oids in catalog order
    pub indexes: Vec<Oid>,
}

impl Relation {
    pub fn new(oid: Oid, name: &str, kind: RelKind, owner: Oid, attributes: Vec<Attribute>) -> Self {
        Self { oid, name: name.to_string(), kind, owner, attributes, indexes: Vec::new() }
    }

    /// Position and definition of the attribute called `name`
    pub fn attribute(&self, name: &str) -> Option<(usize, &Attribute)> { self.attributes.iter().enumerate().find(|(_, a)| a.name == name) }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexRelation {
    pub oid: Oid,
    pub name: String,
    pub kind: RelKind,
    pub owner: Oid,
    pub access_method: String,
    /// Storage identifier; names the engine objects backing the index
    pub file_node: Oid,
    /// The indexed relation
    pub heap: Oid,
    /// Heap attribute position of each index key
    pub key_columns: Vec<usize>,
    /// Operator family of each index key
    pub opfamilies: Vec<Oid>,
}

impl IndexRelation {
    /// Index key position covering heap attribute `attribute`
    pub fn key_position(&self, attribute: usize) -> Option<usize> { self.key_columns.iter().position(|a| *a == attribute) }
}

/// Strategy numbers of the lexscan operator classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Strategy {
    Less = 1,
    LessEqual = 2,
    Equal = 3,
    GreaterEqual = 4,
    Greater = 5,
    NotEqual = 6,
    Contain = 7,
    Query = 8,
}

impl Strategy {
    pub fn number(&self) -> u16 { *self as u16 }

    pub fn from_number(number: u16) -> Option<Self> {
        Some(match number {
            1 => Strategy::Less,
            2 => Strategy::LessEqual,
            3 => Strategy::Equal,
            4 => Strategy::GreaterEqual,
            5 => Strategy::Greater,
            6 => Strategy::NotEqual,
            7 => Strategy::Contain,
            8 => Strategy::Query,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatorMember {
    pub operator: ComparisonOperator,
    pub left: TypeId,
    pub right: TypeId,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatorFamily {
    pub oid: Oid,
    pub name: String,
    pub members: Vec<OperatorMember>,
}

impl OperatorFamily {
    pub fn new(oid: Oid, name: &str) -> Self { Self { oid, name: name.to_string(), members: Vec::new() } }

    pub fn with_member(mut self, operator: ComparisonOperator, left: TypeId, right: TypeId, strategy: Strategy) -> Self {
        self.members.push(OperatorMember { operator, left, right, strategy });
        self
    }

    /// `<`, `<=`, `=`, `>=`, `>` and `<>` between values of each of `types`
    pub fn with_ordering(self, types: &[TypeId]) -> Self {
        use ComparisonOperator::*;
        let ops = [
            (LessThan, Strategy::Less),
            (LessThanOrEqual, Strategy::LessEqual),
            (Equal, Strategy::Equal),
            (GreaterThanOrEqual, Strategy::GreaterEqual),
            (GreaterThan, Strategy::Greater),
            (NotEqual, Strategy::NotEqual),
        ];
        types.iter().fold(self, |family, ty| ops.iter().fold(family, |family, (op, strategy)| family.with_member(*op, *ty, *ty, *strategy)))
    }

    /// `%%` and `@@` over each of `types`
    pub fn with_full_text_search(self, types: &[TypeId]) -> Self {
        types.iter().fold(self, |family, ty| {
            family
                .with_member(ComparisonOperator::Contains, *ty, *ty, Strategy::Contain)
                .with_member(ComparisonOperator::Matches, *ty, *ty, Strategy::Query)
        })
    }

    pub fn strategy(&self, operator: ComparisonOperator, left: TypeId, right: TypeId) -> Option<Strategy> {
        self.members.iter().find(|m| m.operator == operator && m.left == left && m.right == right).map(|m| m.strategy)
    }
}

pub trait Catalog {
    fn relation(&self, oid: Oid) -> Option<&Relation>;
    fn index(&self, oid: Oid) -> Option<&IndexRelation>;
    fn operator_family(&self, oid: Oid) -> Option<&OperatorFamily>;

    /// Every index in the database, in catalog order
    fn indexes(&self) -> Vec<&IndexRelation>;

    /// Indexes of `relation`, in catalog order
    fn index_list(&self, relation: &Relation) -> Vec<&IndexRelation> { relation.indexes.iter().filter_map(|oid| self.index(*oid)).collect() }

    /// Strategy of `operator` in `opfamily` for the given operand types, if it is a member
    fn op_strategy(&self, opfamily: Oid, operator: ComparisonOperator, left: TypeId, right: TypeId) -> Option<Strategy> {
        self.operator_family(opfamily)?.strategy(operator, left, right)
    }
}

/// A catalog held in memory, for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    relations: IndexMap<Oid, Relation>,
    indexes: IndexMap<Oid, IndexRelation>,
    families: IndexMap<Oid, OperatorFamily>,
}

impl MemoryCatalog {
    pub fn new() -> Self { Self::default() }

    pub fn add_relation(&mut self, relation: Relation) -> &mut Self {
        self.relations.insert(relation.oid, relation);
        self
    }

    /// Register an index and append it to its heap relation's index list
    pub fn add_index(&mut self, index: IndexRelation) -> &mut Self {
        if let Some(heap) = self.relations.get_mut(&index.heap) {
            if !heap.indexes.contains(&index.oid) {
                heap.indexes.push(index.oid);
            }
        }
        self.indexes.insert(index.oid, index);
        self
    }

    pub fn add_operator_family(&mut self, family: OperatorFamily) -> &mut Self {
        self.families.insert(family.oid, family);
        self
    }
}

impl Catalog for MemoryCatalog {
    fn relation(&self, oid: Oid) -> Option<&Relation> { self.relations.get(&oid) }
    fn index(&self, oid: Oid) -> Option<&IndexRelation> { self.indexes.get(&oid) }
    fn operator_family(&self, oid: Oid) -> Option<&OperatorFamily> { self.families.get(&oid) }
    fn indexes(&self) -> Vec<&IndexRelation> { self.indexes.values().collect() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_numbers() {
        assert_eq!(Strategy::Contain.number(), 7);
        assert_eq!(Strategy::from_number(8), Some(Strategy::Query));
        assert_eq!(Strategy::from_number(9), None);
    }

    #[test]
    fn test_operator_family_membership() {
        let family = OperatorFamily::new(1, "lexscan_text_ops").with_ordering(&[TypeId::Text]).with_full_text_search(&[TypeId::Text]);
        assert_eq!(family.strategy(ComparisonOperator::Equal, TypeId::Text, TypeId::Text), Some(Strategy::Equal));
        assert_eq!(family.strategy(ComparisonOperator::Matches, TypeId::Text, TypeId::Text), Some(Strategy::Query));
        assert_eq!(family.strategy(ComparisonOperator::Equal, TypeId::Int4, TypeId::Int4), None);
        assert_eq!(family.members.len(), 8);
    }

    #[test]
    fn test_memory_catalog_keeps_index_order() {
        let mut catalog = MemoryCatalog::new();
        catalog.add_relation(Relation::new(10, "memos", RelKind::Relation, 1, vec![Attribute::new("title", TypeId::Text)]));
        for oid in [12, 11] {
            catalog.add_index(IndexRelation {
                oid,
                name: format!("memos_{oid}"),
                kind: RelKind::Index,
                owner: 1,
                access_method: "btree".into(),
                file_node: oid + 100,
                heap: 10,
                key_columns: vec![0],
                opfamilies: vec![1],
            });
        }
        let relation = catalog.relation(10).unwrap();
        let order: Vec<Oid> = catalog.index_list(relation).iter().map(|i| i.oid).collect();
        assert_eq!(order, vec![12, 11]);
        assert_eq!(relation.attribute("title").map(|(pos, _)| pos), Some(0));
        assert_eq!(catalog.index(12).unwrap().key_position(0), Some(0));
    }
}
