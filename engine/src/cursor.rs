use crate::error::Result;
use crate::table::Table;
use crate::Id;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Ascending,
    Descending,
}

/// Iterates the record ids a table held when the cursor was opened
#[derive(Debug)]
pub enum TableCursor {
    Ascending(std::vec::IntoIter<Id>),
    Descending(std::iter::Rev<std::vec::IntoIter<Id>>),
}

impl TableCursor {
    pub fn open(table: &Table, order: Order) -> Result<Self> {
        let ids = table.ids();
        trace!("[table-cursor] open over {} records ({order:?})", ids.len());
        Ok(match order {
            Order::Ascending => TableCursor::Ascending(ids.into_iter()),
            Order::Descending => TableCursor::Descending(ids.into_iter().rev()),
        })
    }
}

impl Iterator for TableCursor {
    type Item = Id;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            TableCursor::Ascending(iter) => iter.next(),
            TableCursor::Descending(iter) => iter.next(),
        }
    }
}
