use cdc_config::shared::TableConfig;
use std::collections::{HashMap, HashSet};

use crate::types::{ChangeItem, TableName};

/// Column allow-lists applied by the worker before batching.
///
/// Row predicates are delegated to the storage provider; column filtering happens here
/// so that it holds uniformly for every provider. Tables without an allow-list pass
/// through untouched.
#[derive(Debug, Clone, Default)]
pub struct ColumnFilters {
    allowed: HashMap<TableName, HashSet<String>>,
}

impl ColumnFilters {
    /// Builds the filters from the transfer's table configuration.
    pub fn from_tables(tables: &[TableConfig]) -> Self {
        let allowed = tables
            .iter()
            .filter_map(|table| {
                let columns = table.columns.as_ref()?;
                let name = TableName::new(table.schema.clone(), table.name.clone());

                Some((name, columns.iter().cloned().collect()))
            })
            .collect();

        Self { allowed }
    }

    /// Strips columns not present in the table's allow-list from the item.
    ///
    /// Both the current and the previous row image are filtered. Control markers carry
    /// no columns and are left untouched.
    pub fn apply(&self, item: &mut ChangeItem) {
        let Some(allowed) = self.allowed.get(&item.table) else {
            return;
        };

        item.columns.retain(|column| allowed.contains(&column.name));
        if let Some(old_columns) = &mut item.old_columns {
            old_columns.retain(|column| allowed.contains(&column.name));
        }
    }
}
