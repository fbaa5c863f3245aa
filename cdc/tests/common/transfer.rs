use cdc::types::{ColumnValue, TableName, Value};
use cdc_config::shared::{
    BadRecordPolicy, BatchConfig, DestinationConfig, RestartConfig, SourceConfig, TableConfig,
    TransferConfig,
};

pub fn users_table() -> TableName {
    TableName::new("public", "users")
}

pub fn table_config(schema: &str, name: &str) -> TableConfig {
    TableConfig {
        schema: schema.to_string(),
        name: name.to_string(),
        row_filter: None,
        columns: None,
    }
}

/// Builds a transfer config suited for tests: single-item batches so every change is
/// delivered immediately, and a short restart backoff.
pub fn create_transfer_config(id: u64, tables: Vec<TableConfig>) -> TransferConfig {
    create_transfer_config_with(
        id,
        tables,
        BatchConfig {
            max_size: 1,
            max_fill_ms: 1000,
        },
    )
}

pub fn create_transfer_config_with(
    id: u64,
    tables: Vec<TableConfig>,
    batch: BatchConfig,
) -> TransferConfig {
    TransferConfig {
        id,
        source: SourceConfig {
            connection: None,
            tables,
        },
        destination: DestinationConfig::Memory,
        batch,
        restart: RestartConfig {
            initial_delay_ms: 10,
            max_delay_ms: 100,
            backoff_factor: 2.0,
        },
        bad_records: BadRecordPolicy::Skip,
        drop_stale_on_resume: true,
    }
}

pub fn user_row(id: i64, name: &str) -> Vec<ColumnValue> {
    vec![
        ColumnValue::new("id", Value::I64(id)),
        ColumnValue::new("name", Value::Text(name.to_string())),
    ]
}
