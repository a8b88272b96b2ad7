use rusqlite::{Connection, Transaction};
use tracing::debug;

use super::schema_gen::{generate_batch_insert, generate_create_table, generate_indexes};
use crate::error::{Error, Result};
use crate::parser::{ParsedRow, SqlValue};
use crate::schema::{ColumnType, DependencyResolver, TableSchema};
use crate::ui::Ui;

const BATCH_SIZE: usize = 500;

/// Create every table and index that does not exist yet, parents first
pub fn create_tables(conn: &Connection) -> Result<()> {
    let tables = DependencyResolver::new()
        .creation_order()
        .map_err(Error::Schema)?;

    for schema in tables {
        conn.execute(&generate_create_table(schema), [])?;

        for index_sql in generate_indexes(schema) {
            conn.execute(&index_sql, [])?;
        }
    }

    Ok(())
}

/// Columns a batch insert writes: integer ids are left to SQLite
pub fn insert_columns(schema: &TableSchema) -> Vec<&'static str> {
    schema
        .columns
        .iter()
        .filter(|c| !(c.name == "id" && c.kind == ColumnType::Integer))
        .map(|c| c.name)
        .collect()
}

/// Batch insert (upsert, for tables with a conflict key) `rows` into `schema`.
///
/// Any failing row aborts the phase with [`Error::BatchInsert`]; the caller's
/// transaction is then dropped and rolled back.
pub fn batch_insert(
    tx: &Transaction,
    schema: &TableSchema,
    rows: &[ParsedRow],
    ui: &mut impl Ui,
) -> Result<u64> {
    let columns = insert_columns(schema);
    let sql = generate_batch_insert(schema, &columns);
    let total = rows.len() as u64;
    let mut count: u64 = 0;

    for batch in rows.chunks(BATCH_SIZE) {
        insert_batch(tx, &sql, &columns, batch).map_err(|e| Error::batch_insert(schema.name, e))?;
        count += batch.len() as u64;
        ui.set_progress(count, total, schema.name);
    }

    debug!(table = schema.name, rows = count, "Batch inserted");
    Ok(count)
}

/// Insert a batch of rows into the database
fn insert_batch(
    tx: &Transaction,
    sql: &str,
    columns: &[&str],
    batch: &[ParsedRow],
) -> rusqlite::Result<()> {
    let mut stmt = tx.prepare_cached(sql)?;

    for row in batch {
        for (idx, col_name) in columns.iter().enumerate() {
            let value: SqlValue = row.get(col_name);
            value.bind_to(idx + 1, &mut stmt)?;
        }
        stmt.raw_execute()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{FAIRINGS, LAUNCHES};
    use crate::store::Store;
    use crate::ui::{RecordingUi, SilentUi};

    fn launch_row(remote_id: &str, name: &str) -> ParsedRow {
        let mut row = ParsedRow::new();
        row.set("remote_id", remote_id)
            .set("name", name)
            .set("launch_date", "2022-01-01T00:00:00.000Z")
            .set("is_viewed", false);
        row
    }

    #[test]
    fn test_insert_columns_skip_integer_id() {
        assert!(!insert_columns(&LAUNCHES).contains(&"id"));
        assert!(insert_columns(&FAIRINGS).contains(&"id"));
    }

    #[test]
    fn test_batch_insert_reports_progress() {
        let mut store = Store::open_in_memory().unwrap();
        let tx = store.transaction().unwrap();
        let rows: Vec<_> = (0..1200)
            .map(|i| launch_row(&format!("r{i}"), "Bulk"))
            .collect();

        let mut ui = RecordingUi::default();
        let inserted = batch_insert(&tx, &LAUNCHES, &rows, &mut ui).unwrap();
        tx.commit().unwrap();

        assert_eq!(inserted, 1200);
        let progress = ui.last_progress.unwrap();
        assert_eq!((progress.current, progress.total), (1200, 1200));
    }

    #[test]
    fn test_upsert_keeps_user_owned_columns() {
        let mut store = Store::open_in_memory().unwrap();
        {
            let tx = store.transaction().unwrap();
            batch_insert(&tx, &LAUNCHES, &[launch_row("r1", "Old")], &mut SilentUi).unwrap();
            tx.commit().unwrap();
        }
        store
            .connection()
            .execute("UPDATE launches SET is_viewed = 1, notes = 'mine'", [])
            .unwrap();
        {
            let tx = store.transaction().unwrap();
            batch_insert(&tx, &LAUNCHES, &[launch_row("r1", "New")], &mut SilentUi).unwrap();
            tx.commit().unwrap();
        }

        let (count, name, viewed, notes): (i64, String, bool, String) = store
            .connection()
            .query_row(
                "SELECT COUNT(*), name, is_viewed, notes FROM launches",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )
            .unwrap();
        assert_eq!((count, name.as_str(), viewed, notes.as_str()), (1, "New", true, "mine"));
    }

    #[test]
    fn test_failing_row_aborts_phase() {
        let mut store = Store::open_in_memory().unwrap();
        let tx = store.transaction().unwrap();
        let mut missing_name = ParsedRow::new();
        missing_name
            .set("remote_id", "r2")
            .set("launch_date", "2022-01-01T00:00:00.000Z")
            .set("is_viewed", false);

        let err = batch_insert(&tx, &LAUNCHES, &[launch_row("r1", "Ok"), missing_name], &mut SilentUi)
            .unwrap_err();
        assert!(matches!(err, Error::BatchInsert { table: "launches", .. }));
    }
}
