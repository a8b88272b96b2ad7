use crate::schema::TableSchema;

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", schema.name);
    let mut columns = Vec::new();

    for col in schema.columns {
        let null_constraint = if !col.nullable { " NOT NULL" } else { "" };
        let pk = if col.name == "id" { " PRIMARY KEY" } else { "" };

        columns.push(format!(
            "    {} {}{}{}",
            col.name,
            col.kind.sql_type(),
            pk,
            null_constraint
        ));
    }

    // Add foreign key constraints
    for fk in schema.foreign_keys {
        columns.push(format!(
            "    FOREIGN KEY ({}) REFERENCES {}(id) ON DELETE CASCADE",
            fk.column, fk.parent
        ));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for foreign key columns and explicit indexes
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    let mut statements: Vec<String> = schema
        .foreign_keys
        .iter()
        // A single-column unique index already covers the lookup
        .filter(|fk| !schema.indexes.iter().any(|i| i.is_unique_on(fk.column)))
        .map(|fk| {
            format!(
                "CREATE INDEX IF NOT EXISTS idx_{}_{} ON {}({})",
                schema.name, fk.column, schema.name, fk.column
            )
        })
        .collect();

    for index in schema.indexes {
        let kind = if index.unique { "UNIQUE INDEX" } else { "INDEX" };
        let prefix = if index.unique { "uq" } else { "idx" };
        statements.push(format!(
            "CREATE {} IF NOT EXISTS {}_{}_{} ON {}({})",
            kind,
            prefix,
            schema.name,
            index.columns.join("_"),
            schema.name,
            index.columns.join(", ")
        ));
    }

    statements
}

/// Generate the INSERT used by batch phases.
///
/// Tables with a conflict key get an upsert: remote-sourced columns are
/// refreshed, while the row id, the conflict key, user-owned columns and
/// `launch_id` links set by an earlier import are kept.
pub fn generate_batch_insert(schema: &TableSchema, columns: &[&str]) -> String {
    let placeholders: Vec<&str> = columns.iter().map(|_| "?").collect();
    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.name,
        columns.join(", "),
        placeholders.join(", ")
    );

    if let Some(key) = schema.conflict_key {
        let updates: Vec<String> = columns
            .iter()
            .filter(|name| **name != "id" && **name != key && **name != "launch_id")
            .filter(|name| schema.column(name).map_or(true, |c| !c.user_owned))
            .map(|name| format!("{name} = excluded.{name}"))
            .collect();

        if updates.is_empty() {
            sql.push_str(&format!(" ON CONFLICT ({}) DO NOTHING", key));
        } else {
            sql.push_str(&format!(
                " ON CONFLICT ({}) DO UPDATE SET {}",
                key,
                updates.join(", ")
            ));
        }
    }

    sql
}
