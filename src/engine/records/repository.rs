//! Record Repository
//!
//! One generic CRUD implementation driven by [`EntitySchema`] descriptors. The
//! repository does not know about roles: callers pass the row filter the access
//! policy produced, and it is applied in the WHERE clause.

use rusqlite::types::ToSql;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

use super::error::{RecordError, Result};
use super::schema::{EntityKind, EntitySchema};
use super::value::{self, SqlValue};
use crate::engine::database::Database;
use crate::engine::rbac::RowFilter;

/// Raw form input, keyed by field name
pub type FieldValues = BTreeMap<String, String>;

/// A listed row. `values` holds every output column of the entity schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub id: i64,
    pub values: Map<String, Value>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Display text for a column, dates as `dd.mm.yyyy`
    pub fn display(&self, kind: EntityKind, column: &str) -> String {
        let field_type = kind.schema().field(column).map(|f| f.field_type);
        self.values
            .get(column)
            .map(|v| value::display_cell(field_type, v))
            .unwrap_or_default()
    }
}

pub struct RecordRepository<'a> {
    db: &'a Database,
}

impl<'a> RecordRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// List rows ordered by id, restricted to the filter's owner id when given
    pub fn list(&self, kind: EntityKind, filter: Option<RowFilter>) -> Result<Vec<Record>> {
        let schema = kind.schema();
        let sql = select_sql(schema, filter.is_some());
        let params: Vec<SqlValue> = filter
            .map(|f| vec![SqlValue::Integer(f.owner_id)])
            .unwrap_or_default();

        debug!(entity = %kind, sql = %sql, "listing records");
        self.query(schema, &sql, &params)
    }

    /// Fetch one row by primary key
    pub fn get(&self, kind: EntityKind, id: i64) -> Result<Record> {
        let schema = kind.schema();
        let sql = select_sql(schema, true);
        self.query(schema, &sql, &[SqlValue::Integer(id)])?
            .into_iter()
            .next()
            .ok_or(RecordError::NotFound {
                entity: schema.title,
                id,
            })
    }

    pub fn count(&self, kind: EntityKind) -> Result<u64> {
        Ok(self.db.row_count(kind.schema().table)?)
    }

    /// Insert a row, returning the id assigned by storage
    pub fn create(&self, kind: EntityKind, fields: &FieldValues) -> Result<i64> {
        let schema = writable(kind)?;
        let submitted = validate(schema, fields)?;

        let mut columns = Vec::with_capacity(schema.fields.len());
        let mut params = Vec::with_capacity(schema.fields.len());
        for spec in schema.fields {
            let value = match submitted.iter().find(|(name, _)| *name == spec.name) {
                Some((_, v)) => v.clone(),
                None => value::missing_field(spec)?,
            };
            columns.push(format!("\"{}\"", spec.name));
            params.push(value);
        }

        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            schema.table,
            columns.join(", "),
            placeholders.join(", ")
        );

        let conn = self.db.get_connection()?;
        conn.execute(&sql, to_params(&params).as_slice())?;
        let id = conn.last_insert_rowid();

        debug!(entity = %kind, id, "record created");
        Ok(id)
    }

    /// Update the submitted fields of one row
    pub fn update(&self, kind: EntityKind, id: i64, fields: &FieldValues) -> Result<()> {
        let schema = writable(kind)?;
        let submitted = validate(schema, fields)?;
        if submitted.is_empty() {
            return Err(RecordError::Validation("no fields to update".to_string()));
        }

        let set_clauses: Vec<String> = submitted
            .iter()
            .enumerate()
            .map(|(i, (name, _))| format!("\"{}\" = ?{}", name, i + 1))
            .collect();
        let sql = format!(
            "UPDATE \"{}\" SET {} WHERE \"{}\" = ?{}",
            schema.table,
            set_clauses.join(", "),
            schema.id_column,
            submitted.len() + 1
        );

        let mut params: Vec<SqlValue> = submitted.into_iter().map(|(_, v)| v).collect();
        params.push(SqlValue::Integer(id));

        let conn = self.db.get_connection()?;
        let affected = conn.execute(&sql, to_params(&params).as_slice())?;
        if affected == 0 {
            return Err(RecordError::NotFound {
                entity: schema.title,
                id,
            });
        }

        debug!(entity = %kind, id, "record updated");
        Ok(())
    }

    /// Delete one row by primary key
    pub fn delete(&self, kind: EntityKind, id: i64) -> Result<()> {
        let schema = writable(kind)?;
        let conn = self.db.get_connection()?;
        let affected = conn.execute(
            &format!(
                "DELETE FROM \"{}\" WHERE \"{}\" = ?1",
                schema.table, schema.id_column
            ),
            [id],
        )?;
        if affected == 0 {
            return Err(RecordError::NotFound {
                entity: schema.title,
                id,
            });
        }

        debug!(entity = %kind, id, "record deleted");
        Ok(())
    }

    fn query(&self, schema: &EntitySchema, sql: &str, params: &[SqlValue]) -> Result<Vec<Record>> {
        let conn = self.db.get_connection()?;
        let mut stmt = conn.prepare(sql)?;
        let columns = schema.output_columns();

        let rows = stmt
            .query_map(to_params(params).as_slice(), |row| {
                let id: i64 = row.get(0)?;
                let mut values = Map::new();
                for (i, column) in columns.iter().enumerate() {
                    values.insert(column.to_string(), value::value_ref_to_json(row.get_ref(i + 1)?));
                }
                Ok(Record { id, values })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn writable(kind: EntityKind) -> Result<&'static EntitySchema> {
    let schema = kind.schema();
    if schema.read_only {
        return Err(RecordError::ReadOnly(schema.title));
    }
    Ok(schema)
}

/// Check every submitted field before anything is written
fn validate(schema: &EntitySchema, fields: &FieldValues) -> Result<Vec<(&'static str, SqlValue)>> {
    fields
        .iter()
        .map(|(name, raw)| {
            let spec = schema.field(name).ok_or_else(|| {
                RecordError::Validation(format!("{} has no field '{}'", schema.title, name))
            })?;
            Ok((spec.name, value::parse_field(spec, raw)?))
        })
        .collect()
}

/// SELECT with lookup joins, optionally filtered on the primary key as `?1`
fn select_sql(schema: &EntitySchema, by_id: bool) -> String {
    let mut columns = vec![format!("r.\"{}\"", schema.id_column)];
    columns.extend(schema.fields.iter().map(|f| format!("r.\"{}\"", f.name)));
    columns.extend(
        schema
            .lookups
            .iter()
            .map(|l| format!("{} AS \"{}\"", l.expression, l.alias)),
    );

    let mut sql = format!("SELECT {} FROM \"{}\" r", columns.join(", "), schema.table);
    for lookup in schema.lookups {
        let target = lookup.target.schema();
        sql.push_str(&format!(
            " LEFT JOIN \"{}\" {} ON r.\"{}\" = {}.\"{}\"",
            target.table, lookup.table_alias, lookup.fk_column, lookup.table_alias, target.id_column
        ));
    }
    if by_id {
        sql.push_str(&format!(" WHERE r.\"{}\" = ?1", schema.id_column));
    }
    sql.push_str(&format!(" ORDER BY r.\"{}\"", schema.id_column));
    sql
}

fn to_params(values: &[SqlValue]) -> Vec<&dyn ToSql> {
    values.iter().map(|v| v as &dyn ToSql).collect()
}
