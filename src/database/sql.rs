//! Translation between the gateway contract and SQLite statements

use serde_json::Value;
use sqlx::query::Query as SqlxQuery;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Column, Row as _, Sqlite, ValueRef};

use crate::api::{ColumnKind, Filter, GatewayError, Query, Row, Table};

/// A value ready to be bound to a placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum Bind {
    Text(String),
    Int(i64),
    Real(f64),
    Bool(bool),
    Null,
}

impl Bind {
    fn from_value(kind: ColumnKind, value: &Value) -> Self {
        match (kind, value) {
            (_, Value::Null) => Bind::Null,
            (ColumnKind::Json, other) => Bind::Text(other.to_string()),
            (_, Value::String(s)) => Bind::Text(s.clone()),
            (_, Value::Bool(b)) => Bind::Bool(*b),
            (_, Value::Number(n)) => match n.as_i64() {
                Some(i) => Bind::Int(i),
                None => Bind::Real(n.as_f64().unwrap_or_default()),
            },
            (_, other) => Bind::Text(other.to_string()),
        }
    }
}

/// SQL text plus its positional binds
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<Bind>,
}

impl Statement {
    /// Build an executable sqlx query borrowing this statement's SQL
    pub fn query(&self) -> SqlxQuery<'_, Sqlite, SqliteArguments<'_>> {
        let mut query = sqlx::query(&self.sql);
        for bind in &self.binds {
            query = match bind {
                Bind::Text(s) => query.bind(s.clone()),
                Bind::Int(i) => query.bind(*i),
                Bind::Real(f) => query.bind(*f),
                Bind::Bool(b) => query.bind(*b),
                Bind::Null => query.bind(None::<String>),
            };
        }
        query
    }
}

pub fn build_select(query: &Query) -> Result<Statement, GatewayError> {
    query.validate()?;

    let columns = if query.columns.is_empty() {
        "*".to_string()
    } else {
        query.columns.join(", ")
    };
    let mut sql = format!("SELECT {} FROM {}", columns, query.table.name());
    let mut binds = Vec::new();

    if !query.filters.is_empty() {
        sql.push_str(" WHERE ");
        push_group(query.table, &query.filters, " AND ", &mut sql, &mut binds);
    }

    if let Some(order) = &query.order {
        let direction = if order.ascending { "ASC" } else { "DESC" };
        sql.push_str(&format!(" ORDER BY {} {}", order.column, direction));
    }

    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        binds.push(Bind::Int(limit as i64));
    }

    Ok(Statement { sql, binds })
}

pub fn build_insert(table: Table, row: &Row) -> Result<Statement, GatewayError> {
    let mut columns = Vec::with_capacity(row.len());
    let mut binds = Vec::with_capacity(row.len());
    for (column, value) in row {
        let kind = table.check_column(column)?;
        columns.push(column.as_str());
        binds.push(Bind::from_value(kind, value));
    }

    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.name(),
        columns.join(", "),
        placeholders
    );
    Ok(Statement { sql, binds })
}

/// `None` when there is nothing to change
pub fn build_update(table: Table, id: &str, changes: &Row) -> Result<Option<Statement>, GatewayError> {
    let mut assignments = Vec::with_capacity(changes.len());
    let mut binds = Vec::with_capacity(changes.len() + 1);
    for (column, value) in changes {
        if column == "id" {
            continue;
        }
        let kind = table.check_column(column)?;
        assignments.push(format!("{} = ?", column));
        binds.push(Bind::from_value(kind, value));
    }
    if assignments.is_empty() {
        return Ok(None);
    }

    binds.push(Bind::Text(id.to_string()));
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?",
        table.name(),
        assignments.join(", ")
    );
    Ok(Some(Statement { sql, binds }))
}

fn push_group(table: Table, filters: &[Filter], joiner: &str, sql: &mut String, binds: &mut Vec<Bind>) {
    for (i, filter) in filters.iter().enumerate() {
        if i > 0 {
            sql.push_str(joiner);
        }
        push_filter(table, filter, sql, binds);
    }
}

fn push_filter(table: Table, filter: &Filter, sql: &mut String, binds: &mut Vec<Bind>) {
    // Columns were checked by Query::validate
    let kind = |column: &str| table.column_kind(column).unwrap_or(ColumnKind::Text);

    match filter {
        Filter::Eq(column, Value::Null) => sql.push_str(&format!("{} IS NULL", column)),
        Filter::Eq(column, value) => {
            sql.push_str(&format!("{} = ?", column));
            binds.push(Bind::from_value(kind(column), value));
        }
        Filter::Gte(column, value) => {
            sql.push_str(&format!("{} >= ?", column));
            binds.push(Bind::from_value(kind(column), value));
        }
        Filter::Lte(column, value) => {
            sql.push_str(&format!("{} <= ?", column));
            binds.push(Bind::from_value(kind(column), value));
        }
        // SQLite LIKE is case-insensitive for ASCII
        Filter::ILike(column, pattern) => {
            sql.push_str(&format!("{} LIKE ? ESCAPE '\\'", column));
            binds.push(Bind::Text(pattern.clone()));
        }
        Filter::And(filters) if filters.is_empty() => sql.push_str("1 = 1"),
        Filter::Or(filters) if filters.is_empty() => sql.push_str("1 = 0"),
        Filter::And(filters) => {
            sql.push('(');
            push_group(table, filters, " AND ", sql, binds);
            sql.push(')');
        }
        Filter::Or(filters) => {
            sql.push('(');
            push_group(table, filters, " OR ", sql, binds);
            sql.push(')');
        }
    }
}

/// Convert a SQLite row into a raw gateway row
pub fn row_to_json(table: Table, row: &SqliteRow) -> Result<Row, GatewayError> {
    let mut out = Row::new();
    for column in row.columns() {
        let index = column.ordinal();
        let name = column.name();
        let is_null = row.try_get_raw(index).map_err(decode_error)?.is_null();

        let value = if is_null {
            Value::Null
        } else {
            match table.column_kind(name).unwrap_or(ColumnKind::Text) {
                ColumnKind::Text => Value::String(row.try_get::<String, _>(index).map_err(decode_error)?),
                ColumnKind::Bool => Value::Bool(row.try_get::<bool, _>(index).map_err(decode_error)?),
                ColumnKind::Json => {
                    let text: String = row.try_get(index).map_err(decode_error)?;
                    serde_json::from_str(&text).map_err(|e| GatewayError::Decode(e.to_string()))?
                }
            }
        };
        out.insert(name.to_string(), value);
    }
    Ok(out)
}

fn decode_error(e: sqlx::Error) -> GatewayError {
    GatewayError::Decode(e.to_string())
}

/// Map sqlx errors onto the gateway taxonomy
pub fn map_error(e: sqlx::Error) -> GatewayError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            GatewayError::UniqueViolation(db.message().to_string())
        }
        _ => GatewayError::Backend(e.to_string()),
    }
}
