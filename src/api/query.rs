//! Fluent query description shared by every gateway

use serde_json::Value;

use super::{GatewayError, Table};

/// A single predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Gte(String, Value),
    Lte(String, Value),
    /// Case-insensitive pattern match, `%` is the wildcard and `\` escapes
    ILike(String, String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Filter::Eq(column.to_string(), value.into())
    }

    pub fn gte(column: &str, value: impl Into<Value>) -> Self {
        Filter::Gte(column.to_string(), value.into())
    }

    pub fn lte(column: &str, value: impl Into<Value>) -> Self {
        Filter::Lte(column.to_string(), value.into())
    }

    /// `column ILIKE %text%`, with wildcards in `text` matched literally
    pub fn contains(column: &str, text: &str) -> Self {
        Filter::ILike(column.to_string(), format!("%{}%", escape_like(text)))
    }

    pub fn and(filters: Vec<Filter>) -> Self {
        Filter::And(filters)
    }

    pub fn or(filters: Vec<Filter>) -> Self {
        Filter::Or(filters)
    }

    fn validate(&self, table: Table) -> Result<(), GatewayError> {
        match self {
            Filter::Eq(column, _)
            | Filter::Gte(column, _)
            | Filter::Lte(column, _)
            | Filter::ILike(column, _) => table.check_column(column).map(|_| ()),
            Filter::And(filters) | Filter::Or(filters) => {
                filters.iter().try_for_each(|f| f.validate(table))
            }
        }
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Result ordering
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A filtered read against one table
///
/// Top-level filters are combined with AND.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    /// Projected columns, empty means all
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn from(table: Table) -> Self {
        Self {
            table,
            columns: Vec::new(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::gte(column, value))
    }

    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::lte(column, value))
    }

    pub fn contains(self, column: &str, text: &str) -> Self {
        self.filter(Filter::contains(column, text))
    }

    pub fn or(self, filters: Vec<Filter>) -> Self {
        self.filter(Filter::Or(filters))
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check every referenced column against the table schema
    pub fn validate(&self) -> Result<(), GatewayError> {
        for column in &self.columns {
            self.table.check_column(column)?;
        }
        for filter in &self.filters {
            filter.validate(self.table)?;
        }
        if let Some(order) = &self.order {
            self.table.check_column(&order.column)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_filters() {
        let query = Query::from(Table::ListeningHistory)
            .eq("user_id", "u1")
            .contains("artist", "Vangelis")
            .order("played_at", false)
            .limit(50);

        assert_eq!(query.filters.len(), 2);
        assert_eq!(
            query.filters[1],
            Filter::ILike("artist".to_string(), "%Vangelis%".to_string())
        );
        assert_eq!(query.limit, Some(50));
        assert!(!query.order.as_ref().unwrap().ascending);
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_contains_escapes_wildcards() {
        assert_eq!(
            Filter::contains("display_name", "100%_a\\b"),
            Filter::ILike("display_name".to_string(), "%100\\%\\_a\\\\b%".to_string())
        );
    }

    #[test]
    fn test_validate_nested_filters() {
        let query = Query::from(Table::Friendships).or(vec![
            Filter::and(vec![
                Filter::eq("requester_id", "a"),
                Filter::eq("addressee_id", "b"),
            ]),
            Filter::and(vec![
                Filter::eq("requester_id", "b"),
                Filter::eq("nickname", "a"),
            ]),
        ]);
        assert!(matches!(
            query.validate(),
            Err(GatewayError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_validate_order_and_projection() {
        let query = Query::from(Table::Profiles).select(&["id", "display_name"]);
        assert!(query.validate().is_ok());

        let query = Query::from(Table::Profiles).order("played_at", true);
        assert!(query.validate().is_err());
    }
}
