use chrono::NaiveDate;
use sqlx::MySql;
use sqlx::mysql::MySqlArguments;
use sqlx::query::{QueryAs, QueryScalar};

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    Date(NaiveDate),
}

/// ===============================
/// Dynamic WHERE clause builder
/// ===============================
#[derive(Debug, Default)]
pub struct SqlFilter {
    conditions: Vec<String>,
    values: Vec<SqlValue>,
}

impl SqlFilter {
    /// Adds a condition; `values` must match its `?` placeholders in order.
    pub fn push(&mut self, condition: &str, values: impl IntoIterator<Item = SqlValue>) {
        self.conditions.push(condition.to_string());
        self.values.extend(values);
    }

    /// Adds `condition` once per placeholder with the same `%term%` pattern.
    pub fn push_search(&mut self, condition: &str, term: &str) {
        let pattern = format!("%{}%", term.trim());
        let placeholders = condition.matches('?').count();
        self.push(
            condition,
            std::iter::repeat_n(SqlValue::String(pattern), placeholders),
        );
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn bind_rows<'q, O>(
        &'q self,
        mut query: QueryAs<'q, MySql, O, MySqlArguments>,
    ) -> QueryAs<'q, MySql, O, MySqlArguments> {
        for value in &self.values {
            query = match value {
                SqlValue::String(v) => query.bind(v.as_str()),
                SqlValue::U64(v) => query.bind(*v),
                SqlValue::Date(v) => query.bind(*v),
            };
        }
        query
    }

    pub fn bind_scalar<'q, O>(
        &'q self,
        mut query: QueryScalar<'q, MySql, O, MySqlArguments>,
    ) -> QueryScalar<'q, MySql, O, MySqlArguments> {
        for value in &self.values {
            query = match value {
                SqlValue::String(v) => query.bind(v.as_str()),
                SqlValue::U64(v) => query.bind(*v),
                SqlValue::Date(v) => query.bind(*v),
            };
        }
        query
    }

    #[cfg(test)]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }
}
