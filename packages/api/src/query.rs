//! Positional-parameter SQL assembly.
//!
//! Every analytic query in this crate is built through [`SqlBuilder`]: the
//! placeholder index is always derived from the bound-value list, so a
//! conditionally-applied predicate can never shift a later parameter out of
//! position. Caller-controlled values are bound, never spliced into the
//! query text (trailing windows go through `make_interval`).

use std::sync::LazyLock;

use regex::Regex;
use sea_orm::{DatabaseBackend, Statement, Value};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\d+").expect("placeholder pattern"));

#[derive(Debug, Clone)]
pub struct SqlBuilder {
    sql: String,
    values: Vec<Value>,
}

impl SqlBuilder {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            sql: base.into(),
            values: Vec::new(),
        }
    }

    /// Append a raw SQL fragment verbatim.
    pub fn push(&mut self, fragment: &str) -> &mut Self {
        self.sql.push_str(fragment);
        self
    }

    /// Bind a value and return its placeholder (`$1`, `$2`, ...). The index
    /// is the bound-value list's length, so ordering follows bind order.
    /// The returned placeholder may be referenced more than once.
    pub fn bind<V: Into<Value>>(&mut self, value: V) -> String {
        self.values.push(value.into());
        format!("${}", self.values.len())
    }

    /// Append `prefix` followed by the placeholder of a freshly bound value.
    /// The usual shape is `push_filter(" AND st.brand_id = ", brand_id)`.
    pub fn push_filter<V: Into<Value>>(&mut self, prefix: &str, value: V) -> &mut Self {
        let placeholder = self.bind(value);
        self.sql.push_str(prefix);
        self.sql.push_str(&placeholder);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_statement(self) -> Statement {
        Statement::from_sql_and_values(DatabaseBackend::Postgres, self.sql, self.values)
    }
}

/// Replace every positional placeholder with a neutral marker for diagnostic
/// display. Bound values never appear in the output.
pub fn redact_placeholders(sql: &str) -> String {
    PLACEHOLDER.replace_all(sql, "?").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_follow_bind_order() {
        let mut q = SqlBuilder::new("SELECT 1 WHERE a = ");
        let p1 = q.bind(10i64);
        q.push(&p1);
        let p2 = q.bind("x");
        q.push(" AND b = ");
        q.push(&p2);
        assert_eq!(p1, "$1");
        assert_eq!(p2, "$2");
        assert_eq!(q.sql(), "SELECT 1 WHERE a = $1 AND b = $2");
        assert_eq!(q.values().len(), 2);
    }

    #[test]
    fn optional_filters_never_shift_later_parameters() {
        // Same template with and without the optional predicate: the
        // trailing LIMIT lands on whatever index is next in line.
        for brand in [None, Some(7i64)] {
            let mut q = SqlBuilder::new("SELECT * FROM sales s WHERE 1=1");
            if let Some(brand_id) = brand {
                q.push_filter(" AND st.brand_id = ", brand_id);
            }
            q.push_filter(" LIMIT ", 10i64);

            let expected = if brand.is_some() { "$2" } else { "$1" };
            assert!(q.sql().ends_with(&format!(" LIMIT {expected}")));
            assert_eq!(q.values().len(), if brand.is_some() { 2 } else { 1 });
        }
    }

    #[test]
    fn bound_placeholder_can_be_reused() {
        let mut q = SqlBuilder::new("SELECT ");
        let p = q.bind(30i32);
        q.push(&format!("count(*) FILTER (WHERE d <= {p}), count(*) FILTER (WHERE d <= {p} * 2)"));
        assert_eq!(q.values().len(), 1);
        assert_eq!(q.sql().matches("$1").count(), 2);
    }

    #[test]
    fn redaction_strips_all_placeholders() {
        let sql = "SELECT a FROM t WHERE b = $1 AND c >= $12 LIMIT $3";
        assert_eq!(
            redact_placeholders(sql),
            "SELECT a FROM t WHERE b = ? AND c >= ? LIMIT ?"
        );
    }
}
