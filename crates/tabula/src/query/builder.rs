//! QueryBuilder struct and rendering.

use super::replacer::ColumnReplacer;
use super::types::{ColumnOrderBy, QueryArg};
use regex::Regex;
use std::fmt::Write;
use std::sync::OnceLock;
use tabula_common::{Result, TabulaError};

/// Rewrites a WHERE condition before it is rendered.
pub type WhereInterceptor = fn(&str) -> String;

/// Builder for a single query string in the backend's query dialect.
///
/// Renders `select <cols> [where <cond>] [order by <cols>] [offset <n>] [limit <n>]`
/// with logical column names translated to column letters. The output is a
/// pure function of the inputs.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    replacer: ColumnReplacer,
    columns: Vec<String>,
    condition: String,
    args: Vec<QueryArg>,
    interceptor: Option<WhereInterceptor>,
    order_by: Vec<ColumnOrderBy>,
    limit: u64,
    offset: u64,
}

impl QueryBuilder {
    /// Creates a builder selecting `columns` (logical names or raw expressions).
    pub fn new<I, S>(replacer: ColumnReplacer, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replacer,
            columns: columns.into_iter().map(Into::into).collect(),
            condition: String::new(),
            args: Vec::new(),
            interceptor: None,
            order_by: Vec::new(),
            limit: 0,
            offset: 0,
        }
    }

    /// Sets a function applied to the condition before rendering.
    pub fn interceptor(mut self, interceptor: WhereInterceptor) -> Self {
        self.interceptor = Some(interceptor);
        self
    }

    /// Sets the WHERE condition; each `?` consumes one argument in order.
    pub fn where_clause(mut self, condition: impl Into<String>, args: Vec<QueryArg>) -> Self {
        self.condition = condition.into();
        self.args = args;
        self
    }

    /// Replaces the ORDER BY list.
    pub fn order_by(mut self, ordering: Vec<ColumnOrderBy>) -> Self {
        self.order_by = ordering;
        self
    }

    /// Sets LIMIT; 0 means no limit.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Sets OFFSET; 0 means no offset.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Renders the query string.
    ///
    /// # Errors
    ///
    /// Returns `TabulaError::ArgumentCount` when the number of `?` placeholders
    /// (after interception) differs from the number of arguments.
    pub fn build(&self) -> Result<String> {
        let mut stmt = String::from("select");
        self.write_columns(&mut stmt);
        self.write_where(&mut stmt)?;
        self.write_order_by(&mut stmt);
        if self.offset > 0 {
            let _ = write!(stmt, " offset {}", self.offset);
        }
        if self.limit > 0 {
            let _ = write!(stmt, " limit {}", self.limit);
        }
        Ok(stmt)
    }

    fn write_columns(&self, stmt: &mut String) {
        let translated: Vec<String> = self
            .columns
            .iter()
            .map(|col| self.replacer.replace(col))
            .collect();
        stmt.push(' ');
        stmt.push_str(&translated.join(", "));
    }

    fn write_where(&self, stmt: &mut String) -> Result<()> {
        let condition = match self.interceptor {
            Some(intercept) => intercept(&self.condition),
            None => self.condition.clone(),
        };

        let expected = condition.matches('?').count();
        if expected != self.args.len() {
            return Err(TabulaError::ArgumentCount {
                expected,
                actual: self.args.len(),
            });
        }
        if condition.trim().is_empty() {
            return Ok(());
        }

        let condition = self.replacer.replace(&condition);
        let mut tokens = condition.split('?');

        let mut parts: Vec<String> = Vec::with_capacity(2 * self.args.len() + 1);
        if let Some(first) = tokens.next() {
            parts.push(first.trim().to_string());
        }
        for (token, arg) in tokens.zip(&self.args) {
            parts.push(render_arg(arg));
            parts.push(token.trim().to_string());
        }
        parts.retain(|part| !part.is_empty());

        stmt.push_str(" where");
        for part in &parts {
            if !stmt.ends_with('(') && !part.starts_with(')') {
                stmt.push(' ');
            }
            stmt.push_str(part);
        }
        Ok(())
    }

    fn write_order_by(&self, stmt: &mut String) {
        if self.order_by.is_empty() {
            return;
        }

        let translated: Vec<String> = self
            .order_by
            .iter()
            .map(|o| format!("{} {}", self.replacer.replace(&o.column), o.order.as_str()))
            .collect();
        stmt.push_str(" order by ");
        stmt.push_str(&translated.join(", "));
    }
}

fn temporal_keyword() -> &'static Regex {
    static KEYWORD_RE: OnceLock<Regex> = OnceLock::new();
    KEYWORD_RE.get_or_init(|| Regex::new(r"^(date|datetime|timeofday)").expect("valid regex"))
}

/// Render one argument as a dialect literal.
pub(crate) fn render_arg(arg: &QueryArg) -> String {
    match arg {
        QueryArg::Int(v) => v.to_string(),
        QueryArg::Uint(v) => v.to_string(),
        QueryArg::Float(v) => v.to_string(),
        QueryArg::Bool(v) => v.to_string(),
        QueryArg::Text(v) => render_text(v),
        QueryArg::Bytes(v) => quote(&String::from_utf8_lossy(v)),
    }
}

fn render_text(value: &str) -> String {
    let cleaned = value.trim().to_lowercase();
    if temporal_keyword().is_match(&cleaned) {
        return value.to_string();
    }
    quote(value)
}

/// Double-quote with backslash escapes for `"`, `\` and control characters
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
