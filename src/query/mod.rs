//! List-query parsing for the generic resource controller.
//!
//! Filters arrive as ordinary query parameters (`?name=Fireball&level[gte]=3`),
//! with `page`, `sort`, `limit`, and `fields` reserved for pagination, ordering,
//! and projection. Column names are validated against the per-resource
//! whitelist before any SQL is built; values are coerced to the column's
//! declared kind so they bind with the right Postgres type.

use crate::error::ApiError;

/// Bindable type of a filterable column. Part of each resource's compile-time
/// configuration, so filtering never relies on runtime schema lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Int,
    Float,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    pub fn sql(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "gt" => Some(CompareOp::Gt),
            "gte" => Some(CompareOp::Gte),
            "lt" => Some(CompareOp::Lt),
            "lte" => Some(CompareOp::Lte),
            _ => None,
        }
    }
}

/// A filter value already coerced to its column's kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl FilterValue {
    fn coerce(kind: ColumnKind, column: &str, raw: &str) -> Result<Self, ApiError> {
        match kind {
            ColumnKind::Text => Ok(FilterValue::Text(raw.to_string())),
            ColumnKind::Int => raw
                .parse::<i64>()
                .map(FilterValue::Int)
                .map_err(|_| ApiError::validation(format!("Invalid number for field '{column}'"))),
            ColumnKind::Float => raw
                .parse::<f64>()
                .map(FilterValue::Float)
                .map_err(|_| ApiError::validation(format!("Invalid number for field '{column}'"))),
            ColumnKind::Bool => match raw {
                "true" => Ok(FilterValue::Bool(true)),
                "false" => Ok(FilterValue::Bool(false)),
                _ => Err(ApiError::validation(format!(
                    "Invalid boolean for field '{column}'"
                ))),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Condition {
    pub column: &'static str,
    pub op: CompareOp,
    pub value: FilterValue,
}

#[derive(Debug, Clone)]
pub struct SortKey {
    pub column: &'static str,
    pub descending: bool,
}

/// Parsed and validated list query, ready for SQL assembly.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub conditions: Vec<Condition>,
    pub sort: Vec<SortKey>,
    pub fields: Option<Vec<String>>,
    pub page: i64,
    pub limit: i64,
    /// True when the client asked for an explicit page; only then does an
    /// out-of-range page become a 404.
    pub page_requested: bool,
}

impl ListQuery {
    /// Parse raw query pairs against a resource's filterable-column whitelist.
    ///
    /// `default_sort` uses the same syntax as the `sort` parameter
    /// (comma-separated, `-` prefix for descending) and may be empty.
    pub fn parse(
        pairs: &[(String, String)],
        filterable: &'static [(&'static str, ColumnKind)],
        default_sort: &str,
        default_limit: i64,
    ) -> Result<Self, ApiError> {
        let mut conditions = Vec::new();
        let mut sort_spec: Option<&str> = None;
        let mut fields = None;
        let mut page: i64 = 1;
        let mut limit = default_limit;
        let mut page_requested = false;

        for (key, value) in pairs {
            match key.as_str() {
                "page" => {
                    page = value
                        .parse()
                        .ok()
                        .filter(|p| *p >= 1)
                        .ok_or_else(|| ApiError::validation("Invalid page number"))?;
                    page_requested = true;
                }
                "limit" => {
                    limit = value
                        .parse()
                        .ok()
                        .filter(|l| *l >= 1)
                        .ok_or_else(|| ApiError::validation("Invalid limit"))?;
                }
                "sort" => sort_spec = Some(value.as_str()),
                "fields" => {
                    let list: Vec<String> = value
                        .split(',')
                        .map(|f| f.trim().to_string())
                        .filter(|f| !f.is_empty())
                        .collect();
                    if !list.is_empty() {
                        fields = Some(list);
                    }
                }
                _ => conditions.push(Self::parse_condition(key, value, filterable)?),
            }
        }

        let sort = Self::parse_sort(sort_spec.unwrap_or(default_sort), filterable)?;

        Ok(Self {
            conditions,
            sort,
            fields,
            page,
            limit,
            page_requested,
        })
    }

    /// Force a condition on `column`, discarding anything the caller supplied
    /// for it. Used for structural owner scoping: the filter is rewritten
    /// rather than checked after the fact.
    pub fn force_eq(&mut self, column: &'static str, value: &str) {
        self.conditions.retain(|c| c.column != column);
        self.conditions.push(Condition {
            column,
            op: CompareOp::Eq,
            value: FilterValue::Text(value.to_string()),
        });
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// A bare key is an equality filter; `key[op]` applies a comparison
    /// operator, mirroring the original API's `gt/gte/lt/lte` rewriting.
    fn parse_condition(
        key: &str,
        value: &str,
        filterable: &'static [(&'static str, ColumnKind)],
    ) -> Result<Condition, ApiError> {
        let (name, op) = match key.find('[') {
            Some(open) if key.ends_with(']') => {
                let tag = &key[open + 1..key.len() - 1];
                let op = CompareOp::from_tag(tag).ok_or_else(|| {
                    ApiError::validation(format!("Unknown filter operator '{tag}'"))
                })?;
                (&key[..open], op)
            }
            _ => (key, CompareOp::Eq),
        };

        let (column, kind) = filterable
            .iter()
            .find(|(col, _)| *col == name)
            .copied()
            .ok_or_else(|| ApiError::validation(format!("Cannot filter by field '{name}'")))?;

        Ok(Condition {
            column,
            op,
            value: FilterValue::coerce(kind, column, value)?,
        })
    }

    fn parse_sort(
        spec: &str,
        filterable: &'static [(&'static str, ColumnKind)],
    ) -> Result<Vec<SortKey>, ApiError> {
        let mut keys = Vec::new();
        for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, descending) = match part.strip_prefix('-') {
                Some(rest) => (rest, true),
                None => (part, false),
            };
            let (column, _) = filterable
                .iter()
                .find(|(col, _)| *col == name)
                .copied()
                .ok_or_else(|| ApiError::validation(format!("Cannot sort by field '{name}'")))?;
            keys.push(SortKey { column, descending });
        }
        Ok(keys)
    }
}
