use crate::value::SqlValue;
use serde::Serialize;
use tokio_postgres::types::ToSql;

/// A rendered clause and the values bound to its placeholders.
///
/// Placeholder `$i` in `clause` binds `values[i - 1]`. An empty clause means
/// "nothing to add"; callers omit the surrounding keyword entirely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlFragment {
    pub clause: String,
    pub values: Vec<SqlValue>,
}

impl SqlFragment {
    pub fn new(clause: impl Into<String>, values: Vec<SqlValue>) -> Self {
        Self {
            clause: clause.into(),
            values,
        }
    }

    /// The fragment for "no clause": empty text, no values.
    pub fn empty() -> Self {
        Self::new(String::new(), Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }

    /// Parameter refs compatible with `tokio-postgres`.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values
            .iter()
            .map(|v| v as &(dyn ToSql + Sync))
            .collect()
    }
}
