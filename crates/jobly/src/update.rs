//! Partial-update `SET` clause generation.
//!
//! An update request carries a sparse set of fields. [`PartialUpdateBuilder`]
//! turns that set into `"col"=$1, "col2"=$2, ...` plus the values in the same
//! order, translating API field names to column names through a [`NameMap`].
//!
//! # Example
//!
//! ```ignore
//! use jobly::{NameMap, PartialUpdateBuilder, UpdatePayload};
//!
//! const NAMES: NameMap<'static> = NameMap::new(&[("firstName", "first_name")]);
//!
//! let payload = UpdatePayload::new().with("firstName", "Aliya").with("age", 32);
//! let set = PartialUpdateBuilder::new(NAMES).build(&payload)?;
//! assert_eq!(set.clause, r#""first_name"=$1, "age"=$2"#);
//! ```

use crate::error::{JoblyError, JoblyResult};
use crate::sql::{Sql, SqlFragment};
use crate::value::SqlValue;

/// Ordered field → value pairs for an update. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePayload {
    fields: Vec<(String, SqlValue)>,
}

impl UpdatePayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field. An existing field keeps its position and takes the new value.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<SqlValue>) -> &mut Self {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == field) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field, value)),
        }
        self
    }

    /// Consuming counterpart of [`UpdatePayload::set`].
    pub fn with(mut self, field: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.set(field, value);
        self
    }

    /// Set a field only when `value` is `Some`.
    pub fn set_opt<T: Into<SqlValue>>(
        &mut self,
        field: impl Into<String>,
        value: Option<T>,
    ) -> &mut Self {
        if let Some(v) = value {
            self.set(field, v);
        }
        self
    }

    /// Build a payload from a JSON object, keeping the object's key order.
    ///
    /// Non-object input and non-scalar field values are rejected.
    pub fn from_json(value: serde_json::Value) -> JoblyResult<Self> {
        let serde_json::Value::Object(map) = value else {
            return Err(JoblyError::invalid_input("update body must be a JSON object"));
        };

        let mut payload = Self::new();
        for (field, value) in map {
            let value = SqlValue::try_from(value).map_err(|e| match e {
                JoblyError::InvalidInput(msg) => {
                    JoblyError::invalid_input(format!("field {field:?}: {msg}"))
                }
                other => other,
            })?;
            payload.set(field, value);
        }
        Ok(payload)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == field)
    }

    pub fn get(&self, field: &str) -> Option<&SqlValue> {
        self.fields.iter().find(|(k, _)| k == field).map(|(_, v)| v)
    }

    /// Field names in parameter order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for UpdatePayload
where
    K: Into<String>,
    V: Into<SqlValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut payload = Self::new();
        for (k, v) in iter {
            payload.set(k, v);
        }
        payload
    }
}

/// Field name → column name translation table.
///
/// Fields without an entry map to themselves. The table is meant to be a
/// `const` next to the model it describes, never built from request data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameMap<'a> {
    entries: &'a [(&'a str, &'a str)],
}

impl<'a> NameMap<'a> {
    pub const fn new(entries: &'a [(&'a str, &'a str)]) -> Self {
        Self { entries }
    }

    /// A table with no translations.
    pub const fn identity() -> Self {
        Self { entries: &[] }
    }

    /// Column for `field`, falling back to `field` itself when there is no
    /// entry or the entry is empty.
    pub fn column<'f>(&self, field: &'f str) -> &'f str
    where
        'a: 'f,
    {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .filter(|(_, c)| !c.is_empty())
            .map_or(field, |(_, c)| *c)
    }
}

/// Builds the `SET` list of an `UPDATE` from an [`UpdatePayload`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PartialUpdateBuilder<'a> {
    names: NameMap<'a>,
}

impl<'a> PartialUpdateBuilder<'a> {
    pub fn new(names: NameMap<'a>) -> Self {
        Self { names }
    }

    /// Render the `SET` list as a standalone fragment numbered from `$1`.
    ///
    /// Fails with [`JoblyError::InvalidInput`] when the payload is empty.
    pub fn build(&self, payload: &UpdatePayload) -> JoblyResult<SqlFragment> {
        Ok(self.build_sql(payload)?.into_fragment())
    }

    /// Same as [`build`](Self::build) but unrendered, so the caller can keep
    /// appending (`WHERE`, `RETURNING`) with continued placeholder numbering.
    pub fn build_sql(&self, payload: &UpdatePayload) -> JoblyResult<Sql> {
        if payload.is_empty() {
            return Err(JoblyError::invalid_input("No data"));
        }

        let mut set = Sql::empty();
        set.push_separated(payload.iter(), ", ", |set, (field, value)| {
            set.push_column(self.names.column(field))
                .push("=")
                .push_bind(value.clone());
        });
        Ok(set)
    }
}

/// Shorthand for `PartialUpdateBuilder::new(names).build(payload)`.
pub fn sql_for_partial_update(
    payload: &UpdatePayload,
    names: NameMap<'_>,
) -> JoblyResult<SqlFragment> {
    PartialUpdateBuilder::new(names).build(payload)
}
