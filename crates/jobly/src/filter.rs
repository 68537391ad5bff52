//! Search-filter `WHERE` clause generation.
//!
//! [`FilterClauseBuilder`] turns a sparse [`FilterCriteria`] into conditions
//! joined by `AND`. Conditions always come out in the same order (name match,
//! minimum, maximum, flag), whatever order the criteria were set in, so equal
//! input yields identical SQL and placeholder numbering.

use crate::error::{JoblyError, JoblyResult};
use crate::sql::{Sql, SqlFragment};
use crate::value::SqlValue;

/// Optional search constraints. All fields absent means "no filtering".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// Case-insensitive substring to look for in the name column.
    pub name_like: Option<String>,
    /// Inclusive lower bound. Must be numeric.
    pub min_value: Option<SqlValue>,
    /// Inclusive upper bound. Must be numeric.
    pub max_value: Option<SqlValue>,
    /// `Some(true)` keeps only rows whose flag column is positive.
    /// `Some(false)` is the same as `None`.
    pub has_flag: Option<bool>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name_like(mut self, needle: impl Into<String>) -> Self {
        self.name_like = Some(needle.into());
        self
    }

    pub fn min_value(mut self, bound: impl Into<SqlValue>) -> Self {
        self.min_value = Some(bound.into());
        self
    }

    pub fn max_value(mut self, bound: impl Into<SqlValue>) -> Self {
        self.max_value = Some(bound.into());
        self
    }

    pub fn has_flag(mut self, flag: bool) -> Self {
        self.has_flag = Some(flag);
        self
    }

    /// Whether no criterion would produce a condition.
    pub fn is_empty(&self) -> bool {
        self.name_like.is_none()
            && self.min_value.is_none()
            && self.max_value.is_none()
            && self.has_flag != Some(true)
    }
}

/// Which column each criterion applies to, per entity.
///
/// A criterion whose column is `None` is not supported for that entity and is
/// rejected if present.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterColumns<'a> {
    pub name: Option<&'a str>,
    pub min: Option<&'a str>,
    pub max: Option<&'a str>,
    pub flag: Option<&'a str>,
    /// The bound columns hold integers. Bounds must then be whole numbers and
    /// are bound as integers.
    pub integer_bounds: bool,
}

/// Builds the body of a `WHERE` clause from [`FilterCriteria`].
#[derive(Debug, Clone, Copy)]
pub struct FilterClauseBuilder<'a> {
    columns: FilterColumns<'a>,
}

impl<'a> FilterClauseBuilder<'a> {
    pub fn new(columns: FilterColumns<'a>) -> Self {
        Self { columns }
    }

    /// Render the conditions as a standalone fragment numbered from `$1`.
    ///
    /// An empty clause means no filtering; omit `WHERE` entirely.
    pub fn build(&self, criteria: &FilterCriteria) -> JoblyResult<SqlFragment> {
        Ok(self.build_sql(criteria)?.into_fragment())
    }

    /// Same as [`build`](Self::build) but unrendered, for
    /// [`Sql::push_where`].
    pub fn build_sql(&self, criteria: &FilterCriteria) -> JoblyResult<Sql> {
        let integer = self.columns.integer_bounds;
        let min = checked_bound("minimum", criteria.min_value.as_ref(), integer)?;
        let max = checked_bound("maximum", criteria.max_value.as_ref(), integer)?;
        if let (Some(lo), Some(hi)) = (&min, &max) {
            if exceeds(lo, hi) {
                return Err(JoblyError::invalid_input(
                    "minimum cannot be greater than maximum",
                ));
            }
        }

        let mut conditions = Sql::empty();
        let mut first = true;
        let mut and = |sql: &mut Sql| {
            if !first {
                sql.push(" AND ");
            }
            first = false;
        };

        if let Some(needle) = &criteria.name_like {
            let column = self.column(self.columns.name, "name")?;
            and(&mut conditions);
            conditions
                .push_column(column)
                .push(" ILIKE ")
                .push_bind(contains_pattern(needle));
        }

        if let Some(bound) = min {
            let column = self.column(self.columns.min, "minimum")?;
            and(&mut conditions);
            conditions
                .push_column(column)
                .push(" >= ")
                .push_bind(bound);
        }

        if let Some(bound) = max {
            let column = self.column(self.columns.max, "maximum")?;
            and(&mut conditions);
            conditions
                .push_column(column)
                .push(" <= ")
                .push_bind(bound);
        }

        if criteria.has_flag == Some(true) {
            let column = self.column(self.columns.flag, "flag")?;
            and(&mut conditions);
            conditions.push_column(column).push(" > 0");
        }

        Ok(conditions)
    }

    fn column(&self, column: Option<&'a str>, criterion: &str) -> JoblyResult<&'a str> {
        column.ok_or_else(|| {
            JoblyError::invalid_input(format!("{criterion} filter is not supported here"))
        })
    }
}

fn checked_bound(
    which: &str,
    bound: Option<&SqlValue>,
    integer: bool,
) -> JoblyResult<Option<SqlValue>> {
    let Some(v) = bound else {
        return Ok(None);
    };
    if !v.is_numeric() {
        return Err(JoblyError::invalid_input(format!(
            "{which} bound must be numeric, got {}",
            v.kind()
        )));
    }
    if !integer {
        return Ok(Some(v.clone()));
    }
    v.as_integer().map(|i| Some(SqlValue::Int(i))).ok_or_else(|| {
        JoblyError::invalid_input(format!("{which} bound must be a whole number"))
    })
}

/// `lo > hi`, exactly where both fit in a `Decimal`.
fn exceeds(lo: &SqlValue, hi: &SqlValue) -> bool {
    match (lo.as_decimal(), hi.as_decimal()) {
        (Some(lo), Some(hi)) => lo > hi,
        _ => matches!((lo.as_f64(), hi.as_f64()), (Some(lo), Some(hi)) if lo > hi),
    }
}

/// `%needle%` with LIKE metacharacters in `needle` escaped.
fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
