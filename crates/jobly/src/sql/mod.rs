//! Parameterized SQL composition.
//!
//! - [`Sql`] composes a statement from raw text and bound values, numbering
//!   `$1, $2, ...` placeholders on render.
//! - [`SqlFragment`] is a rendered clause plus its ordered values, the shape the
//!   partial-update and filter builders hand back to callers.
//!
//! # Example
//!
//! ```ignore
//! use jobly::sql;
//!
//! let mut q = sql("SELECT id, title FROM jobs");
//! q.push(" WHERE salary >= ").push_bind(60000);
//! q.push(" ORDER BY title");
//!
//! let jobs: Vec<Job> = q.fetch_all_as(&conn).await?;
//! ```

mod builder;
mod exec;
mod fragment;


pub use builder::Sql;
pub use fragment::SqlFragment;

/// Start building a SQL statement.
pub fn sql(initial_sql: impl Into<String>) -> Sql {
    Sql::new(initial_sql)
}
