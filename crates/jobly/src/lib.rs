//! # jobly
//!
//! Data-access layer for a job board backed by PostgreSQL.
//!
//! ## Features
//!
//! - **Partial updates**: turn a sparse set of changed fields into a `SET` list
//!   with `$n` placeholders and the matching values ([`PartialUpdateBuilder`])
//! - **Search filters**: turn optional name/range/flag criteria into a `WHERE`
//!   body with a fixed condition order ([`FilterClauseBuilder`])
//! - **Composable SQL**: fragments built separately are stitched into one
//!   statement with placeholders renumbered ([`Sql::push_sql`])
//! - **Models**: `Job` and `Company` CRUD over any [`GenericClient`]
//!
//! ## Example
//!
//! ```ignore
//! use jobly::{NameMap, PartialUpdateBuilder, UpdatePayload};
//!
//! const NAMES: NameMap<'static> = NameMap::new(&[("firstName", "first_name")]);
//!
//! let payload = UpdatePayload::new().with("firstName", "Aliya").with("age", 32);
//! let set = PartialUpdateBuilder::new(NAMES).build(&payload)?;
//!
//! assert_eq!(set.clause, r#""first_name"=$1, "age"=$2"#);
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod model;
pub mod row;
pub mod sql;
pub mod update;
pub mod value;

pub use client::GenericClient;
pub use config::{Config, Environment};
pub use error::{JoblyError, JoblyResult};
pub use filter::{FilterClauseBuilder, FilterColumns, FilterCriteria};
pub use model::{
    Company, CompanyFilter, CompanyPatch, Job, JobFilter, JobPatch, NewCompany, NewJob,
};
pub use row::{FromRow, RowExt};
pub use sql::{Sql, SqlFragment, sql};
pub use update::{NameMap, PartialUpdateBuilder, UpdatePayload, sql_for_partial_update};
pub use value::SqlValue;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_from_config, create_pool_with_size};
