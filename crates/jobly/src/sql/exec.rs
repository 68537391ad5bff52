//! Statement execution for [`Sql`].

use super::builder::Sql;
use crate::client::GenericClient;
use crate::error::JoblyResult;
use crate::row::FromRow;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

const MAX_LOGGED_SQL_BYTES: usize = 200;

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

impl Sql {
    /// Validate, render and log the statement that is about to run.
    fn prepare(&self) -> JoblyResult<(String, Vec<&(dyn ToSql + Sync)>)> {
        self.validate()?;
        let sql = self.to_sql();
        let params = self.params_ref();

        if tracing::enabled!(target: "jobly.sql", tracing::Level::DEBUG) {
            let shown = match truncate_sql_bytes(&sql, MAX_LOGGED_SQL_BYTES) {
                s if s.len() < sql.len() => format!("{s}..."),
                s => s.to_string(),
            };
            tracing::debug!(
                target: "jobly.sql",
                tag = self.tag_str().unwrap_or("-"),
                param_count = params.len(),
                sql = %shown,
            );
        }

        Ok((sql, params))
    }

    /// Execute the built SQL and return all rows.
    pub async fn fetch_all(&self, conn: &impl GenericClient) -> JoblyResult<Vec<Row>> {
        let (sql, params) = self.prepare()?;
        conn.query(&sql, &params).await
    }

    /// Execute the built SQL and return all rows mapped to `T`.
    pub async fn fetch_all_as<T: FromRow>(&self, conn: &impl GenericClient) -> JoblyResult<Vec<T>> {
        let rows = self.fetch_all(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute the built SQL and return the **first** row.
    ///
    /// Returns [`JoblyError::NotFound`](crate::JoblyError::NotFound) if no rows are returned.
    pub async fn fetch_one(&self, conn: &impl GenericClient) -> JoblyResult<Row> {
        let (sql, params) = self.prepare()?;
        conn.query_one(&sql, &params).await
    }

    /// Execute the built SQL and return the **first** row mapped to `T`.
    pub async fn fetch_one_as<T: FromRow>(&self, conn: &impl GenericClient) -> JoblyResult<T> {
        let row = self.fetch_one(conn).await?;
        T::from_row(&row)
    }

    /// Execute the built SQL and return the first row, if any.
    pub async fn fetch_opt(&self, conn: &impl GenericClient) -> JoblyResult<Option<Row>> {
        let (sql, params) = self.prepare()?;
        conn.query_opt(&sql, &params).await
    }

    /// Execute the built SQL and return at most one row mapped to `T`.
    pub async fn fetch_opt_as<T: FromRow>(
        &self,
        conn: &impl GenericClient,
    ) -> JoblyResult<Option<T>> {
        let row = self.fetch_opt(conn).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Execute the built SQL and return affected row count.
    pub async fn execute(&self, conn: &impl GenericClient) -> JoblyResult<u64> {
        let (sql, params) = self.prepare()?;
        conn.execute(&sql, &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::truncate_sql_bytes;

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_sql_bytes("SELECT 1", 200), "SELECT 1");
        assert_eq!(truncate_sql_bytes("abcdef", 3), "abc");
        // 'é' is two bytes; cutting inside it backs off to the boundary.
        assert_eq!(truncate_sql_bytes("aé", 2), "a");
    }
}
