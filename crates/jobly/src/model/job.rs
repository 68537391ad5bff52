//! Jobs: postings that belong to a company.

use super::{double_option, from_json, parse_query_bool, parse_query_int, unknown_filter};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::filter::{FilterClauseBuilder, FilterColumns, FilterCriteria};
use crate::row::{FromRow, RowExt};
use crate::sql::sql;
use crate::update::{NameMap, PartialUpdateBuilder, UpdatePayload};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

const COLUMNS: &str = "id, title, salary, equity, company_handle";

/// API field → `jobs` column.
pub const JOB_NAMES: NameMap<'static> = NameMap::new(&[("companyHandle", "company_handle")]);

/// `title` is searched by name, `salary` takes the minimum, `equity` is the flag.
pub const JOB_FILTER_COLUMNS: FilterColumns<'static> = FilterColumns {
    name: Some("title"),
    min: Some("salary"),
    max: None,
    flag: Some("equity"),
    integer_bounds: true,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl FromRow for Job {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            id: row.try_get_column("id")?,
            title: row.try_get_column("title")?,
            salary: row.try_get_column("salary")?,
            equity: row.try_get_column("equity")?,
            company_handle: row.try_get_column("company_handle")?,
        })
    }
}

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub salary: Option<i32>,
    #[serde(default)]
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

impl NewJob {
    pub fn from_json(body: serde_json::Value) -> JoblyResult<Self> {
        let job: Self = from_json(body)?;
        job.validate()?;
        Ok(job)
    }

    pub fn validate(&self) -> JoblyResult<()> {
        validate_title(&self.title)?;
        validate_salary(self.salary)?;
        validate_equity(self.equity)?;
        if self.company_handle.trim().is_empty() {
            return Err(JoblyError::invalid_input("companyHandle cannot be empty"));
        }
        Ok(())
    }
}

/// Body of an update request. `id` and `companyHandle` cannot be changed.
///
/// `salary` and `equity` distinguish "absent" from an explicit `null`, which
/// clears the column.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub salary: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub equity: Option<Option<Decimal>>,
}

impl JobPatch {
    pub fn from_json(body: serde_json::Value) -> JoblyResult<Self> {
        let patch: Self = from_json(body)?;
        patch.validate()?;
        Ok(patch)
    }

    pub fn validate(&self) -> JoblyResult<()> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        validate_salary(self.salary.flatten())?;
        validate_equity(self.equity.flatten())
    }

    /// The fields present in this patch, in declaration order.
    pub fn to_payload(&self) -> UpdatePayload {
        let mut payload = UpdatePayload::new();
        payload.set_opt("title", self.title.clone());
        payload.set_opt("salary", self.salary);
        payload.set_opt("equity", self.equity);
        payload
    }
}

/// Query-string filters for listing jobs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilter {
    pub title: Option<String>,
    pub min_salary: Option<i32>,
    pub has_equity: Option<bool>,
}

impl JobFilter {
    /// Parse `title`, `minSalary` and `hasEquity` from query-string pairs.
    ///
    /// Unknown keys and malformed values are rejected with `InvalidInput`.
    pub fn from_query<I, K, V>(pairs: I) -> JoblyResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filter = Self::default();
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                "title" => filter.title = Some(value.to_string()),
                "minSalary" => filter.min_salary = Some(parse_query_int(key, value)?),
                "hasEquity" => filter.has_equity = Some(parse_query_bool(key, value)?),
                other => return Err(unknown_filter(other)),
            }
        }
        Ok(filter)
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            name_like: self.title.clone(),
            min_value: self.min_salary.map(Into::into),
            max_value: None,
            has_flag: self.has_equity,
        }
    }
}

impl Job {
    /// Insert a job and return it. An unknown company is a client error.
    pub async fn create(conn: &impl GenericClient, new_job: &NewJob) -> JoblyResult<Job> {
        new_job.validate()?;

        let mut q = sql("INSERT INTO jobs (title, salary, equity, company_handle) VALUES (");
        q.push_bind(new_job.title.as_str())
            .push(", ")
            .push_bind(new_job.salary)
            .push(", ")
            .push_bind(new_job.equity)
            .push(", ")
            .push_bind(new_job.company_handle.as_str())
            .push(") RETURNING ")
            .push(COLUMNS);
        q.tag("jobs.create");

        let job: Job = q.fetch_one_as(conn).await.map_err(|e| match e {
            JoblyError::ForeignKeyViolation(_) => {
                JoblyError::invalid_input(format!("No company: {}", new_job.company_handle))
            }
            other => other,
        })?;

        tracing::info!(job_id = job.id, company = %job.company_handle, "created job");
        Ok(job)
    }

    /// All jobs matching `filter`, ordered by title.
    pub async fn find_all(conn: &impl GenericClient, filter: &JobFilter) -> JoblyResult<Vec<Job>> {
        let conditions = FilterClauseBuilder::new(JOB_FILTER_COLUMNS).build_sql(&filter.criteria())?;

        let mut q = sql(format!("SELECT {COLUMNS} FROM jobs"));
        q.push_where(conditions);
        q.push(" ORDER BY title, id");
        q.tag("jobs.find_all");

        let jobs: Vec<Job> = q.fetch_all_as(conn).await?;
        tracing::debug!(count = jobs.len(), "listed jobs");
        Ok(jobs)
    }

    /// Jobs posted by one company, ordered by id.
    pub async fn find_by_company(conn: &impl GenericClient, handle: &str) -> JoblyResult<Vec<Job>> {
        let mut q = sql(format!("SELECT {COLUMNS} FROM jobs WHERE company_handle = "));
        q.push_bind(handle).push(" ORDER BY id");
        q.tag("jobs.find_by_company");
        q.fetch_all_as(conn).await
    }

    pub async fn get(conn: &impl GenericClient, id: i32) -> JoblyResult<Job> {
        let mut q = sql(format!("SELECT {COLUMNS} FROM jobs WHERE id = "));
        q.push_bind(id);
        q.tag("jobs.get");

        q.fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No job: {id}")))
    }

    /// Apply a partial update. Only the fields present in `patch` are written.
    pub async fn update(conn: &impl GenericClient, id: i32, patch: &JobPatch) -> JoblyResult<Job> {
        patch.validate()?;
        let payload = patch.to_payload();
        let set = PartialUpdateBuilder::new(JOB_NAMES).build_sql(&payload)?;

        let mut q = sql("UPDATE jobs SET ");
        q.push_sql(set);
        q.push(" WHERE id = ").push_bind(id);
        q.push(" RETURNING ").push(COLUMNS);
        q.tag("jobs.update");

        let job: Job = q
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No job: {id}")))?;

        let fields: Vec<&str> = payload.fields().collect();
        tracing::info!(job_id = id, ?fields, "updated job");
        Ok(job)
    }

    pub async fn remove(conn: &impl GenericClient, id: i32) -> JoblyResult<()> {
        let mut q = sql("DELETE FROM jobs WHERE id = ");
        q.push_bind(id);
        q.tag("jobs.remove");

        if q.execute(conn).await? == 0 {
            return Err(JoblyError::not_found(format!("No job: {id}")));
        }
        tracing::info!(job_id = id, "removed job");
        Ok(())
    }
}

fn validate_title(title: &str) -> JoblyResult<()> {
    if title.trim().is_empty() {
        return Err(JoblyError::invalid_input("title cannot be empty"));
    }
    Ok(())
}

fn validate_salary(salary: Option<i32>) -> JoblyResult<()> {
    match salary {
        Some(s) if s < 0 => Err(JoblyError::invalid_input("salary cannot be negative")),
        _ => Ok(()),
    }
}

fn validate_equity(equity: Option<Decimal>) -> JoblyResult<()> {
    match equity {
        Some(e) if e < Decimal::ZERO || e > Decimal::ONE => Err(JoblyError::invalid_input(
            "equity must be between 0 and 1",
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;
    use serde_json::json;

    #[test]
    fn new_job_parses_camel_case_body() {
        let job = NewJob::from_json(json!({
            "title": "newJob",
            "salary": 100000,
            "equity": "0.05",
            "companyHandle": "c1",
        }))
        .unwrap();
        assert_eq!(job.company_handle, "c1");
        assert_eq!(job.equity, Some(Decimal::new(5, 2)));
    }

    #[test]
    fn new_job_missing_fields_is_bad_request() {
        let err = NewJob::from_json(json!({ "title": "newJob" })).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn new_job_non_numeric_salary_is_bad_request() {
        let err = NewJob::from_json(json!({
            "title": "newJob",
            "salary": "not-a-number",
            "companyHandle": "c1",
        }))
        .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn patch_rejects_immutable_fields() {
        assert!(JobPatch::from_json(json!({ "companyHandle": "c2" })).is_err());
        assert!(JobPatch::from_json(json!({ "id": 3 })).is_err());
    }

    #[test]
    fn patch_rejects_out_of_range_equity() {
        assert!(JobPatch::from_json(json!({ "equity": "1.5" })).is_err());
        assert!(JobPatch::from_json(json!({ "salary": -1 })).is_err());
    }

    #[test]
    fn patch_payload_keeps_only_present_fields() {
        let patch = JobPatch::from_json(json!({ "title": "Updated Job" })).unwrap();
        let payload = patch.to_payload();
        assert_eq!(payload.fields().collect::<Vec<_>>(), vec!["title"]);
    }

    #[test]
    fn patch_explicit_null_clears_column() {
        let patch = JobPatch::from_json(json!({ "equity": null })).unwrap();
        assert_eq!(patch.equity, Some(None));
        assert_eq!(patch.to_payload().get("equity"), Some(&SqlValue::Null));
    }

    #[test]
    fn patch_builds_set_clause_in_field_order() {
        let patch = JobPatch::from_json(json!({
            "equity": "0.03",
            "salary": 70000,
            "title": "Updated Job",
        }))
        .unwrap();
        let set = PartialUpdateBuilder::new(JOB_NAMES)
            .build(&patch.to_payload())
            .unwrap();
        assert_eq!(set.clause, r#""title"=$1, "salary"=$2, "equity"=$3"#);
        assert_eq!(set.values[1], SqlValue::Int(70000));
    }

    #[test]
    fn empty_patch_is_bad_request_at_build() {
        let payload = JobPatch::default().to_payload();
        let err = PartialUpdateBuilder::new(JOB_NAMES).build(&payload).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn company_handle_translates() {
        assert_eq!(JOB_NAMES.column("companyHandle"), "company_handle");
        assert_eq!(JOB_NAMES.column("title"), "title");
    }

    #[test]
    fn filter_from_query() {
        let filter =
            JobFilter::from_query([("minSalary", "55000"), ("hasEquity", "true")]).unwrap();
        assert_eq!(filter.min_salary, Some(55000));
        assert_eq!(filter.has_equity, Some(true));

        let fragment = FilterClauseBuilder::new(JOB_FILTER_COLUMNS)
            .build(&filter.criteria())
            .unwrap();
        assert_eq!(fragment.clause, r#""salary" >= $1 AND "equity" > 0"#);
        assert_eq!(fragment.values, vec![SqlValue::Int(55000)]);
    }

    #[test]
    fn filter_rejects_non_numeric_min_salary() {
        let err = JobFilter::from_query([("minSalary", "not-a-number")]).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn filter_rejects_unknown_keys() {
        assert!(JobFilter::from_query([("maxSalary", "5")]).is_err());
    }

    #[test]
    fn no_filters_means_no_where() {
        let filter = JobFilter::from_query(Vec::<(String, String)>::new()).unwrap();
        assert!(filter.criteria().is_empty());
    }
}
