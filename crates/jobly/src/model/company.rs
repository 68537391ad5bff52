//! Companies: the employers that post jobs.

use super::{double_option, from_json, parse_query_int, unknown_filter};
use crate::client::GenericClient;
use crate::error::{JoblyError, JoblyResult};
use crate::filter::{FilterClauseBuilder, FilterColumns, FilterCriteria};
use crate::row::{FromRow, RowExt};
use crate::sql::sql;
use crate::update::{NameMap, PartialUpdateBuilder, UpdatePayload};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use url::Url;

const COLUMNS: &str = "handle, name, description, num_employees, logo_url";

pub const COMPANY_NAMES: NameMap<'static> = NameMap::new(&[
    ("numEmployees", "num_employees"),
    ("logoUrl", "logo_url"),
]);

pub const COMPANY_FILTER_COLUMNS: FilterColumns<'static> = FilterColumns {
    name: Some("name"),
    min: Some("num_employees"),
    max: Some("num_employees"),
    flag: None,
    integer_bounds: true,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: Option<String>,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl FromRow for Company {
    fn from_row(row: &Row) -> JoblyResult<Self> {
        Ok(Self {
            handle: row.try_get_column("handle")?,
            name: row.try_get_column("name")?,
            description: row.try_get_column("description")?,
            num_employees: row.try_get_column("num_employees")?,
            logo_url: row.try_get_column("logo_url")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub num_employees: Option<i32>,
    #[serde(default)]
    pub logo_url: Option<String>,
}

impl NewCompany {
    pub fn from_json(body: serde_json::Value) -> JoblyResult<Self> {
        let company: Self = from_json(body)?;
        company.validate()?;
        Ok(company)
    }

    pub fn validate(&self) -> JoblyResult<()> {
        if self.handle.trim().is_empty() {
            return Err(JoblyError::invalid_input("handle cannot be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(JoblyError::invalid_input("name cannot be empty"));
        }
        validate_num_employees(self.num_employees)?;
        validate_logo_url(self.logo_url.as_deref())
    }
}

/// Body of an update request. The handle is the key and cannot change.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub num_employees: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub logo_url: Option<Option<String>>,
}

impl CompanyPatch {
    pub fn from_json(body: serde_json::Value) -> JoblyResult<Self> {
        let patch: Self = from_json(body)?;
        patch.validate()?;
        Ok(patch)
    }

    pub fn validate(&self) -> JoblyResult<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(JoblyError::invalid_input("name cannot be empty"));
            }
        }
        validate_num_employees(self.num_employees.flatten())?;
        validate_logo_url(self.logo_url.as_ref().and_then(|u| u.as_deref()))
    }

    /// Present fields under their API names; [`COMPANY_NAMES`] maps them to columns.
    pub fn to_payload(&self) -> UpdatePayload {
        let mut payload = UpdatePayload::new();
        payload.set_opt("name", self.name.clone());
        payload.set_opt("description", self.description.clone());
        payload.set_opt("numEmployees", self.num_employees);
        payload.set_opt("logoUrl", self.logo_url.clone());
        payload
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyFilter {
    pub name: Option<String>,
    pub min_employees: Option<i32>,
    pub max_employees: Option<i32>,
}

impl CompanyFilter {
    /// Parse `name`, `minEmployees` and `maxEmployees` from query-string pairs.
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
                "name" => filter.name = Some(value.to_string()),
                "minEmployees" => filter.min_employees = Some(parse_query_int(key, value)?),
                "maxEmployees" => filter.max_employees = Some(parse_query_int(key, value)?),
                other => return Err(unknown_filter(other)),
            }
        }
        Ok(filter)
    }

    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            name_like: self.name.clone(),
            min_value: self.min_employees.map(Into::into),
            max_value: self.max_employees.map(Into::into),
            has_flag: None,
        }
    }
}

impl Company {
    pub async fn create(conn: &impl GenericClient, new: &NewCompany) -> JoblyResult<Company> {
        new.validate()?;

        let mut q = sql(
            "INSERT INTO companies (handle, name, description, num_employees, logo_url) VALUES (",
        );
        q.push_bind(new.handle.as_str())
            .push(", ")
            .push_bind(new.name.as_str())
            .push(", ")
            .push_bind(new.description.as_deref())
            .push(", ")
            .push_bind(new.num_employees)
            .push(", ")
            .push_bind(new.logo_url.as_deref())
            .push(") RETURNING ")
            .push(COLUMNS);
        q.tag("companies.create");

        let company: Company = q.fetch_one_as(conn).await.map_err(|e| match e {
            JoblyError::UniqueViolation(_) => {
                JoblyError::invalid_input(format!("Duplicate company: {}", new.handle))
            }
            other => other,
        })?;

        tracing::info!(handle = %company.handle, "created company");
        Ok(company)
    }

    /// All companies matching `filter`, ordered by name.
    pub async fn find_all(
        conn: &impl GenericClient,
        filter: &CompanyFilter,
    ) -> JoblyResult<Vec<Company>> {
        let conditions =
            FilterClauseBuilder::new(COMPANY_FILTER_COLUMNS).build_sql(&filter.criteria())?;

        let mut q = sql(format!("SELECT {COLUMNS} FROM companies"));
        q.push_where(conditions);
        q.push(" ORDER BY name");
        q.tag("companies.find_all");
        q.fetch_all_as(conn).await
    }

    pub async fn get(conn: &impl GenericClient, handle: &str) -> JoblyResult<Company> {
        let mut q = sql(format!("SELECT {COLUMNS} FROM companies WHERE handle = "));
        q.push_bind(handle);
        q.tag("companies.get");

        q.fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No company: {handle}")))
    }

    pub async fn update(
        conn: &impl GenericClient,
        handle: &str,
        patch: &CompanyPatch,
    ) -> JoblyResult<Company> {
        patch.validate()?;
        let set = PartialUpdateBuilder::new(COMPANY_NAMES).build_sql(&patch.to_payload())?;

        let mut q = sql("UPDATE companies SET ");
        q.push_sql(set);
        q.push(" WHERE handle = ").push_bind(handle);
        q.push(" RETURNING ").push(COLUMNS);
        q.tag("companies.update");

        let company: Company = q
            .fetch_opt_as(conn)
            .await?
            .ok_or_else(|| JoblyError::not_found(format!("No company: {handle}")))?;

        tracing::info!(handle, "updated company");
        Ok(company)
    }

    pub async fn remove(conn: &impl GenericClient, handle: &str) -> JoblyResult<()> {
        let mut q = sql("DELETE FROM companies WHERE handle = ");
        q.push_bind(handle);
        q.tag("companies.remove");

        if q.execute(conn).await? == 0 {
            return Err(JoblyError::not_found(format!("No company: {handle}")));
        }
        tracing::info!(handle, "removed company");
        Ok(())
    }
}

fn validate_num_employees(n: Option<i32>) -> JoblyResult<()> {
    match n {
        Some(n) if n < 0 => Err(JoblyError::invalid_input("numEmployees cannot be negative")),
        _ => Ok(()),
    }
}

fn validate_logo_url(url: Option<&str>) -> JoblyResult<()> {
    if let Some(raw) = url {
        Url::parse(raw)
            .map_err(|e| JoblyError::invalid_input(format!("logoUrl is not a URL: {e}")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::SqlValue;
    use serde_json::json;

    #[test]
    fn patch_maps_camel_case_fields_to_columns() {
        let patch = CompanyPatch::from_json(json!({
            "numEmployees": 10,
            "logoUrl": "http://c1.img",
            "name": "C1",
        }))
        .unwrap();
        let set = PartialUpdateBuilder::new(COMPANY_NAMES)
            .build(&patch.to_payload())
            .unwrap();
        assert_eq!(set.clause, r#""name"=$1, "num_employees"=$2, "logo_url"=$3"#);
        assert_eq!(set.values[1], SqlValue::Int(10));
    }

    #[test]
    fn patch_rejects_handle_change() {
        assert!(CompanyPatch::from_json(json!({ "handle": "c9" })).is_err());
    }

    #[test]
    fn patch_validates_values() {
        assert!(CompanyPatch::from_json(json!({ "numEmployees": -3 })).is_err());
        assert!(CompanyPatch::from_json(json!({ "logoUrl": "not a url" })).is_err());
        assert!(CompanyPatch::from_json(json!({ "logoUrl": null })).is_ok());
    }

    #[test]
    fn patch_null_description_is_bound_as_null() {
        let patch = CompanyPatch::from_json(json!({ "description": null })).unwrap();
        assert_eq!(patch.to_payload().get("description"), Some(&SqlValue::Null));
    }

    #[test]
    fn new_company_requires_handle_and_name() {
        assert!(NewCompany::from_json(json!({ "handle": "c1" })).is_err());
        let company = NewCompany::from_json(json!({
            "handle": "c1",
            "name": "C1",
            "numEmployees": 1,
        }))
        .unwrap();
        assert_eq!(company.num_employees, Some(1));
        assert_eq!(company.logo_url, None);
    }

    #[test]
    fn filter_with_range() {
        let filter = CompanyFilter::from_query([
            ("maxEmployees", "300"),
            ("name", "net"),
            ("minEmployees", "10"),
        ])
        .unwrap();
        let fragment = FilterClauseBuilder::new(COMPANY_FILTER_COLUMNS)
            .build(&filter.criteria())
            .unwrap();
        assert_eq!(
            fragment.clause,
            r#""name" ILIKE $1 AND "num_employees" >= $2 AND "num_employees" <= $3"#
        );
        assert_eq!(
            fragment.values,
            vec![
                SqlValue::Text("%net%".into()),
                SqlValue::Int(10),
                SqlValue::Int(300)
            ]
        );
    }

    #[test]
    fn filter_min_above_max_is_bad_request() {
        let filter =
            CompanyFilter::from_query([("minEmployees", "500"), ("maxEmployees", "5")]).unwrap();
        let err = FilterClauseBuilder::new(COMPANY_FILTER_COLUMNS)
            .build(&filter.criteria())
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn filter_rejects_job_keys() {
        assert!(CompanyFilter::from_query([("hasEquity", "true")]).is_err());
    }
}
