use jobly::{
    FilterClauseBuilder, FilterColumns, FilterCriteria, JoblyError, NameMap, PartialUpdateBuilder,
    SqlFragment, SqlValue, UpdatePayload, sql, sql_for_partial_update,
};

const PERSON: NameMap<'static> = NameMap::new(&[("firstName", "first_name")]);

const JOBS: FilterColumns<'static> = FilterColumns {
    name: Some("title"),
    min: Some("salary"),
    max: None,
    flag: Some("equity"),
    integer_bounds: true,
};

#[test]
fn partial_update_maps_names_and_numbers_placeholders() {
    let payload = UpdatePayload::new().with("firstName", "Aliya").with("age", 32);
    let result = sql_for_partial_update(&payload, PERSON).unwrap();

    assert_eq!(result.clause, r#""first_name"=$1, "age"=$2"#);
    assert_eq!(
        result.values,
        vec![SqlValue::Text("Aliya".into()), SqlValue::Int(32)]
    );
}

#[test]
fn partial_update_with_empty_name_map() {
    let payload = UpdatePayload::new().with("age", 32);
    let result = sql_for_partial_update(&payload, NameMap::identity()).unwrap();

    assert_eq!(result, SqlFragment::new(r#""age"=$1"#, vec![SqlValue::Int(32)]));
}

#[test]
fn partial_update_rejects_empty_payload() {
    let err = sql_for_partial_update(&UpdatePayload::new(), PERSON).unwrap_err();
    assert!(matches!(err, JoblyError::InvalidInput(ref msg) if msg == "No data"));
}

#[test]
fn filter_with_min_bound_binds_it() {
    let fragment = FilterClauseBuilder::new(JOBS)
        .build(&FilterCriteria::new().min_value(60000))
        .unwrap();

    assert_eq!(fragment.clause.matches('$').count(), 1);
    assert_eq!(fragment.values, vec![SqlValue::Int(60000)]);
}

#[test]
fn whole_float_bound_is_bound_as_integer() {
    let fragment = FilterClauseBuilder::new(JOBS)
        .build(&FilterCriteria::new().min_value(60000.0))
        .unwrap();
    assert_eq!(fragment.values, vec![SqlValue::Int(60000)]);

    let err = FilterClauseBuilder::new(JOBS)
        .build(&FilterCriteria::new().min_value(60000.5))
        .unwrap_err();
    assert!(err.is_invalid_input());
}

#[test]
fn filter_without_criteria_is_empty() {
    let fragment = FilterClauseBuilder::new(JOBS)
        .build(&FilterCriteria::new())
        .unwrap();

    assert_eq!(fragment.clause, "");
    assert!(fragment.values.is_empty());
}

#[test]
fn rendered_fragments_feed_postgres_params() {
    let fragment = FilterClauseBuilder::new(JOBS)
        .build(&FilterCriteria::new().name_like("eng").has_flag(true))
        .unwrap();

    assert_eq!(fragment.params_ref().len(), fragment.values.len());
    assert_eq!(
        serde_json::to_value(&fragment).unwrap(),
        serde_json::json!({
            "clause": r#""title" ILIKE $1 AND "equity" > 0"#,
            "values": ["%eng%"],
        })
    );
}

#[test]
fn update_statement_composes_set_and_where() {
    let payload = UpdatePayload::from_json(serde_json::json!({
        "title": "Updated Job",
        "salary": 70000,
    }))
    .unwrap();
    let set = PartialUpdateBuilder::new(NameMap::identity())
        .build_sql(&payload)
        .unwrap();

    let mut q = sql("UPDATE jobs SET ");
    q.push_sql(set);
    q.push(" WHERE id = ").push_bind(1);
    q.push(" RETURNING id");

    assert_eq!(
        q.to_sql(),
        r#"UPDATE jobs SET "title"=$1, "salary"=$2 WHERE id = $3 RETURNING id"#
    );
    assert_eq!(q.param_count(), 3);
    assert_eq!(q.values()[2], SqlValue::Int(1));
}

#[test]
fn listing_statement_composes_where_and_order() {
    let conditions = FilterClauseBuilder::new(JOBS)
        .build_sql(&FilterCriteria::new().min_value(60000).name_like("eng"))
        .unwrap();

    let mut q = sql("SELECT id FROM jobs");
    q.push_where(conditions);
    q.push(" ORDER BY title");

    assert_eq!(
        q.to_sql(),
        r#"SELECT id FROM jobs WHERE "title" ILIKE $1 AND "salary" >= $2 ORDER BY title"#
    );
}
