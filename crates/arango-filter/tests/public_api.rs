//! Builds filters through the public API, the way a web handler would.

use arango_filter_rs::{compile_filter, Condition, Filter, FilterCompiler, FilterError};

// Test: a filter from a request URL compiles to a full AQL suffix
#[tokio::test]
async fn test_filter_from_request_url() {
    let query = "page=1&filter=%7B%22limit%22%3A10%2C%22sort%22%3A%5B%22created%20desc%22%5D%2C%22where%22%3A%7B%22status%22%3A%5B%22open%22%2C%22review%22%5D%7D%7D";
    let filter = Filter::from_query(query).unwrap().unwrap();

    let processed = compile_filter("doc", Some(&filter)).await.unwrap();
    assert_eq!(
        processed.to_aql(),
        "FILTER doc.status IN ['open', 'review'] SORT doc.created DESC LIMIT 10"
    );
}

// Test: programmatic construction matches the JSON form
#[tokio::test]
async fn test_builder_matches_json() {
    let built = Filter::new()
        .offset(20)
        .limit(10)
        .sort_by("name")
        .matching(Condition::or(vec![
            Condition::gt("age", 65),
            Condition::and(vec![Condition::eq("member", true), Condition::lt("age", 18)]),
        ]));
    let parsed = Filter::from_json(
        r#"{
            "offset": 20,
            "limit": 10,
            "sort": ["name"],
            "where": {"or": [{"age": {"gt": 65}}, {"and": [{"member": true}, {"age": {"lt": 18}}]}]}
        }"#,
    )
    .unwrap();

    let compiler = FilterCompiler::new("p");
    let from_builder = compiler.compile(&built).await.unwrap();
    let from_json = compiler.compile(&parsed).await.unwrap();
    assert_eq!(from_builder, from_json);
    assert_eq!(from_json.where_, "(p.age > 65 || (p.member == true && p.age < 18))");
    assert_eq!(from_json.offset_limit, "20, 10");
}

// Test: injected AQL is rejected, wherever it hides
#[tokio::test]
async fn test_injection_attempts_are_rejected() {
    let attempts = [
        r#"{"sort": ["name RETURN 1"]}"#,
        r#"{"where": {"a": {"b": {"UPDATE": 1}}}}"#,
        r#"{"where": {"like": {"text": "x FOR y", "search": "%"}}}"#,
    ];
    for json in attempts {
        let err = match Filter::from_json(json) {
            Ok(filter) => compile_filter("var", Some(&filter)).await.unwrap_err(),
            Err(err) => err,
        };
        assert!(
            matches!(err, FilterError::ForbiddenKeyword { .. }),
            "{json} produced {err:?}"
        );
    }
}

// Test: string literals cannot break out of their quotes
#[tokio::test]
async fn test_string_values_are_escaped() {
    let filter = Filter::from_json(r#"{"where": {"name": "x' || true || '"}}"#).unwrap();
    let processed = compile_filter("var", Some(&filter)).await.unwrap();
    assert_eq!(processed.where_, r"var.name == 'x\' || true || \''");
}
