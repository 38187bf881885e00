//! Search Module Tests
//!
//! Validates the link-search pipeline end to end against an in-memory store.
//!
//! ## Test Scopes
//! - **Sanitizer / Normalizer**: Field policy and parameter coercion.
//! - **Engine**: Intersection semantics, no-text listing, offsets and call counts.
//! - **Formatter**: Suggestion shape, relevance ordering, query templating.
//! - **Service / HTTP**: Entry points, custom queries and error responses.

#[cfg(test)]
mod tests {
    use crate::error::SearchError;
    use crate::routes::{AppState, build_router};
    use crate::search::engine::{PAGE_LENGTH, result_fields, search};
    use crate::search::normalizer::{coerce_start, normalize};
    use crate::search::queries::{QueryRegistry, USER_QUERY};
    use crate::search::sanitizer::sanitize_search_field;
    use crate::search::service::SearchService;
    use crate::search::suggest::{relevance_rank, scrub_query, sort_by_relevance, to_suggestions};
    use crate::search::tokenizer::split_terms;
    use crate::search::types::{RawSearchParams, ResultRecord, SearchRequest};
    use crate::store::filters::{FilterClause, FilterOp, Filters};
    use crate::store::memory::MemoryRecordStore;
    use crate::store::protocol::{ListQuery, RecordStore};
    use crate::store::testing::{CallKind, CountingStore, FailingStore, record};

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    const ITEMS: [(&str, &str); 7] = [
        ("Red Apple", "Fruit"),
        ("Green Apple", "Fruit"),
        ("Red Grape", "Fruit"),
        ("Apple Pie", "Bakery"),
        ("Banana", "Fruit"),
        ("Red Onion", "Vegetable"),
        ("Pineapple Red", "Fruit"),
    ];

    fn item_store() -> MemoryRecordStore {
        let store = MemoryRecordStore::new();
        for (name, group) in ITEMS {
            store
                .upsert(
                    "Item",
                    record(json!({"name": name, "item_group": group, "description": format!("{} ({})", name, group)})),
                )
                .unwrap();
        }
        store
    }

    fn users_store() -> MemoryRecordStore {
        let store = MemoryRecordStore::new();
        for (name, full_name, enabled) in [
            ("zoe@example.com", "Zoe Ann", 1),
            ("annika@example.com", "Annika Berg", 1),
            ("mark@example.com", "Mark Hannah", 1),
            ("old@example.com", "Ann Old", 0),
            ("Administrator", "Administrator", 1),
        ] {
            store
                .upsert(
                    "User",
                    record(json!({"name": name, "full_name": full_name, "enabled": enabled})),
                )
                .unwrap();
        }
        store
    }

    fn names(records: &[ResultRecord]) -> Vec<String> {
        records.iter().filter_map(|r| r.name().map(str::to_string)).collect()
    }

    fn raw(doctype: &str, txt: &str) -> RawSearchParams {
        RawSearchParams {
            doctype: doctype.to_string(),
            txt: txt.to_string(),
            ..RawSearchParams::default()
        }
    }

    // ============================================================
    // SANITIZER TESTS
    // ============================================================

    #[test]
    fn test_sanitize_rejects_sql_special_characters() {
        for field in [
            "name'",
            "name\"",
            "name;drop table",
            "name--",
            "name/*x*/",
            "a\\b",
            "`tabItem`",
            "name or 1=1",
            "item%",
        ] {
            let result = sanitize_search_field(field);
            assert!(
                matches!(result, Err(SearchError::InvalidField(ref f)) if f == field),
                "{:?} should be rejected",
                field
            );
        }
    }

    #[test]
    fn test_sanitize_accepts_allowed_fields() {
        for field in ["", "name", "item_name", "tabItem.item_name", "field2", "名前"] {
            assert!(sanitize_search_field(field).is_ok(), "{:?} should pass", field);
        }
    }

    #[test]
    fn test_invalid_field_message_names_the_field() {
        let err = sanitize_search_field("x;y").unwrap_err();
        assert_eq!(err.to_string(), "Invalid Search Field x;y");
    }

    // ============================================================
    // NORMALIZER TESTS
    // ============================================================

    #[test]
    fn test_coerce_start_clamps_instead_of_failing() {
        assert_eq!(coerce_start(None), 0);
        assert_eq!(coerce_start(Some(&json!(7))), 7);
        assert_eq!(coerce_start(Some(&json!("5"))), 5);
        assert_eq!(coerce_start(Some(&json!(" 12 "))), 12);
        assert_eq!(coerce_start(Some(&json!(2.9))), 2);
        assert_eq!(coerce_start(Some(&json!(-3))), 0);
        assert_eq!(coerce_start(Some(&json!("abc"))), 0);
        assert_eq!(coerce_start(Some(&json!([1]))), 0);
    }

    #[test]
    fn test_normalize_defaults_and_trims() {
        let mut params = raw(" Item ", "  red apple  ");
        params.searchfield = Some("   ".to_string());

        let req = normalize(params).unwrap();

        assert_eq!(req.doctype, "Item");
        assert_eq!(req.text, "red apple");
        assert_eq!(req.search_field, "name");
        assert_eq!(req.start, 0);
        assert!(req.filters.is_empty());
        assert!(!req.as_dict);
        assert!(req.query.is_none());
    }

    #[test]
    fn test_normalize_parses_text_filters() {
        let mut params = raw("Item", "");
        params.filters = Some(json!(r#"{"item_group": "Fruit", "qty": [">", 2]}"#));
        params.start = Some(json!("40"));
        params.as_dict = Some(json!("1"));

        let req = normalize(params).unwrap();

        assert_eq!(req.filters.clauses().len(), 2);
        assert_eq!(req.filters.clauses()[1].op, FilterOp::Gt);
        assert_eq!(req.start, 40);
        assert!(req.as_dict);
    }

    #[test]
    fn test_normalize_passes_structured_filters_through() {
        let mut params = raw("Item", "");
        params.filters = Some(json!([["Item", "item_group", "=", "Fruit"]]));

        let req = normalize(params).unwrap();
        assert_eq!(
            req.filters,
            Filters::new().with(FilterClause::new("item_group", FilterOp::Eq, json!("Fruit")))
        );
    }

    #[test]
    fn test_normalize_rejects_bad_filters_and_fields() {
        let mut bad_filters = raw("Item", "");
        bad_filters.filters = Some(json!("{not json"));
        assert!(matches!(normalize(bad_filters), Err(SearchError::InvalidFilters(_))));

        let mut bad_field = raw("Item", "x");
        bad_field.searchfield = Some("name; --".to_string());
        assert!(matches!(normalize(bad_field), Err(SearchError::InvalidField(_))));

        let mut bad_extra = raw("Item", "x");
        bad_extra.filter_fields = Some(json!(["item_group", "1=1"]));
        assert!(matches!(normalize(bad_extra), Err(SearchError::InvalidField(_))));
    }

    #[test]
    fn test_normalize_filter_fields_forms() {
        let mut as_text = raw("Item", "");
        as_text.filter_fields = Some(json!("item_group, description"));
        assert_eq!(
            normalize(as_text).unwrap().filter_fields,
            vec!["item_group".to_string(), "description".to_string()]
        );

        let mut as_json_text = raw("Item", "");
        as_json_text.filter_fields = Some(json!(r#"["description"]"#));
        assert_eq!(
            normalize(as_json_text).unwrap().filter_fields,
            vec!["description".to_string()]
        );
    }

    // ============================================================
    // TOKENIZER TESTS
    // ============================================================

    #[test]
    fn test_split_terms() {
        assert_eq!(split_terms("red  apple\tpie"), vec!["red", "apple", "pie"]);
        assert_eq!(split_terms("Red red"), vec!["Red", "red"]);
        assert!(split_terms("   ").is_empty());
        assert!(split_terms("").is_empty());
    }

    // ============================================================
    // ENGINE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_no_text_matches_plain_listing() {
        let store = CountingStore::new(item_store());
        let mut req = SearchRequest::new("Item", "");
        req.filters = Filters::new().with(FilterClause::new("item_group", FilterOp::Eq, json!("Fruit")));
        req.start = 1;

        let results = search(&store, &req, PAGE_LENGTH).await.unwrap();

        let direct = store
            .inner
            .list_all(
                "Item",
                &ListQuery::new(vec!["name".into()])
                    .filters(req.filters.clone())
                    .start(1)
                    .page_length(PAGE_LENGTH),
            )
            .await
            .unwrap();
        assert_eq!(results, direct);
        assert_eq!(store.count(CallKind::ListAll, "Item"), 1);
        assert_eq!(store.count(CallKind::ListFiltered, "Item"), 0);
    }

    #[tokio::test]
    async fn test_whitespace_only_text_is_no_text() {
        let store = CountingStore::new(item_store());
        let mut req = SearchRequest::new("Item", "");
        req.text = "  \t ".to_string();

        let results = search(&store, &req, PAGE_LENGTH).await.unwrap();

        assert_eq!(results.len(), ITEMS.len());
        assert_eq!(store.count(CallKind::ListAll, "Item"), 1);
    }

    #[tokio::test]
    async fn test_every_result_matches_every_term() {
        let store = item_store();

        for text in ["red", "red apple", "apple red", "APPLE", "app le", "red pine"] {
            let req = SearchRequest::new("Item", text);
            let results = search(&store, &req, PAGE_LENGTH).await.unwrap();

            for name in names(&results) {
                for term in split_terms(text) {
                    assert!(
                        name.to_lowercase().contains(&term.to_lowercase()),
                        "{:?} returned for {:?} but lacks {:?}",
                        name,
                        text,
                        term
                    );
                }
            }
        }
    }

    #[tokio::test]
    async fn test_intersection_ordered_by_key() {
        let store = item_store();
        let req = SearchRequest::new("Item", "red apple");

        let results = search(&store, &req, PAGE_LENGTH).await.unwrap();

        assert_eq!(names(&results), vec!["Pineapple Red", "Red Apple"]);
    }

    #[tokio::test]
    async fn test_disjoint_terms_return_empty_and_short_circuit() {
        let store = CountingStore::new(item_store());
        let req = SearchRequest::new("Item", "banana grape onion");

        let results = search(&store, &req, PAGE_LENGTH).await.unwrap();

        assert!(results.is_empty());
        // "banana", then "grape" empties the set; "onion" and the final call are skipped.
        assert_eq!(store.count(CallKind::ListFiltered, "Item"), 2);
    }

    #[tokio::test]
    async fn test_term_without_matches_returns_empty() {
        let store = item_store();
        let req = SearchRequest::new("Item", "kiwi");

        assert!(search(&store, &req, PAGE_LENGTH).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_terms_are_idempotent() {
        let store = item_store();

        let once = search(&store, &SearchRequest::new("Item", "apple"), PAGE_LENGTH)
            .await
            .unwrap();
        let twice = search(&store, &SearchRequest::new("Item", "apple apple"), PAGE_LENGTH)
            .await
            .unwrap();

        assert_eq!(once, twice);
        assert_eq!(once.len(), 4);
    }

    #[tokio::test]
    async fn test_term_lookups_shape() {
        let store = CountingStore::new(item_store());
        let mut req = SearchRequest::new("Item", "red apple");
        req.filters = Filters::new().with(FilterClause::new("item_group", FilterOp::Eq, json!("Fruit")));

        search(&store, &req, PAGE_LENGTH).await.unwrap();

        let calls = store.calls();
        assert_eq!(calls.len(), 3);

        let (kind, _, first) = &calls[0];
        assert_eq!(*kind, CallKind::ListFiltered);
        assert_eq!(first.fields, vec!["name".to_string()]);
        assert_eq!(first.filters, req.filters);
        assert_eq!(first.or_filters, vec![FilterClause::contains("name", "red")]);
        assert_eq!(first.page_length, None);
        assert!(first.ignore_permissions);

        let (_, _, last) = &calls[2];
        assert_eq!(last.filters.clauses()[0].op, FilterOp::In);
        assert_eq!(last.filters.clauses()[0].value, json!(["Pineapple Red", "Red Apple"]));
        assert_eq!(last.order_by.as_deref(), Some("name asc"));
        assert_eq!(last.page_length, Some(PAGE_LENGTH));
    }

    #[tokio::test]
    async fn test_start_applies_to_every_term_lookup() {
        let store = CountingStore::new(item_store());
        let mut req = SearchRequest::new("Item", "red apple");
        req.start = 1;

        let results = search(&store, &req, PAGE_LENGTH).await.unwrap();

        assert!(store.calls().iter().all(|(_, _, q)| q.start == 1));
        // "red" loses "Red Apple" (its first match) to the offset, "apple"
        // loses "Red Apple" too, leaving {"Pineapple Red"}; the final call
        // then skips that single key as well.
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_filters_restrict_term_matches() {
        let store = item_store();
        let mut req = SearchRequest::new("Item", "apple");
        req.filters = Filters::new().with(FilterClause::new("item_group", FilterOp::Eq, json!("Bakery")));

        let results = search(&store, &req, PAGE_LENGTH).await.unwrap();
        assert_eq!(names(&results), vec!["Apple Pie"]);
    }

    #[tokio::test]
    async fn test_page_length_caps_final_call() {
        let store = item_store();
        let req = SearchRequest::new("Item", "e");

        let results = search(&store, &req, 2).await.unwrap();
        assert_eq!(names(&results), vec!["Apple Pie", "Green Apple"]);
    }

    #[tokio::test]
    async fn test_custom_search_field_and_extra_fields() {
        let store = item_store();
        let mut req = SearchRequest::new("Item", "bakery");
        req.search_field = "description".to_string();
        req.filter_fields = vec!["item_group".to_string()];

        let results = search(&store, &req, PAGE_LENGTH).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].to_row(),
            vec![json!("Apple Pie"), json!("Apple Pie (Bakery)"), json!("Bakery")]
        );
    }

    #[test]
    fn test_result_fields_dedup() {
        assert_eq!(result_fields("name", &[]), vec!["name".to_string()]);
        assert_eq!(
            result_fields("title", &["title".into(), "name".into(), "status".into()]),
            vec!["name".to_string(), "title".to_string(), "status".to_string()]
        );
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let req = SearchRequest::new("Item", "red");
        let err = search(&FailingStore, &req, PAGE_LENGTH).await.unwrap_err();

        assert!(matches!(err, SearchError::Store(_)));
        assert!(err.to_string().contains("connection reset"));
    }

    // ============================================================
    // FORMATTER TESTS
    // ============================================================

    #[test]
    fn test_to_suggestions_preserves_order_and_length() {
        let records = vec![
            record(json!({"name": "b", "title": "ignored"})),
            record(json!({"name": "a"})),
            record(json!({"name": "c"})),
        ];

        let suggestions = to_suggestions(&records);

        assert_eq!(suggestions.len(), records.len());
        for (suggestion, record) in suggestions.iter().zip(&records) {
            assert_eq!(Some(suggestion.value.as_str()), record.name());
            assert_eq!(suggestion.description, "");
        }
        assert!(to_suggestions(&[]).is_empty());
    }

    #[test]
    fn test_relevance_prefix_first_then_raw_value() {
        let mut values = vec!["abc".to_string(), "xab".to_string(), "Abd".to_string()];
        values.sort_by_key(|v| relevance_rank("ab", v));

        assert_eq!(values, vec!["Abd", "abc", "xab"]);
    }

    #[test]
    fn test_relevance_rank_key() {
        assert_eq!(relevance_rank("AB", "abc"), (false, "abc".to_string()));
        assert_eq!(relevance_rank("ab", "xab"), (true, "xab".to_string()));
        assert_eq!(relevance_rank("", "anything"), (false, "anything".to_string()));
    }

    #[test]
    fn test_relevance_on_records_and_rows() {
        let mut records = vec![
            record(json!({"name": "Zab"})),
            record(json!({"name": "ab-1"})),
            record(json!({"name": "Ab-2"})),
        ];
        sort_by_relevance("ab", &mut records);
        assert_eq!(names(&records), vec!["Ab-2", "ab-1", "Zab"]);

        let mut rows: Vec<Vec<Value>> = vec![
            vec![json!("beta"), json!(1)],
            vec![json!("alpha"), json!(2)],
            vec![json!("Be"), json!(3)],
        ];
        sort_by_relevance("be", &mut rows);
        assert_eq!(rows[0][0], json!("Be"));
        assert_eq!(rows[1][0], json!("beta"));
        assert_eq!(rows[2][0], json!("alpha"));
    }

    #[test]
    fn test_scrub_query_substitutes_placeholders() {
        let template = "select name from tabItem where %(key)s like %s order by %(key)s";
        assert_eq!(
            scrub_query(template, "item_name", "app"),
            "select name from tabItem where item_name like app% order by item_name"
        );
        assert_eq!(scrub_query("no placeholders", "k", "t"), "no placeholders");
        assert_eq!(scrub_query("%s", "k", ""), "%");
    }

    // ============================================================
    // SERVICE TESTS
    // ============================================================

    fn service_over(store: Arc<dyn RecordStore>) -> Arc<SearchService> {
        SearchService::new(store, QueryRegistry::with_builtins(), PAGE_LENGTH)
    }

    #[tokio::test]
    async fn test_unknown_doctype_is_empty_not_error() {
        let store = Arc::new(CountingStore::new(item_store()));
        let service = service_over(store.clone());

        let results = service.search_widget(raw("Customer", "red")).await.unwrap();

        assert!(results.is_empty());
        assert_eq!(store.exists_calls(), 1);
        assert_eq!(store.listing_calls(), 0);
    }

    #[tokio::test]
    async fn test_search_link_returns_suggestions() {
        let service = service_over(Arc::new(item_store()));

        let suggestions = service.search_link(raw("Item", "  red apple ")).await.unwrap();

        let values: Vec<&str> = suggestions.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, vec!["Pineapple Red", "Red Apple"]);
    }

    #[tokio::test]
    async fn test_search_link_ignores_start() {
        let store = Arc::new(CountingStore::new(item_store()));
        let service = service_over(store.clone());
        let mut params = raw("Item", "red apple");
        params.start = Some(json!(5));

        let suggestions = service.search_link(params.clone()).await.unwrap();

        assert_eq!(suggestions.len(), 2);
        assert!(store.calls().iter().all(|(_, _, q)| q.start == 0));

        // The widget entry point still honours the offset.
        let widget = service.search_widget(params).await.unwrap();
        assert!(widget.is_empty());
    }

    #[test]
    fn test_builtin_queries_are_registered() {
        let registry = QueryRegistry::with_builtins();
        assert_eq!(registry.list_queries(), vec![USER_QUERY.to_string()]);
    }

    #[tokio::test]
    async fn test_invalid_field_aborts_before_store() {
        let store = Arc::new(CountingStore::new(item_store()));
        let service = service_over(store.clone());
        let mut params = raw("Item", "red");
        params.searchfield = Some("name'--".to_string());

        let err = service.search_widget(params).await.unwrap_err();

        assert!(matches!(err, SearchError::InvalidField(_)));
        assert_eq!(store.exists_calls(), 0);
        assert_eq!(store.listing_calls(), 0);
    }

    #[tokio::test]
    async fn test_custom_query_results_are_relevance_sorted() {
        let service = service_over(Arc::new(users_store()));
        let mut params = raw("User", "ann");
        params.query = Some(USER_QUERY.to_string());

        let results = service.search_widget(params).await.unwrap();

        // "annika@..." starts with "ann"; the others match on full_name only.
        // Disabled users and Administrator are excluded.
        assert_eq!(
            names(&results),
            vec!["annika@example.com", "mark@example.com", "zoe@example.com"]
        );
    }

    #[tokio::test]
    async fn test_custom_query_can_be_registered() {
        let registry = QueryRegistry::new();
        registry.register("fruit_only", |store, args| async move {
            let query = ListQuery::new(vec!["name".into()])
                .filters(args.filters.with(FilterClause::new("item_group", FilterOp::Eq, json!("Fruit"))))
                .or_filters(vec![FilterClause::contains("name", &args.txt)]);
            store.list_filtered(&args.doctype, &query).await
        });
        assert!(registry.has_query("fruit_only"));
        assert_eq!(registry.query_count(), 1);
        assert_eq!(registry.list_queries(), vec!["fruit_only".to_string()]);

        let service = SearchService::new(Arc::new(item_store()), registry, PAGE_LENGTH);
        let mut params = raw("Item", "red");
        params.query = Some("fruit_only".to_string());

        let results = service.search_widget(params).await.unwrap();
        assert_eq!(names(&results), vec!["Red Apple", "Red Grape", "Pineapple Red"]);
    }

    #[tokio::test]
    async fn test_unknown_custom_query_fails() {
        let service = service_over(Arc::new(item_store()));
        let mut params = raw("Item", "red");
        params.query = Some("nope".to_string());

        let err = service.search_widget(params).await.unwrap_err();
        assert!(matches!(err, SearchError::UnknownQuery(ref q) if q == "nope"));
    }

    // ============================================================
    // HTTP TESTS
    // ============================================================

    async fn call(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn app() -> axum::Router {
        let state = AppState::new(Arc::new(item_store()), "http://localhost:8000", PAGE_LENGTH);
        build_router(state)
    }

    #[tokio::test]
    async fn test_http_search_link() {
        let request = Request::get("/api/method/search_link?doctype=Item&txt=grape")
            .body(Body::empty())
            .unwrap();

        let (status, body) = call(app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"results": [{"value": "Red Grape", "description": ""}]}));
    }

    #[tokio::test]
    async fn test_http_search_widget_rows_and_dicts() {
        let rows = Request::get("/api/method/search_widget?doctype=Item&txt=pie")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(app(), rows).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"values": [["Apple Pie"]]}));

        let dicts = Request::post("/api/method/search_widget")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({
                    "doctype": "Item",
                    "txt": "",
                    "filters": {"item_group": "Bakery"},
                    "as_dict": true,
                })
                .to_string(),
            ))
            .unwrap();
        let (status, body) = call(app(), dicts).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"values": [{"name": "Apple Pie"}]}));
    }

    #[tokio::test]
    async fn test_http_invalid_search_field_is_data_error() {
        let request = Request::get("/api/method/search_link?doctype=Item&txt=a&searchfield=name%3B")
            .body(Body::empty())
            .unwrap();

        let (status, body) = call(app(), request).await;

        assert_eq!(status, StatusCode::EXPECTATION_FAILED);
        assert_eq!(body["exc_type"], "DataError");
        assert_eq!(body["message"], "Invalid Search Field name;");
    }
}
