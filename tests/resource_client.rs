//! Entity resource client behavior over a scripted transport.

mod common;

use std::sync::Arc;

use autotask_client::catalog;
use autotask_client::{
    AutotaskError, Capabilities, FilterClause, FilterInput, ListTransport, PageSizeKey,
    QuerySpec, Record, ResourceConfig,
};
use common::{client, ScriptedTransport, BASE_URL};
use pretty_assertions::assert_eq;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_test::assert_ok;

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => panic!("not an object"),
    }
}

#[tokio::test]
async fn list_without_query_sends_match_all_filter_once() {
    let transport = Arc::new(ScriptedTransport::new().respond(
        200,
        json!({"items": [{"id": 1}, {"id": 2}], "pageDetails": {"count": 2, "requestCount": 500}}),
    ));

    let tickets = assert_ok!(client(&transport).tickets().list(QuerySpec::new()).await);

    assert_eq!(tickets.len(), 2);
    assert_eq!(transport.calls(), 1);

    let request = &transport.requests()[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.url, format!("{}/Tickets/query", BASE_URL));
    assert_eq!(
        request.body,
        Some(json!({"filter": [{"op": "gte", "field": "id", "value": 0}]}))
    );
}

#[tokio::test]
async fn list_body_uses_each_resources_page_size_key() {
    let cases = [
        (&catalog::TICKETS, "MaxRecords"),
        (&catalog::TIME_OFF_REQUESTS, "maxRecords"),
        (&catalog::PRICE_LIST_SERVICES, "maxRecords"),
    ];

    for (config, key) in cases {
        let transport = Arc::new(ScriptedTransport::new().respond(200, json!({"items": []})));
        let query = QuerySpec::new()
            .with_filter(FilterInput::from_value(json!({"name": "test"})).unwrap())
            .with_sort("id")
            .with_page(1)
            .with_page_size(10);

        client(&transport)
            .resource::<Record>(config)
            .list(query)
            .await
            .unwrap();

        let mut expected = serde_json::Map::new();
        expected.insert(
            "filter".into(),
            json!([{"op": "eq", "field": "name", "value": "test"}]),
        );
        expected.insert("sort".into(), json!("id"));
        expected.insert("page".into(), json!(1));
        expected.insert(key.into(), json!(10));

        assert_eq!(transport.requests()[0].body, Some(Value::Object(expected)));
    }
}

#[tokio::test]
async fn lookup_resources_list_with_get_search() {
    let transport = Arc::new(
        ScriptedTransport::new().respond(200, json!({"items": [{"id": 1, "name": "Denmark"}]})),
    );

    let query = QuerySpec::new()
        .with_filter(FilterClause::eq("name", "Denmark"))
        .with_page_size(5);
    let countries = client(&transport).countries().list(query).await.unwrap();

    assert_eq!(countries[0]["name"], json!("Denmark"));

    let request = &transport.requests()[0];
    assert_eq!(request.method, Method::GET);
    assert!(request.body.is_none());

    let prefix = format!("{}/Countries/query?search=", BASE_URL);
    assert!(request.url.starts_with(&prefix), "{}", request.url);
    let search = urlencoding::decode(&request.url[prefix.len()..]).unwrap();
    let search: Value = serde_json::from_str(&search).unwrap();
    assert_eq!(
        search,
        json!({
            "filter": [{"op": "eq", "field": "name", "value": "Denmark"}],
            "pageSize": 5
        })
    );
}

#[tokio::test]
async fn invalid_ids_fail_before_any_request() {
    let transport = Arc::new(ScriptedTransport::new());
    let tickets = client(&transport).tickets();

    for id in [0, -1] {
        let err = tickets.get(id).await.unwrap_err();
        assert!(matches!(err, AutotaskError::Validation(_)));
    }
    assert!(matches!(
        tickets.update(0, &Record::new()).await,
        Err(AutotaskError::Validation(_))
    ));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn create_null_fails_before_any_request() {
    let transport = Arc::new(ScriptedTransport::new());

    let err = client(&transport)
        .resource::<Value>(&catalog::TICKETS)
        .create(&Value::Null)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "validation error: record is required");
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn malformed_filter_fails_before_any_request() {
    let transport = Arc::new(ScriptedTransport::new());

    let filter = FilterInput::from_value(json!({"status": {"between": [1, 2]}})).unwrap();
    let err = client(&transport)
        .tickets()
        .list(QuerySpec::new().with_filter(filter))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "validation");
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn get_unwraps_item_envelope() {
    let transport = Arc::new(
        ScriptedTransport::new().respond(200, json!({"item": {"id": 42, "title": "VPN down"}})),
    );

    let ticket = client(&transport).tickets().get(42).await.unwrap();

    assert_eq!(ticket, record(json!({"id": 42, "title": "VPN down"})));
    assert_eq!(transport.requests()[0].url, format!("{}/Tickets/42", BASE_URL));
}

#[tokio::test]
async fn get_null_item_is_not_found() {
    let transport = Arc::new(ScriptedTransport::new().respond(200, json!({"item": null})));

    let err = client(&transport).tickets().get(42).await.unwrap_err();

    assert_eq!(err.kind(), "not_found");
}

#[tokio::test]
async fn delete_resolves_empty_and_maps_404() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(200, json!({"itemId": 5}))
            .respond(404, json!({"errors": ["no such record"]})),
    );
    let charges = client(&transport).ticket_charges();

    assert_ok!(charges.delete(5).await);

    let err = charges.delete(6).await.unwrap_err();
    assert!(matches!(err, AutotaskError::NotFound { ref path } if path == "/TicketCharges/6"));

    let requests = transport.requests();
    assert_eq!(requests[0].method, Method::DELETE);
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn unsupported_operations_are_rejected_locally() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = client(&transport);

    let err = client
        .time_off_requests()
        .patch(3, &json!({"status": 2}))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "TimeOffRequests does not support patch");

    let err = client.tickets().delete(3).await.unwrap_err();
    assert_eq!(err.kind(), "unsupported");

    let err = client.countries().create(&Record::new()).await.unwrap_err();
    assert_eq!(err.kind(), "unsupported");

    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn create_follows_item_id_with_get() {
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(200, json!({"itemId": 900}))
            .respond(200, json!({"item": {"id": 900, "title": "New"}})),
    );

    let created = client(&transport)
        .tickets()
        .create(&record(json!({"title": "New"})))
        .await
        .unwrap();

    assert_eq!(created, record(json!({"id": 900, "title": "New"})));

    let requests = transport.requests();
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].body, Some(json!({"title": "New"})));
    assert_eq!(requests[1].method, Method::GET);
    assert_eq!(requests[1].url, format!("{}/Tickets/900", BASE_URL));
}

#[tokio::test]
async fn patch_sends_partial_body_and_unwraps_flat_response() {
    let transport = Arc::new(
        ScriptedTransport::new().respond(200, json!({"id": 8, "status": 5, "title": "Done"})),
    );

    let patched = client(&transport)
        .tickets()
        .patch(8, &json!({"status": 5}))
        .await
        .unwrap();

    assert_eq!(patched["status"], json!(5));
    let request = &transport.requests()[0];
    assert_eq!(request.method, Method::PATCH);
    assert_eq!(request.url, format!("{}/Tickets/8", BASE_URL));
    assert_eq!(request.body, Some(json!({"status": 5})));
}

#[tokio::test]
async fn list_all_follows_next_page_links() {
    let next = format!("{}/Tickets/query/next?paging=abc", BASE_URL);
    let transport = Arc::new(
        ScriptedTransport::new()
            .respond(
                200,
                json!({"items": [{"id": 1}], "pageDetails": {"count": 1, "nextPageUrl": next}}),
            )
            .respond(
                200,
                json!({"items": [{"id": 2}], "pageDetails": {"count": 1, "nextPageUrl": null}}),
            ),
    );

    let all = client(&transport)
        .tickets()
        .list_all(QuerySpec::new())
        .await
        .unwrap();

    let ids: Vec<Value> = all.iter().map(|r| r["id"].clone()).collect();
    assert_eq!(ids, vec![json!(1), json!(2)]);

    let requests = transport.requests();
    assert_eq!(requests[1].method, Method::GET);
    assert_eq!(requests[1].url, next);
}

#[tokio::test]
async fn list_all_rejects_foreign_next_page() {
    let transport = Arc::new(ScriptedTransport::new().respond(
        200,
        json!({"items": [{"id": 1}], "pageDetails": {"nextPageUrl": "https://evil.example/steal"}}),
    ));

    let err = client(&transport)
        .tickets()
        .list_all(QuerySpec::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "validation");
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn count_posts_filter_only() {
    let transport = Arc::new(ScriptedTransport::new().respond(200, json!({"queryCount": 17})));

    let query = QuerySpec::new()
        .with_filter(FilterClause::eq("status", 1))
        .with_page_size(50);
    let count = client(&transport).tickets().count(query).await.unwrap();

    assert_eq!(count, 17);
    let request = &transport.requests()[0];
    assert_eq!(request.url, format!("{}/Tickets/query/count", BASE_URL));
    assert_eq!(
        request.body,
        Some(json!({"filter": [{"op": "eq", "field": "status", "value": 1}]}))
    );
}

#[tokio::test]
async fn missing_collection_is_a_client_error() {
    let transport = Arc::new(ScriptedTransport::new().respond_empty(404));

    let err = client(&transport)
        .tickets()
        .list(QuerySpec::new())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.kind(), "client_request");
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Holiday {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    holiday_name: String,
    holiday_set_id: i64,
}

static HOLIDAYS_NO_GET: ResourceConfig = ResourceConfig {
    name: "Holidays",
    path: "/Holidays",
    capabilities: Capabilities {
        get: false,
        ..Capabilities::ALL
    },
    page_size_key: PageSizeKey::MaxRecords,
    list_transport: ListTransport::PostQuery,
};

#[tokio::test]
async fn typed_records_round_trip_through_the_client() {
    let transport = Arc::new(ScriptedTransport::new().respond(
        200,
        json!({"item": {"id": 3, "holidayName": "Midsummer", "holidaySetId": 1}}),
    ));

    let holiday = client(&transport)
        .resource::<Holiday>(&catalog::HOLIDAYS)
        .update(
            3,
            &Holiday {
                id: Some(3),
                holiday_name: "Midsummer".to_string(),
                holiday_set_id: 1,
            },
        )
        .await
        .unwrap();

    assert_eq!(holiday.holiday_name, "Midsummer");
    assert_eq!(
        transport.requests()[0].body,
        Some(json!({"id": 3, "holidayName": "Midsummer", "holidaySetId": 1}))
    );
}

#[tokio::test]
async fn item_id_without_get_capability_returns_id_only() {
    let transport = Arc::new(ScriptedTransport::new().respond(200, json!({"itemId": 77})));

    let created = client(&transport)
        .resource::<Record>(&HOLIDAYS_NO_GET)
        .create(&record(json!({"holidayName": "Yule"})))
        .await
        .unwrap();

    assert_eq!(created, record(json!({"id": 77})));
    assert_eq!(transport.calls(), 1);
}

#[test]
fn describe_operations_needs_no_transport() {
    let names: Vec<&str> = catalog::TIME_OFF_REQUESTS
        .describe_operations()
        .iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, vec!["create", "get", "delete", "list", "count"]);
}
