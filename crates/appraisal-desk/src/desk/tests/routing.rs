use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::records::{UtilityItemDraft, UtilityItemType, APPRAISALS, LOCATIONS};

fn json_request(method: &str, uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

fn create_payload() -> Value {
    json!({
        "appraisal": serde_json::to_value(acme_draft()).expect("draft encodes"),
        "location": serde_json::to_value(metro_location()).expect("location encodes"),
    })
}

#[tokio::test]
async fn create_route_returns_new_id_and_detail_route_joins_location() {
    let (router, _, _) = desk_router();

    let response = router
        .clone()
        .oneshot(json_request("POST", "/api/v1/appraisals", create_payload()))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    let appraisal_id = payload["appraisal_id"]
        .as_str()
        .expect("appraisal id returned")
        .to_string();
    assert!(appraisal_id.starts_with("A-"));

    let response = router
        .oneshot(get(&format!("/api/v1/appraisals/{appraisal_id}")))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["appraisal"]["client_name"], json!("Acme"));
    assert_eq!(payload["location"]["county"], json!("Fulton"));
    assert_eq!(payload["location"]["property_type"], json!("Commercial"));
}

#[tokio::test]
async fn create_route_reports_backend_failure() {
    let (router, _, store) = desk_router();
    store.fail(APPRAISALS, Op::Insert);

    let response = router
        .oneshot(json_request("POST", "/api/v1/appraisals", create_payload()))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["error"],
        json!("Appraisal creation failed or did not return an ID.")
    );
    assert!(store.inner.is_empty(LOCATIONS));
}

#[tokio::test]
async fn detail_route_returns_not_found() {
    let (router, _, _) = desk_router();

    let response = router
        .oneshot(get("/api/v1/appraisals/A-404"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], json!("Appraisal with ID A-404 not found."));
}

#[tokio::test]
async fn list_route_surfaces_errors_alongside_empty_list() {
    let (router, desk, store) = desk_router();
    desk.create_appraisal_with_location(&acme_draft(), &metro_location())
        .await
        .expect("appraisal created");

    let response = router
        .clone()
        .oneshot(get("/api/v1/appraisals"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["appraisals"].as_array().map(Vec::len), Some(1));
    assert_eq!(payload["error"], Value::Null);

    store.fail(APPRAISALS, Op::Query);
    let response = router
        .oneshot(get("/api/v1/appraisals"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["appraisals"], json!([]));
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Failed to fetch appraisals"));
}

#[tokio::test]
async fn update_and_selection_routes_return_current_detail() {
    let (router, desk, _) = desk_router();
    let appraisal_id = desk
        .create_appraisal_with_location(&acme_draft(), &metro_location())
        .await
        .expect("appraisal created");

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/appraisals/{appraisal_id}"),
            json!({ "appraisal": { "status": "review_pending" } }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["appraisal"]["status"], json!("review_pending"));

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/appraisals/{appraisal_id}/report-selections"),
            json!({
                "selections": {
                    "standard_disclaimer_01": true,
                    "market_condition_text_block_A": false,
                }
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["appraisal"]["selected_for_report"],
        json!({ "standard_disclaimer_01": true })
    );

    let response = router
        .oneshot(json_request(
            "PUT",
            "/api/v1/appraisals/A-404",
            json!({ "appraisal": { "status": "final" } }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], json!("Failed to update appraisal A-404."));
}

#[tokio::test]
async fn log_routes_append_and_list_entries() {
    let (router, _, _) = desk_router();

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/appraisals/APP-001/logs",
            json!({
                "user_id": "user_admin_01",
                "action_description": "Appraisal created.",
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert!(payload["log_id"].is_string());

    let response = router
        .oneshot(get("/api/v1/appraisals/APP-001/logs"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let logs = payload["logs"].as_array().expect("logs listed");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["action_description"], json!("Appraisal created."));
}

#[tokio::test]
async fn utilities_route_filters_by_type_and_rejects_unknown_types() {
    let (router, desk, _) = desk_router();
    for (id, item_type, category) in [
        (
            "standard_disclaimer_01",
            UtilityItemType::SelectableDisclaimer,
            "Legal Disclaimers",
        ),
        (
            "market_condition_text_block_A",
            UtilityItemType::SelectableTextBlock,
            "Market Analysis",
        ),
    ] {
        let draft = UtilityItemDraft {
            utility_name: id.to_string(),
            item_type,
            content: "text".to_string(),
            category: Some(category.to_string()),
        };
        assert!(desk.utilities().create(id, &draft).await);
    }

    let response = router
        .clone()
        .oneshot(get("/api/v1/utilities"))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload["utility_items"].as_array().map(Vec::len), Some(2));

    let response = router
        .clone()
        .oneshot(get("/api/v1/utilities?type=selectable_disclaimer"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let items = payload["utility_items"].as_array().expect("items listed");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], json!("standard_disclaimer_01"));

    let response = router
        .clone()
        .oneshot(get("/api/v1/utilities?category=Market%20Analysis"))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(
        payload["utility_items"][0]["id"],
        json!("market_condition_text_block_A")
    );

    let response = router
        .oneshot(get("/api/v1/utilities?type=banner"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn desk_route_exposes_flags_and_last_error() {
    let (router, desk, _) = desk_router();
    desk.fetch_appraisal_with_location("A-404").await;

    let response = router
        .oneshot(get("/api/v1/desk"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["error"], json!("Appraisal with ID A-404 not found."));
    assert_eq!(payload["submitting"], json!(false));
    assert_eq!(payload["loading_current"], json!(false));
    assert_eq!(payload["current"]["appraisal"], Value::Null);
}
