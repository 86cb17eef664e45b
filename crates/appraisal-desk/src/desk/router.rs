use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::service::AppraisalDesk;
use crate::records::{
    AppraisalChanges, AppraisalDraft, LocationFields, LogEntryDraft, UtilityItemType,
};
use crate::store::DocumentStore;

/// Body of `POST /api/v1/appraisals`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAppraisalRequest {
    pub appraisal: AppraisalDraft,
    #[serde(default)]
    pub location: LocationFields,
}

/// Body of `PUT /api/v1/appraisals/:appraisal_id`.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAppraisalRequest {
    #[serde(default)]
    pub appraisal: AppraisalChanges,
    #[serde(default)]
    pub location_id: Option<String>,
    #[serde(default)]
    pub location: Option<LocationFields>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportSelectionsRequest {
    pub selections: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UtilityFilter {
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppendLogRequest {
    pub user_id: String,
    pub action_description: String,
    #[serde(default)]
    pub details: Option<Value>,
}

/// Router builder exposing the appraisal desk over HTTP.
pub fn appraisal_router<S>(desk: Arc<AppraisalDesk<S>>) -> Router
where
    S: DocumentStore + ?Sized + 'static,
{
    Router::new()
        .route(
            "/api/v1/appraisals",
            get(list_handler::<S>).post(create_handler::<S>),
        )
        .route(
            "/api/v1/appraisals/:appraisal_id",
            get(detail_handler::<S>).put(update_handler::<S>),
        )
        .route(
            "/api/v1/appraisals/:appraisal_id/report-selections",
            put(report_selections_handler::<S>),
        )
        .route(
            "/api/v1/appraisals/:appraisal_id/logs",
            get(logs_handler::<S>).post(append_log_handler::<S>),
        )
        .route("/api/v1/utilities", get(utilities_handler::<S>))
        .route("/api/v1/desk", get(desk_handler::<S>))
        .with_state(desk)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({ "error": message.into() });
    (status, axum::Json(payload)).into_response()
}

/// Last recorded failure, or a generic message when a concurrent operation
/// already cleared it.
fn failure_message(last_error: Option<String>, fallback: &str) -> String {
    last_error.unwrap_or_else(|| fallback.to_string())
}

pub(crate) async fn list_handler<S>(State(desk): State<Arc<AppraisalDesk<S>>>) -> Response
where
    S: DocumentStore + ?Sized + 'static,
{
    let appraisals = desk.fetch_all_appraisals().await;
    let payload = json!({
        "appraisals": appraisals,
        "error": desk.last_error(),
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn create_handler<S>(
    State(desk): State<Arc<AppraisalDesk<S>>>,
    axum::Json(request): axum::Json<CreateAppraisalRequest>,
) -> Response
where
    S: DocumentStore + ?Sized + 'static,
{
    match desk
        .create_appraisal_with_location(&request.appraisal, &request.location)
        .await
    {
        Some(appraisal_id) => {
            let payload = json!({ "appraisal_id": appraisal_id });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        None => error_response(
            StatusCode::BAD_GATEWAY,
            failure_message(desk.last_error(), "appraisal creation failed"),
        ),
    }
}

pub(crate) async fn detail_handler<S>(
    State(desk): State<Arc<AppraisalDesk<S>>>,
    Path(appraisal_id): Path<String>,
) -> Response
where
    S: DocumentStore + ?Sized + 'static,
{
    let detail = desk.fetch_appraisal_with_location(&appraisal_id).await;
    if detail.appraisal.is_none() {
        return error_response(
            StatusCode::NOT_FOUND,
            failure_message(desk.last_error(), "appraisal not found"),
        );
    }
    (StatusCode::OK, axum::Json(detail)).into_response()
}

pub(crate) async fn update_handler<S>(
    State(desk): State<Arc<AppraisalDesk<S>>>,
    Path(appraisal_id): Path<String>,
    axum::Json(request): axum::Json<UpdateAppraisalRequest>,
) -> Response
where
    S: DocumentStore + ?Sized + 'static,
{
    let updated = desk
        .update_appraisal_with_location(
            &appraisal_id,
            &request.appraisal,
            request.location_id.as_deref(),
            request.location.as_ref(),
        )
        .await;

    if !updated {
        return error_response(
            StatusCode::BAD_GATEWAY,
            failure_message(desk.last_error(), "appraisal update failed"),
        );
    }
    (StatusCode::OK, axum::Json(desk.snapshot().current)).into_response()
}

pub(crate) async fn report_selections_handler<S>(
    State(desk): State<Arc<AppraisalDesk<S>>>,
    Path(appraisal_id): Path<String>,
    axum::Json(request): axum::Json<ReportSelectionsRequest>,
) -> Response
where
    S: DocumentStore + ?Sized + 'static,
{
    if !desk
        .update_report_selections(&appraisal_id, &request.selections)
        .await
    {
        return error_response(
            StatusCode::BAD_GATEWAY,
            failure_message(desk.last_error(), "report selection update failed"),
        );
    }
    (StatusCode::OK, axum::Json(desk.snapshot().current)).into_response()
}

pub(crate) async fn logs_handler<S>(
    State(desk): State<Arc<AppraisalDesk<S>>>,
    Path(appraisal_id): Path<String>,
) -> Response
where
    S: DocumentStore + ?Sized + 'static,
{
    let logs = desk.logs().get_by_appraisal_id(&appraisal_id).await;
    let payload = json!({
        "appraisal_id": appraisal_id,
        "logs": logs,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn append_log_handler<S>(
    State(desk): State<Arc<AppraisalDesk<S>>>,
    Path(appraisal_id): Path<String>,
    axum::Json(request): axum::Json<AppendLogRequest>,
) -> Response
where
    S: DocumentStore + ?Sized + 'static,
{
    let entry = LogEntryDraft {
        appraisal_id,
        user_id: request.user_id,
        action_description: request.action_description,
        details: request.details,
    };
    match desk.logs().create(&entry).await {
        Some(log_id) => {
            let payload = json!({ "log_id": log_id });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        None => error_response(StatusCode::BAD_GATEWAY, "failed to record appraisal log"),
    }
}

pub(crate) async fn utilities_handler<S>(
    State(desk): State<Arc<AppraisalDesk<S>>>,
    Query(filter): Query<UtilityFilter>,
) -> Response
where
    S: DocumentStore + ?Sized + 'static,
{
    let item_type = match filter.item_type.as_deref() {
        Some(raw) => match UtilityItemType::parse(raw) {
            Some(item_type) => Some(item_type),
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("unknown utility item type '{raw}'"),
                )
            }
        },
        None => None,
    };

    let (items, error) = match (item_type, filter.category.as_deref()) {
        (None, None) => {
            let items = desk.fetch_all_utility_items().await;
            (items, desk.last_error())
        }
        (Some(item_type), category) => {
            let mut items = desk.utilities().get_by_type(item_type).await;
            if let Some(category) = category {
                items.retain(|item| item.category.as_deref() == Some(category));
            }
            (items, None)
        }
        (None, Some(category)) => (desk.utilities().get_by_category(category).await, None),
    };

    let payload = json!({
        "utility_items": items,
        "error": error,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn desk_handler<S>(State(desk): State<Arc<AppraisalDesk<S>>>) -> Response
where
    S: DocumentStore + ?Sized + 'static,
{
    (StatusCode::OK, axum::Json(desk.snapshot())).into_response()
}
