use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use ers_core::ReimbursementId;
use ers_reimbursement::{CreateReimbursement, Decision, Reimbursement, ReimbursementService};

use crate::app::dto::{DeleteQuery, ReimbursementListQuery, ReimbursementResponse};
use crate::app::errors::ApiResult;
use crate::authz;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_reimbursements).post(create_reimbursement))
        .route("/:id", get(get_reimbursement).delete(delete_reimbursement))
        .route("/:id/approve", put(approve_reimbursement))
        .route("/:id/reject", put(reject_reimbursement))
}

pub async fn create_reimbursement(
    Extension(reimbursements): Extension<Arc<ReimbursementService>>,
    body: Result<Json<CreateReimbursement>, JsonRejection>,
) -> ApiResult<Json<ReimbursementResponse>> {
    let Json(cmd) = body?;
    let record = reimbursements.create(cmd).await?;
    Ok(Json(ReimbursementResponse::from(&record)))
}

pub async fn get_reimbursement(
    Extension(reimbursements): Extension<Arc<ReimbursementService>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReimbursementResponse>> {
    let id: ReimbursementId = id.parse()?;
    let record = reimbursements.get(id).await?;
    Ok(Json(ReimbursementResponse::from(&record)))
}

pub async fn list_reimbursements(
    Extension(reimbursements): Extension<Arc<ReimbursementService>>,
    query: Result<Query<ReimbursementListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ReimbursementResponse>>> {
    let Query(q) = query?;
    let records = match (q.employee_id, q.manager_id) {
        (Some(employee_id), _) => reimbursements.list_by_employee(employee_id).await?,
        (None, Some(manager_id)) => reimbursements.list_by_manager(manager_id).await?,
        (None, None) => reimbursements.list_all().await?,
    };
    Ok(Json(to_responses(&records)))
}

pub async fn approve_reimbursement(
    Extension(reimbursements): Extension<Arc<ReimbursementService>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<Json<ReimbursementResponse>> {
    decide(reimbursements, principal, id, Decision::Approve).await
}

pub async fn reject_reimbursement(
    Extension(reimbursements): Extension<Arc<ReimbursementService>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<Json<ReimbursementResponse>> {
    decide(reimbursements, principal, id, Decision::Reject).await
}

async fn decide(
    reimbursements: Arc<ReimbursementService>,
    principal: PrincipalContext,
    id: String,
    decision: Decision,
) -> ApiResult<Json<ReimbursementResponse>> {
    let id: ReimbursementId = id.parse()?;
    let current = reimbursements.get(id).await?;
    let acting = authz::ensure_assigned_manager(principal.principal(), &current, decision)?;

    let record = match decision {
        Decision::Approve => reimbursements.approve(id, acting).await?,
        Decision::Reject => reimbursements.reject(id, acting).await?,
    };
    Ok(Json(ReimbursementResponse::from(&record)))
}

pub async fn delete_reimbursement(
    Extension(reimbursements): Extension<Arc<ReimbursementService>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> ApiResult<StatusCode> {
    let id: ReimbursementId = id.parse()?;
    let Query(q) = query?;
    let actor = authz::resolve_delete_actor(principal.principal(), q.actor_id)?;

    reimbursements.delete(id, actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn to_responses(records: &[Reimbursement]) -> Vec<ReimbursementResponse> {
    records.iter().map(ReimbursementResponse::from).collect()
}
