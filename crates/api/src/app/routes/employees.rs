use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};

use ers_auth::{Role, require_role};
use ers_core::EmployeeRecordId;
use ers_directory::{CreateEmployee, DirectoryService};

use crate::app::dto::{EmployeeListQuery, EmployeeResponse};
use crate::app::errors::ApiResult;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_employees).post(create_employee))
        .route("/:id", get(get_employee).delete(delete_employee))
}

pub async fn create_employee(
    Extension(directory): Extension<Arc<DirectoryService>>,
    principal: PrincipalContext,
    body: Result<Json<CreateEmployee>, JsonRejection>,
) -> ApiResult<Json<EmployeeResponse>> {
    let Json(cmd) = body?;
    let record = directory.create(principal.principal(), cmd).await?;
    Ok(Json(record.into()))
}

pub async fn get_employee(
    Extension(directory): Extension<Arc<DirectoryService>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<Json<EmployeeResponse>> {
    let id: EmployeeRecordId = id.parse()?;
    let record = directory.get(principal.principal(), id).await?;
    Ok(Json(record.into()))
}

/// Role is checked before the query string so an employee is refused the same
/// way whatever filter they send.
pub async fn list_employees(
    Extension(directory): Extension<Arc<DirectoryService>>,
    principal: PrincipalContext,
    query: Result<Query<EmployeeListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<EmployeeResponse>>> {
    require_role(principal.principal(), Role::Manager, "Only managers can list employees")?;
    let Query(q) = query?;

    let records = directory.list(principal.principal(), q.manager_id).await?;
    Ok(Json(records.into_iter().map(EmployeeResponse::from).collect()))
}

pub async fn delete_employee(
    Extension(directory): Extension<Arc<DirectoryService>>,
    principal: PrincipalContext,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id: EmployeeRecordId = id.parse()?;
    directory.delete(principal.principal(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
