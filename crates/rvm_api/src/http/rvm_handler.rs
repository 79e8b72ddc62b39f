use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use common::domain::DomainError;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{ApiError, DeviceResponse};
use crate::domain::{DeviceQuery, RvmService};

type RvmState = Arc<RvmService>;

/// Query string as ordered name/value pairs, so repeated names keep their order
type QueryPairs = Query<Vec<(String, String)>>;

/// Read-only routes for the device catalog; both slash styles are accepted
pub fn rvm_routes(service: Arc<RvmService>) -> Router {
    Router::new()
        .route("/rvms", get(list_rvms))
        .route("/rvms/", get(list_rvms))
        .route("/rvms/:id", get(get_rvm))
        .route("/rvms/:id/", get(get_rvm))
        .with_state(service)
}

#[instrument(name = "ListRvms", skip(service, params))]
async fn list_rvms(
    State(service): State<RvmState>,
    Query(params): QueryPairs,
) -> Result<Json<Vec<DeviceResponse>>, ApiError> {
    let query = DeviceQuery::from_params(params);

    let devices = service.list_devices_now(&query).await?;
    debug!(count = devices.len(), "listed rvms");

    Ok(Json(devices.into_iter().map(DeviceResponse::from).collect()))
}

#[instrument(name = "GetRvm", skip(service, params), fields(id = %id))]
async fn get_rvm(
    State(service): State<RvmState>,
    Path(id): Path<String>,
    Query(params): QueryPairs,
) -> Result<Json<DeviceResponse>, ApiError> {
    // A non-numeric id cannot name a device, so it is a miss rather than a bad request
    let device_id: i64 = id
        .parse()
        .map_err(|_| DomainError::DeviceNotFound(id.clone()))?;
    let query = DeviceQuery::from_params(params);

    let device = service.get_device_now(device_id, &query).await?;

    Ok(Json(device.into()))
}
