use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::domain::{AssetId, AssetRegistration, AssetUpdate};
use super::InventoryService;
use crate::error::AppError;
use crate::http::{blocking, respond};
use crate::store::Store;

/// Router builder for the asset catalogue.
pub fn inventory_router<S>(service: Arc<InventoryService<S>>) -> Router
where
    S: Store + 'static,
{
    Router::new()
        .route(
            "/api/v1/assets",
            get(list_handler::<S>).post(register_handler::<S>),
        )
        .route(
            "/api/v1/assets/:asset_id",
            get(get_handler::<S>)
                .put(update_handler::<S>)
                .delete(remove_handler::<S>),
        )
        .with_state(service)
}

fn asset_id(path: Result<Path<u64>, PathRejection>) -> Result<AssetId, AppError> {
    path.map(|Path(asset_id)| AssetId(asset_id))
        .map_err(AppError::from)
}

pub(crate) async fn register_handler<S: Store + 'static>(
    State(service): State<Arc<InventoryService<S>>>,
    registration: Result<Json<AssetRegistration>, JsonRejection>,
) -> Response {
    let registration = match registration {
        Ok(Json(registration)) => registration,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };
    respond(
        StatusCode::CREATED,
        blocking(move || service.register(registration)).await,
    )
}

pub(crate) async fn list_handler<S: Store + 'static>(
    State(service): State<Arc<InventoryService<S>>>,
) -> Response {
    respond(StatusCode::OK, blocking(move || service.list()).await)
}

pub(crate) async fn get_handler<S: Store + 'static>(
    State(service): State<Arc<InventoryService<S>>>,
    path: Result<Path<u64>, PathRejection>,
) -> Response {
    let asset_id = match asset_id(path) {
        Ok(asset_id) => asset_id,
        Err(err) => return err.into_response(),
    };
    respond(StatusCode::OK, blocking(move || service.get(asset_id)).await)
}

pub(crate) async fn update_handler<S: Store + 'static>(
    State(service): State<Arc<InventoryService<S>>>,
    path: Result<Path<u64>, PathRejection>,
    update: Result<Json<AssetUpdate>, JsonRejection>,
) -> Response {
    let asset_id = match asset_id(path) {
        Ok(asset_id) => asset_id,
        Err(err) => return err.into_response(),
    };
    let update = match update {
        Ok(Json(update)) => update,
        Err(rejection) => return AppError::from(rejection).into_response(),
    };
    respond(
        StatusCode::OK,
        blocking(move || service.update(asset_id, update)).await,
    )
}

pub(crate) async fn remove_handler<S: Store + 'static>(
    State(service): State<Arc<InventoryService<S>>>,
    path: Result<Path<u64>, PathRejection>,
) -> Response {
    let asset_id = match asset_id(path) {
        Ok(asset_id) => asset_id,
        Err(err) => return err.into_response(),
    };
    match blocking(move || service.remove(asset_id)).await {
        Ok(()) => {
            let payload = json!({ "message": "Asset deleted successfully" });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => err.into_response(),
    }
}
