//! `/api/financiamentos` handlers.

use crate::error::ApiError;
use crate::store::Store;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use cloudcar_core::{
    FinancingRequest, FinancingService, FinancingWithCustomer, NewFinancingRequest,
    SqliteFinancingRepository,
};
use serde_json::{json, Value};

pub(super) async fn list(
    State(store): State<Store>,
) -> Result<Json<Vec<FinancingWithCustomer>>, ApiError> {
    let requests = store
        .run(|conn| FinancingService::new(SqliteFinancingRepository::try_new(conn)?).list_financing())
        .await?;
    Ok(Json(requests))
}

pub(super) async fn create(
    State(store): State<Store>,
    payload: Result<Json<NewFinancingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<FinancingRequest>), ApiError> {
    let Json(input) = payload?;
    let financing = store
        .run(move |conn| {
            FinancingService::new(SqliteFinancingRepository::try_new(conn)?)
                .submit_financing(&input)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(financing)))
}

/// Deletes the request; a sale it backed keeps existing without financing.
pub(super) async fn remove(
    State(store): State<Store>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = path?;
    store
        .run(move |conn| {
            FinancingService::new(SqliteFinancingRepository::try_new(conn)?).delete_financing(id)
        })
        .await?;
    Ok(Json(json!({ "mensagem": "Financiamento deletado com sucesso" })))
}
