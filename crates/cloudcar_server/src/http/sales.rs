//! `/api/vendas` handlers.

use crate::error::ApiError;
use crate::store::Store;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use cloudcar_core::{NewSale, Sale, SaleDetails, SaleService, SqliteSaleRepository};

pub(super) async fn list(State(store): State<Store>) -> Result<Json<Vec<SaleDetails>>, ApiError> {
    let sales = store
        .run(|conn| SaleService::new(SqliteSaleRepository::try_new(conn)?).list_sales())
        .await?;
    Ok(Json(sales))
}

pub(super) async fn create(
    State(store): State<Store>,
    payload: Result<Json<NewSale>, JsonRejection>,
) -> Result<(StatusCode, Json<Sale>), ApiError> {
    let Json(input) = payload?;
    let sale = store
        .run(move |conn| SaleService::new(SqliteSaleRepository::try_new(conn)?).record_sale(&input))
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}
