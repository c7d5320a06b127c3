//! `/api/clientes` handlers.

use crate::error::ApiError;
use crate::store::Store;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use cloudcar_core::{Customer, CustomerPatch, CustomerService, NewCustomer, SqliteCustomerRepository};
use serde_json::{json, Value};

pub(super) async fn list(State(store): State<Store>) -> Result<Json<Vec<Customer>>, ApiError> {
    let customers = store
        .run(|conn| CustomerService::new(SqliteCustomerRepository::try_new(conn)?).list_customers())
        .await?;
    Ok(Json(customers))
}

pub(super) async fn get(
    State(store): State<Store>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Customer>, ApiError> {
    let Path(id) = path?;
    let customer = store
        .run(move |conn| {
            CustomerService::new(SqliteCustomerRepository::try_new(conn)?).get_customer(id)
        })
        .await?;
    Ok(Json(customer))
}

pub(super) async fn create(
    State(store): State<Store>,
    payload: Result<Json<NewCustomer>, JsonRejection>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let Json(input) = payload?;
    let customer = store
        .run(move |conn| {
            CustomerService::new(SqliteCustomerRepository::try_new(conn)?).create_customer(&input)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// 201 when the customer was inserted, 200 when it already existed.
pub(super) async fn find_or_create(
    State(store): State<Store>,
    payload: Result<Json<NewCustomer>, JsonRejection>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let Json(input) = payload?;
    let outcome = store
        .run(move |conn| {
            CustomerService::new(SqliteCustomerRepository::try_new(conn)?)
                .find_or_create_customer(&input)
        })
        .await?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome.customer)))
}

pub(super) async fn update(
    State(store): State<Store>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CustomerPatch>, JsonRejection>,
) -> Result<Json<Customer>, ApiError> {
    let Path(id) = path?;
    let Json(patch) = payload?;
    let customer = store
        .run(move |conn| {
            CustomerService::new(SqliteCustomerRepository::try_new(conn)?)
                .update_customer(id, &patch)
        })
        .await?;
    Ok(Json(customer))
}

pub(super) async fn remove(
    State(store): State<Store>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = path?;
    store
        .run(move |conn| {
            CustomerService::new(SqliteCustomerRepository::try_new(conn)?).delete_customer(id)
        })
        .await?;
    Ok(Json(json!({ "mensagem": "Cliente deletado com sucesso" })))
}
