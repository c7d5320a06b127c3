//! `/api/testdrives` handlers.

use crate::error::ApiError;
use crate::store::Store;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use cloudcar_core::{
    NewTestDrive, SqliteTestDriveRepository, TestDrive, TestDriveService, TestDriveWithCustomer,
};

pub(super) async fn list(
    State(store): State<Store>,
) -> Result<Json<Vec<TestDriveWithCustomer>>, ApiError> {
    let bookings = store
        .run(|conn| {
            TestDriveService::new(SqliteTestDriveRepository::try_new(conn)?).list_test_drives()
        })
        .await?;
    Ok(Json(bookings))
}

pub(super) async fn create(
    State(store): State<Store>,
    payload: Result<Json<NewTestDrive>, JsonRejection>,
) -> Result<(StatusCode, Json<TestDrive>), ApiError> {
    let Json(input) = payload?;
    let booking = store
        .run(move |conn| {
            TestDriveService::new(SqliteTestDriveRepository::try_new(conn)?)
                .book_test_drive(&input)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}
