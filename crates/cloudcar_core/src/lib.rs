//! Core domain logic for the CloudCar dealership back office.
//! This crate is the single source of truth for data-model invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{migrate_db, open_db, open_db_in_memory, DbError, DbResult, MigrationReport};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::customer::{
    Customer, CustomerDraft, CustomerId, CustomerPatch, NewCustomer, StateCode,
};
pub use model::financing::{
    FinancingId, FinancingRequest, FinancingWithCustomer, InstallmentTerm, NewFinancingRequest,
};
pub use model::sale::{NewSale, Sale, SaleDetails, SaleId};
pub use model::test_drive::{NewTestDrive, TestDrive, TestDriveId, TestDriveWithCustomer};
pub use model::validation::ValidationError;
pub use repo::customer_repo::{
    CustomerDeletion, CustomerRepository, FindOrCreate, SqliteCustomerRepository,
};
pub use repo::financing_repo::{
    FinancingDeletion, FinancingRepository, SqliteFinancingRepository,
};
pub use repo::sale_repo::{SaleRepository, SqliteSaleRepository};
pub use repo::test_drive_repo::{SqliteTestDriveRepository, TestDriveRepository};
pub use repo::{Entity, ErrorKind, RepoError, RepoResult};
pub use service::customer_service::CustomerService;
pub use service::financing_service::FinancingService;
pub use service::sale_service::SaleService;
pub use service::test_drive_service::TestDriveService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
