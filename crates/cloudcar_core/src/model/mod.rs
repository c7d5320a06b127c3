//! Dealership domain model.
//!
//! # Responsibility
//! - Define the four persisted records and their JSON wire shapes.
//! - Validate raw create/update payloads into write-ready drafts.
//!
//! # Invariants
//! - Every record is identified by a storage-assigned `i64` id.
//! - Wire attribute names are Portuguese (`nome`, `clienteId`, ...);
//!   Rust field names are English.

pub mod customer;
pub mod financing;
pub mod sale;
pub mod test_drive;
pub mod validation;
