//! Customer use-case service.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::customer::{Customer, CustomerId, CustomerPatch, NewCustomer};
use crate::repo::customer_repo::{CustomerDeletion, CustomerRepository, FindOrCreate};
use crate::repo::{Entity, RepoError, RepoResult};
use crate::service::log_write;

/// Use-case service wrapper for customer operations.
pub struct CustomerService<R: CustomerRepository> {
    repo: R,
}

impl<R: CustomerRepository> CustomerService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_customers(&self) -> RepoResult<Vec<Customer>> {
        self.repo.list_customers()
    }

    /// Fetches one customer, failing with `NotFound` when absent.
    pub fn get_customer(&self, id: CustomerId) -> RepoResult<Customer> {
        self.repo.get_customer(id)?.ok_or(RepoError::NotFound {
            entity: Entity::Customer,
            id,
        })
    }

    pub fn create_customer(&self, input: &NewCustomer) -> RepoResult<Customer> {
        log_write(
            "customer_create",
            self.repo.create_customer(input),
            |customer| format!("customer_id={}", customer.id),
        )
    }

    /// Returns the customer owning the candidate's tax ID, creating it when
    /// no such customer exists yet.
    pub fn find_or_create_customer(&self, input: &NewCustomer) -> RepoResult<FindOrCreate> {
        log_write(
            "customer_find_or_create",
            self.repo.find_or_create_customer(input),
            |outcome| {
                format!(
                    "customer_id={} created={}",
                    outcome.customer.id, outcome.created
                )
            },
        )
    }

    pub fn update_customer(
        &mut self,
        id: CustomerId,
        patch: &CustomerPatch,
    ) -> RepoResult<Customer> {
        log_write(
            "customer_update",
            self.repo.update_customer(id, patch),
            |customer| format!("customer_id={}", customer.id),
        )
    }

    /// Deletes a customer together with its bookings and financing requests.
    ///
    /// Fails with `DeleteRestricted` while the customer owns sales.
    pub fn delete_customer(&mut self, id: CustomerId) -> RepoResult<CustomerDeletion> {
        log_write(
            "customer_delete",
            self.repo.delete_customer(id),
            |deletion| {
                format!(
                    "customer_id={id} test_drives_removed={} financing_removed={} sales_unlinked={}",
                    deletion.test_drives_removed, deletion.financing_removed, deletion.sales_unlinked
                )
            },
        )
    }
}
