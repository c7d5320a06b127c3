//! Financing request service.

use crate::model::financing::{
    FinancingId, FinancingRequest, FinancingWithCustomer, NewFinancingRequest,
};
use crate::repo::financing_repo::{FinancingDeletion, FinancingRepository};
use crate::repo::{Entity, RepoError, RepoResult};
use crate::service::log_write;

pub struct FinancingService<R: FinancingRepository> {
    repo: R,
}

impl<R: FinancingRepository> FinancingService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_financing(&self) -> RepoResult<Vec<FinancingWithCustomer>> {
        self.repo.list_financing()
    }

    pub fn get_financing(&self, id: FinancingId) -> RepoResult<FinancingRequest> {
        self.repo.get_financing(id)?.ok_or(RepoError::NotFound {
            entity: Entity::Financing,
            id,
        })
    }

    pub fn submit_financing(&self, input: &NewFinancingRequest) -> RepoResult<FinancingRequest> {
        log_write(
            "financing_create",
            self.repo.create_financing(input),
            |financing| {
                format!(
                    "financing_id={} customer_id={} installments={}",
                    financing.id,
                    financing.customer_id,
                    financing.installments.months()
                )
            },
        )
    }

    /// Deletes a financing request, clearing the link on any sale it backs.
    pub fn delete_financing(&mut self, id: FinancingId) -> RepoResult<FinancingDeletion> {
        log_write(
            "financing_delete",
            self.repo.delete_financing(id),
            |deletion| {
                format!(
                    "financing_id={id} sales_unlinked={}",
                    deletion.sales_unlinked
                )
            },
        )
    }
}
