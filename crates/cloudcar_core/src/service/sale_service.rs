//! Sale service.

use crate::model::sale::{NewSale, Sale, SaleDetails, SaleId};
use crate::repo::sale_repo::SaleRepository;
use crate::repo::{Entity, RepoError, RepoResult};
use crate::service::log_write;

pub struct SaleService<R: SaleRepository> {
    repo: R,
}

impl<R: SaleRepository> SaleService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Lists sales with customer and optional financing request inlined.
    pub fn list_sales(&self) -> RepoResult<Vec<SaleDetails>> {
        self.repo.list_sales()
    }

    pub fn get_sale(&self, id: SaleId) -> RepoResult<Sale> {
        self.repo.get_sale(id)?.ok_or(RepoError::NotFound {
            entity: Entity::Sale,
            id,
        })
    }

    pub fn record_sale(&mut self, input: &NewSale) -> RepoResult<Sale> {
        log_write("sale_create", self.repo.create_sale(input), |sale| {
            format!(
                "sale_id={} customer_id={} financing_id={}",
                sale.id,
                sale.customer_id,
                sale.financing_id
                    .map_or_else(|| "none".to_string(), |id| id.to_string())
            )
        })
    }
}
