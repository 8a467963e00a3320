use super::request::{FlowRequest, ProductFlowParams, ReplacementMode, SubscriptionUpdate};
use crate::cache::CatalogCache;
use crate::config::SessionConfig;
use crate::error::{PurseError, Result};
use crate::model::{CatalogEntry, SubscriptionOffer};

/// Builds flow-launch requests from cached catalog entries.
///
/// Borrows the cache and the session config for the duration of one build,
/// so a request always reflects the config values current at build time.
/// Offer tokens are only ever copied from the cached entry.
pub struct FlowBuilder<'a> {
    catalog: &'a CatalogCache,
    config: &'a SessionConfig,
}

impl<'a> FlowBuilder<'a> {
    pub fn new(catalog: &'a CatalogCache, config: &'a SessionConfig) -> Self {
        Self { catalog, config }
    }

    /// Request for a single one-time product.
    pub fn one_time(&self, product_id: &str) -> Result<FlowRequest> {
        let entry = self.catalog.require(product_id)?;
        Ok(self.assemble(vec![plain(entry)], None))
    }

    /// Request for several one-time products bought together.
    pub fn consumable(&self, product_ids: &[String]) -> Result<FlowRequest> {
        if product_ids.is_empty() {
            return Err(PurseError::malformed("consumable purchase needs at least one product id"));
        }

        let products = product_ids
            .iter()
            .map(|id| self.catalog.require(id).map(plain))
            .collect::<Result<Vec<_>>>()?;

        Ok(self.assemble(products, None))
    }

    /// Request for a new subscription on the given base plan.
    pub fn subscription(&self, product_id: &str, base_plan_id: &str) -> Result<FlowRequest> {
        let (entry, offer) = self.select_offer(product_id, base_plan_id)?;
        Ok(self.assemble(vec![with_offer(entry, offer)], None))
    }

    /// Request replacing the subscription bought with `old_purchase_token`.
    ///
    /// A non-empty `external_transaction_id` switches the update parameters
    /// to the external-transaction shape.
    pub fn subscription_update(
        &self,
        product_id: &str,
        base_plan_id: &str,
        old_purchase_token: &str,
        external_transaction_id: Option<&str>,
        replacement_mode: ReplacementMode,
    ) -> Result<FlowRequest> {
        let (entry, offer) = self.select_offer(product_id, base_plan_id)?;

        if old_purchase_token.is_empty() {
            return Err(PurseError::malformed("subscription update needs the old purchase token"));
        }

        let update = match external_transaction_id.filter(|id| !id.is_empty()) {
            Some(external_transaction_id) => SubscriptionUpdate::ExternalTransaction {
                old_purchase_token: old_purchase_token.to_string(),
                external_transaction_id: external_transaction_id.to_string(),
                replacement_mode,
            },
            None => SubscriptionUpdate::OldTokenOnly {
                old_purchase_token: old_purchase_token.to_string(),
                replacement_mode,
            },
        };

        Ok(self.assemble(vec![with_offer(entry, offer)], Some(update)))
    }

    fn select_offer(
        &self,
        product_id: &str,
        base_plan_id: &str,
    ) -> Result<(&'a CatalogEntry, &'a SubscriptionOffer)> {
        let entry = self.catalog.require(product_id)?;

        if entry.subscription_offers.is_empty() {
            tracing::warn!(
                "[FlowBuilder] {} carries no subscription offers; is it a subscription product?",
                product_id
            );
            return Err(PurseError::offer_not_found(product_id, base_plan_id));
        }

        let offer = entry
            .offer_for_base_plan(base_plan_id)
            .ok_or_else(|| PurseError::offer_not_found(product_id, base_plan_id))?;

        Ok((entry, offer))
    }

    fn assemble(
        &self,
        products: Vec<ProductFlowParams>,
        subscription_update: Option<SubscriptionUpdate>,
    ) -> FlowRequest {
        FlowRequest {
            products,
            subscription_update,
            account_id: non_empty(&self.config.account_id),
            profile_id: non_empty(&self.config.profile_id),
            offer_personalized: self.config.personalized,
        }
    }
}

fn plain(entry: &CatalogEntry) -> ProductFlowParams {
    ProductFlowParams {
        product: entry.clone(),
        offer_token: None,
    }
}

fn with_offer(entry: &CatalogEntry, offer: &SubscriptionOffer) -> ProductFlowParams {
    ProductFlowParams {
        product: entry.clone(),
        offer_token: Some(offer.offer_token.clone()),
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
