//! The marketplace state machine
//!
//! One flat store: an asset map keyed by id, purchase and feedback relations
//! keyed by (asset, buyer), and the registration counter. Every operation
//! takes the caller principal explicitly and is atomic: all validation runs
//! before the first write, so a returned error leaves the state untouched.

use crate::error::{MarketError, Result};
use crate::identity::Principal;
use crate::registry::validation;
use crate::registry::{Asset, AssetDraft, AssetId, AssetUpdate, FeedbackRecord, PurchaseRecord};
use crate::settlement::{Ledger, RoyaltySplit};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Marketplace {
    assets: HashMap<AssetId, Asset>,
    purchases: HashMap<(AssetId, Principal), PurchaseRecord>,
    feedback: HashMap<(AssetId, Principal), FeedbackRecord>,
    /// Count of successful registrations; also the last assigned id.
    registered: u64,
}

impl Marketplace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a marketplace from persisted records.
    pub fn from_parts(
        assets: Vec<Asset>,
        purchases: Vec<PurchaseRecord>,
        feedback: Vec<FeedbackRecord>,
        registered: u64,
    ) -> Self {
        Marketplace {
            assets: assets.into_iter().map(|a| (a.id, a)).collect(),
            purchases: purchases
                .into_iter()
                .map(|p| ((p.asset_id, p.buyer), p))
                .collect(),
            feedback: feedback
                .into_iter()
                .map(|f| ((f.asset_id, f.buyer), f))
                .collect(),
            registered,
        }
    }

    // ------------------------------------------------------------------
    // State-changing operations
    // ------------------------------------------------------------------

    /// Register a new asset for sale. Returns the assigned id.
    pub fn register_asset(&mut self, caller: Principal, draft: AssetDraft) -> Result<AssetId> {
        validation::check_draft(&draft)?;

        let id = self.registered + 1;
        self.assets.insert(id, Asset::register(id, caller, draft));
        self.registered = id;

        tracing::info!(asset_id = id, "asset.registered");
        Ok(id)
    }

    /// Replace the mutable fields of an asset. Vendor-only.
    pub fn modify_asset(
        &mut self,
        caller: Principal,
        id: AssetId,
        update: AssetUpdate,
    ) -> Result<()> {
        let asset = self
            .assets
            .get_mut(&id)
            .ok_or(MarketError::AssetNotFound(id))?;
        if asset.vendor != caller {
            return Err(MarketError::Unauthorized);
        }
        validation::check_update(&update)?;

        asset.apply_update(update);
        tracing::info!(asset_id = id, "asset.modified");
        Ok(())
    }

    /// Take an asset off the market. Vendor-only.
    pub fn deactivate_asset(&mut self, caller: Principal, id: AssetId) -> Result<()> {
        let asset = self
            .assets
            .get_mut(&id)
            .ok_or(MarketError::AssetNotFound(id))?;
        if asset.vendor != caller {
            return Err(MarketError::Unauthorized);
        }

        asset.active = false;
        tracing::info!(asset_id = id, "asset.deactivated");
        Ok(())
    }

    /// Put a previously acquired asset back on the market at a new price.
    /// The caller becomes the vendor for future sales; royalties keep
    /// flowing to the original creator.
    pub fn relist_asset(&mut self, caller: Principal, id: AssetId, new_price: u64) -> Result<()> {
        if !self.assets.contains_key(&id) {
            return Err(MarketError::AssetNotFound(id));
        }
        if !self.purchases.contains_key(&(id, caller)) {
            return Err(MarketError::Unauthorized);
        }
        validation::check_price(new_price)?;

        let asset = self.assets.get_mut(&id).ok_or(MarketError::AssetNotFound(id))?;
        asset.price = new_price;
        asset.active = true;
        asset.vendor = caller;

        tracing::info!(asset_id = id, price = new_price, "asset.relisted");
        Ok(())
    }

    /// Purchase an asset. Settlement is delegated to the ledger in a single
    /// atomic call before the purchase record is written, so a refused
    /// payment changes nothing.
    pub fn acquire_asset(
        &mut self,
        caller: Principal,
        id: AssetId,
        ledger: &mut dyn Ledger,
    ) -> Result<()> {
        let asset = self.assets.get(&id).ok_or(MarketError::AssetNotFound(id))?;
        if !asset.active {
            return Err(MarketError::InactiveAsset(id));
        }
        // Self-purchase reuses the authorization code.
        if asset.vendor == caller {
            return Err(MarketError::Unauthorized);
        }
        if self.purchases.contains_key(&(id, caller)) {
            return Err(MarketError::AlreadyPurchased(id));
        }

        let split = RoyaltySplit::new(asset.price, asset.royalty);
        let payouts = split.payouts(asset.creator, asset.vendor);
        ledger.settle(caller, &payouts)?;

        let record = PurchaseRecord {
            asset_id: id,
            buyer: caller,
            price_paid: asset.price,
            acquired_at: chrono::Utc::now().to_rfc3339(),
        };
        self.purchases.insert((id, caller), record);

        tracing::info!(asset_id = id, "asset.acquired");
        Ok(())
    }

    /// Submit a rating and comment for a purchased asset. One per buyer.
    pub fn post_feedback(
        &mut self,
        caller: Principal,
        id: AssetId,
        rating: u64,
        comment: String,
    ) -> Result<()> {
        if !self.purchases.contains_key(&(id, caller)) {
            return Err(MarketError::NotPurchased(id));
        }
        validation::check_rating(rating)?;
        if self.feedback.contains_key(&(id, caller)) {
            return Err(MarketError::DuplicateFeedback(id));
        }
        validation::check_comment(&comment)?;

        let record = FeedbackRecord {
            asset_id: id,
            buyer: caller,
            rating,
            comment,
            posted_at: chrono::Utc::now().to_rfc3339(),
        };
        self.feedback.insert((id, caller), record);

        tracing::info!(asset_id = id, rating = rating, "feedback.posted");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read-only operations
    // ------------------------------------------------------------------

    pub fn fetch_asset(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(&id)
    }

    /// Count of successful registrations since genesis.
    pub fn count_registered_assets(&self) -> u64 {
        self.registered
    }

    pub fn verify_acquisition(&self, id: AssetId, buyer: &Principal) -> bool {
        self.purchases.contains_key(&(id, *buyer))
    }

    pub fn fetch_feedback(&self, id: AssetId, buyer: &Principal) -> Option<&FeedbackRecord> {
        self.feedback.get(&(id, *buyer))
    }

    /// All assets, ordered by id.
    pub fn list_assets(&self) -> Vec<&Asset> {
        let mut assets: Vec<_> = self.assets.values().collect();
        assets.sort_by_key(|a| a.id);
        assets
    }

    /// Assets currently sold by the given vendor, ordered by id.
    pub fn assets_by_vendor(&self, vendor: &Principal) -> Vec<&Asset> {
        let mut assets: Vec<_> = self
            .assets
            .values()
            .filter(|a| a.vendor == *vendor)
            .collect();
        assets.sort_by_key(|a| a.id);
        assets
    }

    pub fn purchase_records(&self) -> impl Iterator<Item = &PurchaseRecord> {
        self.purchases.values()
    }

    pub fn feedback_records(&self) -> impl Iterator<Item = &FeedbackRecord> {
        self.feedback.values()
    }
}
