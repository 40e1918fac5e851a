/// Record types for the VaultNexus asset registry
use crate::identity::Principal;

/// Identifier of a registered asset, assigned monotonically starting at 1.
pub type AssetId = u64;

/// Maximum royalty rate a vendor may claim, in whole percent.
pub const MAX_ROYALTY_PERCENT: u64 = 15;

/// Allowed feedback rating range (inclusive).
pub const MIN_RATING: u64 = 1;
pub const MAX_RATING: u64 = 5;

/// Field bounds, enforced before any state change.
pub const MAX_NAME_LEN: usize = 64;
pub const MAX_SECTOR_LEN: usize = 32;
pub const MAX_DESCRIPTION_LEN: usize = 256;
pub const MAX_URL_LEN: usize = 256;
pub const MAX_COMMENT_LEN: usize = 256;

/// A registered digital asset.
///
/// `creator` is the original registrant and never changes; it keeps earning
/// royalties on every sale. `vendor` is whoever currently sells the asset
/// and is reassigned when a buyer relists.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Asset {
    pub id: AssetId,
    pub creator: Principal,
    pub vendor: Principal,
    pub name: String,
    pub description: String,
    pub price: u64,
    pub sector: String,
    pub thumbnail: String,
    pub resource: String,
    pub royalty: u64,
    pub active: bool,
    /// RFC3339 timestamp of registration
    pub registered_at: String,
}

impl Asset {
    /// Build the asset stored for a successful registration. Validation has
    /// already happened; this only assembles the record.
    pub fn register(id: AssetId, vendor: Principal, draft: AssetDraft) -> Self {
        Asset {
            id,
            creator: vendor,
            vendor,
            name: draft.name,
            description: draft.description,
            price: draft.price,
            sector: draft.sector,
            thumbnail: draft.thumbnail,
            resource: draft.resource,
            royalty: draft.royalty,
            active: true,
            registered_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Replace the mutable fields in place. Identity fields (id, creator,
    /// vendor, royalty, registered_at) are untouched.
    pub fn apply_update(&mut self, update: AssetUpdate) {
        self.name = update.name;
        self.description = update.description;
        self.price = update.price;
        self.sector = update.sector;
        self.thumbnail = update.thumbnail;
        self.resource = update.resource;
        self.active = update.active;
    }
}

/// Parameters of a registration request.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AssetDraft {
    pub name: String,
    pub description: String,
    pub price: u64,
    pub sector: String,
    pub thumbnail: String,
    pub resource: String,
    pub royalty: u64,
}

/// Parameters of a modification request: the full set of mutable fields,
/// replaced wholesale like the on-chain contract does.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AssetUpdate {
    pub name: String,
    pub description: String,
    pub price: u64,
    pub sector: String,
    pub thumbnail: String,
    pub resource: String,
    pub active: bool,
}

/// Evidence that a buyer acquired an asset. One per (asset, buyer) pair,
/// never mutated or deleted.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PurchaseRecord {
    pub asset_id: AssetId,
    pub buyer: Principal,
    pub price_paid: u64,
    /// RFC3339 timestamp of acquisition
    pub acquired_at: String,
}

/// A buyer's rating and comment on a purchased asset. One per (asset, buyer)
/// pair, never mutated or deleted.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FeedbackRecord {
    pub asset_id: AssetId,
    pub buyer: Principal,
    pub rating: u64,
    pub comment: String,
    /// RFC3339 timestamp of submission
    pub posted_at: String,
}
