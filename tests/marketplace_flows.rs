//! Integration tests for the marketplace state machine
//!
//! These exercise the full operation surface black-box style: registration,
//! modification, acquisition, feedback and relisting, asserting the stable
//! error codes callers observe.

use vault_nexus::error::MarketError;
use vault_nexus::identity::{principal_from_string, Principal};
use vault_nexus::marketplace::Marketplace;
use vault_nexus::registry::{AssetDraft, AssetUpdate};
use vault_nexus::settlement::{InMemoryLedger, Ledger};

const TEST_COST: u64 = 5_000_000;
const TEST_ROYALTY: u64 = 10;

fn vendor() -> Principal {
    principal_from_string("vendor")
}

fn buyer() -> Principal {
    principal_from_string("buyer")
}

fn third_party() -> Principal {
    principal_from_string("third-party")
}

fn test_draft(price: u64, royalty: u64) -> AssetDraft {
    AssetDraft {
        name: "Professional UI Kit".to_string(),
        description: "Comprehensive collection of reusable components".to_string(),
        price,
        sector: "design".to_string(),
        thumbnail: "https://cdn.example.com/thumb.jpg".to_string(),
        resource: "https://cdn.example.com/full.zip".to_string(),
        royalty,
    }
}

/// Marketplace with one registered asset and a well-funded ledger.
fn market_with_asset(price: u64) -> (Marketplace, InMemoryLedger) {
    let mut market = Marketplace::new();
    let mut ledger = InMemoryLedger::new();
    for who in [vendor(), buyer(), third_party()] {
        ledger.credit(who, 1_000_000_000).unwrap();
    }
    market.register_asset(vendor(), test_draft(price, TEST_ROYALTY)).unwrap();
    (market, ledger)
}

#[test]
fn register_new_asset() {
    let mut market = Marketplace::new();
    assert_eq!(market.count_registered_assets(), 0);

    let id = market
        .register_asset(vendor(), test_draft(TEST_COST, TEST_ROYALTY))
        .unwrap();
    assert_eq!(id, 1);
    assert_eq!(market.count_registered_assets(), 1);
}

#[test]
fn registration_rejects_zero_price() {
    let mut market = Marketplace::new();
    let result = market.register_asset(vendor(), test_draft(0, 5));
    assert_eq!(result, Err(MarketError::InvalidPrice));
    assert_eq!(result.unwrap_err().code(), Some(105));
    assert_eq!(market.count_registered_assets(), 0);
}

#[test]
fn registration_rejects_excessive_royalty() {
    let mut market = Marketplace::new();
    let result = market.register_asset(vendor(), test_draft(1_000_000, 20));
    assert_eq!(result, Err(MarketError::ExcessiveRoyalty(20)));
    assert_eq!(result.unwrap_err().code(), Some(106));
}

#[test]
fn fetch_registered_asset_details() {
    let (market, _) = market_with_asset(TEST_COST);

    let asset = market.fetch_asset(1).unwrap();
    assert_eq!(asset.vendor, vendor());
    assert_eq!(asset.name, "Professional UI Kit");
    assert_eq!(asset.price, TEST_COST);
    assert_eq!(asset.royalty, TEST_ROYALTY);
    assert!(asset.active);

    assert!(market.fetch_asset(99).is_none());
}

#[test]
fn vendor_modifies_asset() {
    let (mut market, _) = market_with_asset(TEST_COST);

    let update = AssetUpdate {
        name: "Updated Name".to_string(),
        description: "New description".to_string(),
        price: 6_000_000,
        sector: "templates".to_string(),
        thumbnail: "new-thumb".to_string(),
        resource: "new-resource".to_string(),
        active: true,
    };
    market.modify_asset(vendor(), 1, update).unwrap();

    let asset = market.fetch_asset(1).unwrap();
    assert_eq!(asset.name, "Updated Name");
    assert_eq!(asset.price, 6_000_000);
    assert_eq!(asset.sector, "templates");
}

#[test]
fn unauthorized_modification_rejected() {
    let (mut market, _) = market_with_asset(TEST_COST);

    let update = AssetUpdate {
        name: "Hacked Name".to_string(),
        description: "Malicious".to_string(),
        price: 10_000_000,
        sector: "other".to_string(),
        thumbnail: "hacked".to_string(),
        resource: "hacked".to_string(),
        active: true,
    };
    let result = market.modify_asset(third_party(), 1, update);
    assert_eq!(result, Err(MarketError::Unauthorized));
    assert_eq!(result.unwrap_err().code(), Some(100));

    // Nothing changed
    assert_eq!(market.fetch_asset(1).unwrap().name, "Professional UI Kit");
}

#[test]
fn modification_rejects_zero_price() {
    let (mut market, _) = market_with_asset(TEST_COST);

    let update = AssetUpdate {
        name: "Free Now".to_string(),
        description: "Zero".to_string(),
        price: 0,
        sector: "design".to_string(),
        thumbnail: "t".to_string(),
        resource: "r".to_string(),
        active: true,
    };
    assert_eq!(
        market.modify_asset(vendor(), 1, update),
        Err(MarketError::InvalidPrice)
    );
}

#[test]
fn vendor_deactivates_listing() {
    let (mut market, _) = market_with_asset(TEST_COST);

    market.deactivate_asset(vendor(), 1).unwrap();
    assert!(!market.fetch_asset(1).unwrap().active);

    assert_eq!(
        market.deactivate_asset(buyer(), 1),
        Err(MarketError::Unauthorized)
    );
}

#[test]
fn buyer_purchases_asset() {
    let (mut market, mut ledger) = market_with_asset(1_000_000);

    market.acquire_asset(buyer(), 1, &mut ledger).unwrap();
    assert!(market.verify_acquisition(1, &buyer()));
}

#[test]
fn vendor_cannot_purchase_own_asset() {
    let (mut market, mut ledger) = market_with_asset(1_000_000);

    let result = market.acquire_asset(vendor(), 1, &mut ledger);
    assert_eq!(result, Err(MarketError::Unauthorized));
    assert_eq!(result.unwrap_err().code(), Some(100));
}

#[test]
fn buyer_cannot_repurchase_asset() {
    let (mut market, mut ledger) = market_with_asset(1_000_000);

    market.acquire_asset(buyer(), 1, &mut ledger).unwrap();
    let result = market.acquire_asset(buyer(), 1, &mut ledger);
    assert_eq!(result, Err(MarketError::AlreadyPurchased(1)));
    assert_eq!(result.unwrap_err().code(), Some(104));
}

#[test]
fn cannot_purchase_deactivated_asset() {
    let (mut market, mut ledger) = market_with_asset(1_000_000);

    market.deactivate_asset(vendor(), 1).unwrap();
    let result = market.acquire_asset(buyer(), 1, &mut ledger);
    assert_eq!(result, Err(MarketError::InactiveAsset(1)));
    assert_eq!(result.unwrap_err().code(), Some(102));
}

#[test]
fn buyer_rates_purchased_asset() {
    let (mut market, mut ledger) = market_with_asset(1_000_000);

    market.acquire_asset(buyer(), 1, &mut ledger).unwrap();
    market
        .post_feedback(buyer(), 1, 5, "Excellent asset, very professional!".to_string())
        .unwrap();

    let record = market.fetch_feedback(1, &buyer()).unwrap();
    assert_eq!(record.rating, 5);
    assert_eq!(record.comment, "Excellent asset, very professional!");
}

#[test]
fn feedback_rejects_invalid_rating() {
    let (mut market, mut ledger) = market_with_asset(1_000_000);

    market.acquire_asset(buyer(), 1, &mut ledger).unwrap();
    let result = market.post_feedback(buyer(), 1, 10, "Invalid rating".to_string());
    assert_eq!(result, Err(MarketError::InvalidRating(10)));
    assert_eq!(result.unwrap_err().code(), Some(107));
}

#[test]
fn feedback_rejects_duplicates() {
    let (mut market, mut ledger) = market_with_asset(1_000_000);

    market.acquire_asset(buyer(), 1, &mut ledger).unwrap();
    market
        .post_feedback(buyer(), 1, 4, "Good asset".to_string())
        .unwrap();

    let result = market.post_feedback(buyer(), 1, 5, "Actually it is excellent!".to_string());
    assert_eq!(result, Err(MarketError::DuplicateFeedback(1)));
    assert_eq!(result.unwrap_err().code(), Some(109));

    // The first record stands
    assert_eq!(market.fetch_feedback(1, &buyer()).unwrap().rating, 4);
}

#[test]
fn only_buyers_can_submit_ratings() {
    let (mut market, mut ledger) = market_with_asset(1_000_000);

    market.acquire_asset(buyer(), 1, &mut ledger).unwrap();
    let result = market.post_feedback(
        third_party(),
        1,
        3,
        "Trying to rate without purchase".to_string(),
    );
    assert_eq!(result, Err(MarketError::NotPurchased(1)));
    assert_eq!(result.unwrap_err().code(), Some(108));
}

#[test]
fn previous_buyer_can_relist_acquired_asset() {
    let (mut market, mut ledger) = market_with_asset(1_000_000);

    market.acquire_asset(buyer(), 1, &mut ledger).unwrap();
    market.relist_asset(buyer(), 1, 1_500_000).unwrap();

    let asset = market.fetch_asset(1).unwrap();
    assert!(asset.active);
    assert_eq!(asset.price, 1_500_000);
    assert_eq!(asset.vendor, buyer());

    // Relisted asset is purchasable again
    market.acquire_asset(third_party(), 1, &mut ledger).unwrap();
}

#[test]
fn relisting_validates_price() {
    let (mut market, mut ledger) = market_with_asset(1_000_000);

    market.acquire_asset(buyer(), 1, &mut ledger).unwrap();
    let result = market.relist_asset(buyer(), 1, 0);
    assert_eq!(result, Err(MarketError::InvalidPrice));
    assert_eq!(result.unwrap_err().code(), Some(105));
}

#[test]
fn relisting_requires_prior_acquisition() {
    let (mut market, _) = market_with_asset(1_000_000);

    assert_eq!(
        market.relist_asset(third_party(), 1, 500_000),
        Err(MarketError::Unauthorized)
    );
}

#[test]
fn counter_tracks_registered_assets() {
    let mut market = Marketplace::new();
    assert_eq!(market.count_registered_assets(), 0);

    market
        .register_asset(vendor(), test_draft(TEST_COST, TEST_ROYALTY))
        .unwrap();
    assert_eq!(market.count_registered_assets(), 1);

    let id = market
        .register_asset(
            vendor(),
            AssetDraft {
                name: "Second Asset".to_string(),
                description: "Another one".to_string(),
                price: 2_000_000,
                sector: "templates".to_string(),
                thumbnail: "thumb2".to_string(),
                resource: "full2".to_string(),
                royalty: 5,
            },
        )
        .unwrap();
    assert_eq!(id, 2);
    assert_eq!(market.count_registered_assets(), 2);
}

#[test]
fn verify_acquisition_tracks_purchase_history() {
    let (mut market, mut ledger) = market_with_asset(1_000_000);

    assert!(!market.verify_acquisition(1, &buyer()));
    market.acquire_asset(buyer(), 1, &mut ledger).unwrap();
    assert!(market.verify_acquisition(1, &buyer()));

    // The record survives deactivation and relisting
    market.deactivate_asset(vendor(), 1).unwrap();
    assert!(market.verify_acquisition(1, &buyer()));
    market.relist_asset(buyer(), 1, 2_000_000).unwrap();
    assert!(market.verify_acquisition(1, &buyer()));
}

#[test]
fn full_listing_lifecycle() {
    // register at 5_000_000 / royalty 10 -> count 1 -> fetch -> deactivate
    // -> acquisition of the deactivated asset fails with the inactive code
    let mut market = Marketplace::new();
    let mut ledger = InMemoryLedger::new();
    ledger.credit(buyer(), 1_000_000_000).unwrap();

    let id = market
        .register_asset(vendor(), test_draft(5_000_000, 10))
        .unwrap();
    assert_eq!(market.count_registered_assets(), 1);

    let asset = market.fetch_asset(id).unwrap();
    assert_eq!(asset.vendor, vendor());
    assert_eq!(asset.name, "Professional UI Kit");

    market.deactivate_asset(vendor(), id).unwrap();

    let result = market.acquire_asset(buyer(), id, &mut ledger);
    assert_eq!(result.unwrap_err().code(), Some(102));
}
