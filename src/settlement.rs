//! Payment settlement for asset acquisitions
//!
//! The marketplace never moves tokens itself: it computes who gets paid what
//! and hands the whole settlement to a [`Ledger`] in one call. On a live
//! deployment the ledger is the host chain's transfer primitive; tests and
//! the standalone server use [`InMemoryLedger`].

use crate::error::{MarketError, Result};
use crate::identity::Principal;
use std::collections::HashMap;

/// A single payment leg of a settlement.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Payout {
    pub to: Principal,
    pub amount: u64,
}

/// Abstraction over the host ledger. Implementations must apply a settlement
/// atomically: either every payout lands or none does.
pub trait Ledger: Send + Sync {
    /// Move `payouts` from `payer` to the recipients, all or nothing.
    fn settle(&mut self, payer: Principal, payouts: &[Payout]) -> Result<()>;

    /// Current spendable balance of a principal.
    fn balance_of(&self, who: &Principal) -> u64;

    /// Credit freshly minted funds to a principal. Live host ledgers refuse
    /// this; the in-memory ledger uses it as a faucet.
    fn credit(&mut self, to: Principal, amount: u64) -> Result<()>;
}

/// How a sale price is divided between the asset's original creator and the
/// current vendor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoyaltySplit {
    pub royalty_amount: u64,
    pub vendor_amount: u64,
}

impl RoyaltySplit {
    /// Integer division; the remainder stays with the vendor.
    pub fn new(price: u64, royalty_percent: u64) -> Self {
        // Widen before multiplying; the quotient always fits back in u64.
        let royalty_amount = (price as u128 * royalty_percent as u128 / 100) as u64;
        RoyaltySplit {
            royalty_amount,
            vendor_amount: price - royalty_amount,
        }
    }

    /// The payout legs for a sale. Collapses to a single leg when the
    /// creator still is the vendor or when the royalty rounds to zero.
    pub fn payouts(&self, creator: Principal, vendor: Principal) -> Vec<Payout> {
        if creator == vendor || self.royalty_amount == 0 {
            return vec![Payout {
                to: vendor,
                amount: self.royalty_amount + self.vendor_amount,
            }];
        }
        vec![
            Payout {
                to: creator,
                amount: self.royalty_amount,
            },
            Payout {
                to: vendor,
                amount: self.vendor_amount,
            },
        ]
    }
}

/// Balance-map ledger for tests and the standalone server.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: HashMap<Principal, u64>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Ledger for InMemoryLedger {
    fn settle(&mut self, payer: Principal, payouts: &[Payout]) -> Result<()> {
        let total: u64 = payouts.iter().map(|p| p.amount).sum();
        let available = self.balance_of(&payer);
        if available < total {
            return Err(MarketError::SettlementFailed(format!(
                "Insufficient funds: balance {} is less than settlement total {}",
                available, total
            )));
        }
        self.balances.insert(payer, available - total);
        for payout in payouts {
            *self.balances.entry(payout.to).or_insert(0) += payout.amount;
        }
        Ok(())
    }

    fn balance_of(&self, who: &Principal) -> u64 {
        *self.balances.get(who).unwrap_or(&0)
    }

    fn credit(&mut self, to: Principal, amount: u64) -> Result<()> {
        *self.balances.entry(to).or_insert(0) += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::principal_from_string;

    #[test]
    fn test_royalty_split() {
        let split = RoyaltySplit::new(1_000_000, 10);
        assert_eq!(split.royalty_amount, 100_000);
        assert_eq!(split.vendor_amount, 900_000);
    }

    #[test]
    fn test_royalty_split_rounds_down() {
        let split = RoyaltySplit::new(99, 10);
        assert_eq!(split.royalty_amount, 9);
        assert_eq!(split.vendor_amount, 90);
    }

    #[test]
    fn test_payouts_collapse_when_creator_is_vendor() {
        let vendor = principal_from_string("vendor");
        let payouts = RoyaltySplit::new(1_000_000, 10).payouts(vendor, vendor);
        assert_eq!(payouts.len(), 1);
        assert_eq!(payouts[0].amount, 1_000_000);
    }

    #[test]
    fn test_payouts_split_after_relist() {
        let creator = principal_from_string("creator");
        let reseller = principal_from_string("reseller");
        let payouts = RoyaltySplit::new(1_000_000, 10).payouts(creator, reseller);
        assert_eq!(payouts.len(), 2);
        assert_eq!(payouts[0], Payout { to: creator, amount: 100_000 });
        assert_eq!(payouts[1], Payout { to: reseller, amount: 900_000 });
    }

    #[test]
    fn test_settle_moves_funds_atomically() {
        let buyer = principal_from_string("buyer");
        let vendor = principal_from_string("vendor");
        let mut ledger = InMemoryLedger::new();
        ledger.credit(buyer, 500_000).unwrap();

        let payouts = vec![Payout { to: vendor, amount: 600_000 }];
        assert!(ledger.settle(buyer, &payouts).is_err());
        // Nothing moved on the failed settlement
        assert_eq!(ledger.balance_of(&buyer), 500_000);
        assert_eq!(ledger.balance_of(&vendor), 0);

        ledger.credit(buyer, 100_000).unwrap();
        ledger.settle(buyer, &payouts).unwrap();
        assert_eq!(ledger.balance_of(&buyer), 0);
        assert_eq!(ledger.balance_of(&vendor), 600_000);
    }
}
