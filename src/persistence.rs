//! Database persistence layer for VaultNexus
//!
//! The in-memory [`Marketplace`] is the source of truth at runtime; this
//! layer snapshots it to SQLite after state changes and restores it at boot.

use crate::error::{MarketError, Result};
use crate::marketplace::Marketplace;
use crate::registry::{Asset, FeedbackRecord, PurchaseRecord};
use rusqlite::{params, Connection};
use std::sync::Mutex;

const REGISTERED_COUNTER_KEY: &str = "registered_assets";

/// Abstraction for persistence backends. Implementations should provide
/// atomic saving/loading of the full marketplace state.
pub trait Persistence: Send + Sync {
    fn save_marketplace(&self, market: &Marketplace) -> Result<()>;
    fn load_marketplace(&self) -> Result<Marketplace>;
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| MarketError::DatabaseError(format!("Failed to open database: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS assets (
                id INTEGER PRIMARY KEY,
                asset_data TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| MarketError::DatabaseError(format!("Failed to create assets table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS purchases (
                asset_id INTEGER NOT NULL,
                buyer BLOB NOT NULL,
                record_data TEXT NOT NULL,
                PRIMARY KEY (asset_id, buyer)
            )",
            [],
        )
        .map_err(|e| {
            MarketError::DatabaseError(format!("Failed to create purchases table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS feedback (
                asset_id INTEGER NOT NULL,
                buyer BLOB NOT NULL,
                record_data TEXT NOT NULL,
                PRIMARY KEY (asset_id, buyer)
            )",
            [],
        )
        .map_err(|e| {
            MarketError::DatabaseError(format!("Failed to create feedback table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| {
            MarketError::DatabaseError(format!("Failed to create metadata table: {}", e))
        })?;

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }
}

impl Persistence for Database {
    fn save_marketplace(&self, market: &Marketplace) -> Result<()> {
        // One SQLite transaction for the whole snapshot
        let conn_guard = self
            .conn
            .lock()
            .map_err(|_| MarketError::DatabaseError("Mutex poisoned".to_string()))?;
        let tx = conn_guard.unchecked_transaction().map_err(|e| {
            MarketError::DatabaseError(format!("Failed to start transaction: {}", e))
        })?;

        tx.execute("DELETE FROM assets", [])
            .map_err(|e| MarketError::DatabaseError(format!("Failed to clear assets: {}", e)))?;
        tx.execute("DELETE FROM purchases", [])
            .map_err(|e| MarketError::DatabaseError(format!("Failed to clear purchases: {}", e)))?;
        tx.execute("DELETE FROM feedback", [])
            .map_err(|e| MarketError::DatabaseError(format!("Failed to clear feedback: {}", e)))?;

        for asset in market.list_assets() {
            let asset_json = serde_json::to_string(asset).map_err(|e| {
                MarketError::DatabaseError(format!("Failed to serialize asset: {}", e))
            })?;
            tx.execute(
                "INSERT INTO assets (id, asset_data) VALUES (?1, ?2)",
                params![asset.id as i64, asset_json],
            )
            .map_err(|e| MarketError::DatabaseError(format!("Failed to save asset: {}", e)))?;
        }

        for record in market.purchase_records() {
            let record_json = serde_json::to_string(record).map_err(|e| {
                MarketError::DatabaseError(format!("Failed to serialize purchase: {}", e))
            })?;
            tx.execute(
                "INSERT INTO purchases (asset_id, buyer, record_data) VALUES (?1, ?2, ?3)",
                params![record.asset_id as i64, record.buyer.to_vec(), record_json],
            )
            .map_err(|e| MarketError::DatabaseError(format!("Failed to save purchase: {}", e)))?;
        }

        for record in market.feedback_records() {
            let record_json = serde_json::to_string(record).map_err(|e| {
                MarketError::DatabaseError(format!("Failed to serialize feedback: {}", e))
            })?;
            tx.execute(
                "INSERT INTO feedback (asset_id, buyer, record_data) VALUES (?1, ?2, ?3)",
                params![record.asset_id as i64, record.buyer.to_vec(), record_json],
            )
            .map_err(|e| MarketError::DatabaseError(format!("Failed to save feedback: {}", e)))?;
        }

        tx.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![
                REGISTERED_COUNTER_KEY,
                market.count_registered_assets().to_string()
            ],
        )
        .map_err(|e| MarketError::DatabaseError(format!("Failed to save counter: {}", e)))?;

        tx.commit()
            .map_err(|e| MarketError::DatabaseError(format!("Failed to commit transaction: {}", e)))
    }

    fn load_marketplace(&self) -> Result<Marketplace> {
        let conn_guard = self
            .conn
            .lock()
            .map_err(|_| MarketError::DatabaseError("Mutex poisoned".to_string()))?;

        let mut assets: Vec<Asset> = Vec::new();
        {
            let mut stmt = conn_guard
                .prepare("SELECT asset_data FROM assets")
                .map_err(|e| MarketError::DatabaseError(format!("Failed to prepare query: {}", e)))?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(|e| MarketError::DatabaseError(format!("Failed to query assets: {}", e)))?;
            for row in rows {
                let asset_json =
                    row.map_err(|e| MarketError::DatabaseError(format!("Failed to read row: {}", e)))?;
                let asset: Asset = serde_json::from_str(&asset_json).map_err(|e| {
                    MarketError::DatabaseError(format!("Failed to deserialize asset: {}", e))
                })?;
                assets.push(asset);
            }
        }

        let mut purchases: Vec<PurchaseRecord> = Vec::new();
        {
            let mut stmt = conn_guard
                .prepare("SELECT record_data FROM purchases")
                .map_err(|e| MarketError::DatabaseError(format!("Failed to prepare query: {}", e)))?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0)).map_err(|e| {
                MarketError::DatabaseError(format!("Failed to query purchases: {}", e))
            })?;
            for row in rows {
                let record_json =
                    row.map_err(|e| MarketError::DatabaseError(format!("Failed to read row: {}", e)))?;
                let record: PurchaseRecord = serde_json::from_str(&record_json).map_err(|e| {
                    MarketError::DatabaseError(format!("Failed to deserialize purchase: {}", e))
                })?;
                purchases.push(record);
            }
        }

        let mut feedback: Vec<FeedbackRecord> = Vec::new();
        {
            let mut stmt = conn_guard
                .prepare("SELECT record_data FROM feedback")
                .map_err(|e| MarketError::DatabaseError(format!("Failed to prepare query: {}", e)))?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0)).map_err(|e| {
                MarketError::DatabaseError(format!("Failed to query feedback: {}", e))
            })?;
            for row in rows {
                let record_json =
                    row.map_err(|e| MarketError::DatabaseError(format!("Failed to read row: {}", e)))?;
                let record: FeedbackRecord = serde_json::from_str(&record_json).map_err(|e| {
                    MarketError::DatabaseError(format!("Failed to deserialize feedback: {}", e))
                })?;
                feedback.push(record);
            }
        }

        let registered: u64 = conn_guard
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                params![REGISTERED_COUNTER_KEY],
                |row| row.get::<_, String>(0),
            )
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| assets.iter().map(|a| a.id).max().unwrap_or(0));

        Ok(Marketplace::from_parts(assets, purchases, feedback, registered))
    }
}

/// Volatile backend used as a fallback when the database cannot be opened,
/// and by tests.
#[derive(Default)]
pub struct InMemoryPersistence {
    snapshot: Mutex<Option<Marketplace>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for InMemoryPersistence {
    fn save_marketplace(&self, market: &Marketplace) -> Result<()> {
        let mut snapshot = self
            .snapshot
            .lock()
            .map_err(|_| MarketError::DatabaseError("Mutex poisoned".to_string()))?;
        *snapshot = Some(market.clone());
        Ok(())
    }

    fn load_marketplace(&self) -> Result<Marketplace> {
        let snapshot = self
            .snapshot
            .lock()
            .map_err(|_| MarketError::DatabaseError("Mutex poisoned".to_string()))?;
        Ok(snapshot.clone().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::principal_from_string;
    use crate::registry::AssetDraft;
    use crate::settlement::{InMemoryLedger, Ledger};
    use tempfile::TempDir;

    fn populated_marketplace() -> Marketplace {
        let vendor = principal_from_string("vendor");
        let buyer = principal_from_string("buyer");
        let mut market = Marketplace::new();
        let mut ledger = InMemoryLedger::new();
        ledger.credit(buyer, 10_000_000).unwrap();

        let id = market
            .register_asset(
                vendor,
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
        market.acquire_asset(buyer, id, &mut ledger).unwrap();
        market
            .post_feedback(buyer, id, 4, "Good asset".to_string())
            .unwrap();
        market
    }

    #[test]
    fn test_database_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("market.db");
        let db = Database::open(path.to_str().unwrap()).unwrap();

        let market = populated_marketplace();
        db.save_marketplace(&market).unwrap();

        let restored = db.load_marketplace().unwrap();
        let buyer = principal_from_string("buyer");
        assert_eq!(restored.count_registered_assets(), 1);
        assert!(restored.verify_acquisition(1, &buyer));
        assert_eq!(restored.fetch_feedback(1, &buyer).unwrap().rating, 4);
        let asset = restored.fetch_asset(1).unwrap();
        assert_eq!(asset.name, "Second Asset");
        assert_eq!(asset.price, 2_000_000);
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("market.db");
        let db = Database::open(path.to_str().unwrap()).unwrap();

        db.save_marketplace(&populated_marketplace()).unwrap();
        db.save_marketplace(&populated_marketplace()).unwrap();

        let restored = db.load_marketplace().unwrap();
        assert_eq!(restored.list_assets().len(), 1);
        assert_eq!(restored.purchase_records().count(), 1);
    }

    #[test]
    fn test_empty_database_loads_empty_marketplace() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("market.db");
        let db = Database::open(path.to_str().unwrap()).unwrap();

        let restored = db.load_marketplace().unwrap();
        assert_eq!(restored.count_registered_assets(), 0);
        assert!(restored.fetch_asset(1).is_none());
    }

    #[test]
    fn test_in_memory_persistence() {
        let persistence = InMemoryPersistence::new();
        persistence
            .save_marketplace(&populated_marketplace())
            .unwrap();
        let restored = persistence.load_marketplace().unwrap();
        assert_eq!(restored.count_registered_assets(), 1);
    }
}
