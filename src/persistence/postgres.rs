//! PostgreSQL implementation of the campaign store.
//!
//! Every atomic primitive is a single conditional statement (or a short
//! transaction of them), so concurrency is arbitrated by row locks rather
//! than application code:
//!
//! - spin ledgers use `UPDATE .. WHERE spins_used < limit RETURNING`,
//! - inventory reservation uses `FOR UPDATE SKIP LOCKED`,
//! - claim acquisition uses `UPDATE .. WHERE status IN (..)`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use uuid::Uuid;

use super::CampaignStore;
use super::models::{CampaignStats, InventoryCounts, SpinConsumption, SpinCounts};
use crate::config::GatewayConfig;
use crate::domain::{
    Campaign, CampaignId, InventoryId, PrizeDefinition, PrizeInventoryItem, PrizeOutcome,
    SpinBudget, SpinHistory, SpinHistoryId, SpinStatus, WhitelistEntry,
};
use crate::error::SpinError;

const CAMPAIGN_COLUMNS: &str = "id, name, description, active, start_date, end_date, \
     spins_per_wallet, require_whitelist, prizes, total_spins_used, total_prizes_claimed, \
     created_at, updated_at";

const WHITELIST_COLUMNS: &str =
    "campaign_id, wallet_address, spins_allowed, spins_used, created_at, updated_at";

const INVENTORY_COLUMNS: &str = "id, campaign_id, nft_id, token_id, status, \
     reserved_for_spin_history_id, reserved_by, reserved_at, claimed_by, claimed_at, created_at";

const HISTORY_COLUMNS: &str = "id, campaign_id, wallet_address, outcome, status, tx_hash, \
     error_message, result_hash, visual_segment_index, created_at, updated_at";

fn to_i32(value: u32, field: &str) -> Result<i32, SpinError> {
    i32::try_from(value)
        .map_err(|_| SpinError::InvalidRequest(format!("{field} {value} is out of range")))
}

fn to_u32(value: i32, field: &str) -> Result<u32, SpinError> {
    u32::try_from(value)
        .map_err(|_| SpinError::Persistence(format!("stored {field} {value} is negative")))
}

fn to_u64(value: i64, field: &str) -> Result<u64, SpinError> {
    u64::try_from(value)
        .map_err(|_| SpinError::Persistence(format!("stored {field} {value} is negative")))
}

#[derive(Debug, sqlx::FromRow)]
struct CampaignRow {
    id: Uuid,
    name: String,
    description: String,
    active: bool,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    spins_per_wallet: i32,
    require_whitelist: bool,
    prizes: Json<Vec<PrizeDefinition>>,
    total_spins_used: i64,
    total_prizes_claimed: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CampaignRow> for Campaign {
    type Error = SpinError;

    fn try_from(row: CampaignRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CampaignId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            active: row.active,
            start_date: row.start_date,
            end_date: row.end_date,
            spins_per_wallet: to_u32(row.spins_per_wallet, "spins_per_wallet")?,
            require_whitelist: row.require_whitelist,
            prizes: row.prizes.0,
            total_spins_used: to_u64(row.total_spins_used, "total_spins_used")?,
            total_prizes_claimed: to_u64(row.total_prizes_claimed, "total_prizes_claimed")?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WhitelistRow {
    campaign_id: Uuid,
    wallet_address: String,
    spins_allowed: i32,
    spins_used: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WhitelistRow> for WhitelistEntry {
    type Error = SpinError;

    fn try_from(row: WhitelistRow) -> Result<Self, Self::Error> {
        Ok(Self {
            campaign_id: CampaignId::from_uuid(row.campaign_id),
            wallet_address: row.wallet_address,
            spins_allowed: to_u32(row.spins_allowed, "spins_allowed")?,
            spins_used: to_u32(row.spins_used, "spins_used")?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InventoryRow {
    id: Uuid,
    campaign_id: Uuid,
    nft_id: String,
    token_id: Option<String>,
    status: String,
    reserved_for_spin_history_id: Option<Uuid>,
    reserved_by: Option<String>,
    reserved_at: Option<DateTime<Utc>>,
    claimed_by: Option<String>,
    claimed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<InventoryRow> for PrizeInventoryItem {
    type Error = SpinError;

    fn try_from(row: InventoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: InventoryId::from_uuid(row.id),
            campaign_id: CampaignId::from_uuid(row.campaign_id),
            nft_id: row.nft_id,
            token_id: row.token_id,
            status: row.status.parse().map_err(SpinError::Persistence)?,
            reserved_for_spin_history_id: row
                .reserved_for_spin_history_id
                .map(SpinHistoryId::from_uuid),
            reserved_by: row.reserved_by,
            reserved_at: row.reserved_at,
            claimed_by: row.claimed_by,
            claimed_at: row.claimed_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    id: Uuid,
    campaign_id: Uuid,
    wallet_address: String,
    outcome: Option<Json<PrizeOutcome>>,
    status: String,
    tx_hash: Option<String>,
    error_message: Option<String>,
    result_hash: String,
    visual_segment_index: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for SpinHistory {
    type Error = SpinError;

    fn try_from(row: HistoryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SpinHistoryId::from_uuid(row.id),
            campaign_id: CampaignId::from_uuid(row.campaign_id),
            wallet_address: row.wallet_address,
            outcome: row.outcome.map(|json| json.0),
            status: row.status.parse().map_err(SpinError::Persistence)?,
            tx_hash: row.tx_hash,
            error_message: row.error_message,
            result_hash: row.result_hash,
            visual_segment_index: row
                .visual_segment_index
                .map(|i| to_u32(i, "visual_segment_index"))
                .transpose()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized by the gateway configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SpinError::Persistence`] if the database is unreachable.
    pub async fn connect(config: &GatewayConfig) -> Result<Self, SpinError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`SpinError::Persistence`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), SpinError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| SpinError::Persistence(e.to_string()))
    }
}

impl CampaignStore for PostgresStore {
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), SpinError> {
        sqlx::query(&format!(
            "INSERT INTO campaigns ({CAMPAIGN_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(campaign.id.as_uuid())
        .bind(&campaign.name)
        .bind(&campaign.description)
        .bind(campaign.active)
        .bind(campaign.start_date)
        .bind(campaign.end_date)
        .bind(to_i32(campaign.spins_per_wallet, "spins_per_wallet")?)
        .bind(campaign.require_whitelist)
        .bind(Json(&campaign.prizes))
        .bind(i64::try_from(campaign.total_spins_used).unwrap_or(i64::MAX))
        .bind(i64::try_from(campaign.total_prizes_claimed).unwrap_or(i64::MAX))
        .bind(campaign.created_at)
        .bind(campaign.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_campaign(&self, campaign: &Campaign) -> Result<(), SpinError> {
        let result = sqlx::query(
            "UPDATE campaigns SET name = $2, description = $3, active = $4, start_date = $5, \
             end_date = $6, spins_per_wallet = $7, require_whitelist = $8, prizes = $9, \
             updated_at = $10 WHERE id = $1",
        )
        .bind(campaign.id.as_uuid())
        .bind(&campaign.name)
        .bind(&campaign.description)
        .bind(campaign.active)
        .bind(campaign.start_date)
        .bind(campaign.end_date)
        .bind(to_i32(campaign.spins_per_wallet, "spins_per_wallet")?)
        .bind(campaign.require_whitelist)
        .bind(Json(&campaign.prizes))
        .bind(campaign.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SpinError::CampaignNotFound(campaign.id));
        }
        Ok(())
    }

    async fn get_campaign(&self, id: CampaignId) -> Result<Option<Campaign>, SpinError> {
        sqlx::query_as::<_, CampaignRow>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .map(Campaign::try_from)
        .transpose()
    }

    async fn list_campaigns(&self) -> Result<Vec<Campaign>, SpinError> {
        sqlx::query_as::<_, CampaignRow>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Campaign::try_from)
        .collect()
    }

    async fn upsert_whitelist_entry(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
        spins_allowed: u32,
        now: DateTime<Utc>,
    ) -> Result<WhitelistEntry, SpinError> {
        let row = sqlx::query_as::<_, WhitelistRow>(&format!(
            "INSERT INTO whitelist_entries ({WHITELIST_COLUMNS}) VALUES ($1, $2, $3, 0, $4, $4) \
             ON CONFLICT (campaign_id, wallet_address) DO UPDATE \
             SET spins_allowed = EXCLUDED.spins_allowed, updated_at = EXCLUDED.updated_at \
             WHERE whitelist_entries.spins_used <= EXCLUDED.spins_allowed \
             RETURNING {WHITELIST_COLUMNS}"
        ))
        .bind(campaign_id.as_uuid())
        .bind(wallet_address)
        .bind(to_i32(spins_allowed, "spins_allowed")?)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        row.map(WhitelistEntry::try_from).transpose()?.ok_or_else(|| {
            SpinError::InvalidRequest(format!(
                "wallet already used more than {spins_allowed} spins"
            ))
        })
    }

    async fn remove_whitelist_entry(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
    ) -> Result<bool, SpinError> {
        let result = sqlx::query(
            "DELETE FROM whitelist_entries WHERE campaign_id = $1 AND wallet_address = $2",
        )
        .bind(campaign_id.as_uuid())
        .bind(wallet_address)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_whitelist_entry(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
    ) -> Result<Option<WhitelistEntry>, SpinError> {
        sqlx::query_as::<_, WhitelistRow>(&format!(
            "SELECT {WHITELIST_COLUMNS} FROM whitelist_entries \
             WHERE campaign_id = $1 AND wallet_address = $2"
        ))
        .bind(campaign_id.as_uuid())
        .bind(wallet_address)
        .fetch_optional(&self.pool)
        .await?
        .map(WhitelistEntry::try_from)
        .transpose()
    }

    async fn wallet_spins_used(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
    ) -> Result<u32, SpinError> {
        let used = sqlx::query_scalar::<_, i32>(
            "SELECT spins_used FROM wallet_spin_counters \
             WHERE campaign_id = $1 AND wallet_address = $2",
        )
        .bind(campaign_id.as_uuid())
        .bind(wallet_address)
        .fetch_optional(&self.pool)
        .await?;
        used.map_or(Ok(0), |u| to_u32(u, "spins_used"))
    }

    async fn consume_spin(
        &self,
        campaign_id: CampaignId,
        wallet_address: &str,
        budget: SpinBudget,
    ) -> Result<SpinConsumption, SpinError> {
        if budget == SpinBudget::PerWallet(0) {
            return Ok(SpinConsumption::denied());
        }

        let mut tx = self.pool.begin().await?;

        let remaining = match budget {
            SpinBudget::Whitelist => {
                sqlx::query_scalar::<_, i64>(
                    "UPDATE whitelist_entries \
                     SET spins_used = spins_used + 1, updated_at = now() \
                     WHERE campaign_id = $1 AND wallet_address = $2 \
                       AND spins_used < spins_allowed \
                     RETURNING (spins_allowed - spins_used)::BIGINT",
                )
                .bind(campaign_id.as_uuid())
                .bind(wallet_address)
                .fetch_optional(&mut *tx)
                .await?
            }
            SpinBudget::PerWallet(limit) => {
                sqlx::query_scalar::<_, i64>(
                    "INSERT INTO wallet_spin_counters (campaign_id, wallet_address, spins_used, updated_at) \
                     VALUES ($1, $2, 1, now()) \
                     ON CONFLICT (campaign_id, wallet_address) DO UPDATE \
                     SET spins_used = wallet_spin_counters.spins_used + 1, updated_at = now() \
                     WHERE wallet_spin_counters.spins_used < $3 \
                     RETURNING ($3 - spins_used)::BIGINT",
                )
                .bind(campaign_id.as_uuid())
                .bind(wallet_address)
                .bind(to_i32(limit, "spins_per_wallet")?)
                .fetch_optional(&mut *tx)
                .await?
            }
        };

        let Some(remaining) = remaining else {
            tx.rollback().await?;
            return Ok(SpinConsumption::denied());
        };

        sqlx::query(
            "UPDATE campaigns SET total_spins_used = total_spins_used + 1 WHERE id = $1",
        )
        .bind(campaign_id.as_uuid())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(SpinConsumption::granted(
            u32::try_from(remaining).unwrap_or(0),
        ))
    }

    async fn add_inventory(&self, items: &[PrizeInventoryItem]) -> Result<(), SpinError> {
        let mut tx = self.pool.begin().await?;
        for item in items {
            sqlx::query(
                "INSERT INTO prize_inventory (id, campaign_id, nft_id, token_id, status, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(item.id.as_uuid())
            .bind(item.campaign_id.as_uuid())
            .bind(&item.nft_id)
            .bind(item.token_id.as_deref())
            .bind(item.status.as_str())
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn reserve_inventory(
        &self,
        campaign_id: CampaignId,
        nft_id: &str,
        wallet_address: &str,
        spin_id: SpinHistoryId,
        now: DateTime<Utc>,
    ) -> Result<Option<PrizeInventoryItem>, SpinError> {
        sqlx::query_as::<_, InventoryRow>(&format!(
            "UPDATE prize_inventory \
             SET status = 'reserved', reserved_for_spin_history_id = $4, \
                 reserved_by = $3, reserved_at = $5 \
             WHERE id = ( \
                 SELECT id FROM prize_inventory \
                 WHERE campaign_id = $1 AND nft_id = $2 AND status = 'available' \
                 ORDER BY created_at, id \
                 LIMIT 1 \
                 FOR UPDATE SKIP LOCKED \
             ) AND status = 'available' \
             RETURNING {INVENTORY_COLUMNS}"
        ))
        .bind(campaign_id.as_uuid())
        .bind(nft_id)
        .bind(wallet_address)
        .bind(spin_id.as_uuid())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .map(PrizeInventoryItem::try_from)
        .transpose()
    }

    async fn get_inventory_item(
        &self,
        id: InventoryId,
    ) -> Result<Option<PrizeInventoryItem>, SpinError> {
        sqlx::query_as::<_, InventoryRow>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM prize_inventory WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .map(PrizeInventoryItem::try_from)
        .transpose()
    }

    async fn list_stale_reservations(
        &self,
        campaign_id: CampaignId,
        before: DateTime<Utc>,
    ) -> Result<Vec<PrizeInventoryItem>, SpinError> {
        sqlx::query_as::<_, InventoryRow>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM prize_inventory \
             WHERE campaign_id = $1 AND status = 'reserved' AND reserved_at < $2 \
             ORDER BY reserved_at"
        ))
        .bind(campaign_id.as_uuid())
        .bind(before)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(PrizeInventoryItem::try_from)
        .collect()
    }

    async fn insert_spin_history(&self, spin: &SpinHistory) -> Result<(), SpinError> {
        let visual_segment_index = spin
            .visual_segment_index
            .map(|i| to_i32(i, "visual_segment_index"))
            .transpose()?;

        sqlx::query(&format!(
            "INSERT INTO spin_history ({HISTORY_COLUMNS}, prize_type) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        ))
        .bind(spin.id.as_uuid())
        .bind(spin.campaign_id.as_uuid())
        .bind(&spin.wallet_address)
        .bind(spin.outcome.as_ref().map(Json))
        .bind(spin.status.as_str())
        .bind(spin.tx_hash.as_deref())
        .bind(spin.error_message.as_deref())
        .bind(&spin.result_hash)
        .bind(visual_segment_index)
        .bind(spin.created_at)
        .bind(spin.updated_at)
        .bind(spin.prize_type().map(|t| t.as_str()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_spin_history(&self, id: SpinHistoryId) -> Result<Option<SpinHistory>, SpinError> {
        sqlx::query_as::<_, HistoryRow>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM spin_history WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?
        .map(SpinHistory::try_from)
        .transpose()
    }

    async fn list_spin_history(
        &self,
        campaign_id: CampaignId,
        wallet_address: Option<&str>,
        status: Option<SpinStatus>,
    ) -> Result<Vec<SpinHistory>, SpinError> {
        sqlx::query_as::<_, HistoryRow>(&format!(
            "SELECT {HISTORY_COLUMNS} FROM spin_history \
             WHERE campaign_id = $1 \
               AND ($2::TEXT IS NULL OR wallet_address = $2) \
               AND ($3::TEXT IS NULL OR status = $3) \
             ORDER BY created_at DESC"
        ))
        .bind(campaign_id.as_uuid())
        .bind(wallet_address)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(SpinHistory::try_from)
        .collect()
    }

    async fn begin_claim(&self, id: SpinHistoryId, now: DateTime<Utc>) -> Result<bool, SpinError> {
        let result = sqlx::query(
            "UPDATE spin_history SET status = 'claiming', updated_at = $2 \
             WHERE id = $1 AND status IN ('reserved', 'failed')",
        )
        .bind(id.as_uuid())
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn complete_claim(
        &self,
        id: SpinHistoryId,
        inventory_id: InventoryId,
        wallet_address: &str,
        tx_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SpinError> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query(
            "UPDATE prize_inventory SET status = 'claimed', claimed_by = $3, claimed_at = $4 \
             WHERE id = $1 AND reserved_for_spin_history_id = $2 AND status = 'reserved'",
        )
        .bind(inventory_id.as_uuid())
        .bind(id.as_uuid())
        .bind(wallet_address)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        if claimed.rows_affected() != 1 {
            return Err(SpinError::Persistence(format!(
                "inventory unit {inventory_id} is not reserved for spin {id}"
            )));
        }

        let campaign_id = sqlx::query_scalar::<_, Uuid>(
            "UPDATE spin_history \
             SET status = 'completed', tx_hash = $2, error_message = NULL, updated_at = $3 \
             WHERE id = $1 AND status = 'claiming' \
             RETURNING campaign_id",
        )
        .bind(id.as_uuid())
        .bind(tx_hash)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| SpinError::Persistence(format!("spin {id} is not claiming")))?;

        sqlx::query(
            "UPDATE campaigns SET total_prizes_claimed = total_prizes_claimed + 1 WHERE id = $1",
        )
        .bind(campaign_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn fail_claim(
        &self,
        id: SpinHistoryId,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SpinError> {
        let result = sqlx::query(
            "UPDATE spin_history SET status = 'failed', error_message = $2, updated_at = $3 \
             WHERE id = $1 AND status = 'claiming'",
        )
        .bind(id.as_uuid())
        .bind(error_message)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SpinError::Persistence(format!("spin {id} is not claiming")));
        }
        Ok(())
    }

    async fn campaign_stats(&self, campaign_id: CampaignId) -> Result<CampaignStats, SpinError> {
        let campaign = self
            .get_campaign(campaign_id)
            .await?
            .ok_or(SpinError::CampaignNotFound(campaign_id))?;

        let spin_rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM spin_history WHERE campaign_id = $1 GROUP BY status",
        )
        .bind(campaign_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        let mut spins = SpinCounts::default();
        for (status, count) in spin_rows {
            let status: SpinStatus = status.parse().map_err(SpinError::Persistence)?;
            spins.record(status, to_u64(count, "spin count")?);
        }

        let inventory_rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM prize_inventory WHERE campaign_id = $1 GROUP BY status",
        )
        .bind(campaign_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        let mut inventory = InventoryCounts::default();
        for (status, count) in inventory_rows {
            inventory.record(
                status.parse().map_err(SpinError::Persistence)?,
                to_u64(count, "inventory count")?,
            );
        }

        let whitelist_entries = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM whitelist_entries WHERE campaign_id = $1",
        )
        .bind(campaign_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;

        Ok(CampaignStats {
            campaign_id,
            total_spins_used: campaign.total_spins_used,
            total_prizes_claimed: campaign.total_prizes_claimed,
            whitelist_entries: to_u64(whitelist_entries, "whitelist count")?,
            spins,
            inventory,
        })
    }
}
