//! libSQL lead store — async [`LeadStore`] implementation.
//!
//! Supports local file and in-memory databases. A single connection is
//! reused for all operations; `libsql::Connection` is `Send + Sync` and
//! safe for concurrent async use.

use std::path::Path;

use async_trait::async_trait;
use libsql::{Connection, params};
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::{LeadRecord, LeadStore};

pub struct LibSqlLeadStore {
    conn: Connection,
}

impl LibSqlLeadStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Connection(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Connection(format!("Failed to open database: {e}")))?;
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to connect: {e}")))?;

        migrations::run_migrations(&conn).await?;
        info!(path = %path.display(), "Lead store opened");
        Ok(Self { conn })
    }

    /// Create an in-memory store (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Connection(format!("Failed to create in-memory database: {e}"))
            })?;
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Connection(format!("Failed to connect: {e}")))?;

        migrations::run_migrations(&conn).await?;
        Ok(Self { conn })
    }
}

fn apps_json(record: &LeadRecord) -> Result<String, DatabaseError> {
    serde_json::to_string(&record.third_party_apps)
        .map_err(|e| DatabaseError::Serialization(e.to_string()))
}

#[async_trait]
impl LeadStore for LibSqlLeadStore {
    async fn upsert_lead(
        &self,
        record: &LeadRecord,
        id: Option<i64>,
    ) -> Result<i64, DatabaseError> {
        let apps = apps_json(record)?;

        match id {
            Some(id) => {
                let affected = self
                    .conn
                    .execute(
                        "UPDATE leads SET
                            lead_source = ?1, business_type = ?2, third_party_apps = ?3,
                            email = ?4, aov = ?5, monthly_orders = ?6, commission_rate = ?7,
                            monthly_fixed_fee = ?8, calculated_annual_leak = ?9,
                            estimated_recovery = ?10, lead_score_tag = ?11, ip_address = ?12,
                            city = ?13, region = ?14, country = ?15, country_code = ?16,
                            is_completed = ?17, consultation_requested = ?18,
                            updated_at = datetime('now')
                         WHERE id = ?19",
                        params![
                            record.lead_source.as_str(),
                            record.business_type.clone(),
                            apps,
                            record.email.clone(),
                            record.aov,
                            record.monthly_orders.map(|v| v as i64),
                            record.commission_rate,
                            record.monthly_fixed_fee,
                            record.calculated_annual_leak,
                            record.estimated_recovery,
                            record.lead_score_tag.clone(),
                            record.ip_address.clone(),
                            record.city.clone(),
                            record.region.clone(),
                            record.country.clone(),
                            record.country_code.clone(),
                            record.is_completed as i64,
                            record.consultation_requested as i64,
                            id,
                        ],
                    )
                    .await?;
                if affected == 0 {
                    return Err(DatabaseError::NotFound(id));
                }
                debug!(id, "lead updated");
                Ok(id)
            }
            None => {
                self.conn
                    .execute(
                        "INSERT INTO leads (
                            lead_source, business_type, third_party_apps, email, aov,
                            monthly_orders, commission_rate, monthly_fixed_fee,
                            calculated_annual_leak, estimated_recovery, lead_score_tag,
                            ip_address, city, region, country, country_code,
                            is_completed, consultation_requested
                         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                                   ?13, ?14, ?15, ?16, ?17, ?18)",
                        params![
                            record.lead_source.as_str(),
                            record.business_type.clone(),
                            apps,
                            record.email.clone(),
                            record.aov,
                            record.monthly_orders.map(|v| v as i64),
                            record.commission_rate,
                            record.monthly_fixed_fee,
                            record.calculated_annual_leak,
                            record.estimated_recovery,
                            record.lead_score_tag.clone(),
                            record.ip_address.clone(),
                            record.city.clone(),
                            record.region.clone(),
                            record.country.clone(),
                            record.country_code.clone(),
                            record.is_completed as i64,
                            record.consultation_requested as i64,
                        ],
                    )
                    .await?;
                let id = self.conn.last_insert_rowid();
                debug!(id, "lead inserted");
                Ok(id)
            }
        }
    }

    async fn mark_consultation_requested(&self, id: i64) -> Result<(), DatabaseError> {
        let affected = self
            .conn
            .execute(
                "UPDATE leads SET consultation_requested = 1, updated_at = datetime('now')
                 WHERE id = ?1",
                params![id],
            )
            .await?;
        if affected == 0 {
            return Err(DatabaseError::NotFound(id));
        }
        Ok(())
    }

    async fn get_lead(&self, id: i64) -> Result<Option<LeadRecord>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                "SELECT lead_source, business_type, third_party_apps, email, aov,
                        monthly_orders, commission_rate, monthly_fixed_fee,
                        calculated_annual_leak, estimated_recovery, lead_score_tag,
                        ip_address, city, region, country, country_code,
                        is_completed, consultation_requested
                 FROM leads WHERE id = ?1",
                params![id],
            )
            .await?;

        let Some(row) = rows.next().await? else {
            return Ok(None);
        };

        let apps_str: String = row.get(2)?;
        let third_party_apps: Vec<String> = serde_json::from_str(&apps_str)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        Ok(Some(LeadRecord {
            lead_source: row.get(0)?,
            business_type: row.get(1)?,
            third_party_apps,
            email: row.get(3)?,
            aov: row.get(4)?,
            monthly_orders: row.get::<Option<i64>>(5)?.map(|v| v as u32),
            commission_rate: row.get(6)?,
            monthly_fixed_fee: row.get(7)?,
            calculated_annual_leak: row.get(8)?,
            estimated_recovery: row.get(9)?,
            lead_score_tag: row.get(10)?,
            ip_address: row.get(11)?,
            city: row.get(12)?,
            region: row.get(13)?,
            country: row.get(14)?,
            country_code: row.get(15)?,
            is_completed: row.get::<i64>(16)? != 0,
            consultation_requested: row.get::<i64>(17)? != 0,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_lead() -> LeadRecord {
        LeadRecord {
            lead_source: "ProfitAdvisor_Chatbot".into(),
            business_type: Some("Restaurant".into()),
            third_party_apps: vec!["DoorDash".into(), "Uber Eats".into()],
            email: Some("owner@example.com".into()),
            aov: Some(35.5),
            monthly_orders: Some(400),
            commission_rate: Some(30.0),
            monthly_fixed_fee: Some(100.0),
            calculated_annual_leak: Some(104_724.0),
            estimated_recovery: Some(102_118.0),
            lead_score_tag: Some("High Priority".into()),
            is_completed: true,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn insert_then_fetch_roundtrip() {
        let store = LibSqlLeadStore::new_memory().await.unwrap();
        let lead = sample_lead();

        let id = store.upsert_lead(&lead, None).await.unwrap();
        let fetched = store.get_lead(id).await.unwrap().unwrap();
        assert_eq!(fetched, lead);
    }

    #[tokio::test]
    async fn upsert_with_id_updates_in_place() {
        let store = LibSqlLeadStore::new_memory().await.unwrap();

        let id = store.upsert_lead(&sample_lead(), None).await.unwrap();

        let mut updated = sample_lead();
        updated.email = Some("newaddress@example.com".into());
        updated.consultation_requested = true;
        let id2 = store.upsert_lead(&updated, Some(id)).await.unwrap();
        assert_eq!(id, id2, "update keeps the same row");

        let fetched = store.get_lead(id).await.unwrap().unwrap();
        assert_eq!(fetched.email.as_deref(), Some("newaddress@example.com"));
        assert!(fetched.consultation_requested);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = LibSqlLeadStore::new_memory().await.unwrap();
        let err = store.upsert_lead(&sample_lead(), Some(999)).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(999)));
    }

    #[tokio::test]
    async fn mark_consultation_requested_flags_row() {
        let store = LibSqlLeadStore::new_memory().await.unwrap();
        let id = store.upsert_lead(&sample_lead(), None).await.unwrap();

        store.mark_consultation_requested(id).await.unwrap();
        let fetched = store.get_lead(id).await.unwrap().unwrap();
        assert!(fetched.consultation_requested);

        let err = store.mark_consultation_requested(12345).await.unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn get_unknown_lead_is_none() {
        let store = LibSqlLeadStore::new_memory().await.unwrap();
        assert!(store.get_lead(42).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn migrations_are_idempotent_on_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.db");

        let store = LibSqlLeadStore::new_local(&path).await.unwrap();
        let id = store.upsert_lead(&sample_lead(), None).await.unwrap();
        drop(store);

        let reopened = LibSqlLeadStore::new_local(&path).await.unwrap();
        let fetched = reopened.get_lead(id).await.unwrap().unwrap();
        assert_eq!(fetched.business_type.as_deref(), Some("Restaurant"));
    }
}
