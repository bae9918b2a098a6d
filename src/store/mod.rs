//! Lead persistence — the external collaborator the funnel hands records to.
//!
//! The funnel core never blocks on this layer: save failures are logged by
//! the transport and the conversation continues.

mod libsql_backend;
mod migrations;

pub use libsql_backend::LibSqlLeadStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DatabaseError;

/// Flattened lead record, field names matching the external CRM schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub lead_source: String,
    pub business_type: Option<String>,
    pub third_party_apps: Vec<String>,
    pub email: Option<String>,
    pub aov: Option<f64>,
    pub monthly_orders: Option<u32>,
    pub commission_rate: Option<f64>,
    pub monthly_fixed_fee: Option<f64>,
    pub calculated_annual_leak: Option<f64>,
    pub estimated_recovery: Option<f64>,
    pub lead_score_tag: Option<String>,
    pub ip_address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub is_completed: bool,
    pub consultation_requested: bool,
}

/// Backend-agnostic lead store.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Insert a new lead, or update the existing row when `id` is given.
    /// Returns the row id.
    async fn upsert_lead(
        &self,
        record: &LeadRecord,
        id: Option<i64>,
    ) -> Result<i64, DatabaseError>;

    /// Flag an existing lead as having requested a consultation.
    async fn mark_consultation_requested(&self, id: i64) -> Result<(), DatabaseError>;

    /// Fetch a lead by id.
    async fn get_lead(&self, id: i64) -> Result<Option<LeadRecord>, DatabaseError>;
}
