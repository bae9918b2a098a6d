//! Session accumulator — one typed record per funnel traversal.

use serde::{Deserialize, Serialize};

/// Everything collected so far in one traversal.
///
/// Each field is written exactly once, by the state machine, when its step
/// passes validation. The client carries the whole record back on every
/// request, so the server stays stateless between turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aov: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_orders: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_fixed_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub third_party_apps: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Lead-store row id, carried round-trip so repeated saves update the
    /// same record instead of inserting duplicates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<i64>,
}
