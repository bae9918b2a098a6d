//! Profit Advisor — lead-qualification chatbot backend.
//!
//! A fixed, linear conversational funnel that collects business metrics,
//! computes an annual profit-leak projection, scores the lead, and hands
//! the flattened record to persistence.

pub mod calc;
pub mod config;
pub mod error;
pub mod funnel;
pub mod geo;
pub mod qualify;
pub mod routes;
pub mod store;
