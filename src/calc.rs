//! Financial calculation engine.
//!
//! Pure functions only: the funnel feeds collected metrics in, gets dollar
//! figures and a lead-priority tag back. Two models coexist — the historical
//! "leak" model and the canonical "gain" model the funnel actually uses.

use serde::{Deserialize, Serialize};

/// Assumed payment-processing fee on the incumbent third-party channel.
pub const THIRD_PARTY_FEE_RATE: f64 = 0.035;
/// Assumed payment-processing fee on a direct channel.
pub const DIRECT_FEE_RATE: f64 = 0.029;
/// Effective combined fee rate of the direct-ordering platform.
pub const DIRECT_PLATFORM_EFFECTIVE_RATE: f64 = 0.10;
/// Fraction of annual revenue attributed to owning customer relationship data.
pub const CUSTOMER_DATA_UPLIFT_FACTOR: f64 = 0.40;
/// Annualization factor.
pub const MONTHS_PER_YEAR: f64 = 12.0;
/// Fraction of avoidable direct costs assumed actually recoverable.
pub const RECOVERY_EFFICIENCY: f64 = 0.95;

/// Constituent terms of the historical leak model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeakMetrics {
    pub annual_commission_loss: f64,
    pub annual_payment_fee_leak: f64,
    pub annual_fixed_fee_loss: f64,
    pub lost_customer_lifetime_value: f64,
    pub total_annual_leak: f64,
    pub recovery_amount: f64,
}

/// Constituent terms of the canonical gain model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainMetrics {
    /// May be negative when the incumbent commission rate is already below
    /// the direct platform's effective rate. Deliberately not clamped.
    pub commission_fee_savings: f64,
    pub fixed_fee_savings: f64,
    pub lclv_gain: f64,
    pub total_avoidable_costs: f64,
    pub total_profit_gain_potential: f64,
}

/// Historical leak model.
///
/// `commission_rate_pct` is a percentage (30 means 30%), `monthly_fixed_fee`
/// is a monthly dollar amount.
pub fn compute_leak(
    aov: f64,
    monthly_orders: u32,
    commission_rate_pct: f64,
    monthly_fixed_fee: f64,
) -> LeakMetrics {
    let orders = monthly_orders as f64;
    let annual_volume = aov * orders * MONTHS_PER_YEAR;

    let annual_commission_loss = annual_volume * (commission_rate_pct / 100.0);
    let annual_payment_fee_leak = annual_volume * (THIRD_PARTY_FEE_RATE - DIRECT_FEE_RATE);
    let annual_fixed_fee_loss = monthly_fixed_fee * MONTHS_PER_YEAR;
    let lost_customer_lifetime_value = annual_volume * CUSTOMER_DATA_UPLIFT_FACTOR;

    let total_annual_leak = annual_commission_loss
        + annual_payment_fee_leak
        + annual_fixed_fee_loss
        + lost_customer_lifetime_value;
    let recovery_amount = (annual_commission_loss + annual_payment_fee_leak + annual_fixed_fee_loss)
        * RECOVERY_EFFICIENCY
        + lost_customer_lifetime_value;

    LeakMetrics {
        annual_commission_loss,
        annual_payment_fee_leak,
        annual_fixed_fee_loss,
        lost_customer_lifetime_value,
        total_annual_leak,
        recovery_amount,
    }
}

/// Canonical gain model (supersedes the leak model for the live funnel).
pub fn compute_gain(
    aov: f64,
    monthly_orders: u32,
    commission_rate_pct: f64,
    monthly_fixed_fee: f64,
) -> GainMetrics {
    let annual_revenue_base = aov * monthly_orders as f64 * MONTHS_PER_YEAR;

    let commission_fee_savings =
        ((commission_rate_pct / 100.0) - DIRECT_PLATFORM_EFFECTIVE_RATE) * annual_revenue_base;
    let fixed_fee_savings = monthly_fixed_fee * MONTHS_PER_YEAR;
    let lclv_gain = annual_revenue_base * CUSTOMER_DATA_UPLIFT_FACTOR;

    let total_avoidable_costs = commission_fee_savings + fixed_fee_savings;
    let total_profit_gain_potential = total_avoidable_costs * RECOVERY_EFFICIENCY + lclv_gain;

    GainMetrics {
        commission_fee_savings,
        fixed_fee_savings,
        lclv_gain,
        total_avoidable_costs,
        total_profit_gain_potential,
    }
}

/// Coarse three-tier classification of a completed traversal's magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadScore {
    Low,
    Medium,
    #[serde(rename = "High Priority")]
    HighPriority,
}

impl std::fmt::Display for LeadScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::HighPriority => "High Priority",
        };
        write!(f, "{s}")
    }
}

/// Score a lead by total annual value. Upper edges are inclusive: exactly
/// 20000 is Low, exactly 60000 is Medium.
pub fn score_lead(total_value: f64) -> LeadScore {
    if total_value <= 20_000.0 {
        LeadScore::Low
    } else if total_value <= 60_000.0 {
        LeadScore::Medium
    } else {
        LeadScore::HighPriority
    }
}

/// One line of the proportional breakdown shown on the result card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
    pub value: f64,
    pub percentage: f64,
    pub formatted: String,
}

/// Compute each constituent's share of the constituents' sum.
///
/// Returns one entry per input, in order. When the sum is zero or negative
/// the shares are meaningless, so every entry is zeroed instead of dividing.
pub fn breakdown(constituents: &[f64]) -> Vec<BreakdownEntry> {
    let total: f64 = constituents.iter().sum();
    constituents
        .iter()
        .map(|&value| {
            let percentage = if total > 0.0 {
                value / total * 100.0
            } else {
                0.0
            };
            BreakdownEntry {
                value,
                percentage,
                formatted: format_currency(value),
            }
        })
        .collect()
}

/// Format a dollar amount as `$48,300` — rounded to whole dollars,
/// thousands-separated.
pub fn format_currency(value: f64) -> String {
    let negative = value < 0.0;
    let rounded = value.abs().round() as u64;
    let digits = rounded.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - offset) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if negative {
        format!("-${out}")
    } else {
        format!("${out}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lead_score_boundaries() {
        assert_eq!(score_lead(20_000.0), LeadScore::Low);
        assert_eq!(score_lead(20_000.01), LeadScore::Medium);
        assert_eq!(score_lead(60_000.0), LeadScore::Medium);
        assert_eq!(score_lead(60_000.01), LeadScore::HighPriority);
        assert_eq!(score_lead(0.0), LeadScore::Low);
        assert_eq!(score_lead(-5.0), LeadScore::Low);
    }

    #[test]
    fn lead_score_display() {
        assert_eq!(LeadScore::Low.to_string(), "Low");
        assert_eq!(LeadScore::Medium.to_string(), "Medium");
        assert_eq!(LeadScore::HighPriority.to_string(), "High Priority");
    }

    #[test]
    fn leak_model_reference_values() {
        // aov=35.50, 400 orders/mo, 30% commission, $100/mo fixed
        let m = compute_leak(35.50, 400, 30.0, 100.0);
        assert!((m.annual_commission_loss - 51_120.0).abs() < 1e-6);
        assert!((m.annual_fixed_fee_loss - 1_200.0).abs() < 1e-6);

        let sum = m.annual_commission_loss
            + m.annual_payment_fee_leak
            + m.annual_fixed_fee_loss
            + m.lost_customer_lifetime_value;
        assert!((m.total_annual_leak - sum).abs() < 1e-9);
    }

    #[test]
    fn leak_recovery_discounts_direct_costs_only() {
        let m = compute_leak(50.0, 100, 25.0, 0.0);
        let direct = m.annual_commission_loss + m.annual_payment_fee_leak + m.annual_fixed_fee_loss;
        let expected = direct * RECOVERY_EFFICIENCY + m.lost_customer_lifetime_value;
        assert!((m.recovery_amount - expected).abs() < 1e-9);
        // LCLV is not discounted, so recovery < total but > total * 0.95
        assert!(m.recovery_amount < m.total_annual_leak);
        assert!(m.recovery_amount > m.total_annual_leak * RECOVERY_EFFICIENCY);
    }

    #[test]
    fn gain_model_terms() {
        let m = compute_gain(40.0, 500, 30.0, 150.0);
        let base = 40.0 * 500.0 * 12.0;
        assert!((m.commission_fee_savings - (0.30 - 0.10) * base).abs() < 1e-9);
        assert!((m.fixed_fee_savings - 1_800.0).abs() < 1e-9);
        assert!((m.lclv_gain - base * 0.40).abs() < 1e-9);
        assert!(
            (m.total_profit_gain_potential
                - (m.total_avoidable_costs * 0.95 + m.lclv_gain))
                .abs()
                < 1e-9
        );
    }

    #[test]
    fn gain_commission_savings_not_clamped() {
        // Incumbent rate below the direct platform's effective 10% rate:
        // the savings term goes negative and stays negative.
        let m = compute_gain(40.0, 500, 5.0, 0.0);
        assert!(m.commission_fee_savings < 0.0);
        assert!(m.total_avoidable_costs < 0.0);
    }

    #[test]
    fn breakdown_sums_to_hundred() {
        let m = compute_gain(35.50, 400, 30.0, 100.0);
        let entries = breakdown(&[m.commission_fee_savings, m.fixed_fee_savings, m.lclv_gain]);
        let pct: f64 = entries.iter().map(|e| e.percentage).sum();
        assert!((pct - 100.0).abs() < 1e-6, "percentages sum to {pct}");
    }

    #[test]
    fn breakdown_zeroed_on_nonpositive_total() {
        let entries = breakdown(&[-500.0, 200.0, 300.0]);
        assert_eq!(entries.len(), 3);
        for e in &entries {
            assert_eq!(e.percentage, 0.0);
        }

        let empty = breakdown(&[]);
        assert!(empty.is_empty());
    }

    #[test]
    fn breakdown_preserves_order_and_values() {
        let entries = breakdown(&[100.0, 300.0]);
        assert_eq!(entries[0].value, 100.0);
        assert_eq!(entries[1].value, 300.0);
        assert!((entries[0].percentage - 25.0).abs() < 1e-9);
        assert!((entries[1].percentage - 75.0).abs() < 1e-9);
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(48_300.0), "$48,300");
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(999.0), "$999");
        assert_eq!(format_currency(1_000.0), "$1,000");
        assert_eq!(format_currency(1_234_567.4), "$1,234,567");
        assert_eq!(format_currency(51_120.49), "$51,120");
        assert_eq!(format_currency(-2_500.0), "-$2,500");
    }
}
