//! The conversation state machine — turn sequencing, validation dispatch,
//! session accumulation, terminal calculation.
//!
//! One call per user turn: [`FunnelMachine::advance`] validates the raw
//! input against the current step, writes the parsed value into the
//! session, and moves to the successor. Rejections keep the step and the
//! session untouched. Entering the terminal step runs the calculation
//! engine and attaches the result payload.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calc::{self, BreakdownEntry, GainMetrics, LeadScore};
use crate::error::FunnelError;
use crate::funnel::script::{self, InputKind, StepId};
use crate::funnel::session::SessionData;
use crate::qualify::EmailQualifier;
use crate::store::LeadRecord;

/// Tag written into every lead record produced by this funnel.
pub const LEAD_SOURCE: &str = "ProfitAdvisor_Chatbot";

const REJECT_GENERIC: &str = "Invalid input. Please try again.";
const REJECT_NUMBER: &str = "Invalid format. Please enter a valid number.";
const REJECT_EMAIL: &str = "Hmm, that doesn't look like a working business email. \
                            Please double-check it and try again.";

/// Raw user input as posted by the client: a string for text/select steps,
/// an array for multi-select.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserInput {
    Text(String),
    Choices(Vec<String>),
}

/// The payload attached when a traversal reaches the terminal step.
#[derive(Debug, Clone, Serialize)]
pub struct FunnelResult {
    pub metrics: GainMetrics,
    pub lead_score: LeadScore,
    /// Headline annual figure, e.g. `"$48,300"`.
    pub formatted_leak: String,
    pub formatted_recovery: String,
    pub breakdown: ResultBreakdown,
    /// Flattened record for the lead store / CRM hand-off.
    pub crm_payload: LeadRecord,
}

/// Per-category share of the headline figure.
#[derive(Debug, Clone, Serialize)]
pub struct ResultBreakdown {
    pub commission_loss: BreakdownEntry,
    pub fixed_fee_loss: BreakdownEntry,
    pub lost_customer_value: BreakdownEntry,
}

/// Outcome of one `advance` call.
#[derive(Debug)]
pub enum Transition {
    /// Input accepted; the machine is now at `step`.
    Advanced {
        step: StepId,
        /// Present only when `step` is the terminal step.
        result: Option<Box<FunnelResult>>,
    },
    /// Input rejected; the machine stays at `step`, session untouched.
    Rejected { step: StepId, message: String },
}

/// Drives a scripted funnel traversal. Holds no per-conversation state —
/// the caller threads [`SessionData`] through every call.
pub struct FunnelMachine {
    qualifier: EmailQualifier,
}

impl FunnelMachine {
    pub fn new(qualifier: EmailQualifier) -> Self {
        Self { qualifier }
    }

    /// Prompt text for a step.
    pub fn prompt(step: StepId) -> &'static str {
        script::definition(step).prompt
    }

    /// Choice labels for a step, only when the step has any.
    pub fn options(step: StepId) -> Option<&'static [&'static str]> {
        let options = script::definition(step).options;
        (!options.is_empty()).then_some(options)
    }

    /// Input control kind for a step.
    pub fn input_kind(step: StepId) -> InputKind {
        script::definition(step).input_kind
    }

    /// Process one user turn at `step`.
    ///
    /// Returns `Err` only for caller errors (advancing the terminal step,
    /// or a session missing fields a prior step should have written).
    /// Every user-input problem resolves to [`Transition::Rejected`].
    pub async fn advance(
        &self,
        step: StepId,
        session: &mut SessionData,
        input: Option<&UserInput>,
    ) -> Result<Transition, FunnelError> {
        if step.is_terminal() {
            return Err(FunnelError::TerminalStep(step));
        }

        if let Some(message) = self.validate_and_store(step, session, input).await {
            debug!(%step, %message, "input rejected");
            return Ok(Transition::Rejected { step, message });
        }

        // Chain invariant: every non-terminal step has a successor.
        let next = step.next().expect("non-terminal step has a successor");
        debug!(from = %step, to = %next, "step advanced");

        let result = if next.is_terminal() {
            Some(Box::new(compute_result(session)?))
        } else {
            None
        };

        Ok(Transition::Advanced { step: next, result })
    }

    /// Validate `input` for `step` and, on success, write the parsed value
    /// into the session. Returns a rejection message on failure.
    async fn validate_and_store(
        &self,
        step: StepId,
        session: &mut SessionData,
        input: Option<&UserInput>,
    ) -> Option<String> {
        let text = match input {
            Some(UserInput::Text(t)) => Some(t.trim()),
            _ => None,
        };

        match step {
            StepId::Intro => None, // CTA button, nothing to validate
            StepId::BusinessType => match text {
                Some(choice) if script::BUSINESS_TYPES.contains(&choice) => {
                    session.business_type = Some(choice.to_string());
                    None
                }
                _ => Some(REJECT_GENERIC.into()),
            },
            StepId::Aov => match text.and_then(|t| t.parse::<f64>().ok()) {
                Some(v) if v > 0.0 && v.is_finite() => {
                    session.aov = Some(v);
                    None
                }
                _ => Some(REJECT_NUMBER.into()),
            },
            StepId::Orders => match text.and_then(|t| t.parse::<u32>().ok()) {
                Some(v) if v > 0 => {
                    session.monthly_orders = Some(v);
                    None
                }
                _ => Some(REJECT_NUMBER.into()),
            },
            StepId::Commission => match text.and_then(|t| t.parse::<f64>().ok()) {
                Some(v) if v > 0.0 && v <= 100.0 => {
                    session.commission_rate = Some(v);
                    None
                }
                _ => Some(REJECT_NUMBER.into()),
            },
            StepId::FixedFees => match text.and_then(|t| t.parse::<f64>().ok()) {
                Some(v) if v >= 0.0 && v.is_finite() => {
                    session.monthly_fixed_fee = Some(v);
                    None
                }
                _ => Some(REJECT_NUMBER.into()),
            },
            StepId::ThirdPartyApps => {
                // Single selection may arrive as a bare string.
                let apps: Vec<String> = match input {
                    Some(UserInput::Choices(c)) => c.clone(),
                    Some(UserInput::Text(t)) if !t.trim().is_empty() => {
                        vec![t.trim().to_string()]
                    }
                    _ => Vec::new(),
                };
                if apps.is_empty() {
                    return Some(REJECT_GENERIC.into());
                }
                session.third_party_apps = Some(apps);
                None
            }
            StepId::Email => {
                let candidate = text.unwrap_or_default();
                if self.qualifier.qualify(candidate).await {
                    session.email = Some(candidate.to_string());
                    None
                } else {
                    Some(REJECT_EMAIL.into())
                }
            }
            StepId::Result => unreachable!("terminal step is rejected before validation"),
        }
    }
}

/// Run the calculation engine over a completed session and assemble the
/// result payload.
fn compute_result(session: &SessionData) -> Result<FunnelResult, FunnelError> {
    let aov = session.aov.ok_or(FunnelError::MissingField("aov"))?;
    let orders = session
        .monthly_orders
        .ok_or(FunnelError::MissingField("monthly_orders"))?;
    let commission = session
        .commission_rate
        .ok_or(FunnelError::MissingField("commission_rate"))?;
    // The only defaultable input: script variants without the fixed-fee
    // step still produce a result.
    let fixed_fee = session.monthly_fixed_fee.unwrap_or(0.0);

    let metrics = calc::compute_gain(aov, orders, commission, fixed_fee);

    // Headline figure is the gross sum of the constituents; the recovery
    // figure applies the efficiency discount.
    let total_leak = metrics.commission_fee_savings + metrics.fixed_fee_savings + metrics.lclv_gain;
    let recovery = metrics.total_profit_gain_potential;
    let lead_score = calc::score_lead(total_leak);

    let entries = calc::breakdown(&[
        metrics.commission_fee_savings,
        metrics.fixed_fee_savings,
        metrics.lclv_gain,
    ]);
    let [commission_loss, fixed_fee_loss, lost_customer_value]: [BreakdownEntry; 3] = entries
        .try_into()
        .expect("breakdown returns one entry per constituent");

    let crm_payload = LeadRecord {
        lead_source: LEAD_SOURCE.to_string(),
        business_type: session.business_type.clone(),
        third_party_apps: session.third_party_apps.clone().unwrap_or_default(),
        email: session.email.clone(),
        aov: Some(aov),
        monthly_orders: Some(orders),
        commission_rate: Some(commission),
        monthly_fixed_fee: Some(fixed_fee),
        calculated_annual_leak: Some(total_leak),
        estimated_recovery: Some(recovery),
        lead_score_tag: Some(lead_score.to_string()),
        ip_address: None,
        city: None,
        region: None,
        country: None,
        country_code: None,
        is_completed: true,
        consultation_requested: false,
    };

    info!(
        total_leak = %calc::format_currency(total_leak),
        score = %lead_score,
        "funnel traversal completed"
    );

    Ok(FunnelResult {
        metrics,
        lead_score,
        formatted_leak: calc::format_currency(total_leak),
        formatted_recovery: calc::format_currency(recovery),
        breakdown: ResultBreakdown {
            commission_loss,
            fixed_fee_loss,
            lost_customer_value,
        },
        crm_payload,
    })
}
