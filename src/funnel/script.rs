//! The funnel script — the fixed, ordered catalog of conversation steps.
//!
//! The catalog is pure data (serializable, no embedded closures); per-step
//! validation lives in the machine's dispatch, keyed by [`StepId`].

use serde::{Deserialize, Serialize};

/// The steps of the funnel, in script order.
///
/// Progresses linearly: Intro → BusinessType → Aov → Orders → Commission →
/// FixedFees → ThirdPartyApps → Email → Result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Intro,
    BusinessType,
    Aov,
    Orders,
    Commission,
    FixedFees,
    ThirdPartyApps,
    Email,
    Result,
}

impl StepId {
    /// The successor step, or `None` for the terminal step.
    pub fn next(&self) -> Option<StepId> {
        use StepId::*;
        match self {
            Intro => Some(BusinessType),
            BusinessType => Some(Aov),
            Aov => Some(Orders),
            Orders => Some(Commission),
            Commission => Some(FixedFees),
            FixedFees => Some(ThirdPartyApps),
            ThirdPartyApps => Some(Email),
            Email => Some(Result),
            Result => None,
        }
    }

    /// Whether this is the terminal step (no outgoing transition).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Result)
    }
}

impl Default for StepId {
    fn default() -> Self {
        Self::Intro
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Intro => "intro",
            Self::BusinessType => "business_type",
            Self::Aov => "aov",
            Self::Orders => "orders",
            Self::Commission => "commission",
            Self::FixedFees => "fixed_fees",
            Self::ThirdPartyApps => "third_party_apps",
            Self::Email => "email",
            Self::Result => "result",
        };
        write!(f, "{s}")
    }
}

/// How the client should render the input control for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// Single call-to-action button, no data collected.
    Button,
    /// Pick exactly one of `options`.
    SelectButton,
    /// Pick one or more of `options`.
    MultiSelect,
    NumericFloat,
    NumericInt,
    Email,
    /// Terminal step — nothing to collect.
    None,
}

/// One entry of the static step catalog.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StepDefinition {
    pub id: StepId,
    pub prompt: &'static str,
    pub input_kind: InputKind,
    /// Allowed choice labels. Non-empty only for select steps.
    pub options: &'static [&'static str],
}

pub const BUSINESS_TYPES: &[&str] = &[
    "Restaurant",
    "Cafe / Bakery",
    "Food Truck",
    "Ghost Kitchen",
    "Other",
];

pub const THIRD_PARTY_PLATFORMS: &[&str] =
    &["DoorDash", "Uber Eats", "Grubhub", "Postmates", "Other"];

/// The complete script, in traversal order.
pub const SCRIPT: &[StepDefinition] = &[
    StepDefinition {
        id: StepId::Intro,
        prompt: "Welcome! I'm your Profit Leakage Calculator. I specialize in quantifying \
                 the hidden costs of third-party apps. Ready to see your **Annual Profit Leak**?",
        input_kind: InputKind::Button,
        options: &[],
    },
    StepDefinition {
        id: StepId::BusinessType,
        prompt: "First, what kind of business do you run?",
        input_kind: InputKind::SelectButton,
        options: BUSINESS_TYPES,
    },
    StepDefinition {
        id: StepId::Aov,
        prompt: "Excellent. What is your typical average order value (AOV) for \
                 third-party orders? (e.g., 35.50)",
        input_kind: InputKind::NumericFloat,
        options: &[],
    },
    StepDefinition {
        id: StepId::Orders,
        prompt: "Roughly, how many third-party delivery orders do you process per month? \
                 (e.g., 400)",
        input_kind: InputKind::NumericInt,
        options: &[],
    },
    StepDefinition {
        id: StepId::Commission,
        prompt: "We need the primary pain point: What is the estimated commission rate \
                 you pay (e.g., 25, 30)? Please enter as a whole number (%).",
        input_kind: InputKind::NumericFloat,
        options: &[],
    },
    StepDefinition {
        id: StepId::FixedFees,
        prompt: "Do you pay any fixed monthly fees to these platforms — subscriptions, \
                 tablet rentals, marketing packages? Enter the monthly total, or 0 if none.",
        input_kind: InputKind::NumericFloat,
        options: &[],
    },
    StepDefinition {
        id: StepId::ThirdPartyApps,
        prompt: "Which third-party platforms are you currently on? Select all that apply.",
        input_kind: InputKind::MultiSelect,
        options: THIRD_PARTY_PLATFORMS,
    },
    StepDefinition {
        id: StepId::Email,
        prompt: "Great! I have all the numbers. To generate and email you the full \
                 **Profit Recovery Report** with the breakdown, what is your best \
                 email address?",
        input_kind: InputKind::Email,
        options: &[],
    },
    StepDefinition {
        id: StepId::Result,
        prompt: "Calculation complete.",
        input_kind: InputKind::None,
        options: &[],
    },
];

/// Look up a step's catalog entry. Total over `StepId`, so this cannot fail.
pub fn definition(id: StepId) -> &'static StepDefinition {
    SCRIPT
        .iter()
        .find(|s| s.id == id)
        .expect("every StepId has a catalog entry")
}
