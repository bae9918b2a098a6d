//! End-to-end traversal: drive the funnel from intro to result, then
//! persist the produced lead record the way the transport layer does.

use std::sync::Arc;

use async_trait::async_trait;
use profit_advisor::calc::LeadScore;
use profit_advisor::funnel::{FunnelMachine, SessionData, StepId, Transition, UserInput};
use profit_advisor::qualify::{DomainReachability, EmailQualifier};
use profit_advisor::store::{LeadStore, LibSqlLeadStore};

struct AlwaysReachable;

#[async_trait]
impl DomainReachability for AlwaysReachable {
    async fn accepts_mail(&self, _domain: &str) -> bool {
        true
    }
}

fn machine() -> FunnelMachine {
    FunnelMachine::new(EmailQualifier::new(Arc::new(AlwaysReachable)))
}

async fn advance_ok(
    m: &FunnelMachine,
    step: StepId,
    session: &mut SessionData,
    input: UserInput,
) -> Transition {
    m.advance(step, session, Some(&input)).await.unwrap()
}

#[tokio::test]
async fn full_funnel_produces_and_persists_a_lead() {
    let m = machine();
    let mut session = SessionData::default();

    let turns = [
        (StepId::Intro, UserInput::Text("Start".into())),
        (StepId::BusinessType, UserInput::Text("Restaurant".into())),
        (StepId::Aov, UserInput::Text("35.50".into())),
        (StepId::Orders, UserInput::Text("400".into())),
        (StepId::Commission, UserInput::Text("30".into())),
        (StepId::FixedFees, UserInput::Text("100".into())),
        (
            StepId::ThirdPartyApps,
            UserInput::Choices(vec!["DoorDash".into(), "Uber Eats".into()]),
        ),
    ];

    let mut step = StepId::Intro;
    for (expected, input) in turns {
        assert_eq!(step, expected);
        step = match advance_ok(&m, step, &mut session, input).await {
            Transition::Advanced { step, result } => {
                assert!(result.is_none(), "no result before the email step");
                step
            }
            Transition::Rejected { message, .. } => panic!("unexpected rejection: {message}"),
        };
    }
    assert_eq!(step, StepId::Email);

    let result = match advance_ok(
        &m,
        StepId::Email,
        &mut session,
        UserInput::Text("owner@example.com".into()),
    )
    .await
    {
        Transition::Advanced {
            step: StepId::Result,
            result: Some(result),
        } => result,
        other => panic!("expected terminal advance, got {other:?}"),
    };

    // aov 35.50 * 400 orders * 12 months = 170,400 annual base.
    // commission savings (30% - 10%) = 34,080; fixed 1,200; lclv 68,160.
    assert_eq!(result.formatted_leak, "$103,440");
    assert_eq!(result.lead_score, LeadScore::HighPriority);
    assert_eq!(result.crm_payload.lead_score_tag.as_deref(), Some("High Priority"));

    // Persist the way the transport does, twice, reusing the returned id.
    let store = LibSqlLeadStore::new_memory().await.unwrap();
    let id = store.upsert_lead(&result.crm_payload, None).await.unwrap();
    session.lead_id = Some(id);

    let id2 = store
        .upsert_lead(&result.crm_payload, session.lead_id)
        .await
        .unwrap();
    assert_eq!(id, id2, "round-tripped id updates instead of duplicating");

    store.mark_consultation_requested(id).await.unwrap();
    let saved = store.get_lead(id).await.unwrap().unwrap();
    assert!(saved.is_completed);
    assert!(saved.consultation_requested);
    assert_eq!(saved.email.as_deref(), Some("owner@example.com"));
    assert_eq!(saved.calculated_annual_leak, Some(103_440.0));
}

#[tokio::test]
async fn rejection_mid_funnel_leaves_traversal_resumable() {
    let m = machine();
    let mut session = SessionData::default();

    advance_ok(&m, StepId::Intro, &mut session, UserInput::Text("Start".into())).await;
    advance_ok(
        &m,
        StepId::BusinessType,
        &mut session,
        UserInput::Text("Cafe / Bakery".into()),
    )
    .await;

    // Garbage at the AOV step: stay put, then resume with good input.
    let rejected = advance_ok(&m, StepId::Aov, &mut session, UserInput::Text("lots".into())).await;
    assert!(matches!(
        rejected,
        Transition::Rejected { step: StepId::Aov, .. }
    ));
    assert!(session.aov.is_none());

    let resumed = advance_ok(&m, StepId::Aov, &mut session, UserInput::Text("22.75".into())).await;
    assert!(matches!(
        resumed,
        Transition::Advanced { step: StepId::Orders, .. }
    ));
    assert_eq!(session.aov, Some(22.75));
}

#[tokio::test]
async fn advance_on_terminal_step_errors() {
    let m = machine();
    let mut session = SessionData::default();
    assert!(m.advance(StepId::Result, &mut session, None).await.is_err());
}
