//! HTTP surface — the chat endpoint driving the funnel and the CRM
//! hand-off endpoint.
//!
//! The server is stateless between turns: the client posts the current
//! step and accumulated session data with every request and gets both
//! back, updated, in the response.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Json;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use crate::funnel::machine::FunnelResult;
use crate::funnel::{FunnelMachine, InputKind, SessionData, StepId, Transition, UserInput};
use crate::geo::GeoClient;
use crate::store::LeadStore;

/// Shared state for the API routes.
#[derive(Clone)]
pub struct ApiState {
    pub machine: Arc<FunnelMachine>,
    pub store: Arc<dyn LeadStore>,
    pub geo: Option<Arc<GeoClient>>,
}

/// One turn of the conversation, as posted by the client.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub current_state: StepId,
    #[serde(default)]
    pub user_input: Option<UserInput>,
    #[serde(default)]
    pub data: SessionData,
}

/// One turn of the conversation, as rendered back to the client.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub valid: bool,
    pub state: StepId,
    pub prompt: String,
    pub input_type: InputKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<&'static [&'static str]>,
    pub data: SessionData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Box<FunnelResult>>,
}

impl ChatResponse {
    fn at_step(step: StepId, data: SessionData) -> Self {
        Self {
            valid: true,
            state: step,
            prompt: FunnelMachine::prompt(step).to_string(),
            input_type: FunnelMachine::input_kind(step),
            options: FunnelMachine::options(step),
            data,
            message: None,
            result: None,
        }
    }
}

/// CRM hand-off trigger: the visitor clicked "book a consultation".
#[derive(Debug, Deserialize)]
pub struct LeadRequest {
    pub lead_id: i64,
}

/// POST /api/chat
async fn chat(
    State(state): State<ApiState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> impl IntoResponse {
    let ChatRequest {
        current_state,
        user_input,
        mut data,
    } = request;

    // Initial page load: render the intro prompt without advancing.
    if user_input.is_none() && current_state == StepId::Intro {
        return Json(ChatResponse::at_step(StepId::Intro, data)).into_response();
    }

    let transition = match state
        .machine
        .advance(current_state, &mut data, user_input.as_ref())
        .await
    {
        Ok(t) => t,
        Err(e) => {
            // Caller error — undefined use of the script, not user input.
            error!(state = %current_state, error = %e, "chat advance failed");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    let response = match transition {
        Transition::Rejected { step, message } => ChatResponse {
            valid: false,
            message: Some(message),
            ..ChatResponse::at_step(step, data)
        },
        Transition::Advanced { step, result: None } => ChatResponse::at_step(step, data),
        Transition::Advanced {
            step,
            result: Some(mut result),
        } => {
            enrich_and_save(&state, &headers, addr, &mut data, &mut result).await;
            ChatResponse {
                result: Some(result),
                ..ChatResponse::at_step(step, data)
            }
        }
    };

    Json(response).into_response()
}

/// Attach client location to the lead record and persist it. Failures are
/// logged and swallowed: the visitor still gets their result.
async fn enrich_and_save(
    state: &ApiState,
    headers: &HeaderMap,
    addr: SocketAddr,
    data: &mut SessionData,
    result: &mut FunnelResult,
) {
    let ip = client_ip(headers, addr);
    result.crm_payload.ip_address = Some(ip.clone());

    if let Some(geo) = &state.geo {
        if let Some(location) = geo.lookup(&ip).await {
            result.crm_payload.city = location.city;
            result.crm_payload.region = location.region;
            result.crm_payload.country = location.country;
            result.crm_payload.country_code = location.country_code;
        }
    }

    match state.store.upsert_lead(&result.crm_payload, data.lead_id).await {
        Ok(id) => {
            data.lead_id = Some(id);
            info!(lead_id = id, score = ?result.crm_payload.lead_score_tag, "lead saved");
        }
        Err(e) => {
            warn!(error = %e, "lead save failed; continuing without persistence");
        }
    }
}

/// POST /api/lead
async fn lead(
    State(state): State<ApiState>,
    Json(request): Json<LeadRequest>,
) -> impl IntoResponse {
    match state
        .store
        .mark_consultation_requested(request.lead_id)
        .await
    {
        Ok(()) => Json(serde_json::json!({
            "status": "success",
            "message": "Lead received"
        }))
        .into_response(),
        Err(e) => {
            // Non-fatal by design: the client redirects to booking anyway.
            warn!(lead_id = request.lead_id, error = %e, "consultation flag failed");
            (
                StatusCode::ACCEPTED,
                Json(serde_json::json!({ "status": "deferred" })),
            )
                .into_response()
        }
    }
}

/// Proxied requests carry the real client address in X-Forwarded-For.
fn client_ip(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

/// Build the API router.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/lead", post(lead))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
