//! # Arbitration API Routes
//!
//! HTTP surface for the arbitration workflow: the case list with its
//! outcome tally, single-case detail, per-vehicle history, case opening,
//! and the outcome endpoint — the one write path that resolves a pending
//! case and applies its financial and status effects to the vehicle.
//!
//! ## Concurrency
//!
//! The outcome endpoint claims the case under the case store's write lock
//! and applies vehicle effects under the vehicle store's write lock nested
//! inside it (lock order: cases before vehicles, everywhere). Two
//! concurrent submissions for the same vehicle serialize on the case lock;
//! the loser observes a non-Pending outcome and gets 409. With Postgres
//! configured, the same claim is replayed as a conditional
//! `UPDATE ... WHERE outcome = 'pending'` inside one transaction.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use backlot_arb::{
    newest_first, pending_case, process_outcome, ArbCase, ArbError, ArbOutcome, ArbType,
    OutcomeDecision, OutcomeTally, TransportPlan,
};
use backlot_core::{Money, UserId, Vehicle};

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Request to open a new arbitration case against a vehicle.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct OpenCaseRequest {
    /// Case type: "sold_arb" or "inventory_arb".
    pub arb_type: String,
    /// Free-form notes on why the case was opened.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request to resolve a pending case.
///
/// Monetary fields are decimal strings (`"1500"`, `"1500.00"`) — amounts
/// are never JSON numbers.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct OutcomeRequest {
    /// Case type the submitter believes they are resolving. Must match
    /// the open case.
    pub arb_type: String,
    /// The chosen outcome: "denied", "price_adjustment", "buyer_withdrew",
    /// or "withdrawn".
    pub outcome: String,
    /// Required for price_adjustment; must be positive.
    #[serde(default)]
    pub adjustment_amount: Option<String>,
    /// Transport method, meaningful for buyer_withdrew.
    #[serde(default)]
    pub transport_type: Option<String>,
    /// Pickup location, meaningful for buyer_withdrew.
    #[serde(default)]
    pub transport_location: Option<String>,
    /// Pickup date (YYYY-MM-DD), meaningful for buyer_withdrew.
    #[serde(default)]
    pub transport_date: Option<String>,
    /// Required for buyer_withdrew; must be positive.
    #[serde(default)]
    pub transport_cost: Option<String>,
    /// Notes recorded on the case.
    #[serde(default)]
    pub notes: Option<String>,
    /// Must be true for the destructive inventory withdrawal.
    #[serde(default)]
    pub confirm_withdrawal: bool,
}

/// One arbitration case in API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ArbCaseResponse {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub arb_type: String,
    pub outcome: String,
    pub adjustment_amount: Option<String>,
    pub transport_type: Option<String>,
    pub transport_location: Option<String>,
    pub transport_date: Option<String>,
    pub transport_cost: Option<String>,
    pub notes: Option<String>,
    pub opened_at: String,
    pub opened_by: Uuid,
    pub resolved_at: Option<String>,
    pub resolved_by: Option<Uuid>,
}

/// Vehicle summary joined onto case responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VehicleSummary {
    pub id: Uuid,
    pub vin: String,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub status: String,
    /// Buyer on the contested sale, when one is on file.
    pub buyer_name: Option<String>,
}

/// A case joined with its vehicle and the users on it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ArbCaseDetail {
    pub case: ArbCaseResponse,
    /// The vehicle under dispute. Absent only if the vehicle record was
    /// deleted out from under the case.
    pub vehicle: Option<VehicleSummary>,
    /// Display name of the user who opened the case.
    pub opened_by_name: Option<String>,
    /// Display name of the user who resolved the case.
    pub resolved_by_name: Option<String>,
}

/// Outcome tally for the case-list header.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TallyResponse {
    pub pending: usize,
    pub denied: usize,
    pub price_adjustment: usize,
    pub buyer_withdrew: usize,
    pub withdrawn: usize,
}

impl From<OutcomeTally> for TallyResponse {
    fn from(t: OutcomeTally) -> Self {
        Self {
            pending: t.pending,
            denied: t.denied,
            price_adjustment: t.price_adjustment,
            buyer_withdrew: t.buyer_withdrew,
            withdrawn: t.withdrawn,
        }
    }
}

/// The full case list with its tally.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ArbListResponse {
    pub cases: Vec<ArbCaseDetail>,
    pub tally: TallyResponse,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the arbitration router.
pub fn router() -> Router<AppState> {
    // The vehicle param is `:id` to line up with the vehicles router —
    // axum rejects conflicting parameter names on a shared prefix.
    Router::new()
        .route("/api/arb", get(list_cases))
        .route("/api/arb/:id", get(get_case))
        .route("/api/vehicles/:id/arb", post(open_case))
        .route("/api/vehicles/:id/arb/history", get(vehicle_arb_history))
        .route("/api/vehicles/:id/arb/outcome", post(submit_outcome))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_arb_type(s: &str) -> Result<ArbType, AppError> {
    ArbType::parse(s)
        .ok_or_else(|| AppError::Validation(format!("unknown arb_type: '{s}'")))
}

fn parse_outcome(s: &str) -> Result<ArbOutcome, AppError> {
    ArbOutcome::parse(s)
        .ok_or_else(|| AppError::Validation(format!("unknown outcome: '{s}'")))
}

fn parse_money_field(value: &str, field: &str) -> Result<Money, AppError> {
    Money::parse(value)
        .map_err(|e| AppError::Validation(format!("invalid {field}: {e}")))
}

fn parse_date_field(value: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid {field}: expected YYYY-MM-DD")))
}

pub(crate) fn case_to_response(case: &ArbCase) -> ArbCaseResponse {
    ArbCaseResponse {
        id: *case.id.as_uuid(),
        vehicle_id: *case.vehicle_id.as_uuid(),
        arb_type: case.arb_type.as_str().to_string(),
        outcome: case.outcome.as_str().to_string(),
        adjustment_amount: case.adjustment_amount.map(|m| m.to_decimal_string()),
        transport_type: case
            .transport
            .as_ref()
            .and_then(|t| t.transport_type.clone()),
        transport_location: case.transport.as_ref().and_then(|t| t.location.clone()),
        transport_date: case
            .transport
            .as_ref()
            .and_then(|t| t.date.map(|d| d.to_string())),
        transport_cost: case.transport.as_ref().map(|t| t.cost.to_decimal_string()),
        notes: case.notes.clone(),
        opened_at: case.opened_at.to_rfc3339(),
        opened_by: *case.opened_by.as_uuid(),
        resolved_at: case.resolved_at.map(|t| t.to_rfc3339()),
        resolved_by: case.resolved_by.map(|u| *u.as_uuid()),
    }
}

fn vehicle_summary(vehicle: &Vehicle) -> VehicleSummary {
    VehicleSummary {
        id: *vehicle.id.as_uuid(),
        vin: vehicle.vin.as_str().to_string(),
        year: vehicle.year,
        make: vehicle.make.clone(),
        model: vehicle.model.clone(),
        status: vehicle.status.as_str().to_string(),
        buyer_name: vehicle.buyer_name.clone(),
    }
}

fn join_case(state: &AppState, case: &ArbCase) -> ArbCaseDetail {
    let vehicle = state
        .vehicles
        .get(case.vehicle_id.as_uuid())
        .map(|v| vehicle_summary(&v));
    let name_of = |user_id: &UserId| {
        state
            .users
            .get(user_id.as_uuid())
            .map(|u| u.display_name)
    };
    ArbCaseDetail {
        case: case_to_response(case),
        vehicle,
        opened_by_name: name_of(&case.opened_by),
        resolved_by_name: case.resolved_by.as_ref().and_then(|u| name_of(u)),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/arb — List all cases with vehicle summaries and the tally.
#[utoipa::path(
    get,
    path = "/api/arb",
    responses(
        (status = 200, description = "Case list with outcome tally", body = ArbListResponse),
    ),
    tag = "arb"
)]
pub async fn list_cases(State(state): State<AppState>) -> Json<ArbListResponse> {
    let mut cases = state.arb_cases.list();
    newest_first(&mut cases);
    let tally = OutcomeTally::of(&cases);
    let details = cases.iter().map(|c| join_case(&state, c)).collect();
    Json(ArbListResponse {
        cases: details,
        tally: tally.into(),
    })
}

/// GET /api/arb/:arb_id — One case with joined vehicle and users.
#[utoipa::path(
    get,
    path = "/api/arb/{arb_id}",
    params(("arb_id" = Uuid, Path, description = "Arbitration case UUID")),
    responses(
        (status = 200, description = "Case detail", body = ArbCaseDetail),
        (status = 404, description = "Case not found"),
    ),
    tag = "arb"
)]
pub async fn get_case(
    State(state): State<AppState>,
    Path(arb_id): Path<Uuid>,
) -> Result<Json<ArbCaseDetail>, AppError> {
    let case = state
        .arb_cases
        .get(&arb_id)
        .ok_or_else(|| AppError::NotFound(format!("arbitration case {arb_id} not found")))?;
    Ok(Json(join_case(&state, &case)))
}

/// GET /api/vehicles/:vehicle_id/arb/history — Chronological case history.
#[utoipa::path(
    get,
    path = "/api/vehicles/{vehicle_id}/arb/history",
    params(("vehicle_id" = Uuid, Path, description = "Vehicle UUID")),
    responses(
        (status = 200, description = "Newest-first case history", body = Vec<ArbCaseDetail>),
        (status = 404, description = "Vehicle not found"),
    ),
    tag = "arb"
)]
pub async fn vehicle_arb_history(
    State(state): State<AppState>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<Vec<ArbCaseDetail>>, AppError> {
    let vehicle = state
        .vehicles
        .get(&vehicle_id)
        .ok_or_else(|| AppError::NotFound(format!("vehicle {vehicle_id} not found")))?;

    let cases = state.arb_cases.list();
    let history = backlot_arb::vehicle_history(&cases, vehicle.id);
    let details = history.iter().map(|c| join_case(&state, c)).collect();
    Ok(Json(details))
}

/// POST /api/vehicles/:vehicle_id/arb — Open a case.
///
/// The vehicle moves to `arb` status; a vehicle already under arbitration
/// (or with a pending case) gets 409.
#[utoipa::path(
    post,
    path = "/api/vehicles/{vehicle_id}/arb",
    params(("vehicle_id" = Uuid, Path, description = "Vehicle UUID")),
    request_body = OpenCaseRequest,
    responses(
        (status = 201, description = "Case opened", body = ArbCaseDetail),
        (status = 404, description = "Vehicle not found"),
        (status = 409, description = "A pending case already exists"),
        (status = 422, description = "Validation error"),
    ),
    tag = "arb"
)]
pub async fn open_case(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(vehicle_id): Path<Uuid>,
    body: Result<Json<OpenCaseRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<ArbCaseDetail>), AppError> {
    require_role(&caller, Role::Manager)?;
    let req = extract_json(body)?;
    let arb_type = parse_arb_type(&req.arb_type)?;
    let now = Utc::now();

    // One pending case per vehicle. The vehicle's own status gate
    // (enter_arb fails unless Inventory/Sold) closes the race between two
    // concurrent opens: only one can win the Arb transition.
    let cases = state.arb_cases.list();
    if let Some(open) = pending_case(&cases, backlot_core::VehicleId::from_uuid(vehicle_id)) {
        return Err(ArbError::PendingCaseExists {
            vehicle_id: open.vehicle_id,
            arb_id: open.id,
        }
        .into());
    }

    let vehicle = state
        .vehicles
        .try_update(&vehicle_id, |vehicle| {
            // A sold_arb must target a sold vehicle, an inventory_arb an
            // inventory vehicle; enter_arb enforces the superset and the
            // explicit check pins the exact pairing.
            if vehicle.status != arb_type.return_status() {
                return Err(AppError::Conflict(format!(
                    "cannot open {} against a vehicle in status {}",
                    arb_type, vehicle.status
                )));
            }
            vehicle.enter_arb(now).map_err(AppError::from)?;
            Ok(vehicle.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("vehicle {vehicle_id} not found")))??;

    let opened_by = caller.user_id.unwrap_or(state.admin_user_id);
    let case = ArbCase::open(vehicle.id, arb_type, req.notes, opened_by, now);
    state.arb_cases.insert(*case.id.as_uuid(), case.clone());

    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::arb_cases::insert(pool, &case).await {
            tracing::error!(error = %e, arb_id = %case.id, "failed to persist opened case");
        }
        if let Err(e) = crate::db::vehicles::upsert(pool, &vehicle).await {
            tracing::error!(error = %e, vehicle_id = %vehicle.id, "failed to persist vehicle");
        }
    }

    Ok((
        axum::http::StatusCode::CREATED,
        Json(join_case(&state, &case)),
    ))
}

/// POST /api/vehicles/:vehicle_id/arb/outcome — Resolve the pending case.
#[utoipa::path(
    post,
    path = "/api/vehicles/{vehicle_id}/arb/outcome",
    params(("vehicle_id" = Uuid, Path, description = "Vehicle UUID")),
    request_body = OutcomeRequest,
    responses(
        (status = 200, description = "Case resolved", body = ArbCaseDetail),
        (status = 404, description = "Vehicle or case not found"),
        (status = 409, description = "Case already processed"),
        (status = 422, description = "Validation error"),
    ),
    tag = "arb"
)]
pub async fn submit_outcome(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(vehicle_id): Path<Uuid>,
    body: Result<Json<OutcomeRequest>, JsonRejection>,
) -> Result<Json<ArbCaseDetail>, AppError> {
    require_role(&caller, Role::Manager)?;
    let req = extract_json(body)?;
    let now = Utc::now();

    let arb_type = parse_arb_type(&req.arb_type)?;
    let outcome = parse_outcome(&req.outcome)?;

    let adjustment_amount = req
        .adjustment_amount
        .as_deref()
        .map(|v| parse_money_field(v, "adjustment_amount"))
        .transpose()?;

    let transport = match &req.transport_cost {
        Some(cost) => {
            let cost = parse_money_field(cost, "transport_cost")?;
            let date = req
                .transport_date
                .as_deref()
                .map(|v| parse_date_field(v, "transport_date"))
                .transpose()?;
            Some(
                TransportPlan::new(
                    req.transport_type.clone(),
                    req.transport_location.clone(),
                    date,
                    cost,
                )
                .map_err(AppError::from)?,
            )
        }
        None => None,
    };

    // The full rule table runs before any store is touched.
    let decision =
        OutcomeDecision::validate(arb_type, outcome, adjustment_amount, transport, req.confirm_withdrawal)?;

    // Locate the vehicle's open case.
    let cases = state.arb_cases.list();
    let vehicle_ref = backlot_core::VehicleId::from_uuid(vehicle_id);
    let case_id = match pending_case(&cases, vehicle_ref) {
        Some(open) => open.id,
        None => {
            // Distinguish "already processed" from "never arbitrated".
            let history = backlot_arb::vehicle_history(&cases, vehicle_ref);
            return match history.into_iter().next() {
                Some(latest) => Err(ArbError::AlreadyProcessed {
                    arb_id: latest.id,
                    outcome: latest.outcome,
                }
                .into()),
                None => Err(AppError::NotFound(format!(
                    "no arbitration case for vehicle {vehicle_id}"
                ))),
            };
        }
    };

    let resolved_by = caller.user_id.unwrap_or(state.admin_user_id);
    let notes = req.notes;

    // Lock order: case store, then vehicle store (matches open_case's
    // conceptual order; this is the only path holding both).
    let result: Option<Result<(ArbCase, Vehicle), AppError>> =
        state.arb_cases.try_update(case_id.as_uuid(), |case| {
            if case.arb_type != arb_type {
                return Err(ArbError::TypeMismatch {
                    arb_id: case.id,
                    case_type: case.arb_type,
                    submitted: arb_type,
                }
                .into());
            }
            let inner = state.vehicles.try_update(&vehicle_id, |vehicle| {
                process_outcome(case, vehicle, decision, resolved_by, now)
                    .map(|()| vehicle.clone())
            });
            match inner {
                None => Err(AppError::NotFound(format!("vehicle {vehicle_id} not found"))),
                Some(Err(e)) => Err(e.into()),
                Some(Ok(vehicle)) => {
                    if notes.is_some() {
                        case.notes = notes;
                    }
                    Ok((case.clone(), vehicle))
                }
            }
        });

    let (case, vehicle) = match result {
        Some(Ok(pair)) => pair,
        Some(Err(e)) => return Err(e),
        None => {
            return Err(AppError::NotFound(format!(
                "arbitration case {case_id} not found"
            )))
        }
    };

    if let Some(pool) = &state.db_pool {
        match crate::db::arb_cases::persist_outcome(pool, &case, &vehicle).await {
            Ok(true) => {}
            Ok(false) => {
                // The conditional write found the row already resolved —
                // another node won. The in-memory claim above makes this
                // unreachable in a single-node deployment.
                tracing::error!(arb_id = %case.id, "outcome row was not pending at persist time");
            }
            Err(e) => {
                tracing::error!(error = %e, arb_id = %case.id, "failed to persist outcome");
            }
        }
    }

    Ok(Json(join_case(&state, &case)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use backlot_core::{Money, Vin};
    use chrono::NaiveDate;

    /// Bare router with an admin identity injected — the auth middleware
    /// only runs in the assembled app.
    fn test_app(state: AppState) -> Router<()> {
        router()
            .layer(axum::Extension(CallerIdentity {
                role: Role::Admin,
                user_id: None,
            }))
            .with_state(state)
    }

    async fn body_json<T: serde::de::DeserializeOwned>(resp: axum::response::Response) -> T {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: String, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    }

    /// Seed a sold vehicle into the state and return its id.
    fn seed_sold_vehicle(state: &AppState) -> Uuid {
        let mut vehicle = Vehicle::intake(
            Vin::new("1HGCM82633A004352").unwrap(),
            2019,
            "Honda",
            "Accord",
            None,
            Some(Money::from_cents(1_450_000)),
            NaiveDate::from_ymd_opt(2026, 3, 14),
            Utc::now(),
        )
        .unwrap();
        vehicle
            .record_sale(
                "Dana Whitfield",
                Money::from_cents(1_850_000),
                NaiveDate::from_ymd_opt(2026, 5, 2).unwrap(),
                Utc::now(),
            )
            .unwrap();
        let id = *vehicle.id.as_uuid();
        state.vehicles.insert(id, vehicle);
        id
    }

    fn seed_inventory_vehicle(state: &AppState) -> Uuid {
        let vehicle = Vehicle::intake(
            Vin::new("2T1BURHE5JC970034").unwrap(),
            2018,
            "Toyota",
            "Corolla",
            None,
            Some(Money::from_cents(900_000)),
            NaiveDate::from_ymd_opt(2026, 2, 1),
            Utc::now(),
        )
        .unwrap();
        let id = *vehicle.id.as_uuid();
        state.vehicles.insert(id, vehicle);
        id
    }

    async fn open_case_via_api(state: &AppState, vehicle_id: Uuid, arb_type: &str) {
        let app = test_app(state.clone());
        let response = app
            .oneshot(post(
                format!("/api/vehicles/{vehicle_id}/arb"),
                serde_json::json!({"arb_type": arb_type}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn open_case_moves_vehicle_to_arb() {
        let state = AppState::new();
        let vehicle_id = seed_sold_vehicle(&state);

        open_case_via_api(&state, vehicle_id, "sold_arb").await;

        let vehicle = state.vehicles.get(&vehicle_id).unwrap();
        assert_eq!(vehicle.status.as_str(), "arb");
        assert_eq!(state.arb_cases.len(), 1);
    }

    #[tokio::test]
    async fn open_case_against_wrong_status_is_conflict() {
        let state = AppState::new();
        let vehicle_id = seed_inventory_vehicle(&state);

        // sold_arb against an inventory vehicle.
        let app = test_app(state.clone());
        let response = app
            .oneshot(post(
                format!("/api/vehicles/{vehicle_id}/arb"),
                serde_json::json!({"arb_type": "sold_arb"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(state.arb_cases.is_empty());
    }

    #[tokio::test]
    async fn second_pending_case_is_conflict() {
        let state = AppState::new();
        let vehicle_id = seed_sold_vehicle(&state);
        open_case_via_api(&state, vehicle_id, "sold_arb").await;

        let app = test_app(state.clone());
        let response = app
            .oneshot(post(
                format!("/api/vehicles/{vehicle_id}/arb"),
                serde_json::json!({"arb_type": "sold_arb"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(state.arb_cases.len(), 1);
    }

    #[tokio::test]
    async fn sold_price_adjustment_reduces_profit() {
        let state = AppState::new();
        let vehicle_id = seed_sold_vehicle(&state);
        open_case_via_api(&state, vehicle_id, "sold_arb").await;

        let app = test_app(state.clone());
        let response = app
            .oneshot(post(
                format!("/api/vehicles/{vehicle_id}/arb/outcome"),
                serde_json::json!({
                    "arb_type": "sold_arb",
                    "outcome": "price_adjustment",
                    "adjustment_amount": "1500"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let detail: ArbCaseDetail = body_json(response).await;
        assert_eq!(detail.case.outcome, "price_adjustment");
        assert_eq!(detail.case.adjustment_amount.as_deref(), Some("1500.00"));

        let vehicle = state.vehicles.get(&vehicle_id).unwrap();
        assert_eq!(vehicle.status.as_str(), "sold");
        // 18500 - 14500 - 1500 = 2500.00
        assert_eq!(
            vehicle.net_profit().unwrap(),
            Some(Money::from_cents(250_000))
        );
    }

    #[tokio::test]
    async fn buyer_withdrew_reverses_sale() {
        let state = AppState::new();
        let vehicle_id = seed_sold_vehicle(&state);
        open_case_via_api(&state, vehicle_id, "sold_arb").await;

        let app = test_app(state.clone());
        let response = app
            .oneshot(post(
                format!("/api/vehicles/{vehicle_id}/arb/outcome"),
                serde_json::json!({
                    "arb_type": "sold_arb",
                    "outcome": "buyer_withdrew",
                    "transport_type": "flatbed",
                    "transport_location": "Tulsa, OK",
                    "transport_date": "2026-06-01",
                    "transport_cost": "500"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let detail: ArbCaseDetail = body_json(response).await;
        assert_eq!(detail.case.outcome, "buyer_withdrew");
        assert_eq!(detail.case.transport_cost.as_deref(), Some("500.00"));

        let vehicle = state.vehicles.get(&vehicle_id).unwrap();
        assert_eq!(vehicle.status.as_str(), "inventory");
        assert_eq!(vehicle.expense_total, Money::from_cents(50_000));
        assert!(vehicle.sold_price.is_none());
        assert!(vehicle.buyer_name.is_none());
    }

    #[tokio::test]
    async fn withdrawal_requires_confirmation_then_clears_purchase() {
        let state = AppState::new();
        let vehicle_id = seed_inventory_vehicle(&state);
        open_case_via_api(&state, vehicle_id, "inventory_arb").await;

        // Unconfirmed: 422, nothing changes.
        let app = test_app(state.clone());
        let response = app
            .oneshot(post(
                format!("/api/vehicles/{vehicle_id}/arb/outcome"),
                serde_json::json!({"arb_type": "inventory_arb", "outcome": "withdrawn"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            state.vehicles.get(&vehicle_id).unwrap().status.as_str(),
            "arb"
        );

        // Confirmed: purchase cleared, vehicle withdrawn.
        let app = test_app(state.clone());
        let response = app
            .oneshot(post(
                format!("/api/vehicles/{vehicle_id}/arb/outcome"),
                serde_json::json!({
                    "arb_type": "inventory_arb",
                    "outcome": "withdrawn",
                    "confirm_withdrawal": true
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let vehicle = state.vehicles.get(&vehicle_id).unwrap();
        assert_eq!(vehicle.status.as_str(), "withdrawn");
        assert!(vehicle.bought_price.is_none());
        assert!(vehicle.purchase_date.is_none());
    }

    #[tokio::test]
    async fn resubmission_is_conflict_and_leaves_state_alone() {
        let state = AppState::new();
        let vehicle_id = seed_sold_vehicle(&state);
        open_case_via_api(&state, vehicle_id, "sold_arb").await;

        let app = test_app(state.clone());
        let response = app
            .oneshot(post(
                format!("/api/vehicles/{vehicle_id}/arb/outcome"),
                serde_json::json!({"arb_type": "sold_arb", "outcome": "denied"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let vehicle_before = state.vehicles.get(&vehicle_id).unwrap();

        let app = test_app(state.clone());
        let response = app
            .oneshot(post(
                format!("/api/vehicles/{vehicle_id}/arb/outcome"),
                serde_json::json!({
                    "arb_type": "sold_arb",
                    "outcome": "price_adjustment",
                    "adjustment_amount": "100"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(state.vehicles.get(&vehicle_id).unwrap(), vehicle_before);
    }

    #[tokio::test]
    async fn disallowed_pair_is_rejected_before_processing() {
        let state = AppState::new();
        let vehicle_id = seed_sold_vehicle(&state);
        open_case_via_api(&state, vehicle_id, "sold_arb").await;

        let app = test_app(state.clone());
        let response = app
            .oneshot(post(
                format!("/api/vehicles/{vehicle_id}/arb/outcome"),
                serde_json::json!({
                    "arb_type": "sold_arb",
                    "outcome": "withdrawn",
                    "confirm_withdrawal": true
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        // Case still pending, vehicle still in arb.
        let vehicle = state.vehicles.get(&vehicle_id).unwrap();
        assert_eq!(vehicle.status.as_str(), "arb");
    }

    #[tokio::test]
    async fn missing_adjustment_amount_is_rejected() {
        let state = AppState::new();
        let vehicle_id = seed_sold_vehicle(&state);
        open_case_via_api(&state, vehicle_id, "sold_arb").await;

        let app = test_app(state.clone());
        let response = app
            .oneshot(post(
                format!("/api/vehicles/{vehicle_id}/arb/outcome"),
                serde_json::json!({"arb_type": "sold_arb", "outcome": "price_adjustment"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn outcome_without_any_case_is_not_found() {
        let state = AppState::new();
        let vehicle_id = seed_sold_vehicle(&state);

        let app = test_app(state.clone());
        let response = app
            .oneshot(post(
                format!("/api/vehicles/{vehicle_id}/arb/outcome"),
                serde_json::json!({"arb_type": "sold_arb", "outcome": "denied"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_and_history_project_cases() {
        let state = AppState::new();
        let vehicle_id = seed_sold_vehicle(&state);
        open_case_via_api(&state, vehicle_id, "sold_arb").await;

        let app = test_app(state.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/arb")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let list: ArbListResponse = body_json(response).await;
        assert_eq!(list.cases.len(), 1);
        assert_eq!(list.tally.pending, 1);
        let summary = list.cases[0].vehicle.as_ref().unwrap();
        assert_eq!(summary.vin, "1HGCM82633A004352");
        assert_eq!(summary.buyer_name.as_deref(), Some("Dana Whitfield"));

        let app = test_app(state.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/vehicles/{vehicle_id}/arb/history"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let history: Vec<ArbCaseDetail> = body_json(response).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].case.outcome, "pending");
    }

    #[tokio::test]
    async fn get_case_404_for_unknown_id() {
        let state = AppState::new();
        let app = test_app(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/arb/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn router_builds_successfully() {
        let _router = router();
    }
}
