//! # Vehicle API Routes
//!
//! Inventory CRUD plus the lifecycle operations that bracket the
//! arbitration workflow: receiving a pending vehicle, recording a sale,
//! and completing a settled sale. Financial fields are only ever mutated
//! through the vehicle aggregate's methods — there is no PATCH path that
//! pokes prices directly.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use backlot_core::{Money, TitleStatus, Vehicle, VehicleStatus, Vin};

use crate::auth::{require_role, CallerIdentity, Role};
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Request to add a vehicle.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateVehicleRequest {
    /// Seventeen-character VIN. Case-insensitive.
    pub vin: String,
    /// Model year.
    pub year: i32,
    /// Manufacturer.
    pub make: String,
    /// Model name.
    pub model: String,
    /// Trim level.
    #[serde(default)]
    pub trim: Option<String>,
    /// Purchase price as a decimal string.
    #[serde(default)]
    pub bought_price: Option<String>,
    /// Purchase date (YYYY-MM-DD).
    #[serde(default)]
    pub purchase_date: Option<String>,
    /// Initial status: "pending" or "inventory" (default).
    #[serde(default)]
    pub status: Option<String>,
}

/// Request to edit descriptive fields.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateVehicleRequest {
    /// New make.
    #[serde(default)]
    pub make: Option<String>,
    /// New model.
    #[serde(default)]
    pub model: Option<String>,
    /// New trim.
    #[serde(default)]
    pub trim: Option<String>,
    /// New title status: "present", "in_transit", or "absent".
    #[serde(default)]
    pub title_status: Option<String>,
}

/// Request to record a sale.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct SaleRequest {
    /// Buyer's name.
    pub buyer_name: String,
    /// Sale price as a decimal string. Must be positive.
    pub sold_price: String,
    /// Sale date (YYYY-MM-DD).
    pub sale_date: String,
}

/// Status filter for the vehicle list.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Filter to a single lifecycle status.
    pub status: Option<String>,
}

/// A vehicle in API responses. Monetary fields are decimal strings.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub vin: String,
    pub year: i32,
    pub make: String,
    pub model: String,
    pub trim: Option<String>,
    pub status: String,
    pub title_status: String,
    pub bought_price: Option<String>,
    pub purchase_date: Option<String>,
    pub sold_price: Option<String>,
    pub buyer_name: Option<String>,
    pub sale_date: Option<String>,
    pub expense_total: String,
    /// Sold minus bought minus expenses; absent until both prices exist.
    pub net_profit: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the vehicles router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/vehicles", get(list_vehicles).post(create_vehicle))
        .route(
            "/api/vehicles/:id",
            get(get_vehicle).patch(update_vehicle).delete(delete_vehicle),
        )
        .route("/api/vehicles/:id/receive", post(receive_vehicle))
        .route("/api/vehicles/:id/sale", post(record_sale))
        .route("/api/vehicles/:id/complete", post(complete_sale))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn vehicle_to_response(vehicle: &Vehicle) -> Result<VehicleResponse, AppError> {
    let net_profit = vehicle
        .net_profit()
        .map_err(|e| AppError::Internal(format!("profit overflow for {}: {e}", vehicle.id)))?;
    Ok(VehicleResponse {
        id: *vehicle.id.as_uuid(),
        vin: vehicle.vin.as_str().to_string(),
        year: vehicle.year,
        make: vehicle.make.clone(),
        model: vehicle.model.clone(),
        trim: vehicle.trim.clone(),
        status: vehicle.status.as_str().to_string(),
        title_status: vehicle.title_status.as_str().to_string(),
        bought_price: vehicle.bought_price.map(|m| m.to_decimal_string()),
        purchase_date: vehicle.purchase_date.map(|d| d.to_string()),
        sold_price: vehicle.sold_price.map(|m| m.to_decimal_string()),
        buyer_name: vehicle.buyer_name.clone(),
        sale_date: vehicle.sale_date.map(|d| d.to_string()),
        expense_total: vehicle.expense_total.to_decimal_string(),
        net_profit: net_profit.map(|m| m.to_decimal_string()),
        created_at: vehicle.created_at.to_rfc3339(),
        updated_at: vehicle.updated_at.to_rfc3339(),
    })
}

fn parse_money(value: &str, field: &str) -> Result<Money, AppError> {
    Money::parse(value).map_err(|e| AppError::Validation(format!("invalid {field}: {e}")))
}

fn parse_date(value: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid {field}: expected YYYY-MM-DD")))
}

async fn persist(state: &AppState, vehicle: &Vehicle) {
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::vehicles::upsert(pool, vehicle).await {
            tracing::error!(error = %e, vehicle_id = %vehicle.id, "failed to persist vehicle");
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/vehicles — List vehicles.
///
/// Withdrawn vehicles are excluded unless explicitly requested via
/// `?status=withdrawn`.
#[utoipa::path(
    get,
    path = "/api/vehicles",
    params(("status" = Option<String>, Query, description = "Filter by lifecycle status")),
    responses(
        (status = 200, description = "Vehicle list", body = Vec<VehicleResponse>),
        (status = 422, description = "Unknown status filter"),
    ),
    tag = "vehicles"
)]
pub async fn list_vehicles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    let filter = query
        .status
        .as_deref()
        .map(|s| {
            VehicleStatus::parse(s)
                .ok_or_else(|| AppError::Validation(format!("unknown status filter: '{s}'")))
        })
        .transpose()?;

    let mut vehicles = state.vehicles.list();
    vehicles.retain(|v| match filter {
        Some(status) => v.status == status,
        None => v.status != VehicleStatus::Withdrawn,
    });
    vehicles.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let responses: Result<Vec<_>, _> = vehicles.iter().map(vehicle_to_response).collect();
    Ok(Json(responses?))
}

/// POST /api/vehicles — Add a vehicle.
#[utoipa::path(
    post,
    path = "/api/vehicles",
    request_body = CreateVehicleRequest,
    responses(
        (status = 201, description = "Vehicle created", body = VehicleResponse),
        (status = 409, description = "VIN already on file"),
        (status = 422, description = "Validation error"),
    ),
    tag = "vehicles"
)]
pub async fn create_vehicle(
    State(state): State<AppState>,
    caller: CallerIdentity,
    body: Result<Json<CreateVehicleRequest>, JsonRejection>,
) -> Result<(axum::http::StatusCode, Json<VehicleResponse>), AppError> {
    require_role(&caller, Role::Manager)?;
    let req = extract_json(body)?;

    let vin = Vin::new(req.vin)?;
    if state
        .vehicles
        .list()
        .iter()
        .any(|v| v.vin == vin && v.status != VehicleStatus::Withdrawn)
    {
        return Err(AppError::Conflict(format!(
            "a vehicle with VIN {vin} is already on file"
        )));
    }

    let bought_price = req
        .bought_price
        .as_deref()
        .map(|v| parse_money(v, "bought_price"))
        .transpose()?;
    let purchase_date = req
        .purchase_date
        .as_deref()
        .map(|v| parse_date(v, "purchase_date"))
        .transpose()?;

    let mut vehicle = Vehicle::intake(
        vin,
        req.year,
        req.make,
        req.model,
        req.trim,
        bought_price,
        purchase_date,
        Utc::now(),
    )?;

    match req.status.as_deref() {
        None | Some("inventory") => {}
        Some("pending") => vehicle.status = VehicleStatus::Pending,
        Some(other) => {
            return Err(AppError::Validation(format!(
                "initial status must be 'pending' or 'inventory', got '{other}'"
            )))
        }
    }

    state.vehicles.insert(*vehicle.id.as_uuid(), vehicle.clone());
    persist(&state, &vehicle).await;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(vehicle_to_response(&vehicle)?),
    ))
}

/// GET /api/vehicles/:id — Vehicle detail.
#[utoipa::path(
    get,
    path = "/api/vehicles/{id}",
    params(("id" = Uuid, Path, description = "Vehicle UUID")),
    responses(
        (status = 200, description = "Vehicle detail", body = VehicleResponse),
        (status = 404, description = "Vehicle not found"),
    ),
    tag = "vehicles"
)]
pub async fn get_vehicle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<VehicleResponse>, AppError> {
    let vehicle = state
        .vehicles
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("vehicle {id} not found")))?;
    Ok(Json(vehicle_to_response(&vehicle)?))
}

/// PATCH /api/vehicles/:id — Edit descriptive fields.
#[utoipa::path(
    patch,
    path = "/api/vehicles/{id}",
    params(("id" = Uuid, Path, description = "Vehicle UUID")),
    request_body = UpdateVehicleRequest,
    responses(
        (status = 200, description = "Vehicle updated", body = VehicleResponse),
        (status = 404, description = "Vehicle not found"),
        (status = 422, description = "Validation error"),
    ),
    tag = "vehicles"
)]
pub async fn update_vehicle(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<UpdateVehicleRequest>, JsonRejection>,
) -> Result<Json<VehicleResponse>, AppError> {
    require_role(&caller, Role::Manager)?;
    let req = extract_json(body)?;

    let title_status = req
        .title_status
        .as_deref()
        .map(|s| {
            TitleStatus::parse(s)
                .ok_or_else(|| AppError::Validation(format!("unknown title_status: '{s}'")))
        })
        .transpose()?;
    if let Some(make) = &req.make {
        if make.trim().is_empty() {
            return Err(AppError::Validation("make must not be empty".to_string()));
        }
    }
    if let Some(model) = &req.model {
        if model.trim().is_empty() {
            return Err(AppError::Validation("model must not be empty".to_string()));
        }
    }

    let vehicle = state
        .vehicles
        .update(&id, |vehicle| {
            if let Some(make) = req.make.clone() {
                vehicle.make = make;
            }
            if let Some(model) = req.model.clone() {
                vehicle.model = model;
            }
            if let Some(trim) = req.trim.clone() {
                vehicle.trim = Some(trim);
            }
            if let Some(status) = title_status {
                vehicle.title_status = status;
            }
            vehicle.updated_at = Utc::now();
        })
        .ok_or_else(|| AppError::NotFound(format!("vehicle {id} not found")))?;

    persist(&state, &vehicle).await;
    Ok(Json(vehicle_to_response(&vehicle)?))
}

/// DELETE /api/vehicles/:id — Remove a vehicle record.
///
/// Refused while the vehicle is under arbitration; resolve the case first.
#[utoipa::path(
    delete,
    path = "/api/vehicles/{id}",
    params(("id" = Uuid, Path, description = "Vehicle UUID")),
    responses(
        (status = 204, description = "Vehicle deleted"),
        (status = 404, description = "Vehicle not found"),
        (status = 409, description = "Vehicle is under arbitration"),
    ),
    tag = "vehicles"
)]
pub async fn delete_vehicle(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<axum::http::StatusCode, AppError> {
    require_role(&caller, Role::Manager)?;

    let vehicle = state
        .vehicles
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("vehicle {id} not found")))?;
    if vehicle.status == VehicleStatus::Arb {
        return Err(AppError::Conflict(
            "vehicle is under arbitration; resolve the case before deleting".to_string(),
        ));
    }

    state.vehicles.remove(&id);
    if let Some(pool) = &state.db_pool {
        if let Err(e) = crate::db::vehicles::delete(pool, id).await {
            tracing::error!(error = %e, vehicle_id = %id, "failed to delete persisted vehicle");
        }
    }
    Ok(axum::http::StatusCode::NO_CONTENT)
}

/// POST /api/vehicles/:id/receive — Pending → Inventory.
#[utoipa::path(
    post,
    path = "/api/vehicles/{id}/receive",
    params(("id" = Uuid, Path, description = "Vehicle UUID")),
    responses(
        (status = 200, description = "Vehicle received onto the lot", body = VehicleResponse),
        (status = 404, description = "Vehicle not found"),
        (status = 409, description = "Vehicle is not pending"),
    ),
    tag = "vehicles"
)]
pub async fn receive_vehicle(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<VehicleResponse>, AppError> {
    require_role(&caller, Role::Manager)?;

    let result = state
        .vehicles
        .try_update(&id, |vehicle| {
            vehicle.receive(Utc::now()).map(|()| vehicle.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("vehicle {id} not found")))?;
    let vehicle = result.map_err(AppError::from)?;

    persist(&state, &vehicle).await;
    Ok(Json(vehicle_to_response(&vehicle)?))
}

/// POST /api/vehicles/:id/sale — Record a sale.
#[utoipa::path(
    post,
    path = "/api/vehicles/{id}/sale",
    params(("id" = Uuid, Path, description = "Vehicle UUID")),
    request_body = SaleRequest,
    responses(
        (status = 200, description = "Sale recorded", body = VehicleResponse),
        (status = 404, description = "Vehicle not found"),
        (status = 409, description = "Vehicle is not in inventory"),
        (status = 422, description = "Validation error"),
    ),
    tag = "vehicles"
)]
pub async fn record_sale(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
    body: Result<Json<SaleRequest>, JsonRejection>,
) -> Result<Json<VehicleResponse>, AppError> {
    require_role(&caller, Role::Seller)?;
    let req = extract_json(body)?;

    let sold_price = parse_money(&req.sold_price, "sold_price")?;
    let sale_date = parse_date(&req.sale_date, "sale_date")?;

    let result = state
        .vehicles
        .try_update(&id, |vehicle| {
            vehicle
                .record_sale(req.buyer_name.clone(), sold_price, sale_date, Utc::now())
                .map(|()| vehicle.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("vehicle {id} not found")))?;
    let vehicle = result.map_err(AppError::from)?;

    persist(&state, &vehicle).await;
    Ok(Json(vehicle_to_response(&vehicle)?))
}

/// POST /api/vehicles/:id/complete — Sold → Complete.
#[utoipa::path(
    post,
    path = "/api/vehicles/{id}/complete",
    params(("id" = Uuid, Path, description = "Vehicle UUID")),
    responses(
        (status = 200, description = "Sale completed", body = VehicleResponse),
        (status = 404, description = "Vehicle not found"),
        (status = 409, description = "Vehicle is not sold"),
    ),
    tag = "vehicles"
)]
pub async fn complete_sale(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<Uuid>,
) -> Result<Json<VehicleResponse>, AppError> {
    require_role(&caller, Role::Manager)?;

    let result = state
        .vehicles
        .try_update(&id, |vehicle| {
            vehicle.mark_complete(Utc::now()).map(|()| vehicle.clone())
        })
        .ok_or_else(|| AppError::NotFound(format!("vehicle {id} not found")))?;
    let vehicle = result.map_err(AppError::from)?;

    persist(&state, &vehicle).await;
    Ok(Json(vehicle_to_response(&vehicle)?))
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

    fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    }

    fn create_body() -> serde_json::Value {
        serde_json::json!({
            "vin": "1HGCM82633A004352",
            "year": 2019,
            "make": "Honda",
            "model": "Accord",
            "trim": "EX-L",
            "bought_price": "14500",
            "purchase_date": "2026-03-14"
        })
    }

    async fn create_vehicle_via_api(state: &AppState) -> Uuid {
        let app = test_app(state.clone());
        let response = app
            .oneshot(post("/api/vehicles", create_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let resp: VehicleResponse = body_json(response).await;
        resp.id
    }

    #[tokio::test]
    async fn create_vehicle_starts_in_inventory() {
        let state = AppState::new();
        let app = test_app(state.clone());
        let response = app
            .oneshot(post("/api/vehicles", create_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let resp: VehicleResponse = body_json(response).await;
        assert_eq!(resp.status, "inventory");
        assert_eq!(resp.vin, "1HGCM82633A004352");
        assert_eq!(resp.bought_price.as_deref(), Some("14500.00"));
        assert_eq!(resp.expense_total, "0.00");
        assert!(resp.net_profit.is_none());
    }

    #[tokio::test]
    async fn duplicate_vin_is_conflict() {
        let state = AppState::new();
        create_vehicle_via_api(&state).await;

        let app = test_app(state.clone());
        let response = app
            .oneshot(post("/api/vehicles", create_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn invalid_vin_is_rejected() {
        let state = AppState::new();
        let mut body = create_body();
        body["vin"] = serde_json::json!("NOPE");
        let app = test_app(state);
        let response = app.oneshot(post("/api/vehicles", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn sale_moves_vehicle_to_sold_with_profit() {
        let state = AppState::new();
        let id = create_vehicle_via_api(&state).await;

        let app = test_app(state.clone());
        let response = app
            .oneshot(post(
                &format!("/api/vehicles/{id}/sale"),
                serde_json::json!({
                    "buyer_name": "Dana Whitfield",
                    "sold_price": "18500",
                    "sale_date": "2026-05-02"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let resp: VehicleResponse = body_json(response).await;
        assert_eq!(resp.status, "sold");
        assert_eq!(resp.net_profit.as_deref(), Some("4000.00"));
    }

    #[tokio::test]
    async fn double_sale_is_conflict() {
        let state = AppState::new();
        let id = create_vehicle_via_api(&state).await;
        let sale = serde_json::json!({
            "buyer_name": "Dana Whitfield",
            "sold_price": "18500",
            "sale_date": "2026-05-02"
        });

        let app = test_app(state.clone());
        app.oneshot(post(&format!("/api/vehicles/{id}/sale"), sale.clone()))
            .await
            .unwrap();

        let app = test_app(state.clone());
        let response = app
            .oneshot(post(&format!("/api/vehicles/{id}/sale"), sale))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn default_list_excludes_withdrawn() {
        let state = AppState::new();
        let id = create_vehicle_via_api(&state).await;

        // Force a withdrawn vehicle directly.
        state.vehicles.update(&id, |v| {
            v.status = VehicleStatus::Withdrawn;
        });

        let app = test_app(state.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/vehicles")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let list: Vec<VehicleResponse> = body_json(response).await;
        assert!(list.is_empty());

        // Explicit filter still reaches it.
        let app = test_app(state.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/vehicles?status=withdrawn")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let list: Vec<VehicleResponse> = body_json(response).await;
        assert_eq!(list.len(), 1);
    }

    #[tokio::test]
    async fn unknown_status_filter_is_rejected() {
        let state = AppState::new();
        let app = test_app(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/vehicles?status=scrapped")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn patch_updates_title_status() {
        let state = AppState::new();
        let id = create_vehicle_via_api(&state).await;

        let app = test_app(state.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri(format!("/api/vehicles/{id}"))
                    .header("content-type", "application/json")
                    .body(Body::from(
                        serde_json::json!({"title_status": "in_transit"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let resp: VehicleResponse = body_json(response).await;
        assert_eq!(resp.title_status, "in_transit");
    }

    #[tokio::test]
    async fn delete_refused_while_in_arb() {
        let state = AppState::new();
        let id = create_vehicle_via_api(&state).await;
        state.vehicles.update(&id, |v| {
            v.status = VehicleStatus::Arb;
        });

        let app = test_app(state.clone());
        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/vehicles/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(state.vehicles.contains(&id));
    }

    #[tokio::test]
    async fn receive_then_complete_lifecycle() {
        let state = AppState::new();
        let app = test_app(state.clone());
        let mut body = create_body();
        body["status"] = serde_json::json!("pending");
        let response = app.oneshot(post("/api/vehicles", body)).await.unwrap();
        let created: VehicleResponse = body_json(response).await;
        assert_eq!(created.status, "pending");
        let id = created.id;

        let app = test_app(state.clone());
        let response = app
            .oneshot(post(
                &format!("/api/vehicles/{id}/receive"),
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let resp: VehicleResponse = body_json(response).await;
        assert_eq!(resp.status, "inventory");

        // Sell, then complete.
        let app = test_app(state.clone());
        app.oneshot(post(
            &format!("/api/vehicles/{id}/sale"),
            serde_json::json!({
                "buyer_name": "Dana Whitfield",
                "sold_price": "18500",
                "sale_date": "2026-05-02"
            }),
        ))
        .await
        .unwrap();

        let app = test_app(state.clone());
        let response = app
            .oneshot(post(
                &format!("/api/vehicles/{id}/complete"),
                serde_json::json!({}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let resp: VehicleResponse = body_json(response).await;
        assert_eq!(resp.status, "complete");
    }

    #[tokio::test]
    async fn get_vehicle_404_for_unknown_id() {
        let state = AppState::new();
        let app = test_app(state);
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/vehicles/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
