//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "BackLot API",
        version = "0.3.2",
        description = "Dealership back-office API: inventory and sales, arbitration outcome workflow, user administration, scheduling, and internal chat.",
        license(name = "BUSL-1.1")
    ),
    paths(
        // Arbitration
        crate::routes::arb::list_cases,
        crate::routes::arb::get_case,
        crate::routes::arb::vehicle_arb_history,
        crate::routes::arb::open_case,
        crate::routes::arb::submit_outcome,
        // Vehicles
        crate::routes::vehicles::list_vehicles,
        crate::routes::vehicles::create_vehicle,
        crate::routes::vehicles::get_vehicle,
        crate::routes::vehicles::update_vehicle,
        crate::routes::vehicles::delete_vehicle,
        crate::routes::vehicles::receive_vehicle,
        crate::routes::vehicles::record_sale,
        crate::routes::vehicles::complete_sale,
        // Users
        crate::routes::users::list_users,
        crate::routes::users::create_user,
        crate::routes::users::get_user,
        crate::routes::users::update_user,
        crate::routes::users::delete_user,
        // Tasks
        crate::routes::tasks::list_tasks,
        crate::routes::tasks::create_task,
        crate::routes::tasks::get_task,
        crate::routes::tasks::update_task,
        crate::routes::tasks::delete_task,
        // Events
        crate::routes::events::list_events,
        crate::routes::events::create_event,
        crate::routes::events::get_event,
        crate::routes::events::delete_event,
        // Chat
        crate::routes::chat::list_conversations,
        crate::routes::chat::create_conversation,
        crate::routes::chat::poll_messages,
        crate::routes::chat::send_message,
    ),
    components(schemas(
        // State record types
        crate::state::UserRecord,
        crate::state::UserStatus,
        crate::state::TaskRecord,
        crate::state::TaskStatus,
        crate::state::EventRecord,
        crate::state::ConversationRecord,
        crate::state::MessageRecord,
        // Auth
        crate::auth::Role,
        // Error types
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        // Arbitration DTOs
        crate::routes::arb::OpenCaseRequest,
        crate::routes::arb::OutcomeRequest,
        crate::routes::arb::ArbCaseResponse,
        crate::routes::arb::VehicleSummary,
        crate::routes::arb::ArbCaseDetail,
        crate::routes::arb::TallyResponse,
        crate::routes::arb::ArbListResponse,
        // Vehicle DTOs
        crate::routes::vehicles::CreateVehicleRequest,
        crate::routes::vehicles::UpdateVehicleRequest,
        crate::routes::vehicles::SaleRequest,
        crate::routes::vehicles::VehicleResponse,
        // User DTOs
        crate::routes::users::CreateUserRequest,
        crate::routes::users::UpdateUserRequest,
        crate::routes::users::UserResponse,
        // Task DTOs
        crate::routes::tasks::CreateTaskRequest,
        crate::routes::tasks::UpdateTaskRequest,
        // Event DTOs
        crate::routes::events::CreateEventRequest,
        // Chat DTOs
        crate::routes::chat::CreateConversationRequest,
        crate::routes::chat::SendMessageRequest,
    )),
    tags(
        (name = "arb", description = "Arbitration workflow"),
        (name = "vehicles", description = "Inventory and sales"),
        (name = "users", description = "User administration"),
        (name = "tasks", description = "Scheduled tasks"),
        (name = "events", description = "Calendar events"),
        (name = "chat", description = "Internal chat"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
///
/// Serves the OpenAPI JSON spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json — Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
