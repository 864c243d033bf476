//! # API Route Modules
//!
//! Route modules for the BackLot API surface:
//!
//! - `arb` — Arbitration workflow: case list with outcome tally, case
//!   detail, per-vehicle history, case opening, and the outcome endpoint
//!   that resolves a pending case and applies its financial effects.
//! - `vehicles` — Inventory CRUD, sale recording, receive/complete
//!   lifecycle operations.
//! - `users` — Admin-only user administration with protected-admin and
//!   no-escalation rules.
//! - `tasks` — Scheduled task CRUD.
//! - `events` — Calendar event CRUD.
//! - `chat` — Conversations, message append + publish, and the
//!   cursor-based message poll.

pub mod arb;
pub mod chat;
pub mod events;
pub mod tasks;
pub mod users;
pub mod vehicles;
