//! HTTP API for the sample server
//!
//! Handlers for sample selection/delivery and archiving, plus the bearer
//! authentication gate. Routing lives in the crate root (`build_router`).

pub mod auth;
pub mod handlers;
