//! Service layer for the team-elo API
//!
//! This module contains the league facade, the HTTP router, health checks
//! and the serve loop used by the binary.

pub mod app;
pub mod health;
pub mod http;
pub mod league;

pub use app::{build_state, serve};
pub use health::{HealthCheck, HealthStatus};
pub use http::{router, ApiState};
pub use league::LeagueService;
