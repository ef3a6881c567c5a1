//! HTTP server wiring the conversational vehicle-search pipeline: Guardrail,
//! Understanding, Mapper, Composer, Refiner, Orchestrator, and Ranker.

pub mod error;
pub mod http;
pub mod metrics;
pub mod state;

pub use error::{ApiError, ErrorCode};
pub use http::create_router;
pub use metrics::init_metrics;
pub use state::AppState;
