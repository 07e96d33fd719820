//! # Cusswatch Server
//!
//! HTTP surface for the profanity analysis pipeline.
//!
//! ## Endpoints
//!
//! - `GET /api/search?q=` - title search
//! - `GET /api/episodes?tmdb_id=&season=` - season episode listing
//! - `POST /api/analyze` - run (or replay from cache) an analysis,
//!   streaming progress as server-sent events
//! - `GET /api/health` - liveness probe
//!
//! The server wires concrete collaborators (reqwest client, Redis or
//! in-memory cache, Gemini classifier, the three subtitle providers) into
//! the core pipeline and maps core errors onto HTTP status classes.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::Settings;
pub use errors::{AppError, AppResult};
pub use state::AppState;
