pub mod analysis;
pub mod config;
pub mod error;
pub mod knowledge;
pub mod models;
pub mod preprocess;
pub mod service;

pub use config::ServiceConfig;
pub use error::AnalysisError;
pub use service::{AppState, build_router, create_app};
pub use models::*;
