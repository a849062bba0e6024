pub mod client;
pub mod enrichment;
pub mod error;
pub mod mapper;
pub mod models;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use client::{DEFAULT_BASE_URL, DEFAULT_DOCTOR_LIMIT, DirectoryClient, build_http_client};
pub use enrichment::Enricher;
pub use error::{DirectoryError, Result};
pub use mapper::{specialty_for_skin, specialty_for_symptoms};
pub use models::{Doctor, Enrichment, Specialty};
