use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::{
    error::{DirectoryError, Result},
    models::{Doctor, DoctorPage, Envelope, Specialty},
};

pub const DEFAULT_BASE_URL: &str = "https://doctormate.runasp.net/api";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_DOCTOR_LIMIT: usize = 3;

/// Builds the pooled HTTP client shared by every [`DirectoryClient`].
pub fn build_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()
}

/// Client for the DoctorMate specialty and doctor endpoints, bound to one bearer token.
#[derive(Clone)]
pub struct DirectoryClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl DirectoryClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http,
            base_url,
            token: token.into(),
        }
    }

    /// Looks up a specialty by id, degrading to `None` on any failure.
    pub async fn get_specialty(&self, specialty_id: &str) -> Option<Specialty> {
        match self.fetch_specialty(specialty_id).await {
            Ok(specialty) => specialty,
            Err(e) => {
                log_degraded("specialty", &e);
                None
            }
        }
    }

    /// Fetches at most `limit` doctors for a specialty, degrading to an empty list on any failure.
    pub async fn get_recommended_doctors(&self, specialty_id: &str, limit: usize) -> Vec<Doctor> {
        match self.fetch_recommended_doctors(specialty_id, limit).await {
            Ok(doctors) => doctors,
            Err(e) => {
                log_degraded("doctors", &e);
                Vec::new()
            }
        }
    }

    /// The upstream has no single-specialty endpoint, so the full list is
    /// fetched and searched.
    pub async fn fetch_specialty(&self, specialty_id: &str) -> Result<Option<Specialty>> {
        let url = format!("{}/Specialties", self.base_url);
        let records: Vec<Value> = self.get_json(&url, &[]).await?;
        let specialties: Vec<Specialty> = decode_each("specialty", records);

        debug!(
            specialty_id = %specialty_id,
            available = specialties.len(),
            "Fetched specialties"
        );

        Ok(specialties.into_iter().find(|s| s.id == specialty_id))
    }

    pub async fn fetch_recommended_doctors(
        &self,
        specialty_id: &str,
        limit: usize,
    ) -> Result<Vec<Doctor>> {
        let url = format!("{}/Specialties/{}/doctors", self.base_url, specialty_id);
        let limit_param = limit.to_string();
        let page: DoctorPage = self
            .get_json(&url, &[("page", "1"), ("limit", limit_param.as_str())])
            .await?;

        let mut doctors: Vec<Doctor> = decode_each("doctor", page.doctors);
        doctors.truncate(limit);
        Ok(doctors)
    }

    async fn get_json<T>(&self, url: &str, query: &[(&str, &str)]) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let transport = |source| DirectoryError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/json")
            .query(query)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(transport)?;
        let envelope: Envelope<T> =
            serde_json::from_str(&body).map_err(|e| DirectoryError::Decode {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(envelope.data)
    }
}

/// Decodes every record on its own, skipping the ones that do not fit.
fn decode_each<T: DeserializeOwned>(kind: &str, records: Vec<Value>) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|record| match serde_json::from_value(record) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(record = kind, error = %e, "Skipping unreadable DoctorMate record");
                None
            }
        })
        .collect()
}

fn log_degraded(what: &str, e: &DirectoryError) {
    if e.is_expected() {
        warn!(lookup = what, error = %e, "DoctorMate lookup failed, continuing without it");
    } else {
        error!(lookup = what, error = %e, "Unexpected DoctorMate response, continuing without it");
    }
}
