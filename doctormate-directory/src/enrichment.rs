use tracing::{debug, info};

use crate::{
    client::{DirectoryClient, build_http_client},
    mapper::{specialty_for_skin, specialty_for_symptoms},
    models::Enrichment,
};

/// Appends specialty and doctor recommendations to a diagnosis.
///
/// Built once at startup and shared across requests; each call binds the
/// caller's bearer token to a short-lived [`DirectoryClient`]. Without a token
/// no request is made and the enrichment is empty. Upstream failures also
/// yield empty data, so callers cannot tell the two cases apart.
#[derive(Clone)]
pub struct Enricher {
    http: reqwest::Client,
    base_url: String,
    doctor_limit: usize,
}

impl Enricher {
    pub fn new(base_url: impl Into<String>, doctor_limit: usize) -> reqwest::Result<Self> {
        Ok(Self::with_client(build_http_client()?, base_url, doctor_limit))
    }

    pub fn with_client(
        http: reqwest::Client,
        base_url: impl Into<String>,
        doctor_limit: usize,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            doctor_limit,
        }
    }

    pub async fn enrich_skin(&self, token: Option<&str>, diagnosis_code: &str) -> Enrichment {
        let Some(token) = usable_token(token) else {
            return Enrichment::empty();
        };
        let specialty_id = specialty_for_skin(diagnosis_code);
        debug!(diagnosis_code = %diagnosis_code, specialty_id = %specialty_id, "Mapped skin diagnosis");
        self.enrich(token, specialty_id).await
    }

    pub async fn enrich_symptoms(
        &self,
        token: Option<&str>,
        symptoms: &str,
        diagnosis: &str,
    ) -> Enrichment {
        let Some(token) = usable_token(token) else {
            return Enrichment::empty();
        };
        let specialty_id = specialty_for_symptoms(symptoms, diagnosis);
        debug!(diagnosis = %diagnosis, specialty_id = %specialty_id, "Mapped symptom diagnosis");
        self.enrich(token, specialty_id).await
    }

    async fn enrich(&self, token: &str, specialty_id: &str) -> Enrichment {
        let client = DirectoryClient::new(self.http.clone(), self.base_url.as_str(), token);

        let specialty = client.get_specialty(specialty_id).await;
        let recommended_doctors = client
            .get_recommended_doctors(specialty_id, self.doctor_limit)
            .await;

        info!(
            specialty_id = %specialty_id,
            specialty_found = specialty.is_some(),
            doctors = recommended_doctors.len(),
            "Enrichment completed"
        );

        Enrichment {
            specialty,
            recommended_doctors,
        }
    }
}

fn usable_token(token: Option<&str>) -> Option<&str> {
    token.map(str::trim).filter(|t| !t.is_empty())
}
