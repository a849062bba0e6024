use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// A medical department as published by the DoctorMate API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specialty {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A doctor listed under a specialty. Fields are passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub consultation_fee: Option<Value>,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub working_time: Option<Value>,
    #[serde(default)]
    pub qualifications: Option<Value>,
}

/// Envelope used by every DoctorMate endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T: Default> {
    #[serde(default)]
    pub data: T,
}

/// Records stay raw so one malformed entry cannot sink its siblings.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct DoctorPage {
    #[serde(default)]
    pub doctors: Vec<Value>,
}

/// Specialty and doctor data appended to a diagnosis.
///
/// Serialises to `{"specialty": {}, "recommended_doctors": []}` when empty so
/// callers never see `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Enrichment {
    #[serde(serialize_with = "specialty_or_empty")]
    pub specialty: Option<Specialty>,
    pub recommended_doctors: Vec<Doctor>,
}

impl Enrichment {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.specialty.is_none() && self.recommended_doctors.is_empty()
    }
}

fn specialty_or_empty<S: Serializer>(
    specialty: &Option<Specialty>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match specialty {
        Some(specialty) => specialty.serialize(serializer),
        None => serde_json::Map::new().serialize(serializer),
    }
}
