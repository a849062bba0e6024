//! Maps diagnoses to DoctorMate specialty identifiers.
//!
//! Both lookups are pure table scans. The symptom table is ordered and the
//! first group with a matching keyword wins; there is no scoring.

pub const CARDIOLOGY: &str = "a1111111-a1a1-a1a1-a1a1-a1a1a1a1a1a1";
pub const NEUROLOGY: &str = "5b05c49a-288f-48f3-b684-6d505c58d276";
pub const DERMATOLOGY: &str = "b2222222-b2b2-b2b2-b2b2-b2b2b2b2b2b2";
pub const PEDIATRICS: &str = "bb79c512-c722-4e5a-a1fc-c9699359b636";
pub const GENERAL: &str = "fa12fdd9-0a6a-4330-814c-17fd31fbd637";

/// Skin lesion codes produced by the classifier.
pub const SKIN_LESION_CODES: [&str; 7] = ["akiec", "bcc", "bkl", "df", "mel", "nv", "vasc"];

const SKIN_LESION_SPECIALTIES: [(&str, &str); 7] = [
    ("mel", DERMATOLOGY),
    ("bcc", DERMATOLOGY),
    ("akiec", DERMATOLOGY),
    ("bkl", DERMATOLOGY),
    ("df", DERMATOLOGY),
    ("nv", DERMATOLOGY),
    ("vasc", DERMATOLOGY),
];

/// Pipe-delimited keyword groups, scanned in declaration order.
const SYMPTOM_KEYWORDS: [(&str, &str); 4] = [
    ("heart|chest pain|palpitation|cardiac", CARDIOLOGY),
    ("brain|headache|seizure|neurological|nerve", NEUROLOGY),
    ("skin|rash|acne|eczema|dermatological", DERMATOLOGY),
    ("child|infant|pediatric|baby", PEDIATRICS),
];

pub fn specialty_for_skin(diagnosis_code: &str) -> &'static str {
    SKIN_LESION_SPECIALTIES
        .iter()
        .find(|(code, _)| *code == diagnosis_code)
        .map(|(_, specialty)| *specialty)
        .unwrap_or(DERMATOLOGY)
}

pub fn specialty_for_symptoms(symptoms: &str, diagnosis: &str) -> &'static str {
    let combined = format!("{} {}", symptoms.to_lowercase(), diagnosis.to_lowercase());

    SYMPTOM_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.split('|').any(|keyword| combined.contains(keyword)))
        .map(|(_, specialty)| *specialty)
        .unwrap_or(GENERAL)
}
