//! Local stand-in for the DoctorMate API used by the unit tests.

use axum::Router;
use serde_json::{Value, json};

use crate::mapper::{CARDIOLOGY, DERMATOLOGY};

/// Serves `router` on an ephemeral port and returns the base URL (`http://127.0.0.1:port/api`).
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api")
}

pub fn specialties_payload() -> Value {
    json!({
        "data": [
            {
                "id": CARDIOLOGY,
                "name": "Cardiology",
                "description": "Heart and blood vessels",
                "imageUrl": "https://img/cardio.png"
            },
            {
                "id": DERMATOLOGY,
                "name": "Dermatology",
                "description": "Skin, hair and nails",
                "imageUrl": "https://img/derm.png"
            }
        ]
    })
}

pub fn doctors_payload(count: usize) -> Value {
    let doctors: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "id": format!("doc-{i}"),
                "fullName": format!("Dr. Number {i}"),
                "imageUrl": null,
                "consultationFee": 200 + i,
                "address": "12 Nile St.",
                "workingTime": "09:00-17:00",
                "qualifications": "MBBCh"
            })
        })
        .collect();

    json!({ "data": { "doctors": doctors, "totalCount": count } })
}
