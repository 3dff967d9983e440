use axum::{Json, Router, routing::post};
use serde::{Deserialize, Serialize};

use crate::config::EncodeConfig;
use crate::encode;
use crate::loader::RawCourseData;

/// Request body for `POST /v1/cnf/encode`, generalizing the teacher's
/// single-purpose `/v1/schedule/solve` endpoint to the CNF encoder's
/// external interface (spec §6): raw course data, the constraints map, the
/// debug flag, and an optional output path.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EncodeRequest {
    sections: RawCourseData,
    #[serde(flatten)]
    config: EncodeConfig,
    output_path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EncodeResponse {
    path: String,
    clauses: u64,
    max_variable: u32,
}

async fn encode_handler(
    Json(request): Json<EncodeRequest>,
) -> Result<Json<EncodeResponse>, (axum::http::StatusCode, String)> {
    let output_path = request
        .output_path
        .unwrap_or_else(|| "results/output.cnf".to_string());

    match encode::encode(&request.sections, &request.config, &output_path) {
        Ok(report) => Ok(Json(EncodeResponse {
            path: report.output_path.display().to_string(),
            clauses: report.total_clauses,
            max_variable: report.max_variable,
        })),
        Err(e) => Err((axum::http::StatusCode::BAD_REQUEST, e.to_string())),
    }
}

pub async fn run_server() {
    let app = Router::new().route("/v1/cnf/encode", post(encode_handler));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:8080")
        .await
        .unwrap();

    println!("Server running at http://{}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
