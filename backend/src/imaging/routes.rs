use actix_multipart::Multipart;
use actix_web::http::header::{self, ContentType};
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;
use log::{error, info, warn};
use shared::{HealthResponse, PredictionResponse};
use std::sync::Arc;

use super::model::ImagePredictor;
use super::page::INDEX_HTML;
use super::transform::decode_rgb;
use super::upload::{UploadError, read_file_field, secure_filename};
use crate::error::{ApiError, ModelError};
use crate::prediction_log::{LogEntry, PredictionLog};

/// Shared, read-only state of the X-ray app.
#[derive(Clone)]
pub struct ImageState {
    pub predictor: ImagePredictor,
    pub log: Arc<dyn PredictionLog>,
    pub max_upload_bytes: usize,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/predict").route(web::post().to(predict)));
}

async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(INDEX_HTML)
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse::ok())
}

async fn predict(
    req: HttpRequest,
    state: web::Data<ImageState>,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let response = run_prediction(&req, &state, payload).await;
    match &response {
        Err(e @ ApiError::Upload(_)) => warn!("Rejected upload: {}", e),
        Err(e) => error!("Prediction failed: {}", e),
        Ok(_) => {}
    }
    response
}

async fn run_prediction(
    req: &HttpRequest,
    state: &ImageState,
    payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let upload = read_file_field(payload, state.max_upload_bytes).await?;
    let filename = secure_filename(&upload.filename);
    let size_bytes = upload.data.len() as u64;

    let ip = client_ip(req);
    let agent = user_agent(req);
    let predictor = state.predictor.clone();
    let sink = state.log.clone();
    let logged_name = filename.clone();
    let classification = web::block(move || -> Result<_, ApiError> {
        let image = decode_rgb(&upload.data).map_err(UploadError::from)?;
        let classification = predictor.classify(&image)?;
        sink.append(&LogEntry::new(
            Utc::now(),
            ip,
            agent,
            logged_name,
            classification.label.clone(),
            classification.confidence,
            size_bytes,
        ))?;
        Ok(classification)
    })
    .await
    .map_err(ModelError::from)??;

    info!(
        "Predicted {} ({:.4}) for {} [{} bytes]",
        classification.label, classification.confidence, filename, size_bytes
    );

    Ok(HttpResponse::Ok().json(PredictionResponse {
        ok: true,
        filename,
        prediction: classification.label,
        confidence: classification.confidence,
    }))
}

/// First `X-Forwarded-For` hop, else the peer address, else empty.
pub fn client_ip(req: &HttpRequest) -> String {
    req.headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
        .unwrap_or_default()
}

fn user_agent(req: &HttpRequest) -> String {
    req.headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn forwarded_for_wins_over_peer() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.9, 10.0.0.1"))
            .peer_addr("10.0.0.1:5555".parse().unwrap())
            .to_http_request();
        assert_eq!(client_ip(&req), "203.0.113.9");
    }

    #[test]
    fn falls_back_to_peer_address() {
        let req = TestRequest::default()
            .peer_addr("192.168.1.20:40000".parse().unwrap())
            .to_http_request();
        assert_eq!(client_ip(&req), "192.168.1.20");
    }

    #[test]
    fn unknown_client_is_empty() {
        let req = TestRequest::default().to_http_request();
        assert_eq!(client_ip(&req), "");
        assert_eq!(user_agent(&req), "");
    }
}
