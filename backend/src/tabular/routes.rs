use actix_web::http::{StatusCode, header::ContentType};
use actix_web::{HttpResponse, web};
use log::{error, info};
use std::collections::HashMap;
use std::sync::Arc;

use super::form::TitanicForm;
use super::model::TabularModel;
use super::page;
use crate::error::ModelError;

/// Shared, read-only state of the survival app.
#[derive(Clone)]
pub struct TabularState {
    pub model: Arc<dyn TabularModel>,
}

impl TabularState {
    pub fn new(model: Arc<dyn TabularModel>) -> Self {
        Self { model }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/predict_web").route(web::post().to(predict_web)));
}

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(body)
}

async fn index() -> HttpResponse {
    html(StatusCode::OK, page::render(None, None))
}

async fn predict_web(
    state: web::Data<TabularState>,
    form: web::Form<HashMap<String, String>>,
) -> HttpResponse {
    let passenger = match TitanicForm::from_fields(&form) {
        Ok(passenger) => passenger,
        Err(e) => {
            error!("Rejected survival form: {}", e);
            return html(
                StatusCode::INTERNAL_SERVER_ERROR,
                page::render(None, Some(&e.to_string())),
            );
        }
    };
    let record = passenger.feature_record();

    let model = state.model.clone();
    let prediction = web::block(move || model.predict(&record))
        .await
        .map_err(ModelError::from)
        .and_then(|result| result);

    match prediction {
        Ok(label) => {
            info!("Survival prediction {} for {:?}", label, record);
            html(StatusCode::OK, page::render(Some(label), None))
        }
        Err(e) => {
            error!("Survival model failed: {}", e);
            html(
                StatusCode::INTERNAL_SERVER_ERROR,
                page::render(None, Some(&e.to_string())),
            )
        }
    }
}
