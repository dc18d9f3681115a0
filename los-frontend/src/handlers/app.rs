use crate::config::FrontendConfig;
use askama::Template;
use axum::{extract::State, response::IntoResponse};

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub backend_url: String,
}

pub async fn index(State(config): State<FrontendConfig>) -> impl IntoResponse {
    IndexTemplate {
        backend_url: config.backend_url,
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}
