use std::sync::Arc;

use poem::Route;
use poem_openapi::{OpenApiService, Tags};

use crate::application::usecases::{
    get_email::GetEmailUseCase, list_emails::ListEmailsUseCase, submit_email::SubmitEmailUseCase,
};
use crate::presentation::http::endpoints::emails::EmailsEndpoints;

pub struct ApiState {
    pub submit_email_usecase: Arc<SubmitEmailUseCase>,
    pub get_email_usecase: Arc<GetEmailUseCase>,
    pub list_emails_usecase: Arc<ListEmailsUseCase>,
    pub api_key: String,
}

/// Enum of API sections (tags)
#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Email,
}

pub struct Endpoints;

/// Mounts the API under `/api` and the Swagger UI at `/`.
pub fn build_app(state: Arc<ApiState>, server_url: &str) -> Route {
    let api_service = OpenApiService::new(
        (Endpoints, EmailsEndpoints::new(state)),
        "Email Dispatch API",
        env!("CARGO_PKG_VERSION"),
    )
    .server(format!("{server_url}/api"));
    let ui = api_service.swagger_ui();

    Route::new().nest("/api", api_service).nest("/", ui)
}
