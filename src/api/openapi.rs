use crate::api::handlers::{auth, health};
use axum::response::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "petconnect",
        description = "PetConnect account and authentication API",
    ),
    paths(
        auth::signup::signup,
        auth::login::login,
        auth::login::logout,
        auth::verification::verify_email,
        auth::reset::forgot_password,
        auth::reset::reset_password,
        auth::session::check_auth,
        health::health,
    ),
    components(schemas(
        auth::Account,
        auth::AccountEnvelope,
        auth::Address,
        auth::AddressPayload,
        auth::ApiMessage,
        auth::ForgotPasswordRequest,
        auth::LoginRequest,
        auth::ResetPasswordRequest,
        auth::Role,
        auth::RoleEnvelope,
        auth::SignupRequest,
        auth::VerifyEmailRequest,
        health::Health,
    )),
    tags(
        (name = "auth", description = "Account lifecycle and sessions"),
        (name = "health", description = "Service health probes"),
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Serve the generated `OpenAPI` document as JSON.
pub async fn serve() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi())
}
