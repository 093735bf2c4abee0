use actix_web::{HttpResponse, Responder, get, post, web};
use serde::Serialize;

use crate::models::auth::AuthenticatedUser;
use crate::services::tokens::TokenService;

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
}

#[get("/health")]
pub async fn health() -> impl Responder {
    web::Json(HealthStatus { status: "ok" })
}

/// Echo the verified claims of the presented access token.
#[get("/whoami")]
pub async fn whoami(user: AuthenticatedUser) -> impl Responder {
    web::Json(user)
}

/// Exchange a token accepted under the rotation pair for a fresh one signed
/// with the current access secret. Clients holding tokens from a retired
/// secret call this to migrate without re-authenticating.
#[post("/refresh")]
pub async fn refresh(
    user: web::ReqData<AuthenticatedUser>,
    tokens: web::Data<TokenService>,
) -> impl Responder {
    match tokens.issue(&user.sub) {
        Ok(issued) => HttpResponse::Ok().json(issued),
        Err(err) => {
            log::error!("Failed to issue replacement token: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
