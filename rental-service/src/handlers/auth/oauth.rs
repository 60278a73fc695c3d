use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::auth::{AuthorizationUrlResponse, OAuthCallbackQuery},
    middleware::AuthUser,
    models::{IdentProvider, RequestOrigin, UserResponse},
    services::OAuthStart,
    AppState,
};

const STATE_COOKIE: &str = "oauth_state";
const VERIFIER_COOKIE: &str = "oauth_verifier";
const LINK_COOKIE: &str = "oauth_link_user";
const COOKIE_PATH: &str = "/auth/oauth";

fn parse_provider(provider: &str) -> Result<IdentProvider, AppError> {
    provider
        .parse::<IdentProvider>()
        .map_err(|_| AppError::NotFound(anyhow::anyhow!("Unknown identity provider")))
}

fn flow_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path(COOKIE_PATH)
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(5))
        .build()
}

fn store_flow(jar: SignedCookieJar, start: &OAuthStart) -> SignedCookieJar {
    jar.add(flow_cookie(STATE_COOKIE, start.state.clone()))
        .add(flow_cookie(VERIFIER_COOKIE, start.code_verifier.clone()))
}

fn clear_flow(jar: SignedCookieJar) -> SignedCookieJar {
    [STATE_COOKIE, VERIFIER_COOKIE, LINK_COOKIE]
        .into_iter()
        .fold(jar, |jar, name| jar.remove(Cookie::build(name).path(COOKIE_PATH)))
}

/// Start sign-in with an identity provider
#[utoipa::path(
    get,
    path = "/auth/oauth/{provider}",
    params(("provider" = String, Path, description = "google or github")),
    responses(
        (status = 303, description = "Redirect to the provider"),
        (status = 404, description = "Provider unknown or not configured", body = ErrorResponse)
    ),
    tag = "OAuth"
)]
pub async fn oauth_start(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Redirect), AppError> {
    let provider = parse_provider(&provider)?;
    let start = state.oauth_service.begin(provider)?;
    let jar = store_flow(jar.remove(Cookie::build(LINK_COOKIE).path(COOKIE_PATH)), &start);
    Ok((jar, Redirect::to(&start.authorization_url)))
}

/// Start linking an identity provider to the signed-in account
#[utoipa::path(
    post,
    path = "/auth/oauth/{provider}/link",
    params(("provider" = String, Path, description = "google or github")),
    responses(
        (status = 200, description = "Authorization URL to open", body = AuthorizationUrlResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Provider unknown or not configured", body = ErrorResponse)
    ),
    tag = "OAuth",
    security(("bearer_auth" = []))
)]
pub async fn oauth_link(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    user: AuthUser,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Json<AuthorizationUrlResponse>), AppError> {
    let provider = parse_provider(&provider)?;
    let start = state.oauth_service.begin(provider)?;
    let jar = store_flow(jar, &start).add(flow_cookie(LINK_COOKIE, user.user_id.to_string()));
    Ok((
        jar,
        Json(AuthorizationUrlResponse {
            authorization_url: start.authorization_url,
        }),
    ))
}

/// Provider callback
///
/// Redirects to the frontend with a token, an MFA challenge, or a link
/// confirmation.
#[utoipa::path(
    get,
    path = "/auth/oauth/{provider}/callback",
    params(("provider" = String, Path, description = "google or github")),
    responses(
        (status = 303, description = "Redirect to the frontend"),
        (status = 400, description = "State mismatch or provider error", body = ErrorResponse),
        (status = 404, description = "Provider unknown or not configured", body = ErrorResponse),
        (status = 409, description = "Identity linked to another user", body = ErrorResponse),
        (status = 502, description = "Provider exchange failed", body = ErrorResponse)
    ),
    tag = "OAuth"
)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthCallbackQuery>,
    origin: RequestOrigin,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Response), AppError> {
    let provider = parse_provider(&provider)?;

    if let Some(error) = query.error {
        tracing::warn!(provider = provider.as_str(), error = %error, "Provider returned an error");
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Authorization was not granted"
        )));
    }

    let stored_state = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    match (&stored_state, &query.state) {
        (Some(stored), Some(returned)) if stored == returned => {}
        _ => return Err(AppError::BadRequest(anyhow::anyhow!("Invalid OAuth state"))),
    }

    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing authorization code")))?;
    let code_verifier = jar
        .get(VERIFIER_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing code verifier")))?;
    let link_user = jar
        .get(LINK_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok());

    let outcome = state
        .oauth_service
        .complete(provider, &code, &code_verifier, link_user, &origin)
        .await?;

    let redirect = state.oauth_service.frontend_redirect(&outcome);
    Ok((clear_flow(jar), Redirect::to(&redirect).into_response()))
}

/// Unlink an identity provider
#[utoipa::path(
    delete,
    path = "/auth/oauth/{provider}",
    params(("provider" = String, Path, description = "google or github")),
    responses(
        (status = 200, description = "Provider unlinked", body = UserResponse),
        (status = 404, description = "Provider not linked", body = ErrorResponse),
        (status = 422, description = "Would leave no way to sign in", body = ErrorResponse)
    ),
    tag = "OAuth",
    security(("bearer_auth" = []))
)]
pub async fn oauth_unlink(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    user: AuthUser,
    origin: RequestOrigin,
) -> Result<impl IntoResponse, AppError> {
    let provider = parse_provider(&provider)?;
    let updated = state
        .oauth_service
        .unlink(user.user_id, provider, &origin)
        .await?;
    Ok(Json(UserResponse::from(&updated)))
}
