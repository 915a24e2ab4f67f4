//! Authentication endpoints.

use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sitecraft_common::{AppError, AppResult};
use sitecraft_core::{SignupInput, UserOverview};
use sitecraft_db::entities::user;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, no_content},
};

/// Signup request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub fullname: String,
    pub email: String,
    pub whatsapp: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub profession: Option<String>,
    pub password: String,
}

/// Signup form echoed back on rejection, without the password.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    pub fullname: String,
    pub email: String,
    pub whatsapp: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub profession: Option<String>,
}

impl SignupRequest {
    fn split(self) -> (SignupInput, SignupForm) {
        let form = SignupForm {
            fullname: self.fullname.clone(),
            email: self.email.clone(),
            whatsapp: self.whatsapp.clone(),
            gender: self.gender.clone(),
            dob: self.dob,
            profession: self.profession.clone(),
        };
        let input = SignupInput {
            fullname: self.fullname,
            email: self.email,
            whatsapp: self.whatsapp,
            gender: self.gender,
            dob: self.dob,
            profession: self.profession,
            password: self.password,
        };
        (input, form)
    }
}

/// Public view of an account.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub uid: String,
    pub fullname: String,
    pub email: String,
    pub whatsapp: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<NaiveDate>,
    pub profession: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            is_admin: user.is_admin(),
            id: user.id,
            uid: user.uid,
            fullname: user.fullname,
            email: user.email,
            whatsapp: user.whatsapp,
            gender: user.gender,
            dob: user.dob,
            profession: user.profession,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Signed-in session.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
}

impl From<user::Model> for SessionResponse {
    fn from(user: user::Model) -> Self {
        Self {
            token: user.token.clone(),
            user: user.into(),
        }
    }
}

/// Create a new account.
///
/// A taken email is answered with 409 and the submitted form.
async fn signup(State(state): State<AppState>, Json(req): Json<SignupRequest>) -> Response {
    let (input, form) = req.split();

    match state.account_service.signup(input).await {
        Ok(user) => ApiResponse::ok(SessionResponse::from(user)).into_response(),
        Err(e @ AppError::Conflict(_)) => ApiResponse::rejected(&e, form),
        Err(e) => e.into_response(),
    }
}

/// Signin request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Sign in to an existing account.
async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let user = state
        .account_service
        .signin(&req.email, &req.password)
        .await?;

    Ok(ApiResponse::ok(user.into()))
}

/// Sign out (invalidates the current token).
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    state.account_service.signout(user).await?;
    Ok(no_content())
}

/// The signed-in account with its dashboard counters.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: UserResponse,
    pub counts: UserOverview,
}

async fn me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MeResponse>> {
    let counts = state.dashboard_service.user_overview(&user).await?;

    Ok(ApiResponse::ok(MeResponse {
        user: user.into(),
        counts,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
        .route("/me", get(me))
}
