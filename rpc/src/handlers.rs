//! Request handlers and their JSON shapes.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Multipart, Path, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sigver_types::{
    content_type_for, HistoryEntryView, PublicUser, Role, ScoreSource, SignatureId,
    SignatureRecord, UserId,
};
use sigver_verification::{Profile, Registration, ServiceError};
use tracing::{debug, error};

use crate::auth::AuthSession;
use crate::error::ApiError;
use crate::multipart::FormData;
use crate::server::AppState;

// ── Response shapes ──────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: PublicUser,
    pub token: String,
}

/// Profile view. Images are base64, `null` when absent.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDto {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub profile_picture: Option<String>,
    pub original_signature: Option<String>,
    pub signature_references: Vec<SignatureId>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<Profile> for ProfileDto {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.user.id,
            username: profile.user.username,
            email: profile.user.email,
            role: profile.user.role,
            profile_picture: profile.profile_picture.map(|b| BASE64.encode(b)),
            original_signature: profile.original_signature.map(|b| BASE64.encode(b)),
            signature_references: profile.signature_references,
            last_login: profile.user.last_login,
        }
    }
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: ProfileDto,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub history: Vec<HistoryEntryView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Signature metadata as clients see it; the server path is never exposed.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureDto {
    #[serde(rename = "_id")]
    pub id: SignatureId,
    pub owner: UserId,
    pub filename: String,
    pub is_reference: bool,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<SignatureRecord> for SignatureDto {
    fn from(record: SignatureRecord) -> Self {
        Self {
            id: record.id,
            owner: record.owner,
            filename: record.filename,
            is_reference: record.is_reference,
            description: record.description,
            created_at: record.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct SignatureResponse {
    pub success: bool,
    pub signature: SignatureDto,
}

#[derive(Serialize)]
pub struct SignaturesResponse {
    pub success: bool,
    pub signatures: Vec<SignatureDto>,
}

#[derive(Serialize)]
pub struct VerifyResultDto {
    #[serde(rename = "match")]
    pub is_match: bool,
    pub similarity_score: f64,
    pub score_source: ScoreSource,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub result: VerifyResultDto,
}

#[derive(Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub count: usize,
    pub users: Vec<PublicUser>,
}

// ── Request shapes ───────────────────────────────────────────────────────

/// JSON registration body. `name` is accepted for `username`.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct RegisterBody {
    pub username: Option<String>,
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────

pub async fn health() -> &'static str {
    "Signature Verification API is running"
}

pub async fn register(
    State(state): State<AppState>,
    request: Request,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let registration = if is_multipart(request.headers()) {
        let multipart = Multipart::from_request(request, &state).await?;
        let mut form = FormData::read(multipart).await?;
        Registration {
            username: form
                .text("username")
                .or_else(|| form.text("name"))
                .unwrap_or_default()
                .to_string(),
            email: form.text("email").unwrap_or_default().to_string(),
            password: form.text("password").unwrap_or_default().to_string(),
            profile_picture: form.take_file("profilePicture"),
            original_signature: form.take_file("originalSignature"),
        }
    } else {
        let Json(body) = Json::<RegisterBody>::from_request(request, &state).await?;
        Registration {
            username: body.username.or(body.name).unwrap_or_default(),
            email: body.email,
            password: body.password,
            ..Default::default()
        }
    };

    let accounts = state.accounts.clone();
    let outcome = blocking(move || accounts.register(registration)).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            user: outcome.user.public(),
            token: outcome.token.token,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let Json(body) = body?;
    let accounts = state.accounts.clone();
    let outcome = blocking(move || accounts.login(&body.email, &body.password)).await?;

    Ok(Json(AuthResponse {
        success: true,
        user: outcome.user.public(),
        token: outcome.token.token,
    }))
}

pub async fn profile(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<ProfileResponse>, ApiError> {
    let accounts = state.accounts.clone();
    let profile = blocking(move || accounts.profile(&session)).await?;
    Ok(Json(ProfileResponse {
        success: true,
        user: profile.into(),
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<MessageResponse>, ApiError> {
    let accounts = state.accounts.clone();
    blocking(move || accounts.logout(&session)).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "User logged out successfully".into(),
    }))
}

pub async fn history(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<HistoryResponse>, ApiError> {
    let signatures = state.signatures.clone();
    let history = blocking(move || signatures.history(&session.user_id)).await?;
    let message = history
        .is_empty()
        .then(|| "No verification history found".to_string());
    Ok(Json(HistoryResponse {
        success: true,
        history,
        message,
    }))
}

pub async fn upload_reference(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<SignatureResponse>), ApiError> {
    let mut form = FormData::read(multipart?).await?;
    let upload = form
        .take_file("signature")
        .or_else(|| form.take_only_file())
        .ok_or(ServiceError::NoFileProvided)?;
    let description = form.text("description").map(str::to_string);

    let signatures = state.signatures.clone();
    let record =
        blocking(move || signatures.upload_reference(&session.user_id, upload, description))
            .await?;
    Ok((
        StatusCode::CREATED,
        Json(SignatureResponse {
            success: true,
            signature: record.into(),
        }),
    ))
}

pub async fn verify(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let mut form = FormData::read(multipart?).await?;
    let probe = form
        .take_file("verification_signature")
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ServiceError::Validation("Verification signature is required".into()))?;

    let owner = session.user_id;
    let signatures = state.signatures.clone();
    let pending = blocking(move || signatures.prepare_verification(&owner, probe)).await?;
    let (result, record) = state.signatures.score_verification(pending).await?;
    let signatures = state.signatures.clone();
    let recorded = blocking(move || {
        signatures.record_verification(&owner, &record);
        Ok(())
    })
    .await;
    if let Err(e) = recorded {
        error!(user_id = %owner, error = %e, "history task failed; result still returned");
    }
    Ok(Json(VerifyResponse {
        success: true,
        result: VerifyResultDto {
            is_match: result.is_match,
            similarity_score: result.similarity_score,
            score_source: result.score_source,
        },
    }))
}

pub async fn references(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<SignaturesResponse>, ApiError> {
    let service = state.signatures.clone();
    let signatures = blocking(move || service.reference_signatures(&session.user_id)).await?;
    Ok(Json(SignaturesResponse {
        success: true,
        signatures: signatures.into_iter().map(SignatureDto::from).collect(),
    }))
}

pub async fn get_signature(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<Json<SignatureResponse>, ApiError> {
    let id = parse_signature_id(&id)?;
    let signatures = state.signatures.clone();
    let record = blocking(move || signatures.get_signature(&session.user_id, &id)).await?;
    Ok(Json(SignatureResponse {
        success: true,
        signature: record.into(),
    }))
}

pub async fn signature_image(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_signature_id(&id)?;
    let signatures = state.signatures.clone();
    let (record, bytes) =
        blocking(move || signatures.read_signature_image(&session.user_id, &id)).await?;
    Ok(([(CONTENT_TYPE, content_type_for(&record.filename))], bytes))
}

pub async fn delete_signature(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_signature_id(&id)?;
    let signatures = state.signatures.clone();
    blocking(move || signatures.delete_signature(&session.user_id, &id)).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Signature deleted".into(),
    }))
}

pub async fn list_users(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<UsersResponse>, ApiError> {
    let accounts = state.accounts.clone();
    let users = blocking(move || accounts.list_users(&session)).await?;
    Ok(Json(UsersResponse {
        success: true,
        count: users.len(),
        users,
    }))
}

/// Run a service call on the blocking pool. Services do synchronous LMDB
/// transactions, Argon2 hashing and file I/O.
pub(crate) async fn blocking<T, F>(task: F) -> Result<T, ServiceError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ServiceError::Internal(format!("blocking task failed: {e}")))?
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
}

/// Malformed ids are indistinguishable from unknown ones.
fn parse_signature_id(raw: &str) -> Result<SignatureId, ServiceError> {
    raw.parse().map_err(|_| {
        debug!(id = raw, "malformed signature id");
        ServiceError::SignatureNotFound
    })
}
