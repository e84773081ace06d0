use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use acf_ledger::{
    LedgerError, LedgerSummary, PassRecord, PassVerification, SyncStatus, VerificationReason,
};
use acf_types::{DonationInput, DonationPass};

use crate::auth::AdminBearer;
use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// An issued pass plus what a client needs to render it.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationResponse {
    #[serde(flatten)]
    pub pass: DonationPass,
    /// Text to encode in the pass QR code.
    pub scan_payload: String,
    pub image_file_name: String,
}

/// `POST /api/donations`
pub async fn create_donation(
    State(state): State<AppState>,
    payload: Result<Json<DonationInput>, JsonRejection>,
) -> ServerResult<(StatusCode, Json<DonationResponse>)> {
    let Json(input) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let pass = state.issuer.issue(&input).await?;
    Ok((
        StatusCode::CREATED,
        Json(DonationResponse {
            scan_payload: pass.scan_payload(),
            image_file_name: pass.image_file_name(),
            pass,
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct ImageSyncResponse {
    pub sync: SyncStatus,
}

/// `PUT /api/passes/:pass_id/image`
///
/// Upload failures are reported in the body, not as an error status: the
/// pass itself is already valid and the client may simply retry.
pub async fn upload_pass_image(
    State(state): State<AppState>,
    Path(pass_id): Path<String>,
    body: Bytes,
) -> ServerResult<Json<ImageSyncResponse>> {
    let pass = state
        .verifier
        .find_pass(&pass_id)
        .await?
        .ok_or(LedgerError::PassNotFound(pass_id))?;
    let sync = state.issuer.upload_image(&pass, body).await;
    Ok(Json(ImageSyncResponse { sync }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub reason: VerificationReason,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<PassRecord>,
}

impl From<PassVerification> for VerifyResponse {
    fn from(v: PassVerification) -> Self {
        Self {
            valid: v.valid,
            reason: v.reason,
            message: v.reason.message().to_string(),
            record: v.record,
        }
    }
}

/// `GET /api/verify?id=...`
pub async fn verify_pass(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> ServerResult<Json<VerifyResponse>> {
    let verification = state.verifier.verify(&params.id).await?;
    Ok(Json(verification.into()))
}

#[derive(Debug, Serialize)]
pub struct LedgerResponse {
    pub donations: Vec<DonationPass>,
    pub summary: LedgerSummary,
}

/// `GET /api/admin/donations`
pub async fn list_donations(
    _admin: AdminBearer,
    State(state): State<AppState>,
) -> ServerResult<Json<LedgerResponse>> {
    let snapshot = state.ledger.snapshot().await?;
    Ok(Json(LedgerResponse {
        donations: snapshot.passes,
        summary: snapshot.summary,
    }))
}
