use axum::{body::Bytes, extract::State, http::HeaderMap};
use serde::Serialize;
use serde_json::json;

use crate::database::models::{AuditAction, AuditEntry, NewKycDocument};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, RequestContext};
use crate::state::AppState;
use crate::types::{DocumentType, KycStatus};
use crate::uploads::{kyc_reference, sha256_hex, DocumentSide, FileSaga, UploadError, UploadedFile};
use crate::validation::{sanitize_optional, MAX_DOCUMENT_NUMBER_CHARS};

use super::utils::{guarded_form, notify_admins, record_audit, refresh_session_identity};

pub const KYC_SUBMITTED: &str = "kyc_submitted";

#[derive(Debug, Serialize)]
pub struct KycSubmitted {
    pub document_id: i64,
    pub kyc_status: KycStatus,
}

/// POST /api/profile/kyc - submit an identity document for review
///
/// Multipart fields: `document_type`, `document_number`, `front_image`, and
/// an optional `back_image`. Both files are validated before either is
/// written; the document row is inserted only after both writes succeeded.
pub async fn upload(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<KycSubmitted> {
    let mut form = guarded_form(&ctx, &headers, body).await?;

    let document_type = form
        .fields
        .non_empty("document_type")
        .ok_or_else(|| ApiError::validation("Document type is required"))?
        .parse::<DocumentType>()
        .map_err(|_| ApiError::validation("Invalid document type"))?;

    let document_number = sanitize_optional(
        form.fields.text("document_number").as_deref(),
        MAX_DOCUMENT_NUMBER_CHARS,
    );

    let front = form
        .take_file("front_image")
        .ok_or_else(|| UploadError::Missing("Front image is required".to_string()))?;
    let back = form.take_file("back_image");

    let front_ext = state.kyc_policy.validate(&front)?.extension_for(front.file_name.as_deref());
    let back_ext = match &back {
        Some(file) => Some(state.kyc_policy.validate(file)?.extension_for(file.file_name.as_deref())),
        None => None,
    };

    let user_id = ctx.user_id();
    let front_ref = kyc_reference(user_id, document_type, DocumentSide::Front, &front_ext);
    let back_part: Option<(String, &UploadedFile)> = back
        .as_ref()
        .zip(back_ext)
        .map(|(file, ext)| (kyc_reference(user_id, document_type, DocumentSide::Back, &ext), file));

    let mut saga = FileSaga::new(state.uploads.clone());
    saga.write(front_ref.clone(), &front.bytes).await?;
    if let Some((reference, file)) = &back_part {
        // A failed back write also removes the front file
        saga.write(reference.clone(), &file.bytes).await?;
    }

    let document = NewKycDocument {
        user_id,
        document_type,
        document_number,
        front_image: front_ref,
        back_image: back_part.as_ref().map(|(reference, _)| reference.clone()),
    };

    let document_id = saga
        .finish(state.kyc.insert(&document))
        .await
        .map_err(|e| ApiError::storage(e, "Failed to save document"))?;

    // The document is recorded; a failed status advance is logged and the
    // caller keeps their previous status until the next submission.
    let (kyc_status, advanced) = match state.users.advance_kyc_status(user_id).await {
        Ok(advance) => (advance.status, advance.advanced),
        Err(e) => {
            tracing::error!(user_id = %user_id, document_id, "Failed to advance KYC status: {}", e);
            (ctx.user.kyc_status, false)
        }
    };

    refresh_session_identity(&state, &ctx, &ctx.user.full_name, &ctx.user.email, kyc_status).await;

    record_audit(
        &state,
        &ctx,
        AuditEntry::new(user_id, AuditAction::KycUpload, "kyc_documents")
            .record(document_id)
            .metadata(json!({
                "document_type": document_type.as_str(),
                "front_sha256": sha256_hex(&front.bytes),
                "back_sha256": back.as_ref().map(|file| sha256_hex(&file.bytes)),
            })),
    )
    .await;

    let notified = notify_admins(
        &state,
        KYC_SUBMITTED,
        "New KYC submission",
        &format!(
            "{} submitted a {} for verification",
            ctx.user.full_name,
            document_type.label()
        ),
    )
    .await;

    tracing::info!(
        user_id = %user_id,
        document_id,
        document_type = document_type.as_str(),
        advanced,
        notified,
        "KYC document submitted"
    );

    Ok(ApiResponse::success(KycSubmitted {
        document_id,
        kyc_status,
    })
    .with_message("Document uploaded successfully. Verification is pending review."))
}
