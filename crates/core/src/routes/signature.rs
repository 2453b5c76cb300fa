use super::{HandlerError, error_response, upstream_error};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{TimeDelta, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::warn;

/// How long an upload signature stays valid.
const SIGNATURE_LIFETIME_HOURS: i64 = 2;

#[derive(Debug, Serialize)]
pub struct UploadSignature {
    signature: String,
    /// Unix timestamp (seconds) after which the signature is rejected.
    expiration: i64,
}

/// SHA-256 hex digest authorising a resumable upload to a single video.
pub fn sign_upload(
    library_id: &str,
    library_key: &str,
    expiration: i64,
    video_id: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(library_id.as_bytes());
    hasher.update(library_key.as_bytes());
    hasher.update(expiration.to_string().as_bytes());
    hasher.update(video_id.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Create a signature clients can use to upload a video directly to the vendor.
pub async fn upload_signature_handler(
    State(state): State<Arc<AppState>>,
    Path((library_id, video_id)): Path<(String, String)>,
) -> Result<Json<UploadSignature>, HandlerError> {
    let Some(library_key) = state
        .forwarder
        .library_key(&library_id)
        .await
        .map_err(upstream_error)?
    else {
        warn!("Refusing to sign upload for library {library_id}: no access key available");
        return Err(error_response(
            StatusCode::BAD_GATEWAY,
            "Unable to obtain the access key for this library.",
        ));
    };

    let expiration = (Utc::now() + TimeDelta::hours(SIGNATURE_LIFETIME_HOURS)).timestamp();
    Ok(Json(UploadSignature {
        signature: sign_upload(&library_id, &library_key, expiration, &video_id),
        expiration,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_sha256_of_concatenated_fields() {
        let expected = format!("{:x}", Sha256::digest(b"42secret1700000000video-guid"));
        assert_eq!(sign_upload("42", "secret", 1700000000, "video-guid"), expected);
    }

    #[test]
    fn signature_depends_on_expiration() {
        assert_ne!(
            sign_upload("42", "secret", 1700000000, "video-guid"),
            sign_upload("42", "secret", 1700000001, "video-guid")
        );
        assert_eq!(sign_upload("1", "k", 0, "v").len(), 64);
    }
}
