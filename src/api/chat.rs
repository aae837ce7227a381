use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};

use crate::{
    api::error::{ApiError, ApiResult},
    config::UploadConfig,
    orchestrator::{AdvisoryRequest, ImageUpload},
    state::AppState,
    transcription::AudioClip,
    types::AdvisoryResponse,
};

const DEFAULT_AUDIO_CONTENT_TYPE: &str = "application/octet-stream";

enum UploadKind {
    Audio,
    Image,
}

impl UploadKind {
    fn label(&self) -> &'static str {
        match self {
            UploadKind::Audio => "audio",
            UploadKind::Image => "image",
        }
    }

    fn too_large(&self) -> &'static str {
        match self {
            UploadKind::Audio => "Audio file too large.",
            UploadKind::Image => "Image file too large.",
        }
    }

    fn allowed<'a>(&self, uploads: &'a UploadConfig) -> &'a [String] {
        match self {
            UploadKind::Audio => &uploads.allowed_audio_types,
            UploadKind::Image => &uploads.allowed_image_types,
        }
    }

    fn max_bytes(&self, uploads: &UploadConfig) -> usize {
        match self {
            UploadKind::Audio => uploads.max_audio_bytes,
            UploadKind::Image => uploads.max_image_bytes,
        }
    }
}

struct Upload {
    bytes: Vec<u8>,
    filename: String,
    content_type: Option<String>,
}

async fn read_upload(
    field: axum::extract::multipart::Field<'_>,
    kind: UploadKind,
    uploads: &UploadConfig,
) -> ApiResult<Upload> {
    let content_type = field.content_type().map(str::to_string);
    if let Some(content_type) = &content_type
        && !kind.allowed(uploads).iter().any(|allowed| allowed == content_type)
    {
        return Err(ApiError::UnsupportedMediaType(format!(
            "Unsupported {} content type.",
            kind.label()
        )));
    }

    let filename = field
        .file_name()
        .filter(|name| !name.is_empty())
        .unwrap_or(kind.label())
        .to_string();
    let bytes = field.bytes().await?;
    if bytes.len() > kind.max_bytes(uploads) {
        return Err(ApiError::PayloadTooLarge(kind.too_large().to_string()));
    }

    Ok(Upload {
        bytes: bytes.to_vec(),
        filename,
        content_type,
    })
}

/// Multipart advisory request with any of `text`, `audio` and `image`.
pub async fn chat(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<AdvisoryResponse>> {
    let mut multipart = multipart?;
    let uploads = &state.config.uploads;
    let mut request = AdvisoryRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("text") => request.text = Some(field.text().await?),
            Some("audio") => {
                let upload = read_upload(field, UploadKind::Audio, uploads).await?;
                request.audio = Some(AudioClip {
                    bytes: upload.bytes,
                    filename: upload.filename,
                    content_type: upload
                        .content_type
                        .unwrap_or_else(|| DEFAULT_AUDIO_CONTENT_TYPE.to_string()),
                });
            }
            Some("image") => {
                let upload = read_upload(field, UploadKind::Image, uploads).await?;
                request.image = Some(ImageUpload {
                    bytes: upload.bytes,
                    filename: upload.filename,
                });
            }
            _ => {}
        }
    }

    if request.text.is_none() && request.audio.is_none() && request.image.is_none() {
        return Err(ApiError::Validation(
            "At least one of text, audio, or image must be provided.".to_string(),
        ));
    }

    tracing::info!(
        target: "http",
        has_text = request.text.as_deref().is_some_and(|text| !text.is_empty()),
        has_audio = request.audio.is_some(),
        has_image = request.image.is_some(),
        "chat_request_received"
    );

    Ok(Json(state.orchestrator.handle(request).await))
}
