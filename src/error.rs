use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::report::render_error_page;

/// Failures surfaced to the uploader
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("no video file was uploaded")]
    MissingVideo,

    #[error("unsupported file '{0}': only .mp4 videos are accepted")]
    UnsupportedFormat(String),

    #[error("failed to receive upload: {0}")]
    Upload(String),

    #[error("{0:#}")]
    Analysis(anyhow::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ResponseError for AnalyzeError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingVideo | Self::UnsupportedFormat(_) | Self::Upload(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Analysis(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type("text/html; charset=utf-8")
            .body(render_error_page(&self.to_string()))
    }
}
