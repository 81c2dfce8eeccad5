use crate::detection::Detector;
use crate::error::AnalyzeError;
use crate::pipeline::{run_pipeline, PipelineSettings};
use crate::report::{render_report_page, render_upload_page};
use crate::source::{open_video, FrameSource};
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use futures_util::TryStreamExt;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Form field carrying the uploaded video
const VIDEO_FIELD: &str = "video";

type OpenFn = dyn Fn(&Path) -> anyhow::Result<Box<dyn FrameSource>> + Send + Sync;

/// Shared state for all requests
///
/// The detector is behind a mutex, so uploads are analyzed one at a time.
pub struct AppState {
    detector: Mutex<Box<dyn Detector>>,
    settings: PipelineSettings,
    open: Box<OpenFn>,
}

impl AppState {
    pub fn new(detector: Box<dyn Detector>, settings: PipelineSettings) -> Self {
        Self::with_opener(detector, settings, |path| open_video(path))
    }

    /// Use a custom function to turn a spooled upload into frames
    pub fn with_opener<F>(detector: Box<dyn Detector>, settings: PipelineSettings, open: F) -> Self
    where
        F: Fn(&Path) -> anyhow::Result<Box<dyn FrameSource>> + Send + Sync + 'static,
    {
        Self {
            detector: Mutex::new(detector),
            settings,
            open: Box::new(open),
        }
    }
}

/// Register the upload page and analysis endpoint
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/analyze", web::post().to(analyze));
}

async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_upload_page())
}

async fn analyze(
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse, AnalyzeError> {
    let (file_name, spooled) = receive_video(payload).await?;
    tracing::info!("Received upload {}", file_name);

    let state = state.into_inner();
    let page = web::block(move || -> Result<String, AnalyzeError> {
        let mut detector = state.detector.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Detector panicked during an earlier upload, reusing it");
            poisoned.into_inner()
        });

        let mut source = (state.open)(spooled.path()).map_err(AnalyzeError::Analysis)?;
        let report = run_pipeline(&mut source, &mut *detector, state.settings)
            .map_err(AnalyzeError::Analysis)?;

        render_report_page(&report, &file_name)
            .map_err(|err| AnalyzeError::Internal(format!("{err:#}")))
    })
    .await
    .map_err(|err| AnalyzeError::Internal(err.to_string()))??;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page))
}

/// Stream the `video` field to a temporary file
///
/// Other fields are skipped. The file is removed when the returned handle
/// is dropped.
async fn receive_video(mut payload: Multipart) -> Result<(String, NamedTempFile), AnalyzeError> {
    let upload_err = |err: actix_multipart::MultipartError| AnalyzeError::Upload(err.to_string());
    let mut upload: Option<(String, NamedTempFile)> = None;

    while let Some(mut field) = payload.try_next().await.map_err(upload_err)? {
        let disposition = field.content_disposition();
        let is_video = disposition.and_then(|cd| cd.get_name()) == Some(VIDEO_FIELD);
        let file_name = disposition
            .and_then(|cd| cd.get_filename())
            .map(str::to_owned);

        let file_name = match (is_video, file_name) {
            (true, Some(name)) if upload.is_none() && !name.is_empty() => name,
            _ => {
                while field.try_next().await.map_err(upload_err)?.is_some() {}
                continue;
            }
        };

        if !is_mp4(&file_name) {
            return Err(AnalyzeError::UnsupportedFormat(file_name));
        }

        let mut spooled = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(".mp4")
            .tempfile()
            .map_err(|err| AnalyzeError::Internal(format!("failed to create temp file: {err}")))?;

        let mut received = 0usize;
        while let Some(chunk) = field.try_next().await.map_err(upload_err)? {
            received += chunk.len();
            spooled
                .write_all(&chunk)
                .map_err(|err| AnalyzeError::Internal(format!("failed to spool upload: {err}")))?;
        }
        spooled
            .flush()
            .map_err(|err| AnalyzeError::Internal(format!("failed to spool upload: {err}")))?;

        tracing::debug!("Spooled {} bytes to {}", received, spooled.path().display());
        upload = Some((file_name, spooled));
    }

    upload.ok_or(AnalyzeError::MissingVideo)
}

fn is_mp4(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp4"))
}
