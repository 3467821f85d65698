use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crates::domain::value_objects::languages::{is_supported_language, supported_language_codes};

use crate::{
    auth::AuthUser,
    axum_http::error_responses::AppError,
    usecases::video_tasks::{
        SubmitVideoModel, SubmittedFile, TaskListQueryModel, VideoTasksUseCase,
    },
};

const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_VOICE: &str = "Achernar";

/// Prebuilt narration voices accepted by the speech synthesizer.
const SUPPORTED_VOICES: &[&str] = &[
    "Zephyr",
    "Puck",
    "Charon",
    "Kore",
    "Fenrir",
    "Leda",
    "Orus",
    "Aoede",
    "Callirrhoe",
    "Autonoe",
    "Enceladus",
    "Iapetus",
    "Umbriel",
    "Algieba",
    "Despina",
    "Erinome",
    "Algenib",
    "Rasalgethi",
    "Laomedeia",
    "Achernar",
    "Alnilam",
    "Schedar",
    "Gacrux",
    "Pulcherrima",
    "Achird",
    "Zubenelgenubi",
    "Vindemiatrix",
    "Sadachbia",
    "Sadaltager",
    "Sulafat",
];

#[derive(Debug, Serialize)]
struct SubmitResponse {
    task_id: Uuid,
}

pub fn routes(usecase: Arc<VideoTasksUseCase>) -> Router {
    Router::new()
        .route("/generate", post(generate_video))
        .route("/tasks", get(list_tasks))
        .with_state(usecase)
}

pub async fn generate_video(
    State(usecase): State<Arc<VideoTasksUseCase>>,
    AuthUser { user_id, .. }: AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let request = parse_generate_request(multipart).await?;

    info!(
        %user_id,
        language = %request.language,
        voice = %request.voice_name,
        "videos: generate request received"
    );

    if !is_supported_language(&request.language) {
        return Err(AppError::BadRequest(format!(
            "Unsupported language: {}. Supported languages: {}",
            request.language,
            supported_language_codes().join(", ")
        )));
    }
    if !SUPPORTED_VOICES.contains(&request.voice_name.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Unsupported voice: {}",
            request.voice_name
        )));
    }
    if request.text.is_none() && request.file.is_none() && request.url.is_none() {
        return Err(AppError::BadRequest(
            "At least one of text, file, or url must be provided".to_string(),
        ));
    }

    let task_id = usecase.submit(request, user_id).await?;
    Ok(Json(SubmitResponse { task_id }))
}

pub async fn list_tasks(
    State(usecase): State<Arc<VideoTasksUseCase>>,
    AuthUser { user_id, .. }: AuthUser,
    Query(query): Query<TaskListQueryModel>,
) -> Result<impl IntoResponse, AppError> {
    info!(%user_id, "videos: task list request received");
    let tasks = usecase.list_tasks(user_id, query).await?;
    Ok(Json(tasks))
}

async fn parse_generate_request(mut multipart: Multipart) -> Result<SubmitVideoModel, AppError> {
    let mut request = SubmitVideoModel {
        language: DEFAULT_LANGUAGE.to_string(),
        voice_name: DEFAULT_VOICE.to_string(),
        ..Default::default()
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(format!("invalid multipart body: {err}")))?
    {
        let Some(name) = field.name().map(|name| name.to_string()) else {
            continue;
        };

        match name.as_str() {
            "text" => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| AppError::BadRequest(format!("invalid text field: {err}")))?;
                if !value.trim().is_empty() {
                    request.text = Some(value);
                }
            }
            "url" => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| AppError::BadRequest(format!("invalid url field: {err}")))?;
                if !value.trim().is_empty() {
                    request.url = Some(value);
                }
            }
            "language" => {
                request.language = field
                    .text()
                    .await
                    .map_err(|err| AppError::BadRequest(format!("invalid language field: {err}")))?;
            }
            "voice_type" => {
                request.voice_name = field
                    .text()
                    .await
                    .map_err(|err| AppError::BadRequest(format!("invalid voice field: {err}")))?;
            }
            "file" => {
                let filename = field
                    .file_name()
                    .map(|filename| filename.to_string())
                    .ok_or_else(|| {
                        AppError::BadRequest("file field is missing a filename".to_string())
                    })?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::BadRequest(format!("invalid file field: {err}")))?;
                request.file = Some(SubmittedFile {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok(request)
}
