use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Json, Response},
};

use crate::{
    dto::candidate_dto::{
        CandidateCreatedResponse, CandidatePayload, CandidateResponse, DeleteCandidateResponse,
        ImageOutcome,
    },
    error::{Error, Result},
    models::candidate::NewCandidate,
    services::image_service::ImageUpload,
    AppState,
};

/// Body of `POST /api/v1/candidates`: plain JSON, or a multipart form with a
/// `candidate` JSON part and an optional `image` file part.
pub enum CandidateSubmission {
    Json(CandidatePayload),
    Multipart(Multipart),
}

#[axum::async_trait]
impl<S> FromRequest<S> for CandidateSubmission
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| Error::BadRequest(e.body_text()))?;
            Ok(Self::Multipart(multipart))
        } else {
            let Json(payload) = Json::<CandidatePayload>::from_request(req, state)
                .await
                .map_err(|e| Error::BadRequest(e.body_text()))?;
            Ok(Self::Json(payload))
        }
    }
}

async fn read_candidate_form(
    mut multipart: Multipart,
) -> Result<(CandidatePayload, Option<ImageUpload>)> {
    let mut payload = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to get next field: {}", e);
        Error::BadRequest(e.to_string())
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        match field_name.as_str() {
            "candidate" => {
                let text = field.text().await?;
                payload = Some(serde_json::from_str::<CandidatePayload>(&text)?);
            }
            "image" => {
                let file_name = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(|e| {
                    tracing::error!("Failed to read image bytes: {}", e);
                    Error::BadRequest("Failed to read file upload".into())
                })?;
                image = Some(ImageUpload { file_name, data });
            }
            _ => {}
        }
    }

    let payload =
        payload.ok_or_else(|| Error::BadRequest("Multipart part 'candidate' is required".into()))?;
    Ok((payload, image))
}

fn log_incoming(payload: &CandidatePayload) {
    tracing::info!(
        voter_id = ?payload.voter.map(|v| v.id),
        election_id = ?payload.election.map(|e| e.id),
        post = ?payload.post,
        "Incoming candidate request"
    );
}

async fn create_from_json(state: &AppState, payload: CandidatePayload) -> Result<Response> {
    log_incoming(&payload);
    let candidate = state.store.add(payload.into()).await?;
    tracing::info!(candidate_id = candidate.candidate_id, "Saved candidate");

    Ok((StatusCode::CREATED, Json(CandidateResponse::from(candidate))).into_response())
}

async fn create_with_image(state: &AppState, multipart: Multipart) -> Result<Response> {
    let (payload, image) = read_candidate_form(multipart).await?;
    log_incoming(&payload);

    let image_upload = state.images.store(image).await;
    let mut new_candidate = NewCandidate::from(payload);
    if let ImageOutcome::Stored { url } = &image_upload {
        new_candidate.image_url = Some(url.clone());
    }

    let candidate = match state.store.add(new_candidate).await {
        Ok(candidate) => candidate,
        Err(e) => {
            if let ImageOutcome::Stored { url } = &image_upload {
                if let Err(remove_err) = state.images.remove(url).await {
                    tracing::warn!(
                        error = %remove_err,
                        url = %url,
                        "Failed to remove orphaned candidate image"
                    );
                }
            }
            return Err(e);
        }
    };
    tracing::info!(
        candidate_id = candidate.candidate_id,
        image = ?image_upload,
        "Saved candidate"
    );

    Ok((
        StatusCode::CREATED,
        Json(CandidateCreatedResponse {
            candidate: candidate.into(),
            image_upload,
        }),
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/v1/candidates",
    responses(
        (status = 200, description = "All candidates", body = [CandidateResponse])
    )
)]
#[axum::debug_handler]
pub async fn list_candidates(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let candidates = state.store.list().await?;
    Ok(Json(
        candidates
            .into_iter()
            .map(CandidateResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/candidates/{id}",
    params(
        ("id" = i64, Path, description = "Candidate ID")
    ),
    responses(
        (status = 200, description = "The candidate, or null when no candidate has this id", body = CandidateResponse)
    )
)]
#[axum::debug_handler]
pub async fn get_candidate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let candidate = state.store.get_by_id(id).await?;
    Ok(Json(candidate.map(CandidateResponse::from)))
}

#[utoipa::path(
    get,
    path = "/api/v1/candidates/election/{election_id}",
    params(
        ("election_id" = i64, Path, description = "Election ID")
    ),
    responses(
        (status = 200, description = "Candidates standing in the election", body = [CandidateResponse])
    )
)]
#[axum::debug_handler]
pub async fn list_candidates_by_election(
    State(state): State<AppState>,
    Path(election_id): Path<i64>,
) -> Result<impl IntoResponse> {
    let candidates = state.store.list_by_election(election_id).await?;
    Ok(Json(
        candidates
            .into_iter()
            .map(CandidateResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/candidates",
    request_body = CandidatePayload,
    responses(
        (status = 201, description = "Candidate created", body = CandidateResponse),
        (status = 400, description = "Malformed body or missing candidate part"),
        (status = 500, description = "Rejected by the persistence layer")
    )
)]
#[axum::debug_handler]
pub async fn create_candidate(
    State(state): State<AppState>,
    submission: CandidateSubmission,
) -> Result<Response> {
    match submission {
        CandidateSubmission::Json(payload) => create_from_json(&state, payload).await,
        CandidateSubmission::Multipart(multipart) => create_with_image(&state, multipart).await,
    }
}

#[utoipa::path(
    put,
    path = "/api/v1/candidates/{id}",
    params(
        ("id" = i64, Path, description = "Candidate ID")
    ),
    request_body = CandidatePayload,
    responses(
        (status = 200, description = "Candidate replaced", body = CandidateResponse),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn update_candidate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CandidatePayload>,
) -> Result<impl IntoResponse> {
    let candidate = state.store.update(id, payload.into()).await?;
    Ok(Json(CandidateResponse::from(candidate)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/candidates/{id}",
    params(
        ("id" = i64, Path, description = "Candidate ID")
    ),
    responses(
        (status = 200, description = "Candidate deleted", body = DeleteCandidateResponse),
        (status = 404, description = "Candidate not found")
    )
)]
#[axum::debug_handler]
pub async fn delete_candidate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    state.store.delete(id).await?;
    tracing::info!(candidate_id = id, "Deleted candidate");
    Ok(Json(DeleteCandidateResponse::for_id(id)))
}
