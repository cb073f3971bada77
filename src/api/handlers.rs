use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use uuid::Uuid;

use super::page::PageView;
use super::session::{session_cookie, session_id};
use super::types::{ErrorResponse, GenerateForm, GenerateRequest};
use super::ServerState;
use crate::{chain::Transcripts, error::LLMError};

/// Status code a failed run is reported with.
fn status_for(err: &LLMError) -> StatusCode {
    match err {
        LLMError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// Hands a freshly created session id back to the client.
fn with_cookie(mut response: Response, id: Uuid, created: bool) -> Response {
    if created {
        response
            .headers_mut()
            .insert(header::SET_COOKIE, session_cookie(id));
    }
    response
}

fn internal_error(context: &str, err: LLMError) -> Response {
    log::error!("{context}: {err}");
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
}

fn json_error(err: &LLMError) -> Response {
    (
        status_for(err),
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

/// Renders the page with the given status.
fn page(state: &ServerState, status: StatusCode, view: &PageView<'_>) -> Response {
    match state.pages.render(view) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => internal_error("Could not render page", e),
    }
}

/// Transcripts of the requesting session; empty when there is none yet.
async fn current_transcripts(state: &ServerState, headers: &HeaderMap) -> Transcripts {
    match state.sessions.lookup(session_id(headers)).await {
        Some(session) => session.lock().await.transcripts(),
        None => Transcripts::default(),
    }
}

/// Serves the page: the input form plus the session's history panels.
pub async fn handle_index(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    let transcripts = current_transcripts(&state, &headers).await;
    page(
        &state,
        StatusCode::OK,
        &PageView {
            transcripts: Some(&transcripts),
            ..Default::default()
        },
    )
}

/// Handles a submitted topic.
///
/// An empty topic just renders the form again, without calling the model.
/// Any other topic, whitespace included, is run as typed. A failing stage
/// aborts the run and the page shows the error instead of results.
pub async fn handle_submit(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Form(form): Form<GenerateForm>,
) -> Response {
    let topic = form.topic.as_str();
    if topic.is_empty() {
        let transcripts = current_transcripts(&state, &headers).await;
        return page(
            &state,
            StatusCode::OK,
            &PageView {
                transcripts: Some(&transcripts),
                ..Default::default()
            },
        );
    }

    let (id, session, created) = match state.sessions.resolve(session_id(&headers)).await {
        Ok(resolved) => resolved,
        Err(e) => return internal_error("Could not set up session", e),
    };
    let mut chain = session.lock().await;

    let response = match chain.generate(topic).await {
        Ok(result) => {
            let transcripts = chain.transcripts();
            page(
                &state,
                StatusCode::OK,
                &PageView {
                    topic: Some(topic),
                    result: Some(&result),
                    error: None,
                    transcripts: Some(&transcripts),
                },
            )
        }
        Err(e) => {
            log::warn!("Generation for '{topic}' failed: {e}");
            page(
                &state,
                status_for(&e),
                &PageView {
                    topic: Some(topic),
                    error: Some(e.to_string()),
                    ..Default::default()
                },
            )
        }
    };

    with_cookie(response, id, created)
}

/// JSON variant of the page: runs the pipeline and returns the result.
pub async fn handle_generate(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(req): Json<GenerateRequest>,
) -> Response {
    if req.topic.is_empty() {
        return json_error(&LLMError::InvalidRequest(
            "Topic must not be empty".to_string(),
        ));
    }

    let (id, session, created) = match state.sessions.resolve(session_id(&headers)).await {
        Ok(resolved) => resolved,
        Err(e) => return internal_error("Could not set up session", e),
    };

    let result = session.lock().await.generate(&req.topic).await;
    let response = match result {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            log::warn!("Generation for '{}' failed: {e}", req.topic);
            json_error(&e)
        }
    };

    with_cookie(response, id, created)
}

/// Returns the session's three transcripts, empty for an unknown session.
pub async fn handle_history(State(state): State<ServerState>, headers: HeaderMap) -> Response {
    Json(current_transcripts(&state, &headers).await).into_response()
}
