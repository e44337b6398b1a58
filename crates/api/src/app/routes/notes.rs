use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    routing::get,
    Json, Router,
};

use gatehouse_core::{DomainError, ResourceId};

use crate::app::dto::{CreateNoteRequest, NoteResponse, UpdateNoteRequest};
use crate::app::errors::TransportStatus;
use crate::app::notes::{self, Note, NOTE_CREATE, NOTE_DELETE, NOTE_DETAIL, NOTE_LIST, NOTE_UPDATE};
use crate::app::services::AppServices;
use crate::authz;
use crate::context::Caller;
use crate::extract::{ApiJson, ApiPath};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_notes).post(create_note))
        .route("/:id", get(get_note).put(update_note).delete(delete_note))
}

pub async fn create_note(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(identity): Caller,
    ApiJson(body): ApiJson<CreateNoteRequest>,
) -> Result<(StatusCode, Json<NoteResponse>), TransportStatus> {
    authz::authorize(&services.authorizer, &identity, &NOTE_CREATE)?;
    notes::validate(&body.title, &body.body)?;

    let note = Note {
        id: ResourceId::new(),
        owner_id: identity.id,
        title: body.title,
        body: body.body,
    };
    services.notes.upsert(note.clone())?;
    tracing::info!(note_id = %note.id, "note created");

    Ok((StatusCode::CREATED, Json(note.into())))
}

pub async fn list_notes(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(identity): Caller,
) -> Result<Json<Vec<NoteResponse>>, TransportStatus> {
    authz::authorize(&services.authorizer, &identity, &NOTE_LIST)?;
    let notes = services.notes.list()?;
    Ok(Json(notes.into_iter().map(NoteResponse::from).collect()))
}

pub async fn get_note(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(identity): Caller,
    ApiPath(id): ApiPath<String>,
) -> Result<Json<NoteResponse>, TransportStatus> {
    let note = authz::authorize_on(&services.authorizer, &identity, &NOTE_DETAIL, || {
        services.notes.get(parse_id(&id)?)
    })?;
    Ok(Json(note.into()))
}

pub async fn update_note(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(identity): Caller,
    ApiPath(id): ApiPath<String>,
    ApiJson(body): ApiJson<UpdateNoteRequest>,
) -> Result<Json<NoteResponse>, TransportStatus> {
    let note = authz::authorize_on(&services.authorizer, &identity, &NOTE_UPDATE, || {
        services.notes.get(parse_id(&id)?)
    })?;

    let note = services.notes.update(note.id, |note| {
        if let Some(title) = body.title {
            note.title = title;
        }
        if let Some(body) = body.body {
            note.body = body;
        }
        notes::validate(&note.title, &note.body)
    })?;

    Ok(Json(note.into()))
}

pub async fn delete_note(
    Extension(services): Extension<Arc<AppServices>>,
    Caller(identity): Caller,
    ApiPath(id): ApiPath<String>,
) -> Result<StatusCode, TransportStatus> {
    let note = authz::authorize_on(&services.authorizer, &identity, &NOTE_DELETE, || {
        services.notes.get(parse_id(&id)?)
    })?;
    services.notes.remove(note.id)?;
    tracing::info!(note_id = %note.id, "note deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Unparseable ids are reported like unknown ones.
fn parse_id(raw: &str) -> Result<ResourceId, DomainError> {
    raw.parse::<ResourceId>()
        .map_err(|_| DomainError::not_found("note", raw))
}
