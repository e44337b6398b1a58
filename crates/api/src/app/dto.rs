use serde::{Deserialize, Serialize};

use gatehouse_auth::{Identity, TokenPair};

use crate::app::notes::Note;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login_id: String,
    pub secret: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

impl From<TokenPair> for TokenPairResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub anonymous: bool,
    pub user_id: Option<String>,
    pub login_id: String,
    pub display_name: String,
    pub role: String,
}

impl From<&Identity> for WhoAmIResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            anonymous: identity.is_anonymous(),
            user_id: identity.id.map(|id| id.to_string()),
            login_id: identity.login_id.clone(),
            display_name: identity.display_name.clone(),
            role: identity.role.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NoteResponse {
    pub id: String,
    pub owner_id: Option<String>,
    pub title: String,
    pub body: String,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id.to_string(),
            owner_id: note.owner_id.map(|id| id.to_string()),
            title: note.title,
            body: note.body,
        }
    }
}
