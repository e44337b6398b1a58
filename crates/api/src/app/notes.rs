//! `notes` resource: the demo business stack hosted behind the auth core.
//!
//! A note references its author through `owner_id`; update/delete are
//! owner-only (admins bypass), everything else is open to anyone granted the
//! permission.

use std::collections::HashMap;
use std::sync::RwLock;

use serde::Serialize;

use gatehouse_auth::{ObjectChecker, Owned, Permission, Policy, Role};
use gatehouse_core::{DomainError, DomainResult, ResourceId, UserId};

pub const NOTE_CREATE: Permission = Permission::from_static("note_create");
pub const NOTE_LIST: Permission = Permission::from_static("note_list");
pub const NOTE_DETAIL: Permission = Permission::from_static("note_detail");
pub const NOTE_UPDATE: Permission = Permission::from_static("note_update");
pub const NOTE_DELETE: Permission = Permission::from_static("note_delete");

pub const TITLE_MAX: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub id: ResourceId,
    pub owner_id: Option<UserId>,
    pub title: String,
    pub body: String,
}

impl Owned for Note {
    fn owner_id(&self) -> Option<UserId> {
        self.owner_id
    }
}

/// Field-level checks for note input.
pub fn validate(title: &str, body: &str) -> DomainResult<()> {
    let mut violations = Vec::new();
    if title.trim().is_empty() {
        violations.push(("title", "must not be empty".to_string()));
    } else if title.chars().count() > TITLE_MAX {
        violations.push(("title", format!("must be at most {TITLE_MAX} characters")));
    }
    if body.len() > 64 * 1024 {
        violations.push(("body", "must be at most 64 KiB".to_string()));
    }

    let mut violations = violations.into_iter();
    match violations.next() {
        None => Ok(()),
        Some((field, description)) => Err(violations.fold(
            DomainError::validation(field, description),
            |err, (field, description)| err.with_violation(field, description),
        )),
    }
}

/// In-memory note storage for tests/dev.
#[derive(Debug, Default)]
pub struct NoteStore {
    inner: RwLock<HashMap<ResourceId, Note>>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ResourceId) -> DomainResult<Note> {
        let map = self
            .inner
            .read()
            .map_err(|_| DomainError::unexpected("note store poisoned"))?;
        map.get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("note", id.to_string()))
    }

    pub fn list(&self) -> DomainResult<Vec<Note>> {
        let map = self
            .inner
            .read()
            .map_err(|_| DomainError::unexpected("note store poisoned"))?;
        let mut notes: Vec<Note> = map.values().cloned().collect();
        // UUIDv7 ids sort by creation time.
        notes.sort_by_key(|n| *n.id.as_uuid());
        Ok(notes)
    }

    pub fn upsert(&self, note: Note) -> DomainResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::unexpected("note store poisoned"))?;
        map.insert(note.id, note);
        Ok(())
    }

    /// Apply `change` to a stored note under the write lock.
    ///
    /// Fails with `ResourceNotFound` if the note is gone; a failing `change`
    /// leaves the stored note untouched.
    pub fn update<F>(&self, id: ResourceId, change: F) -> DomainResult<Note>
    where
        F: FnOnce(&mut Note) -> DomainResult<()>,
    {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::unexpected("note store poisoned"))?;
        let stored = map
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("note", id.to_string()))?;

        let mut next = stored.clone();
        change(&mut next)?;
        *stored = next.clone();
        Ok(next)
    }

    pub fn remove(&self, id: ResourceId) -> DomainResult<Note> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::unexpected("note store poisoned"))?;
        map.remove(&id)
            .ok_or_else(|| DomainError::not_found("note", id.to_string()))
    }
}

/// Built-in policy for the roles `guest`, `user` and `admin`.
pub fn default_policy() -> Policy {
    let admin = Role::new("admin");
    let all = [NOTE_CREATE, NOTE_LIST, NOTE_DETAIL, NOTE_UPDATE, NOTE_DELETE];

    Policy::new()
        .grant(Role::GUEST, [NOTE_LIST, NOTE_DETAIL])
        .grant(Role::new("user"), all.clone())
        .grant(admin.clone(), all)
        .check(NOTE_CREATE, [ObjectChecker::AlwaysAllow])
        .check(NOTE_LIST, [ObjectChecker::AlwaysAllow])
        .check(NOTE_DETAIL, [ObjectChecker::AlwaysAllow])
        .check(NOTE_UPDATE, [ObjectChecker::OwnerOnly, ObjectChecker::role_is(admin.clone())])
        .check(NOTE_DELETE, [ObjectChecker::OwnerOnly, ObjectChecker::role_is(admin)])
}
