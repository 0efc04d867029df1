//! The two catalog aggregates behind one trait, so CRUD plumbing, caching and
//! page controllers are written once.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{Actor, CreateActor, CreateFilm, Film, UpdateActor, UpdateFilm};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Films,
    Actors,
}

impl EntityKind {
    /// REST collection path, without base URL.
    pub fn collection_path(self) -> &'static str {
        match self {
            EntityKind::Films => "/api/films",
            EntityKind::Actors => "/api/actors",
        }
    }

    /// Field holding the array in an enveloped list response.
    pub fn list_field(self) -> &'static str {
        match self {
            EntityKind::Films => "films",
            EntityKind::Actors => "actors",
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            EntityKind::Films => "Film",
            EntityKind::Actors => "Actor",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.list_field())
    }
}

/// A catalog entity addressable through `/api/<kind>` and `/api/<kind>/{id}`.
pub trait Resource: Clone + fmt::Debug + Serialize + DeserializeOwned + 'static {
    type Create: Serialize + fmt::Debug;
    type Update: Serialize + fmt::Debug;

    const KIND: EntityKind;

    fn id(&self) -> &str;

    /// Human-readable name used in dialogs and toasts.
    fn label(&self) -> String;
}

impl Resource for Film {
    type Create = CreateFilm;
    type Update = UpdateFilm;

    const KIND: EntityKind = EntityKind::Films;

    fn id(&self) -> &str {
        &self.film_id
    }

    fn label(&self) -> String {
        self.title.clone()
    }
}

impl Resource for Actor {
    type Create = CreateActor;
    type Update = UpdateActor;

    const KIND: EntityKind = EntityKind::Actors;

    fn id(&self) -> &str {
        &self.actor_id
    }

    fn label(&self) -> String {
        self.full_name()
    }
}
