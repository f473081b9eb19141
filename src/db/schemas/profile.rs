//! Profile document schema

use bson::{doc, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for profiles
pub const PROFILE_COLLECTION: &str = "profiles";

/// Profile fields the user can edit, keyed by the auth service's user id
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ProfileDoc {
    #[serde(default, skip_serializing)]
    pub metadata: Metadata,

    pub user_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

/// Partial profile edit; absent fields stay unchanged
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.full_name.is_none()
    }

    /// `$set` body holding only the provided fields
    pub fn to_set_document(&self) -> Document {
        let mut set = Document::new();
        if let Some(username) = &self.username {
            set.insert("username", username);
        }
        if let Some(email) = &self.email {
            set.insert("email", email);
        }
        if let Some(full_name) = &self.full_name {
            set.insert("full_name", full_name);
        }
        set
    }

    /// Apply onto an existing profile
    pub fn apply(&self, profile: &mut ProfileDoc) {
        if let Some(username) = &self.username {
            profile.username = Some(username.clone());
        }
        if let Some(email) = &self.email {
            profile.email = Some(email.clone());
        }
        if let Some(full_name) = &self.full_name {
            profile.full_name = Some(full_name.clone());
        }
    }
}

impl IntoIndexes for ProfileDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "user_id": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("user_id_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for ProfileDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
