//! Events published after each successful write

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{MovieProgress, User};

/// Routing key of a UGC event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UgcKey {
    Bookmark,
    Like,
    Review,
    Profile,
}

impl UgcKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bookmark => "bookmark",
            Self::Like => "like",
            Self::Review => "review",
            Self::Profile => "profile",
        }
    }
}

impl fmt::Display for UgcKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something a user added or removed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UgcEvent {
    pub user_id: String,
    pub target_id: String,
    pub is_adding: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional: Option<serde_json::Value>,
}

impl UgcEvent {
    pub fn new(user_id: impl Into<String>, target_id: impl Into<String>, is_adding: bool) -> Self {
        Self {
            user_id: user_id.into(),
            target_id: target_id.into(),
            is_adding,
            additional: None,
        }
    }

    pub fn with_additional(mut self, additional: serde_json::Value) -> Self {
        self.additional = Some(additional);
        self
    }
}

/// Progress checkpoint with the user who made it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchProgressEvent {
    pub movie: MovieProgress,
    pub user: User,
}

impl WatchProgressEvent {
    /// Key grouping a user's checkpoints on one movie
    pub fn key(&self) -> String {
        format!("{}+{}", self.movie.movie_id, self.user.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_key() {
        let event = WatchProgressEvent {
            movie: MovieProgress {
                movie_id: "m1".into(),
                title: "Heat".into(),
                current_progress: 10.0,
                seconds_length: 100.0,
            },
            user: User::with_id("u1"),
        };
        assert_eq!(event.key(), "m1+u1");
    }

    #[test]
    fn test_additional_omitted_when_empty() {
        let json = serde_json::to_value(UgcEvent::new("u", "m", true)).unwrap();
        assert!(json.get("additional").is_none());
        assert_eq!(json["is_adding"], true);
    }
}
