//! Watch progress checkpoint sent by players

use serde::{Deserialize, Serialize};

use crate::types::{ProfileError, Result};

/// Playback position in seconds against the movie's length
///
/// Players send `{id, title, seconds_length, current_progress}`; the same
/// shape is republished as the event's `movie`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieProgress {
    #[serde(rename = "id", alias = "movie_id")]
    pub movie_id: String,
    #[serde(default)]
    pub title: String,
    pub current_progress: f64,
    pub seconds_length: f64,
}

impl MovieProgress {
    pub fn validate(&self) -> Result<()> {
        if self.movie_id.is_empty() {
            return Err(ProfileError::BadRequest("id is required".into()));
        }
        if !(self.seconds_length > 0.0) {
            return Err(ProfileError::BadRequest(
                "seconds_length must be positive".into(),
            ));
        }
        if !(0.0..=self.seconds_length).contains(&self.current_progress) {
            return Err(ProfileError::BadRequest(
                "current_progress must be between 0 and seconds_length".into(),
            ));
        }
        Ok(())
    }

    /// Fraction watched, 0.0 to 1.0
    pub fn fraction(&self) -> f64 {
        self.current_progress / self.seconds_length
    }
}
