//! Database schemas for the profile service
//!
//! Defines MongoDB document structures for each kind of UGC.

mod bookmark;
mod like;
mod metadata;
mod profile;
mod review;
mod watch_progress;

pub use bookmark::{BookmarkDoc, BOOKMARK_COLLECTION};
pub use like::{LikeDoc, LikeTarget, LIKE_COLLECTION};
pub use metadata::Metadata;
pub use profile::{ProfileDoc, ProfileUpdate, PROFILE_COLLECTION};
pub use review::{ReviewDoc, REVIEW_COLLECTION};
pub use watch_progress::{WatchProgressDoc, WATCH_PROGRESS_COLLECTION};
