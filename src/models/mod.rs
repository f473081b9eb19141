//! Request, response and event models

mod events;
mod movie;
mod progress;
mod user;

pub use events::{UgcEvent, UgcKey, WatchProgressEvent};
pub use movie::{Genre, Movie, MovieDetail, MovieSummary, Person};
pub use progress::MovieProgress;
pub use user::User;
