//! Clients for upstream services

pub mod movie_api;

pub use movie_api::{MovieApi, MovieApiConfig, MovieSource};
