//! Movie metadata from the content service, and the enriched views built on it

use serde::{Deserialize, Deserializer, Serialize};

/// Movie as served by the content service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imdb_rating: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "drop_nulls")]
    pub genres: Vec<Genre>,

    #[serde(default, deserialize_with = "drop_nulls")]
    pub actors: Vec<Person>,

    #[serde(default, deserialize_with = "drop_nulls")]
    pub writers: Vec<Person>,

    #[serde(default, deserialize_with = "drop_nulls")]
    pub directors: Vec<Person>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    #[serde(default, alias = "full_name")]
    pub name: String,
}

/// Accept a missing, null, or partially-null list
fn drop_nulls<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items: Option<Vec<Option<T>>> = Option::deserialize(deserializer)?;
    Ok(items.unwrap_or_default().into_iter().flatten().collect())
}

/// A movie in one of the user's collections
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieSummary {
    #[serde(flatten)]
    pub movie: Movie,
    pub likes_count: u64,
    pub user_liked: bool,
    pub watch_progress: f64,
}

/// Full movie view for one user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub movie: Movie,
    pub likes_count: u64,
    pub user_liked: bool,
    pub bookmarks_count: u64,
    pub user_bookmarked: bool,
    pub watch_progress: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_nested_entries_dropped() {
        let json = r#"{
            "id": "m1",
            "title": "Heat",
            "genres": [{"id": "g1", "name": "Crime"}, null],
            "actors": null,
            "directors": [null, {"id": "p1", "full_name": "Michael Mann"}]
        }"#;
        let movie: Movie = serde_json::from_str(json).unwrap();

        assert_eq!(movie.genres.len(), 1);
        assert!(movie.actors.is_empty());
        assert!(movie.writers.is_empty());
        assert_eq!(movie.directors[0].name, "Michael Mann");
    }

    #[test]
    fn test_summary_flattens_movie() {
        let summary = MovieSummary {
            movie: Movie {
                id: "m1".into(),
                title: "Heat".into(),
                ..Default::default()
            },
            likes_count: 3,
            user_liked: true,
            watch_progress: 0.5,
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["id"], "m1");
        assert_eq!(value["likes_count"], 3);
    }
}
