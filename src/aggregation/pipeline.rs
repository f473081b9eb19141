//! Aggregation pipeline builders
//!
//! Pure functions returning the stages; the runners in `mongo` execute them.

use bson::{doc, Document};

use super::SummaryKind;
use crate::db::schemas::{BOOKMARK_COLLECTION, LIKE_COLLECTION, WATCH_PROGRESS_COLLECTION};
use crate::db::Page;

/// Likes on the movie whose id is in `movie_field`, as `likes: [{user_id}]`
fn likes_lookup(movie_field: &str) -> Document {
    doc! {
        "$lookup": {
            "from": LIKE_COLLECTION,
            "let": { "mid": format!("${}", movie_field) },
            "pipeline": [
                { "$match": { "$expr": { "$and": [
                    { "$eq": ["$target_id", "$$mid"] },
                    { "$eq": ["$target_type", "movie"] }
                ] } } },
                { "$project": { "_id": 0, "user_id": 1 } }
            ],
            "as": "likes",
        }
    }
}

/// The user's progress on the movie in `movie_field`, as `progress: [doc]`
fn progress_lookup(movie_field: &str, user_id: &str) -> Document {
    doc! {
        "$lookup": {
            "from": WATCH_PROGRESS_COLLECTION,
            "let": { "mid": format!("${}", movie_field) },
            "pipeline": [
                { "$match": { "$expr": { "$and": [
                    { "$eq": ["$movie_id", "$$mid"] },
                    { "$eq": ["$user_id", user_id] }
                ] } } },
                { "$limit": 1 },
                { "$project": { "_id": 0, "progress": 1 } }
            ],
            "as": "progress",
        }
    }
}

fn first_progress_or_zero() -> Document {
    doc! { "$ifNull": [{ "$arrayElemAt": ["$progress.progress", 0] }, 0.0] }
}

/// Newest first, then page
fn paging(page: Page) -> [Document; 3] {
    [
        doc! { "$sort": { "_id": -1 } },
        doc! { "$skip": page.skip_i64() },
        doc! { "$limit": page.limit_i64() }
    ]
}

/// Summary over the user's bookmarks
pub fn bookmark_summary(user_id: &str, page: Page) -> Vec<Document> {
    let mut stages = vec![doc! { "$match": { "user_id": user_id } }];
    stages.extend(paging(page));
    stages.push(likes_lookup("movie_id"));
    stages.push(progress_lookup("movie_id", user_id));
    stages.push(doc! {
        "$project": {
            "_id": 0,
            "movie_id": 1,
            "likes_count": { "$size": "$likes" },
            "user_liked": { "$in": [user_id, "$likes.user_id"] },
            "watch_progress": first_progress_or_zero(),
        }
    });
    stages
}

/// Summary over the movies the user liked
pub fn likes_summary(user_id: &str, page: Page) -> Vec<Document> {
    let mut stages = vec![doc! { "$match": { "user_id": user_id, "target_type": "movie" } }];
    stages.extend(paging(page));
    stages.push(likes_lookup("target_id"));
    stages.push(progress_lookup("target_id", user_id));
    stages.push(doc! {
        "$project": {
            "_id": 0,
            "movie_id": "$target_id",
            "likes_count": { "$size": "$likes" },
            "user_liked": { "$literal": true },
            "watch_progress": first_progress_or_zero(),
        }
    });
    stages
}

/// Summary over the user's watch history
pub fn progress_summary(user_id: &str, page: Page) -> Vec<Document> {
    let mut stages = vec![doc! { "$match": { "user_id": user_id } }];
    stages.extend(paging(page));
    stages.push(likes_lookup("movie_id"));
    stages.push(doc! {
        "$project": {
            "_id": 0,
            "movie_id": 1,
            "likes_count": { "$size": "$likes" },
            "user_liked": { "$in": [user_id, "$likes.user_id"] },
            "watch_progress": { "$ifNull": ["$progress", 0.0] },
        }
    });
    stages
}

pub fn summary(kind: SummaryKind, user_id: &str, page: Page) -> Vec<Document> {
    match kind {
        SummaryKind::Bookmarks => bookmark_summary(user_id, page),
        SummaryKind::Likes => likes_summary(user_id, page),
        SummaryKind::History => progress_summary(user_id, page),
    }
}

/// Detailed view of one movie for one user
///
/// Collectionless: seeded with `$documents`, so a movie nobody has touched
/// still yields one row with zero counts.
pub fn detailed(user_id: &str, movie_id: &str) -> Vec<Document> {
    vec![
        doc! { "$documents": [{ "movie_id": movie_id }] },
        doc! {
            "$lookup": {
                "from": LIKE_COLLECTION,
                "pipeline": [
                    { "$match": { "target_id": movie_id, "target_type": "movie" } },
                    { "$project": { "_id": 0, "user_id": 1 } }
                ],
                "as": "likes",
            }
        },
        doc! {
            "$lookup": {
                "from": BOOKMARK_COLLECTION,
                "pipeline": [
                    { "$match": { "movie_id": movie_id } },
                    { "$project": { "_id": 0, "user_id": 1 } }
                ],
                "as": "bookmarks",
            }
        },
        doc! {
            "$lookup": {
                "from": WATCH_PROGRESS_COLLECTION,
                "pipeline": [
                    { "$match": { "movie_id": movie_id, "user_id": user_id } },
                    { "$limit": 1 },
                    { "$project": { "_id": 0, "progress": 1 } }
                ],
                "as": "progress",
            }
        },
        doc! {
            "$project": {
                "movie_id": 1,
                "likes_count": { "$size": "$likes" },
                "user_liked": { "$in": [user_id, "$likes.user_id"] },
                "bookmarks_count": { "$size": "$bookmarks" },
                "user_bookmarked": { "$in": [user_id, "$bookmarks.user_id"] },
                "watch_progress": first_progress_or_zero(),
            }
        }
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_names(stages: &[Document]) -> Vec<String> {
        stages
            .iter()
            .map(|s| s.keys().next().cloned().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_bookmark_summary_pages_before_lookups() {
        let stages = bookmark_summary("u1", Page::new(2, 10));
        assert_eq!(
            stage_names(&stages),
            ["$match", "$sort", "$skip", "$limit", "$lookup", "$lookup", "$project"]
        );
        assert_eq!(stages[2].get_i64("$skip").unwrap(), 20);
        assert_eq!(stages[3].get_i64("$limit").unwrap(), 10);
    }

    #[test]
    fn test_huge_pages_never_skip_negative() {
        let stages = bookmark_summary("u", Page::new(u64::MAX / 2, 50));
        assert_eq!(stages[2].get_i64("$skip").unwrap(), i64::MAX);
        assert_eq!(stages[3].get_i64("$limit").unwrap(), 50);
    }

    #[test]
    fn test_likes_summary_matches_movie_likes_only() {
        let stages = likes_summary("u1", Page::default());
        let matcher = stages[0].get_document("$match").unwrap();
        assert_eq!(matcher.get_str("target_type").unwrap(), "movie");

        let project = stages.last().unwrap().get_document("$project").unwrap();
        assert_eq!(project.get_str("movie_id").unwrap(), "$target_id");
    }

    #[test]
    fn test_progress_summary_uses_own_progress() {
        let stages = progress_summary("u1", Page::default());
        let lookups = stage_names(&stages)
            .into_iter()
            .filter(|s| s == "$lookup")
            .count();
        assert_eq!(lookups, 1);
    }

    #[test]
    fn test_detailed_is_seeded_with_movie() {
        let stages = detailed("u1", "m1");
        let seed = stages[0].get_array("$documents").unwrap();
        assert_eq!(seed.len(), 1);
        assert_eq!(
            seed[0].as_document().unwrap().get_str("movie_id").unwrap(),
            "m1"
        );
        assert_eq!(stage_names(&stages).last().unwrap(), "$project");
    }
}
