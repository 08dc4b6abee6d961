//! Domain and wire types for sources, articles and stories.
//!
//! Wire types serialize with camelCase field names, which is what the
//! frontend consumes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Manually assigned political lean of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BiasRating {
    Left,
    CenterLeft,
    Center,
    CenterRight,
    Right,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown bias rating: {0}")]
pub struct ParseBiasRatingError(pub String);

impl BiasRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            BiasRating::Left => "left",
            BiasRating::CenterLeft => "center-left",
            BiasRating::Center => "center",
            BiasRating::CenterRight => "center-right",
            BiasRating::Right => "right",
        }
    }
}

impl fmt::Display for BiasRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BiasRating {
    type Err = ParseBiasRatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(BiasRating::Left),
            "center-left" => Ok(BiasRating::CenterLeft),
            "center" => Ok(BiasRating::Center),
            "center-right" => Ok(BiasRating::CenterRight),
            "right" => Ok(BiasRating::Right),
            other => Err(ParseBiasRatingError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryStatus {
    #[default]
    Draft,
    Published,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown story status: {0}")]
pub struct ParseStoryStatusError(pub String);

impl StoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStatus::Draft => "draft",
            StoryStatus::Published => "published",
        }
    }
}

impl fmt::Display for StoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoryStatus {
    type Err = ParseStoryStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(StoryStatus::Draft),
            "published" => Ok(StoryStatus::Published),
            other => Err(ParseStoryStatusError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub bias_rating: BiasRating,
    pub logo_url: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub source_id: i64,
    pub title: String,
    pub url: String,
    pub snippet: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: i64,
    pub headline: String,
    pub summary: String,
    pub topic: String,
    pub key_facts: Vec<String>,
    pub divergence_summary: Option<String>,
    pub status: StoryStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// An article together with the publisher it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleWithSource {
    #[serde(flatten)]
    pub article: Article,
    pub source: Source,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryArticle {
    pub id: i64,
    pub story_id: i64,
    pub article_id: i64,
    pub source_snippet: Option<String>,
    pub article: ArticleWithSource,
}

/// A story as served to the frontend, with every linked article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryResponse {
    #[serde(flatten)]
    pub story: Story,
    pub story_articles: Vec<StoryArticle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoriesPage {
    pub stories: Vec<StoryResponse>,
    pub total: i64,
    pub current_page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewSource {
    pub name: String,
    pub url: String,
    pub bias_rating: BiasRating,
    pub logo_url: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub source_id: i64,
    pub title: String,
    pub url: String,
    pub snippet: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewStory {
    pub headline: String,
    pub summary: String,
    pub topic: String,
    pub key_facts: Vec<String>,
    pub divergence_summary: Option<String>,
    pub status: StoryStatus,
    pub published_at: Option<DateTime<Utc>>,
}

/// Number of pages needed to show `total` items, `limit` at a time.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

#[cfg(test)]
mod tests {
    use super::*;

    mod bias_rating_tests {
        use super::*;

        #[test]
        fn test_parse_all_ratings() {
            for (s, rating) in [
                ("left", BiasRating::Left),
                ("center-left", BiasRating::CenterLeft),
                ("center", BiasRating::Center),
                ("center-right", BiasRating::CenterRight),
                ("right", BiasRating::Right),
            ] {
                assert_eq!(s.parse::<BiasRating>().unwrap(), rating);
                assert_eq!(rating.to_string(), s);
            }
        }

        #[test]
        fn test_parse_unknown_rating() {
            let err = "far-left".parse::<BiasRating>().unwrap_err();
            assert_eq!(err, ParseBiasRatingError("far-left".to_string()));
        }

        #[test]
        fn test_serializes_kebab_case() {
            let json = serde_json::to_string(&BiasRating::CenterRight).unwrap();
            assert_eq!(json, "\"center-right\"");
        }
    }

    mod story_status_tests {
        use super::*;

        #[test]
        fn test_default_is_draft() {
            assert_eq!(StoryStatus::default(), StoryStatus::Draft);
        }

        #[test]
        fn test_parse_status() {
            assert_eq!("published".parse::<StoryStatus>().unwrap(), StoryStatus::Published);
            assert!("archived".parse::<StoryStatus>().is_err());
        }
    }

    mod wire_format_tests {
        use super::*;

        fn sample_story() -> Story {
            Story {
                id: 7,
                headline: "Headline".to_string(),
                summary: "Summary".to_string(),
                topic: "business".to_string(),
                key_facts: vec!["Fact one".to_string()],
                divergence_summary: None,
                status: StoryStatus::Published,
                published_at: None,
                created_at: Utc::now(),
            }
        }

        #[test]
        fn test_story_response_is_flattened_camel_case() {
            let response = StoryResponse {
                story: sample_story(),
                story_articles: vec![],
            };

            let value = serde_json::to_value(&response).unwrap();
            assert_eq!(value["id"], 7);
            assert_eq!(value["keyFacts"][0], "Fact one");
            assert_eq!(value["status"], "published");
            assert!(value["divergenceSummary"].is_null());
            assert!(value["storyArticles"].as_array().unwrap().is_empty());
        }

        #[test]
        fn test_stories_page_field_names() {
            let page = StoriesPage {
                stories: vec![],
                total: 0,
                current_page: 1,
                total_pages: 0,
            };

            let value = serde_json::to_value(&page).unwrap();
            assert_eq!(value["currentPage"], 1);
            assert_eq!(value["totalPages"], 0);
        }
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, 0), 0);
    }
}
