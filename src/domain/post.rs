use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GradeLevel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub post_type: PostType,
    pub grade_level: GradeLevel,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PostType {
    PrincipalNote,
    Announcement,
    Reminder,
    General,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::PrincipalNote => "principal_note",
            PostType::Announcement => "announcement",
            PostType::Reminder => "reminder",
            PostType::General => "general",
        }
    }
}

impl FromStr for PostType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "principal_note" => Ok(PostType::PrincipalNote),
            "announcement" => Ok(PostType::Announcement),
            "reminder" => Ok(PostType::Reminder),
            "general" => Ok(PostType::General),
            _ => Err(format!("Invalid post type: {}", s)),
        }
    }
}

impl fmt::Display for PostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A post as listed to a viewer, with author name and current tally.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author_name: String,
    pub tally: i64,
}

/// Insert payload for the post repository.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub post_type: PostType,
    pub grade_level: GradeLevel,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default = "default_post_type")]
    pub post_type: PostType,
    #[serde(default = "default_grade_level")]
    pub grade_level: GradeLevel,
}

fn default_post_type() -> PostType {
    PostType::General
}

fn default_grade_level() -> GradeLevel {
    GradeLevel::All
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub post_type: Option<PostType>,
    pub grade_level: Option<GradeLevel>,
}

impl UpdatePostRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.post_type.is_none()
            && self.grade_level.is_none()
    }
}

/// Listing filters. Visibility is applied on top of these, never instead of them.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PostFilter {
    pub grade_level: Option<GradeLevel>,
    pub post_type: Option<PostType>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
