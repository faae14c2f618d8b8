//! Study material model matching the frontend StudyMaterial interface.

use serde::{Deserialize, Serialize};

/// Medium of a study material.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ContentType {
    Course,
    VideoLecture,
    Book,
    Music,
    Audio,
    PdfBook,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Course => "Course",
            ContentType::VideoLecture => "VideoLecture",
            ContentType::Book => "Book",
            ContentType::Music => "Music",
            ContentType::Audio => "Audio",
            ContentType::PdfBook => "PdfBook",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Course" => Some(ContentType::Course),
            "VideoLecture" => Some(ContentType::VideoLecture),
            "Book" => Some(ContentType::Book),
            "Music" => Some(ContentType::Music),
            "Audio" => Some(ContentType::Audio),
            "PdfBook" => Some(ContentType::PdfBook),
            _ => None,
        }
    }
}

/// A downloadable or viewable study resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StudyMaterial {
    pub id: i64,
    pub title: String,
    /// Composite subject key, e.g. `upsc-hindi`. Opaque match key.
    pub subject: String,
    pub content_type: ContentType,
    pub url: String,
}

/// Request body for adding a study material.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudyMaterialRequest {
    pub title: String,
    pub subject: String,
    pub content_type: ContentType,
    pub url: String,
}
