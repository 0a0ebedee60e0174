//! Travel notes and their media attachments

use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Moderation status of a note
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteStatus {
    /// Submitted, waiting for a reviewer
    Pending,
    /// Approved by a reviewer, publicly visible
    Approved,
    /// Rejected by a reviewer, with a reason
    Rejected,
}

/// Kind of a media attachment
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

/// A media attachment, owned by exactly one note
///
/// The whole set is replaced when the author edits the media of a note
#[derive(Clone, Debug)]
pub struct Media {
    pub id: Uuid,
    pub kind: MediaKind,
    pub url: String,
    pub thumbnail_url: Option<String>,
}

/// Media attachment values before they are stored
#[derive(Clone, Debug)]
pub struct NewMedia {
    pub kind: MediaKind,
    pub url: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Note {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub status: NoteStatus,
    /// Present iff `status` is [`NoteStatus::Rejected`]
    pub reject_reason: Option<String>,
    pub media: Vec<Media>,
    /// Soft-delete flag, separate from `status`: an admin can delete a note
    /// in any status
    pub is_deleted: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Note {
    /// First image attachment, used as the cover in public listings
    pub fn cover_image_url(&self) -> Option<&str> {
        self.media
            .iter()
            .find(|media| media.kind == MediaKind::Image)
            .map(|media| media.url.as_str())
    }
}
