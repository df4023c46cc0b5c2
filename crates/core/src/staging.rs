//! Client-side staging of car images and video before submission.
//!
//! Files picked by the operator live in memory with a preview handle until
//! the main-info step is submitted. Removing an image that already exists on
//! the server does not call the backend; its id is queued in
//! [`MediaStaging::deleted_ids`] and sent with the next save so the server
//! applies removals together with the other changes.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::car::PersistedImage;
use crate::error::CoreError;
use crate::types::DbId;

/// Maximum size of a single staged image.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Maximum size of the staged video.
pub const MAX_VIDEO_BYTES: usize = 100 * 1024 * 1024;

/// Maximum number of images per car.
pub const MAX_IMAGES: usize = 20;

/// Accepted video extensions and their MIME types.
const VIDEO_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
];

// ---------------------------------------------------------------------------
// Preview handles
// ---------------------------------------------------------------------------

/// Issues and revokes local preview URLs (`blob:dealerdash/<uuid>`).
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    live: HashSet<String>,
}

impl PreviewRegistry {
    pub fn issue(&mut self) -> String {
        let url = format!("blob:dealerdash/{}", uuid::Uuid::new_v4());
        self.live.insert(url.clone());
        url
    }

    /// Release a preview URL. Returns `false` if it was not live.
    pub fn revoke(&mut self, url: &str) -> bool {
        self.live.remove(url)
    }

    pub fn is_live(&self, url: &str) -> bool {
        self.live.contains(url)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}

// ---------------------------------------------------------------------------
// Staged files
// ---------------------------------------------------------------------------

/// A file held in memory until submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    digest: String,
}

impl StagedFile {
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Build a staged image, sniffing the format from its header bytes.
pub fn stage_image_file(file_name: &str, bytes: Vec<u8>) -> Result<StagedFile, CoreError> {
    if bytes.is_empty() {
        return Err(CoreError::Validation(format!("Image '{file_name}' is empty")));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(CoreError::Validation(format!(
            "Image '{file_name}' exceeds {} MB",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }
    let mime_type = match image::guess_format(&bytes) {
        Ok(image::ImageFormat::Jpeg) => "image/jpeg",
        Ok(image::ImageFormat::Png) => "image/png",
        Ok(image::ImageFormat::WebP) => "image/webp",
        Ok(image::ImageFormat::Gif) => "image/gif",
        _ => {
            return Err(CoreError::Validation(format!(
                "'{file_name}' is not a JPEG, PNG, WebP or GIF image"
            )))
        }
    };
    Ok(StagedFile {
        file_name: file_name.to_string(),
        mime_type: mime_type.to_string(),
        digest: sha256_hex(&bytes),
        bytes,
    })
}

/// Build a staged video, typed by file extension.
pub fn stage_video_file(file_name: &str, bytes: Vec<u8>) -> Result<StagedFile, CoreError> {
    if bytes.is_empty() {
        return Err(CoreError::Validation(format!("Video '{file_name}' is empty")));
    }
    if bytes.len() > MAX_VIDEO_BYTES {
        return Err(CoreError::Validation(format!(
            "Video '{file_name}' exceeds {} MB",
            MAX_VIDEO_BYTES / (1024 * 1024)
        )));
    }
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let mime_type = VIDEO_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .ok_or_else(|| {
            CoreError::Validation(format!("'{file_name}' is not an MP4, WebM or MOV video"))
        })?;
    Ok(StagedFile {
        file_name: file_name.to_string(),
        mime_type: mime_type.to_string(),
        digest: sha256_hex(&bytes),
        bytes,
    })
}

// ---------------------------------------------------------------------------
// Staging area
// ---------------------------------------------------------------------------

/// Stable key of a staged image within the staging area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ImageKey {
    Local(u64),
    Persisted(DbId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedImage {
    Pending {
        local_id: u64,
        preview_url: String,
        file: StagedFile,
    },
    Persisted(PersistedImage),
}

impl StagedImage {
    pub fn key(&self) -> ImageKey {
        match self {
            Self::Pending { local_id, .. } => ImageKey::Local(*local_id),
            Self::Persisted(image) => ImageKey::Persisted(image.id),
        }
    }

    /// URL to show for this image.
    pub fn display_url(&self) -> &str {
        match self {
            Self::Pending { preview_url, .. } => preview_url,
            Self::Persisted(image) => &image.url,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VideoSlot {
    #[default]
    Empty,
    Persisted(String),
    Pending {
        preview_url: String,
        file: StagedFile,
    },
}

/// What happens to the car video on submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoChange {
    Keep,
    Replace(StagedFile),
    Remove,
}

/// Everything the main-info submission needs from the staging area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSubmission {
    pub new_images: Vec<StagedFile>,
    pub kept_image_ids: Vec<DbId>,
    pub deleted_ids: Vec<DbId>,
    pub video: VideoChange,
}

impl MediaSubmission {
    pub fn has_changes(&self) -> bool {
        !self.new_images.is_empty() || !self.deleted_ids.is_empty() || self.video != VideoChange::Keep
    }
}

/// In-memory staging area for one car's media.
#[derive(Debug, Default)]
pub struct MediaStaging {
    images: Vec<StagedImage>,
    deleted_ids: Vec<DbId>,
    video: VideoSlot,
    video_removed: bool,
    previews: PreviewRegistry,
    next_local_id: u64,
}

impl MediaStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Staging seeded with what the server already stores.
    pub fn from_persisted(images: &[PersistedImage], video: Option<&str>) -> Self {
        Self {
            images: images.iter().cloned().map(StagedImage::Persisted).collect(),
            video: video
                .map(|url| VideoSlot::Persisted(url.to_string()))
                .unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn images(&self) -> &[StagedImage] {
        &self.images
    }

    pub fn video(&self) -> &VideoSlot {
        &self.video
    }

    /// Ids of persisted images queued for deletion.
    pub fn deleted_ids(&self) -> &[DbId] {
        &self.deleted_ids
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    /// Stage an image. The same content cannot be staged twice.
    pub fn add_image(&mut self, file: StagedFile) -> Result<ImageKey, CoreError> {
        if self.images.len() >= MAX_IMAGES {
            return Err(CoreError::Validation(format!(
                "A car can have at most {MAX_IMAGES} images"
            )));
        }
        let duplicate = self.images.iter().any(|img| match img {
            StagedImage::Pending { file: staged, .. } => staged.digest == file.digest,
            StagedImage::Persisted(_) => false,
        });
        if duplicate {
            return Err(CoreError::Conflict(format!(
                "'{}' is already staged",
                file.file_name
            )));
        }

        self.next_local_id += 1;
        let local_id = self.next_local_id;
        let preview_url = self.previews.issue();
        self.images.push(StagedImage::Pending {
            local_id,
            preview_url,
            file,
        });
        Ok(ImageKey::Local(local_id))
    }

    /// Remove an image. Pending files only release their preview; persisted
    /// images are queued in `deleted_ids`.
    pub fn remove_image(&mut self, key: ImageKey) -> Result<(), CoreError> {
        let index = self
            .images
            .iter()
            .position(|img| img.key() == key)
            .ok_or_else(|| CoreError::NotFound {
                entity: "Image",
                id: match key {
                    ImageKey::Local(id) => id as DbId,
                    ImageKey::Persisted(id) => id,
                },
            })?;

        match self.images.remove(index) {
            StagedImage::Pending { preview_url, .. } => {
                self.previews.revoke(&preview_url);
            }
            StagedImage::Persisted(image) => {
                if !self.deleted_ids.contains(&image.id) {
                    self.deleted_ids.push(image.id);
                }
            }
        }
        Ok(())
    }

    /// Stage a new video, replacing whatever is in the slot.
    pub fn set_video(&mut self, file: StagedFile) {
        self.release_video();
        let preview_url = self.previews.issue();
        self.video = VideoSlot::Pending { preview_url, file };
    }

    pub fn remove_video(&mut self) {
        self.release_video();
        self.video = VideoSlot::Empty;
    }

    fn release_video(&mut self) {
        match std::mem::take(&mut self.video) {
            VideoSlot::Pending { preview_url, .. } => {
                self.previews.revoke(&preview_url);
            }
            VideoSlot::Persisted(_) => self.video_removed = true,
            VideoSlot::Empty => {}
        }
    }

    /// Split the staging area into the submission payload. Preview handles
    /// of submitted files are released.
    pub fn into_submission(mut self) -> MediaSubmission {
        let mut new_images = Vec::new();
        let mut kept_image_ids = Vec::new();
        for image in std::mem::take(&mut self.images) {
            match image {
                StagedImage::Pending {
                    preview_url, file, ..
                } => {
                    self.previews.revoke(&preview_url);
                    new_images.push(file);
                }
                StagedImage::Persisted(image) => kept_image_ids.push(image.id),
            }
        }

        let video = match std::mem::take(&mut self.video) {
            VideoSlot::Pending { preview_url, file } => {
                self.previews.revoke(&preview_url);
                VideoChange::Replace(file)
            }
            VideoSlot::Persisted(_) => VideoChange::Keep,
            VideoSlot::Empty if self.video_removed => VideoChange::Remove,
            VideoSlot::Empty => VideoChange::Keep,
        };

        MediaSubmission {
            new_images,
            kept_image_ids,
            deleted_ids: std::mem::take(&mut self.deleted_ids),
            video,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
