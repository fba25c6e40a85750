use serde::{Deserialize, Serialize};

use crate::error::UploadError;

/// Role an uploaded asset plays once attached to a bookmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetType {
    Screenshot,
    AssetScreenshot,
    BannerImage,
    FullPageArchive,
    Video,
    BookmarkAsset,
    PrecrawledArchive,
    Unknown,
}

/// Request body linking an uploaded asset to a bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetAttachment {
    pub id: String,
    pub asset_type: AssetType,
}

impl AssetAttachment {
    pub fn banner(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            asset_type: AssetType::BannerImage,
        }
    }
}

/// An asset accepted by the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAsset {
    pub id: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub file_name: String,
}

/// Raw reply of the asset endpoint. Failures may arrive with a success
/// status, signalled through `error`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct AssetReply {
    asset_id: String,
    content_type: String,
    size: u64,
    file_name: String,
    error: Option<String>,
}

impl AssetReply {
    pub(crate) fn into_asset(self) -> Result<RemoteAsset, UploadError> {
        if let Some(error) = self.error.filter(|e| !e.is_empty()) {
            return Err(UploadError::Remote(error));
        }
        if self.size == 0 {
            return Err(UploadError::ZeroSize);
        }

        Ok(RemoteAsset {
            id: self.asset_id,
            content_type: self.content_type,
            size_bytes: self.size,
            file_name: self.file_name,
        })
    }
}
