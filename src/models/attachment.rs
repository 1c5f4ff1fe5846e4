use serde::{Deserialize, Serialize};

/// 添付ファイルのメタデータ（外部形状）
///
/// `content`はバイナリ本体のダウンロードURL。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub filename: String,
    pub content: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub size: u64,
}

/// ダウンロード済み添付ファイル
///
/// バイナリの所有権はアーカイブ構築側に移る。
#[derive(Debug, Clone)]
pub struct DownloadedAttachment {
    pub filename: String,
    pub content: Vec<u8>,
    pub mime_type: String,
    pub size: u64,
}

/// `GET /rest/api/2/issue/<key>?fields=attachment` のレスポンス形状
#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentListing {
    pub fields: AttachmentFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachmentFields {
    #[serde(default)]
    pub attachment: Vec<Attachment>,
}
