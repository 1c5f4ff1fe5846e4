use crate::client::JiraClient;
use crate::error::{Error, Result};
use crate::models::{Attachment, DownloadedAttachment};

/// Issue単位の添付ファイル収集
///
/// 添付ファイルはベストエフォートの付加情報として扱う。一覧取得や
/// ダウンロードの失敗はエクスポート全体を中断せず、警告ログを残して
/// 空の結果に縮退する。ただし`RateLimitExceeded`だけは例外で、継続
/// すると制限を悪化させるため必ずそのまま伝播する。
pub struct AttachmentCollector<'a> {
    client: &'a JiraClient,
}

impl<'a> AttachmentCollector<'a> {
    pub fn new(client: &'a JiraClient) -> Self {
        Self { client }
    }

    /// Issueの添付ファイル一覧を取得する（失敗時は空リスト）
    pub async fn list(&self, issue_key: &str) -> Result<Vec<Attachment>> {
        match self.client.issue_attachments(issue_key).await {
            Ok(attachments) => Ok(attachments),
            Err(Error::RateLimitExceeded) => Err(Error::RateLimitExceeded),
            Err(e) => {
                tracing::warn!(issue_key, error = %e, "failed to fetch attachments for issue");
                Ok(Vec::new())
            }
        }
    }

    /// 添付ファイル本体をダウンロードする（失敗時はNone）
    pub async fn download(&self, attachment: &Attachment) -> Result<Option<DownloadedAttachment>> {
        match self.client.download_attachment(attachment).await {
            Ok(downloaded) => Ok(Some(downloaded)),
            Err(Error::RateLimitExceeded) => Err(Error::RateLimitExceeded),
            Err(e) => {
                tracing::warn!(
                    filename = %attachment.filename,
                    error = %e,
                    "failed to download attachment"
                );
                Ok(None)
            }
        }
    }
}
