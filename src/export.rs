use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;

use crate::error::Result;
use crate::models::{DownloadedAttachment, Issue};

/// CSVのヘッダー行（ExportRecordのフィールド順）
const CSV_HEADER: &str = "key,summary,description,status,created,attachments";

/// エクスポート1行分の正規化済みレコード
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRecord {
    pub key: String,
    pub summary: String,
    pub description: String,
    pub status: String,
    pub created: String,
    pub attachments: Vec<AttachmentRef>,
}

/// レコードに残す添付ファイルの参照情報
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub filename: String,
    pub size: u64,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub url: String,
}

/// 生のIssue JSONをエクスポートレコードへ正規化する
///
/// `attachments_by_issue`はIssueキーで引く。エントリのないIssueの
/// attachmentsは空になる。
pub fn to_records(
    issues: &[Issue],
    attachments_by_issue: &HashMap<String, Vec<AttachmentRef>>,
) -> Vec<ExportRecord> {
    issues
        .iter()
        .map(|issue| ExportRecord {
            key: issue.key.clone(),
            summary: issue.fields.summary.clone(),
            description: issue.fields.description.clone().unwrap_or_default(),
            status: issue.fields.status.name.clone(),
            created: issue.fields.created.clone(),
            attachments: attachments_by_issue
                .get(&issue.key)
                .cloned()
                .unwrap_or_default(),
        })
        .collect()
}

/// レコード列をCSVテキストへ直列化する
///
/// 各フィールドはJSONエンコードした上で引用符を全て二重化する。
/// attachments列だけはファイル名のみのリストとして出力する。
pub fn to_csv(records: &[ExportRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }

    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(CSV_HEADER.to_string());

    for record in records {
        let fields = [
            encode_field(&record.key),
            encode_field(&record.summary),
            encode_field(&record.description),
            encode_field(&record.status),
            encode_field(&record.created),
            encode_attachment_names(&record.attachments),
        ];
        rows.push(fields.join(","));
    }

    rows.join("\n")
}

fn encode_field(value: &str) -> String {
    serde_json::Value::String(value.to_string())
        .to_string()
        .replace('"', "\"\"")
}

fn encode_attachment_names(attachments: &[AttachmentRef]) -> String {
    let names: Vec<&str> = attachments.iter().map(|a| a.filename.as_str()).collect();
    serde_json::Value::from(names).to_string().replace('"', "\"\"")
}

/// 添付ファイルバイナリのZIPアーカイブ構築
///
/// エントリのパスは `attachments/<issueKey>/<filename>`。同一Issue内で
/// ファイル名が衝突した場合は後から追加したものが黙って上書きする。
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// ダウンロード済み添付ファイルをアーカイブへ登録する
    ///
    /// バイナリの所有権はここでアーカイブへ移る。
    pub fn add_attachment(&mut self, issue_key: &str, attachment: DownloadedAttachment) {
        let path = format!("attachments/{}/{}", issue_key, attachment.filename);

        if let Some(existing) = self.entries.iter_mut().find(|(p, _)| *p == path) {
            existing.1 = attachment.content;
        } else {
            self.entries.push((path, attachment.content));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// ZIPバイト列を生成する
    pub fn build(&self) -> Result<Vec<u8>> {
        use std::io::Cursor;
        use zip::CompressionMethod;
        use zip::write::SimpleFileOptions;

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (path, content) in &self.entries {
            writer.start_file(path.as_str(), options)?;
            writer.write_all(content)?;
        }

        let cursor = writer.finish()?;
        Ok(cursor.into_inner())
    }
}
