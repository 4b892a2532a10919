//! バックエンドREST API
//!
//! - client: reqwestによる実装
//! - types: レスポンス型
//!
//! ワークフローは `ReportBackend` トレイト越しに呼び出すため、
//! テストではネットワークなしのフェイク実装に差し替えられる。

mod client;
pub mod types;

pub use client::ApiClient;
pub use types::{DeleteResponse, PromptResponse, ReportResponse, UploadResponse, UploadedFile};

use crate::error::Result;
use crate::scanner::LocalFile;
use mls_compare_common::ManualPropertyInput;

/// 操作ごとの汎用エラーメッセージ
pub const UPLOAD_FAILED: &str = "Upload failed";
pub const PROMPT_FAILED: &str = "Prompt generation failed";
pub const REPORT_FAILED: &str = "Report generation failed";
pub const DOWNLOAD_FAILED: &str = "Download failed";
pub const LIST_FAILED: &str = "Failed to list files";
pub const DELETE_FAILED: &str = "Delete failed";

/// バックエンドの機能1つにつき1メソッド
#[async_trait::async_trait]
pub trait ReportBackend: Send + Sync {
    /// 対象物件のMLSレポートPDFをアップロード
    async fn upload_primary(&self, file: &LocalFile) -> Result<UploadResponse>;

    /// 比較物件PDFをまとめてアップロード
    async fn upload_comparisons(&self, files: &[LocalFile]) -> Result<UploadResponse>;

    async fn generate_prompt(&self, source_id: &str, comparison_ids: &[String]) -> Result<PromptResponse>;

    async fn generate_prompt_manual(
        &self,
        manual: &ManualPropertyInput,
        comparison_ids: &[String],
    ) -> Result<PromptResponse>;

    async fn generate_report(&self, source_id: &str, comparison_ids: &[String]) -> Result<ReportResponse>;

    async fn generate_report_manual(
        &self,
        manual: &ManualPropertyInput,
        comparison_ids: &[String],
    ) -> Result<ReportResponse>;

    /// レポートPDFのバイナリ
    async fn download_report(&self, report_id: &str) -> Result<Vec<u8>>;

    /// 埋め込み表示用URL
    fn view_url(&self, report_id: &str) -> String;

    /// アップロード済みファイル一覧（診断用）
    async fn list_files(&self) -> Result<serde_json::Value>;

    async fn delete_file(&self, file_id: &str) -> Result<DeleteResponse>;
}
