//! バックエンドAPIのレスポンス型
//!
//! フィールド名はバックエンドのJSON（snake_case）そのまま。

use crate::error::{MlsCompareError, Result};
use mls_compare_common::{ReportData, ReportResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// アップロード済みファイル1件
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadedFile {
    pub file_id: String,
    pub filename: String,
    pub file_size: u64,
}

/// `/upload-input-pdf` と `/upload-comparison-pdf` のレスポンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub file_id: Option<String>,
    pub filename: Option<String>,
    pub file_size: Option<u64>,
    pub uploaded_files: Option<Vec<UploadedFile>>,
    /// 比較物件と対象物件の種別（売買/賃貸など）が一致しない
    pub type_mismatch: Option<bool>,
    /// 種別不一致時にバックエンドが対象物件PDFから抽出したデータ
    pub extracted_data: Option<Map<String, Value>>,
}

/// プロンプト生成のレスポンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptResponse {
    pub success: bool,
    pub message: String,
    pub prompt: String,
}

/// レポート生成のレスポンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportResponse {
    pub success: bool,
    pub message: String,
    pub report_data: ReportData,
    pub report_id: String,
    pub report_url: String,
    pub graphs_generated: Vec<String>,
}

impl ReportResponse {
    pub fn into_result(self) -> ReportResult {
        ReportResult {
            report_id: self.report_id,
            report_url: self.report_url,
            report_data: self.report_data,
            graphs_generated: self.graphs_generated,
        }
    }
}

/// `/files/{id}` 削除のレスポンス
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

/// `success: false` を拒否エラーに変換
pub fn ensure_success(success: bool, message: &str) -> Result<()> {
    if success {
        Ok(())
    } else {
        Err(MlsCompareError::Rejected(message.to_string()))
    }
}

/// エラーレスポンス本文から `detail` を取り出す
///
/// JSONでない・`detail` が文字列でない場合は汎用メッセージを返す。
pub fn error_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(Value::as_str).map(str::to_string))
        .filter(|detail| !detail.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
