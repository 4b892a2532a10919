//! ワークフロー制御
//!
//! 入力方法の選択 → 対象物件のアップロード/手入力 → 比較物件のアップロード
//! → （任意）AIプロンプト生成 → レポート生成 → 表示/ダウンロード
//!
//! 各操作はネットワーク呼び出しの前に前提条件を検証し、結果を
//! `WorkflowState` のメッセージ欄に記録する。失敗しても保存済みの状態は壊さない。

use super::state::{
    Activity, ActivityMonitor, GeneratedPrompt, InFlight, InputMethod, ManualSource, MlsSource,
    WorkflowState,
};
use crate::api::types::ensure_success;
use crate::api::{
    ReportBackend, DOWNLOAD_FAILED, PROMPT_FAILED, REPORT_FAILED, UPLOAD_FAILED,
};
use crate::error::{MlsCompareError, Result};
use crate::scanner::LocalFile;
use mls_compare_common::{
    report_file_name, ManualField, ManualPropertyInput, ReportResult, UploadedFileRef,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const MSG_INVALID_PRIMARY: &str = "Please select a valid PDF file for the MLS report.";
pub const MSG_NO_PDF_COMPARISONS: &str = "Please select at least one PDF file for comparison.";
pub const MSG_FILTERED_COMPARISONS: &str = "Some files were not PDFs and have been filtered out.";
pub const MSG_NO_PRIMARY: &str = "Please upload an MLS report first.";
pub const MSG_NO_COMPARISONS: &str = "Please upload at least one comparison property file.";
pub const MSG_NO_VALID_COMPARISONS: &str = "No valid comparison files found.";
pub const MSG_NO_REPORT: &str = "No report available. Generate a report first.";
pub const MSG_TYPE_MISMATCH: &str =
    "The comparison listings are a different property type than the MLS report; extracted property data is available for manual entry.";

pub fn partial_upload_message(accepted: usize, sent: usize) -> String {
    format!("Only {} of {} comparison file(s) were accepted by the server.", accepted, sent)
}

/// プロンプト/レポート生成に渡す対象物件
enum Subject {
    File(String),
    Manual(ManualPropertyInput),
}

pub struct WorkflowController<B> {
    backend: B,
    state: WorkflowState,
    activity: ActivityMonitor,
}

impl<B: ReportBackend> WorkflowController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: WorkflowState::default(),
            activity: ActivityMonitor::default(),
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// 現在の実行中フラグ
    pub fn in_flight(&self) -> InFlight {
        self.activity.snapshot()
    }

    /// 実行中フラグの共有ハンドル（処理中でも読める）
    pub fn activity(&self) -> ActivityMonitor {
        self.activity.clone()
    }

    // ---- メッセージ ----

    fn fail<T>(&mut self, err: MlsCompareError, fallback: &str) -> Result<T> {
        let message = err.user_message(fallback);
        warn!(error = %err, "workflow action failed");
        self.state.messages.error = Some(message);
        Err(err)
    }

    fn succeed(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.state.messages.success = Some(message);
    }

    fn warn_user(&mut self, message: &str) {
        warn!("{}", message);
        self.state.messages.warning = Some(message.to_string());
    }

    pub fn clear_messages(&mut self) {
        self.state.messages.clear();
    }

    fn invalidate_prompt(&mut self) {
        if self.state.prompt.take().is_some() {
            debug!("cached AI prompt invalidated");
        }
    }

    // ---- 対象物件（ファイル） ----

    /// 対象物件のMLSレポートPDFを選択してアップロード
    pub async fn select_primary_file(&mut self, file: LocalFile) -> Result<UploadedFileRef> {
        if !file.is_pdf() {
            return self.fail(MlsCompareError::Validation(MSG_INVALID_PRIMARY.into()), UPLOAD_FAILED);
        }
        if self.state.input_method() != InputMethod::File {
            return self.fail(
                MlsCompareError::Validation("Switch to file input to upload an MLS report.".into()),
                UPLOAD_FAILED,
            );
        }

        let result = {
            let _uploading = self.activity.begin(Activity::Uploading);
            self.backend.upload_primary(&file).await
        };

        let response = match result.and_then(|r| ensure_success(r.success, &r.message).map(|_| r)) {
            Ok(r) => r,
            Err(e) => return self.fail(e, UPLOAD_FAILED),
        };
        let Some(file_id) = response.file_id.filter(|id| !id.is_empty()) else {
            let err = MlsCompareError::Rejected("upload response did not include a file id".into());
            return self.fail(err, UPLOAD_FAILED);
        };

        let uploaded = file.to_ref().with_server_id(file_id);
        self.state.source = MlsSource::File {
            primary: Some(uploaded.clone()),
        };
        self.invalidate_prompt();
        self.succeed("MLS report uploaded successfully!");
        Ok(uploaded)
    }

    /// 対象物件PDFの選択を外す（サーバー上のファイルは残る）
    pub fn remove_primary_file(&mut self) -> Option<UploadedFileRef> {
        let removed = match &mut self.state.source {
            MlsSource::File { primary } => primary.take(),
            MlsSource::Manual(_) => None,
        };
        if removed.is_some() {
            self.invalidate_prompt();
        }
        removed
    }

    // ---- 比較物件 ----

    /// 比較物件PDFを選択してまとめてアップロード
    ///
    /// PDF以外は除外して警告を出す。成功時は既存の比較物件を入力順で置き換える。
    pub async fn select_comparison_files(&mut self, files: Vec<LocalFile>) -> Result<Vec<UploadedFileRef>> {
        let total = files.len();
        let pdfs: Vec<LocalFile> = files.into_iter().filter(LocalFile::is_pdf).collect();

        if pdfs.is_empty() {
            return self.fail(MlsCompareError::Validation(MSG_NO_PDF_COMPARISONS.into()), UPLOAD_FAILED);
        }
        if pdfs.len() != total {
            debug!(selected = total, kept = pdfs.len(), "non-PDF comparison files filtered");
            self.warn_user(MSG_FILTERED_COMPARISONS);
        }

        let result = {
            let _uploading = self.activity.begin(Activity::Uploading);
            self.backend.upload_comparisons(&pdfs).await
        };

        let response = match result.and_then(|r| ensure_success(r.success, &r.message).map(|_| r)) {
            Ok(r) => r,
            Err(e) => return self.fail(e, UPLOAD_FAILED),
        };
        // 種別不一致時のサーバーは最初の1件を保存した時点で応答するため、
        // 受理された分だけを入力順に対応付ける
        let uploaded: Vec<UploadedFileRef> = pdfs
            .iter()
            .zip(response.uploaded_files.unwrap_or_default())
            .map(|(local, remote)| local.to_ref().with_server_id(remote.file_id))
            .collect();

        if response.type_mismatch.unwrap_or(false) {
            self.state.extracted_data = response.extracted_data;
            self.warn_user(MSG_TYPE_MISMATCH);
        } else if !uploaded.is_empty() && uploaded.len() < pdfs.len() {
            debug!(sent = pdfs.len(), accepted = uploaded.len(), "partial comparison upload");
            self.warn_user(&partial_upload_message(uploaded.len(), pdfs.len()));
        }

        if uploaded.is_empty() {
            let err = MlsCompareError::Rejected("server did not accept any comparison file".into());
            return self.fail(err, UPLOAD_FAILED);
        }

        self.state.comparisons = uploaded.clone();
        self.invalidate_prompt();
        self.succeed(format!("{} comparison file(s) uploaded successfully!", uploaded.len()));
        Ok(uploaded)
    }

    /// 比較物件を1件外す（再アップロードはしない）
    pub fn remove_comparison_file(&mut self, index: usize) -> Result<UploadedFileRef> {
        if index >= self.state.comparisons.len() {
            let err = MlsCompareError::Validation(format!(
                "No comparison file at position {}.",
                index + 1
            ));
            return self.fail(err, UPLOAD_FAILED);
        }
        let removed = self.state.comparisons.remove(index);
        // プロンプトは比較物件の組み合わせに対して生成されている
        self.invalidate_prompt();
        Ok(removed)
    }

    // ---- 対象物件（手入力） ----

    fn manual_source_mut(&mut self) -> Option<&mut ManualSource> {
        match &mut self.state.source {
            MlsSource::Manual(source) => Some(source),
            MlsSource::File { .. } => None,
        }
    }

    /// 手入力フィールドを更新し、必要なら単価を再計算
    pub fn update_manual_field(&mut self, field: ManualField, value: &str) -> Result<()> {
        let outcome = match self.manual_source_mut() {
            None => Err(MlsCompareError::Validation(
                "Switch to manual input to edit property fields.".into(),
            )),
            Some(source) if field == ManualField::ListPricePerSqFt && source.derived_locked => {
                Err(MlsCompareError::Validation(format!(
                    "{} is calculated from {} and {}.",
                    ManualField::ListPricePerSqFt.label(),
                    ManualField::LivingSqFt.label(),
                    ManualField::ListPrice.label()
                )))
            }
            Some(source) => match source.input.set(field, value) {
                Ok(()) => {
                    if field.feeds_price_per_sqft() {
                        source.derived_locked = source.input.refresh_derived();
                    }
                    Ok(())
                }
                Err(e) => Err(MlsCompareError::Validation(format!("{}: {}", field.label(), e))),
            },
        };

        match outcome {
            Ok(()) => {
                self.invalidate_prompt();
                Ok(())
            }
            Err(e) => self.fail(e, "Update failed"),
        }
    }

    /// 手入力データをまとめて読み込む
    pub fn set_manual_input(&mut self, input: ManualPropertyInput) -> Result<()> {
        let Some(source) = self.manual_source_mut() else {
            return self.fail(
                MlsCompareError::Validation("Switch to manual input to edit property fields.".into()),
                "Update failed",
            );
        };
        source.input = input;
        source.derived_locked = source.input.refresh_derived();
        self.invalidate_prompt();
        Ok(())
    }

    /// ファイル入力と手入力を切り替える
    ///
    /// 反対側のデータ、プロンプト、レポート、メッセージをすべて破棄する。
    /// 比較物件は残す。
    pub fn toggle_input_method(&mut self) -> InputMethod {
        self.state.source = match self.state.source {
            MlsSource::File { .. } => MlsSource::Manual(ManualSource::default()),
            MlsSource::Manual(_) => MlsSource::File { primary: None },
        };
        self.state.prompt = None;
        self.state.report = None;
        self.state.viewer_open = false;
        self.state.extracted_data = None;
        self.state.messages.clear();

        let method = self.state.input_method();
        info!(%method, "input method switched");
        method
    }

    // ---- 生成 ----

    /// 生成の前提条件（有効な対象物件 + サーバーIDを持つ比較物件1件以上）
    fn subject_and_comparisons(&self) -> Result<(Subject, Vec<String>)> {
        let subject = match &self.state.source {
            MlsSource::File { primary } => {
                match primary.as_ref().and_then(|p| p.server_file_id.clone()) {
                    Some(id) if !id.is_empty() => Subject::File(id),
                    _ => return Err(MlsCompareError::Validation(MSG_NO_PRIMARY.into())),
                }
            }
            MlsSource::Manual(source) => {
                let missing = source.input.missing_required_fields();
                if !missing.is_empty() {
                    let labels: Vec<&str> = missing.iter().map(|f| f.label()).collect();
                    return Err(MlsCompareError::Validation(format!(
                        "Please fill in the required fields: {}.",
                        labels.join(", ")
                    )));
                }
                Subject::Manual(source.input.clone())
            }
        };

        if self.state.comparisons.is_empty() {
            return Err(MlsCompareError::Validation(MSG_NO_COMPARISONS.into()));
        }
        let ids = self.state.comparison_ids();
        if ids.is_empty() {
            return Err(MlsCompareError::Validation(MSG_NO_VALID_COMPARISONS.into()));
        }

        Ok((subject, ids))
    }

    /// AIプロンプトを生成して表示状態にする
    pub async fn generate_prompt(&mut self) -> Result<String> {
        let (subject, ids) = match self.subject_and_comparisons() {
            Ok(v) => v,
            Err(e) => return self.fail(e, PROMPT_FAILED),
        };

        let result = {
            let _generating = self.activity.begin(Activity::GeneratingPrompt);
            match &subject {
                Subject::File(id) => self.backend.generate_prompt(id, &ids).await,
                Subject::Manual(input) => self.backend.generate_prompt_manual(input, &ids).await,
            }
        };

        let response = match result.and_then(|r| ensure_success(r.success, &r.message).map(|_| r)) {
            Ok(r) => r,
            Err(e) => return self.fail(e, PROMPT_FAILED),
        };

        self.state.prompt = Some(GeneratedPrompt {
            text: response.prompt.clone(),
            visible: true,
        });
        self.succeed("AI prompt generated successfully!");
        Ok(response.prompt)
    }

    /// 表示中のプロンプトを隠す（内容は保持）
    pub fn hide_prompt(&mut self) {
        if let Some(prompt) = self.state.prompt.as_mut() {
            prompt.visible = false;
        }
    }

    /// 分析レポートを生成
    ///
    /// 失敗時は以前のレポートをそのまま残す。
    pub async fn generate_report(&mut self) -> Result<ReportResult> {
        let (subject, ids) = match self.subject_and_comparisons() {
            Ok(v) => v,
            Err(e) => return self.fail(e, REPORT_FAILED),
        };

        let result = {
            let _generating = self.activity.begin(Activity::Generating);
            match &subject {
                Subject::File(id) => self.backend.generate_report(id, &ids).await,
                Subject::Manual(input) => self.backend.generate_report_manual(input, &ids).await,
            }
        };

        let response = match result.and_then(|r| ensure_success(r.success, &r.message).map(|_| r)) {
            Ok(r) => r,
            Err(e) => return self.fail(e, REPORT_FAILED),
        };
        if response.report_id.trim().is_empty() {
            let err = MlsCompareError::Rejected("report response did not include a report id".into());
            return self.fail(err, REPORT_FAILED);
        }

        let report = response.into_result();
        info!(report_id = %report.report_id, "report generated");
        self.state.report = Some(report.clone());
        self.state.viewer_open = false;
        self.succeed("Report generated successfully! You can now download the PDF.");
        Ok(report)
    }

    // ---- 表示・ダウンロード ----

    /// レポートPDFを `dir/property_comparison_<id>.pdf` に保存
    pub async fn download_report(&mut self, dir: &Path) -> Result<PathBuf> {
        let Some(report_id) = self.state.report.as_ref().map(|r| r.report_id.clone()) else {
            return self.fail(MlsCompareError::Validation(MSG_NO_REPORT.into()), DOWNLOAD_FAILED);
        };

        let bytes = match self.backend.download_report(&report_id).await {
            Ok(b) => b,
            Err(e) => return self.fail(e, DOWNLOAD_FAILED),
        };

        let path = dir.join(report_file_name(&report_id));
        let written = match tokio::fs::create_dir_all(dir).await {
            Ok(()) => tokio::fs::write(&path, &bytes).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            return self.fail(e.into(), DOWNLOAD_FAILED);
        }

        debug!(path = %path.display(), bytes = bytes.len(), "report saved");
        self.succeed("Report downloaded successfully!");
        Ok(path)
    }

    /// ビューアーを開き、表示元のURLを返す
    pub fn view_report(&mut self) -> Result<String> {
        let Some(report_id) = self.state.report.as_ref().map(|r| r.report_id.clone()) else {
            return self.fail(MlsCompareError::Validation(MSG_NO_REPORT.into()), "View failed");
        };
        self.state.viewer_open = true;
        Ok(self.backend.view_url(&report_id))
    }

    pub fn close_viewer(&mut self) {
        self.state.viewer_open = false;
    }
}
