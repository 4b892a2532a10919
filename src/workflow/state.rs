//! ワークフローの状態
//!
//! 状態の変更は `WorkflowController` の遷移メソッド経由のみ。

use mls_compare_common::{ManualPropertyInput, ReportResult, UploadedFileRef};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 対象物件の入力方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMethod {
    #[default]
    File,
    Manual,
}

impl std::fmt::Display for InputMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputMethod::File => write!(f, "file"),
            InputMethod::Manual => write!(f, "manual"),
        }
    }
}

/// 手入力データと派生値のロック状態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualSource {
    pub input: ManualPropertyInput,
    /// `listPricePerSqFt` が自動計算値で、直接編集できない
    pub derived_locked: bool,
}

/// 有効なMLSデータの出所（常にどちらか一方）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MlsSource {
    File { primary: Option<UploadedFileRef> },
    Manual(ManualSource),
}

impl Default for MlsSource {
    fn default() -> Self {
        MlsSource::File { primary: None }
    }
}

impl MlsSource {
    pub fn method(&self) -> InputMethod {
        match self {
            MlsSource::File { .. } => InputMethod::File,
            MlsSource::Manual(_) => InputMethod::Manual,
        }
    }

    pub fn primary(&self) -> Option<&UploadedFileRef> {
        match self {
            MlsSource::File { primary } => primary.as_ref(),
            MlsSource::Manual(_) => None,
        }
    }

    pub fn manual(&self) -> Option<&ManualPropertyInput> {
        match self {
            MlsSource::File { .. } => None,
            MlsSource::Manual(source) => Some(&source.input),
        }
    }
}

/// 生成済みAIプロンプト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPrompt {
    pub text: String,
    pub visible: bool,
}

/// 実行中フラグのスナップショット
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InFlight {
    pub uploading: bool,
    pub generating: bool,
    pub generating_prompt: bool,
}

/// 処理の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Activity {
    Uploading,
    Generating,
    GeneratingPrompt,
}

#[derive(Debug, Default)]
struct ActivityFlags {
    uploading: AtomicBool,
    generating: AtomicBool,
    generating_prompt: AtomicBool,
}

/// 実行中フラグの共有ハンドル
///
/// 処理中のFutureがコントローラーを借用している間も、
/// クローンしたハンドルから状態を読める。
#[derive(Debug, Clone, Default)]
pub struct ActivityMonitor {
    flags: Arc<ActivityFlags>,
}

impl ActivityMonitor {
    pub fn snapshot(&self) -> InFlight {
        InFlight {
            uploading: self.flags.uploading.load(Ordering::SeqCst),
            generating: self.flags.generating.load(Ordering::SeqCst),
            generating_prompt: self.flags.generating_prompt.load(Ordering::SeqCst),
        }
    }

    /// フラグを立て、ガードが破棄されると下ろす
    pub(crate) fn begin(&self, activity: Activity) -> InFlightGuard<'_> {
        let flag = match activity {
            Activity::Uploading => &self.flags.uploading,
            Activity::Generating => &self.flags.generating,
            Activity::GeneratingPrompt => &self.flags.generating_prompt,
        };
        flag.store(true, Ordering::SeqCst);
        InFlightGuard { flag }
    }
}

/// 現在のステータスメッセージ（種類ごとに1つ）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusMessages {
    pub error: Option<String>,
    pub warning: Option<String>,
    pub success: Option<String>,
}

impl StatusMessages {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.error.is_none() && self.warning.is_none() && self.success.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowState {
    pub source: MlsSource,
    pub comparisons: Vec<UploadedFileRef>,
    pub report: Option<ReportResult>,
    pub prompt: Option<GeneratedPrompt>,
    pub viewer_open: bool,
    pub messages: StatusMessages,
    /// 物件種別の不一致時にバックエンドが返した抽出データ
    pub extracted_data: Option<Map<String, Value>>,
}

impl WorkflowState {
    pub fn input_method(&self) -> InputMethod {
        self.source.method()
    }

    pub fn prompt_visible(&self) -> bool {
        self.prompt.as_ref().is_some_and(|p| p.visible)
    }

    /// サーバーIDを持つ比較物件ID（入力順）
    pub fn comparison_ids(&self) -> Vec<String> {
        self.comparisons
            .iter()
            .filter_map(|f| f.server_file_id.clone())
            .filter(|id| !id.is_empty())
            .collect()
    }
}

/// スコープを抜けると（Futureが破棄された場合も）フラグを下ろす
pub(crate) struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
