use thiserror::Error;

#[derive(Error, Debug)]
pub enum MlsCompareError {
    /// ネットワーク呼び出し前に弾かれた入力エラー
    #[error("{0}")]
    Validation(String),

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// 2xx以外のレスポンス（バックエンドの `detail` または汎用メッセージ）
    #[error("{message}")]
    Api { status: u16, message: String },

    /// 2xxだが `success: false` のレスポンス
    #[error("rejected by backend: {0}")]
    Rejected(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Interactive input error: {0}")]
    Prompt(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] mls_compare_common::Error),
}

impl MlsCompareError {
    /// ステータス表示用の1行メッセージ
    ///
    /// 通信失敗やローカルの内部エラーは操作ごとの汎用メッセージに置き換える。
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            MlsCompareError::Validation(msg) => msg.clone(),
            MlsCompareError::Api { message, .. } if !message.trim().is_empty() => message.clone(),
            MlsCompareError::Rejected(msg) if !msg.trim().is_empty() => msg.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, MlsCompareError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, MlsCompareError>;
