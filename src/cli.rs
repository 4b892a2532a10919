use crate::error::{MlsCompareError, Result};
use crate::workflow::StatusMessages;
use clap::{Parser, Subcommand};
use mls_compare_common::ManualField;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mls-compare")]
#[command(about = "MLSレポート比較・物件分析レポート生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// バックエンドのURL（設定ファイル・環境変数より優先）
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// 認証トークン（設定ファイル・環境変数より優先）
    #[arg(long, global = true)]
    pub token: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// アップロードからレポート生成まで一括実行
    Run {
        /// 対象物件のMLSレポートPDF
        #[arg(long, conflicts_with_all = ["manual", "interactive", "set"])]
        mls: Option<PathBuf>,

        /// 手入力データ（JSON、`manual-template` で雛形を出力）
        #[arg(long)]
        manual: Option<PathBuf>,

        /// 手入力データを対話式で入力
        #[arg(short, long)]
        interactive: bool,

        /// 手入力フィールドを個別に指定（例: --set living-sq-ft=2500）
        #[arg(long, value_name = "FIELD=VALUE")]
        set: Vec<String>,

        /// 比較物件PDF（複数指定可、指定順に送信）
        #[arg(short, long, num_args = 1..)]
        comparisons: Vec<PathBuf>,

        /// 比較物件PDFを含むフォルダ（直下のみ）
        #[arg(long)]
        comparisons_dir: Option<PathBuf>,

        /// AIプロンプトも生成する
        #[arg(long)]
        prompt: bool,

        /// AIプロンプトの保存先（省略時は標準出力）
        #[arg(long, requires = "prompt")]
        prompt_out: Option<PathBuf>,

        /// レポートPDFの保存先フォルダ
        #[arg(short, long)]
        download: Option<PathBuf>,

        /// レポートの表示URLを出力
        #[arg(long)]
        view: bool,
    },

    /// 生成済みレポートPDFをダウンロード
    Download {
        /// レポートID
        #[arg(required = true)]
        report_id: String,

        /// 保存先フォルダ（デフォルト: 設定の download_dir またはカレント）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// レポートの表示URLを出力
    View {
        /// レポートID
        #[arg(required = true)]
        report_id: String,
    },

    /// バックエンド上のアップロード済みファイル
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },

    /// 空の手入力データJSONを出力
    ManualTemplate {
        /// 出力ファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 設定
    Config {
        /// 認証トークンを設定
        #[arg(long)]
        set_token: Option<String>,

        /// バックエンドのURLを設定
        #[arg(long)]
        set_base_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
pub enum FilesAction {
    /// 一覧を表示
    List,
    /// ファイルを削除
    Delete {
        #[arg(required = true)]
        file_id: String,
    },
}

/// `field=value` 形式の指定を分解
pub fn parse_field_assignment(entry: &str) -> Result<(ManualField, String)> {
    let (name, value) = entry
        .split_once('=')
        .ok_or_else(|| MlsCompareError::Validation(format!("expected FIELD=VALUE, got: {}", entry)))?;
    let field = name.trim().parse::<ManualField>()?;
    Ok((field, value.trim().to_string()))
}

/// 警告・成功メッセージの表示行（エラーは呼び出し側が出す）
pub fn notice_lines(messages: &StatusMessages) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(warning) = &messages.warning {
        lines.push(format!("⚠ {}", warning));
    }
    if let Some(success) = &messages.success {
        lines.push(format!("✔ {}", success));
    }
    lines
}
