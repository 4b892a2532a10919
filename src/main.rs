use clap::Parser;
use indicatif::ProgressBar;
use mls_compare::{cli, config, error, manual_prompt, scanner};
use mls_compare::api::{types::ensure_success, ApiClient, ReportBackend};
use mls_compare::workflow::WorkflowController;
use mls_compare_common::{format_file_size, report_file_name, ManualPropertyInput};
use cli::{Cli, Commands, FilesAction};
use config::Config;
use error::{MlsCompareError, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("✖ {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    config.apply_overrides(cli.base_url, cli.token);

    match cli.command {
        Commands::Run {
            mls,
            manual,
            interactive,
            set,
            comparisons,
            comparisons_dir,
            prompt,
            prompt_out,
            download,
            view,
        } => {
            println!("🏠 mls-compare - 物件比較レポート\n");

            let client = ApiClient::from_config(&config)?;
            let mut controller = WorkflowController::new(client);
            let total = if prompt { 4 } else { 3 };

            // 1. 対象物件
            println!("[1/{}] 対象物件を準備中...", total);
            if let Some(path) = mls {
                let file = scanner::load_file(&path)?;
                println!("  {} ({})", file.name, format_file_size(file.size));
                let uploaded = with_spinner("MLSレポートをアップロード中...", controller.select_primary_file(file)).await;
                flush_messages(&mut controller);
                uploaded?;
            } else if manual.is_some() || interactive || !set.is_empty() {
                controller.toggle_input_method();
                if let Some(path) = manual {
                    controller.set_manual_input(ManualPropertyInput::load(&path)?)?;
                    println!("✔ 手入力データを読み込み: {}", path.display());
                }
                for entry in &set {
                    let (field, value) = cli::parse_field_assignment(entry)?;
                    controller.update_manual_field(field, &value)?;
                }
                if interactive {
                    manual_prompt::run_interactive_manual(&mut controller)?;
                    println!("✔ 手入力データを設定");
                }
            } else {
                return Err(MlsCompareError::Validation(
                    "Specify --mls <pdf>, --manual <json>, --set FIELD=VALUE or --interactive.".into(),
                ));
            }
            flush_messages(&mut controller);
            println!();

            // 2. 比較物件
            println!("[2/{}] 比較物件をアップロード中...", total);
            let mut paths = comparisons;
            if let Some(dir) = comparisons_dir {
                paths.extend(scanner::scan_folder(&dir)?);
            }
            let files = scanner::load_files(&paths)?;
            let uploaded = with_spinner(
                &format!("{}件をアップロード中...", files.len()),
                controller.select_comparison_files(files),
            )
            .await;
            // 除外の警告は失敗時も出す
            flush_messages(&mut controller);
            for file in &uploaded? {
                println!("  {} ({})", file.name, format_file_size(file.size));
            }
            println!();

            // 3. AIプロンプト（任意）
            let mut step = 3;
            if prompt {
                println!("[{}/{}] AIプロンプトを生成中...", step, total);
                let text = with_spinner("プロンプト生成中...", controller.generate_prompt()).await;
                flush_messages(&mut controller);
                let text = text?;
                match prompt_out {
                    Some(path) => {
                        tokio::fs::write(&path, &text).await?;
                        println!("  保存: {}", path.display());
                    }
                    None => println!("{}", text),
                }
                println!();
                step += 1;
            }

            // 4. レポート生成
            println!("[{}/{}] レポートを生成中...", step, total);
            let report = with_spinner("レポート生成中...", controller.generate_report()).await;
            flush_messages(&mut controller);
            let report = report?;
            println!("  レポートID: {}", report.report_id);
            if !report.report_url.is_empty() {
                println!("  URL: {}", report.report_url);
            }
            if !report.graphs_generated.is_empty() {
                println!("  グラフ: {}", report.graphs_generated.join(", "));
            }
            if !report.report_data.appraisal_report.is_empty() {
                println!("  査定コメント: {}行", report.report_data.appraisal_report.len());
            }

            if let Some(dir) = download {
                let path = with_spinner("ダウンロード中...", controller.download_report(&dir)).await;
                flush_messages(&mut controller);
                println!("  保存: {}", path?.display());
            }

            if view {
                let url = controller.view_report()?;
                println!("  表示: {}", url);
            }

            println!("\n✅ 完了");
        }

        Commands::Download { report_id, output } => {
            let client = ApiClient::from_config(&config)?;
            let dir = output
                .or_else(|| config.download_dir.clone())
                .unwrap_or_else(|| PathBuf::from("."));
            let bytes = with_spinner("ダウンロード中...", client.download_report(&report_id)).await?;
            let path = save_report(&dir, &report_id, &bytes).await?;
            println!("✔ 保存しました: {} ({})", path.display(), format_file_size(bytes.len() as u64));
        }

        Commands::View { report_id } => {
            let client = ApiClient::from_config(&config)?;
            println!("{}", client.view_url(&report_id));
        }

        Commands::Files { action } => {
            let client = ApiClient::from_config(&config)?;
            match action {
                FilesAction::List => {
                    let listing = with_spinner("取得中...", client.list_files()).await?;
                    println!("{}", serde_json::to_string_pretty(&listing)?);
                }
                FilesAction::Delete { file_id } => {
                    let response = with_spinner("削除中...", client.delete_file(&file_id)).await?;
                    ensure_success(response.success, &response.message)?;
                    println!("✔ 削除しました: {}", file_id);
                }
            }
        }

        Commands::ManualTemplate { output } => {
            let json = serde_json::to_string_pretty(&ManualPropertyInput::default())?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, json).await?;
                    println!("✔ 雛形を保存: {}", path.display());
                }
                None => println!("{}", json),
            }
        }

        Commands::Config { set_token, set_base_url, show } => {
            if let Some(token) = set_token {
                config.set_token(token)?;
                println!("✔ トークンを設定しました");
            }

            if let Some(url) = set_base_url {
                config.set_base_url(url)?;
                println!("✔ バックエンドURLを設定しました");
            }

            if show {
                println!("設定:");
                println!("  パス: {}", Config::config_path()?.display());
                println!("  バックエンド: {}", config.base_url);
                println!("  トークン: {}", config.masked_token());
                println!("  タイムアウト: {}秒 (接続 {}秒)", config.timeout_seconds, config.connect_timeout_seconds);
                if let Some(dir) = &config.download_dir {
                    println!("  保存先: {}", dir.display());
                }
            }
        }
    }

    Ok(())
}

/// スピナーを出しながら待つ。Ctrl+Cで中断すると Future を破棄する
async fn with_spinner<T>(message: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));

    let out = tokio::select! {
        out = fut => out,
        _ = tokio::signal::ctrl_c() => Err(MlsCompareError::Cancelled),
    };

    spinner.finish_and_clear();
    out
}

/// 警告・成功メッセージを表示して消す
fn flush_messages<B: ReportBackend>(controller: &mut WorkflowController<B>) {
    for line in cli::notice_lines(&controller.state().messages) {
        println!("{}", line);
    }
    controller.clear_messages();
}

async fn save_report(dir: &Path, report_id: &str, bytes: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(report_file_name(report_id));
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}
