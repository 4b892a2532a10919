//! 表示用フォーマット

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// ファイルサイズを "1.5 KB" 形式に変換（小数2桁、末尾の0は省く）
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

/// ダウンロードしたレポートの保存ファイル名
pub fn report_file_name(report_id: &str) -> String {
    format!("property_comparison_{}.pdf", report_id)
}
