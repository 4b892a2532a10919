use std::path::Path;

const MIME_TABLE: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("json", "application/json"),
    ("doc", "application/msword"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
];

const FALLBACK_MIME: &str = "application/octet-stream";

/// 拡張子からMIMEタイプを決める（大文字小文字は区別しない）
pub fn mime_type_for(path: &Path) -> &'static str {
    let Some(ext) = path.extension() else {
        return FALLBACK_MIME;
    };
    let ext = ext.to_string_lossy().to_lowercase();
    MIME_TABLE
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or(FALLBACK_MIME)
}
