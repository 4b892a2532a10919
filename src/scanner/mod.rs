mod mime;

pub use mime::mime_type_for;

use crate::error::{MlsCompareError, Result};
use mls_compare_common::UploadedFileRef;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// アップロード前のローカルファイル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl LocalFile {
    /// メモリ上のデータから作成（テストやパイプ入力用）
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from(&name),
            size: bytes.len() as u64,
            name,
            mime_type: mime_type.into(),
            bytes,
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == mls_compare_common::PDF_MIME_TYPE
    }

    /// サーバーIDを持たない記述子
    pub fn to_ref(&self) -> UploadedFileRef {
        UploadedFileRef::new(&self.name, self.size, &self.mime_type)
    }
}

/// ファイルを読み込む
pub fn load_file(path: &Path) -> Result<LocalFile> {
    if !path.is_file() {
        return Err(MlsCompareError::FileNotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(LocalFile {
        path: path.to_path_buf(),
        name,
        size: bytes.len() as u64,
        mime_type: mime_type_for(path).to_string(),
        bytes,
    })
}

/// 複数ファイルを順番通りに読み込む
pub fn load_files(paths: &[PathBuf]) -> Result<Vec<LocalFile>> {
    paths.iter().map(|p| load_file(p)).collect()
}

/// フォルダ直下のファイルを列挙（PDF以外も含む）
///
/// PDFの選別はワークフロー側で行い、除外した件数を警告として出す。
pub fn scan_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(MlsCompareError::FolderNotFound(folder.display().to_string()));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(1) // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file())
        .filter(|p| !is_hidden(p))
        .collect();

    // ファイル名でソート
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}
