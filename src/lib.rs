//! MLS Compare
//!
//! MLSレポートPDF（または手入力データ）と比較物件PDFをバックエンドに送り、
//! 物件比較レポートを生成・取得するクライアントライブラリ

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod manual_prompt;
pub mod scanner;
pub mod workflow;
