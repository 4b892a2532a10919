//! MLS Compare Common Library
//!
//! CLIとクライアントライブラリで共有される型とユーティリティ

pub mod error;
pub mod format;
pub mod pricing;
pub mod types;

pub use error::{Error, Result};
pub use format::{format_file_size, report_file_name};
pub use pricing::{derive_list_price_per_sqft, format_currency, parse_amount};
pub use types::{
    ManualField, ManualPropertyInput, ReportData, ReportResult, UploadedFileRef, PDF_MIME_TYPE,
    REQUIRED_FIELDS,
};
