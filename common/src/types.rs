//! 物件データの型定義
//!
//! CLIとライブラリで共有される型:
//! - UploadedFileRef: アップロード済み（または選択済み）のPDF
//! - ManualPropertyInput: 手入力された物件データ
//! - ReportResult: 生成済みレポートのメタデータ

use crate::error::{Error, Result};
use crate::pricing::derive_list_price_per_sqft;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// PDFのMIMEタイプ
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// 選択されたファイルの記述子
///
/// `server_file_id` はアップロード完了後に設定される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFileRef {
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    #[serde(default)]
    pub server_file_id: Option<String>,
}

impl UploadedFileRef {
    pub fn new(name: impl Into<String>, size: u64, mime_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            server_file_id: None,
        }
    }

    pub fn with_server_id(mut self, id: impl Into<String>) -> Self {
        self.server_file_id = Some(id.into());
        self
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME_TYPE
    }

    pub fn is_uploaded(&self) -> bool {
        self.server_file_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}

/// 手入力の物件データ
///
/// バックエンドのJSONスキーマに合わせてcamelCaseでシリアライズする。
/// 未入力のフィールドは空文字列として送信される。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManualPropertyInput {
    pub address: String,
    pub status: String,
    pub subdivision: String,
    pub year_built: String,
    pub living_sq_ft: String,
    pub total_sq_ft: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub stories: String,
    pub garage_spaces: String,
    pub private_pool: String,
    pub list_price: String,
    pub list_price_per_sq_ft: String,
    pub sold_price: String,
    pub sold_price_per_sq_ft: String,
    pub days_on_market: String,
    pub is_rental: bool,
    pub interior: String,
    pub exterior: String,
    pub public_remarks: String,
}

/// 送信に必須のフィールド
pub const REQUIRED_FIELDS: &[ManualField] = &[
    ManualField::Address,
    ManualField::LivingSqFt,
    ManualField::ListPrice,
];

impl ManualPropertyInput {
    /// JSONファイルから読み込む（`manual-template` の形式）
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// フィールド値を文字列として取得
    pub fn get(&self, field: ManualField) -> String {
        match field {
            ManualField::Address => self.address.clone(),
            ManualField::Status => self.status.clone(),
            ManualField::Subdivision => self.subdivision.clone(),
            ManualField::YearBuilt => self.year_built.clone(),
            ManualField::LivingSqFt => self.living_sq_ft.clone(),
            ManualField::TotalSqFt => self.total_sq_ft.clone(),
            ManualField::Bedrooms => self.bedrooms.clone(),
            ManualField::Bathrooms => self.bathrooms.clone(),
            ManualField::Stories => self.stories.clone(),
            ManualField::GarageSpaces => self.garage_spaces.clone(),
            ManualField::PrivatePool => self.private_pool.clone(),
            ManualField::ListPrice => self.list_price.clone(),
            ManualField::ListPricePerSqFt => self.list_price_per_sq_ft.clone(),
            ManualField::SoldPrice => self.sold_price.clone(),
            ManualField::SoldPricePerSqFt => self.sold_price_per_sq_ft.clone(),
            ManualField::DaysOnMarket => self.days_on_market.clone(),
            ManualField::IsRental => self.is_rental.to_string(),
            ManualField::Interior => self.interior.clone(),
            ManualField::Exterior => self.exterior.clone(),
            ManualField::PublicRemarks => self.public_remarks.clone(),
        }
    }

    /// フィールド値を書き込む
    ///
    /// `isRental` のみ真偽値として解釈する。派生値の再計算は行わない。
    pub fn set(&mut self, field: ManualField, value: &str) -> Result<()> {
        let slot = match field {
            ManualField::IsRental => {
                self.is_rental = parse_bool(value)?;
                return Ok(());
            }
            ManualField::Address => &mut self.address,
            ManualField::Status => &mut self.status,
            ManualField::Subdivision => &mut self.subdivision,
            ManualField::YearBuilt => &mut self.year_built,
            ManualField::LivingSqFt => &mut self.living_sq_ft,
            ManualField::TotalSqFt => &mut self.total_sq_ft,
            ManualField::Bedrooms => &mut self.bedrooms,
            ManualField::Bathrooms => &mut self.bathrooms,
            ManualField::Stories => &mut self.stories,
            ManualField::GarageSpaces => &mut self.garage_spaces,
            ManualField::PrivatePool => &mut self.private_pool,
            ManualField::ListPrice => &mut self.list_price,
            ManualField::ListPricePerSqFt => &mut self.list_price_per_sq_ft,
            ManualField::SoldPrice => &mut self.sold_price,
            ManualField::SoldPricePerSqFt => &mut self.sold_price_per_sq_ft,
            ManualField::DaysOnMarket => &mut self.days_on_market,
            ManualField::Interior => &mut self.interior,
            ManualField::Exterior => &mut self.exterior,
            ManualField::PublicRemarks => &mut self.public_remarks,
        };
        *slot = value.to_string();
        Ok(())
    }

    /// 延床面積と売出価格から平方フィート単価を再計算
    ///
    /// 計算できた場合は `list_price_per_sq_ft` を上書きして `true` を返す。
    pub fn refresh_derived(&mut self) -> bool {
        match derive_list_price_per_sqft(&self.living_sq_ft, &self.list_price) {
            Some(value) => {
                self.list_price_per_sq_ft = value;
                true
            }
            None => false,
        }
    }

    /// 未入力の必須フィールド
    pub fn missing_required_fields(&self) -> Vec<ManualField> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|f| self.get(*f).trim().is_empty())
            .collect()
    }

    pub fn is_submittable(&self) -> bool {
        self.missing_required_fields().is_empty()
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" | "" => Ok(false),
        other => Err(Error::Parse(format!("not a yes/no value: {}", other))),
    }
}

/// 手入力フィールドの識別子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManualField {
    Address,
    Status,
    Subdivision,
    YearBuilt,
    LivingSqFt,
    TotalSqFt,
    Bedrooms,
    Bathrooms,
    Stories,
    GarageSpaces,
    PrivatePool,
    ListPrice,
    ListPricePerSqFt,
    SoldPrice,
    SoldPricePerSqFt,
    DaysOnMarket,
    IsRental,
    Interior,
    Exterior,
    PublicRemarks,
}

impl ManualField {
    /// 入力順
    pub const ALL: [ManualField; 20] = [
        ManualField::Address,
        ManualField::Status,
        ManualField::Subdivision,
        ManualField::YearBuilt,
        ManualField::LivingSqFt,
        ManualField::TotalSqFt,
        ManualField::Bedrooms,
        ManualField::Bathrooms,
        ManualField::Stories,
        ManualField::GarageSpaces,
        ManualField::PrivatePool,
        ManualField::ListPrice,
        ManualField::ListPricePerSqFt,
        ManualField::SoldPrice,
        ManualField::SoldPricePerSqFt,
        ManualField::DaysOnMarket,
        ManualField::IsRental,
        ManualField::Interior,
        ManualField::Exterior,
        ManualField::PublicRemarks,
    ];

    /// JSON上のキー名
    pub fn key(&self) -> &'static str {
        match self {
            ManualField::Address => "address",
            ManualField::Status => "status",
            ManualField::Subdivision => "subdivision",
            ManualField::YearBuilt => "yearBuilt",
            ManualField::LivingSqFt => "livingSqFt",
            ManualField::TotalSqFt => "totalSqFt",
            ManualField::Bedrooms => "bedrooms",
            ManualField::Bathrooms => "bathrooms",
            ManualField::Stories => "stories",
            ManualField::GarageSpaces => "garageSpaces",
            ManualField::PrivatePool => "privatePool",
            ManualField::ListPrice => "listPrice",
            ManualField::ListPricePerSqFt => "listPricePerSqFt",
            ManualField::SoldPrice => "soldPrice",
            ManualField::SoldPricePerSqFt => "soldPricePerSqFt",
            ManualField::DaysOnMarket => "daysOnMarket",
            ManualField::IsRental => "isRental",
            ManualField::Interior => "interior",
            ManualField::Exterior => "exterior",
            ManualField::PublicRemarks => "publicRemarks",
        }
    }

    /// 表示ラベル
    pub fn label(&self) -> &'static str {
        match self {
            ManualField::Address => "Address",
            ManualField::Status => "Status",
            ManualField::Subdivision => "Subdivision",
            ManualField::YearBuilt => "Year Built",
            ManualField::LivingSqFt => "Living Sq Ft",
            ManualField::TotalSqFt => "Total Sq Ft",
            ManualField::Bedrooms => "Bedrooms",
            ManualField::Bathrooms => "Bathrooms",
            ManualField::Stories => "Stories",
            ManualField::GarageSpaces => "Garage Spaces",
            ManualField::PrivatePool => "Private Pool",
            ManualField::ListPrice => "List Price",
            ManualField::ListPricePerSqFt => "List Price / Sq Ft",
            ManualField::SoldPrice => "Sold Price",
            ManualField::SoldPricePerSqFt => "Sold Price / Sq Ft",
            ManualField::DaysOnMarket => "Days on Market",
            ManualField::IsRental => "Rental",
            ManualField::Interior => "Interior Features",
            ManualField::Exterior => "Exterior Features",
            ManualField::PublicRemarks => "Public Remarks",
        }
    }

    pub fn is_required(&self) -> bool {
        REQUIRED_FIELDS.contains(self)
    }

    /// 派生値の再計算が必要なフィールドか
    pub fn feeds_price_per_sqft(&self) -> bool {
        matches!(self, ManualField::LivingSqFt | ManualField::ListPrice)
    }
}

impl fmt::Display for ManualField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for ManualField {
    type Err = Error;

    /// camelCase（`livingSqFt`）とkebab-case（`living-sq-ft`）の両方を受け付ける
    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        ManualField::ALL
            .iter()
            .copied()
            .find(|f| f.key().to_lowercase() == normalized)
            .ok_or_else(|| Error::Parse(format!("unknown field: {}", s)))
    }
}

/// 生成されたレポート本体
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportData {
    pub property_comparison: serde_json::Value,
    pub price_analysis: serde_json::Value,
    pub appraisal_report: Vec<String>,
}

/// レポート生成結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportResult {
    pub report_id: String,
    pub report_url: String,
    pub report_data: ReportData,
    pub graphs_generated: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_input_serializes_camel_case() {
        let input = ManualPropertyInput {
            address: "12 Oak St".to_string(),
            living_sq_ft: "2,500".to_string(),
            is_rental: true,
            ..Default::default()
        };

        let json = serde_json::to_string(&input).expect("シリアライズ失敗");
        assert!(json.contains("\"address\":\"12 Oak St\""));
        assert!(json.contains("\"livingSqFt\":\"2,500\""));
        assert!(json.contains("\"listPricePerSqFt\":\"\""));
        assert!(json.contains("\"isRental\":true"));
    }

    #[test]
    fn test_manual_input_deserialize_partial() {
        let json = r#"{ "address": "9 Elm Ct", "listPrice": "$300,000" }"#;
        let input: ManualPropertyInput = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(input.address, "9 Elm Ct");
        assert_eq!(input.list_price, "$300,000");
        assert_eq!(input.bedrooms, "");
        assert!(!input.is_rental);
    }

    #[test]
    fn test_set_and_get_round_trip_every_field() {
        let mut input = ManualPropertyInput::default();
        for field in ManualField::ALL {
            if field == ManualField::IsRental {
                continue;
            }
            input.set(field, field.key()).unwrap();
            assert_eq!(input.get(field), field.key());
        }
    }

    #[test]
    fn test_set_is_rental() {
        let mut input = ManualPropertyInput::default();
        input.set(ManualField::IsRental, "yes").unwrap();
        assert!(input.is_rental);
        input.set(ManualField::IsRental, "false").unwrap();
        assert!(!input.is_rental);
        assert!(input.set(ManualField::IsRental, "maybe").is_err());
    }

    #[test]
    fn test_missing_required_fields() {
        let mut input = ManualPropertyInput::default();
        assert_eq!(
            input.missing_required_fields(),
            vec![ManualField::Address, ManualField::LivingSqFt, ManualField::ListPrice]
        );

        input.address = "1 Main St".to_string();
        input.living_sq_ft = "  ".to_string();
        input.list_price = "$100".to_string();
        assert_eq!(input.missing_required_fields(), vec![ManualField::LivingSqFt]);
        assert!(!input.is_submittable());

        input.living_sq_ft = "900".to_string();
        assert!(input.is_submittable());
    }

    #[test]
    fn test_refresh_derived() {
        let mut input = ManualPropertyInput {
            living_sq_ft: "2,500".to_string(),
            list_price: "$450,000".to_string(),
            ..Default::default()
        };
        assert!(input.refresh_derived());
        assert_eq!(input.list_price_per_sq_ft, "$180.00");

        input.living_sq_ft = "abc".to_string();
        assert!(!input.refresh_derived());
        assert_eq!(input.list_price_per_sq_ft, "$180.00");
    }

    #[test]
    fn test_manual_field_from_str() {
        assert_eq!("livingSqFt".parse::<ManualField>().unwrap(), ManualField::LivingSqFt);
        assert_eq!("living-sq-ft".parse::<ManualField>().unwrap(), ManualField::LivingSqFt);
        assert_eq!("LIST_PRICE".parse::<ManualField>().unwrap(), ManualField::ListPrice);
        assert!("lotSize".parse::<ManualField>().is_err());
    }

    #[test]
    fn test_uploaded_file_ref() {
        let file = UploadedFileRef::new("comp.pdf", 2048, PDF_MIME_TYPE);
        assert!(file.is_pdf());
        assert!(!file.is_uploaded());

        let file = file.with_server_id("comp_1a2b3c4d");
        assert!(file.is_uploaded());
        assert_eq!(file.server_file_id.as_deref(), Some("comp_1a2b3c4d"));
    }

    #[test]
    fn test_report_result_deserialize() {
        let json = r#"{
            "report_id": "r-1",
            "report_url": "/download-report/r-1",
            "report_data": {
                "property_comparison": {"Address": {"0": "1 Main St"}},
                "price_analysis": {},
                "appraisal_report": ["Estimated value: $420,000"]
            },
            "graphs_generated": ["list_price_vs_sold_price.png"]
        }"#;
        let report: ReportResult = serde_json::from_str(json).expect("デシリアライズ失敗");
        assert_eq!(report.report_id, "r-1");
        assert_eq!(report.report_data.appraisal_report.len(), 1);
        assert_eq!(report.graphs_generated[0], "list_price_vs_sold_price.png");
    }

    #[test]
    fn test_load_manual_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manual.json");
        std::fs::write(&path, r#"{ "address": "12 Oak St", "livingSqFt": "2,500", "isRental": true }"#).unwrap();

        let input = ManualPropertyInput::load(&path).unwrap();
        assert_eq!(input.address, "12 Oak St");
        assert_eq!(input.living_sq_ft, "2,500");
        assert!(input.is_rental);
        assert!(input.list_price.is_empty());
    }

    #[test]
    fn test_load_manual_input_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = ManualPropertyInput::load(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(Error::Io(_))));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ address: ").unwrap();
        assert!(matches!(ManualPropertyInput::load(&broken), Err(Error::Json(_))));
    }
}
