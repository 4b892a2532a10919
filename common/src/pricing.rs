//! 価格・面積の数値処理
//!
//! 入力欄の文字列（"$450,000" や "2,500 sqft"）から数値を取り出し、
//! 売出価格の平方フィート単価を算出する。

use regex::Regex;

/// 通貨記号・桁区切り・単位を取り除いて数値に変換
///
/// 数字・小数点・マイナス記号以外はすべて除去する。
pub fn parse_amount(text: &str) -> Option<f64> {
    lazy_static::lazy_static! {
        static ref NON_NUMERIC_RE: Regex = Regex::new(r"[^0-9.\-]").unwrap();
    }

    let cleaned = NON_NUMERIC_RE.replace_all(text.trim(), "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 売出価格 ÷ 延床面積 を "$123.45" 形式で返す
///
/// どちらかが空・数値でない・面積が0以下の場合は `None`。
pub fn derive_list_price_per_sqft(sqft: &str, price: &str) -> Option<String> {
    let sqft = parse_amount(sqft)?;
    let price = parse_amount(price)?;
    if sqft <= 0.0 {
        return None;
    }
    Some(format_currency(price / sqft))
}

/// ドル表記（小数2桁）
pub fn format_currency(value: f64) -> String {
    format!("${:.2}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$450,000"), Some(450000.0));
        assert_eq!(parse_amount("2,500"), Some(2500.0));
        assert_eq!(parse_amount("2,500 sqft"), Some(2500.0));
        assert_eq!(parse_amount(" 1234.5 "), Some(1234.5));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("N/A"), None);
        assert_eq!(parse_amount("1.2.3"), None);
    }

    #[test]
    fn test_derive_list_price_per_sqft() {
        assert_eq!(
            derive_list_price_per_sqft("2,500", "$450,000"),
            Some("$180.00".to_string())
        );
        assert_eq!(
            derive_list_price_per_sqft("1,800", "$399,900"),
            Some("$222.17".to_string())
        );
    }

    #[test]
    fn test_derive_requires_both_fields() {
        assert_eq!(derive_list_price_per_sqft("", "$450,000"), None);
        assert_eq!(derive_list_price_per_sqft("2,500", ""), None);
        assert_eq!(derive_list_price_per_sqft("abc", "$450,000"), None);
    }

    #[test]
    fn test_derive_rejects_zero_area() {
        assert_eq!(derive_list_price_per_sqft("0", "$450,000"), None);
        assert_eq!(derive_list_price_per_sqft("-10", "$450,000"), None);
    }
}
