//! 対話式の物件データ手入力
//!
//! 各フィールドを順に尋ねる。空Enterで現在の値を維持、`-` で消去。
//! 延床面積と売出価格がそろうと単価を自動計算し、その項目は尋ねない。

use crate::api::ReportBackend;
use crate::error::{MlsCompareError, Result};
use crate::workflow::{InputMethod, MlsSource, WorkflowController};
use dialoguer::Input;
use mls_compare_common::ManualField;

/// 1フィールドへの回答
#[derive(Debug, PartialEq, Eq)]
pub enum Answer {
    /// 現在の値のまま
    Keep,
    /// 空にする
    Clear,
    Set(String),
}

/// 入力文字列を回答として解釈
pub fn interpret_answer(input: &str) -> Answer {
    match input.trim() {
        "" => Answer::Keep,
        "-" => Answer::Clear,
        value => Answer::Set(value.to_string()),
    }
}

/// プロンプト表示用のラベル（必須項目には `*`）
pub fn prompt_label(field: ManualField) -> String {
    if field.is_required() {
        format!("{} *", field.label())
    } else {
        field.label().to_string()
    }
}

/// 手入力モードで全フィールドを対話式に入力
///
/// 必須項目がそろうまで未入力の必須項目を繰り返し尋ねる。
pub fn run_interactive_manual<B: ReportBackend>(controller: &mut WorkflowController<B>) -> Result<()> {
    if controller.state().input_method() != InputMethod::Manual {
        controller.toggle_input_method();
    }

    println!("物件データを入力してください（* は必須、Enterで維持、- で消去）");
    println!("---");

    for field in ManualField::ALL {
        ask_field(controller, field)?;
    }

    loop {
        let missing = match controller.state().source.manual() {
            Some(input) => input.missing_required_fields(),
            None => return Ok(()),
        };
        if missing.is_empty() {
            break;
        }
        println!("\n必須項目が未入力です");
        for field in missing {
            ask_field(controller, field)?;
        }
    }

    println!("---\n");
    Ok(())
}

fn derived_locked<B: ReportBackend>(controller: &WorkflowController<B>) -> bool {
    matches!(&controller.state().source, MlsSource::Manual(source) if source.derived_locked)
}

fn current_value<B: ReportBackend>(controller: &WorkflowController<B>, field: ManualField) -> String {
    controller
        .state()
        .source
        .manual()
        .map(|input| input.get(field))
        .unwrap_or_default()
}

/// 1フィールドを尋ねる（不正な値なら再入力）
fn ask_field<B: ReportBackend>(controller: &mut WorkflowController<B>, field: ManualField) -> Result<()> {
    if field == ManualField::ListPricePerSqFt && derived_locked(controller) {
        println!("  {}: {} (自動計算)", field.label(), current_value(controller, field));
        return Ok(());
    }

    loop {
        let current = current_value(controller, field);
        let mut prompt = Input::<String>::new()
            .with_prompt(prompt_label(field))
            .allow_empty(true);
        if !current.is_empty() && field != ManualField::IsRental {
            prompt = prompt.with_initial_text(current.clone());
        }
        let raw = prompt
            .interact_text()
            .map_err(|e| MlsCompareError::Prompt(e.to_string()))?;

        let value = match interpret_answer(&raw) {
            Answer::Keep => return Ok(()),
            Answer::Clear => String::new(),
            Answer::Set(v) => v,
        };
        if value == current {
            return Ok(());
        }

        match controller.update_manual_field(field, &value) {
            Ok(()) => {
                if field.feeds_price_per_sqft() && derived_locked(controller) {
                    println!(
                        "  → {}: {}",
                        ManualField::ListPricePerSqFt.label(),
                        current_value(controller, ManualField::ListPricePerSqFt)
                    );
                }
                controller.clear_messages();
                return Ok(());
            }
            Err(e) => {
                println!("  ✖ {}", e);
                controller.clear_messages();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpret_answer() {
        assert_eq!(interpret_answer(""), Answer::Keep);
        assert_eq!(interpret_answer("   "), Answer::Keep);
        assert_eq!(interpret_answer("-"), Answer::Clear);
        assert_eq!(interpret_answer(" 123 Main St "), Answer::Set("123 Main St".into()));
    }

    #[test]
    fn test_negative_number_is_a_value() {
        assert_eq!(interpret_answer("-5"), Answer::Set("-5".into()));
    }

    #[test]
    fn test_prompt_label_marks_required() {
        assert_eq!(
            prompt_label(ManualField::Address),
            format!("{} *", ManualField::Address.label())
        );
        assert_eq!(prompt_label(ManualField::Bedrooms), ManualField::Bedrooms.label());
    }
}
