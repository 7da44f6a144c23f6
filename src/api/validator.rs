// ==========================================
// 折扣测算系统 - 人工输入校验器
// ==========================================
// 职责: 侧栏数值输入与下拉选择的校验
// 规则: 校验失败不报错，返回 valid=false 及提示文案（可为空）
// ==========================================

use crate::i18n;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 输入框类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Integer,
    Float,
    Text,
}

/// 解析后的输入值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl InputValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            InputValue::Integer(i) => Some(*i as f64),
            InputValue::Float(f) => Some(*f),
            InputValue::Text(_) => None,
        }
    }
}

/// 校验结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputValidation {
    pub valid: bool,
    pub value: Option<InputValue>,
    pub warning: Option<String>,
}

impl InputValidation {
    fn ok(value: InputValue) -> Self {
        Self {
            valid: true,
            value: Some(value),
            warning: None,
        }
    }

    fn rejected(warning: Option<String>) -> Self {
        Self {
            valid: false,
            value: None,
            warning,
        }
    }
}

/// 校验文本输入
///
/// # 参数
/// - text: 原始输入（会先去除首尾空白）
/// - kind: 期望类型
/// - min / max: 数值闭区间（仅数值类型生效）
///
/// # 返回
/// - 数值越界: "Ingrese un número válido entre {min} y {max}." 类提示
/// - 非数字: 数字无效提示；空输入无提示
/// - 文本为空: 必填提示
pub fn validate_numeric(text: &str, kind: InputKind, min: f64, max: f64) -> InputValidation {
    let text = text.trim();

    if kind == InputKind::Text {
        if text.is_empty() {
            return InputValidation::rejected(Some(i18n::t("validacion.campo_vacio")));
        }
        return InputValidation::ok(InputValue::Text(text.to_string()));
    }

    if text.is_empty() {
        return InputValidation::rejected(None);
    }

    let parsed = match kind {
        InputKind::Integer => text.parse::<i64>().ok().map(InputValue::Integer),
        _ => text
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(InputValue::Float),
    };

    let Some(value) = parsed else {
        debug!(input = text, ?kind, "输入不是有效数字");
        return InputValidation::rejected(Some(i18n::t("validacion.numero_invalido")));
    };

    let number = value.as_f64().unwrap_or(f64::NAN);
    if number < min || number > max {
        return InputValidation::rejected(Some(i18n::t_with_args(
            "validacion.fuera_de_rango",
            &[("min", &format_bound(min)), ("max", &format_bound(max))],
        )));
    }

    InputValidation::ok(value)
}

/// 校验下拉选择：值必须是候选项之一（占位文案不算有效选择）
pub fn validate_selection<S: AsRef<str>>(value: Option<&str>, options: &[S]) -> InputValidation {
    match value {
        Some(v) if options.iter().any(|o| o.as_ref() == v) => {
            InputValidation::ok(InputValue::Text(v.to_string()))
        }
        _ => InputValidation::rejected(None),
    }
}

/// 下拉框占位文案
pub fn selection_placeholder() -> String {
    i18n::t("validacion.seleccione")
}

fn format_bound(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
