// ==========================================
// 折扣测算系统 - 折扣区间解析
// ==========================================
// 输入: 区间标签文本（如 "5%-10%"）
// 输出: 前两个数字组成的区间；数字不足两个时返回默认区间
// ==========================================

use crate::domain::types::DiscountRange;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

fn digits() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"\d+").expect("Invalid regex pattern"))
}

pub struct RangeParser {
    default: DiscountRange,
}

impl Default for RangeParser {
    fn default() -> Self {
        Self::new(DiscountRange::default())
    }
}

impl RangeParser {
    pub fn new(default: DiscountRange) -> Self {
        Self { default }
    }

    pub fn default_range(&self) -> DiscountRange {
        self.default
    }

    /// 提取前两个整数；超出 u32 的数字按解析失败处理
    pub fn parse(&self, text: &str) -> DiscountRange {
        let numbers: Option<Vec<u32>> = digits()
            .find_iter(text)
            .take(2)
            .map(|m| m.as_str().parse::<u32>().ok())
            .collect();

        match numbers.as_deref() {
            Some([lo, hi]) => DiscountRange::new(*lo, *hi),
            _ => {
                debug!(text, default = %self.default, "区间文本无法解析，使用默认区间");
                self.default
            }
        }
    }
}

/// 区间内全部整数选项（lo > hi 时为空）
pub fn discount_options(range: DiscountRange) -> Vec<u32> {
    (range.lo..=range.hi).collect()
}

/// 选项标签 "N%"
pub fn discount_labels(range: DiscountRange) -> Vec<String> {
    discount_options(range)
        .into_iter()
        .map(|n| format!("{}%", n))
        .collect()
}
