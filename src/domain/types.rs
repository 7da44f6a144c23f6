// ==========================================
// 折扣测算系统 - 领域类型定义
// ==========================================
// 职责: 计算结果列名、折扣区间、月份名称等公共类型
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 列名常量
// ==========================================
// 计算列名称固定，输入列名称经 dict_cols 映射
pub mod columns {
    pub const PLU: &str = "plu";
    pub const PRODUCTO: &str = "producto";
    pub const CONCAT_PLU_PRODUCTO: &str = "concat_plu_producto";

    pub const FECHA_INICIO: &str = "fecha_inicio";
    pub const FECHA_FIN: &str = "fecha_fin";
    pub const MES: &str = "mes";
    pub const RANGO: &str = "rango";
    pub const HERRAMIENTA: &str = "Herramienta";
    pub const CONCEPTO: &str = "Concepto";

    pub const UNIDADES: &str = "Unidades";
    pub const CREC_ACTIVIDAD: &str = "Crec actividad";
    pub const UNIDADES_TOTALES: &str = "unidades_totales";
    pub const VENTA_ACTIVIDAD: &str = "Venta de la actividad";
    pub const RANGO_PCT: &str = "rango%";
    pub const COSTO_DESCUENTO: &str = "Costo del descuento";

    /// dict_cols 逻辑字段名
    pub const KEY_PROMEDIO_MES_UND: &str = "Promedio Mes Und";
    pub const KEY_DIAS_ACTIVIDAD: &str = "Dias de la actividad";
    pub const KEY_PRECIO_VENTA: &str = "Precio de venta";
}

/// 一个月按 30 天折算
pub const DIAS_MES: f64 = 30.0;

/// 组合键默认分隔符
pub const DEFAULT_SEPARATOR: &str = " : ";

// ==========================================
// 折扣区间 (Discount Range)
// ==========================================
// 闭区间 [lo, hi]，单位: 百分比整数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountRange {
    pub lo: u32,
    pub hi: u32,
}

impl DiscountRange {
    pub const fn new(lo: u32, hi: u32) -> Self {
        Self { lo, hi }
    }

    pub fn contains(&self, value: u32) -> bool {
        self.lo <= value && value <= self.hi
    }
}

impl Default for DiscountRange {
    fn default() -> Self {
        Self::new(5, 10)
    }
}

impl From<(u32, u32)> for DiscountRange {
    fn from((lo, hi): (u32, u32)) -> Self {
        Self::new(lo, hi)
    }
}

impl fmt::Display for DiscountRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%-{}%", self.lo, self.hi)
    }
}

// ==========================================
// 月份名称（西语）
// ==========================================
const MESES: [(&str, &str); 12] = [
    ("January", "Enero"),
    ("February", "Febrero"),
    ("March", "Marzo"),
    ("April", "Abril"),
    ("May", "Mayo"),
    ("June", "Junio"),
    ("July", "Julio"),
    ("August", "Agosto"),
    ("September", "Septiembre"),
    ("October", "Octubre"),
    ("November", "Noviembre"),
    ("December", "Diciembre"),
];

/// 月份序号 (1-12) → 西语月份名
pub fn mes_es(month: u32) -> Option<&'static str> {
    MESES.get(month.checked_sub(1)? as usize).map(|(_, es)| *es)
}

/// 英文月份名 → 西语月份名（大小写不敏感）
pub fn translate_month(english: &str) -> Option<&'static str> {
    let needle = english.trim();
    MESES
        .iter()
        .find(|(en, _)| en.eq_ignore_ascii_case(needle))
        .map(|(_, es)| *es)
}
