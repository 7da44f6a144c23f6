// ==========================================
// 折扣测算系统 - 活动窗口与折扣场景
// ==========================================
// 职责: 活动起止日期校验、天数/月份派生；折扣场景登记记录
// 约束: fecha_fin >= fecha_inicio，否则无法构造活动窗口
// ==========================================

use crate::domain::table::{CellValue, Table, TableResult};
use crate::domain::types::{columns, mes_es};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    #[error("结束日期 {fin} 不能早于开始日期 {inicio}")]
    InvalidWindow { inicio: NaiveDate, fin: NaiveDate },

    #[error("折扣百分比 {0} 超出 0-100")]
    RangoOutOfBounds(u32),

    #[error("组合键为空")]
    EmptyMaterial,
}

// ==========================================
// EventWindow - 活动窗口
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWindow {
    fecha_inicio: NaiveDate,
    fecha_fin: NaiveDate,
}

impl EventWindow {
    pub fn new(fecha_inicio: NaiveDate, fecha_fin: NaiveDate) -> Result<Self, ScenarioError> {
        if fecha_fin < fecha_inicio {
            return Err(ScenarioError::InvalidWindow {
                inicio: fecha_inicio,
                fin: fecha_fin,
            });
        }
        Ok(Self {
            fecha_inicio,
            fecha_fin,
        })
    }

    pub fn fecha_inicio(&self) -> NaiveDate {
        self.fecha_inicio
    }

    pub fn fecha_fin(&self) -> NaiveDate {
        self.fecha_fin
    }

    /// 含首尾的天数
    pub fn dias(&self) -> i64 {
        (self.fecha_fin - self.fecha_inicio).num_days() + 1
    }

    /// 开始日期所在月份（西语）
    pub fn mes(&self) -> &'static str {
        mes_es(self.fecha_inicio.month()).unwrap_or("")
    }
}

// ==========================================
// DiscountScenario - 折扣场景
// ==========================================
// 登记时把活动窗口展平到记录顶层（fecha_inicio / fecha_fin / mes）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountScenario {
    pub concat_plu_producto: String,
    pub rango: u32,
    #[serde(default)]
    pub herramienta: String,
    #[serde(default)]
    pub concepto: String,
    pub ventana: Option<EventWindow>,
}

impl DiscountScenario {
    pub fn new(concat_plu_producto: impl Into<String>, rango: u32) -> Result<Self, ScenarioError> {
        let material = concat_plu_producto.into();
        if material.trim().is_empty() {
            return Err(ScenarioError::EmptyMaterial);
        }
        if rango > 100 {
            return Err(ScenarioError::RangoOutOfBounds(rango));
        }
        Ok(Self {
            concat_plu_producto: material,
            rango,
            herramienta: String::new(),
            concepto: String::new(),
            ventana: None,
        })
    }

    pub fn with_herramienta(mut self, herramienta: impl Into<String>) -> Self {
        self.herramienta = herramienta.into();
        self
    }

    pub fn with_concepto(mut self, concepto: impl Into<String>) -> Self {
        self.concepto = concepto.into();
        self
    }

    pub fn with_ventana(mut self, ventana: EventWindow) -> Self {
        self.ventana = Some(ventana);
        self
    }

    /// 场景表列顺序
    pub fn table_columns() -> [&'static str; 7] {
        [
            columns::CONCAT_PLU_PRODUCTO,
            columns::RANGO,
            columns::HERRAMIENTA,
            columns::CONCEPTO,
            columns::FECHA_INICIO,
            columns::FECHA_FIN,
            columns::MES,
        ]
    }

    fn to_row(&self) -> Vec<CellValue> {
        let (inicio, fin, mes) = match &self.ventana {
            Some(v) => (
                CellValue::text(v.fecha_inicio().format("%Y-%m-%d").to_string()),
                CellValue::text(v.fecha_fin().format("%Y-%m-%d").to_string()),
                CellValue::text(v.mes()),
            ),
            None => (CellValue::Null, CellValue::Null, CellValue::Null),
        };
        vec![
            CellValue::text(self.concat_plu_producto.clone()),
            CellValue::Int(self.rango as i64),
            CellValue::text(self.herramienta.clone()),
            CellValue::text(self.concepto.clone()),
            inicio,
            fin,
            mes,
        ]
    }
}

/// 已登记场景 → 表格（左表，后续与价格/销量表关联）
pub fn scenarios_to_table(scenarios: &[DiscountScenario]) -> TableResult<Table> {
    let rows = scenarios.iter().map(DiscountScenario::to_row).collect();
    Table::from_rows(DiscountScenario::table_columns(), rows)
}
