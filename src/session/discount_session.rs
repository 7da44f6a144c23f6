// ==========================================
// 折扣测算系统 - 折扣测算会话
// ==========================================
// 流程: 载入基础表 → 确认折扣区间 → 确认增长百分比
//       → 登记场景（可编辑/删除）→ 计算
// 状态: 场景列表、区间、增长值存于 SessionContext，便于按配置重置
// ==========================================

use crate::config::app_config::SessionKeysConfig;
use crate::domain::scenario::{scenarios_to_table, DiscountScenario};
use crate::domain::table::{Table, TableError};
use crate::domain::types::DiscountRange;
use crate::engine::range_parser::RangeParser;
use crate::session::context::SessionContext;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

// ==========================================
// 会话键
// ==========================================
pub mod keys {
    pub const ARCHIVOS_CARGADOS: &str = "archivos_cargados";
    pub const LIST_MATERIALES: &str = "list_materiales";
    pub const RANGO_VALIDO: &str = "rango_valido";
    pub const PORCENTAJE_CRECIMIENTO: &str = "porcentaje_crecimiento";
    pub const REGISTRO_CONFIRMADO: &str = "registro_confirmado";
    pub const EDICION_CONFIRMADA: &str = "edicion_confirmada";
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("折扣 {rango}% 不在已确认区间 {range} 内")]
    RangoFueraDeRango { rango: u32, range: DiscountRange },

    #[error("场景序号越界: {index}（共 {len} 条）")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("尚未载入基础数据")]
    NoBaseTable,

    #[error("会话状态损坏 ({key}): {message}")]
    CorruptState { key: String, message: String },

    #[error(transparent)]
    Table(#[from] TableError),
}

pub type SessionResult<T> = Result<T, SessionError>;

// ==========================================
// DiscountSession
// ==========================================
pub struct DiscountSession {
    context: SessionContext,
    preserved: Vec<String>,
    range_parser: RangeParser,
    base: Option<Table>,
}

impl DiscountSession {
    pub fn new(key_config: &SessionKeysConfig, range_parser: RangeParser) -> Self {
        let mut context = SessionContext::from_config(key_config);
        context.init_if_absent(keys::ARCHIVOS_CARGADOS, json!(false));
        context.init_if_absent(keys::LIST_MATERIALES, json!([]));

        // 场景列表总是跨重置保留
        let mut preserved = key_config.claves_preservar.clone();
        if !preserved.iter().any(|k| k == keys::LIST_MATERIALES) {
            preserved.push(keys::LIST_MATERIALES.to_string());
        }

        Self {
            context,
            preserved,
            range_parser,
            base: None,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SessionContext {
        &mut self.context
    }

    // ==========================================
    // 基础数据
    // ==========================================

    pub fn load_base(&mut self, table: Table) {
        info!(rows = table.len(), "基础数据已载入");
        self.base = Some(table);
        self.context.set(keys::ARCHIVOS_CARGADOS, json!(true));
    }

    pub fn base(&self) -> SessionResult<&Table> {
        self.base.as_ref().ok_or(SessionError::NoBaseTable)
    }

    // ==========================================
    // 区间 / 增长
    // ==========================================

    /// 解析并确认区间标签
    pub fn confirm_range(&mut self, label: &str) -> SessionResult<DiscountRange> {
        let range = self.range_parser.parse(label);
        self.store(keys::RANGO_VALIDO, &range)?;
        debug!(label, range = %range, "折扣区间已确认");
        Ok(range)
    }

    /// 已确认的区间；未确认时为解析器默认区间
    pub fn valid_range(&self) -> SessionResult<DiscountRange> {
        Ok(self
            .load::<DiscountRange>(keys::RANGO_VALIDO)?
            .unwrap_or_else(|| self.range_parser.default_range()))
    }

    pub fn confirm_growth(&mut self, pct: f64) -> SessionResult<()> {
        self.store(keys::PORCENTAJE_CRECIMIENTO, &pct)
    }

    pub fn growth_pct(&self) -> SessionResult<Option<f64>> {
        self.load(keys::PORCENTAJE_CRECIMIENTO)
    }

    // ==========================================
    // 场景登记
    // ==========================================

    pub fn scenarios(&self) -> SessionResult<Vec<DiscountScenario>> {
        Ok(self.load(keys::LIST_MATERIALES)?.unwrap_or_default())
    }

    /// 登记场景；折扣须落在已确认区间内。登记后按配置重置会话
    pub fn register(&mut self, scenario: DiscountScenario) -> SessionResult<usize> {
        let range = self.valid_range()?;
        if !range.contains(scenario.rango) {
            return Err(SessionError::RangoFueraDeRango {
                rango: scenario.rango,
                range,
            });
        }

        let mut scenarios = self.scenarios()?;
        info!(material = %scenario.concat_plu_producto, rango = scenario.rango, "登记折扣场景");
        scenarios.push(scenario);
        self.store(keys::LIST_MATERIALES, &scenarios)?;

        self.context.reset_except(&self.preserved);
        self.context.set_many([
            (keys::REGISTRO_CONFIRMADO, json!(true)),
            (keys::EDICION_CONFIRMADA, json!(false)),
        ]);
        Ok(scenarios.len())
    }

    pub fn remove_scenario(&mut self, index: usize) -> SessionResult<DiscountScenario> {
        let mut scenarios = self.scenarios()?;
        if index >= scenarios.len() {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: scenarios.len(),
            });
        }
        let removed = scenarios.remove(index);
        self.store(keys::LIST_MATERIALES, &scenarios)?;
        Ok(removed)
    }

    /// 批量删除（编辑表中勾选删除的行）
    pub fn remove_scenarios(&mut self, indexes: &[usize]) -> SessionResult<usize> {
        let scenarios = self.scenarios()?;
        if let Some(&bad) = indexes.iter().find(|&&i| i >= scenarios.len()) {
            return Err(SessionError::IndexOutOfRange {
                index: bad,
                len: scenarios.len(),
            });
        }
        let kept: Vec<DiscountScenario> = scenarios
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !indexes.contains(i))
            .map(|(_, s)| s)
            .collect();
        self.store(keys::LIST_MATERIALES, &kept)?;
        Ok(kept.len())
    }

    /// 编辑确认后整体替换场景列表
    pub fn replace_scenarios(&mut self, scenarios: Vec<DiscountScenario>) -> SessionResult<()> {
        self.store(keys::LIST_MATERIALES, &scenarios)?;
        self.context.set(keys::EDICION_CONFIRMADA, json!(true));
        Ok(())
    }

    pub fn scenarios_table(&self) -> SessionResult<Table> {
        Ok(scenarios_to_table(&self.scenarios()?)?)
    }

    // ==========================================
    // 内部: JSON 存取
    // ==========================================

    fn store<T: serde::Serialize>(&mut self, key: &str, value: &T) -> SessionResult<()> {
        self.context
            .set_as(key, value)
            .map_err(|e| SessionError::CorruptState {
                key: key.to_string(),
                message: e.to_string(),
            })
    }

    fn load<T: serde::de::DeserializeOwned>(&self, key: &str) -> SessionResult<Option<T>> {
        self.context
            .get_as(key)
            .map_err(|e| SessionError::CorruptState {
                key: key.to_string(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> DiscountSession {
        DiscountSession::new(&SessionKeysConfig::default(), RangeParser::default())
    }

    fn scenario(material: &str, rango: u32) -> DiscountScenario {
        DiscountScenario::new(material, rango).unwrap()
    }

    #[test]
    fn test_range_defaults_until_confirmed() {
        let mut s = session();
        assert_eq!(s.valid_range().unwrap(), DiscountRange::new(5, 10));
        s.confirm_range("11%-15%").unwrap();
        assert_eq!(s.valid_range().unwrap(), DiscountRange::new(11, 15));
    }

    #[test]
    fn test_register_validates_range() {
        let mut s = session();
        s.confirm_range("5%-10%").unwrap();

        assert_eq!(s.register(scenario("1001 : Arroz", 7)).unwrap(), 1);
        let err = s.register(scenario("1002 : Frijol", 20)).unwrap_err();
        assert!(matches!(err, SessionError::RangoFueraDeRango { rango: 20, .. }));
        assert_eq!(s.scenarios().unwrap().len(), 1);
    }

    #[test]
    fn test_register_resets_transient_keys() {
        let mut s = session();
        s.context_mut().set("selector_material", json!("1001 : Arroz"));
        s.confirm_growth(10.0).unwrap();

        s.register(scenario("1001 : Arroz", 5)).unwrap();

        assert!(!s.context().contains("selector_material"));
        assert_eq!(s.growth_pct().unwrap(), Some(10.0));
        assert!(s.context().flag(keys::REGISTRO_CONFIRMADO));
    }

    #[test]
    fn test_list_preserved_even_if_not_configured() {
        let key_config = SessionKeysConfig {
            claves_preservar: vec![],
            ..SessionKeysConfig::default()
        };
        let mut s = DiscountSession::new(&key_config, RangeParser::default());
        s.register(scenario("1001 : Arroz", 5)).unwrap();
        s.register(scenario("1002 : Frijol", 6)).unwrap();
        assert_eq!(s.scenarios().unwrap().len(), 2);
    }

    #[test]
    fn test_remove_and_replace() {
        let mut s = session();
        for (m, r) in [("a", 5), ("b", 6), ("c", 7)] {
            s.register(scenario(m, r)).unwrap();
        }

        let removed = s.remove_scenario(1).unwrap();
        assert_eq!(removed.concat_plu_producto, "b");
        assert!(matches!(
            s.remove_scenario(5),
            Err(SessionError::IndexOutOfRange { index: 5, len: 2 })
        ));

        assert_eq!(s.remove_scenarios(&[0]).unwrap(), 1);
        s.replace_scenarios(vec![scenario("z", 9)]).unwrap();
        let table = s.scenarios_table().unwrap();
        assert_eq!(table.len(), 1);
        assert!(s.context().flag(keys::EDICION_CONFIRMADA));
    }

    #[test]
    fn test_base_table_required() {
        let mut s = session();
        assert!(matches!(s.base(), Err(SessionError::NoBaseTable)));
        assert!(!s.context().flag(keys::ARCHIVOS_CARGADOS));
        s.load_base(Table::new(["plu"]));
        assert!(s.base().is_ok());
        assert!(s.context().flag(keys::ARCHIVOS_CARGADOS));
    }
}
