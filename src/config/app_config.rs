// ==========================================
// 折扣测算系统 - 配置结构定义
// ==========================================
// 格式: YAML（serde_yaml）
// 规则: 每个可选配置段都有默认值；未知键忽略
// ==========================================

use crate::domain::types::{columns, DiscountRange, DEFAULT_SEPARATOR};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ==========================================
// 顶层配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub lateral_var: LateralVarConfig,

    #[serde(default)]
    pub df_insumo: InsumoSection,

    #[serde(default)]
    pub cnf_session_keys: SessionKeysConfig,

    /// 用户提示文案覆写（键同 locales 文件）
    #[serde(default)]
    pub cnf_mensajes: HashMap<String, String>,

    #[serde(default)]
    pub cnf_columnas_data: ColumnasDataConfig,

    #[serde(default)]
    pub cnf_concep_herr: ConcepHerrConfig,

    #[serde(default)]
    pub preprocessor: PreprocessorConfig,

    #[serde(default)]
    pub fetch: FetchConfig,
}

// ==========================================
// lateral_var - 侧栏参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LateralVarConfig {
    pub encabezado: String,
    pub seccion_rango_descuento: RangoDescuentoConfig,
    pub seccion_crecimiento: CrecimientoConfig,
}

impl Default for LateralVarConfig {
    fn default() -> Self {
        Self {
            encabezado: "Parámetros".to_string(),
            seccion_rango_descuento: RangoDescuentoConfig::default(),
            seccion_crecimiento: CrecimientoConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangoDescuentoConfig {
    /// 下拉框中的区间标签
    pub list_rng_dctos: Vec<String>,
    /// 标签无法解析时的区间 [lo, hi]
    pub rango_por_defecto: (u32, u32),
}

impl Default for RangoDescuentoConfig {
    fn default() -> Self {
        Self {
            list_rng_dctos: vec![
                "5%-10%".to_string(),
                "11%-15%".to_string(),
                "16%-20%".to_string(),
            ],
            rango_por_defecto: (5, 10),
        }
    }
}

impl RangoDescuentoConfig {
    pub fn default_range(&self) -> DiscountRange {
        DiscountRange::from(self.rango_por_defecto)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrecimientoConfig {
    pub valor_por_defecto: f64,
    pub minimo: f64,
    pub maximo: f64,
}

impl Default for CrecimientoConfig {
    fn default() -> Self {
        Self {
            valor_por_defecto: 0.0,
            minimo: 0.0,
            maximo: 100.0,
        }
    }
}

// ==========================================
// df_insumo - 计算输入列
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsumoSection {
    pub dict_cols: ColumnMapping,
    /// 与场景表关联时从基础表选取的列（须包含 concat_plu_producto）
    pub cols_select: Vec<String>,
}

impl Default for InsumoSection {
    fn default() -> Self {
        Self {
            dict_cols: ColumnMapping::default(),
            cols_select: vec![
                columns::CONCAT_PLU_PRODUCTO.to_string(),
                columns::PLU.to_string(),
                columns::PRODUCTO.to_string(),
                columns::KEY_PROMEDIO_MES_UND.to_string(),
                columns::KEY_PRECIO_VENTA.to_string(),
            ],
        }
    }
}

/// 逻辑字段 → 实际列名
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    #[serde(rename = "Promedio Mes Und", default = "default_promedio_col")]
    pub promedio_mes_und: String,

    #[serde(rename = "Dias de la actividad", default = "default_dias_col")]
    pub dias_actividad: String,

    #[serde(rename = "Precio de venta", default = "default_precio_col")]
    pub precio_venta: String,
}

fn default_promedio_col() -> String {
    columns::KEY_PROMEDIO_MES_UND.to_string()
}

fn default_dias_col() -> String {
    columns::KEY_DIAS_ACTIVIDAD.to_string()
}

fn default_precio_col() -> String {
    columns::KEY_PRECIO_VENTA.to_string()
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            promedio_mes_und: default_promedio_col(),
            dias_actividad: default_dias_col(),
            precio_venta: default_precio_col(),
        }
    }
}

// ==========================================
// cnf_session_keys - 会话键
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionKeysConfig {
    /// 会话启动时写入的键及初始值
    pub inicializacion: BTreeMap<String, InitialValue>,
    /// 登记新场景后重置会话时保留的键
    pub claves_preservar: Vec<String>,
}

impl Default for SessionKeysConfig {
    fn default() -> Self {
        Self {
            inicializacion: BTreeMap::new(),
            claves_preservar: [
                "archivos_cargados",
                "list_materiales",
                "rango_valido",
                "porcentaje_crecimiento",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialValue {
    pub valor_inicial: serde_json::Value,
}

// ==========================================
// cnf_columnas_data / cnf_concep_herr
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnasDataConfig {
    /// 编辑表中的删除勾选列
    pub eliminar_col: String,
}

impl Default for ColumnasDataConfig {
    fn default() -> Self {
        Self {
            eliminar_col: "Eliminar".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConcepHerrConfig {
    pub concepto: Vec<String>,
    pub herramienta: Vec<String>,
}

// ==========================================
// preprocessor - 销量/价格预处理
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessorConfig {
    pub year_col: String,
    pub years: Vec<i64>,
    pub manufacturer_col: String,
    pub excluded_manufacturer: String,
    /// 两个数值度量列（分组后取平均）
    pub measure_cols: Vec<String>,
    pub null_placeholder: String,
    /// 产品编码列，以及用于校正它的参考编码列
    pub id_col: String,
    pub reference_id_col: String,
    /// 分组维度
    pub group_cols: Vec<String>,
    /// 价格参考表
    pub price_key_col: String,
    pub price_col: String,
    pub subline_col: String,
    /// 输出列重命名（原列名 → 业务列名）
    pub rename: Vec<(String, String)>,
    /// 重命名后用于拼接组合键的列
    pub concat_cols: Vec<String>,
    pub separator: String,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            year_col: "anio".to_string(),
            years: vec![2024, 2025],
            manufacturer_col: "fabricante".to_string(),
            excluded_manufacturer: "Otros Oper Cciales".to_string(),
            measure_cols: vec!["unidades".to_string(), "venta".to_string()],
            null_placeholder: "SIN DATO".to_string(),
            id_col: "plu".to_string(),
            reference_id_col: "plu_referencia".to_string(),
            group_cols: [
                "plu",
                "descripcion",
                "fabricante",
                "marca",
                "categoria",
                "subcategoria",
                "linea",
                "segmento",
                "presentacion",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            price_key_col: "plu".to_string(),
            price_col: "precio".to_string(),
            subline_col: "sublinea".to_string(),
            rename: vec![
                ("descripcion".to_string(), columns::PRODUCTO.to_string()),
                (
                    "unidades".to_string(),
                    columns::KEY_PROMEDIO_MES_UND.to_string(),
                ),
                ("venta".to_string(), "Promedio Mes Venta".to_string()),
                ("precio".to_string(), columns::KEY_PRECIO_VENTA.to_string()),
                ("sublinea".to_string(), "Sub Linea".to_string()),
            ],
            concat_cols: vec![columns::PLU.to_string(), columns::PRODUCTO.to_string()],
            separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

// ==========================================
// fetch - 远程数据源
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub url: Option<String>,
    pub ttl_secs: u64,
    pub capacity: usize,
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            url: None,
            ttl_secs: 600,
            capacity: 16,
            timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.preprocessor.group_cols.len(), 9);
        assert_eq!(
            config.lateral_var.seccion_rango_descuento.default_range(),
            DiscountRange::new(5, 10)
        );
    }

    #[test]
    fn test_dict_cols_partial_override() {
        let yaml = r#"
df_insumo:
  dict_cols:
    "Precio de venta": "PVP"
  cols_select: ["concat_plu_producto", "PVP"]
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        let mapping = &config.df_insumo.dict_cols;
        assert_eq!(mapping.precio_venta, "PVP");
        assert_eq!(mapping.promedio_mes_und, columns::KEY_PROMEDIO_MES_UND);
        assert_eq!(config.df_insumo.cols_select.len(), 2);
    }

    #[test]
    fn test_session_keys_initial_values() {
        let yaml = r#"
cnf_session_keys:
  inicializacion:
    archivos_cargados:
      valor_inicial: false
    list_materiales:
      valor_inicial: []
  claves_preservar: ["list_materiales"]
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        let keys = &config.cnf_session_keys;
        assert_eq!(
            keys.inicializacion["archivos_cargados"].valor_inicial,
            serde_json::json!(false)
        );
        assert_eq!(keys.claves_preservar, vec!["list_materiales".to_string()]);
    }
}
