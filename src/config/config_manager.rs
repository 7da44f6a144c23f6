// ==========================================
// 折扣测算系统 - 配置管理器
// ==========================================
// 职责: 配置加载、合并、查询
// 来源: 受保护的基础配置 YAML + 可选的用户覆写 YAML
// 合并: 覆写文件的顶层配置段整体替换基础配置的同名段
// ==========================================

use crate::config::app_config::{AppConfig, ColumnMapping, PreprocessorConfig};
use crate::config::error::{ConfigError, ConfigResult};
use crate::config::insumo_config_trait::InsumoConfigReader;
use crate::domain::types::DiscountRange;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// 用户覆写文件名
pub const EDITABLE_FILE_NAME: &str = "editable.yml";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: AppConfig,
}

impl ConfigManager {
    /// 直接使用已构造的配置（测试 / 内置默认）
    pub fn from_config(config: AppConfig) -> Self {
        Self { config }
    }

    /// 加载基础配置并合并用户覆写
    ///
    /// # 参数
    /// - base_path: 基础配置路径（缺失为致命错误）
    /// - overlay_path: 用户覆写路径（缺失时记录警告并继续）
    pub fn load(base_path: &Path, overlay_path: Option<&Path>) -> ConfigResult<Self> {
        if !base_path.exists() {
            return Err(ConfigError::NotFound(base_path.display().to_string()));
        }
        let mut merged = read_mapping(base_path)?;

        if let Some(overlay_path) = overlay_path {
            if overlay_path.exists() {
                let overlay = read_mapping(overlay_path)?;
                let replaced = overlay.len();
                for (key, value) in overlay {
                    merged.insert(key, value);
                }
                info!(overlay = %overlay_path.display(), sections = replaced, "已合并用户覆写配置");
            } else {
                warn!(
                    overlay = %overlay_path.display(),
                    "未找到用户覆写配置文件，继续使用基础配置"
                );
            }
        }

        let config: AppConfig =
            serde_yaml::from_value(Value::Mapping(merged)).map_err(|e| ConfigError::ParseError {
                path: base_path.display().to_string(),
                message: e.to_string(),
            })?;

        info!(base = %base_path.display(), "配置加载完成");
        Ok(Self { config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 用户提示文案（配置覆写优先，其次 locales）
    pub fn message(&self, key: &str) -> String {
        self.config
            .cnf_mensajes
            .get(key)
            .cloned()
            .unwrap_or_else(|| crate::i18n::t(&format!("mensajes.{}", key)))
    }
}

/// 读取 YAML 顶层映射；空文件视为空映射
fn read_mapping(path: &Path) -> ConfigResult<Mapping> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let value: Value = serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(ConfigError::InvalidStructure(format!(
            "{} 顶层必须是映射",
            path.display()
        ))),
    }
}

/// 默认用户覆写路径
///
/// # 返回
/// - 环境变量 DISCOUNT_PLANNER_EDITABLE 指定的路径
/// - 否则: 用户配置目录/discount-planner/editable.yml
/// - 无法获取配置目录时: ./editable.yml
pub fn default_overlay_path() -> PathBuf {
    if let Ok(path) = std::env::var("DISCOUNT_PLANNER_EDITABLE") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    dirs::config_dir()
        .map(|dir| dir.join("discount-planner").join(EDITABLE_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(EDITABLE_FILE_NAME))
}

// ==========================================
// InsumoConfigReader 实现
// ==========================================
impl InsumoConfigReader for ConfigManager {
    fn column_mapping(&self) -> ConfigResult<ColumnMapping> {
        Ok(self.config.df_insumo.dict_cols.clone())
    }

    fn insumo_columns(&self) -> ConfigResult<Vec<String>> {
        let cols = &self.config.df_insumo.cols_select;
        if cols.is_empty() {
            return Err(ConfigError::MissingKey("df_insumo.cols_select".to_string()));
        }
        Ok(cols.clone())
    }

    fn default_range(&self) -> ConfigResult<DiscountRange> {
        Ok(self
            .config
            .lateral_var
            .seccion_rango_descuento
            .default_range())
    }

    fn growth_bounds(&self) -> ConfigResult<(f64, f64)> {
        let crec = &self.config.lateral_var.seccion_crecimiento;
        if crec.minimo > crec.maximo {
            return Err(ConfigError::InvalidStructure(format!(
                "seccion_crecimiento: minimo {} > maximo {}",
                crec.minimo, crec.maximo
            )));
        }
        Ok((crec.minimo, crec.maximo))
    }

    fn preprocessor(&self) -> ConfigResult<PreprocessorConfig> {
        Ok(self.config.preprocessor.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn yaml_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    const BASE: &str = r#"
lateral_var:
  seccion_crecimiento:
    minimo: 0
    maximo: 50
df_insumo:
  cols_select: ["concat_plu_producto", "Promedio Mes Und", "Precio de venta"]
cnf_mensajes:
  sin_insumos: "Cargue un archivo"
"#;

    #[test]
    fn test_load_base_only() {
        let base = yaml_file(BASE);
        let manager = ConfigManager::load(base.path(), None).unwrap();

        assert_eq!(manager.growth_bounds().unwrap(), (0.0, 50.0));
        assert_eq!(manager.insumo_columns().unwrap().len(), 3);
        assert_eq!(manager.message("sin_insumos"), "Cargue un archivo");
    }

    #[test]
    fn test_missing_base_is_fatal() {
        let result = ConfigManager::load(Path::new("no_such_config.yml"), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_missing_overlay_continues() {
        let base = yaml_file(BASE);
        let manager =
            ConfigManager::load(base.path(), Some(Path::new("no_such_editable.yml"))).unwrap();
        assert_eq!(manager.growth_bounds().unwrap(), (0.0, 50.0));
    }

    #[test]
    fn test_overlay_replaces_whole_section() {
        let base = yaml_file(BASE);
        let overlay = yaml_file(
            r#"
lateral_var:
  seccion_crecimiento:
    maximo: 80
"#,
        );
        let manager = ConfigManager::load(base.path(), Some(overlay.path())).unwrap();

        // minimo 回到默认值: 整段替换，不做深度合并
        assert_eq!(manager.growth_bounds().unwrap(), (0.0, 80.0));
        // 未覆写的段保持不变
        assert_eq!(manager.insumo_columns().unwrap().len(), 3);
    }

    #[test]
    fn test_empty_overlay_file() {
        let base = yaml_file(BASE);
        let overlay = yaml_file("");
        let manager = ConfigManager::load(base.path(), Some(overlay.path())).unwrap();
        assert_eq!(manager.growth_bounds().unwrap(), (0.0, 50.0));
    }

    #[test]
    fn test_non_mapping_root_rejected() {
        let base = yaml_file("- a\n- b\n");
        let result = ConfigManager::load(base.path(), None);
        assert!(matches!(result, Err(ConfigError::InvalidStructure(_))));
    }

    #[test]
    fn test_growth_bounds_inverted() {
        let mut config = AppConfig::default();
        config.lateral_var.seccion_crecimiento.minimo = 10.0;
        config.lateral_var.seccion_crecimiento.maximo = 5.0;
        let manager = ConfigManager::from_config(config);
        assert!(manager.growth_bounds().is_err());
    }
}
