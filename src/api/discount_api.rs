// ==========================================
// 折扣测算系统 - 折扣测算 API
// ==========================================
// 职责: 串联导入 → 会话 → 计算 → 汇总 → 导出
// 调用方: CLI（main.rs）及集成测试
// ==========================================

use std::path::Path;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{validate_numeric, validate_selection, InputKind};
use crate::config::config_manager::ConfigManager;
use crate::config::insumo_config_trait::InsumoConfigReader;
use crate::domain::scenario::DiscountScenario;
use crate::domain::table::{CellValue, Table};
use crate::domain::types::{columns, DiscountRange};
use crate::engine::aggregator::{sum_columns, Totals};
use crate::engine::concat::concat_columns;
use crate::engine::insumo::{InsumoProcessor, PipelineOptions};
use crate::engine::preprocessor::SalesPreprocessor;
use crate::engine::range_parser::{discount_options, RangeParser};
use crate::engine::table_ops;
use crate::exporter;
use crate::fetch::source::RemoteSource;
use crate::i18n;
use crate::importer::file_parser::UniversalFileParser;
use crate::session::{DiscountSession, SessionError};

/// 汇总的默认列
pub const SUMMARY_COLUMNS: [&str; 2] = [columns::VENTA_ACTIVIDAD, columns::COSTO_DESCUENTO];

// ==========================================
// DiscountApi - 折扣测算 API
// ==========================================
pub struct DiscountApi {
    config: Arc<ConfigManager>,
    session: DiscountSession,
    options: PipelineOptions,
}

impl DiscountApi {
    /// 创建 API 实例
    ///
    /// # 参数
    /// - config: 已合并的配置
    pub fn new(config: Arc<ConfigManager>) -> ApiResult<Self> {
        let range_parser = RangeParser::new(config.default_range()?);
        let session = DiscountSession::new(&config.config().cnf_session_keys, range_parser);
        Ok(Self {
            config,
            session,
            options: PipelineOptions::default(),
        })
    }

    /// 设置流程选项（无活动窗口时关闭天数计算）
    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn config(&self) -> &ConfigManager {
        &self.config
    }

    pub fn session(&self) -> &DiscountSession {
        &self.session
    }

    /// 用户提示文案
    pub fn message(&self, key: &str) -> String {
        self.config.message(key)
    }

    // ==========================================
    // 载入基础数据
    // ==========================================

    /// 从文件载入（CSV / XLSX）
    pub fn load_file(&mut self, path: &Path) -> ApiResult<usize> {
        if !path.exists() {
            return Err(ApiError::NotFound(i18n::t_with_args(
                "importacion.archivo_no_encontrado",
                &[("path", &path.display().to_string())],
            )));
        }
        let table = self.upload_parser()?.parse(path)?;
        self.load_table(table)
    }

    /// 从内存缓冲区载入（name 决定格式）
    pub fn load_upload(&mut self, name: &str, bytes: &[u8]) -> ApiResult<usize> {
        let table = self.upload_parser()?.parse_upload(name, bytes)?;
        self.load_table(table)
    }

    /// 从远程数据源载入
    pub async fn load_remote<S: RemoteSource + ?Sized>(
        &mut self,
        source: &S,
        url: &str,
    ) -> ApiResult<usize> {
        let table = source.fetch_table(url).await?;
        self.load_table(table)
    }

    /// 载入已解析的表；缺少组合键列时按 plu + producto 生成
    #[instrument(skip(self, table), fields(rows = table.len()))]
    pub fn load_table(&mut self, table: Table) -> ApiResult<usize> {
        if table.is_empty() {
            return Err(ApiError::InvalidInput(self.message("sin_insumos")));
        }

        let table = if table.has_column(columns::CONCAT_PLU_PRODUCTO) {
            table
        } else {
            let separator = self.config.config().preprocessor.separator.clone();
            concat_columns(
                &table,
                &[columns::PLU, columns::PRODUCTO],
                columns::CONCAT_PLU_PRODUCTO,
                Some(separator.as_str()),
            )?
        };

        let rows = table.len();
        self.session.load_base(table);
        Ok(rows)
    }

    /// XLSX 只读取计算所需列（组合键列在载入后生成）
    fn upload_parser(&self) -> ApiResult<UniversalFileParser> {
        let cols: Vec<String> = self
            .projected_columns()?
            .into_iter()
            .filter(|c| c != columns::CONCAT_PLU_PRODUCTO)
            .collect();
        Ok(UniversalFileParser::with_excel_columns(cols))
    }

    /// 基础表参与计算的列；不计算天数时追加天数列
    fn projected_columns(&self) -> ApiResult<Vec<String>> {
        let mut cols = self.config.insumo_columns()?;
        if !self.options.compute_days {
            let dias = self.config.column_mapping()?.dias_actividad;
            if !cols.contains(&dias) {
                cols.push(dias);
            }
        }
        Ok(cols)
    }

    /// 销量 + 价格文件预处理（结果可直接作为基础数据）
    pub fn preprocess_files(&self, sales_path: &Path, prices_path: &Path) -> ApiResult<Table> {
        let parser = UniversalFileParser::new();
        let sales = parser.parse(sales_path)?;
        let prices = parser.parse(prices_path)?;
        let preprocessor = SalesPreprocessor::from_reader(self.config.as_ref())?;
        Ok(preprocessor.process(&sales, &prices)?)
    }

    // ==========================================
    // 侧栏参数
    // ==========================================

    pub fn range_labels(&self) -> &[String] {
        &self
            .config
            .config()
            .lateral_var
            .seccion_rango_descuento
            .list_rng_dctos
    }

    /// 选择区间标签（须为配置中的选项）
    pub fn select_range(&mut self, label: &str) -> ApiResult<DiscountRange> {
        let check = validate_selection(Some(label), self.range_labels());
        if !check.valid {
            return Err(ApiError::InvalidInput(format!(
                "{}: {}",
                i18n::t("validacion.seleccione"),
                label
            )));
        }
        Ok(self.session.confirm_range(label)?)
    }

    /// 当前区间内可选的折扣百分比
    pub fn discount_options(&self) -> ApiResult<Vec<u32>> {
        Ok(discount_options(self.session.valid_range()?))
    }

    /// 确认增长百分比（文本输入，按配置上下限校验）
    pub fn set_growth(&mut self, text: &str) -> ApiResult<f64> {
        let (min, max) = self.config.growth_bounds()?;
        let check = validate_numeric(text, InputKind::Float, min, max);
        let value = match (check.valid, check.value.and_then(|v| v.as_f64())) {
            (true, Some(v)) => v,
            _ => {
                let warning = check
                    .warning
                    .unwrap_or_else(|| i18n::t("validacion.numero_invalido"));
                return Err(ApiError::InvalidInput(warning));
            }
        };
        self.session.confirm_growth(value)?;
        Ok(value)
    }

    /// 基础数据中的可选产品（组合键）
    pub fn materials(&self) -> ApiResult<Vec<String>> {
        let base = self.base()?;
        Ok(base.unique_values(columns::CONCAT_PLU_PRODUCTO)?)
    }

    // ==========================================
    // 场景登记 / 编辑
    // ==========================================

    /// 登记场景，返回成功提示
    pub fn register(&mut self, scenario: DiscountScenario) -> ApiResult<String> {
        let materials = self.materials()?;
        if !materials.contains(&scenario.concat_plu_producto) {
            return Err(ApiError::NotFound(scenario.concat_plu_producto));
        }

        let options = &self.config.config().cnf_concep_herr;
        for (value, allowed) in [
            (&scenario.herramienta, &options.herramienta),
            (&scenario.concepto, &options.concepto),
        ] {
            if !allowed.is_empty()
                && !value.is_empty()
                && !validate_selection(Some(value.as_str()), allowed).valid
            {
                return Err(ApiError::InvalidInput(value.clone()));
            }
        }

        self.session.register(scenario)?;
        Ok(self.message("registro_exitoso"))
    }

    pub fn scenarios(&self) -> ApiResult<Vec<DiscountScenario>> {
        Ok(self.session.scenarios()?)
    }

    /// 编辑表: 场景表 + 删除勾选列
    pub fn editor_table(&self) -> ApiResult<Table> {
        let mut table = self.session.scenarios_table()?;
        let eliminar = &self.config.config().cnf_columnas_data.eliminar_col;
        table.set_column(eliminar, vec![CellValue::Int(0); table.len()])?;
        Ok(table)
    }

    /// 应用编辑表: 勾选删除的行被移除，其余行的折扣按表中值更新
    ///
    /// # 返回
    /// - 提示文案（有删除时为删除成功，否则为编辑成功）
    pub fn apply_edits(&mut self, edited: &Table) -> ApiResult<String> {
        let eliminar = &self.config.config().cnf_columnas_data.eliminar_col;
        let current = self.session.scenarios()?;
        if edited.len() != current.len() {
            return Err(ApiError::InvalidInput(format!(
                "编辑表行数 {} 与已登记场景数 {} 不一致",
                edited.len(),
                current.len()
            )));
        }

        let range = self.session.valid_range()?;
        let mut kept = Vec::with_capacity(current.len());
        let mut removed = 0;
        for (i, mut scenario) in current.into_iter().enumerate() {
            if is_checked(edited.value(i, eliminar)?) {
                removed += 1;
                continue;
            }
            let cell = edited.value(i, columns::RANGO)?;
            if !cell.is_null() {
                let rango = cell
                    .as_i64()
                    .and_then(|v| u32::try_from(v).ok())
                    .ok_or_else(|| {
                        ApiError::InvalidInput(format!(
                            "{} ({}: {})",
                            i18n::t("validacion.numero_invalido"),
                            columns::RANGO,
                            cell
                        ))
                    })?;
                if !range.contains(rango) {
                    return Err(SessionError::RangoFueraDeRango { rango, range }.into());
                }
                scenario.rango = rango;
            }
            kept.push(scenario);
        }

        self.session.replace_scenarios(kept)?;
        if removed > 0 {
            info!(removed, "已删除勾选的场景");
            Ok(self.message("eliminacion_exitosa"))
        } else {
            Ok(self.message("edicion_exitosa"))
        }
    }

    // ==========================================
    // 计算 / 汇总 / 导出
    // ==========================================

    /// 场景表左关联基础数据后执行计算流程
    #[instrument(skip(self))]
    pub fn compute(&self) -> ApiResult<Table> {
        let base = self.base()?;
        let scenarios = self.session.scenarios()?;
        if scenarios.is_empty() {
            return Err(ApiError::NoScenarios);
        }
        let growth = self
            .session
            .growth_pct()?
            .ok_or(ApiError::GrowthNotConfirmed)?;

        let right = table_ops::select(base, &self.projected_columns()?)?;
        let left = self.session.scenarios_table()?;
        let insumo = table_ops::left_join(&left, &right, &[columns::CONCAT_PLU_PRODUCTO])?;
        if insumo.len() != left.len() {
            warn!(
                scenarios = left.len(),
                rows = insumo.len(),
                "基础数据组合键重复，关联后行数增加"
            );
        }

        let processor = InsumoProcessor::from_reader(self.config.as_ref())?.with_options(self.options);
        Ok(processor.process(&insumo, growth)?)
    }

    /// 活动销售额与折扣成本合计
    pub fn summary(&self, result: &Table) -> ApiResult<Totals> {
        Ok(sum_columns(result, &SUMMARY_COLUMNS)?)
    }

    /// 按扩展名导出（.xlsx / .csv）
    pub fn export(&self, result: &Table, path: &Path) -> ApiResult<()> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "xlsx" => exporter::export_xlsx(result, path)?,
            "csv" => exporter::export_csv(result, path)?,
            other => {
                return Err(ApiError::InvalidInput(i18n::t_with_args(
                    "importacion.formato_no_soportado",
                    &[("ext", other)],
                )))
            }
        }
        info!(path = %path.display(), "计算结果已导出");
        Ok(())
    }

    fn base(&self) -> ApiResult<&Table> {
        self.session.base().map_err(|e| match e {
            SessionError::NoBaseTable => ApiError::NoBaseLoaded,
            other => other.into(),
        })
    }
}

/// 删除勾选: 非零数字或 true/x/si
fn is_checked(cell: &CellValue) -> bool {
    match cell {
        CellValue::Int(i) => *i != 0,
        CellValue::Float(f) => *f != 0.0,
        CellValue::Text(s) => matches!(
            s.trim().to_lowercase().as_str(),
            "true" | "x" | "si" | "sí" | "1"
        ),
        CellValue::Null => false,
    }
}
