// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时文件、测试配置、测试数据生成
// ==========================================
#![allow(dead_code)]

use chrono::NaiveDate;
use discount_planner::domain::{DiscountScenario, EventWindow};
use std::io::Write;
use tempfile::NamedTempFile;

/// 基础数据 CSV: 两个产品
pub const BASE_CSV: &str = "\
plu,producto,Promedio Mes Und,Precio de venta,Dias de la actividad
1001,Arroz,300,1000,10
1002,Frijol,600,2500,15
";

/// 测试配置: 区间选项、增长上下限、概念/工具选项
pub const CONFIG_YAML: &str = r#"
lateral_var:
  seccion_rango_descuento:
    list_rng_dctos: ["5%-10%", "11%-15%"]
    rango_por_defecto: [5, 10]
  seccion_crecimiento:
    minimo: 0
    maximo: 50
df_insumo:
  cols_select:
    - concat_plu_producto
    - Promedio Mes Und
    - Precio de venta
cnf_concep_herr:
  concepto: ["Aniversario"]
  herramienta: ["Encarte", "Digital"]
cnf_mensajes:
  registro_exitoso: "Material registrado"
"#;

/// 写入带后缀的临时文件（解析器按后缀分派格式）
///
/// # 返回
/// - NamedTempFile: 临时文件（需要保持存活）
pub fn write_temp_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("Invalid test date")
}

/// 带活动窗口的场景
pub fn scenario_with_window(
    material: &str,
    rango: u32,
    inicio: NaiveDate,
    fin: NaiveDate,
) -> DiscountScenario {
    DiscountScenario::new(material, rango)
        .expect("Invalid test scenario")
        .with_herramienta("Encarte")
        .with_concepto("Aniversario")
        .with_ventana(EventWindow::new(inicio, fin).expect("Invalid test window"))
}
