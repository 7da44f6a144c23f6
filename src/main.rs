// ==========================================
// 折扣测算系统 - 命令行入口
// ==========================================
// 子命令: calcular / preprocesar / rangos / resumen
// ==========================================

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use discount_planner::api::{DiscountApi, SUMMARY_COLUMNS};
use discount_planner::config::{default_overlay_path, ConfigManager, InsumoConfigReader};
use discount_planner::domain::{DiscountScenario, EventWindow};
use discount_planner::engine::{discount_labels, sum_columns, PipelineOptions, RangeParser, Totals};
use discount_planner::fetch::{CachePolicy, CachedSource, HttpJsonSource};
use discount_planner::importer::UniversalFileParser;
use discount_planner::{i18n, logging, APP_NAME, VERSION};

#[derive(Parser)]
#[command(name = "discount-planner")]
#[command(about = "Planificador de descuentos - cálculo de unidades, venta y costo de actividades", long_about = None)]
struct Cli {
    /// 基础配置文件
    #[arg(short, long, global = true, default_value = "config/config.yml")]
    config: PathBuf,

    /// 用户覆写配置（默认: 用户配置目录下的 editable.yml）
    #[arg(long, global = true)]
    editable: Option<PathBuf>,

    /// 界面语言（es / en）
    #[arg(long, global = true, default_value = "es")]
    idioma: String,

    /// 日志详细程度（-v debug，-vv trace）
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// 以 JSON 行输出日志
    #[arg(long, global = true)]
    json_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 登记场景并计算活动件数、销售额与折扣成本
    Calcular {
        /// 基础数据文件（.csv / .xlsx）
        #[arg(short, long)]
        insumos: Option<PathBuf>,

        /// 远程基础数据地址（JSON 行数据，替代 --insumos）
        #[arg(long)]
        url: Option<String>,

        /// 场景列表（YAML 或 JSON）
        #[arg(short, long)]
        escenarios: PathBuf,

        /// 折扣区间标签，如 "5%-10%"
        #[arg(short, long)]
        rango: String,

        /// 增长百分比
        #[arg(long, default_value = "0")]
        crecimiento: String,

        /// 不按活动窗口计算天数，使用基础数据中的天数列
        #[arg(long)]
        sin_fechas: bool,

        /// 结果输出文件（.xlsx / .csv）
        #[arg(short, long)]
        salida: Option<PathBuf>,
    },
    /// 销量 + 价格文件预处理为基础数据
    Preprocesar {
        #[arg(long)]
        ventas: PathBuf,

        #[arg(long)]
        precios: PathBuf,

        #[arg(short, long)]
        salida: PathBuf,
    },
    /// 列出折扣区间及可选折扣
    Rangos {
        /// 只解析这个标签
        #[arg(long)]
        etiqueta: Option<String>,
    },
    /// 汇总结果文件中的销售额与折扣成本
    Resumen {
        #[arg(short, long)]
        archivo: PathBuf,

        /// 汇总列（默认: 销售额与折扣成本）
        #[arg(long, num_args = 1..)]
        columnas: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    logging::init_with_default(level, cli.json_log);
    i18n::set_locale(&cli.idioma);

    info!("{} v{}", APP_NAME, VERSION);

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let overlay = cli.editable.clone().unwrap_or_else(default_overlay_path);

    match cli.command {
        Commands::Calcular {
            insumos,
            url,
            escenarios,
            rango,
            crecimiento,
            sin_fechas,
            salida,
        } => {
            let config = Arc::new(load_config(&cli.config, &overlay)?);
            let options = PipelineOptions {
                compute_days: !sin_fechas,
            };
            let mut api = DiscountApi::new(config.clone())?.with_options(options);

            match (url.or_else(|| config.config().fetch.url.clone()), insumos) {
                (_, Some(path)) => {
                    api.load_file(&path)?;
                }
                (Some(url), None) => {
                    let source = HttpJsonSource::from_config(&config.config().fetch)?;
                    let policy = CachePolicy::from_config(&config.config().fetch)?;
                    let cached = CachedSource::new(source, policy);
                    let runtime = tokio::runtime::Runtime::new()?;
                    runtime.block_on(api.load_remote(&cached, &url))?;
                }
                (None, None) => bail!("{}", api.message("sin_insumos")),
            }

            api.select_range(&rango)?;
            for scenario in read_scenarios(&escenarios)? {
                let msg = api.register(scenario)?;
                info!("{}", msg);
            }
            // 登记会重置会话，增长值在登记后确认
            api.set_growth(&crecimiento)?;

            let result = api.compute()?;
            print_totals(&api.summary(&result)?);

            if let Some(path) = salida {
                api.export(&result, &path)?;
                println!(
                    "{}",
                    i18n::t_with_args("cli.exportado", &[("path", &path.display().to_string())])
                );
            }
        }
        Commands::Preprocesar {
            ventas,
            precios,
            salida,
        } => {
            let config = Arc::new(load_config(&cli.config, &overlay)?);
            let api = DiscountApi::new(config)?;
            let table = api.preprocess_files(&ventas, &precios)?;
            api.export(&table, &salida)?;
            println!(
                "{}",
                i18n::t_with_args("cli.exportado", &[("path", &salida.display().to_string())])
            );
        }
        Commands::Rangos { etiqueta } => {
            let config = load_config(&cli.config, &overlay)?;
            let parser = RangeParser::new(config.default_range()?);
            let labels = match etiqueta {
                Some(label) => vec![label],
                None => config
                    .config()
                    .lateral_var
                    .seccion_rango_descuento
                    .list_rng_dctos
                    .clone(),
            };
            for label in labels {
                let range = parser.parse(&label);
                println!("{:<10} → {}: {}", label, range, discount_labels(range).join(", "));
            }
        }
        Commands::Resumen { archivo, columnas } => {
            let table = UniversalFileParser::new().parse(&archivo)?;
            let totals = if columnas.is_empty() {
                sum_columns(&table, &SUMMARY_COLUMNS)?
            } else {
                sum_columns(&table, &columnas)?
            };
            print_totals(&totals);
        }
    }

    Ok(())
}

fn load_config(base: &Path, overlay: &Path) -> Result<ConfigManager> {
    ConfigManager::load(base, Some(overlay))
        .with_context(|| format!("无法加载配置: {}", base.display()))
}

/// 读取场景列表并重新校验（文件内容不经过构造函数）
fn read_scenarios(path: &Path) -> Result<Vec<DiscountScenario>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取场景文件: {}", path.display()))?;
    let raw: Vec<DiscountScenario> = serde_yaml::from_str(&content)
        .with_context(|| format!("场景文件格式错误: {}", path.display()))?;

    raw.into_iter()
        .map(|s| {
            let mut scenario = DiscountScenario::new(s.concat_plu_producto, s.rango)?
                .with_herramienta(s.herramienta)
                .with_concepto(s.concepto);
            if let Some(v) = s.ventana {
                scenario = scenario.with_ventana(EventWindow::new(v.fecha_inicio(), v.fecha_fin())?);
            }
            Ok(scenario)
        })
        .collect()
}

fn print_totals(totals: &Totals) {
    for (column, value) in totals {
        println!("{:<25} {:>15}", column, value);
    }
}
