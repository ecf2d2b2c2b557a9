// ==========================================
// UBP 环境负荷计算系统 - 命令行入口
// ==========================================
// 子命令: calculate（计算并导出）/ mappings（列出规则表）/ check（校验输入与规则）
// 日志: stderr；报告: stdout 或文件
// ==========================================

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use ubp_calculator::api::{ReportApi, SummaryDto};
use ubp_calculator::config::{AppConfig, ConfigManager};
use ubp_calculator::engine::ImpactPipeline;
use ubp_calculator::logging;

#[derive(Parser)]
#[command(name = "ubp-calculator")]
#[command(version)]
#[command(about = "UBP 环境负荷计算：物料清单 × 生态平衡参考库")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON 配置文件（缺省使用内置默认值 + 环境变量）
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// 参考数据库文件（覆盖配置）
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// 映射规则文件（覆盖配置）
    #[arg(long, global = true)]
    mapping: Option<PathBuf>,

    /// 输出格式
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    format: OutputFormat,

    /// JSON 格式日志
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// 计算物料清单的 UBP 影响
    Calculate {
        /// 物料清单文件（.xlsx / .xls / .csv）
        bom: PathBuf,

        /// 物料清单表头行号（1 起始，覆盖配置）
        #[arg(long)]
        header_row: Option<usize>,

        /// 导出结果表 CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// 导出完整 JSON（记录 + 汇总）
        #[arg(long)]
        json: Option<PathBuf>,

        /// 帕累托条数（数字或 all）
        #[arg(long, default_value = "10")]
        pareto: String,
    },

    /// 列出解析后的映射规则表
    Mappings,

    /// 加载参考库与映射规则并报告冲突
    Check,
}

// ==========================================
// MAIN
// ==========================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }
    tracing::info!("{} v{}", ubp_calculator::APP_NAME, ubp_calculator::VERSION);

    let result = load_config(&cli).and_then(|config| match &cli.command {
        Commands::Calculate {
            bom,
            header_row,
            csv,
            json,
            pareto,
        } => cmd_calculate(
            config,
            bom,
            *header_row,
            csv.as_deref(),
            json.as_deref(),
            pareto,
            cli.format,
        ),
        Commands::Mappings => cmd_mappings(config, cli.format),
        Commands::Check => cmd_check(config),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "执行失败");
            eprintln!("错误: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = ConfigManager::load(cli.config.as_deref()).context("加载运行配置失败")?;
    if let Some(database) = &cli.database {
        config.database_file = database.clone();
    }
    if let Some(mapping) = &cli.mapping {
        config.mapping_file = mapping.clone();
    }
    Ok(config)
}

fn build_pipeline(config: AppConfig) -> Result<ImpactPipeline> {
    let database = config.database_file.display().to_string();
    let mapping = config.mapping_file.display().to_string();
    ImpactPipeline::from_config(config)
        .with_context(|| format!("加载参考库 {} / 映射规则 {} 失败", database, mapping))
}

// ==========================================
// 子命令
// ==========================================

fn cmd_calculate(
    mut config: AppConfig,
    bom: &Path,
    header_row: Option<usize>,
    csv_out: Option<&Path>,
    json_out: Option<&Path>,
    pareto: &str,
    format: OutputFormat,
) -> Result<()> {
    if let Some(row) = header_row {
        anyhow::ensure!(row >= 1, "表头行号从 1 开始");
        config.bom_layout.header_row = row;
    }

    let api = ReportApi::new();
    let limit = api.parse_limit(pareto)?;
    let pipeline = build_pipeline(config)?;
    let output = pipeline
        .run_file(bom)
        .with_context(|| format!("读取物料清单 {} 失败", bom.display()))?;

    if let Some(path) = csv_out {
        let file = File::create(path).with_context(|| format!("无法创建 {}", path.display()))?;
        api.write_records_csv(&output.records, BufWriter::new(file))?;
    }
    if let Some(path) = json_out {
        std::fs::write(path, api.to_json(&output)?)
            .with_context(|| format!("无法写入 {}", path.display()))?;
    }

    let summary = api.summary(&output.report);
    let top = api.pareto(&output.records, limit);
    match format {
        OutputFormat::Json => {
            let body = serde_json::json!({ "summary": summary, "pareto": top });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Text => {
            print_summary(&summary);
            if !top.is_empty() {
                println!();
                println!("帕累托（前 {} 项）:", top.len());
                for entry in &top {
                    println!(
                        "  {:>3}. Pos. {:<8} {:<30} {:>14.0} UBP  {:>5.1}%  累计 {:>5.1}%",
                        entry.rank,
                        entry.position,
                        entry.description,
                        entry.total_impact,
                        entry.share_pct,
                        entry.cumulative_pct
                    );
                }
            }
        }
    }
    Ok(())
}

fn print_summary(summary: &SummaryDto) {
    println!("总影响:      {:>16.0} UBP", summary.total_impact);
    println!("  材料:      {:>16.0} UBP", summary.total_material_impact);
    println!("  涂层:      {:>16.0} UBP", summary.total_coating_impact);
    println!("总质量:      {:>16.2} kg", summary.total_mass_kg);
    println!("总面积:      {:>16.2} m²", summary.total_area_m2);
    println!(
        "构件: {} 行，匹配 {}（{:.1}%），完整计入 {}，带告警 {}（缺量 {}）",
        summary.components_total,
        summary.components_matched,
        summary.match_rate_pct,
        summary.computed_rows,
        summary.flagged_rows,
        summary.missing_quantity_rows
    );

    println!();
    println!("按材料:");
    for group in &summary.by_material {
        println!(
            "  {:<10} {:<40} {:>14.0} UBP  {:>5.1}%",
            group.key, group.label, group.impact, group.share_pct
        );
    }
    println!("按几何类型:");
    for group in &summary.by_geometry {
        println!("  {:<10} {:>14.0} UBP  ({} 行)", group.key, group.impact, group.count);
    }
    if !summary.by_coating.is_empty() {
        println!("按涂层:");
        for group in &summary.by_coating {
            println!("  {:<10} {:<40} {:>14.0} UBP", group.key, group.label, group.impact);
        }
    }

    if !summary.unmatched_codes.is_empty() {
        println!();
        println!("未匹配材料号（需复核）: {}", summary.unmatched_codes.join(", "));
    }
    if !summary.unmatched_coatings.is_empty() {
        println!("未匹配涂层（未计入）: {}", summary.unmatched_coatings.join(", "));
    }
}

fn cmd_mappings(config: AppConfig, format: OutputFormat) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    let rules = ReportApi::new().rule_listing(pipeline.rules());

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rules)?),
        OutputFormat::Text => {
            for (alias, canonical) in pipeline.rules().synonyms() {
                println!("同义词  {} → {}", alias, canonical);
            }
            for rule in &rules {
                println!(
                    "{:<18} {:<14} {:<28} → {:<8} {} ({} UBP/{})",
                    rule.level,
                    rule.material.as_deref().unwrap_or("*"),
                    rule.qualifier,
                    rule.target_key,
                    rule.target_description,
                    rule.unit_impact,
                    rule.unit
                );
            }
        }
    }
    Ok(())
}

fn cmd_check(config: AppConfig) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    println!(
        "参考库条目 {}，映射规则 {}，同义词 {}：无冲突",
        pipeline.database().len(),
        pipeline.rules().len(),
        pipeline.rules().synonyms().len()
    );
    Ok(())
}
