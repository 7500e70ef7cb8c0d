use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facility_reports::Application;
use reports_application::{AttachmentUpload, CreateReportInput};
use reports_core::config::AppConfig;
use reports_core::{
    Actor, Department, ObjectCategory, ReportPriority, ReportStatus, Worker, WorkerRepository,
};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "facility-reports")]
#[command(version = "1.0.0")]
#[command(about = "设施故障报修系统")]
#[command(long_about = "提交报修单、自动分配维修人员、管理报修单状态的命令行工具")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件路径，不指定时查找 config/reports.toml
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别，覆盖配置文件
    #[arg(short, long, value_parser = ["trace", "debug", "info", "warn", "error"])]
    log_level: Option<String>,

    /// 日志格式，覆盖配置文件
    #[arg(long, value_parser = ["json", "pretty"])]
    log_format: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 创建数据库表
    Migrate,
    /// 登记或更新维修人员
    AddWorker {
        /// 维修人员ID
        id: String,
        /// 所属部门 (maintenance, systems)
        #[arg(short, long)]
        department: String,
        /// 职级
        #[arg(short, long, default_value = "technician")]
        rank: String,
        /// 通知联系方式
        #[arg(long)]
        contact: String,
    },
    /// 提交报修单
    CreateReport {
        /// 报修人ID
        #[arg(long)]
        creator: String,
        /// 报修人显示名
        #[arg(long)]
        creator_name: Option<String>,
        /// 负责部门 (maintenance, systems)
        #[arg(short, long)]
        department: String,
        /// 故障描述
        #[arg(long)]
        description: String,
        /// 报修对象名称
        #[arg(long)]
        object: String,
        /// 报修对象类别
        #[arg(long, default_value = "other")]
        category: String,
        /// 场所名称
        #[arg(long)]
        place: String,
        /// 楼层
        #[arg(long)]
        floor: i32,
        /// 照片文件，可重复
        #[arg(long = "photo")]
        photos: Vec<PathBuf>,
    },
    /// 设置优先级和预计处理时间
    SetPriority {
        report_id: i64,
        /// 负责的维修人员ID
        #[arg(short, long)]
        worker: String,
        /// LOW, MEDIUM, HIGH, URGENT
        #[arg(short, long)]
        priority: String,
        /// 预计处理时间等说明
        #[arg(short, long)]
        estimate: Option<String>,
    },
    /// 推进报修单状态
    Advance {
        report_id: i64,
        #[arg(short, long)]
        worker: String,
        /// 目标状态 (IN_PROGRESS, RESOLVED)
        #[arg(long)]
        to: String,
    },
    /// 更新备注
    Comment {
        report_id: i64,
        #[arg(short, long)]
        worker: String,
        comment: String,
    },
    /// 改派给另一位维修人员，操作人需在名册中具备管理职级
    Reassign {
        report_id: i64,
        /// 操作人ID
        #[arg(long)]
        by: String,
        /// 新的维修人员ID
        #[arg(long)]
        to: String,
    },
    /// 重新打开已解决的报修单
    Reopen {
        report_id: i64,
        #[arg(long)]
        by: String,
        #[arg(long)]
        reason: String,
    },
    /// 重试附件上传
    RetryAttachments {
        report_id: i64,
        #[arg(long)]
        creator: String,
        #[arg(long = "photo", required = true)]
        photos: Vec<PathBuf>,
    },
    /// 重新发送通知
    Renotify { report_id: i64 },
    /// 我提交的报修单
    MyReports {
        #[arg(long)]
        creator: String,
    },
    /// 分配给我的报修单
    Assigned {
        #[arg(short, long)]
        worker: String,
    },
    /// 查看报修单详情
    Show { report_id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("加载配置失败")?;

    let log_level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    let log_format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    init_logging(log_level, log_format)?;

    let app = Application::new(config).await?;
    let result = run(&app, cli.command).await;
    app.shutdown().await;
    result
}

async fn run(app: &Application, command: Commands) -> Result<()> {
    let ctx = app.default_context();

    match command {
        Commands::Migrate => {
            app.health_check().await?;
            info!("数据库已就绪");
        }
        Commands::AddWorker {
            id,
            department,
            rank,
            contact,
        } => {
            let department: Department = department.parse()?;
            let worker = Worker::new(id, department, rank, contact);
            app.store().workers.register(&worker).await?;
            print_json(&worker)?;
        }
        Commands::CreateReport {
            creator,
            creator_name,
            department,
            description,
            object,
            category,
            place,
            floor,
            photos,
        } => {
            let display_name = creator_name.unwrap_or_else(|| creator.clone());
            let input = CreateReportInput {
                description,
                department: department.parse()?,
                object_name: object,
                object_category: category.parse::<ObjectCategory>()?,
                place_name: place,
                floor,
                creator: Actor::reporter(creator, display_name),
                attachments: read_photos(&photos).await?,
            };

            let outcome = app.orchestrator().create_report(&ctx, input).await?;
            for warning in outcome.warnings() {
                warn!("{warning}");
            }
            print_json(&outcome)?;
        }
        Commands::SetPriority {
            report_id,
            worker,
            priority,
            estimate,
        } => {
            let priority: ReportPriority = priority.parse()?;
            let report = app
                .lifecycle()
                .set_priority_and_estimate(&ctx, report_id, &worker, priority, estimate)
                .await?;
            print_json(&report)?;
        }
        Commands::Advance {
            report_id,
            worker,
            to,
        } => {
            let target: ReportStatus = to.parse()?;
            let report = app
                .lifecycle()
                .advance(&ctx, report_id, &worker, target)
                .await?;
            print_json(&report)?;
        }
        Commands::Comment {
            report_id,
            worker,
            comment,
        } => {
            let report = app
                .lifecycle()
                .update_comment(&ctx, report_id, &worker, comment)
                .await?;
            print_json(&report)?;
        }
        Commands::Reassign { report_id, by, to } => {
            let actor = Actor::worker(by);
            let report = app
                .lifecycle()
                .reassign(&ctx, report_id, &actor, &to)
                .await?;
            print_json(&report)?;
        }
        Commands::Reopen {
            report_id,
            by,
            reason,
        } => {
            let actor = Actor::worker(by);
            let report = app
                .lifecycle()
                .reopen(&ctx, report_id, &actor, &reason)
                .await?;
            print_json(&report)?;
        }
        Commands::RetryAttachments {
            report_id,
            creator,
            photos,
        } => {
            let actor = Actor::reporter(creator.clone(), creator);
            let attachments = read_photos(&photos).await?;
            let outcome = app
                .orchestrator()
                .retry_attachments(&ctx, report_id, &actor, attachments)
                .await?;
            print_json(&outcome)?;
        }
        Commands::Renotify { report_id } => {
            let outcome = app.orchestrator().renotify(&ctx, report_id).await?;
            print_json(&outcome)?;
        }
        Commands::MyReports { creator } => {
            let reports = app.queries().my_reports(&ctx, &creator).await?;
            print_json(&reports)?;
        }
        Commands::Assigned { worker } => {
            let reports = app.queries().assigned_reports(&ctx, &worker).await?;
            print_json(&reports)?;
        }
        Commands::Show { report_id } => {
            let details = app.queries().report_details(&ctx, report_id).await?;
            print_json(&details)?;
        }
    }

    Ok(())
}

async fn read_photos(paths: &[PathBuf]) -> Result<Vec<AttachmentUpload>> {
    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("读取照片失败: {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".to_string());
        uploads.push(AttachmentUpload::new(file_name, content_type_for(path), bytes));
    }
    Ok(uploads)
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value).context("序列化输出失败")?;
    println!("{output}");
    Ok(())
}

/// 初始化日志系统
fn init_logging(log_level: &str, log_format: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
        _ => {
            return Err(anyhow::anyhow!("不支持的日志格式: {log_format}"));
        }
    }

    Ok(())
}
