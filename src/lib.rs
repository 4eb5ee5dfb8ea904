pub mod models;
pub mod modules;
pub mod utils;

pub mod error;

use error::{AppError, AppResult};
use tracing::info;

/// 输出形式，由 CLI 旗标决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Raw,
}

/// 完整查询流程:
/// 本地凭证 -> 刷新 access_token -> 用户邮箱 -> 项目信息 -> 配额 -> 输出
pub async fn run(format: OutputFormat) -> AppResult<()> {
    info!("reading local Antigravity credentials...");
    let token_info = modules::db::read_local_token_info()?;

    let refresh_token = token_info
        .refresh_token
        .ok_or_else(|| AppError::NotLoggedIn("refresh_token not found".into()))?;

    info!("refreshing access_token...");
    let access_token = modules::oauth::refresh_access_token(&refresh_token).await?;

    let email = modules::oauth::get_user_email(&access_token).await?;
    info!("signed in as {}", email);

    info!("loading project info...");
    let project_id = modules::quota::load_project_id(&access_token).await?;
    if let Some(ref id) = project_id {
        info!("project id: {}", id);
    }

    info!("fetching quota data...");
    let raw = modules::quota::fetch_available_models(&access_token, project_id.as_deref()).await?;

    let now = chrono::Utc::now();
    match format {
        OutputFormat::Raw => {
            println!("{}", serde_json::to_string_pretty(&raw).unwrap_or_default());
        }
        OutputFormat::Json => {
            let quota = modules::quota::parse_quota_response(&raw)?;
            let report = modules::report::build_report(&quota, &email, now);
            println!(
                "{}",
                serde_json::to_string_pretty(&report).unwrap_or_default()
            );
        }
        OutputFormat::Table => {
            let quota = modules::quota::parse_quota_response(&raw)?;
            print!("{}", modules::report::render_table(&quota, &email, now));
        }
    }

    Ok(())
}
