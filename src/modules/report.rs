use crate::models::{ModelReport, QuotaReport};
use crate::modules::quota::QuotaResponse;
use chrono::{DateTime, Utc};

const MAX_NAME_WIDTH: usize = 33;

/// 距离重置时间的剩余时长
pub fn format_time_until(reset_time: &str, now: DateTime<Utc>) -> String {
    let Ok(reset) = DateTime::parse_from_rfc3339(reset_time) else {
        return "Unknown".to_string();
    };

    let delta = reset.with_timezone(&Utc) - now;
    let total_secs = delta.num_seconds();
    if total_secs <= 0 {
        return "reset".to_string();
    }

    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

pub fn format_percentage(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}

pub fn status_indicator(fraction: f64) -> &'static str {
    if fraction >= 0.5 {
        "🟢"
    } else if fraction >= 0.1 {
        "🟡"
    } else {
        "🔴"
    }
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() <= MAX_NAME_WIDTH {
        return name.to_string();
    }
    let mut preview = name.chars().take(MAX_NAME_WIDTH - 3).collect::<String>();
    preview.push_str("...");
    preview
}

/// 表格输出
pub fn render_table(quota: &QuotaResponse, email: &str, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push_str("\n📊 Antigravity quota status\n");
    out.push_str(&format!("   account: {}\n", email));
    out.push_str(&format!("{}\n", "=".repeat(70)));

    if quota.models.is_empty() {
        out.push_str("  no models available\n");
        return out;
    }

    // 按显示名称排序
    let mut entries: Vec<(&String, &crate::modules::quota::ModelInfo)> =
        quota.models.iter().collect();
    entries.sort_by_key(|(id, info)| {
        info.display_name
            .clone()
            .unwrap_or_else(|| (*id).clone())
    });

    out.push_str(&format!(
        "{:<4} {:<35} {:<12} {:<12}\n",
        "", "model", "remaining", "resets in"
    ));
    out.push_str(&format!("{}\n", "-".repeat(70)));

    for (id, info) in &entries {
        let remaining = info
            .quota_info
            .as_ref()
            .and_then(|q| q.remaining_fraction)
            .unwrap_or(0.0);
        let reset_time = info.quota_info.as_ref().and_then(|q| q.reset_time.as_deref());

        let display_name = truncate_name(info.display_name.as_deref().unwrap_or(id.as_str()));
        let time_until = match reset_time {
            Some(t) => format_time_until(t, now),
            None => "N/A".to_string(),
        };

        out.push_str(&format!(
            " {}   {:<35} {:<12} {:<12}\n",
            status_indicator(remaining),
            display_name,
            format_percentage(remaining),
            time_until
        ));
    }

    out.push_str(&format!("{}\n", "=".repeat(70)));
    out.push_str(&format!("  {} models\n", quota.models.len()));
    out
}

/// `--json` 输出的结构化报告
pub fn build_report(quota: &QuotaResponse, email: &str, now: DateTime<Utc>) -> QuotaReport {
    let mut models: Vec<ModelReport> = quota
        .models
        .iter()
        .map(|(id, info)| {
            let remaining = info
                .quota_info
                .as_ref()
                .and_then(|q| q.remaining_fraction)
                .unwrap_or(0.0);
            ModelReport {
                id: id.clone(),
                display_name: info.display_name.clone().unwrap_or_else(|| id.clone()),
                remaining_fraction: remaining,
                remaining_percentage: remaining * 100.0,
                reset_time: info.quota_info.as_ref().and_then(|q| q.reset_time.clone()),
                supports_images: info.supports_images,
                supports_video: info.supports_video,
                supports_thinking: info.supports_thinking,
            }
        })
        .collect();
    models.sort_by(|a, b| a.display_name.cmp(&b.display_name));

    QuotaReport {
        email: email.to_string(),
        timestamp: now.to_rfc3339(),
        models,
    }
}
