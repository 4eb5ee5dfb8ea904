use crate::error::{AppError, AppResult};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

const CLOUDCODE_BASE_URL: &str = "https://cloudcode-pa.googleapis.com";
const LOAD_CODE_ASSIST_ENDPOINT: &str = "/v1internal:loadCodeAssist";
const FETCH_MODELS_ENDPOINT: &str = "/v1internal:fetchAvailableModels";
const USER_AGENT: &str = "antigravity-quota";

#[derive(Debug, Deserialize)]
pub struct QuotaResponse {
    #[serde(default)]
    pub models: HashMap<String, ModelInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    #[serde(rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(rename = "quotaInfo")]
    pub quota_info: Option<QuotaInfo>,
    #[serde(rename = "supportsImages", default)]
    pub supports_images: bool,
    #[serde(rename = "supportsVideo", default)]
    pub supports_video: bool,
    #[serde(rename = "supportsThinking", default)]
    pub supports_thinking: bool,
}

#[derive(Debug, Deserialize)]
pub struct QuotaInfo {
    #[serde(rename = "remainingFraction")]
    pub remaining_fraction: Option<f64>,
    #[serde(rename = "resetTime")]
    pub reset_time: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoadProjectResponse {
    #[serde(rename = "cloudaicompanionProject")]
    project: Option<serde_json::Value>,
}

fn create_client() -> reqwest::Client {
    crate::utils::http::create_client(15)
}

fn build_metadata_payload() -> serde_json::Value {
    json!({
        "metadata": {
            "ideType": "ANTIGRAVITY",
            "platform": "PLATFORM_UNSPECIFIED",
            "pluginType": "GEMINI"
        }
    })
}

/// cloudaicompanionProject 可能是字符串，也可能是带 id 的对象
fn extract_project_id(value: &serde_json::Value) -> Option<String> {
    if let Some(text) = value.as_str() {
        if !text.is_empty() {
            return Some(text.to_string());
        }
    }
    if let Some(id) = value.get("id").and_then(|id| id.as_str()) {
        if !id.is_empty() {
            return Some(id.to_string());
        }
    }
    None
}

/// 加载项目信息，返回 project_id（可能没有）
pub async fn load_project_id(access_token: &str) -> AppResult<Option<String>> {
    let client = create_client();

    let response = client
        .post(format!("{}{}", CLOUDCODE_BASE_URL, LOAD_CODE_ASSIST_ENDPOINT))
        .bearer_auth(access_token)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .json(&build_metadata_payload())
        .send()
        .await?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(AppError::AuthExpired);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Api(format!(
            "loadCodeAssist failed: {} - {}",
            status, body
        )));
    }

    let data = response.json::<LoadProjectResponse>().await?;
    Ok(data.project.as_ref().and_then(extract_project_id))
}

/// 获取可用模型及配额信息，返回原始响应供 --raw 输出
pub async fn fetch_available_models(
    access_token: &str,
    project_id: Option<&str>,
) -> AppResult<serde_json::Value> {
    let client = create_client();
    let payload = project_id
        .map(|id| json!({ "project": id }))
        .unwrap_or_else(|| json!({}));

    let response = client
        .post(format!("{}{}", CLOUDCODE_BASE_URL, FETCH_MODELS_ENDPOINT))
        .bearer_auth(access_token)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(AppError::AuthExpired);
    }
    if status == reqwest::StatusCode::FORBIDDEN {
        return Err(AppError::AccessDenied);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Api(format!(
            "fetchAvailableModels failed: {} - {}",
            status, body
        )));
    }

    Ok(response.json::<serde_json::Value>().await?)
}

/// 原始响应 -> 按模型的配额视图
pub fn parse_quota_response(raw: &serde_json::Value) -> AppResult<QuotaResponse> {
    serde_json::from_value(raw.clone())
        .map_err(|e| AppError::Api(format!("unexpected fetchAvailableModels response: {}", e)))
}
