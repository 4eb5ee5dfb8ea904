use crate::error::{AppError, AppResult};
use serde::Deserialize;

const CLIENT_ID: &str = "1071006060591-tmhssin2h21lcre235vtolojh4g403ep.apps.googleusercontent.com";
const CLIENT_SECRET: &str = "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";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub email: Option<String>,
}

/// 非 2xx 刷新响应的分类：invalid_grant 代表 refresh_token 已失效，
/// 需要重新登录；其余按一般失败处理。
fn classify_refresh_failure(status: reqwest::StatusCode, body: &str) -> AppError {
    if body.to_lowercase().contains("invalid_grant") {
        AppError::TokenRevoked
    } else {
        AppError::TokenRefreshFailed(format!("{} - {}", status, body))
    }
}

/// 使用 refresh_token 刷新 access_token
pub async fn refresh_access_token(refresh_token: &str) -> AppResult<String> {
    let client = crate::utils::http::create_client(10);

    let params = [
        ("client_id", CLIENT_ID),
        ("client_secret", CLIENT_SECRET),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];

    let response = client.post(TOKEN_URL).form(&params).send().await?;

    let status = response.status();
    if status.is_success() {
        let token_res = response.json::<TokenResponse>().await?;
        Ok(token_res.access_token)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(classify_refresh_failure(status, &body))
    }
}

/// 获取当前登录用户的邮箱
pub async fn get_user_email(access_token: &str) -> AppResult<String> {
    let client = crate::utils::http::create_client(10);

    let response = client
        .get(USERINFO_URL)
        .bearer_auth(access_token)
        .send()
        .await?;

    let status = response.status();
    if status.is_success() {
        let info = response.json::<UserInfo>().await?;
        Ok(info.email.unwrap_or_else(|| "Unknown".to_string()))
    } else {
        Err(AppError::Api(format!("userinfo request failed: {}", status)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_invalid_grant() {
        let status = reqwest::StatusCode::BAD_REQUEST;
        let body = r#"{"error": "invalid_grant", "error_description": "Token has been revoked."}"#;
        assert!(matches!(
            classify_refresh_failure(status, body),
            AppError::TokenRevoked
        ));
    }

    #[test]
    fn test_classify_other_failures() {
        let status = reqwest::StatusCode::INTERNAL_SERVER_ERROR;
        assert!(matches!(
            classify_refresh_failure(status, "backend unavailable"),
            AppError::TokenRefreshFailed(_)
        ));
        assert!(matches!(
            classify_refresh_failure(reqwest::StatusCode::BAD_REQUEST, r#"{"error":"invalid_request"}"#),
            AppError::TokenRefreshFailed(_)
        ));
    }
}
