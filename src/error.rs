use crate::utils::protobuf::DecodeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// state.vscdb 不存在
    #[error("Antigravity database not found: {0}\nPlease install and sign in to the Antigravity client.")]
    StateDbMissing(String),

    /// 本地没有可用凭证（未登录、记录缺失等）
    #[error("{0}\nPlease sign in to the Antigravity client.")]
    NotLoggedIn(String),

    /// 凭证 blob 解码失败，对调用方是单一的"凭证不可读"状态
    #[error("stored credentials are unreadable: {0}")]
    CredentialDecode(#[from] DecodeError),

    #[error("refresh_token has been revoked, please sign in to the Antigravity client again")]
    TokenRevoked,

    #[error("token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("authorization expired, please sign in to the Antigravity client again")]
    AuthExpired,

    #[error("access denied (403), this account may not have permission for this API")]
    AccessDenied,

    #[error("API error: {0}")]
    Api(String),
}

pub type AppResult<T> = Result<T, AppError>;
