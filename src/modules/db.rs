use crate::error::{AppError, AppResult};
use crate::models::TokenInfo;
use crate::utils::protobuf;
use base64::{engine::general_purpose, Engine as _};
use rusqlite::{Connection, Error as SqliteError};
use std::path::PathBuf;

/// state.vscdb 中保存登录状态的 key
pub const STATE_KEY: &str = "jetskiStateSync.agentManagerInitState";

/// OAuthTokenInfo 在顶层消息中的字段号
const OAUTH_TOKEN_FIELD: u64 = 6;

/// 获取 Antigravity 数据库路径
pub fn get_state_db_path() -> AppResult<PathBuf> {
    #[cfg(target_os = "macos")]
    let path = {
        let home = dirs::home_dir()
            .ok_or_else(|| AppError::StateDbMissing("cannot resolve home directory".into()))?;
        home.join("Library/Application Support/Antigravity/User/globalStorage/state.vscdb")
    };

    #[cfg(target_os = "windows")]
    let path = {
        let appdata = std::env::var("APPDATA")
            .map_err(|_| AppError::StateDbMissing("APPDATA is not set".into()))?;
        PathBuf::from(appdata).join("Antigravity\\User\\globalStorage\\state.vscdb")
    };

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let path = {
        let home = dirs::home_dir()
            .ok_or_else(|| AppError::StateDbMissing("cannot resolve home directory".into()))?;
        home.join(".config/Antigravity/User/globalStorage/state.vscdb")
    };

    if path.exists() {
        Ok(path)
    } else {
        Err(AppError::StateDbMissing(path.display().to_string()))
    }
}

/// 读取登录状态行（可能不存在）
pub fn read_state_value(conn: &Connection) -> AppResult<Option<String>> {
    match conn.query_row(
        "SELECT value FROM ItemTable WHERE key = ?",
        [STATE_KEY],
        |row| row.get::<_, String>(0),
    ) {
        Ok(value) => Ok(Some(value)),
        Err(SqliteError::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Base64 + protobuf 解码登录状态，取出 OAuth token 信息。
///
/// 结构: 顶层 Field 6 (OAuthTokenInfo) -> Field 1/2/3/4
pub fn decode_token_info(state_value: &str) -> AppResult<TokenInfo> {
    let raw = general_purpose::STANDARD.decode(state_value.trim())?;

    let oauth_field = protobuf::find_field(&raw, OAUTH_TOKEN_FIELD)?
        .ok_or_else(|| AppError::NotLoggedIn("OAuth credentials not found in state".into()))?;

    Ok(protobuf::parse_token_info(oauth_field)?)
}

/// 从本地 state.vscdb 读取 OAuth token 信息
pub fn read_local_token_info() -> AppResult<TokenInfo> {
    let db_path = get_state_db_path()?;
    let conn = Connection::open(&db_path)?;

    let state_value = read_state_value(&conn)?
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::NotLoggedIn("no sign-in state found".into()))?;

    decode_token_info(&state_value)
}
