/// 从 state.vscdb 凭证记录解码出的 OAuth token 信息。
///
/// 所有字段都可能缺失；缺 `refresh_token` 由调用方按未登录处理。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenInfo {
    pub access_token: Option<String>,
    pub token_type: Option<String>,
    pub refresh_token: Option<String>,
    /// 过期时间（Unix 秒）
    pub expiry_seconds: Option<i64>,
}
