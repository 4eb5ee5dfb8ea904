use serde::Serialize;

/// `--json` 输出的顶层结构。
#[derive(Debug, Serialize)]
pub struct QuotaReport {
    pub email: String,
    pub timestamp: String,
    pub models: Vec<ModelReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelReport {
    pub id: String,
    pub display_name: String,
    pub remaining_fraction: f64,
    pub remaining_percentage: f64,
    pub reset_time: Option<String>,
    pub supports_images: bool,
    pub supports_video: bool,
    pub supports_thinking: bool,
}
