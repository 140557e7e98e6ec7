use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone)]
pub struct PredictResponse {
    #[serde(rename = "class")]
    pub class_label: String,
    pub confidence: f32,
    pub cloudinary_url: String,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct ExplainRequest {
    pub cloudinary_url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct ExplainResponse {
    pub cloudinary_url: String,
}
