use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model: ModelSpec,
    pub image: ImageSpec,
    pub gradcam: GradcamSpec,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModelSpec {
    pub path: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImageSpec {
    pub size: u32,
    pub normalization: NormalizationSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationSpec {
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

/// Names of the TorchScript methods exported by the model artifact:
/// the convolutional backbone up to the late conv layer, and the
/// classification head applied to its activations.
#[derive(Debug, Serialize, Deserialize)]
pub struct GradcamSpec {
    pub features_method: String,
    pub head_method: String,
}

impl ModelConfig {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = match std::env::var("MODEL_CONFIG") {
            Ok(path) => path,
            Err(_) => {
                let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")
                    .map_err(|_| "Failed to get manifest directory")?;
                format!("{}/../config/model.yaml", manifest_dir)
            }
        };
        let config_str = std::fs::read_to_string(config_path)?;
        let config: ModelConfig = serde_yaml::from_str(&config_str)?;
        Ok(config)
    }
}
