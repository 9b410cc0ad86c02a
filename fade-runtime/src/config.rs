//! # Config 模块
//!
//! 渐变相关的配置项，可从 JSON 文件加载。
//!
//! ## 配置优先级
//!
//! 1. 调用方显式传入的参数（最高）
//! 2. 配置文件
//! 3. 默认值（最低）

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::curve::FadeCurve;
use crate::error::ConfigError;
use crate::fader::DEFAULT_TAMPER_EPSILON;

/// 渐变配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FadeConfig {
    /// 篡改检测容差
    ///
    /// 目标音量与上次写入值的偏差超过此值时中止渐变。
    /// 音频后端会对音量做量化时需要调大。
    #[serde(default = "default_tamper_epsilon")]
    pub tamper_epsilon: f32,

    /// 未指定曲线时使用的曲线
    #[serde(default)]
    pub default_curve: FadeCurve,

    /// 未指定时长时使用的时长（秒）
    #[serde(default = "default_duration")]
    pub default_duration: f32,
}

fn default_tamper_epsilon() -> f32 {
    DEFAULT_TAMPER_EPSILON
}

fn default_duration() -> f32 {
    1.0
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            tamper_epsilon: default_tamper_epsilon(),
            default_curve: FadeCurve::default(),
            default_duration: default_duration(),
        }
    }
}

impl FadeConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            warn!(path = ?path, "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match Self::try_load(path) {
            Ok(config) => {
                info!(path = ?path, "配置文件加载成功");
                config
            }
            Err(e) => {
                warn!(error = %e, "配置文件加载失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 加载并验证配置文件，失败时返回错误
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| ConfigError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialization(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tamper_epsilon.is_finite() || self.tamper_epsilon < 0.0 {
            return Err(ConfigError::Validation(format!(
                "tamper_epsilon 必须是非负有限值，实际为 {}",
                self.tamper_epsilon
            )));
        }

        if !self.default_duration.is_finite() || self.default_duration < 0.0 {
            return Err(ConfigError::Validation(format!(
                "default_duration 必须是非负有限值，实际为 {}",
                self.default_duration
            )));
        }

        Ok(())
    }
}
