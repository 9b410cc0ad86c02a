//! # Error 模块
//!
//! 定义 fade-runtime 中使用的错误类型。
//!
//! 注意：篡改检测与目标失效不是错误，而是设计好的中止路径，
//! 见 [`crate::fader::AbortReason`]。

use thiserror::Error;

/// 渐变配置错误
///
/// 在构造 [`crate::FadeSpec`] 时返回，不会生成任何部分有效的动作。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FadeError {
    /// 时长为负数或非有限值
    #[error("无效的渐变时长: {duration}（必须是非负有限值）")]
    InvalidDuration { duration: f32 },

    /// 音量超出 [0, 1]
    #[error("参数 '{param}' 的音量 {value} 超出范围 0.0 - 1.0")]
    VolumeOutOfRange { param: &'static str, value: f32 },

    /// 未知的曲线名称
    #[error("未知的渐变曲线 '{name}'，可选值: linear, s_curve, exponential")]
    UnknownCurve { name: String },
}

/// 配置文件错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    Serialization(String),

    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    Io(String),

    /// 验证失败
    #[error("配置验证失败: {0}")]
    Validation(String),
}

/// Result 类型别名
pub type FadeResult<T> = Result<T, FadeError>;
