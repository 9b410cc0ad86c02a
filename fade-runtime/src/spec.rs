//! # Spec 模块
//!
//! 渐变动作的不可变配置。构造后只读，所有校验在构造时完成。

use serde::{Deserialize, Serialize};

use crate::curve::FadeCurve;
use crate::error::{FadeError, FadeResult};

/// 渐变配置
///
/// - `duration`: 时长（秒）。`0` 表示立即完成。
/// - `start_volume`: 起始音量。`None` 表示启动时读取目标的当前音量。
/// - `final_volume`: 目标音量。
/// - `curve`: 渐变曲线。
/// - `stop_on_complete`: 渐变完成后是否停止目标（用于淡出后停止）。
///
/// ```rust,ignore
/// let spec = FadeSpec::new(1.5, 0.0, FadeCurve::SCurve)?.with_stop_on_complete(true);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FadeSpecDef")]
pub struct FadeSpec {
    duration: f32,
    start_volume: Option<f32>,
    final_volume: f32,
    curve: FadeCurve,
    stop_on_complete: bool,
}

impl FadeSpec {
    /// 创建渐变配置（起始音量取自目标）
    pub fn new(duration: f32, final_volume: f32, curve: FadeCurve) -> FadeResult<Self> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(FadeError::InvalidDuration { duration });
        }
        check_volume("final_volume", final_volume)?;

        Ok(Self {
            duration,
            start_volume: None,
            final_volume,
            curve,
            stop_on_complete: false,
        })
    }

    /// 指定显式起始音量
    pub fn with_start_volume(mut self, start_volume: f32) -> FadeResult<Self> {
        check_volume("start_volume", start_volume)?;
        self.start_volume = Some(start_volume);
        Ok(self)
    }

    /// 设置完成后是否停止目标
    pub fn with_stop_on_complete(mut self, stop: bool) -> Self {
        self.stop_on_complete = stop;
        self
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn start_volume(&self) -> Option<f32> {
        self.start_volume
    }

    pub fn final_volume(&self) -> f32 {
        self.final_volume
    }

    pub fn curve(&self) -> FadeCurve {
        self.curve
    }

    pub fn stop_on_complete(&self) -> bool {
        self.stop_on_complete
    }

    /// 是否为瞬时渐变
    pub fn is_instant(&self) -> bool {
        self.duration <= 0.0
    }
}

fn check_volume(param: &'static str, value: f32) -> FadeResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(FadeError::VolumeOutOfRange { param, value })
    }
}

/// 反序列化中间表示，经 `TryFrom` 走与构造函数相同的校验
#[derive(Deserialize)]
struct FadeSpecDef {
    duration: f32,
    #[serde(default)]
    start_volume: Option<f32>,
    final_volume: f32,
    #[serde(default)]
    curve: FadeCurve,
    #[serde(default)]
    stop_on_complete: bool,
}

impl TryFrom<FadeSpecDef> for FadeSpec {
    type Error = FadeError;

    fn try_from(def: FadeSpecDef) -> Result<Self, Self::Error> {
        let spec = FadeSpec::new(def.duration, def.final_volume, def.curve)?
            .with_stop_on_complete(def.stop_on_complete);
        match def.start_volume {
            Some(start) => spec.with_start_volume(start),
            None => Ok(spec),
        }
    }
}
