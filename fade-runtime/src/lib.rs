//! # Fade Runtime
//!
//! 游戏引擎动作系统上的音量渐变动作。
//!
//! ## 架构概述
//!
//! 渐变动作把某个音频目标的音量在固定时长内按曲线从起始值插值到最终值，
//! 同时监视目标音量是否被外部修改：一旦发现，动作立即静默让位。
//!
//! ```text
//! Scheduler                  FadeAction                 VolumeTarget
//!   │── run(spec, target) ──►│── set_volume(start) ──────►│
//!   │── update(dt) ─────────►│── volume() ───────────────►│  篡改检测
//!   │                         │── set_volume(v) ──────────►│
//!   │◄── FadeEvent ───────────│── stop()（可选）──────────►│
//! ```
//!
//! ## 模块结构
//!
//! - [`curve`]：渐变曲线
//! - [`spec`]：不可变的渐变配置
//! - [`target`]：音量目标接口
//! - [`fader`]：渐变控制器（插值与篡改检测）
//! - [`engine`]：内存中的音频引擎模型
//! - [`bindings`]：目标接口到具体音频对象的绑定
//! - [`scheduler`]：逐帧驱动渐变的调度器
//! - [`dispatch`]：BGM / 音效的便捷入口
//! - [`config`]：配置文件
//! - [`error`]：错误类型定义

pub mod bindings;
pub mod config;
pub mod curve;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod fader;
pub mod scheduler;
pub mod spec;
pub mod target;

// 重导出核心类型
pub use bindings::{LongAudioTarget, MixerGainTarget, SoundSourceTarget};
pub use config::FadeConfig;
pub use curve::FadeCurve;
pub use dispatch::{fade_background_music, fade_out_spec, fade_sound_effect, fade_sound_effects};
pub use engine::{AudioEngine, LongAudioSource, SoundEngine, SoundSource, SourceId};
pub use error::{ConfigError, FadeError, FadeResult};
pub use fader::{
    AbortReason, DEFAULT_TAMPER_EPSILON, FadeAction, FadeState, FadeStatus, StartVolume,
};
pub use scheduler::{FadeEvent, FadeId, FadeScheduler};
pub use spec::FadeSpec;
pub use target::VolumeTarget;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        // 验证所有公共类型都可以正常使用
        let spec = FadeSpec::new(1.0, 0.0, FadeCurve::Linear).unwrap();
        let mut scheduler = FadeScheduler::with_config(&FadeConfig::default());
        let audio = AudioEngine::new();

        let id = fade_sound_effects(&mut scheduler, &audio, spec);
        assert!(scheduler.is_running(id));
    }
}
