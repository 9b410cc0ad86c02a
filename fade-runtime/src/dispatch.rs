//! # Dispatch 模块
//!
//! 便捷入口：从 [`AudioEngine`] 解析目标，构造渐变并交给调度器。
//!
//! 渐变控制器本身不知道 BGM、音效这些概念，解析工作都在这里完成。

use tracing::debug;

use crate::bindings::{LongAudioTarget, MixerGainTarget, SoundSourceTarget};
use crate::curve::FadeCurve;
use crate::engine::{AudioEngine, SourceId};
use crate::error::FadeResult;
use crate::scheduler::{FadeId, FadeScheduler};
use crate::spec::FadeSpec;

/// 淡出并在完成后停止
pub fn fade_out_spec(duration: f32, curve: FadeCurve) -> FadeResult<FadeSpec> {
    Ok(FadeSpec::new(duration, 0.0, curve)?.with_stop_on_complete(true))
}

/// 渐变当前 BGM
///
/// 没有 BGM 时返回 `None`。
pub fn fade_background_music(
    scheduler: &mut FadeScheduler,
    audio: &AudioEngine,
    spec: FadeSpec,
) -> Option<FadeId> {
    let Some(source) = audio.background_music() else {
        debug!("没有正在播放的 BGM，忽略渐变");
        return None;
    };
    Some(scheduler.run(spec, LongAudioTarget::new(source)))
}

/// 渐变所有音效（音效引擎主增益）
///
/// `stop_on_complete` 时完成后停止所有音效。
pub fn fade_sound_effects(
    scheduler: &mut FadeScheduler,
    audio: &AudioEngine,
    spec: FadeSpec,
) -> FadeId {
    scheduler.run(spec, MixerGainTarget::new(audio.sound_engine()))
}

/// 渐变单个音效
///
/// `source_id` 为播放音效时返回的 ID。音源不存在（已回收）时返回 `None`。
pub fn fade_sound_effect(
    scheduler: &mut FadeScheduler,
    audio: &AudioEngine,
    source_id: SourceId,
    spec: FadeSpec,
) -> Option<FadeId> {
    if audio.sound_engine().borrow().source(source_id).is_none() {
        debug!(source = %source_id, "音源不存在，忽略渐变");
        return None;
    }
    Some(scheduler.run(
        spec,
        SoundSourceTarget::new(audio.sound_engine(), source_id),
    ))
}
