//! # Fader 模块
//!
//! 音量渐变控制器。
//!
//! ## 工作方式
//!
//! 控制器由外部调度器逐帧驱动（`step(dt)`），每帧：
//!
//! 1. 读取目标当前音量，与自己上次写入的值比较。
//!    偏差超过容差说明有人在外部修改了音量，控制器立即让位（中止，不再写入）
//! 2. 推进时间，按曲线计算新音量并写入目标
//! 3. 时间走完后写入最终音量，按需停止目标
//!
//! 中止是静默的：外部音量控制永远优先于进行中的渐变。

use tracing::{debug, trace, warn};

use crate::spec::FadeSpec;
use crate::target::VolumeTarget;

/// 默认篡改检测容差
pub const DEFAULT_TAMPER_EPSILON: f32 = 1e-4;

/// 中止原因
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AbortReason {
    /// 目标音量被外部修改
    TamperDetected {
        /// 控制器上次写入的值
        expected: f32,
        /// 目标的实际音量
        actual: f32,
    },
    /// 目标已销毁或不可达
    TargetUnavailable,
}

/// 渐变状态
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FadeStatus {
    /// 正在渐变
    #[default]
    Running,
    /// 自然完成
    Completed,
    /// 被调度器停止
    Stopped,
    /// 已中止
    Aborted(AbortReason),
}

impl FadeStatus {
    /// 是否为活跃状态（需要更新）
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// 是否已结束
    pub fn is_finished(&self) -> bool {
        !self.is_active()
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

/// 起始音量的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartVolume {
    /// 配置中显式指定
    Explicit,
    /// 启动时从目标读取
    FromTarget,
}

/// 单次运行的可变状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeState {
    elapsed: f32,
    start_volume: f32,
    start_source: StartVolume,
    last_set_volume: f32,
    progress: f32,
    status: FadeStatus,
}

impl FadeState {
    fn new(start_volume: f32, start_source: StartVolume) -> Self {
        Self {
            elapsed: 0.0,
            start_volume,
            start_source,
            last_set_volume: start_volume,
            progress: 0.0,
            status: FadeStatus::Running,
        }
    }

    /// 已经过的时间（秒）
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// 实际使用的起始音量
    pub fn start_volume(&self) -> f32 {
        self.start_volume
    }

    pub fn start_source(&self) -> StartVolume {
        self.start_source
    }

    /// 控制器最近一次写入目标的音量
    pub fn last_set_volume(&self) -> f32 {
        self.last_set_volume
    }

    /// 当前进度（0.0 - 1.0，已应用曲线）
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn status(&self) -> FadeStatus {
        self.status
    }

    pub fn is_aborted(&self) -> bool {
        self.status.is_aborted()
    }
}

/// 音量渐变动作
///
/// 绑定一个 [`VolumeTarget`]，由调度器驱动。
///
/// ```rust,ignore
/// let spec = FadeSpec::new(1.0, 0.0, FadeCurve::Linear)?.with_stop_on_complete(true);
/// let mut fade = FadeAction::start(spec, LongAudioTarget::new(&bgm));
/// while fade.step(dt).is_active() {}
/// ```
#[derive(Debug)]
pub struct FadeAction<T: VolumeTarget> {
    spec: FadeSpec,
    target: T,
    tolerance: f32,
    state: FadeState,
}

impl<T: VolumeTarget> FadeAction<T> {
    /// 启动渐变（默认容差）
    pub fn start(spec: FadeSpec, target: T) -> Self {
        Self::start_with_tolerance(spec, target, DEFAULT_TAMPER_EPSILON)
    }

    /// 启动渐变
    ///
    /// 确定起始音量并首次写入目标。零时长的渐变在这里直接完成。
    /// 目标不可用时返回的动作已处于中止状态。
    pub fn start_with_tolerance(spec: FadeSpec, target: T, tolerance: f32) -> Self {
        let tolerance = tolerance.max(0.0);

        let (start_volume, start_source) = match spec.start_volume() {
            Some(volume) => (volume, StartVolume::Explicit),
            None => match target.volume() {
                Some(volume) => (volume.clamp(0.0, 1.0), StartVolume::FromTarget),
                None => {
                    let mut action = Self {
                        spec,
                        target,
                        tolerance,
                        state: FadeState::new(0.0, StartVolume::FromTarget),
                    };
                    action.abort(AbortReason::TargetUnavailable);
                    return action;
                }
            },
        };

        let mut action = Self {
            spec,
            target,
            tolerance,
            state: FadeState::new(start_volume, start_source),
        };

        debug!(
            volume_target = %action.target.describe(),
            from = start_volume,
            to = spec.final_volume(),
            duration = spec.duration(),
            curve = %spec.curve(),
            "开始音量渐变"
        );

        if spec.is_instant() {
            action.complete();
        } else if !action.write(start_volume) {
            action.abort(AbortReason::TargetUnavailable);
        }

        action
    }

    /// 推进渐变
    ///
    /// # 参数
    /// - `dt`: 帧间隔（秒）。负值与 NaN 按 0 处理
    ///
    /// # 返回
    /// 推进后的状态。已结束的动作不做任何事。
    pub fn step(&mut self, dt: f32) -> FadeStatus {
        if !self.state.status.is_active() {
            return self.state.status;
        }

        let expected = self.state.last_set_volume;
        match self.target.volume() {
            None => return self.abort(AbortReason::TargetUnavailable),
            Some(actual) if diverged(expected, actual, self.tolerance) => {
                return self.abort(AbortReason::TamperDetected { expected, actual });
            }
            Some(_) => {}
        }

        if dt.is_nan() || dt < 0.0 {
            warn!(dt = dt, "无效的时间增量，按 0 处理");
            return self.state.status;
        }
        if dt == 0.0 {
            return self.state.status;
        }

        self.state.elapsed += dt;
        let duration = self.spec.duration();
        if self.state.elapsed >= duration {
            return self.complete();
        }

        let eased = self.spec.curve().apply(self.state.elapsed / duration);
        let volume = self.interpolate(eased);
        if !self.write(volume) {
            return self.abort(AbortReason::TargetUnavailable);
        }
        self.state.progress = eased;

        trace!(elapsed = self.state.elapsed, volume = volume, "渐变步进");
        self.state.status
    }

    /// 由调度器停止
    ///
    /// 保留目标的当前音量，不触发完成后停止。
    pub fn stop(&mut self) -> FadeStatus {
        if self.state.status.is_active() {
            self.state.status = FadeStatus::Stopped;
            debug!(
                volume_target = %self.target.describe(),
                elapsed = self.state.elapsed,
                volume = self.state.last_set_volume,
                "渐变被停止"
            );
        }
        self.state.status
    }

    pub fn spec(&self) -> &FadeSpec {
        &self.spec
    }

    pub fn state(&self) -> &FadeState {
        &self.state
    }

    pub fn status(&self) -> FadeStatus {
        self.state.status
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    /// 取回目标
    pub fn into_target(self) -> T {
        self.target
    }

    fn interpolate(&self, eased: f32) -> f32 {
        let start = self.state.start_volume;
        start + (self.spec.final_volume() - start) * eased
    }

    fn write(&mut self, volume: f32) -> bool {
        if self.target.set_volume(volume) {
            self.state.last_set_volume = volume;
            true
        } else {
            false
        }
    }

    fn complete(&mut self) -> FadeStatus {
        if !self.write(self.spec.final_volume()) {
            return self.abort(AbortReason::TargetUnavailable);
        }
        self.state.progress = 1.0;
        self.state.status = FadeStatus::Completed;

        if self.spec.stop_on_complete() {
            self.target.stop();
        }

        debug!(
            volume_target = %self.target.describe(),
            volume = self.spec.final_volume(),
            stopped = self.spec.stop_on_complete(),
            "音量渐变完成"
        );
        self.state.status
    }

    fn abort(&mut self, reason: AbortReason) -> FadeStatus {
        self.state.status = FadeStatus::Aborted(reason);
        debug!(
            volume_target = %self.target.describe(),
            reason = ?reason,
            elapsed = self.state.elapsed,
            "检测到外部音量变化或目标失效，中止渐变"
        );
        self.state.status
    }
}

/// 实际音量是否偏离了上次写入的值（NaN 视为偏离）
fn diverged(expected: f32, actual: f32, tolerance: f32) -> bool {
    actual.is_nan() || (actual - expected).abs() > tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::FadeCurve;
    use crate::target::tests::ProbeTarget;

    const EPS: f32 = 1e-5;

    fn linear_spec(stop: bool) -> FadeSpec {
        FadeSpec::new(1.0, 1.0, FadeCurve::Linear)
            .unwrap()
            .with_start_volume(0.0)
            .unwrap()
            .with_stop_on_complete(stop)
    }

    fn assert_volumes(actual: &[f32], expected: &[f32]) {
        assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < EPS, "{actual:?} vs {expected:?}");
        }
    }

    #[test]
    fn test_linear_quarter_steps() {
        let probe = ProbeTarget::new(0.7);
        let mut fade = FadeAction::start(linear_spec(true), probe.clone());

        // 启动时写入起始音量
        assert_volumes(&probe.writes(), &[0.0]);
        assert_eq!(fade.state().start_source(), StartVolume::Explicit);

        for _ in 0..3 {
            assert_eq!(fade.step(0.25), FadeStatus::Running);
            assert_eq!(probe.stops(), 0);
        }
        assert_eq!(fade.step(0.25), FadeStatus::Completed);

        assert_volumes(&probe.writes(), &[0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(probe.stops(), 1);
        assert_eq!(fade.state().progress(), 1.0);

        // 完成后继续调用不再写入也不再停止
        assert_eq!(fade.step(0.25), FadeStatus::Completed);
        assert_eq!(probe.writes().len(), 5);
        assert_eq!(probe.stops(), 1);
    }

    #[test]
    fn test_no_stop_when_disabled() {
        let probe = ProbeTarget::new(0.0);
        let mut fade = FadeAction::start(linear_spec(false), probe.clone());
        fade.step(2.0);

        assert_eq!(fade.status(), FadeStatus::Completed);
        assert_eq!(probe.current(), 1.0);
        assert_eq!(probe.stops(), 0);
    }

    #[test]
    fn test_tamper_detected() {
        let probe = ProbeTarget::new(0.0);
        let mut fade = FadeAction::start(linear_spec(true), probe.clone());
        fade.step(0.25);

        probe.tamper(0.9);
        let status = fade.step(0.25);

        assert_eq!(
            status,
            FadeStatus::Aborted(AbortReason::TamperDetected {
                expected: 0.25,
                actual: 0.9,
            })
        );
        assert!(fade.state().is_aborted());
        // 没有新的写入，外部设置的值保持不变
        assert_volumes(&probe.writes(), &[0.0, 0.25]);
        assert_eq!(probe.current(), 0.9);

        // 中止后保持静默
        fade.step(1.0);
        assert_eq!(probe.writes().len(), 2);
        assert_eq!(probe.stops(), 0);
    }

    #[test]
    fn test_tamper_within_tolerance() {
        let probe = ProbeTarget::new(0.0);
        let mut fade = FadeAction::start(linear_spec(false), probe.clone());
        fade.step(0.25);

        probe.tamper(0.25 + DEFAULT_TAMPER_EPSILON / 2.0);
        assert_eq!(fade.step(0.25), FadeStatus::Running);
    }

    #[test]
    fn test_custom_tolerance() {
        let probe = ProbeTarget::new(0.0);
        let mut fade = FadeAction::start_with_tolerance(linear_spec(false), probe.clone(), 0.1);
        fade.step(0.25);

        probe.tamper(0.3);
        assert_eq!(fade.step(0.25), FadeStatus::Running);

        probe.tamper(0.7);
        assert!(fade.step(0.25).is_aborted());
    }

    #[test]
    fn test_target_unavailable() {
        let probe = ProbeTarget::new(0.0);
        let mut fade = FadeAction::start(linear_spec(true), probe.clone());
        fade.step(0.25);

        probe.kill();
        assert_eq!(
            fade.step(0.25),
            FadeStatus::Aborted(AbortReason::TargetUnavailable)
        );
        assert_eq!(probe.writes().len(), 2);
        assert_eq!(probe.stops(), 0);
    }

    #[test]
    fn test_start_on_dead_target() {
        let probe = ProbeTarget::new(0.5);
        probe.kill();

        let spec = FadeSpec::new(1.0, 0.0, FadeCurve::Linear).unwrap();
        let fade = FadeAction::start(spec, probe.clone());
        assert_eq!(
            fade.status(),
            FadeStatus::Aborted(AbortReason::TargetUnavailable)
        );

        // 显式起始音量时写入失败同样中止
        let fade = FadeAction::start(linear_spec(false), probe.clone());
        assert!(fade.status().is_aborted());
        assert!(probe.writes().is_empty());
    }

    #[test]
    fn test_instant_fade() {
        let probe = ProbeTarget::new(0.8);
        let spec = FadeSpec::new(0.0, 0.0, FadeCurve::SCurve)
            .unwrap()
            .with_stop_on_complete(true);
        let mut fade = FadeAction::start(spec, probe.clone());

        assert_eq!(fade.status(), FadeStatus::Completed);
        assert_eq!(probe.writes(), vec![0.0]);
        assert_eq!(probe.stops(), 1);

        fade.step(0.1);
        assert_eq!(probe.writes().len(), 1);
        assert_eq!(probe.stops(), 1);
    }

    #[test]
    fn test_zero_dt_is_idempotent() {
        let probe = ProbeTarget::new(0.0);
        let mut fade = FadeAction::start(linear_spec(false), probe.clone());
        fade.step(0.25);
        let before = *fade.state();

        for _ in 0..5 {
            assert_eq!(fade.step(0.0), FadeStatus::Running);
        }
        assert_eq!(*fade.state(), before);
        assert_eq!(probe.writes().len(), 2);
    }

    #[test]
    fn test_invalid_dt_ignored() {
        let probe = ProbeTarget::new(0.0);
        let mut fade = FadeAction::start(linear_spec(false), probe.clone());

        assert_eq!(fade.step(-1.0), FadeStatus::Running);
        assert_eq!(fade.step(f32::NAN), FadeStatus::Running);
        assert_eq!(fade.state().elapsed(), 0.0);
        assert_eq!(probe.writes().len(), 1);
    }

    #[test]
    fn test_external_stop() {
        let probe = ProbeTarget::new(0.0);
        let mut fade = FadeAction::start(linear_spec(true), probe.clone());
        fade.step(0.5);

        assert_eq!(fade.stop(), FadeStatus::Stopped);
        assert_eq!(fade.step(1.0), FadeStatus::Stopped);

        // 保留最后写入的值，不触发完成后停止
        assert_volumes(&probe.writes(), &[0.0, 0.5]);
        assert_eq!(probe.current(), 0.5);
        assert_eq!(probe.stops(), 0);
    }

    #[test]
    fn test_start_from_target_volume() {
        let probe = ProbeTarget::new(0.8);
        let spec = FadeSpec::new(2.0, 0.0, FadeCurve::Linear).unwrap();
        let mut fade = FadeAction::start(spec, probe.clone());

        assert_eq!(fade.state().start_source(), StartVolume::FromTarget);
        assert_eq!(fade.state().start_volume(), 0.8);
        assert_eq!(fade.state().last_set_volume(), 0.8);

        fade.step(1.0);
        assert!((probe.current() - 0.4).abs() < EPS);
    }

    #[test]
    fn test_s_curve_fade_out() {
        let probe = ProbeTarget::new(1.0);
        let spec = FadeSpec::new(1.0, 0.0, FadeCurve::SCurve).unwrap();
        let mut fade = FadeAction::start(spec, probe.clone());

        fade.step(0.25);
        // smoothstep(0.25) = 0.15625
        assert!((probe.current() - 0.84375).abs() < EPS);
        fade.step(0.25);
        assert!((probe.current() - 0.5).abs() < EPS);
    }

    #[test]
    fn test_overshoot_lands_on_final() {
        let probe = ProbeTarget::new(0.0);
        let spec = FadeSpec::new(0.3, 0.6, FadeCurve::Exponential)
            .unwrap()
            .with_start_volume(0.2)
            .unwrap();
        let mut fade = FadeAction::start(spec, probe.clone());

        assert_eq!(fade.step(10.0), FadeStatus::Completed);
        assert_eq!(probe.current(), 0.6);
        assert_eq!(fade.state().last_set_volume(), 0.6);
    }

    #[test]
    fn test_writes_are_monotonic() {
        let probe = ProbeTarget::new(1.0);
        let spec = FadeSpec::new(1.0, 0.0, FadeCurve::Exponential).unwrap();
        let mut fade = FadeAction::start(spec, probe.clone());
        while fade.step(1.0 / 60.0).is_active() {}

        let writes = probe.writes();
        assert!(writes.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(writes.last().copied(), Some(0.0));
    }
}
