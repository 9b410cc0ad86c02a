//! # Scheduler 模块
//!
//! 渐变调度器：持有进行中的渐变，每帧统一推进，并产出事件。
//!
//! ```rust,ignore
//! let mut scheduler = FadeScheduler::new();
//! let id = scheduler.run(spec, LongAudioTarget::new(&bgm));
//!
//! // 每帧
//! scheduler.update(dt);
//! for event in scheduler.drain_events() { ... }
//! ```
//!
//! 同一个目标上启动第二个渐变时不需要手动取消第一个：
//! 只要新渐变的首次写入改变了音量，旧渐变会在下一帧检测到变化并自行中止。
//! 起始音量取自目标的新渐变不会改变音量，此时应先 `stop` 旧渐变。

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::FadeConfig;
use crate::fader::{AbortReason, FadeAction, FadeState, FadeStatus};
use crate::spec::FadeSpec;
use crate::target::VolumeTarget;

/// 渐变 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FadeId(pub u64);

impl std::fmt::Display for FadeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FadeId({})", self.0)
    }
}

/// 渐变事件
#[derive(Debug, Clone, PartialEq)]
pub enum FadeEvent {
    /// 渐变开始
    Started(FadeId),
    /// 渐变自然完成
    Completed(FadeId),
    /// 渐变被停止
    Stopped(FadeId),
    /// 渐变中止
    Aborted(FadeId, AbortReason),
}

type BoxedFade = FadeAction<Box<dyn VolumeTarget>>;

/// 渐变调度器
///
/// 已结束的渐变在产生对应事件后立即移除。
/// 更新顺序按 ID 升序，保证事件顺序确定。
pub struct FadeScheduler {
    fades: BTreeMap<FadeId, BoxedFade>,
    next_id: u64,
    events: Vec<FadeEvent>,
    tamper_epsilon: f32,
}

impl Default for FadeScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FadeScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FadeScheduler")
            .field("fades", &self.fades.len())
            .field("events", &self.events.len())
            .field("tamper_epsilon", &self.tamper_epsilon)
            .finish()
    }
}

impl FadeScheduler {
    pub fn new() -> Self {
        Self::with_config(&FadeConfig::default())
    }

    pub fn with_config(config: &FadeConfig) -> Self {
        Self {
            fades: BTreeMap::new(),
            next_id: 1,
            events: Vec::new(),
            tamper_epsilon: config.tamper_epsilon,
        }
    }

    fn next_fade_id(&mut self) -> FadeId {
        let id = FadeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// 启动渐变
    ///
    /// 立即执行首次写入。零时长或目标不可用的渐变会在这里直接结束，
    /// 事件队列中紧跟 `Started` 出现对应的结束事件。
    pub fn run<T: VolumeTarget + 'static>(&mut self, spec: FadeSpec, target: T) -> FadeId {
        let id = self.next_fade_id();
        let target: Box<dyn VolumeTarget> = Box::new(target);
        let fade = FadeAction::start_with_tolerance(spec, target, self.tamper_epsilon);

        self.events.push(FadeEvent::Started(id));
        debug!(id = %id, "注册渐变");

        if fade.status().is_active() {
            self.fades.insert(id, fade);
        } else {
            self.push_finished(id, fade.status());
        }
        id
    }

    /// 推进所有渐变
    pub fn update(&mut self, dt: f32) {
        let mut finished = Vec::new();

        for (id, fade) in &mut self.fades {
            let status = fade.step(dt);
            if status.is_finished() {
                finished.push((*id, status));
            }
        }

        for (id, status) in finished {
            self.fades.remove(&id);
            self.push_finished(id, status);
        }
    }

    /// 停止渐变，保留目标的当前音量
    ///
    /// # 返回
    /// - `true`: 渐变存在且已停止
    /// - `false`: 渐变不存在（可能已结束）
    pub fn stop(&mut self, id: FadeId) -> bool {
        match self.fades.remove(&id) {
            Some(mut fade) => {
                let status = fade.stop();
                self.push_finished(id, status);
                true
            }
            None => false,
        }
    }

    /// 停止所有渐变
    pub fn stop_all(&mut self) {
        let ids: Vec<FadeId> = self.fades.keys().copied().collect();
        for id in ids {
            self.stop(id);
        }
    }

    /// 进行中渐变的状态
    pub fn state(&self, id: FadeId) -> Option<&FadeState> {
        self.fades.get(&id).map(FadeAction::state)
    }

    pub fn is_running(&self, id: FadeId) -> bool {
        self.fades.contains_key(&id)
    }

    pub fn active_count(&self) -> usize {
        self.fades.len()
    }

    pub fn has_active_fades(&self) -> bool {
        !self.fades.is_empty()
    }

    /// 取出待处理事件
    pub fn drain_events(&mut self) -> Vec<FadeEvent> {
        std::mem::take(&mut self.events)
    }

    fn push_finished(&mut self, id: FadeId, status: FadeStatus) {
        let event = match status {
            FadeStatus::Completed => FadeEvent::Completed(id),
            FadeStatus::Stopped => FadeEvent::Stopped(id),
            FadeStatus::Aborted(reason) => FadeEvent::Aborted(id, reason),
            FadeStatus::Running => return,
        };
        debug!(id = %id, event = ?event, "渐变结束");
        self.events.push(event);
    }
}
