//! # Engine 模块
//!
//! 内存中的音频引擎模型，只维护音量与播放状态，不做混音与设备输出。
//!
//! ## 对象
//!
//! - `SoundEngine`: 音效引擎，持有主增益与音源池
//! - `SoundSource`: 池中的单个音源（音效实例）
//! - `LongAudioSource`: 长音频（BGM）
//! - `AudioEngine`: 门面，持有共享的音效引擎与当前 BGM
//!
//! 对象通过 `Rc<RefCell<T>>` 共享，绑定层持有 `Weak` 引用，
//! 对象被销毁后绑定自然失效。

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;

/// 默认音源池大小
pub const DEFAULT_SOURCE_POOL_SIZE: usize = 32;

/// 音源 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(pub u32);

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SourceId({})", self.0)
    }
}

/// 池中的音源
#[derive(Debug, Clone, PartialEq)]
pub struct SoundSource {
    id: SourceId,
    sound: String,
    gain: f32,
    playing: bool,
}

impl SoundSource {
    pub fn id(&self) -> SourceId {
        self.id
    }

    /// 播放中的音效名
    pub fn sound(&self) -> &str {
        &self.sound
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// 设置增益（限制在 0.0 - 1.0）
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 1.0);
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }
}

/// 音效引擎
///
/// 音源池满时回收最早的音源（优先回收已停止的），
/// 被回收音源的 ID 随之失效。
#[derive(Debug)]
pub struct SoundEngine {
    master_gain: f32,
    sources: BTreeMap<SourceId, SoundSource>,
    next_source_id: u32,
    capacity: usize,
}

impl Default for SoundEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundEngine {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SOURCE_POOL_SIZE)
    }

    /// 创建指定池大小的音效引擎（至少为 1）
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            master_gain: 1.0,
            sources: BTreeMap::new(),
            next_source_id: 1,
            capacity: capacity.max(1),
        }
    }

    /// 主增益
    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    /// 设置主增益（限制在 0.0 - 1.0）
    pub fn set_master_gain(&mut self, gain: f32) {
        self.master_gain = gain.clamp(0.0, 1.0);
    }

    /// 播放音效，返回分配的音源 ID
    pub fn play_sound(&mut self, sound: impl Into<String>, gain: f32) -> SourceId {
        if self.sources.len() >= self.capacity {
            self.recycle_one();
        }

        let id = SourceId(self.next_source_id);
        self.next_source_id += 1;

        let source = SoundSource {
            id,
            sound: sound.into(),
            gain: gain.clamp(0.0, 1.0),
            playing: true,
        };
        debug!(source = %id, sound = %source.sound, "播放音效");
        self.sources.insert(id, source);
        id
    }

    fn recycle_one(&mut self) {
        let victim = self
            .sources
            .values()
            .find(|s| !s.playing)
            .map(|s| s.id)
            .or_else(|| self.sources.keys().next().copied());

        if let Some(id) = victim {
            self.sources.remove(&id);
            debug!(source = %id, "音源池已满，回收音源");
        }
    }

    pub fn source(&self, id: SourceId) -> Option<&SoundSource> {
        self.sources.get(&id)
    }

    pub fn source_mut(&mut self, id: SourceId) -> Option<&mut SoundSource> {
        self.sources.get_mut(&id)
    }

    /// 释放音源
    pub fn release_source(&mut self, id: SourceId) -> bool {
        self.sources.remove(&id).is_some()
    }

    /// 停止所有音效
    pub fn stop_all_sounds(&mut self) {
        for source in self.sources.values_mut() {
            source.stop();
        }
        debug!(count = self.sources.len(), "停止所有音效");
    }

    /// 正在播放的音源数量
    pub fn playing_count(&self) -> usize {
        self.sources.values().filter(|s| s.playing).count()
    }
}

/// 长音频（BGM）
#[derive(Debug, Clone, PartialEq)]
pub struct LongAudioSource {
    path: String,
    volume: f32,
    looping: bool,
    playing: bool,
}

impl LongAudioSource {
    pub fn new(path: impl Into<String>, looping: bool) -> Self {
        Self {
            path: path.into(),
            volume: 1.0,
            looping,
            playing: false,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// 设置音量（限制在 0.0 - 1.0）
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }
}

/// 音频引擎门面
///
/// 持有共享的 `SoundEngine` 与当前 BGM。
/// 切换 BGM 会丢弃旧的 `LongAudioSource`。
#[derive(Debug)]
pub struct AudioEngine {
    sound_engine: Rc<RefCell<SoundEngine>>,
    background_music: Option<Rc<RefCell<LongAudioSource>>>,
}

impl Default for AudioEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine {
    pub fn new() -> Self {
        Self::with_sound_engine(SoundEngine::new())
    }

    pub fn with_sound_engine(sound_engine: SoundEngine) -> Self {
        Self {
            sound_engine: Rc::new(RefCell::new(sound_engine)),
            background_music: None,
        }
    }

    /// 共享的音效引擎
    pub fn sound_engine(&self) -> &Rc<RefCell<SoundEngine>> {
        &self.sound_engine
    }

    /// 播放 BGM（替换当前 BGM）
    pub fn play_background_music(
        &mut self,
        path: impl Into<String>,
        looping: bool,
    ) -> Rc<RefCell<LongAudioSource>> {
        let mut source = LongAudioSource::new(path, looping);
        source.play();
        debug!(path = %source.path(), looping = looping, "播放 BGM");

        let source = Rc::new(RefCell::new(source));
        self.background_music = Some(Rc::clone(&source));
        source
    }

    /// 停止并丢弃当前 BGM
    pub fn stop_background_music(&mut self) {
        if let Some(source) = self.background_music.take() {
            source.borrow_mut().stop();
            debug!("停止 BGM");
        }
    }

    /// 当前 BGM
    pub fn background_music(&self) -> Option<&Rc<RefCell<LongAudioSource>>> {
        self.background_music.as_ref()
    }

    /// 是否正在播放 BGM
    pub fn is_background_music_playing(&self) -> bool {
        self.background_music
            .as_ref()
            .is_some_and(|s| s.borrow().is_playing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_master_gain_clamp() {
        let mut engine = SoundEngine::new();
        assert_eq!(engine.master_gain(), 1.0);

        engine.set_master_gain(1.5);
        assert_eq!(engine.master_gain(), 1.0);

        engine.set_master_gain(-0.5);
        assert_eq!(engine.master_gain(), 0.0);
    }

    #[test]
    fn test_play_and_stop_sounds() {
        let mut engine = SoundEngine::new();
        let a = engine.play_sound("click.wav", 0.8);
        let b = engine.play_sound("boom.wav", 2.0);

        assert_ne!(a, b);
        assert_eq!(engine.playing_count(), 2);
        assert_eq!(engine.source(b).map(SoundSource::gain), Some(1.0));

        engine.stop_all_sounds();
        assert_eq!(engine.playing_count(), 0);
        // 停止后音源仍在池中
        assert!(engine.source(a).is_some());
    }

    #[test]
    fn test_pool_recycles_stopped_first() {
        let mut engine = SoundEngine::with_capacity(2);
        let a = engine.play_sound("a.wav", 1.0);
        let b = engine.play_sound("b.wav", 1.0);
        engine.source_mut(b).unwrap().stop();

        let c = engine.play_sound("c.wav", 1.0);
        assert!(engine.source(a).is_some());
        assert!(engine.source(b).is_none());
        assert!(engine.source(c).is_some());

        // 全部在播放时回收最早的
        let d = engine.play_sound("d.wav", 1.0);
        assert!(engine.source(a).is_none());
        assert!(engine.source(d).is_some());
    }

    #[test]
    fn test_release_source() {
        let mut engine = SoundEngine::new();
        let id = engine.play_sound("a.wav", 1.0);
        assert!(engine.release_source(id));
        assert!(!engine.release_source(id));
    }

    #[test]
    fn test_background_music_switch() {
        let mut audio = AudioEngine::new();
        assert!(!audio.is_background_music_playing());

        let first = audio.play_background_music("bgm/title.ogg", true);
        assert!(audio.is_background_music_playing());

        let second = audio.play_background_music("bgm/battle.ogg", true);
        assert!(!Rc::ptr_eq(&first, &second));
        assert_eq!(
            audio.background_music().map(|s| s.borrow().path().to_string()),
            Some("bgm/battle.ogg".to_string())
        );

        audio.stop_background_music();
        assert!(audio.background_music().is_none());
        assert!(!second.borrow().is_playing());
    }
}
