//! # Bindings 模块
//!
//! 把 [`VolumeTarget`] 绑定到具体的音频对象。
//!
//! - `MixerGainTarget`: 音效引擎主增益，停止时停止所有音效
//! - `LongAudioTarget`: 长音频（BGM）
//! - `SoundSourceTarget`: 音源池中的单个音源
//!
//! 绑定只持有 `Weak` 引用，不延长对象寿命；对象销毁或音源被回收后，
//! 读取返回 `None`，写入返回 `false`。

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::engine::{LongAudioSource, SoundEngine, SourceId};
use crate::target::VolumeTarget;

/// 音效引擎主增益
#[derive(Debug, Clone)]
pub struct MixerGainTarget {
    engine: Weak<RefCell<SoundEngine>>,
}

impl MixerGainTarget {
    pub fn new(engine: &Rc<RefCell<SoundEngine>>) -> Self {
        Self {
            engine: Rc::downgrade(engine),
        }
    }
}

impl VolumeTarget for MixerGainTarget {
    fn volume(&self) -> Option<f32> {
        let engine = self.engine.upgrade()?;
        let gain = engine.borrow().master_gain();
        Some(gain)
    }

    fn set_volume(&mut self, volume: f32) -> bool {
        match self.engine.upgrade() {
            Some(engine) => {
                engine.borrow_mut().set_master_gain(volume);
                true
            }
            None => false,
        }
    }

    fn stop(&mut self) {
        if let Some(engine) = self.engine.upgrade() {
            engine.borrow_mut().stop_all_sounds();
        }
    }

    fn describe(&self) -> String {
        "MixerGain".to_string()
    }
}

/// 长音频
#[derive(Debug, Clone)]
pub struct LongAudioTarget {
    source: Weak<RefCell<LongAudioSource>>,
}

impl LongAudioTarget {
    pub fn new(source: &Rc<RefCell<LongAudioSource>>) -> Self {
        Self {
            source: Rc::downgrade(source),
        }
    }
}

impl VolumeTarget for LongAudioTarget {
    fn volume(&self) -> Option<f32> {
        let source = self.source.upgrade()?;
        let volume = source.borrow().volume();
        Some(volume)
    }

    fn set_volume(&mut self, volume: f32) -> bool {
        match self.source.upgrade() {
            Some(source) => {
                source.borrow_mut().set_volume(volume);
                true
            }
            None => false,
        }
    }

    fn stop(&mut self) {
        if let Some(source) = self.source.upgrade() {
            source.borrow_mut().stop();
        }
    }

    fn describe(&self) -> String {
        match self.source.upgrade() {
            Some(source) => format!("LongAudio({})", source.borrow().path()),
            None => "LongAudio(<dropped>)".to_string(),
        }
    }
}

/// 音源池中的音源
#[derive(Debug, Clone)]
pub struct SoundSourceTarget {
    engine: Weak<RefCell<SoundEngine>>,
    source_id: SourceId,
}

impl SoundSourceTarget {
    pub fn new(engine: &Rc<RefCell<SoundEngine>>, source_id: SourceId) -> Self {
        Self {
            engine: Rc::downgrade(engine),
            source_id,
        }
    }

    pub fn source_id(&self) -> SourceId {
        self.source_id
    }
}

impl VolumeTarget for SoundSourceTarget {
    fn volume(&self) -> Option<f32> {
        let engine = self.engine.upgrade()?;
        let engine = engine.borrow();
        engine.source(self.source_id).map(|s| s.gain())
    }

    fn set_volume(&mut self, volume: f32) -> bool {
        let Some(engine) = self.engine.upgrade() else {
            return false;
        };
        let mut engine = engine.borrow_mut();
        match engine.source_mut(self.source_id) {
            Some(source) => {
                source.set_gain(volume);
                true
            }
            None => false,
        }
    }

    fn stop(&mut self) {
        let Some(engine) = self.engine.upgrade() else {
            return;
        };
        if let Some(source) = engine.borrow_mut().source_mut(self.source_id) {
            source.stop();
        }
    }

    fn describe(&self) -> String {
        format!("SoundSource({})", self.source_id.0)
    }
}
