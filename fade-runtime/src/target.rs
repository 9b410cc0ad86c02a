//! # Target 模块
//!
//! 渐变目标接口：可读写音量、可停止的音频对象。
//!
//! 渐变控制器不拥有目标，只通过此接口访问。具体绑定见 [`crate::bindings`]。

/// 音量目标接口
///
/// ## 约定
///
/// - `volume()` 返回 `None` 表示目标已销毁或不可达
/// - `set_volume()` 返回 `false` 表示写入失败（同样视为目标失效）
/// - 三个操作之外，控制器不会访问目标的任何其他状态
pub trait VolumeTarget {
    /// 获取当前音量
    fn volume(&self) -> Option<f32>;

    /// 设置新音量
    fn set_volume(&mut self, volume: f32) -> bool;

    /// 停止目标播放
    fn stop(&mut self);

    /// 目标的描述字符串（用于调试日志）
    fn describe(&self) -> String {
        "VolumeTarget".to_string()
    }
}

impl<T: VolumeTarget + ?Sized> VolumeTarget for Box<T> {
    fn volume(&self) -> Option<f32> {
        (**self).volume()
    }

    fn set_volume(&mut self, volume: f32) -> bool {
        (**self).set_volume(volume)
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
