//! # fade-sim - 音量渐变模拟工具
//!
//! 在内存音频引擎上以固定帧率驱动一次渐变，输出每帧音量。
//! 可以在指定时间点模拟外部修改音量，观察渐变如何让位。
//!
//! ## 示例
//!
//! ```text
//! fade-sim --target music --duration 2 --to 0 --curve s_curve --stop-on-complete
//! fade-sim --target source --from 0 --to 1 --tamper-at 0.5 --tamper-volume 0.3 --json
//! ```

use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::{Level, info};

use fade_runtime::{
    AbortReason, AudioEngine, FadeConfig, FadeCurve, FadeEvent, FadeId, FadeScheduler, FadeSpec,
    LongAudioSource, SourceId, fade_background_music, fade_sound_effect, fade_sound_effects,
};

/// 渐变目标类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TargetKind {
    /// BGM
    Music,
    /// 音效引擎主增益
    Effects,
    /// 单个音效
    Source,
}

impl TargetKind {
    fn name(self) -> &'static str {
        match self {
            Self::Music => "music",
            Self::Effects => "effects",
            Self::Source => "source",
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "fade-sim", about = "以固定帧率模拟音量渐变")]
struct Cli {
    /// 渐变目标
    #[arg(long, value_enum, default_value_t = TargetKind::Music)]
    target: TargetKind,

    /// 时长（秒），缺省取配置中的 default_duration
    #[arg(long)]
    duration: Option<f32>,

    /// 起始音量，缺省取目标当前音量
    #[arg(long)]
    from: Option<f32>,

    /// 最终音量
    #[arg(long, default_value_t = 0.0)]
    to: f32,

    /// 曲线（linear / s_curve / exponential），缺省取配置中的 default_curve
    #[arg(long)]
    curve: Option<FadeCurve>,

    /// 帧率
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    fps: u32,

    /// 完成后停止目标
    #[arg(long)]
    stop_on_complete: bool,

    /// 在该时间点（秒）从外部修改音量
    #[arg(long)]
    tamper_at: Option<f32>,

    /// 外部修改后的音量
    #[arg(long, default_value_t = 1.0)]
    tamper_volume: f32,

    /// 配置文件路径
    #[arg(long)]
    config: Option<PathBuf>,

    /// 以 JSON 输出
    #[arg(long)]
    json: bool,

    /// 日志详细程度（-v / -vv / -vvv）
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// 模拟中被渐变的对象
enum Subject {
    Music(Rc<RefCell<LongAudioSource>>),
    Effects,
    Source(SourceId),
}

impl Subject {
    fn volume(&self, audio: &AudioEngine) -> f32 {
        match self {
            Self::Music(source) => source.borrow().volume(),
            Self::Effects => audio.sound_engine().borrow().master_gain(),
            Self::Source(id) => audio
                .sound_engine()
                .borrow()
                .source(*id)
                .map_or(0.0, |s| s.gain()),
        }
    }

    fn set_volume(&self, audio: &AudioEngine, volume: f32) {
        match self {
            Self::Music(source) => source.borrow_mut().set_volume(volume),
            Self::Effects => audio.sound_engine().borrow_mut().set_master_gain(volume),
            Self::Source(id) => {
                if let Some(source) = audio.sound_engine().borrow_mut().source_mut(*id) {
                    source.set_gain(volume);
                }
            }
        }
    }

    fn is_playing(&self, audio: &AudioEngine) -> bool {
        match self {
            Self::Music(source) => source.borrow().is_playing(),
            Self::Effects => audio.sound_engine().borrow().playing_count() > 0,
            Self::Source(id) => audio
                .sound_engine()
                .borrow()
                .source(*id)
                .is_some_and(|s| s.is_playing()),
        }
    }
}

#[derive(Debug, Serialize)]
struct Frame {
    frame: u32,
    time: f32,
    volume: f32,
    playing: bool,
}

#[derive(Debug, Serialize)]
struct SimReport {
    target: &'static str,
    spec: FadeSpec,
    fps: u32,
    frames: Vec<Frame>,
    outcome: String,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn build_spec(cli: &Cli, config: &FadeConfig) -> anyhow::Result<FadeSpec> {
    let duration = cli.duration.unwrap_or(config.default_duration);
    let curve = cli.curve.unwrap_or(config.default_curve);

    let mut spec = FadeSpec::new(duration, cli.to, curve)?.with_stop_on_complete(cli.stop_on_complete);
    if let Some(from) = cli.from {
        spec = spec.with_start_volume(from)?;
    }
    Ok(spec)
}

fn start_fade(
    kind: TargetKind,
    audio: &mut AudioEngine,
    scheduler: &mut FadeScheduler,
    spec: FadeSpec,
) -> anyhow::Result<(Subject, FadeId)> {
    match kind {
        TargetKind::Music => {
            let bgm = audio.play_background_music("sim/music.ogg", true);
            let id = fade_background_music(scheduler, audio, spec).context("没有可渐变的 BGM")?;
            Ok((Subject::Music(bgm), id))
        }
        TargetKind::Effects => {
            audio.sound_engine().borrow_mut().play_sound("sim/ambience.wav", 1.0);
            let id = fade_sound_effects(scheduler, audio, spec);
            Ok((Subject::Effects, id))
        }
        TargetKind::Source => {
            let source = audio
                .sound_engine()
                .borrow_mut()
                .play_sound("sim/effect.wav", 1.0);
            let id = fade_sound_effect(scheduler, audio, source, spec)
                .with_context(|| format!("音源 {source} 不存在"))?;
            Ok((Subject::Source(source), id))
        }
    }
}

fn describe_outcome(events: &[FadeEvent], id: FadeId) -> String {
    let last = events.iter().rev().find(|event| match event {
        FadeEvent::Started(_) => false,
        FadeEvent::Completed(e) | FadeEvent::Stopped(e) | FadeEvent::Aborted(e, _) => *e == id,
    });

    match last {
        Some(FadeEvent::Completed(_)) => "completed".to_string(),
        Some(FadeEvent::Stopped(_)) => "stopped".to_string(),
        Some(FadeEvent::Aborted(_, AbortReason::TamperDetected { expected, actual })) => {
            format!("aborted: tamper detected (expected {expected:.4}, actual {actual:.4})")
        }
        Some(FadeEvent::Aborted(_, AbortReason::TargetUnavailable)) => {
            "aborted: target unavailable".to_string()
        }
        Some(FadeEvent::Started(_)) | None => "running".to_string(),
    }
}

fn simulate(cli: &Cli, config: &FadeConfig) -> anyhow::Result<SimReport> {
    let spec = build_spec(cli, config)?;
    let mut audio = AudioEngine::new();
    let mut scheduler = FadeScheduler::with_config(config);
    let (subject, id) = start_fade(cli.target, &mut audio, &mut scheduler, spec)?;

    let dt = 1.0 / cli.fps as f32;
    let mut frames = vec![Frame {
        frame: 0,
        time: 0.0,
        volume: subject.volume(&audio),
        playing: subject.is_playing(&audio),
    }];
    let mut events = scheduler.drain_events();
    let mut tamper_at = cli.tamper_at;
    let mut time = 0.0_f32;
    let mut frame = 0_u32;

    while scheduler.is_running(id) {
        if tamper_at.is_some_and(|at| time >= at) {
            tamper_at = None;
            subject.set_volume(&audio, cli.tamper_volume);
            info!(time = time, volume = cli.tamper_volume, "外部修改音量");
        }

        scheduler.update(dt);
        time += dt;
        frame += 1;
        frames.push(Frame {
            frame,
            time,
            volume: subject.volume(&audio),
            playing: subject.is_playing(&audio),
        });
        events.extend(scheduler.drain_events());
    }

    Ok(SimReport {
        target: cli.target.name(),
        spec,
        fps: cli.fps,
        frames,
        outcome: describe_outcome(&events, id),
    })
}

fn print_report(report: &SimReport) {
    println!(
        "target={} curve={} duration={}s fps={}",
        report.target,
        report.spec.curve(),
        report.spec.duration(),
        report.fps
    );
    println!("{:>6}  {:>8}  {:>7}  playing", "frame", "time", "volume");
    for frame in &report.frames {
        println!(
            "{:>6}  {:>8.4}  {:>7.4}  {}",
            frame.frame, frame.time, frame.volume, frame.playing
        );
    }
    println!("outcome: {}", report.outcome);
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("fade-sim error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => FadeConfig::try_load(path)
            .with_context(|| format!("无法加载配置文件 {}", path.display()))?,
        None => FadeConfig::default(),
    };

    let report = simulate(&cli, &config)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}
