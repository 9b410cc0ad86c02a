//! # Curve 模块
//!
//! 渐变曲线，把归一化时间映射为归一化进度。
//!
//! 所有曲线在 [0, 1] 上单调不减，并满足 `apply(0) = 0`、`apply(1) = 1`。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FadeError;

/// 渐变曲线类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FadeCurve {
    /// 线性（匀速）
    #[default]
    Linear,
    /// S 曲线（smoothstep，两头慢中间快，关于 t = 0.5 对称）
    SCurve,
    /// 指数型缓入（先慢后快）
    Exponential,
}

impl FadeCurve {
    /// 全部曲线，按声明顺序
    pub const ALL: [FadeCurve; 3] = [Self::Linear, Self::SCurve, Self::Exponential];

    /// 计算缓动值
    ///
    /// # 参数
    /// - `t`: 时间进度 (0.0 - 1.0)，超出范围会被限制
    ///
    /// # 返回
    /// - 缓动后的进度值 (0.0 - 1.0)
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            FadeCurve::Linear => t,
            FadeCurve::SCurve => smoothstep(t),
            FadeCurve::Exponential => t * t,
        }
    }

    /// 曲线名称（与 serde 表示一致）
    pub fn name(&self) -> &'static str {
        match self {
            FadeCurve::Linear => "linear",
            FadeCurve::SCurve => "s_curve",
            FadeCurve::Exponential => "exponential",
        }
    }
}

/// 三次 Hermite smoothstep
fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

impl fmt::Display for FadeCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FadeCurve {
    type Err = FadeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "s_curve" | "scurve" | "s-curve" => Ok(Self::SCurve),
            "exponential" | "exp" => Ok(Self::Exponential),
            _ => Err(FadeError::UnknownCurve {
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    fn samples() -> impl Iterator<Item = f32> {
        (0..=100).map(|i| i as f32 / 100.0)
    }

    #[test]
    fn test_boundaries() {
        for curve in FadeCurve::ALL {
            assert_eq!(curve.apply(0.0), 0.0, "{curve}");
            assert_eq!(curve.apply(1.0), 1.0, "{curve}");
        }
    }

    #[test]
    fn test_monotonic() {
        for curve in FadeCurve::ALL {
            let mut prev = curve.apply(0.0);
            for t in samples() {
                let v = curve.apply(t);
                assert!(v >= prev, "{curve} 在 t = {t} 处下降");
                assert!((0.0..=1.0).contains(&v));
                prev = v;
            }
        }
    }

    #[test]
    fn test_s_curve_symmetric() {
        let curve = FadeCurve::SCurve;
        for t in samples() {
            let sum = curve.apply(t) + curve.apply(1.0 - t);
            assert!((sum - 1.0).abs() < EPS, "t = {t}, sum = {sum}");
        }
        assert!((curve.apply(0.5) - 0.5).abs() < EPS);
    }

    #[test]
    fn test_exponential_slow_start() {
        let curve = FadeCurve::Exponential;
        // 前半段低于线性，后半段追上
        assert!(curve.apply(0.25) < 0.25);
        assert!(curve.apply(0.5) < 0.5);
        assert!((curve.apply(0.5) - 0.25).abs() < EPS);
    }

    #[test]
    fn test_clamp() {
        for curve in FadeCurve::ALL {
            assert_eq!(curve.apply(-0.5), 0.0);
            assert_eq!(curve.apply(1.5), 1.0);
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!("linear".parse::<FadeCurve>(), Ok(FadeCurve::Linear));
        assert_eq!("SCurve".parse::<FadeCurve>(), Ok(FadeCurve::SCurve));
        assert_eq!("s_curve".parse::<FadeCurve>(), Ok(FadeCurve::SCurve));
        assert_eq!("exp".parse::<FadeCurve>(), Ok(FadeCurve::Exponential));
        assert!(matches!(
            "bounce".parse::<FadeCurve>(),
            Err(FadeError::UnknownCurve { .. })
        ));

        for curve in FadeCurve::ALL {
            assert_eq!(curve.to_string().parse::<FadeCurve>(), Ok(curve));
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&FadeCurve::SCurve).unwrap();
        assert_eq!(json, "\"s_curve\"");
        let curve: FadeCurve = serde_json::from_str("\"exponential\"").unwrap();
        assert_eq!(curve, FadeCurve::Exponential);
    }
}
