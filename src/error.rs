//! 动画错误类型
//!
//! 结构性错误（层级畸形、退化变换、空轨道）在加载/构造时一次性检出；
//! 每帧的采样与评估对已校验的输入不会失败。
//!
//! 注意：轨道引用了骨骼中不存在的关节名不是错误——下游工具链经常导出
//! 多余的轨道，采样器会跳过它们并记录一条 `log::warn!`。

use thiserror::Error;

/// 骨骼动画错误
#[derive(Error, Debug)]
pub enum AnimationError {
    /// 骨骼层级畸形（无关节、多个根、重名、不可达关节等）
    #[error("Malformed hierarchy: {0}")]
    MalformedHierarchy(String),
    /// 绑定变换不可逆（奇异矩阵，例如某轴缩放为零）
    #[error("Degenerate bind transform on joint '{joint}'")]
    DegenerateTransform { joint: String },
    /// 轨道没有任何关键帧
    #[error("Track has no keyframes")]
    EmptyTrack,
    /// 关键帧时间非严格递增
    #[error("Keyframe times not strictly increasing at index {index}")]
    UnorderedKeyframes { index: usize },
    /// 关键帧时间为负（或 NaN）
    #[error("Invalid keyframe time at index {index}")]
    InvalidKeyframeTime { index: usize },
    /// CubicSpline 模式下关键帧缺少切线数据
    #[error("Cubic spline keyframe {index} missing tangents for joint '{joint}'")]
    MissingSplineTangents { index: usize, joint: String },
}
