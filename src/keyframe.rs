//! 关键帧数据结构
//!
//! 一个 [`KeyframeTrack`] 是一个动画片段的有序关键帧序列；每个
//! [`Keyframe`] 携带时间戳和该时刻各关节的局部变换。关键帧按名称
//! 引用关节（关键帧数据和骨骼数据来自独立的工具链），名称到索引的
//! 解析在 [`crate::PoseSampler`] 绑定骨骼时一次性完成。
//!
//! 结构性校验（非空、时间严格递增、CubicSpline 切线齐全）在
//! [`KeyframeTrack::new`] 构造时完成，采样路径不再返回错误。

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::AnimationError;
use crate::skeleton::JointTransform;

/// 插值模式（遵循 glTF 动画采样器约定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpolationMode {
    /// 线性插值（平移/缩放 lerp，旋转最短路径 slerp）
    Linear,
    /// 阶梯插值（保持前一关键帧的值，无插值）
    Step,
    /// 三次样条插值（Hermite，需要每个关键帧的出入切线）
    CubicSpline,
}

/// 三次样条的出入切线
///
/// 旋转切线是原始四元数分量的导数（非单位四元数），与 glTF
/// CUBICSPLINE 的存储方式一致。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SplineTangents {
    pub in_translation: Vec3,
    pub out_translation: Vec3,
    pub in_rotation: Vec4,
    pub out_rotation: Vec4,
    pub in_scale: Vec3,
    pub out_scale: Vec3,
}

/// 某个关节在某个关键帧上的采样
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JointPose {
    /// 局部变换
    pub transform: JointTransform,
    /// 切线数据（仅 CubicSpline 模式需要）
    pub tangents: Option<SplineTangents>,
}

impl JointPose {
    pub fn new(transform: JointTransform) -> Self {
        Self {
            transform,
            tangents: None,
        }
    }

    pub fn with_tangents(transform: JointTransform, tangents: SplineTangents) -> Self {
        Self {
            transform,
            tangents: Some(tangents),
        }
    }
}

/// 关键帧 - 时间戳加该时刻所有被动画关节的局部变换
///
/// 未显式出现的关节在该关键帧保持绑定姿态的局部变换。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyframe {
    /// 时间（秒，>= 0）
    pub time: f32,
    /// 关节名称 -> 该时刻的局部变换
    pub poses: HashMap<String, JointPose>,
}

impl Keyframe {
    pub fn new(time: f32) -> Self {
        Self {
            time,
            poses: HashMap::new(),
        }
    }

    /// 添加一个关节的采样
    pub fn add_pose(&mut self, joint_name: impl Into<String>, pose: JointPose) {
        self.poses.insert(joint_name.into(), pose);
    }
}

/// 关键帧轨道 - 一个动画片段的有序关键帧序列
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyframeTrack {
    /// 关键帧列表（时间严格递增）
    pub keyframes: Vec<Keyframe>,
    /// 插值模式
    pub interpolation: InterpolationMode,
}

impl KeyframeTrack {
    /// 创建并校验轨道
    ///
    /// 失败条件：没有关键帧、时间为负或 NaN、时间非严格递增、
    /// CubicSpline 模式下有关键帧缺少切线。
    pub fn new(
        keyframes: Vec<Keyframe>,
        interpolation: InterpolationMode,
    ) -> Result<Self, AnimationError> {
        if keyframes.is_empty() {
            return Err(AnimationError::EmptyTrack);
        }

        for (index, keyframe) in keyframes.iter().enumerate() {
            if keyframe.time.is_nan() || keyframe.time < 0.0 {
                return Err(AnimationError::InvalidKeyframeTime { index });
            }
            if index > 0 && keyframe.time <= keyframes[index - 1].time {
                return Err(AnimationError::UnorderedKeyframes { index });
            }
            if interpolation == InterpolationMode::CubicSpline {
                for (name, pose) in &keyframe.poses {
                    if pose.tangents.is_none() {
                        return Err(AnimationError::MissingSplineTangents {
                            index,
                            joint: name.clone(),
                        });
                    }
                }
            }
        }

        Ok(Self {
            keyframes,
            interpolation,
        })
    }

    /// 轨道起始时间（习惯上是 0，但不强制）
    pub fn start_time(&self) -> f32 {
        self.keyframes[0].time
    }

    /// 轨道时长（最后一个关键帧的时间）
    pub fn duration(&self) -> f32 {
        self.keyframes[self.keyframes.len() - 1].time
    }
}
