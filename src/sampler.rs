//! 姿态采样
//!
//! [`PoseSampler`] 在加载时把一条 [`KeyframeTrack`] 绑定到一个
//! [`Skeleton`] 上：关节名称解析为索引只做一次，每个关键帧被稠密化为
//! “每关节一个局部变换”（缺席的关节填绑定姿态），热路径上只剩整数
//! 索引和紧凑数组。
//!
//! 采样在轨道两端截断（不外插、不自动循环）；循环播放由调用方在采样
//! 前把时间回绕到 `[0, duration)`，见 [`crate::AnimationService`]。

use glam::{Quat, Vec4};

use crate::keyframe::{InterpolationMode, JointPose, KeyframeTrack};
use crate::skeleton::{JointTransform, LocalPose, Skeleton};

/// 姿态采样器 - 把播放时间变成每个关节的局部变换
pub struct PoseSampler {
    /// 关键帧时间（严格递增，来自轨道校验）
    times: Vec<f32>,
    /// 稠密化的关键帧：frames[k][joint_index]
    frames: Vec<Vec<JointPose>>,
    interpolation: InterpolationMode,
}

impl PoseSampler {
    /// 绑定轨道到骨骼
    ///
    /// 引用了骨骼中不存在的关节名的采样会被跳过，并对每个未知名称
    /// 记录一条警告（下游工具链经常导出多余的轨道，这不是错误）。
    pub fn new(skeleton: &Skeleton, track: &KeyframeTrack) -> Self {
        let bind = skeleton.bind_local_pose();
        let mut warned: Vec<&str> = Vec::new();

        let frames = track
            .keyframes
            .iter()
            .map(|keyframe| {
                let mut dense: Vec<JointPose> =
                    bind.transforms.iter().map(|t| JointPose::new(*t)).collect();
                for (name, pose) in &keyframe.poses {
                    match skeleton.get_joint_index(name) {
                        Some(index) => dense[index] = *pose,
                        None => {
                            if !warned.contains(&name.as_str()) {
                                warned.push(name);
                                log::warn!(
                                    "animation track references unknown joint '{}', skipping",
                                    name
                                );
                            }
                        }
                    }
                }
                dense
            })
            .collect();

        Self {
            times: track.keyframes.iter().map(|k| k.time).collect(),
            frames,
            interpolation: track.interpolation,
        }
    }

    /// 骨骼的关节数量
    pub fn joint_count(&self) -> usize {
        self.frames[0].len()
    }

    /// 轨道时长
    pub fn duration(&self) -> f32 {
        self.times[self.times.len() - 1]
    }

    /// 采样指定播放时间的姿态
    pub fn sample(&self, playback_time: f32) -> LocalPose {
        let mut out = LocalPose::with_joint_count(self.joint_count());
        self.sample_into(playback_time, &mut out);
        out
    }

    /// 采样到调用方复用的缓冲区（渲染热路径，无分配）
    pub fn sample_into(&self, playback_time: f32, out: &mut LocalPose) {
        out.transforms
            .resize(self.joint_count(), JointTransform::IDENTITY);

        // 非有限时间按轨道起点处理，避免越界
        let t = if playback_time.is_finite() {
            playback_time
        } else {
            self.times[0]
        };

        // 两端截断：原样返回边界关键帧，不外插
        if t <= self.times[0] {
            self.copy_frame(0, out);
            return;
        }
        let last = self.times.len() - 1;
        if t >= self.times[last] {
            self.copy_frame(last, out);
            return;
        }

        // 二分查找包夹关键帧：times[prev] <= t < times[next]
        let next = self.times.partition_point(|&kt| kt <= t);
        let prev = next - 1;

        match self.interpolation {
            InterpolationMode::Step => self.copy_frame(prev, out),
            InterpolationMode::Linear => {
                let s = (t - self.times[prev]) / (self.times[next] - self.times[prev]);
                for (i, slot) in out.transforms.iter_mut().enumerate() {
                    *slot = self.frames[prev][i]
                        .transform
                        .lerp(&self.frames[next][i].transform, s);
                }
            }
            InterpolationMode::CubicSpline => {
                let dt = self.times[next] - self.times[prev];
                let s = (t - self.times[prev]) / dt;
                for (i, slot) in out.transforms.iter_mut().enumerate() {
                    *slot = hermite(&self.frames[prev][i], &self.frames[next][i], dt, s);
                }
            }
        }
    }

    fn copy_frame(&self, frame: usize, out: &mut LocalPose) {
        for (slot, pose) in out.transforms.iter_mut().zip(self.frames[frame].iter()) {
            *slot = pose.transform;
        }
    }
}

/// glTF CUBICSPLINE 约定的 Hermite 插值
///
/// 稠密化时补进来的绑定姿态采样没有切线，按零切线处理。
fn hermite(k0: &JointPose, k1: &JointPose, dt: f32, s: f32) -> JointTransform {
    let t0 = k0.tangents.unwrap_or_default();
    let t1 = k1.tangents.unwrap_or_default();

    let s2 = s * s;
    let s3 = s2 * s;
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;

    let translation = k0.transform.translation * h00
        + t0.out_translation * (dt * h10)
        + k1.transform.translation * h01
        + t1.in_translation * (dt * h11);
    let scale = k0.transform.scale * h00
        + t0.out_scale * (dt * h10)
        + k1.transform.scale * h01
        + t1.in_scale * (dt * h11);

    // 旋转按原始四元数分量插值后重新归一化
    let q0 = Vec4::from(k0.transform.rotation);
    let q1 = Vec4::from(k1.transform.rotation);
    let rotation = q0 * h00 + t0.out_rotation * (dt * h10) + q1 * h01 + t1.in_rotation * (dt * h11);

    JointTransform::new(
        translation,
        Quat::from_vec4(rotation).normalize(),
        scale,
    )
}
