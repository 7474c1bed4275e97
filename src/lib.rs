//! # Skeletal Animation
//!
//! A skeletal animation evaluation pipeline built with Rust.
//!
//! 把加载器给出的关节层级和关键帧数据变成顶点着色器消费的蒙皮矩阵。
//! 文件格式解析（glTF/COLLADA）和 GPU 资源管理都在本库之外：加载器
//! 负责产出 [`Skeleton`] 和 [`KeyframeTrack`]，渲染器消费
//! [`PoseEvaluator`] 输出的稠密矩阵数组。
//!
//! ## Features
//!
//! - **Joint Hierarchy**: 扁平 arena 存储的关节树，前序遍历
//! - **Bind Pose**: 一次性的逆绑定矩阵计算与缓存
//! - **Keyframe Sampling**: Linear / Step / CubicSpline 插值，
//!   旋转走最短路径 slerp
//! - **Pose Evaluation**: 每帧无分配的蒙皮矩阵调色板
//! - **Playback**: 播放器组件处理循环/截断/变速
//!
//! ## Architecture Design
//!
//! This crate follows the **Anemic Domain Model (贫血模型)** pattern:
//! - **Data**: [`Skeleton`]、[`KeyframeTrack`]、[`AnimationPlayer`] 是纯数据结构
//! - **Service**: [`BindPoseCalculator`]、[`AnimationService`] 封装业务逻辑
//! - **Per-frame state**: [`PoseSampler`]、[`PoseEvaluator`] 持有热路径缓冲区，
//!   每个动画实例一份，骨骼本身可跨实例只读共享
//!
//! ## 使用示例
//!
//! ```rust
//! use skeletal_animation::{
//!     AnimationPlayer, AnimationService, BindPoseCalculator, InterpolationMode, Joint,
//!     JointPose, JointTransform, Keyframe, KeyframeTrack, PoseEvaluator, PoseSampler, Skeleton,
//! };
//! use glam::{Quat, Vec3};
//!
//! // 构建骨骼（加载器产物）
//! let joints = vec![
//!     Joint::new("root", None),
//!     Joint::new("arm", Some(0)).with_bind_transform(JointTransform::new(
//!         Vec3::new(0.0, 1.0, 0.0),
//!         Quat::IDENTITY,
//!         Vec3::ONE,
//!     )),
//! ];
//! let mut skeleton = Skeleton::new(joints).unwrap();
//!
//! // 逆绑定矩阵只在加载时算一次
//! BindPoseCalculator::compute_inverse_bind_transforms(&mut skeleton).unwrap();
//!
//! // 关键帧轨道：arm 在 1 秒内绕 Y 转 90°
//! let rest = JointTransform::new(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY, Vec3::ONE);
//! let mut k0 = Keyframe::new(0.0);
//! k0.add_pose("arm", JointPose::new(rest));
//! let mut turned = rest;
//! turned.rotation = Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);
//! let mut k1 = Keyframe::new(1.0);
//! k1.add_pose("arm", JointPose::new(turned));
//! let track = KeyframeTrack::new(vec![k0, k1], InterpolationMode::Linear).unwrap();
//!
//! // 每帧：播放器推进时间，采样器出局部姿态，评估器出蒙皮矩阵
//! let sampler = PoseSampler::new(&skeleton, &track);
//! let mut evaluator = PoseEvaluator::for_skeleton(&skeleton);
//! let mut player = AnimationPlayer::new(track.duration());
//! AnimationService::play(&mut player);
//! AnimationService::update(&mut player, 0.5);
//!
//! let pose = sampler.sample(player.current_time);
//! let palette = evaluator.evaluate(&skeleton, &pose);
//! assert_eq!(palette.len(), 2);
//! ```
//!
//! ## 约定
//!
//! 列主序矩阵（glam），列向量，后乘：`model = parent_model * local`，
//! `skinning = model * inverse_bind`，局部变换为 `T * R * S`。
//! 与 glTF 一致；搞反会得到镜像/翻转的层级而不是崩溃，测试里钉死了
//! 这一约定。

/// 绑定姿态计算（逆绑定矩阵）
pub mod bind_pose;
/// 动画错误类型
pub mod error;
/// 姿态评估（蒙皮矩阵调色板）
pub mod evaluator;
/// 关键帧数据结构
pub mod keyframe;
/// 动画播放状态
pub mod player;
/// 姿态采样（关键帧插值）
pub mod sampler;
/// 骨骼数据结构
pub mod skeleton;

pub use bind_pose::BindPoseCalculator;
pub use error::AnimationError;
pub use evaluator::PoseEvaluator;
pub use keyframe::{InterpolationMode, JointPose, Keyframe, KeyframeTrack, SplineTangents};
pub use player::{AnimationPlayer, AnimationService};
pub use sampler::PoseSampler;
pub use skeleton::{DepthFirstIter, Joint, JointTransform, LocalPose, Skeleton};
