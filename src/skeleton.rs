//! 骨骼数据结构
//!
//! 定义关节层级和关节局部变换，支持复杂角色动画。
//!
//! 关节存放在扁平数组中（arena），数组下标即关节索引，也就是蒙皮矩阵
//! 在着色器可见数组中的槽位。父子关系通过索引表示，层级必须是树：
//! 恰好一个根，其余每个关节恰好一个父关节。`Skeleton::new` 在构造时
//! 校验这一点；之后的遍历不再做任何检查。

use bevy_ecs::prelude::*;
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::AnimationError;

// ============================================================================
// 关节局部变换
// ============================================================================

/// 关节局部变换（相对于父关节的 TRS）
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct JointTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl JointTransform {
    /// 单位变换
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    /// 转换为 4x4 矩阵（列主序，T * R * S）
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// 从 4x4 矩阵分解
    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    /// 插值：平移和缩放线性插值，旋转走最短路径球面插值
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            translation: self.translation.lerp(other.translation, t),
            rotation: self.rotation.slerp(other.rotation, t),
            scale: self.scale.lerp(other.scale, t),
        }
    }
}

impl Default for JointTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ============================================================================
// 关节
// ============================================================================

/// 关节节点（一根骨头）
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Joint {
    /// 关节名称（动画轨道通过名称匹配关节）
    pub name: String,
    /// 父关节索引（None 表示根关节）
    pub parent_index: Option<usize>,
    /// 子关节索引列表（由 `Skeleton::new` 根据父索引重建）
    pub children_indices: Vec<usize>,
    /// 绑定姿态下的局部变换（相对于父关节的静止变换）
    pub local_bind_transform: JointTransform,
}

impl Joint {
    pub fn new(name: impl Into<String>, parent_index: Option<usize>) -> Self {
        Self {
            name: name.into(),
            parent_index,
            children_indices: Vec::new(),
            local_bind_transform: JointTransform::IDENTITY,
        }
    }

    pub fn with_bind_transform(mut self, transform: JointTransform) -> Self {
        self.local_bind_transform = transform;
        self
    }
}

// ============================================================================
// 骨骼层级（Skeleton）
// ============================================================================

/// 骨骼层级组件
///
/// 加载后不可变的部分（关节、名称映射、逆绑定矩阵）可以跨线程只读共享；
/// 每帧的姿态状态保存在 [`crate::PoseEvaluator`] 里，每个动画实例各持一份。
#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct Skeleton {
    /// 所有关节（下标即关节索引 / 蒙皮调色板槽位）
    pub joints: Vec<Joint>,
    /// 关节名称到索引的映射
    pub joint_name_to_index: HashMap<String, usize>,
    /// 根关节索引
    pub root_index: usize,
    /// 参与蒙皮的关节数量（占据低索引槽位，<= 关节总数）
    pub bone_count: usize,
    /// 逆绑定矩阵（由 [`crate::BindPoseCalculator`] 填充一次，之后只读）
    pub inverse_bind_matrices: Vec<Mat4>,
}

impl Skeleton {
    /// 创建骨骼层级，所有关节都参与蒙皮
    pub fn new(joints: Vec<Joint>) -> Result<Self, AnimationError> {
        let bone_count = joints.len();
        Self::with_bone_count(joints, bone_count)
    }

    /// 创建骨骼层级，只有前 `bone_count` 个关节占据蒙皮槽位
    /// （其余关节仅用于层级组织，例如附着点）
    pub fn with_bone_count(
        joints: Vec<Joint>,
        bone_count: usize,
    ) -> Result<Self, AnimationError> {
        if joints.is_empty() {
            return Err(AnimationError::MalformedHierarchy(
                "skeleton has no joints".to_string(),
            ));
        }
        if bone_count > joints.len() {
            return Err(AnimationError::MalformedHierarchy(format!(
                "bone count {} exceeds joint count {}",
                bone_count,
                joints.len()
            )));
        }

        let mut joints = joints;
        let mut root_index: Option<usize> = None;
        for (i, joint) in joints.iter().enumerate() {
            match joint.parent_index {
                None => {
                    if let Some(first) = root_index {
                        return Err(AnimationError::MalformedHierarchy(format!(
                            "multiple roots: '{}' and '{}'",
                            joints[first].name, joint.name
                        )));
                    }
                    root_index = Some(i);
                }
                Some(p) => {
                    if p >= joints.len() || p == i {
                        return Err(AnimationError::MalformedHierarchy(format!(
                            "joint '{}' has invalid parent index {}",
                            joint.name, p
                        )));
                    }
                }
            }
        }
        let root_index = root_index.ok_or_else(|| {
            AnimationError::MalformedHierarchy("no root joint".to_string())
        })?;

        // 以父索引为唯一权威，重建子索引列表
        for joint in joints.iter_mut() {
            joint.children_indices.clear();
        }
        for i in 0..joints.len() {
            if let Some(p) = joints[i].parent_index {
                joints[p].children_indices.push(i);
            }
        }

        let mut joint_name_to_index = HashMap::with_capacity(joints.len());
        for (i, joint) in joints.iter().enumerate() {
            if joint_name_to_index.insert(joint.name.clone(), i).is_some() {
                return Err(AnimationError::MalformedHierarchy(format!(
                    "duplicate joint name '{}'",
                    joint.name
                )));
            }
        }

        let skeleton = Self {
            joints,
            joint_name_to_index,
            root_index,
            bone_count,
            inverse_bind_matrices: Vec::new(),
        };

        // 每个非根关节恰好有一个父关节，因此从根可达即等价于树形
        let reachable = skeleton.iter_depth_first().count();
        if reachable != skeleton.joints.len() {
            let mut visited = vec![false; skeleton.joints.len()];
            for (i, _) in skeleton.iter_depth_first() {
                visited[i] = true;
            }
            let orphan = visited.iter().position(|v| !v).unwrap_or(0);
            return Err(AnimationError::MalformedHierarchy(format!(
                "joint '{}' is not reachable from the root",
                skeleton.joints[orphan].name
            )));
        }

        Ok(skeleton)
    }

    /// 获取关节数量
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    /// 通过名称获取关节索引
    pub fn get_joint_index(&self, name: &str) -> Option<usize> {
        self.joint_name_to_index.get(name).copied()
    }

    /// 获取关节
    pub fn get_joint(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    /// 根关节
    pub fn root(&self) -> &Joint {
        &self.joints[self.root_index]
    }

    /// 将 `child` 挂到 `parent` 下
    ///
    /// 不做环检测（加载器被信任只产出树）；`child` 不得已有父关节，
    /// 否则旧父关节的子列表会残留过期索引。误用导致的环会让遍历
    /// 无法终止——调用方必须保证树形。
    pub fn add_child(&mut self, parent: usize, child: usize) {
        self.joints[child].parent_index = Some(parent);
        self.joints[parent].children_indices.push(child);
    }

    /// 惰性前序遍历（父先于子），可重复调用，对层级无副作用
    pub fn iter_depth_first(&self) -> DepthFirstIter<'_> {
        DepthFirstIter {
            skeleton: self,
            stack: vec![self.root_index],
        }
    }

    /// 以访问者方式前序遍历
    pub fn for_each_depth_first(&self, mut visitor: impl FnMut(usize, &Joint)) {
        for (index, joint) in self.iter_depth_first() {
            visitor(index, joint);
        }
    }

    /// 绑定姿态的局部变换集合（采样器的回退值，也可直接喂给评估器）
    pub fn bind_local_pose(&self) -> LocalPose {
        LocalPose {
            transforms: self
                .joints
                .iter()
                .map(|j| j.local_bind_transform)
                .collect(),
        }
    }
}

/// 前序深度优先迭代器
pub struct DepthFirstIter<'a> {
    skeleton: &'a Skeleton,
    stack: Vec<usize>,
}

impl<'a> Iterator for DepthFirstIter<'a> {
    type Item = (usize, &'a Joint);

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        let joint = &self.skeleton.joints[index];
        // 倒序入栈保持兄弟关节的原始顺序
        for &child in joint.children_indices.iter().rev() {
            self.stack.push(child);
        }
        Some((index, joint))
    }
}

// ============================================================================
// 局部姿态（LocalPose）
// ============================================================================

/// 局部姿态 - 每个关节一个局部变换，与关节数组平行索引
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LocalPose {
    /// 每个关节的局部变换
    pub transforms: Vec<JointTransform>,
}

impl LocalPose {
    /// 从骨骼创建绑定姿态
    pub fn from_skeleton(skeleton: &Skeleton) -> Self {
        skeleton.bind_local_pose()
    }

    /// 创建指定大小的单位姿态
    pub fn with_joint_count(joint_count: usize) -> Self {
        Self {
            transforms: vec![JointTransform::IDENTITY; joint_count],
        }
    }

    /// 混合两个姿态（动画间淡入淡出）
    pub fn blend(&self, other: &Self, factor: f32) -> Self {
        assert_eq!(self.transforms.len(), other.transforms.len());
        let factor = factor.clamp(0.0, 1.0);

        Self {
            transforms: self
                .transforms
                .iter()
                .zip(other.transforms.iter())
                .map(|(a, b)| a.lerp(b, factor))
                .collect(),
        }
    }
}

// ============================================================================
// 测试
// ============================================================================
