//! 姿态评估
//!
//! [`PoseEvaluator`] 把采样得到的局部姿态变成最终的蒙皮矩阵：
//! 前序遍历层级，`model = parent_model * local`，
//! `palette[i] = model[i] * inverse_bind[i]`。
//!
//! 每帧的可变状态（模型空间矩阵、蒙皮调色板、遍历栈）都在评估器里，
//! 不在 [`Skeleton`] 上——多个动画实例可以只读共享同一个骨骼，各自
//! 持有自己的评估器。构造之后评估路径不再分配。

use glam::Mat4;

use crate::skeleton::{LocalPose, Skeleton};

/// 姿态评估器 - 持有每帧复用的输出缓冲区
pub struct PoseEvaluator {
    /// 每个关节的模型空间动画变换（附着点/IK 查询用）
    model_transforms: Vec<Mat4>,
    /// 蒙皮矩阵调色板，按关节索引稠密排列，可直接上传为 uniform 数组
    palette: Vec<Mat4>,
    /// 复用的遍历栈
    stack: Vec<usize>,
}

impl PoseEvaluator {
    /// 为一个骨骼创建评估器（缓冲区大小由关节数/骨头数决定）
    pub fn for_skeleton(skeleton: &Skeleton) -> Self {
        Self {
            model_transforms: vec![Mat4::IDENTITY; skeleton.joint_count()],
            palette: vec![Mat4::IDENTITY; skeleton.bone_count],
            stack: Vec::with_capacity(skeleton.joint_count()),
        }
    }

    /// 评估一帧姿态，返回蒙皮矩阵调色板
    ///
    /// 前置条件（构造期已保证，违反视为程序级不变量破坏）：
    /// 骨骼已经过 [`crate::BindPoseCalculator`]，`pose` 的长度等于关节数。
    pub fn evaluate(&mut self, skeleton: &Skeleton, pose: &LocalPose) -> &[Mat4] {
        debug_assert_eq!(pose.transforms.len(), skeleton.joint_count());
        debug_assert_eq!(
            skeleton.inverse_bind_matrices.len(),
            skeleton.joint_count(),
            "bind pose must be computed before evaluation"
        );

        self.stack.clear();
        self.stack.push(skeleton.root_index);
        while let Some(index) = self.stack.pop() {
            let joint = &skeleton.joints[index];
            let parent_model = match joint.parent_index {
                Some(p) => self.model_transforms[p],
                None => Mat4::IDENTITY,
            };
            self.model_transforms[index] = parent_model * pose.transforms[index].to_matrix();
            for &child in joint.children_indices.iter().rev() {
                self.stack.push(child);
            }
        }

        for i in 0..self.palette.len() {
            self.palette[i] = self.model_transforms[i] * skeleton.inverse_bind_matrices[i];
        }

        &self.palette
    }

    /// 某个关节的模型空间动画变换（上一次 `evaluate` 的结果）
    pub fn model_transform(&self, joint_index: usize) -> Mat4 {
        self.model_transforms[joint_index]
    }

    /// 所有关节的模型空间动画变换
    pub fn model_transforms(&self) -> &[Mat4] {
        &self.model_transforms
    }

    /// 蒙皮矩阵调色板
    pub fn skinning_palette(&self) -> &[Mat4] {
        &self.palette
    }

    /// 调色板的字节视图，可直接 `queue.write_buffer` 上传
    pub fn palette_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.palette)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind_pose::BindPoseCalculator;
    use crate::skeleton::{Joint, JointTransform};
    use glam::{Quat, Vec3};

    fn assert_mat4_approx(a: Mat4, b: Mat4, epsilon: f32) {
        let a = a.to_cols_array();
        let b = b.to_cols_array();
        for i in 0..16 {
            assert!(
                (a[i] - b[i]).abs() < epsilon,
                "element {} differs: {} vs {}",
                i,
                a[i],
                b[i]
            );
        }
    }

    fn arm_skeleton() -> Skeleton {
        let joints = vec![
            Joint::new("root", None),
            Joint::new("arm", Some(0)).with_bind_transform(JointTransform::new(
                Vec3::new(0.0, 1.0, 0.0),
                Quat::IDENTITY,
                Vec3::ONE,
            )),
            Joint::new("hand", Some(1)).with_bind_transform(JointTransform::new(
                Vec3::new(0.0, 1.0, 0.0),
                Quat::IDENTITY,
                Vec3::ONE,
            )),
        ];
        let mut skeleton = Skeleton::new(joints).unwrap();
        BindPoseCalculator::compute_inverse_bind_transforms(&mut skeleton).unwrap();
        skeleton
    }

    #[test]
    fn test_bind_pose_yields_identity_palette() {
        let skeleton = arm_skeleton();
        let mut evaluator = PoseEvaluator::for_skeleton(&skeleton);

        // 绑定姿态进，单位矩阵出：静止姿态不产生形变
        let palette = evaluator.evaluate(&skeleton, &LocalPose::from_skeleton(&skeleton));
        for m in palette {
            assert_mat4_approx(*m, Mat4::IDENTITY, 1e-5);
        }
    }

    #[test]
    fn test_model_transforms_queryable() {
        let skeleton = arm_skeleton();
        let mut evaluator = PoseEvaluator::for_skeleton(&skeleton);

        let mut pose = LocalPose::from_skeleton(&skeleton);
        pose.transforms[1].rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        evaluator.evaluate(&skeleton, &pose);

        // arm 绕 Z 转 90° 后，hand 的模型空间位置从 (0,2,0) 变为 (-1,1,0)
        let hand = evaluator.model_transform(2);
        let p = hand.w_axis.truncate();
        assert!((p.x - -1.0).abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
        assert!(p.z.abs() < 1e-5);
    }

    #[test]
    fn test_bone_count_limits_palette() {
        let joints = vec![
            Joint::new("root", None),
            Joint::new("attachment", Some(0)).with_bind_transform(JointTransform::new(
                Vec3::new(1.0, 0.0, 0.0),
                Quat::IDENTITY,
                Vec3::ONE,
            )),
        ];
        // 只有 root 占蒙皮槽位，attachment 仅用于层级
        let mut skeleton = Skeleton::with_bone_count(joints, 1).unwrap();
        BindPoseCalculator::compute_inverse_bind_transforms(&mut skeleton).unwrap();

        let mut evaluator = PoseEvaluator::for_skeleton(&skeleton);
        let palette = evaluator.evaluate(&skeleton, &LocalPose::from_skeleton(&skeleton));
        assert_eq!(palette.len(), 1);
        // 附着点的模型空间变换仍然可查
        assert_eq!(
            evaluator.model_transform(1).w_axis.truncate(),
            Vec3::new(1.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_palette_bytes_layout() {
        let skeleton = arm_skeleton();
        let mut evaluator = PoseEvaluator::for_skeleton(&skeleton);
        evaluator.evaluate(&skeleton, &LocalPose::from_skeleton(&skeleton));

        let bytes = evaluator.palette_bytes();
        assert_eq!(bytes.len(), skeleton.bone_count * std::mem::size_of::<Mat4>());
    }

    #[test]
    fn test_evaluate_reuses_buffers() {
        let skeleton = arm_skeleton();
        let mut evaluator = PoseEvaluator::for_skeleton(&skeleton);

        let pose = LocalPose::from_skeleton(&skeleton);
        let ptr_first = evaluator.evaluate(&skeleton, &pose).as_ptr();
        let ptr_second = evaluator.evaluate(&skeleton, &pose).as_ptr();
        assert_eq!(ptr_first, ptr_second);
    }
}
