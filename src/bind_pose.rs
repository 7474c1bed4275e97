//! 绑定姿态计算
//!
//! 遵循贫血模型设计原则：[`crate::Skeleton`] 是纯数据结构，
//! `BindPoseCalculator` 封装一次性的逆绑定矩阵计算逻辑。
//!
//! 每个加载的骨骼只计算一次（不是每帧），结果缓存在
//! `Skeleton::inverse_bind_matrices` 中供骨骼生命周期内使用。

use glam::Mat4;

use crate::error::AnimationError;
use crate::skeleton::Skeleton;

/// 行列式绝对值低于该阈值的绑定矩阵视为奇异
const DETERMINANT_EPSILON: f32 = 1e-8;

/// 绑定姿态计算服务
pub struct BindPoseCalculator;

impl BindPoseCalculator {
    /// 计算并缓存每个关节的逆绑定矩阵
    ///
    /// 从根关节开始前序遍历，父模型变换初始为单位矩阵：
    /// `model_bind = parent_model_bind * local_bind`，
    /// `inverse_bind = inverse(model_bind)`。
    ///
    /// 奇异的绑定矩阵（例如某轴缩放为零）是致命的输入错误，返回
    /// [`AnimationError::DegenerateTransform`] 并携带关节名，绝不把
    /// NaN/Inf 矩阵留给后续渲染。
    ///
    /// 重复调用是幂等的：同一层级两次计算产生逐位相同的结果。
    pub fn compute_inverse_bind_transforms(
        skeleton: &mut Skeleton,
    ) -> Result<(), AnimationError> {
        let model = Self::model_bind_transforms(skeleton)?;
        skeleton.inverse_bind_matrices = model.iter().map(|m| m.inverse()).collect();
        Ok(())
    }

    /// 计算每个关节的模型空间绑定变换（不缓存）
    ///
    /// 绑定姿态下的附着点查询也走这里。
    pub fn model_bind_transforms(skeleton: &Skeleton) -> Result<Vec<Mat4>, AnimationError> {
        let mut model = vec![Mat4::IDENTITY; skeleton.joint_count()];
        for (index, joint) in skeleton.iter_depth_first() {
            let parent_model = match joint.parent_index {
                Some(p) => model[p],
                None => Mat4::IDENTITY,
            };
            let m = parent_model * joint.local_bind_transform.to_matrix();
            if m.determinant().abs() < DETERMINANT_EPSILON {
                return Err(AnimationError::DegenerateTransform {
                    joint: joint.name.clone(),
                });
            }
            model[index] = m;
        }
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{Joint, JointTransform};
    use glam::{Quat, Vec3};
    use proptest::prelude::*;

    fn chain_skeleton() -> Skeleton {
        let joints = vec![
            Joint::new("root", None),
            Joint::new("mid", Some(0)).with_bind_transform(JointTransform::new(
                Vec3::new(1.0, 0.0, 0.0),
                Quat::IDENTITY,
                Vec3::ONE,
            )),
            Joint::new("tip", Some(1)).with_bind_transform(JointTransform::new(
                Vec3::new(0.0, 1.0, 0.0),
                Quat::IDENTITY,
                Vec3::ONE,
            )),
        ];
        Skeleton::new(joints).unwrap()
    }

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

    #[test]
    fn test_chain_composition() {
        let skeleton = chain_skeleton();
        let model = BindPoseCalculator::model_bind_transforms(&skeleton).unwrap();

        // 平移 (1,0,0) 再 (0,1,0)，孙关节的模型空间平移为 (1,1,0)
        assert_eq!(model[2].w_axis.truncate(), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_bind_pose_invariant() {
        let mut skeleton = chain_skeleton();
        skeleton.joints[1].local_bind_transform.rotation = Quat::from_rotation_z(0.7);
        skeleton.joints[2].local_bind_transform.scale = Vec3::new(2.0, 1.0, 0.5);

        BindPoseCalculator::compute_inverse_bind_transforms(&mut skeleton).unwrap();
        let model = BindPoseCalculator::model_bind_transforms(&skeleton).unwrap();

        for i in 0..skeleton.joint_count() {
            assert_mat4_approx(
                model[i] * skeleton.inverse_bind_matrices[i],
                Mat4::IDENTITY,
                1e-5,
            );
        }
    }

    #[test]
    fn test_degenerate_transform_rejected() {
        let mut skeleton = chain_skeleton();
        skeleton.joints[1].local_bind_transform.scale = Vec3::new(1.0, 0.0, 1.0);

        let err = BindPoseCalculator::compute_inverse_bind_transforms(&mut skeleton).unwrap_err();
        match err {
            AnimationError::DegenerateTransform { joint } => assert_eq!(joint, "mid"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_idempotent() {
        let mut skeleton = chain_skeleton();
        skeleton.joints[1].local_bind_transform.rotation = Quat::from_rotation_y(1.3);

        BindPoseCalculator::compute_inverse_bind_transforms(&mut skeleton).unwrap();
        let first = skeleton.inverse_bind_matrices.clone();

        BindPoseCalculator::compute_inverse_bind_transforms(&mut skeleton).unwrap();

        // 逐位相同
        for (a, b) in first.iter().zip(skeleton.inverse_bind_matrices.iter()) {
            assert_eq!(a.to_cols_array(), b.to_cols_array());
        }
    }

    proptest! {
        #[test]
        fn prop_inverse_bind_roundtrip(
            tx in -10.0f32..10.0,
            ty in -10.0f32..10.0,
            tz in -10.0f32..10.0,
            angle in 0.0f32..std::f32::consts::TAU,
            scale in 0.5f32..2.0,
        ) {
            let joints = vec![
                Joint::new("root", None).with_bind_transform(JointTransform::new(
                    Vec3::new(tx, ty, tz),
                    Quat::from_rotation_y(angle),
                    Vec3::splat(scale),
                )),
                Joint::new("child", Some(0)).with_bind_transform(JointTransform::new(
                    Vec3::new(-ty, tz, tx),
                    Quat::from_rotation_x(angle * 0.5),
                    Vec3::ONE,
                )),
            ];
            let mut skeleton = Skeleton::new(joints).unwrap();
            BindPoseCalculator::compute_inverse_bind_transforms(&mut skeleton).unwrap();
            let model = BindPoseCalculator::model_bind_transforms(&skeleton).unwrap();

            for i in 0..skeleton.joint_count() {
                assert_mat4_approx(
                    model[i] * skeleton.inverse_bind_matrices[i],
                    Mat4::IDENTITY,
                    1e-3,
                );
            }
        }
    }
}
