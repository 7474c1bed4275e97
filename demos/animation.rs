//! 动画示例
//!
//! 展示完整管线：构建骨骼 -> 计算绑定姿态 -> 关键帧轨道 ->
//! 播放器驱动采样 -> 蒙皮矩阵评估

use glam::{Quat, Vec3};
use skeletal_animation::{
    AnimationPlayer, AnimationService, BindPoseCalculator, InterpolationMode, Joint, JointPose,
    JointTransform, Keyframe, KeyframeTrack, LocalPose, PoseEvaluator, PoseSampler, Skeleton,
};

fn main() -> anyhow::Result<()> {
    println!("=== Skeletal Animation Example ===");

    // 三关节手臂：root -> arm -> hand，每段沿 Y 平移 1
    let up = JointTransform::new(Vec3::new(0.0, 1.0, 0.0), Quat::IDENTITY, Vec3::ONE);
    let joints = vec![
        Joint::new("root", None),
        Joint::new("arm", Some(0)).with_bind_transform(up),
        Joint::new("hand", Some(1)).with_bind_transform(up),
    ];
    let mut skeleton = Skeleton::new(joints)?;

    // 逆绑定矩阵只在加载时算一次
    BindPoseCalculator::compute_inverse_bind_transforms(&mut skeleton)?;
    println!("Skeleton loaded: {} joints", skeleton.joint_count());

    // 挥手动画：arm 在 2 秒内绕 Z 从 0° 转到 90° 再回来
    let mut k0 = Keyframe::new(0.0);
    k0.add_pose("arm", JointPose::new(up));
    let mut raised = up;
    raised.rotation = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
    let mut k1 = Keyframe::new(1.0);
    k1.add_pose("arm", JointPose::new(raised));
    let mut k2 = Keyframe::new(2.0);
    k2.add_pose("arm", JointPose::new(up));
    let track = KeyframeTrack::new(vec![k0, k1, k2], InterpolationMode::Linear)?;

    // 每帧复用的缓冲区
    let sampler = PoseSampler::new(&skeleton, &track);
    let mut evaluator = PoseEvaluator::for_skeleton(&skeleton);
    let mut pose = LocalPose::with_joint_count(skeleton.joint_count());

    let mut player = AnimationPlayer::new(track.duration());
    player.looping = true;
    AnimationService::play(&mut player);

    println!("Running animation...");
    for frame in 0..90 {
        AnimationService::update(&mut player, 1.0 / 30.0);
        sampler.sample_into(player.current_time, &mut pose);
        let palette_len = evaluator.evaluate(&skeleton, &pose).len();

        if frame % 15 == 0 {
            let hand = evaluator.model_transform(2).w_axis.truncate();
            println!(
                "t={:.2}s progress={:.0}% hand at ({:+.2}, {:+.2}, {:+.2}), {} skinning matrices",
                player.current_time,
                AnimationService::progress(&player) * 100.0,
                hand.x,
                hand.y,
                hand.z,
                palette_len
            );
        }
    }

    println!("Animation example completed!");
    Ok(())
}
