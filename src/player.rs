//! 动画播放状态
//!
//! 遵循贫血模型设计原则：
//! - `AnimationPlayer` (Component): 纯数据结构 ← 本文件
//! - `AnimationService` (Service): 业务逻辑封装 ← 本文件
//!
//! 采样器本身只会在轨道两端截断；循环播放就是在采样前把时间回绕到
//! `[0, duration)`，这一职责由播放器承担。

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// 动画播放器组件
#[derive(Component, Debug, Clone, Serialize, Deserialize)]
pub struct AnimationPlayer {
    /// 当前播放时间 (秒)，始终落在 `[0, duration]` 内
    pub current_time: f32,
    /// 播放速度 (1.0 = 正常速度)
    pub speed: f32,
    /// 是否正在播放
    pub playing: bool,
    /// 是否循环
    pub looping: bool,
    /// 片段时长 (秒)，即轨道最后一个关键帧的时间
    pub duration: f32,
}

impl AnimationPlayer {
    pub fn new(duration: f32) -> Self {
        Self {
            current_time: 0.0,
            speed: 1.0,
            playing: false,
            looping: false,
            duration,
        }
    }
}

impl Default for AnimationPlayer {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// 动画播放服务 - 封装播放控制逻辑
pub struct AnimationService;

impl AnimationService {
    /// 从头开始播放
    pub fn play(player: &mut AnimationPlayer) {
        player.current_time = 0.0;
        player.playing = true;
    }

    /// 暂停播放
    pub fn pause(player: &mut AnimationPlayer) {
        player.playing = false;
    }

    /// 恢复播放
    pub fn resume(player: &mut AnimationPlayer) {
        player.playing = true;
    }

    /// 停止播放并重置
    pub fn stop(player: &mut AnimationPlayer) {
        player.playing = false;
        player.current_time = 0.0;
    }

    /// 设置播放速度
    pub fn set_speed(player: &mut AnimationPlayer, speed: f32) {
        player.speed = speed;
    }

    /// 跳转到指定时间（截断到 `[0, duration]`）
    pub fn seek(player: &mut AnimationPlayer, time: f32) {
        player.current_time = time.clamp(0.0, player.duration);
    }

    /// 更新动画状态 (每帧调用)
    ///
    /// 循环时用 `rem_euclid` 回绕，负速度也能正确环绕；
    /// 非循环时在片段末尾停住。
    pub fn update(player: &mut AnimationPlayer, delta_time: f32) {
        if !player.playing {
            return;
        }

        player.current_time += delta_time * player.speed;

        if player.duration <= 0.0 {
            player.current_time = 0.0;
            return;
        }

        if player.looping {
            player.current_time = player.current_time.rem_euclid(player.duration);
        } else if player.current_time >= player.duration {
            player.current_time = player.duration;
            player.playing = false;
        } else if player.current_time < 0.0 {
            player.current_time = 0.0;
            player.playing = false;
        }
    }

    /// 获取当前播放进度 (0.0 - 1.0)
    pub fn progress(player: &AnimationPlayer) -> f32 {
        if player.duration > 0.0 {
            player.current_time / player.duration
        } else {
            0.0
        }
    }

    /// 检查动画是否播放完成
    pub fn is_finished(player: &AnimationPlayer) -> bool {
        !player.looping && player.current_time >= player.duration
    }
}
