//! # Guidance モジュール
//!
//! 自律エンティティ向けの追尾誘導（視線追尾、CLOS方式）を提供します。
//! 目標の現在位置へ機首を向けるだけで、見越し角や速度補償は行いません。

use tracing::trace;

use crate::models::{Entity, EntityId, Position2D, Team, math_utils};

/// 追尾方位を計算
///
/// シーカー位置から目標位置への方位角を度（0〜360）で返す。
/// 両者が同じ位置の場合は0度。
pub fn pursuit_heading(seeker: Position2D, target: Position2D) -> f64 {
    let delta = target - seeker;
    math_utils::normalize_heading(math_utils::rad_to_deg(delta.y.atan2(delta.x)))
}

/// Red陣営の全行動中エンティティを指定目標へ向ける
///
/// 機首方位を追尾方位で上書きし、旋回を止めて一定の推力を設定する。
/// 目標が存在しないか生存していない場合は何もしない。
///
/// # 戻り値
///
/// 誘導を適用したエンティティ数
pub fn apply_pursuit(entities: &mut [Entity], target_id: Option<EntityId>, pursuit_thrust: f64) -> usize {
    let Some(target_position) = target_id.and_then(|id| {
        entities
            .iter()
            .find(|e| e.id == id && e.is_active())
            .map(Entity::position)
    }) else {
        return 0;
    };

    let mut guided = 0;
    for entity in entities.iter_mut().filter(|e| e.team == Team::Red && e.is_active()) {
        let heading = pursuit_heading(entity.position(), target_position);
        entity.kinematics.heading = heading;
        entity.kinematics.turn_rate = 0.0;
        entity.kinematics.thrust = pursuit_thrust;
        guided += 1;

        trace!(
            entity_id = %entity.id,
            heading = heading,
            "PURSUIT: 追尾方位を更新しました"
        );
    }
    guided
}
