//! # Collision モジュール
//!
//! 毎ティック、異なる陣営に属する衝突判定対象エンティティの全ての組（C(n,2)）について
//! 近接判定を行い、撃破・ダメージを適用します。
//!
//! | 組み合わせ | 結果 |
//! |---|---|
//! | 機体 vs 機体 | 双方撃破 |
//! | ミサイル vs ミサイル | 双方撃破 |
//! | ミサイル vs 機体 | ミサイル撃破、機体にダメージ |
//!
//! 組は挿入順で逐次処理し、先の組で撃破されたエンティティは以降の組で評価しません。
//! 撃破されたエンティティはスライスから取り除かないため、処理中のインデックスは安定しています。

use tracing::info;

use crate::models::{Entity, EntityId, EntityKind, EntityKindTag};

/// 衝突による状態遷移の記録
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionEvent {
    /// 機体同士・ミサイル同士の相撃ち
    MutualDestruction {
        first: EntityId,
        second: EntityId,
        kind: EntityKindTag,
    },
    /// ミサイルが機体に命中
    MissileHit {
        missile: EntityId,
        launcher: EntityId,
        target: EntityId,
        damage: u32,
        remaining_health: u32,
        target_destroyed: bool,
    },
}

/// n個のエンティティに対する全ての非順序ペア (i, j), i < j
pub fn collision_pairs(n: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..n).flat_map(move |i| ((i + 1)..n).map(move |j| (i, j)))
}

/// 組に適用する判定半径
///
/// ミサイルを含む組はミサイルの近接信管半径（ミサイル同士なら小さい方）、
/// 機体同士は小さい方の衝突半径を使う。
pub fn engagement_radius(a: &Entity, b: &Entity) -> f64 {
    match (&a.kind, &b.kind) {
        (EntityKind::Agent(_), EntityKind::Agent(_)) => a.collision_radius.min(b.collision_radius),
        (EntityKind::Missile(ma), EntityKind::Missile(mb)) => ma.fuse_radius.min(mb.fuse_radius),
        (EntityKind::Missile(m), EntityKind::Agent(_))
        | (EntityKind::Agent(_), EntityKind::Missile(m)) => m.fuse_radius,
    }
}

/// 全ペアの衝突判定と解決
///
/// # 戻り値
///
/// 発生した衝突イベント（処理順）
pub fn resolve_collisions(entities: &mut [Entity]) -> Vec<CollisionEvent> {
    let mut events = Vec::new();

    for (i, j) in collision_pairs(entities.len()) {
        let (head, tail) = entities.split_at_mut(j);
        if let Some(event) = resolve_pair(&mut head[i], &mut tail[0]) {
            events.push(event);
        }
    }

    events
}

/// 1組の衝突判定と解決
///
/// 同一陣営の組、衝突判定対象でないエンティティを含む組、
/// 判定半径より離れている組は何もせずNoneを返す。
pub fn resolve_pair(a: &mut Entity, b: &mut Entity) -> Option<CollisionEvent> {
    if a.team == b.team || !a.is_collidable() || !b.is_collidable() {
        return None;
    }

    let distance = a.position().distance(&b.position());
    if distance > engagement_radius(a, b) {
        return None;
    }

    match (a.is_missile(), b.is_missile()) {
        (true, false) => Some(missile_strike(a, b, distance)),
        (false, true) => Some(missile_strike(b, a, distance)),
        _ => {
            a.destroy();
            b.destroy();

            let kind = a.kind_tag();
            info!(
                first_id = %a.id,
                second_id = %b.id,
                kind = ?kind,
                distance = distance,
                position_x = a.position().x,
                position_y = a.position().y,
                "MUTUAL_DESTRUCTION: 相撃ちで双方が撃破されました"
            );

            Some(CollisionEvent::MutualDestruction {
                first: a.id,
                second: b.id,
                kind,
            })
        }
    }
}

fn missile_strike(missile: &mut Entity, target: &mut Entity, distance: f64) -> CollisionEvent {
    let (damage, launcher) = missile
        .as_missile()
        .map_or((0, missile.id), |m| (m.damage, m.launcher_id));

    missile.destroy();
    target.take_damage(damage);
    let target_destroyed = !target.is_alive();

    info!(
        missile_id = %missile.id,
        launcher_id = %launcher,
        target_id = %target.id,
        damage = damage,
        remaining_health = target.health,
        intercept_distance = distance,
        hit_position_x = missile.position().x,
        hit_position_y = missile.position().y,
        "MISSILE_HIT: ミサイルが命中しました"
    );
    if target_destroyed {
        info!(
            target_id = %target.id,
            team = ?target.team,
            "AGENT_DESTROYED: 機体が撃墜されました"
        );
    }

    CollisionEvent::MissileHit {
        missile: missile.id,
        launcher,
        target: target.id,
        damage,
        remaining_health: target.health,
        target_destroyed,
    }
}
