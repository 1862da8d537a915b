use tracing::{debug, info};

use crate::config::ArenaConfig;
use crate::models::{
    agent::AgentData,
    common::{EntityId, LifecycleState, Position2D, Team, Velocity2D, math_utils},
    missile::MissileData,
};

/// アリーナ境界
///
/// 半幅・半高から余白を引いた位置に見えない壁があり、
/// 壁を越えたエンティティは壁上へ戻され、該当速度成分に反射係数が掛かる。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaBounds {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    pub restitution: f64,
}

impl ArenaBounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            margin: 10.0,
            restitution: -1.0,
        }
    }

    pub fn from_config(config: &ArenaConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            margin: config.boundary_margin,
            restitution: config.wall_restitution,
        }
    }

    /// 壁の位置（x, y の絶対値の上限）
    pub fn wall_limits(&self) -> (f64, f64) {
        (
            (self.width / 2.0 - self.margin).max(0.0),
            (self.height / 2.0 - self.margin).max(0.0),
        )
    }

    /// アリーナ内（半幅・半高以内）かどうか
    pub fn contains(&self, position: &Position2D) -> bool {
        position.x.abs() <= self.width / 2.0 && position.y.abs() <= self.height / 2.0
    }

    /// 壁を越えた位置を壁上へ戻し、速度成分を反射させる
    ///
    /// 壁に接触した場合はtrueを返す。
    pub fn confine(&self, position: &mut Position2D, velocity: &mut Velocity2D) -> bool {
        let (max_x, max_y) = self.wall_limits();
        let mut bounced = false;

        if position.x > max_x {
            position.x = max_x;
            velocity.x *= self.restitution;
            bounced = true;
        } else if position.x < -max_x {
            position.x = -max_x;
            velocity.x *= self.restitution;
            bounced = true;
        }

        if position.y > max_y {
            position.y = max_y;
            velocity.y *= self.restitution;
            bounced = true;
        } else if position.y < -max_y {
            position.y = -max_y;
            velocity.y *= self.restitution;
            bounced = true;
        }

        bounced
    }
}

/// 運動状態
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics {
    pub position: Position2D,
    pub velocity: Velocity2D,
    /// 機首方位（度、0〜360）
    pub heading: f64,
    /// 旋回量 [deg/tick]
    pub turn_rate: f64,
    /// 機首方向への推力 [速度/tick]
    pub thrust: f64,
}

impl Kinematics {
    pub fn new(position: Position2D, heading: f64) -> Self {
        Self {
            position,
            velocity: Velocity2D::default(),
            heading: math_utils::normalize_heading(heading),
            turn_rate: 0.0,
            thrust: 0.0,
        }
    }
}

/// エンティティ種別ごとの固有データ
#[derive(Debug, Clone)]
pub enum EntityKind {
    Agent(AgentData),
    Missile(MissileData),
}

/// 種別だけを表すタグ（スナップショット・ログ用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EntityKindTag {
    Agent,
    Missile,
}

/// 機体とミサイルに共通のエンティティ
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub team: Team,
    pub kinematics: Kinematics,
    pub health: u32,
    pub max_health: u32,
    pub collision_radius: f64,
    pub state: LifecycleState,
    pub kind: EntityKind,
}

impl Entity {
    /// 生存判定（耐久値が残っていて撃破されていない）
    pub fn is_alive(&self) -> bool {
        self.health > 0 && self.state != LifecycleState::Destroyed
    }

    /// ワールド内で行動中かどうか（生存かつ飛行中）
    pub fn is_active(&self) -> bool {
        self.is_alive() && self.state == LifecycleState::InFlight
    }

    /// 衝突判定の対象かどうか（ミサイルは安全装置解除後のみ）
    pub fn is_collidable(&self) -> bool {
        self.is_active()
            && match &self.kind {
                EntityKind::Agent(_) => true,
                EntityKind::Missile(missile) => missile.is_armed(),
            }
    }

    pub fn kind_tag(&self) -> EntityKindTag {
        match self.kind {
            EntityKind::Agent(_) => EntityKindTag::Agent,
            EntityKind::Missile(_) => EntityKindTag::Missile,
        }
    }

    pub fn is_agent(&self) -> bool {
        matches!(self.kind, EntityKind::Agent(_))
    }

    pub fn is_missile(&self) -> bool {
        matches!(self.kind, EntityKind::Missile(_))
    }

    pub fn as_agent(&self) -> Option<&AgentData> {
        match &self.kind {
            EntityKind::Agent(agent) => Some(agent),
            EntityKind::Missile(_) => None,
        }
    }

    pub fn as_agent_mut(&mut self) -> Option<&mut AgentData> {
        match &mut self.kind {
            EntityKind::Agent(agent) => Some(agent),
            EntityKind::Missile(_) => None,
        }
    }

    pub fn as_missile(&self) -> Option<&MissileData> {
        match &self.kind {
            EntityKind::Missile(missile) => Some(missile),
            EntityKind::Agent(_) => None,
        }
    }

    pub fn position(&self) -> Position2D {
        self.kinematics.position
    }

    pub fn heading(&self) -> f64 {
        self.kinematics.heading
    }

    /// 耐久値の残存率（0.0〜1.0）
    pub fn health_ratio(&self) -> f64 {
        if self.max_health == 0 {
            0.0
        } else {
            f64::from(self.health) / f64::from(self.max_health)
        }
    }

    /// ダメージを受ける
    ///
    /// 耐久値は0で下げ止まり、0になった時点で撃破状態になる。
    pub fn take_damage(&mut self, damage: u32) {
        if !self.is_alive() {
            return;
        }
        self.health = self.health.saturating_sub(damage);
        if self.health == 0 {
            self.destroy();
        }
    }

    /// 撃破状態へ遷移（終端状態）
    pub fn destroy(&mut self) {
        self.state = LifecycleState::Destroyed;
    }

    /// 1ティック分の運動更新
    ///
    /// 旋回 → 推力による加速 → 位置積分 → 壁反射 の順に処理する。速度に上限はない。
    /// ミサイルはさらに燃料を消費し、燃料切れで撃破状態になる。
    /// 行動中でないエンティティ（耐久値0を含む）に対しては何もしない。
    pub fn update(&mut self, dt: f64, arena: &ArenaBounds) {
        if !self.is_active() {
            return;
        }

        let k = &mut self.kinematics;
        k.heading = math_utils::normalize_heading(k.heading + k.turn_rate * dt);
        k.velocity += Velocity2D::from_heading(k.heading, k.thrust * dt);
        k.position += k.velocity * dt;

        if arena.confine(&mut k.position, &mut k.velocity) {
            debug!(
                entity_id = %self.id,
                position_x = k.position.x,
                position_y = k.position.y,
                "WALL_BOUNCE: 境界で反射しました"
            );
        }

        if let EntityKind::Missile(missile) = &mut self.kind {
            if missile.consume_fuel(dt) {
                self.state = LifecycleState::Destroyed;
                info!(
                    missile_id = %self.id,
                    launcher_id = %missile.launcher_id,
                    flight_ticks = missile.flight_ticks,
                    position_x = self.kinematics.position.x,
                    position_y = self.kinematics.position.y,
                    "MISSILE_FUEL_EXHAUSTED: ミサイルの燃料が尽きました"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AgentConfig, MissileConfig};

    fn agent_at(x: f64, y: f64) -> Entity {
        Entity::agent(
            EntityId(1),
            Team::Blue,
            Position2D::new(x, y),
            &AgentConfig::default(),
        )
    }

    #[test]
    fn test_update_integrates_heading_velocity_position() {
        let mut agent = agent_at(0.0, 0.0);
        agent.kinematics.heading = 0.0;
        agent.kinematics.turn_rate = 90.0;
        agent.kinematics.thrust = 1.0;
        agent.update(1.0, &ArenaBounds::new(1280.0, 720.0));

        let k = agent.kinematics;
        assert_eq!(k.heading, 90.0);
        assert!(k.velocity.x.abs() < 1e-12);
        assert!((k.velocity.y - 1.0).abs() < 1e-12);
        assert!((k.position.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_heading_wraps() {
        let mut agent = agent_at(0.0, 0.0);
        agent.kinematics.heading = 358.0;
        agent.kinematics.turn_rate = 5.0;
        agent.update(1.0, &ArenaBounds::new(1280.0, 720.0));
        assert!((agent.kinematics.heading - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_wall_bounce_inverts_velocity() {
        let arena = ArenaBounds::new(200.0, 200.0);
        let mut agent = agent_at(88.0, 0.0);
        agent.kinematics.velocity = Velocity2D::new(5.0, 1.0);
        agent.update(1.0, &arena);

        assert_eq!(agent.kinematics.position.x, 90.0);
        assert_eq!(agent.kinematics.velocity.x, -5.0);
        assert_eq!(agent.kinematics.velocity.y, 1.0);
    }

    #[test]
    fn test_wall_bounce_damped() {
        let mut arena = ArenaBounds::new(200.0, 200.0);
        arena.restitution = -0.1;
        let mut agent = agent_at(0.0, -88.0);
        agent.kinematics.velocity = Velocity2D::new(0.0, -5.0);
        agent.update(1.0, &arena);

        assert_eq!(agent.kinematics.position.y, -90.0);
        assert!((agent.kinematics.velocity.y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_destroyed_entity_does_not_move() {
        let mut agent = agent_at(0.0, 0.0);
        agent.kinematics.velocity = Velocity2D::new(3.0, 0.0);
        agent.destroy();
        agent.update(1.0, &ArenaBounds::new(1280.0, 720.0));
        assert_eq!(agent.position(), Position2D::new(0.0, 0.0));
        assert!(!agent.is_alive());
    }

    #[test]
    fn test_take_damage_clamps_at_zero() {
        let mut agent = agent_at(0.0, 0.0);
        agent.take_damage(60);
        assert_eq!(agent.health, 40);
        assert!(agent.is_alive());
        agent.take_damage(60);
        assert_eq!(agent.health, 0);
        assert_eq!(agent.state, LifecycleState::Destroyed);
        assert!(!agent.is_alive());
    }

    #[test]
    fn test_thrust_accumulates_without_speed_cap() {
        let mut agent = agent_at(0.0, 0.0);
        agent.kinematics.heading = 0.0;
        agent.kinematics.velocity = Velocity2D::new(8.0, 0.0);
        agent.kinematics.thrust = 2.0;
        agent.update(1.0, &ArenaBounds::new(1280.0, 720.0));

        assert_eq!(agent.kinematics.velocity, Velocity2D::new(10.0, 0.0));
        assert_eq!(agent.position(), Position2D::new(10.0, 0.0));

        agent.update(1.0, &ArenaBounds::new(1280.0, 720.0));
        assert_eq!(agent.kinematics.velocity.x, 12.0);
    }

    #[test]
    fn test_zero_health_entity_is_inert() {
        let mut agent = agent_at(5.0, 5.0);
        agent.kinematics.velocity = Velocity2D::new(3.0, 1.0);
        agent.health = 0;
        agent.update(1.0, &ArenaBounds::new(1280.0, 720.0));

        assert!(!agent.is_alive());
        assert!(!agent.is_active());
        assert_eq!(agent.position(), Position2D::new(5.0, 5.0));
    }

    #[test]
    fn test_missile_fuel_exhaustion_destroys() {
        let config = MissileConfig {
            max_fuel: 8.0,
            burn_rate: 4.0,
            ..MissileConfig::default()
        };
        let launcher = agent_at(0.0, 0.0);
        let mut missile =
            Entity::ready_missile(EntityId(2), Team::Blue, launcher.id, launcher.position(), &config);
        assert!(missile.launch(&launcher.kinematics));

        let arena = ArenaBounds::new(1280.0, 720.0);
        missile.update(1.0, &arena);
        assert!(missile.is_active());
        missile.update(1.0, &arena);
        assert_eq!(missile.state, LifecycleState::Destroyed);
        assert!(missile.health > 0);
        assert!(!missile.is_alive());
    }
}
