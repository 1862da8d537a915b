use tracing::info;

use crate::config::MissileConfig;
use crate::models::{
    common::{EntityId, LifecycleState, Position2D, Team, Velocity2D},
    entity::{Entity, EntityKind, Kinematics},
};

/// 空対空ミサイル（AAM）固有のデータ
#[derive(Debug, Clone)]
pub struct MissileData {
    /// 発射母機のID
    pub launcher_id: EntityId,
    /// 残燃料
    pub fuel: f64,
    pub max_fuel: f64,
    /// 1ティックあたりの燃料消費量
    pub burn_rate: f64,
    /// 命中時に与えるダメージ
    pub damage: u32,
    /// 近接信管の作動半径
    pub fuse_radius: f64,
    /// 発射時に母機速度へ加算する初速
    pub launch_speed: f64,
    pub arming_delay_ticks: u32,
    /// 安全装置解除までの残りティック数
    pub arming_ticks_remaining: u32,
    /// 飛翔ティック数
    pub flight_ticks: u64,
}

impl MissileData {
    /// 安全装置が解除済みかどうか
    pub fn is_armed(&self) -> bool {
        self.arming_ticks_remaining == 0
    }

    /// 1ティック分の燃料消費と安全装置カウントダウン
    ///
    /// 燃料が尽きた場合はtrueを返す。
    pub(crate) fn consume_fuel(&mut self, dt: f64) -> bool {
        self.flight_ticks += 1;
        self.arming_ticks_remaining = self.arming_ticks_remaining.saturating_sub(1);
        self.fuel -= self.burn_rate * dt;
        self.fuel <= 0.0
    }
}

impl Entity {
    /// 搭載状態（`Ready`）のミサイルを作成します
    ///
    /// 母機と同じ位置に置かれるが、発射されるまではワールドに属さない。
    pub fn ready_missile(
        id: EntityId,
        team: Team,
        launcher_id: EntityId,
        position: Position2D,
        config: &MissileConfig,
    ) -> Self {
        Self {
            id,
            team,
            kinematics: Kinematics::new(position, 0.0),
            health: config.max_health,
            max_health: config.max_health,
            collision_radius: config.fuse_radius,
            state: LifecycleState::Ready,
            kind: EntityKind::Missile(MissileData {
                launcher_id,
                fuel: config.max_fuel,
                max_fuel: config.max_fuel,
                burn_rate: config.burn_rate,
                damage: config.damage,
                fuse_radius: config.fuse_radius,
                launch_speed: config.launch_speed,
                arming_delay_ticks: config.arming_delay_ticks,
                arming_ticks_remaining: config.arming_delay_ticks,
                flight_ticks: 0,
            }),
        }
    }

    /// ミサイルを発射状態へ遷移させる
    ///
    /// 母機の位置・方位・速度を引き継ぎ、機首方向へ初速を加算する。
    /// `Ready` 状態のミサイル以外に対してはfalseを返し何もしない。
    pub fn launch(&mut self, launcher: &Kinematics) -> bool {
        if self.state != LifecycleState::Ready {
            return false;
        }
        let EntityKind::Missile(missile) = &mut self.kind else {
            return false;
        };

        let k = &mut self.kinematics;
        k.position = launcher.position;
        k.heading = launcher.heading;
        k.velocity = launcher.velocity + Velocity2D::from_heading(launcher.heading, missile.launch_speed);
        k.turn_rate = 0.0;
        k.thrust = 0.0;

        missile.fuel = missile.max_fuel;
        missile.arming_ticks_remaining = missile.arming_delay_ticks;
        missile.flight_ticks = 0;
        self.state = LifecycleState::InFlight;

        info!(
            missile_id = %self.id,
            launcher_id = %missile.launcher_id,
            team = ?self.team,
            launch_position_x = k.position.x,
            launch_position_y = k.position.y,
            heading = k.heading,
            speed = k.velocity.magnitude(),
            arming_delay_ticks = missile.arming_delay_ticks,
            "MISSILE_LAUNCHED: ミサイルが発射されました"
        );

        true
    }
}
