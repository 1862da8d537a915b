use crate::config::AgentConfig;
use crate::models::{
    common::{EntityId, LifecycleState, Position2D, Team},
    entity::{Entity, EntityKind, Kinematics},
};

/// 機体（エージェント）固有のデータ
///
/// 搭載ミサイル（`Ready` 状態の `Entity`）を排他的に保持し、
/// 発射時に後入れ先出しで取り出してワールドへ引き渡す。
#[derive(Debug, Clone)]
pub struct AgentData {
    /// 搭載ミサイル（末尾が次に発射される）
    pub loadout: Vec<Entity>,
    /// 撃墜スコア（集計のみ）
    pub score: u32,
    pub rotation_rate: f64,
    pub acceleration: f64,
    pub max_thrust: f64,
}

impl Entity {
    /// 新しい機体を作成します
    ///
    /// # 引数
    ///
    /// * `id` - エンティティID
    /// * `team` - 所属陣営
    /// * `position` - 初期位置
    /// * `config` - 機体性能
    pub fn agent(id: EntityId, team: Team, position: Position2D, config: &AgentConfig) -> Self {
        Self {
            id,
            team,
            kinematics: Kinematics::new(position, config.initial_heading),
            health: config.max_health,
            max_health: config.max_health,
            collision_radius: config.collision_radius,
            state: LifecycleState::InFlight,
            kind: EntityKind::Agent(AgentData {
                loadout: Vec::new(),
                score: 0,
                rotation_rate: config.rotation_rate,
                acceleration: config.acceleration,
                max_thrust: config.max_thrust,
            }),
        }
    }

    /// 左旋回を開始
    pub fn rotate_left(&mut self) {
        if let Some(rate) = self.as_agent().map(|a| a.rotation_rate) {
            self.kinematics.turn_rate = rate;
        }
    }

    /// 右旋回を開始
    pub fn rotate_right(&mut self) {
        if let Some(rate) = self.as_agent().map(|a| a.rotation_rate) {
            self.kinematics.turn_rate = -rate;
        }
    }

    /// 旋回を停止
    pub fn stop_rotation(&mut self) {
        if self.is_agent() {
            self.kinematics.turn_rate = 0.0;
        }
    }

    /// 推力を1段階上げる（上限あり）
    pub fn accelerate(&mut self) {
        if let Some((acceleration, max_thrust)) =
            self.as_agent().map(|a| (a.acceleration, a.max_thrust))
        {
            self.kinematics.thrust = (self.kinematics.thrust + acceleration).min(max_thrust);
        }
    }

    /// 推力をカット
    pub fn decelerate(&mut self) {
        if self.is_agent() {
            self.kinematics.thrust = 0.0;
        }
    }

    /// 搭載ミサイルを積み込む
    pub fn load_missile(&mut self, missile: Entity) {
        if let Some(agent) = self.as_agent_mut() {
            agent.loadout.push(missile);
        }
    }

    /// 残弾数
    pub fn missiles_remaining(&self) -> usize {
        self.as_agent().map_or(0, |a| a.loadout.len())
    }

    /// 最後に積み込んだミサイルを取り出す
    ///
    /// 行動中でない機体や弾切れの場合はNone。
    pub fn take_ready_missile(&mut self) -> Option<Entity> {
        if !self.is_active() {
            return None;
        }
        self.as_agent_mut()?.loadout.pop()
    }
}
