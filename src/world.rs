//! # World モジュール
//!
//! アリーナ境界と全エンティティを保持するコンテナです。
//! エンティティは挿入順に保持され、その順序が衝突判定のペア列挙順になります。
//! 撃破されたエンティティは取り除かずに残す（墓標として扱う）ため、
//! IDとインデックスの対応は実行中ずっと安定しています。

use tracing::{debug, info};

use crate::collision::{self, CollisionEvent};
use crate::config::{AgentConfig, MissileConfig};
use crate::models::{ArenaBounds, Entity, EntityId, Position2D, Team};

#[derive(Debug, Clone)]
pub struct World {
    pub bounds: ArenaBounds,
    pub entities: Vec<Entity>,
    pub battle_over: bool,
    pub winning_team: Option<Team>,
    /// プレイヤーが操作するBlue機（Redの追尾目標）
    pub player_id: Option<EntityId>,
    next_id: u32,
}

impl World {
    pub fn new(bounds: ArenaBounds) -> Self {
        Self {
            bounds,
            entities: Vec::new(),
            battle_over: false,
            winning_team: None,
            player_id: None,
            next_id: 1,
        }
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// 機体を生成してワールドへ追加
    pub fn spawn_agent(&mut self, team: Team, position: Position2D, config: &AgentConfig) -> EntityId {
        let id = self.allocate_id();
        self.entities.push(Entity::agent(id, team, position, config));
        debug!(
            entity_id = %id,
            team = ?team,
            position_x = position.x,
            position_y = position.y,
            "AGENT_SPAWNED: 機体を配置しました"
        );
        id
    }

    /// 既存エンティティをそのまま追加（IDが未使用の場合のみ）
    ///
    /// 追加できた場合はtrue。
    pub fn insert(&mut self, entity: Entity) -> bool {
        if self.get(entity.id).is_some() {
            return false;
        }
        self.next_id = self.next_id.max(entity.id.0 + 1);
        self.entities.push(entity);
        true
    }

    /// 機体にミサイルを搭載
    ///
    /// # 戻り値
    ///
    /// 搭載したミサイル数（機体が存在しない場合は0）
    pub fn load_missiles(&mut self, agent_id: EntityId, count: usize, config: &MissileConfig) -> usize {
        let Some(index) = self.index_of(agent_id) else {
            return 0;
        };
        if !self.entities[index].is_agent() {
            return 0;
        }

        for _ in 0..count {
            let id = self.allocate_id();
            let agent = &mut self.entities[index];
            let missile = Entity::ready_missile(id, agent.team, agent.id, agent.position(), config);
            agent.load_missile(missile);
        }
        count
    }

    pub fn set_player(&mut self, id: EntityId) {
        self.player_id = Some(id);
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.id == id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn player(&self) -> Option<&Entity> {
        self.player_id.and_then(|id| self.get(id))
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        let id = self.player_id?;
        self.get_mut(id)
    }

    /// ミサイル発射
    ///
    /// 最後に搭載したミサイルを取り出して発射状態にし、ワールドへ追加する。
    /// 発射機が存在しない・行動中でない・弾切れの場合は何もしない。
    ///
    /// # 戻り値
    ///
    /// 発射したミサイルのID
    pub fn fire(&mut self, launcher_id: EntityId) -> Option<EntityId> {
        let launcher = self.get_mut(launcher_id)?;
        let mut missile = launcher.take_ready_missile()?;
        let launcher_kinematics = launcher.kinematics;

        if !missile.launch(&launcher_kinematics) {
            return None;
        }
        let id = missile.id;
        self.entities.push(missile);
        Some(id)
    }

    /// 陣営ごとの生存エンティティ数
    pub fn alive_count(&self, team: Team) -> usize {
        self.entities
            .iter()
            .filter(|e| e.team == team && e.is_alive())
            .count()
    }

    /// 全エンティティの運動更新
    pub fn update_all(&mut self, dt: f64) {
        let bounds = self.bounds;
        for entity in &mut self.entities {
            entity.update(dt, &bounds);
        }
    }

    /// 衝突判定を行い、撃墜した発射機のスコアを加算
    pub fn resolve_collisions(&mut self) -> Vec<CollisionEvent> {
        let events = collision::resolve_collisions(&mut self.entities);

        for event in &events {
            if let CollisionEvent::MissileHit {
                launcher,
                target_destroyed: true,
                ..
            } = event
            {
                if let Some(agent) = self.get_mut(*launcher).and_then(Entity::as_agent_mut) {
                    agent.score += 1;
                }
            }
        }

        events
    }

    /// 勝敗判定
    ///
    /// 一方の陣営の生存エンティティが無くなった時点で相手陣営の勝利とする。
    /// Redを先に判定するため、同一ティックで双方全滅した場合はBlueの勝利。
    /// 一度決まった勝敗は変わらない。
    pub fn evaluate_win(&mut self) -> Option<Team> {
        if self.battle_over {
            return self.winning_team;
        }

        let winner = if self.alive_count(Team::Red) == 0 {
            Some(Team::Blue)
        } else if self.alive_count(Team::Blue) == 0 {
            Some(Team::Red)
        } else {
            None
        };

        if let Some(team) = winner {
            self.battle_over = true;
            self.winning_team = Some(team);
            info!(
                winning_team = ?team,
                blue_alive = self.alive_count(Team::Blue),
                red_alive = self.alive_count(Team::Red),
                "BATTLE_OVER: {}",
                battle_banner(team)
            );
        }

        self.winning_team
    }

    /// 終了バナー（戦闘終了後のみ）
    pub fn banner(&self) -> Option<String> {
        if self.battle_over {
            self.winning_team.map(battle_banner)
        } else {
            None
        }
    }
}

/// 戦闘終了時に表示する文字列
pub fn battle_banner(team: Team) -> String {
    format!("End of Battle. {} Wins!", team.display_name())
}
