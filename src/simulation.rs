//! # Simulation モジュール
//!
//! 空戦シミュレーションの中核となるシミュレーションエンジンを提供します。
//!
//! 固定時間刻みのメインループを管理し、描画レートとは独立にティックを進めます。
//! ワールドはエンジンが排他的に所有し、外部とのやり取りはティックの境界でのみ
//! 行われます（入力は操作意図キュー、出力は不変スナップショット）。
//!
//! ## ティック内の処理順序
//!
//! 1. **操作意図の適用**: 前ティック以降にキューへ積まれた旋回・推力・発射
//! 2. **誘導**: Redの全エンティティをプレイヤー機へ向ける
//! 3. **運動更新**: 全エンティティの旋回・加速・移動・壁反射・燃料消費
//! 4. **衝突解決**: 全ペアの近接判定と撃破・ダメージ適用
//! 5. **勝敗判定**: 一方の陣営が全滅したら終了（以後は状態を変更しない）
//! 6. **スナップショット出力**
//!
//! ## 使用例
//!
//! ```no_run
//! use mwsim::config::SimConfig;
//! use mwsim::input::ControlIntent;
//! use mwsim::simulation::SimulationEngine;
//!
//! let mut engine = SimulationEngine::new(SimConfig::default(), 0);
//! engine.initialize();
//! engine.queue_intent(ControlIntent::Fire);
//! let snapshot = engine.step();
//! println!("{} entities alive", snapshot.entities.len());
//! ```

use std::collections::VecDeque;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::collision::CollisionEvent;
use crate::config::SimConfig;
use crate::guidance;
use crate::input::ControlIntent;
use crate::models::Team;
use crate::presentation::{Renderer, WorldSnapshot};
use crate::scenario;
use crate::world::World;

pub struct SimulationEngine {
    pub current_time: f64,
    pub dt: f64,
    pub max_ticks: u64,
    pub step_count: u64,

    pub world: World,

    pub config: SimConfig,
    pub verbose_level: u8,

    intent_queue: VecDeque<ControlIntent>,
    last_events: Vec<CollisionEvent>,
    rng: ChaCha8Rng,
}

/// 実行結果の要約
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub battle_over: bool,
    pub winning_team: Option<Team>,
    pub blue_alive: usize,
    pub red_alive: usize,
    pub player_score: u32,
}

impl SimulationEngine {
    /// 空のワールドでエンジンを作成（`initialize` で初期配置を構築する）
    pub fn new(config: SimConfig, verbose_level: u8) -> Self {
        let world = World::new(crate::models::ArenaBounds::from_config(&config.arena));
        Self::with_world(config, world, verbose_level)
    }

    /// 構築済みのワールドでエンジンを作成
    pub fn with_world(config: SimConfig, world: World, verbose_level: u8) -> Self {
        Self {
            current_time: 0.0,
            dt: config.sim.dt,
            max_ticks: config.sim.max_ticks,
            step_count: 0,
            world,
            rng: ChaCha8Rng::seed_from_u64(config.sim.seed),
            config,
            verbose_level,
            intent_queue: VecDeque::new(),
            last_events: Vec::new(),
        }
    }

    /// 固定シナリオで初期配置を構築
    pub fn initialize(&mut self) {
        if self.verbose_level > 0 {
            info!("シミュレーションエンジンを初期化中...");
        }

        self.world = scenario::build_scenario(&self.config, &mut self.rng);
        self.current_time = 0.0;
        self.step_count = 0;
        self.intent_queue.clear();
        self.last_events.clear();

        if self.verbose_level > 0 {
            info!("初期化完了:");
            info!("  Blue機: {}機", self.world.alive_count(Team::Blue));
            info!("  Red機: {}機", self.world.alive_count(Team::Red));
            if let Some(player) = self.world.player() {
                info!("  搭載ミサイル: {}発", player.missiles_remaining());
            }
        }
    }

    /// 操作意図をキューに積む（次のティックの先頭で適用）
    pub fn queue_intent(&mut self, intent: ControlIntent) {
        self.intent_queue.push_back(intent);
    }

    pub fn queue_intents(&mut self, intents: impl IntoIterator<Item = ControlIntent>) {
        self.intent_queue.extend(intents);
    }

    /// 直前のティックで発生した衝突イベント
    pub fn last_events(&self) -> &[CollisionEvent] {
        &self.last_events
    }

    pub fn is_battle_over(&self) -> bool {
        self.world.battle_over
    }

    /// 1ティック進めてスナップショットを返す
    ///
    /// 戦闘終了後はキューを破棄するだけで状態を変更しない。
    pub fn step(&mut self) -> WorldSnapshot {
        let intents: Vec<ControlIntent> = self.intent_queue.drain(..).collect();

        if self.world.battle_over {
            if !intents.is_empty() {
                trace!(discarded = intents.len(), "戦闘終了後の操作意図を破棄しました");
            }
            self.last_events.clear();
            return self.snapshot();
        }

        self.apply_intents(intents);
        self.apply_guidance();
        self.process_entities();
        self.process_collisions();
        self.world.evaluate_win();

        self.current_time += self.dt;
        self.step_count += 1;

        self.snapshot()
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(&self.world, self.step_count)
    }

    fn apply_intents(&mut self, intents: Vec<ControlIntent>) {
        let Some(player_id) = self.world.player_id else {
            return;
        };

        for intent in intents {
            match intent {
                ControlIntent::Fire => {
                    if let Some(missile_id) = self.world.fire(player_id) {
                        debug!(missile_id = %missile_id, "発射操作を処理しました");
                    }
                }
                _ => {
                    if let Some(player) = self.world.get_mut(player_id).filter(|p| p.is_active()) {
                        intent.apply_to(player);
                    }
                }
            }
        }
    }

    fn apply_guidance(&mut self) {
        guidance::apply_pursuit(
            &mut self.world.entities,
            self.world.player_id,
            self.config.agent.pursuit_thrust,
        );
    }

    fn process_entities(&mut self) {
        self.world.update_all(self.dt);
    }

    fn process_collisions(&mut self) {
        self.last_events = self.world.resolve_collisions();
    }

    /// 実時間またはヘッドレスでシミュレーションを実行
    ///
    /// 毎ティック、受信済みの操作意図をキューへ移してから `step` を実行し、
    /// スナップショットをレンダラーへ渡す。`realtime` の場合は設定のティックレートで
    /// 待機する。
    ///
    /// 描画フレーム数が最大ステップ数に達した時点で終了する。戦闘終了後は状態が
    /// 凍結されるため、`realtime` では終了バナー付きのスナップショットを描画し続け
    /// （最大ステップ数0なら中断されるまで）、ヘッドレスでは最初の終了フレームで
    /// 終了する。ティックレートから周期を求められない場合、`realtime` はエラー。
    pub async fn run<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        mut intents: Option<UnboundedReceiver<ControlIntent>>,
        realtime: bool,
    ) -> Result<RunSummary, Box<dyn std::error::Error>> {
        info!("=== シミュレーション実行開始 ===");

        let mut ticker = if realtime {
            let period = self.config.sim.tick_period().ok_or_else(|| {
                format!(
                    "ティックレート {}Hz では実時間実行できません",
                    self.config.sim.tick_rate_hz
                )
            })?;
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            Some(ticker)
        } else {
            None
        };
        let mut frames: u64 = 0;

        loop {
            match ticker.as_mut() {
                Some(ticker) => {
                    ticker.tick().await;
                }
                None => tokio::task::yield_now().await,
            }

            if let Some(receiver) = intents.as_mut() {
                while let Ok(intent) = receiver.try_recv() {
                    self.queue_intent(intent);
                }
            }

            let was_over = self.is_battle_over();
            let snapshot = self.step();
            renderer.render(&snapshot)?;
            frames += 1;

            if self.verbose_level > 2 {
                trace!("ステップ: {} 時刻: {:.1}", self.step_count, self.current_time);
            }
            if !was_over && self.step_count % 100 == 0 && self.verbose_level > 0 {
                info!(
                    "進行状況: {}ステップ (Blue {} / Red {})",
                    self.step_count,
                    self.world.alive_count(Team::Blue),
                    self.world.alive_count(Team::Red)
                );
            }

            if snapshot.battle_over && !realtime {
                break;
            }
            if self.max_ticks > 0 && frames >= self.max_ticks {
                if !snapshot.battle_over {
                    warn!("最大ステップ数 {} に達したため終了します", self.max_ticks);
                }
                break;
            }
        }

        let summary = self.summary();
        info!("=== シミュレーション完了 ===");
        info!("総ステップ数: {}", summary.ticks);
        match summary.winning_team {
            Some(team) => info!("勝者: {}", team),
            None => info!("勝敗未決着"),
        }

        Ok(summary)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            ticks: self.step_count,
            battle_over: self.world.battle_over,
            winning_team: self.world.winning_team,
            blue_alive: self.world.alive_count(Team::Blue),
            red_alive: self.world.alive_count(Team::Red),
            player_score: self
                .world
                .player()
                .and_then(|p| p.as_agent())
                .map_or(0, |a| a.score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArenaBounds, Position2D};
    use crate::presentation::NullRenderer;

    #[derive(Default)]
    struct RecordingRenderer {
        frames: Vec<WorldSnapshot>,
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, snapshot: &WorldSnapshot) -> std::io::Result<()> {
            self.frames.push(snapshot.clone());
            Ok(())
        }
    }

    fn duel_engine(red_x: f64) -> SimulationEngine {
        let config = SimConfig::default();
        let mut world = World::new(ArenaBounds::from_config(&config.arena));
        let blue = world.spawn_agent(Team::Blue, Position2D::new(0.0, 0.0), &config.agent);
        world.load_missiles(blue, 2, &config.missile);
        world.set_player(blue);
        world.spawn_agent(Team::Red, Position2D::new(red_x, 0.0), &config.agent);
        SimulationEngine::with_world(config, world, 0)
    }

    #[test]
    fn test_initialize_builds_scenario() {
        let mut engine = SimulationEngine::new(SimConfig::default(), 0);
        engine.initialize();
        assert_eq!(engine.world.alive_count(Team::Red), scenario::RED_AGENT_COUNT);
        assert!(engine.world.player().is_some());
    }

    #[test]
    fn test_intents_applied_at_tick_start() {
        let mut engine = duel_engine(500.0);
        engine.queue_intent(ControlIntent::RotateLeft(true));
        engine.queue_intent(ControlIntent::Thrust(true));
        engine.step();

        let player = engine.world.player().expect("player");
        assert_eq!(player.kinematics.turn_rate, 5.0);
        assert!((player.heading() - 95.0).abs() < 1e-9);
        assert!(player.kinematics.velocity.magnitude() > 0.0);
    }

    #[test]
    fn test_fire_intent_launches_missile() {
        let mut engine = duel_engine(500.0);
        engine.queue_intent(ControlIntent::Fire);
        let snapshot = engine.step();

        assert_eq!(engine.world.entities.len(), 3);
        assert_eq!(snapshot.entities.len(), 3);
        assert_eq!(engine.world.player().map(|p| p.missiles_remaining()), Some(1));
    }

    #[test]
    fn test_red_pursues_player() {
        let mut engine = duel_engine(300.0);
        engine.step();
        let red = &engine.world.entities[1];
        assert!((red.heading() - 180.0).abs() < 1e-9);
        assert!(red.position().x < 300.0);
    }

    #[test]
    fn test_simulation_freezes_after_battle_over() {
        let mut engine = duel_engine(10.0);
        let snapshot = engine.step();
        assert!(snapshot.battle_over);
        let frozen_ticks = engine.step_count;

        engine.queue_intent(ControlIntent::Fire);
        let after = engine.step();
        assert_eq!(engine.step_count, frozen_ticks);
        assert_eq!(after.winning_team, snapshot.winning_team);
        assert_eq!(engine.world.entities.len(), 2);
    }

    #[tokio::test]
    async fn test_run_headless_until_battle_over() {
        let mut engine = duel_engine(60.0);
        let summary = engine.run(&mut NullRenderer, None, false).await.unwrap();

        assert!(summary.battle_over);
        assert_eq!(summary.winning_team, Some(Team::Blue));
        assert_eq!(summary.blue_alive, 0);
        assert_eq!(summary.red_alive, 0);
    }

    #[tokio::test]
    async fn test_run_stops_at_max_ticks() {
        let mut config = SimConfig::default();
        config.sim.max_ticks = 5;
        let mut world = World::new(ArenaBounds::from_config(&config.arena));
        let blue = world.spawn_agent(Team::Blue, Position2D::new(0.0, 0.0), &config.agent);
        world.set_player(blue);
        world.spawn_agent(Team::Red, Position2D::new(500.0, 300.0), &config.agent);
        let mut engine = SimulationEngine::with_world(config, world, 0);

        let summary = engine.run(&mut NullRenderer, None, false).await.unwrap();
        assert_eq!(summary.ticks, 5);
        assert!(!summary.battle_over);
    }

    #[tokio::test(start_paused = true)]
    async fn test_realtime_run_keeps_rendering_terminal_banner() {
        let mut engine = duel_engine(10.0);
        engine.max_ticks = 4;
        let mut renderer = RecordingRenderer::default();

        let summary = engine.run(&mut renderer, None, true).await.unwrap();

        assert_eq!(summary.ticks, 1);
        assert!(summary.battle_over);
        assert_eq!(renderer.frames.len(), 4);
        let first = &renderer.frames[0];
        assert!(first.banner.is_some());
        for frame in &renderer.frames[1..] {
            assert_eq!(frame.banner, first.banner);
            assert_eq!(frame.tick, first.tick);
            assert_eq!(frame.winning_team, first.winning_team);
        }
    }

    #[tokio::test]
    async fn test_headless_run_stops_on_first_terminal_frame() {
        let mut engine = duel_engine(10.0);
        engine.max_ticks = 4;
        let mut renderer = RecordingRenderer::default();

        engine.run(&mut renderer, None, false).await.unwrap();

        assert_eq!(renderer.frames.len(), 1);
        assert!(renderer.frames[0].battle_over);
    }

    #[tokio::test]
    async fn test_headless_run_ignores_tick_rate() {
        let mut engine = duel_engine(500.0);
        engine.config.sim.tick_rate_hz = 1e12;
        engine.max_ticks = 3;

        let summary = engine.run(&mut NullRenderer, None, false).await.unwrap();
        assert_eq!(summary.ticks, 3);
    }

    #[tokio::test]
    async fn test_realtime_run_rejects_unusable_tick_rate() {
        let mut engine = duel_engine(500.0);
        engine.config.sim.tick_rate_hz = 1e12;
        engine.max_ticks = 3;

        let result = engine.run(&mut NullRenderer, None, true).await;
        assert!(result.is_err());
        assert_eq!(engine.step_count, 0);
    }

    #[tokio::test]
    async fn test_run_drains_intent_channel() {
        let mut engine = duel_engine(600.0);
        engine.max_ticks = 1;
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        tx.send(ControlIntent::Fire).unwrap();

        engine.run(&mut NullRenderer, Some(rx), false).await.unwrap();
        assert_eq!(engine.world.player().map(|p| p.missiles_remaining()), Some(1));
    }
}
