//! # Scenario モジュール
//!
//! 初期配置を構築します。構成は固定で、プレイヤーのBlue機1機（ミサイル搭載）と
//! ランダムな位置・速度で出現するRed機2機です。乱数はシード付きの `ChaCha8Rng` を使うため、
//! 同じシードからは同じ初期配置が得られます。

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::config::SimConfig;
use crate::models::{ArenaBounds, EntityId, Position2D, Team, Velocity2D};
use crate::world::World;

/// Red機の数
pub const RED_AGENT_COUNT: usize = 2;

/// Red機の初期速度成分の範囲（整数値で抽選）
const RED_INITIAL_SPEED_RANGE: std::ops::RangeInclusive<i32> = -2..=2;

/// 初期配置済みのワールドを構築
///
/// # 戻り値
///
/// 構築したワールド（プレイヤー機が `player_id` に設定済み）
pub fn build_scenario(config: &SimConfig, rng: &mut ChaCha8Rng) -> World {
    let mut world = World::new(ArenaBounds::from_config(&config.arena));

    let player = world.spawn_agent(Team::Blue, Position2D::new(0.0, 0.0), &config.agent);
    world.load_missiles(player, config.agent.missiles_loaded, &config.missile);
    world.set_player(player);

    let red_ids: Vec<EntityId> = (0..RED_AGENT_COUNT)
        .map(|_| spawn_red_agent(&mut world, config, rng))
        .collect();

    info!(
        player_id = %player,
        missiles_loaded = config.agent.missiles_loaded,
        red_agents = red_ids.len(),
        seed = config.sim.seed,
        "SCENARIO_BUILT: 初期配置を構築しました"
    );

    world
}

fn spawn_red_agent(world: &mut World, config: &SimConfig, rng: &mut ChaCha8Rng) -> EntityId {
    let (max_x, max_y) = world.bounds.wall_limits();
    let position = Position2D::new(rng.gen_range(-max_x..=max_x), rng.gen_range(-max_y..=max_y));
    let velocity = Velocity2D::new(
        f64::from(rng.gen_range(RED_INITIAL_SPEED_RANGE)),
        f64::from(rng.gen_range(RED_INITIAL_SPEED_RANGE)),
    );

    let id = world.spawn_agent(Team::Red, position, &config.agent);
    if let Some(agent) = world.get_mut(id) {
        agent.kinematics.velocity = velocity;
    }
    id
}
