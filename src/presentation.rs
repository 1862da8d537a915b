//! # Presentation モジュール
//!
//! 描画層へ渡す読み取り専用のスナップショットと、描画層の差し替え口（[`Renderer`]）を
//! 提供します。コアは描画を行わず、毎ティックの状態を不変のコピーとして出力するだけです。

use std::io::Write;

use serde::Serialize;

use crate::models::{ArenaBounds, Entity, EntityId, EntityKindTag, Position2D, Team};
use crate::world::World;

/// 描画色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntityColor {
    Blue,
    Red,
    Yellow,
}

/// 耐久値メーターの色区分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthBand {
    Green,
    Yellow,
    Red,
}

impl HealthBand {
    /// 残存率から区分を決定（0.7以上で緑、0.3以上で黄、それ未満で赤）
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 0.3 {
            HealthBand::Red
        } else if ratio < 0.7 {
            HealthBand::Yellow
        } else {
            HealthBand::Green
        }
    }
}

/// 1エンティティの描画用ビュー
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityKindTag,
    pub team: Team,
    pub position: Position2D,
    pub heading: f64,
    pub color: EntityColor,
    pub health_ratio: f64,
    pub health_band: HealthBand,
}

impl EntityView {
    pub fn from_entity(entity: &Entity) -> Self {
        let kind = entity.kind_tag();
        let color = match (kind, entity.team) {
            (EntityKindTag::Missile, _) => EntityColor::Yellow,
            (EntityKindTag::Agent, Team::Blue) => EntityColor::Blue,
            (EntityKindTag::Agent, Team::Red) => EntityColor::Red,
        };
        let health_ratio = entity.health_ratio();

        Self {
            id: entity.id,
            kind,
            team: entity.team,
            position: entity.position(),
            heading: entity.heading(),
            color,
            health_ratio,
            health_band: HealthBand::from_ratio(health_ratio),
        }
    }
}

/// アリーナ寸法
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundsView {
    pub width: f64,
    pub height: f64,
}

impl From<&ArenaBounds> for BoundsView {
    fn from(bounds: &ArenaBounds) -> Self {
        Self {
            width: bounds.width,
            height: bounds.height,
        }
    }
}

/// ティック終了時点のワールドの不変スナップショット
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub bounds: BoundsView,
    /// 生存エンティティのみ
    pub entities: Vec<EntityView>,
    pub battle_over: bool,
    pub winning_team: Option<Team>,
    pub banner: Option<String>,
}

impl WorldSnapshot {
    pub fn capture(world: &World, tick: u64) -> Self {
        Self {
            tick,
            bounds: BoundsView::from(&world.bounds),
            entities: world
                .entities
                .iter()
                .filter(|e| e.is_active())
                .map(EntityView::from_entity)
                .collect(),
            battle_over: world.battle_over,
            winning_team: world.winning_team,
            banner: world.banner(),
        }
    }

    pub fn count(&self, team: Team, kind: EntityKindTag) -> usize {
        self.entities
            .iter()
            .filter(|v| v.team == team && v.kind == kind)
            .count()
    }
}

/// 描画層のインターフェース
pub trait Renderer {
    /// 1ティック分のスナップショットを描画
    fn render(&mut self, snapshot: &WorldSnapshot) -> std::io::Result<()>;
}

/// 描画を行わないレンダラー（ヘッドレス実行・テスト用）
#[derive(Debug, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _snapshot: &WorldSnapshot) -> std::io::Result<()> {
        Ok(())
    }
}

/// テキストで状況を表示するレンダラー
///
/// `interval` ティックごとに1行の状況表示を行い、戦闘終了時はバナーを1度だけ表示する。
pub struct ConsoleRenderer<W: Write> {
    out: W,
    interval: u64,
    banner_shown: bool,
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W, interval: u64) -> Self {
        Self {
            out,
            interval: interval.max(1),
            banner_shown: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for ConsoleRenderer<W> {
    fn render(&mut self, snapshot: &WorldSnapshot) -> std::io::Result<()> {
        if let Some(banner) = &snapshot.banner {
            if !self.banner_shown {
                writeln!(self.out, "{banner}")?;
                self.banner_shown = true;
            }
            return Ok(());
        }

        if snapshot.tick % self.interval != 0 {
            return Ok(());
        }

        write!(
            self.out,
            "[tick {:>5}] Blue {} (+{} AAM) / Red {} (+{} AAM)",
            snapshot.tick,
            snapshot.count(Team::Blue, EntityKindTag::Agent),
            snapshot.count(Team::Blue, EntityKindTag::Missile),
            snapshot.count(Team::Red, EntityKindTag::Agent),
            snapshot.count(Team::Red, EntityKindTag::Missile),
        )?;
        for view in snapshot.entities.iter().filter(|v| v.kind == EntityKindTag::Agent) {
            write!(
                self.out,
                " | {} ({:.0},{:.0}) {:.0}° {:.0}%",
                view.id,
                view.position.x,
                view.position.y,
                view.heading,
                view.health_ratio * 100.0
            )?;
        }
        writeln!(self.out)
    }
}

/// 1ティック1行のJSONでスナップショットを出力するレンダラー（外部描画プログラム向け）
pub struct JsonLinesRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for JsonLinesRenderer<W> {
    fn render(&mut self, snapshot: &WorldSnapshot) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.out, snapshot)?;
        writeln!(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;

    fn sample_world() -> World {
        let mut world = World::new(ArenaBounds::new(400.0, 300.0));
        world.spawn_agent(Team::Blue, Position2D::new(0.0, 0.0), &AgentConfig::default());
        let red = world.spawn_agent(Team::Red, Position2D::new(50.0, 50.0), &AgentConfig::default());
        if let Some(entity) = world.get_mut(red) {
            entity.take_damage(80);
        }
        world
    }

    #[test]
    fn test_health_band_thresholds() {
        assert_eq!(HealthBand::from_ratio(1.0), HealthBand::Green);
        assert_eq!(HealthBand::from_ratio(0.7), HealthBand::Green);
        assert_eq!(HealthBand::from_ratio(0.5), HealthBand::Yellow);
        assert_eq!(HealthBand::from_ratio(0.2), HealthBand::Red);
    }

    #[test]
    fn test_snapshot_contains_only_alive_entities() {
        let mut world = sample_world();
        let mut snapshot = WorldSnapshot::capture(&world, 3);
        assert_eq!(snapshot.entities.len(), 2);
        assert_eq!(snapshot.entities[1].color, EntityColor::Red);
        assert_eq!(snapshot.entities[1].health_band, HealthBand::Red);

        world.entities[1].destroy();
        snapshot = WorldSnapshot::capture(&world, 4);
        assert_eq!(snapshot.entities.len(), 1);
        assert_eq!(snapshot.bounds.width, 400.0);
    }

    #[test]
    fn test_console_renderer_prints_banner_once() {
        let mut world = sample_world();
        world.entities[1].destroy();
        world.evaluate_win();

        let mut renderer = ConsoleRenderer::new(Vec::new(), 10);
        let snapshot = WorldSnapshot::capture(&world, 7);
        renderer.render(&snapshot).unwrap();
        renderer.render(&snapshot).unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(output, "End of Battle. Blue Team Wins!\n");
    }

    #[test]
    fn test_json_lines_renderer() {
        let world = sample_world();
        let mut renderer = JsonLinesRenderer::new(Vec::new());
        renderer.render(&WorldSnapshot::capture(&world, 1)).unwrap();

        let output = String::from_utf8(renderer.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(value["tick"], 1);
        assert_eq!(value["entities"].as_array().map(Vec::len), Some(2));
        assert_eq!(value["battle_over"], false);
    }
}
