//! # Config モジュール
//!
//! シミュレーションの調整パラメータ（アリーナ寸法、時間刻み、機体・ミサイル性能、
//! ログ設定）をYAMLファイルから読み込みます。
//!
//! 登場するエンティティの構成はコード側の固定シナリオ（[`crate::scenario`]）で
//! 決まり、ここでは扱いません。全フィールドに既定値があるため、一部だけを
//! 記述したファイルや空のファイルも有効です。
//!
//! ```yaml
//! sim:
//!   tick_rate_hz: 60
//!   seed: 7
//! missile:
//!   arming_delay_ticks: 5
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 設定メタデータ
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigMeta {
    pub name: String,
    pub description: String,
}

impl Default for ConfigMeta {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            description: "1 Blue vs 2 Red air combat".to_string(),
        }
    }
}

/// 時間進行の設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingConfig {
    /// 1ステップで進めるティック量（速度・旋回量などは全て1ティックあたりの値）
    pub dt: f64,
    /// 実時間実行時のティックレート [Hz]
    pub tick_rate_hz: f64,
    /// 最大ステップ数（0で無制限）
    pub max_ticks: u64,
    /// 乱数シード
    pub seed: u64,
}

impl TimingConfig {
    /// 実時間実行時の1ティックの長さ
    ///
    /// ティックレートが正の有限値でない場合や、周期が0に丸められる場合は `None`。
    pub fn tick_period(&self) -> Option<Duration> {
        if !(self.tick_rate_hz.is_finite() && self.tick_rate_hz > 0.0) {
            return None;
        }
        Duration::try_from_secs_f64(1.0 / self.tick_rate_hz)
            .ok()
            .filter(|period| !period.is_zero())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            dt: 1.0,
            tick_rate_hz: 30.0,
            max_ticks: 10_000,
            seed: 42,
        }
    }
}

/// アリーナ設定
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub width: f64,
    pub height: f64,
    /// 見えない壁の内側余白
    pub boundary_margin: f64,
    /// 壁に当たった速度成分に掛ける係数（-1.0: 完全反射、-0.1: 強い減衰）
    pub wall_restitution: f64,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            boundary_margin: 10.0,
            wall_restitution: -1.0,
        }
    }
}

/// 機体（エージェント）の性能
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_health: u32,
    pub collision_radius: f64,
    /// 旋回量 [deg/tick]
    pub rotation_rate: f64,
    /// 推力キー1回あたりの推力増分
    pub acceleration: f64,
    pub max_thrust: f64,
    pub initial_heading: f64,
    /// Blue機の搭載ミサイル数
    pub missiles_loaded: usize,
    /// 追尾誘導中のRedエンティティに設定する推力
    pub pursuit_thrust: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_health: 100,
            collision_radius: 20.0,
            rotation_rate: 5.0,
            acceleration: 0.5,
            max_thrust: 2.0,
            initial_heading: 90.0,
            missiles_loaded: 4,
            pursuit_thrust: 0.05,
        }
    }
}

/// 空対空ミサイルの性能
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MissileConfig {
    pub damage: u32,
    /// 近接信管の作動半径
    pub fuse_radius: f64,
    pub max_fuel: f64,
    /// 1ティックあたりの燃料消費量
    pub burn_rate: f64,
    /// 発射時に機体速度へ加算される初速
    pub launch_speed: f64,
    /// 発射後、衝突判定の対象になるまでのティック数
    pub arming_delay_ticks: u32,
    pub max_health: u32,
}

impl Default for MissileConfig {
    fn default() -> Self {
        Self {
            damage: 50,
            fuse_radius: 4.0,
            max_fuel: 300.0,
            burn_rate: 4.0,
            launch_speed: 4.0,
            arming_delay_ticks: 3,
            max_health: 1,
        }
    }
}

/// ログ設定（文字列のまま保持し、[`crate::logging`] で解釈する）
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub output: String,
    pub dir: String,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            output: "console".to_string(),
            dir: "logs".to_string(),
            file_prefix: "mwsim".to_string(),
        }
    }
}

/// 完全なシミュレーション設定
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SimConfig {
    pub meta: ConfigMeta,
    pub sim: TimingConfig,
    pub arena: ArenaConfig,
    pub agent: AgentConfig,
    pub missile: MissileConfig,
    pub logging: LoggingConfig,
}

impl SimConfig {
    /// YAMLファイルから設定を読み込み
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let contents =
            fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;

        let config = Self::from_yaml_str(&contents)
            .map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;

        config.validate()?;

        Ok(config)
    }

    /// YAML文字列を解析（検証は行わない）
    pub fn from_yaml_str(contents: &str) -> Result<Self, serde_yaml::Error> {
        // 空文字列はnullとして解析されるため既定値を返す
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
    }

    /// 設定の基本的な検証
    ///
    /// 実数値は全て有限でなければならない（NaN・無限大は不可）。
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ensure_finite()?;

        if self.sim.dt <= 0.0 {
            return Err(ConfigError::Validation("sim.dt must be positive".to_string()));
        }
        if self.sim.tick_rate_hz <= 0.0 {
            return Err(ConfigError::Validation(
                "sim.tick_rate_hz must be positive".to_string(),
            ));
        }
        if self.sim.tick_period().is_none() {
            return Err(ConfigError::Validation(format!(
                "sim.tick_rate_hz {} is too high for a tick interval",
                self.sim.tick_rate_hz
            )));
        }

        let arena = &self.arena;
        if arena.boundary_margin < 0.0 {
            return Err(ConfigError::Validation(
                "arena.boundary_margin must not be negative".to_string(),
            ));
        }
        if arena.width <= 2.0 * arena.boundary_margin || arena.height <= 2.0 * arena.boundary_margin {
            return Err(ConfigError::Validation(format!(
                "arena {}x{} is too small for margin {}",
                arena.width, arena.height, arena.boundary_margin
            )));
        }
        if !(-1.0..=0.0).contains(&arena.wall_restitution) {
            return Err(ConfigError::Validation(
                "arena.wall_restitution must be within [-1, 0]".to_string(),
            ));
        }

        let agent = &self.agent;
        if agent.max_health == 0 || agent.collision_radius <= 0.0 {
            return Err(ConfigError::Validation(
                "agent.max_health and agent.collision_radius must be positive".to_string(),
            ));
        }
        if agent.rotation_rate < 0.0
            || agent.acceleration < 0.0
            || agent.max_thrust < 0.0
            || agent.pursuit_thrust < 0.0
        {
            return Err(ConfigError::Validation(
                "agent rates must not be negative".to_string(),
            ));
        }

        let missile = &self.missile;
        if missile.max_health == 0 || missile.fuse_radius <= 0.0 || missile.max_fuel <= 0.0 {
            return Err(ConfigError::Validation(
                "missile.max_health, missile.fuse_radius and missile.max_fuel must be positive"
                    .to_string(),
            ));
        }
        if missile.burn_rate <= 0.0 || missile.launch_speed < 0.0 {
            return Err(ConfigError::Validation(
                "missile.burn_rate must be positive and missile.launch_speed not negative"
                    .to_string(),
            ));
        }

        Ok(())
    }

    fn ensure_finite(&self) -> Result<(), ConfigError> {
        let fields = [
            ("sim.dt", self.sim.dt),
            ("sim.tick_rate_hz", self.sim.tick_rate_hz),
            ("arena.width", self.arena.width),
            ("arena.height", self.arena.height),
            ("arena.boundary_margin", self.arena.boundary_margin),
            ("arena.wall_restitution", self.arena.wall_restitution),
            ("agent.collision_radius", self.agent.collision_radius),
            ("agent.rotation_rate", self.agent.rotation_rate),
            ("agent.acceleration", self.agent.acceleration),
            ("agent.max_thrust", self.agent.max_thrust),
            ("agent.initial_heading", self.agent.initial_heading),
            ("agent.pursuit_thrust", self.agent.pursuit_thrust),
            ("missile.fuse_radius", self.missile.fuse_radius),
            ("missile.max_fuel", self.missile.max_fuel),
            ("missile.burn_rate", self.missile.burn_rate),
            ("missile.launch_speed", self.missile.launch_speed),
        ];

        match fields.iter().find(|(_, value)| !value.is_finite()) {
            Some((name, value)) => Err(ConfigError::Validation(format!(
                "{} must be a finite number (got {})",
                name, value
            ))),
            None => Ok(()),
        }
    }

    /// 設定の概要を表示
    pub fn print_summary(&self) {
        println!("=== 設定情報 ===");
        println!("名前: {}", self.meta.name);
        println!("説明: {}", self.meta.description);
        println!();

        println!("=== シミュレーション設定 ===");
        println!("時間刻み: {:.3}ティック", self.sim.dt);
        println!("ティックレート: {:.1}Hz", self.sim.tick_rate_hz);
        if self.sim.max_ticks > 0 {
            println!("最大ステップ数: {}", self.sim.max_ticks);
        } else {
            println!("最大ステップ数: 無制限");
        }
        println!("シード値: {}", self.sim.seed);
        println!();

        println!("=== アリーナ ===");
        println!("寸法: {:.0} x {:.0}", self.arena.width, self.arena.height);
        println!("壁の余白: {:.0}", self.arena.boundary_margin);
        println!("反射係数: {:.2}", self.arena.wall_restitution);
        println!();

        println!("=== 機体 ===");
        println!("耐久値: {}", self.agent.max_health);
        println!("衝突半径: {:.1}", self.agent.collision_radius);
        println!("搭載ミサイル数: {}発", self.agent.missiles_loaded);
        println!();

        println!("=== ミサイル ===");
        println!("ダメージ: {}", self.missile.damage);
        println!("近接信管半径: {:.1}", self.missile.fuse_radius);
        println!(
            "燃料: {:.0} (航続 {:.0}ティック)",
            self.missile.max_fuel,
            self.missile.max_fuel / self.missile.burn_rate
        );
        println!("安全装置解除: {}ティック", self.missile.arming_delay_ticks);
    }
}

/// 設定読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("設定ファイルが見つかりません: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("ファイル読み込みエラー {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),
    #[error("YAML解析エラー {}: {}", .0.display(), .1)]
    Parse(PathBuf, #[source] serde_yaml::Error),
    #[error("設定検証エラー: {0}")]
    Validation(String),
}
