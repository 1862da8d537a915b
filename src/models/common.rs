use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

use serde::{Deserialize, Serialize};

/// 2次元位置を表す構造体（アリーナ中心が原点）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position2D {
    pub x: f64,
    pub y: f64,
}

impl Position2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 2点間のユークリッド距離
    pub fn distance(&self, other: &Position2D) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// 原点からの距離
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2)).sqrt()
    }

}

impl Add<Velocity2D> for Position2D {
    type Output = Self;

    fn add(self, velocity: Velocity2D) -> Self::Output {
        Self::new(self.x + velocity.x, self.y + velocity.y)
    }
}

impl AddAssign<Velocity2D> for Position2D {
    fn add_assign(&mut self, velocity: Velocity2D) {
        self.x += velocity.x;
        self.y += velocity.y;
    }
}

impl Sub for Position2D {
    type Output = Self;

    fn sub(self, other: Self) -> Self::Output {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

/// 2次元速度（1ティックあたりの移動量）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity2D {
    pub x: f64,
    pub y: f64,
}

impl Velocity2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 方位（度）と大きさから速度ベクトルを作成
    pub fn from_heading(heading_deg: f64, magnitude: f64) -> Self {
        let rad = math_utils::deg_to_rad(heading_deg);
        Self::new(magnitude * rad.cos(), magnitude * rad.sin())
    }

    /// 速度ベクトルの大きさ
    pub fn magnitude(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2)).sqrt()
    }
}

impl Add for Velocity2D {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Velocity2D {
    fn add_assign(&mut self, other: Self) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Mul<f64> for Velocity2D {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

/// ワールド内でエンティティを一意に識別するID
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:03}", self.0)
    }
}

/// 所属陣営
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Blue,
    Red,
}

impl Team {
    /// バナー表示用の陣営名
    pub fn display_name(&self) -> &'static str {
        match self {
            Team::Blue => "Blue Team",
            Team::Red => "Red Team",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// エンティティのライフサイクル状態
///
/// 搭載中のミサイルは `Ready`、発射後のミサイルと全ての機体は `InFlight`。
/// `Destroyed` は終端状態で、以後は移動・衝突・描画の対象外となる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Ready,
    InFlight,
    Destroyed,
}

/// 数学ユーティリティ関数
pub mod math_utils {
    /// 度をラジアンに変換
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees.to_radians()
    }

    /// ラジアンを度に変換
    pub fn rad_to_deg(radians: f64) -> f64 {
        radians.to_degrees()
    }

    /// 方位を0度以上360度未満に正規化
    pub fn normalize_heading(heading_deg: f64) -> f64 {
        let normalized = heading_deg.rem_euclid(360.0);
        // rem_euclidは-1e-14のような値で360.0を返すことがある
        if normalized >= 360.0 { 0.0 } else { normalized }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Position2D::new(0.0, 0.0);
        let b = Position2D::new(3.0, 4.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.magnitude(), 5.0);
    }

    #[test]
    fn test_velocity_from_heading() {
        let v = Velocity2D::from_heading(90.0, 2.0);
        assert!(v.x.abs() < 1e-12);
        assert!((v.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_heading() {
        assert_eq!(math_utils::normalize_heading(365.0), 5.0);
        assert_eq!(math_utils::normalize_heading(-90.0), 270.0);
        assert_eq!(math_utils::normalize_heading(360.0), 0.0);
        assert!(math_utils::normalize_heading(-1e-15) < 360.0);
    }

    #[test]
    fn test_team_names() {
        assert_eq!(Team::Blue.display_name(), "Blue Team");
        assert_eq!(Team::Red.to_string(), "Red Team");
    }
}
