//! # Input モジュール
//!
//! 外部入力（キーボード等）を操作意図 [`ControlIntent`] に変換します。
//! 意図はシミュレーションのキューに積まれ、次のティックの先頭でまとめて適用されます。
//!
//! 標準入力からは1行1コマンドのテキストを受け付けます。
//!
//! | 行 | 意図 |
//! |---|---|
//! | `left` / `left-up` | 左旋回 開始 / 停止 |
//! | `right` / `right-up` | 右旋回 開始 / 停止 |
//! | `up` / `up-up` | 推力 上昇 / カット |
//! | `fire` / `space` | ミサイル発射 |

use std::str::FromStr;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::models::Entity;

/// プレイヤー機への操作意図
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlIntent {
    RotateLeft(bool),
    RotateRight(bool),
    Thrust(bool),
    Fire,
}

/// 操作キー（左・右・上矢印と発射キー）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Up,
    Fire,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Release,
}

impl ControlIntent {
    /// キーイベントを操作意図へ変換（発射キーの解放は無視）
    pub fn from_key(key: Key, action: KeyAction) -> Option<Self> {
        let pressed = action == KeyAction::Press;
        match key {
            Key::Left => Some(ControlIntent::RotateLeft(pressed)),
            Key::Right => Some(ControlIntent::RotateRight(pressed)),
            Key::Up => Some(ControlIntent::Thrust(pressed)),
            Key::Fire if pressed => Some(ControlIntent::Fire),
            Key::Fire => None,
        }
    }

    /// 旋回・推力の意図を機体へ適用
    ///
    /// 発射はワールドへの追加を伴うため、ここでは扱わずfalseを返す。
    pub fn apply_to(&self, agent: &mut Entity) -> bool {
        match *self {
            ControlIntent::RotateLeft(true) => agent.rotate_left(),
            ControlIntent::RotateRight(true) => agent.rotate_right(),
            ControlIntent::RotateLeft(false) | ControlIntent::RotateRight(false) => {
                agent.stop_rotation()
            }
            ControlIntent::Thrust(true) => agent.accelerate(),
            ControlIntent::Thrust(false) => agent.decelerate(),
            ControlIntent::Fire => return false,
        }
        true
    }
}

impl FromStr for ControlIntent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, action) = match s.trim().to_lowercase().as_str() {
            "left" => (Key::Left, KeyAction::Press),
            "left-up" => (Key::Left, KeyAction::Release),
            "right" => (Key::Right, KeyAction::Press),
            "right-up" => (Key::Right, KeyAction::Release),
            "up" => (Key::Up, KeyAction::Press),
            "up-up" => (Key::Up, KeyAction::Release),
            "fire" | "space" => (Key::Fire, KeyAction::Press),
            other => {
                return Err(format!(
                    "無効なコマンド: {}. 利用可能: left, left-up, right, right-up, up, up-up, fire",
                    other
                ));
            }
        };
        ControlIntent::from_key(key, action).ok_or_else(|| format!("無効なコマンド: {}", s))
    }
}

/// 行単位の入力を読み、操作意図をチャネルへ送る
///
/// 入力が終端に達するか受信側が閉じられると終了する。空行と `#` で始まる行は無視する。
///
/// # 戻り値
///
/// 送信した意図の数
pub async fn forward_intents<R>(reader: R, sender: UnboundedSender<ControlIntent>) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut sent = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line.parse::<ControlIntent>() {
            Ok(intent) => {
                debug!(intent = ?intent, "INPUT: 操作意図を受信しました");
                if sender.send(intent).is_err() {
                    break;
                }
                sent += 1;
            }
            Err(e) => warn!("{}", e),
        }
    }

    Ok(sent)
}

/// 標準入力から操作意図を読み取る
pub async fn forward_stdin(sender: UnboundedSender<ControlIntent>) -> std::io::Result<usize> {
    forward_intents(BufReader::new(tokio::io::stdin()), sender).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentConfig;
    use crate::models::{EntityId, Position2D, Team};

    #[test]
    fn test_key_mapping() {
        assert_eq!(
            ControlIntent::from_key(Key::Left, KeyAction::Press),
            Some(ControlIntent::RotateLeft(true))
        );
        assert_eq!(
            ControlIntent::from_key(Key::Up, KeyAction::Release),
            Some(ControlIntent::Thrust(false))
        );
        assert_eq!(ControlIntent::from_key(Key::Fire, KeyAction::Press), Some(ControlIntent::Fire));
        assert_eq!(ControlIntent::from_key(Key::Fire, KeyAction::Release), None);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!("left".parse(), Ok(ControlIntent::RotateLeft(true)));
        assert_eq!(" RIGHT-UP ".parse(), Ok(ControlIntent::RotateRight(false)));
        assert_eq!("space".parse(), Ok(ControlIntent::Fire));
        assert!("jump".parse::<ControlIntent>().is_err());
    }

    #[test]
    fn test_apply_to_agent() {
        let mut agent = Entity::agent(
            EntityId(1),
            Team::Blue,
            Position2D::new(0.0, 0.0),
            &AgentConfig::default(),
        );
        assert!(ControlIntent::RotateRight(true).apply_to(&mut agent));
        assert_eq!(agent.kinematics.turn_rate, -5.0);
        assert!(ControlIntent::RotateLeft(false).apply_to(&mut agent));
        assert_eq!(agent.kinematics.turn_rate, 0.0);
        assert!(ControlIntent::Thrust(true).apply_to(&mut agent));
        assert_eq!(agent.kinematics.thrust, 0.5);
        assert!(!ControlIntent::Fire.apply_to(&mut agent));
    }

    #[tokio::test]
    async fn test_forward_intents_skips_invalid_lines() {
        let input: &[u8] = b"left\n\n# comment\njump\nfire\nup-up\n";
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let sent = forward_intents(input, tx).await.unwrap();

        assert_eq!(sent, 3);
        assert_eq!(rx.recv().await, Some(ControlIntent::RotateLeft(true)));
        assert_eq!(rx.recv().await, Some(ControlIntent::Fire));
        assert_eq!(rx.recv().await, Some(ControlIntent::Thrust(false)));
        assert_eq!(rx.recv().await, None);
    }
}
