// 基本的なデータ型と数学ユーティリティ
pub mod common;

// 機体・ミサイル共通のエンティティと運動更新
pub mod entity;

// 各エンティティ種別の固有データと操作
pub mod agent;
pub mod missile;

// 便利な re-export
pub use agent::AgentData;
pub use common::*;
pub use entity::{ArenaBounds, Entity, EntityKind, EntityKindTag, Kinematics};
pub use missile::MissileData;
