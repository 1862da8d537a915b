//! # mwsim: 2次元リアルタイム空戦シミュレーション
//!
//! プレイヤー操作のBlue機と、追尾誘導で接近するRed機が有界アリーナ内で機動し、
//! 近接信管付きの空対空ミサイルで交戦します。描画・入力は外部の層が担当し、
//! このクレートは固定ティックのシミュレーションとスナップショット出力のみを提供します。

pub mod collision;
pub mod config;
pub mod guidance;
pub mod input;
pub mod logging;
pub mod models;
pub mod presentation;
pub mod scenario;
pub mod simulation;
pub mod world;
