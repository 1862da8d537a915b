use std::io;

use clap::{Arg, Command};
use tokio::sync::mpsc;
use tracing::{error, info};

use mwsim::config::SimConfig;
use mwsim::input;
use mwsim::logging::{self, LogConfig};
use mwsim::presentation::{ConsoleRenderer, JsonLinesRenderer, Renderer};
use mwsim::simulation::{RunSummary, SimulationEngine};

fn main() {
    let matches = Command::new("mwsim")
        .version("0.1.0")
        .about("空戦シミュレーション (Multi-agent Weapons Scheduling)")
        .long_about(
            "Blue機1機とRed機2機による2次元空戦シミュレーション\n\
             固定ティックで運動・誘導・衝突判定を行い、スナップショットを出力します。",
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("設定ファイル(.yaml)のパスを指定")
                .long_help(
                    "調整パラメータを記述した設定ファイル(.yaml)のパスを指定します。\n\
                     指定しない場合は既定値で実行されます。",
                ),
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .action(clap::ArgAction::SetTrue)
                .help("設定の情報のみ表示して終了"),
        )
        .arg(
            Arg::new("ticks")
                .short('n')
                .long("ticks")
                .value_name("N")
                .value_parser(clap::value_parser!(u64))
                .help("最大ステップ数 (0で無制限)"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("SEED")
                .value_parser(clap::value_parser!(u64))
                .help("乱数シードを上書き"),
        )
        .arg(
            Arg::new("realtime")
                .short('r')
                .long("realtime")
                .action(clap::ArgAction::SetTrue)
                .help("設定のティックレートで実時間実行"),
        )
        .arg(
            Arg::new("interactive")
                .long("interactive")
                .action(clap::ArgAction::SetTrue)
                .requires("realtime")
                .help("標準入力から操作コマンドを読む (left, right, up, fire など)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(clap::ArgAction::SetTrue)
                .help("毎ティックのスナップショットをJSON Lines形式で標準出力へ出力"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("ログレベル (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("log-output")
                .long("log-output")
                .value_name("OUTPUT")
                .help("ログ出力先 (console, file, both)"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(clap::ArgAction::Count)
                .help("詳細出力レベル (-v: 基本, -vv: 詳細, -vvv: デバッグ)"),
        )
        .get_matches();

    let options = RunOptions {
        config_path: matches.get_one::<String>("config").cloned(),
        info_only: matches.get_flag("info"),
        ticks: matches.get_one::<u64>("ticks").copied(),
        seed: matches.get_one::<u64>("seed").copied(),
        realtime: matches.get_flag("realtime"),
        interactive: matches.get_flag("interactive"),
        json: matches.get_flag("json"),
        log_level: matches.get_one::<String>("log-level").cloned(),
        log_output: matches.get_one::<String>("log-output").cloned(),
        verbose_level: matches.get_count("verbose"),
    };

    if let Err(e) = run(options) {
        eprintln!("エラー: {}", e);
        std::process::exit(1);
    }
}

struct RunOptions {
    config_path: Option<String>,
    info_only: bool,
    ticks: Option<u64>,
    seed: Option<u64>,
    realtime: bool,
    interactive: bool,
    json: bool,
    log_level: Option<String>,
    log_output: Option<String>,
    verbose_level: u8,
}

fn run(options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &options.config_path {
        Some(path) => SimConfig::from_file(path)?,
        None => SimConfig::default(),
    };

    if let Some(ticks) = options.ticks {
        config.sim.max_ticks = ticks;
    }
    if let Some(seed) = options.seed {
        config.sim.seed = seed;
    }
    if let Some(level) = &options.log_level {
        config.logging.level = level.clone();
    }
    if let Some(output) = &options.log_output {
        config.logging.output = output.clone();
    }
    config.validate()?;

    if options.info_only {
        config.print_summary();
        return Ok(());
    }

    let mut log_config = LogConfig::from_settings(&config.logging)?;
    log_config.level = logging::level_for_verbosity(options.verbose_level, log_config.level);
    let _log_guard = logging::init_logging(log_config)?;

    if let Some(path) = &options.config_path {
        info!("設定ファイル読み込み完了: {}", path);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(execute(config, &options));
    // 標準入力の読み取りが残っていても待たずに終了する
    runtime.shutdown_background();

    print_summary(&result?, options.json);

    Ok(())
}

async fn execute(config: SimConfig, options: &RunOptions) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let mut engine = SimulationEngine::new(config, options.verbose_level);
    engine.initialize();

    let intents = if options.interactive {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            if let Err(e) = input::forward_stdin(sender).await {
                error!("標準入力の読み取りに失敗しました: {}", e);
            }
        });
        Some(receiver)
    } else {
        None
    };

    let mut renderer: Box<dyn Renderer> = if options.json {
        Box::new(JsonLinesRenderer::new(io::stdout()))
    } else {
        let interval = engine.config.sim.tick_rate_hz.round().max(1.0) as u64;
        Box::new(ConsoleRenderer::new(io::stdout(), interval))
    };

    let summary = engine.run(renderer.as_mut(), intents, options.realtime).await?;
    Ok(summary)
}

fn print_summary(summary: &RunSummary, json: bool) {
    // JSON出力時は標準出力をスナップショット専用にする
    if json {
        eprintln!("\n{}", format_summary(summary));
    } else {
        println!("\n{}", format_summary(summary));
    }
}

fn format_summary(summary: &RunSummary) -> String {
    let winner = match summary.winning_team {
        Some(team) => format!("勝者: {}", team),
        None => "勝敗未決着".to_string(),
    };
    format!(
        "=== 結果 ===\n総ステップ数: {}\n{}\n生存: Blue {} / Red {}\n撃墜スコア: {}",
        summary.ticks, winner, summary.blue_alive, summary.red_alive, summary.player_score
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use mwsim::models::Team;

    #[test]
    fn test_format_summary() {
        let summary = RunSummary {
            ticks: 120,
            battle_over: true,
            winning_team: Some(Team::Blue),
            blue_alive: 1,
            red_alive: 0,
            player_score: 2,
        };
        let text = format_summary(&summary);
        assert!(text.starts_with("=== 結果 ==="));
        assert!(text.contains("総ステップ数: 120"));
        assert!(text.contains(&format!("勝者: {}", Team::Blue)));
        assert!(text.contains("生存: Blue 1 / Red 0"));
        assert!(text.ends_with("撃墜スコア: 2"));
    }

    #[test]
    fn test_format_summary_without_winner() {
        let summary = RunSummary {
            ticks: 10_000,
            battle_over: false,
            winning_team: None,
            blue_alive: 1,
            red_alive: 2,
            player_score: 0,
        };
        assert!(format_summary(&summary).contains("勝敗未決着"));
    }
}
