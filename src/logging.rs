//! # Logging モジュール
//!
//! tracing-subscriberの初期化を行います。
//!
//! コンソール（標準エラー出力）にはcompact形式、ファイルにはJSON形式（日次ローテーション）で出力し、
//! ファイルへの書き込みはtracing-appenderのワーカースレッドが非同期に行うため
//! ティック処理を妨げません。出力先は `console` / `file` / `both` から選択します。
//!
//! 環境変数 `RUST_LOG` が設定されている場合は、設定ファイルのログレベルより優先されます。

use std::str::FromStr;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// ログ出力先
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    Console,
    File,
    Both,
}

impl LogOutput {
    fn to_console(self) -> bool {
        matches!(self, LogOutput::Console | LogOutput::Both)
    }

    fn to_file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::Both)
    }
}

impl FromStr for LogOutput {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "console" | "stderr" => Ok(LogOutput::Console),
            "file" => Ok(LogOutput::File),
            "both" | "all" => Ok(LogOutput::Both),
            _ => Err(format!("ログ出力先 '{}' は不正です (console, file, both のいずれか)", s)),
        }
    }
}

/// 解釈済みのログ設定
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub output: LogOutput,
    /// ファイル出力時のディレクトリ
    pub log_dir: String,
    pub file_prefix: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            output: LogOutput::Console,
            log_dir: "logs".to_string(),
            file_prefix: "mwsim".to_string(),
        }
    }
}

impl LogConfig {
    /// 設定ファイルの `logging` セクションを解釈します
    ///
    /// # 引数
    ///
    /// * `settings` - 文字列のままのログ設定
    ///
    /// # 戻り値
    ///
    /// 出力先が不正な場合はエラーメッセージ（ログレベルは不正でもINFOで続行）
    pub fn from_settings(settings: &LoggingConfig) -> Result<Self, String> {
        Ok(Self {
            level: parse_log_level(&settings.level),
            output: settings.output.parse()?,
            log_dir: settings.dir.clone(),
            file_prefix: settings.file_prefix.clone(),
        })
    }
}

/// グローバルsubscriberを登録します
///
/// ファイル出力を含む場合は [`WorkerGuard`] を返します。ガードを破棄すると
/// 未書き込みのログが失われるため、`main` の終了まで保持してください。
/// 既にsubscriberが登録済みの場合はエラーになります。
pub fn init_logging(config: LogConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.as_str().to_ascii_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = config
        .output
        .to_console()
        .then(|| fmt::layer().with_writer(std::io::stderr).with_target(true).compact());

    let (file_layer, guard) = if config.output.to_file() {
        ensure_log_directory(&config.log_dir)?;
        let appender = tracing_appender::rolling::daily(&config.log_dir, &config.file_prefix);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .json();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

/// ログレベル文字列を解析（不正な値は警告してINFO）
pub fn parse_log_level(level_str: &str) -> Level {
    level_str.trim().parse().unwrap_or_else(|_| {
        eprintln!("警告: ログレベル '{}' は不正です。INFOを使用します", level_str);
        Level::INFO
    })
}

/// `-v` の指定回数を反映したログレベル
///
/// `-v` で少なくともDEBUG、`-vv` 以上でTRACE。
pub fn level_for_verbosity(verbose_level: u8, base: Level) -> Level {
    match verbose_level {
        0 => base,
        1 => base.max(Level::DEBUG),
        _ => Level::TRACE,
    }
}

pub fn ensure_log_directory(log_dir: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(log_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_output_parsing() {
        assert_eq!("stderr".parse(), Ok(LogOutput::Console));
        assert_eq!("FILE".parse(), Ok(LogOutput::File));
        assert_eq!("all".parse(), Ok(LogOutput::Both));
        assert!("syslog".parse::<LogOutput>().is_err());
    }

    #[test]
    fn test_log_output_destinations() {
        assert!(LogOutput::Console.to_console() && !LogOutput::Console.to_file());
        assert!(!LogOutput::File.to_console() && LogOutput::File.to_file());
        assert!(LogOutput::Both.to_console() && LogOutput::Both.to_file());
    }

    #[test]
    fn test_parse_log_level_falls_back_to_info() {
        assert_eq!(parse_log_level("trace"), Level::TRACE);
        assert_eq!(parse_log_level("Warn"), Level::WARN);
        assert_eq!(parse_log_level("loud"), Level::INFO);
    }

    #[test]
    fn test_level_for_verbosity() {
        assert_eq!(level_for_verbosity(0, Level::WARN), Level::WARN);
        assert_eq!(level_for_verbosity(1, Level::INFO), Level::DEBUG);
        assert_eq!(level_for_verbosity(1, Level::TRACE), Level::TRACE);
        assert_eq!(level_for_verbosity(3, Level::INFO), Level::TRACE);
    }

    #[test]
    fn test_log_config_from_settings() {
        let settings = LoggingConfig {
            level: "warn".to_string(),
            output: "both".to_string(),
            ..LoggingConfig::default()
        };
        let config = LogConfig::from_settings(&settings).unwrap();
        assert_eq!(config.level, Level::WARN);
        assert_eq!(config.output, LogOutput::Both);
        assert_eq!(config.file_prefix, "mwsim");

        let invalid = LoggingConfig {
            output: "syslog".to_string(),
            ..LoggingConfig::default()
        };
        assert!(LogConfig::from_settings(&invalid).is_err());
    }

    #[test]
    fn test_default_log_config() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.output, LogOutput::Console);
    }
}
