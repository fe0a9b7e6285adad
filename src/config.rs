use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "airport-tui.toml";
pub const DEFAULT_DB_PATH: &str = "airport-tui.db";
pub const DEFAULT_RESET_ON_START: bool = true;
pub const DEFAULT_CASE_SENSITIVE: bool = false;
pub const DEFAULT_THEME: &str = "default";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FILE: &str = "airport-tui.log";

#[derive(Debug, Clone)]
pub struct Config {
    pub config_path: PathBuf,
    pub db_path: PathBuf,
    pub reset_on_start: bool,
    pub seed_file: String,
    pub case_sensitive: bool,
    pub theme: String,
    pub log_enabled: bool,
    pub log_level: String,
    pub log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            reset_on_start: DEFAULT_RESET_ON_START,
            seed_file: String::new(),
            case_sensitive: DEFAULT_CASE_SENSITIVE,
            theme: DEFAULT_THEME.to_string(),
            log_enabled: false,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    db_path: Option<String>,
    reset_on_start: Option<bool>,
    seed_file: Option<String>,
    case_sensitive: Option<bool>,
    theme: Option<String>,
    log_enabled: Option<bool>,
    log_level: Option<String>,
    log_file: Option<String>,
}

pub fn parse_args() -> Result<Config> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_from(&args)
}

fn parse_from(args: &[String]) -> Result<Config> {
    let mut explicit_config: Option<PathBuf> = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let value = iter
                .next()
                .ok_or_else(|| anyhow!("--config needs a value"))?;
            explicit_config = Some(PathBuf::from(value));
        }
    }

    let env_config = env::var("AIRPORT_TUI_CONFIG").ok().map(PathBuf::from);
    let config_path = explicit_config
        .clone()
        .or(env_config)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let mut config = Config::default();

    if config_path.exists() {
        let file_config = load_file_config(&config_path)?;
        apply_file_config(&mut config, file_config);
    } else if explicit_config.is_some() {
        return Err(anyhow!("Config file not found: {}", config_path.display()));
    }
    config.config_path = config_path;

    apply_env(&mut config);
    apply_flags(&mut config, args)?;
    Ok(config)
}

fn env_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn apply_env(config: &mut Config) {
    if let Ok(value) = env::var("AIRPORT_TUI_DB") {
        config.db_path = PathBuf::from(value);
    }
    if let Ok(value) = env::var("AIRPORT_TUI_RESET_ON_START") {
        config.reset_on_start = env_flag(&value);
    }
    if let Ok(value) = env::var("AIRPORT_TUI_SEED_FILE") {
        config.seed_file = value;
    }
    if let Ok(value) = env::var("AIRPORT_TUI_CASE_SENSITIVE") {
        config.case_sensitive = env_flag(&value);
    }
    if let Ok(value) = env::var("AIRPORT_TUI_THEME") {
        config.theme = value;
    }
    if let Ok(value) = env::var("AIRPORT_TUI_LOG_ENABLED") {
        config.log_enabled = env_flag(&value);
    }
    if let Ok(value) = env::var("AIRPORT_TUI_LOG_LEVEL") {
        config.log_level = value;
    }
    if let Ok(value) = env::var("AIRPORT_TUI_LOG_FILE") {
        config.log_file = value;
    }
}

fn apply_flags(config: &mut Config, args: &[String]) -> Result<()> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                iter.next();
            }
            "--db" => {
                config.db_path = PathBuf::from(
                    iter.next()
                        .ok_or_else(|| anyhow!("--db needs a value"))?,
                );
            }
            "--seed-file" => {
                config.seed_file = iter
                    .next()
                    .ok_or_else(|| anyhow!("--seed-file needs a value"))?
                    .to_string();
            }
            "--keep-favorites" => {
                config.reset_on_start = false;
            }
            "--reset" => {
                config.reset_on_start = true;
            }
            "--case-sensitive" => {
                config.case_sensitive = true;
            }
            "--ignore-case" => {
                config.case_sensitive = false;
            }
            "--theme" => {
                config.theme = iter
                    .next()
                    .ok_or_else(|| anyhow!("--theme needs a value"))?
                    .to_string();
            }
            "--log" => {
                config.log_enabled = true;
            }
            "--no-log" => {
                config.log_enabled = false;
            }
            "--log-level" => {
                config.log_level = iter
                    .next()
                    .ok_or_else(|| anyhow!("--log-level needs a value"))?
                    .to_string();
            }
            "--log-file" => {
                config.log_file = iter
                    .next()
                    .ok_or_else(|| anyhow!("--log-file needs a value"))?
                    .to_string();
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                return Err(anyhow!("Unknown argument: {other}"));
            }
        }
    }
    Ok(())
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let cfg: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.display()))?;
    Ok(cfg)
}

fn apply_file_config(target: &mut Config, file: FileConfig) {
    if let Some(db_path) = file.db_path {
        if !db_path.trim().is_empty() {
            target.db_path = PathBuf::from(db_path.trim());
        }
    }
    if let Some(reset_on_start) = file.reset_on_start {
        target.reset_on_start = reset_on_start;
    }
    if let Some(seed_file) = file.seed_file {
        target.seed_file = seed_file;
    }
    if let Some(case_sensitive) = file.case_sensitive {
        target.case_sensitive = case_sensitive;
    }
    if let Some(theme) = file.theme {
        target.theme = theme;
    }
    if let Some(log_enabled) = file.log_enabled {
        target.log_enabled = log_enabled;
    }
    if let Some(log_level) = file.log_level {
        target.log_level = log_level;
    }
    if let Some(log_file) = file.log_file {
        target.log_file = log_file;
    }
}

fn print_help() {
    println!("airport-tui");
    println!("Usage: airport-tui [--config PATH] [--db PATH] [--seed-file PATH]");
    println!("       [--keep-favorites] [--reset] [--case-sensitive] [--ignore-case]");
    println!("       [--theme default|amber|mono]");
    println!("       [--log] [--no-log] [--log-level LEVEL] [--log-file PATH]");
    println!("Environment: AIRPORT_TUI_CONFIG overrides config path");
    println!("Environment: AIRPORT_TUI_DB sets the SQLite database path");
    println!("Environment: AIRPORT_TUI_RESET_ON_START=0 keeps favorites across launches");
    println!("Environment: AIRPORT_TUI_SEED_FILE replaces the built-in airport list");
    println!("Environment: AIRPORT_TUI_CASE_SENSITIVE=1 enables case-sensitive search");
    println!("Environment: AIRPORT_TUI_THEME sets the color theme");
    println!("Environment: AIRPORT_TUI_LOG_ENABLED/LEVEL/FILE configure logging");
    println!("Keys: type to search | empty field shows favorites | up/down move | enter flights");
    println!("      enter on a flight saves it | esc close/quit | ctrl+x clear favorites | F1 help");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file(name: &str) -> PathBuf {
        let mut dir = std::env::temp_dir();
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        dir.push(format!("airport-tui-config-test-{suffix}"));
        let _ = fs::create_dir_all(&dir);
        dir.push(name);
        dir
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn defaults_reset_and_ignore_case() {
        let cfg = Config::default();
        assert!(cfg.reset_on_start);
        assert!(!cfg.case_sensitive);
        assert_eq!(cfg.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert!(cfg.seed_file.is_empty());
    }

    #[test]
    fn load_file_config_parses_values() {
        let path = temp_file("config.toml");
        let content = r#"
db_path = "data/airports.db"
reset_on_start = false
seed_file = "seed.toml"
case_sensitive = true
theme = "amber"
log_enabled = true
log_level = "debug"
log_file = "trace.log"
"#;
        fs::write(&path, content).unwrap();
        let file = load_file_config(&path).unwrap();
        assert_eq!(file.db_path.as_deref(), Some("data/airports.db"));
        assert_eq!(file.reset_on_start, Some(false));
        assert_eq!(file.case_sensitive, Some(true));

        let mut cfg = Config::default();
        apply_file_config(&mut cfg, file);
        assert_eq!(cfg.db_path, PathBuf::from("data/airports.db"));
        assert!(!cfg.reset_on_start);
        assert_eq!(cfg.seed_file, "seed.toml");
        assert!(cfg.case_sensitive);
        assert_eq!(cfg.theme, "amber");
        assert!(cfg.log_enabled);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.log_file, "trace.log");
        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir(path.parent().unwrap());
    }

    #[test]
    fn blank_db_path_keeps_default() {
        let mut cfg = Config::default();
        let file = FileConfig {
            db_path: Some("  ".to_string()),
            ..Default::default()
        };
        apply_file_config(&mut cfg, file);
        assert_eq!(cfg.db_path, PathBuf::from(DEFAULT_DB_PATH));
    }

    #[test]
    fn flags_override_values() {
        let mut cfg = Config::default();
        apply_flags(
            &mut cfg,
            &args(&[
                "--db",
                ":memory:",
                "--keep-favorites",
                "--case-sensitive",
                "--theme",
                "mono",
                "--log",
                "--log-level",
                "trace",
            ]),
        )
        .unwrap();
        assert_eq!(cfg.db_path, PathBuf::from(":memory:"));
        assert!(!cfg.reset_on_start);
        assert!(cfg.case_sensitive);
        assert_eq!(cfg.theme, "mono");
        assert!(cfg.log_enabled);
        assert_eq!(cfg.log_level, "trace");
    }

    #[test]
    fn unknown_flag_is_rejected() {
        let mut cfg = Config::default();
        let err = apply_flags(&mut cfg, &args(&["--verbose"])).unwrap_err();
        assert!(err.to_string().contains("Unknown argument: --verbose"));
        let err = apply_flags(&mut cfg, &args(&["--db"])).unwrap_err();
        assert!(err.to_string().contains("--db needs a value"));
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let path = temp_file("absent.toml");
        let err = parse_from(&args(&["--config", path.to_str().unwrap()])).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
        let _ = fs::remove_dir(path.parent().unwrap());
    }

    #[test]
    fn env_flag_values() {
        assert!(env_flag("1"));
        assert!(env_flag("Yes"));
        assert!(!env_flag("0"));
        assert!(!env_flag("off"));
    }
}
