use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// e.g. "info" | "debug"
    pub log_level: Option<String>,
    pub octoprint: OctoConfig,
    pub display: DisplayConfig,
    pub touch: TouchConfig,
    pub screensaver: ScreensaverConfig,
    pub network: NetworkConfig,
}

/// OctoPrint endpoint and polling behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OctoConfig {
    /// Base of the REST API, endpoint names are appended ("job", "printer", ...)
    pub base_url: String,
    /// File holding the API key, defaults to ~/.octoprint_apikey
    pub api_key_file: Option<PathBuf>,
    /// Populated once at startup from `api_key_file`, never written back
    #[serde(skip)]
    pub api_key: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for OctoConfig {
    fn default() -> Self {
        Self {
            base_url: "http://octopi.local/api/".to_string(),
            api_key_file: None,
            api_key: String::new(),
            connect_timeout_ms: 500,
            request_timeout_ms: 2000,
            poll_interval_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: u32,
    pub height: u32,
    /// framebuffer device, e.g. /dev/fb1 for a PiTFT
    pub framebuffer: PathBuf,
    /// sysfs backlight brightness file, None disables backlight control
    pub backlight: Option<PathBuf>,
    /// value written to the backlight when the display is on
    pub brightness: u8,
    pub fps: u32,
    /// run in the desktop emulator rather than on the framebuffer
    pub emulated: bool,
    /// emulator window pixel scale
    pub scale: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 480,
            framebuffer: PathBuf::from("/dev/fb1"),
            backlight: Some(PathBuf::from("/sys/class/backlight/soc:backlight/brightness")),
            brightness: 1,
            fps: 15,
            emulated: false,
            scale: 2,
        }
    }
}

/// Touch device and raw-axis calibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchConfig {
    pub device: PathBuf,
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    pub swap_xy: bool,
    pub invert_x: bool,
    pub invert_y: bool,
    /// presses arriving within this window of the previous press are dropped
    pub debounce_ms: u64,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/input/touchscreen"),
            min_x: 0,
            max_x: 4095,
            min_y: 0,
            max_y: 4095,
            swap_xy: false,
            invert_x: false,
            invert_y: false,
            debounce_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreensaverConfig {
    /// dashboard frames without a touch before the screensaver starts
    pub timeout_ticks: u32,
    /// appended to the time string that seeds each stream's glyphs
    pub label: String,
    /// glyph source for the occasional free-floating particle
    pub printer_name: String,
    /// frames between new streams
    pub spawn_every: u32,
}

impl Default for ScreensaverConfig {
    fn default() -> Self {
        Self {
            timeout_ticks: 720,
            label: "OctoPrint".to_string(),
            printer_name: "MP Mini Select V2 IIIP 3D Printer".to_string(),
            spawn_every: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub interfaces: Vec<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { interfaces: vec!["wlan0".to_string(), "eth0".to_string()] }
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone)]
#[command(name = "octomon", version, about = "OctoPrint touchscreen monitor", disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(short = 'c', long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Enable debug log level
    #[arg(short = 'v', long, alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub log_level: Option<String>,
    /// OctoPrint API base URL, e.g. http://octopi.local/api/
    #[arg(short = 'u', long)]
    pub url: Option<String>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub api_key_file: Option<PathBuf>,
    #[arg(long)]
    pub display_width: Option<u32>,
    #[arg(long)]
    pub display_height: Option<u32>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub framebuffer: Option<PathBuf>,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub touch_device: Option<PathBuf>,
    #[arg(long)]
    pub fps: Option<u32>,
    /// Dashboard frames before the screensaver starts
    #[arg(short = 't', long)]
    pub timeout_ticks: Option<u32>,
    /// Render to a desktop window (requires the emulator feature)
    #[arg(long, action = ArgAction::SetTrue)]
    pub emulated: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate, read the API key.
pub fn load() -> Result<(Config, Cli), ConfigError> {
    let cli = Cli::parse();
    let cfg = resolve(&cli)?;

    if cli.dump_config {
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok((cfg, cli))
}

/// Defaults < YAML < CLI, then validation and the one-time API key read.
pub fn resolve(cli: &Cli) -> Result<Config, ConfigError> {
    let mut cfg = if let Some(p) = cli.config.as_ref() {
        if !p.exists() {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
        read_yaml(p)?
    } else if let Some(p) = find_config_file() {
        read_yaml(&p)?
    } else {
        Config::default()
    };

    apply_cli_overrides(&mut cfg, cli);
    validate(&cfg)?;

    let key_path = cfg.octoprint.api_key_file.clone().or_else(default_api_key_file);
    cfg.octoprint.api_key = match key_path {
        Some(p) => match read_api_key(&p) {
            Ok(key) => key,
            Err(e) => {
                warn!("No API key read from {}: {}", p.display(), e);
                String::new()
            }
        },
        None => {
            warn!("No home directory, running without an API key");
            String::new()
        }
    };

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    if let Some(home) = home_dir() {
        let p = home.join(".config/octomon/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/octomon.yaml");
        if p.exists() { return Some(p) }
    }
    for candidate in &["octomon.yaml", "config.yaml", "config/octomon.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn default_api_key_file() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".octoprint_apikey"))
}

/// Reads the key file, dropping line breaks the way editors leave them.
pub fn read_api_key(path: &Path) -> Result<String, ConfigError> {
    let raw = fs::read_to_string(path)?;
    let key: String = raw.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    if key.trim().is_empty() {
        return Err(ConfigError::Validation(format!("API key file {} is empty", path.display())));
    }
    Ok(key)
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()          { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                        { cfg.log_level = Some("debug".to_string()); }
    if let Some(u) = &cli.url           { cfg.octoprint.base_url = u.clone(); }
    if cli.api_key_file.is_some()       { cfg.octoprint.api_key_file = cli.api_key_file.clone(); }
    if let Some(w) = cli.display_width  { cfg.display.width = w; }
    if let Some(h) = cli.display_height { cfg.display.height = h; }
    if let Some(f) = &cli.framebuffer   { cfg.display.framebuffer = f.clone(); }
    if let Some(t) = &cli.touch_device  { cfg.touch.device = t.clone(); }
    if let Some(fps) = cli.fps          { cfg.display.fps = fps; }
    if let Some(t) = cli.timeout_ticks  { cfg.screensaver.timeout_ticks = t; }
    if cli.emulated                     { cfg.display.emulated = true; }
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.display.width == 0 || cfg.display.height == 0 {
        return Err(ConfigError::Validation("display width/height must be > 0".into()));
    }
    if cfg.display.fps == 0 {
        return Err(ConfigError::Validation("display fps must be > 0".into()));
    }
    if cfg.screensaver.timeout_ticks == 0 {
        return Err(ConfigError::Validation("screensaver timeout_ticks must be > 0".into()));
    }
    if cfg.screensaver.spawn_every == 0 {
        return Err(ConfigError::Validation("screensaver spawn_every must be > 0".into()));
    }
    if cfg.touch.max_x <= cfg.touch.min_x || cfg.touch.max_y <= cfg.touch.min_y {
        return Err(ConfigError::Validation("touch calibration max must exceed min".into()));
    }
    if !cfg.octoprint.base_url.starts_with("http://") && !cfg.octoprint.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "octoprint base_url must be http(s): {}",
            cfg.octoprint.base_url
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn bare_cli() -> Cli {
        Cli::parse_from(["octomon"])
    }

    #[test]
    fn test_defaults_are_valid() {
        let cfg = Config::default();
        assert!(validate(&cfg).is_ok());
        assert_eq!(cfg.screensaver.timeout_ticks, 720);
        assert_eq!(cfg.network.interfaces, vec!["wlan0", "eth0"]);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg = parse_yaml("display:\n  width: 480\n  height: 320\nscreensaver:\n  timeout_ticks: 300\n").unwrap();
        assert_eq!(cfg.display.width, 480);
        assert_eq!(cfg.display.height, 320);
        assert_eq!(cfg.display.fps, 15);
        assert_eq!(cfg.screensaver.timeout_ticks, 300);
        assert_eq!(cfg.touch.debounce_ms, 250);
    }

    #[test]
    fn test_cli_overrides_yaml() {
        let mut cfg = parse_yaml("display:\n  fps: 30\n").unwrap();
        let cli = Cli::parse_from(["octomon", "--fps", "10", "-t", "5", "-v"]);
        apply_cli_overrides(&mut cfg, &cli);
        assert_eq!(cfg.display.fps, 10);
        assert_eq!(cfg.screensaver.timeout_ticks, 5);
        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut cfg = Config::default();
        cfg.screensaver.timeout_ticks = 0;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_url() {
        let mut cfg = Config::default();
        cfg.octoprint.base_url = "octopi.local/api".to_string();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_api_key_newline_stripped() {
        let dir = std::env::temp_dir().join(format!("octomon-key-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("apikey");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "ABCDEF0123").unwrap();
        assert_eq!(read_api_key(&path).unwrap(), "ABCDEF0123");
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let mut cli = bare_cli();
        cli.config = Some(PathBuf::from("/nonexistent/octomon.yaml"));
        assert!(matches!(resolve(&cli), Err(ConfigError::Validation(_))));
    }
}
