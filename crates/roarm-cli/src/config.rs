//! Settings vault – reads/writes `~/.roarm/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use roarm_runtime::RobotSettings;
use roarm_types::{Gender, Language, Margin, RoarmError, Voice};
use serde::{Deserialize, Serialize};

/// Persisted operator settings stored in `~/.roarm/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Arm address (host or `host:port`).
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,

    /// espeak-compatible synthesizer; empty disables speech.
    #[serde(default = "default_voice_program")]
    pub voice_program: String,

    #[serde(default)]
    pub language: Language,

    #[serde(default)]
    pub gender: Gender,

    #[serde(default = "default_pose_margin_mm")]
    pub pose_margin_mm: i32,

    #[serde(default = "default_angle_margin_deg")]
    pub angle_margin_deg: i32,

    /// Delay between telemetry reads while converging.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Shell command played as the dance soundtrack instead of singing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dance_media: Option<String>,
}

fn default_host() -> String {
    "192.168.4.1".to_string()
}
fn default_http_timeout_ms() -> u64 {
    3000
}
fn default_voice_program() -> String {
    "espeak".to_string()
}
fn default_pose_margin_mm() -> i32 {
    Margin::default().pose_mm
}
fn default_angle_margin_deg() -> i32 {
    Margin::default().angle_deg
}
fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_timeout_ms: default_http_timeout_ms(),
            voice_program: default_voice_program(),
            language: Language::default(),
            gender: Gender::default(),
            pose_margin_mm: default_pose_margin_mm(),
            angle_margin_deg: default_angle_margin_deg(),
            poll_interval_ms: default_poll_interval_ms(),
            dance_media: None,
        }
    }
}

impl Config {
    pub fn voice(&self) -> Voice {
        Voice::new(self.language, self.gender)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Runtime tunables derived from this file.
    pub fn robot_settings(&self) -> RobotSettings {
        RobotSettings {
            margin: Margin {
                pose_mm: self.pose_margin_mm,
                angle_deg: self.angle_margin_deg,
            },
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            dance_media: self
                .dance_media
                .clone()
                .filter(|cmd| !cmd.trim().is_empty()),
            ..RobotSettings::default()
        }
    }
}

/// Return the path to `~/.roarm/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Directory under `$HOME` that holds the config file.
const VAULT_DIR: &str = ".roarm";

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(VAULT_DIR).join("config.toml")
}

/// The directory a config file lives in, or `None` for a bare file name.
fn parent_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|dir| !dir.as_os_str().is_empty())
}

fn is_vault_dir(dir: &Path) -> bool {
    dir.file_name().is_some_and(|name| name == VAULT_DIR)
}

/// Load the config from `path`.  Returns `None` if the file does not exist.
pub fn load_from(path: &Path) -> Result<Option<Config>, RoarmError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| RoarmError::Config(format!("failed to read {}: {e}", path.display())))?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| RoarmError::Config(format!("failed to parse {}: {e}", path.display())))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `ROARM_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `ROARM_HOST` | `host` |
/// | `HTTPIPADDRESS` | `host` (legacy, loses to `ROARM_HOST`) |
/// | `ROARM_VOICE_PROGRAM` | `voice_program` |
/// | `ROARM_POLL_MS` | `poll_interval_ms` |
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |key| std::env::var(key).ok());
}

fn apply_overrides(cfg: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(host) = lookup("ROARM_HOST").or_else(|| lookup("HTTPIPADDRESS"))
        && !host.trim().is_empty()
    {
        cfg.host = host.trim().to_string();
    }
    if let Some(program) = lookup("ROARM_VOICE_PROGRAM") {
        cfg.voice_program = program;
    }
    if let Some(v) = lookup("ROARM_POLL_MS")
        && let Ok(ms) = v.trim().parse::<u64>()
    {
        cfg.poll_interval_ms = ms;
    }
}

/// Save the config to `path`, creating its directory if necessary.
///
/// The directory is restricted to its owner only when this call created it
/// or it is the `.roarm` vault; a directory the operator picked with
/// `--config` keeps its permissions.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), RoarmError> {
    if let Some(parent) = parent_dir(path) {
        let created = !parent.exists();
        if created {
            fs::create_dir_all(parent).map_err(|e| {
                RoarmError::Config(format!("failed to create config directory: {e}"))
            })?;
        }
        #[cfg(unix)]
        if created || is_vault_dir(parent) {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700)).map_err(|e| {
                RoarmError::Config(format!("failed to set config directory permissions: {e}"))
            })?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| RoarmError::Config(format!("failed to serialize config: {e}")))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| RoarmError::Config(format!("failed to write {}: {e}", path.display())))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| RoarmError::Config(format!("failed to write {}: {e}", path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        let mut cfg = Config::default();
        cfg.language = Language::German;
        cfg.dance_media = Some("aplay song.wav".to_string());
        save_to(&cfg, &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded.language, Language::German);
        assert_eq!(loaded.dance_media.as_deref(), Some("aplay song.wav"));
        assert_eq!(loaded.pose_margin_mm, 10);
        assert_eq!(loaded.angle_margin_deg, 1);
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        save_to(&Config::default(), &path).expect("save");

        let file_mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600);
        let dir_mode = std::fs::metadata(path.parent().unwrap())
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[cfg(unix)]
    fn mode_of(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[cfg(unix)]
    #[test]
    fn saving_beside_other_files_keeps_directory_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o755)).unwrap();

        let path = dir.path().join("roarm.toml");
        save_to(&Config::default(), &path).expect("save");

        assert_eq!(mode_of(dir.path()), 0o755);
        assert_eq!(mode_of(&path), 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn existing_vault_directory_is_tightened() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        let vault = path.parent().unwrap();
        std::fs::create_dir(vault).unwrap();
        std::fs::set_permissions(vault, std::fs::Permissions::from_mode(0o755)).unwrap();

        save_to(&Config::default(), &path).expect("save");
        assert_eq!(mode_of(vault), 0o700);
    }

    #[cfg(unix)]
    #[test]
    fn directory_created_for_a_custom_path_is_private() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("robots").join("lab.toml");
        save_to(&Config::default(), &path).expect("save");
        assert_eq!(mode_of(path.parent().unwrap()), 0o700);
    }

    #[test]
    fn bare_file_name_has_no_directory_to_prepare() {
        assert_eq!(parent_dir(Path::new("roarm.toml")), None);
        assert_eq!(
            parent_dir(Path::new("conf/roarm.toml")),
            Some(Path::new("conf"))
        );
    }

    #[test]
    fn bare_file_name_saves_into_the_working_directory() {
        let name = format!("roarm-save-test-{}.toml", std::process::id());
        let path = Path::new(&name);
        let saved = save_to(&Config::default(), path);
        let loaded = load_from(path);
        let _ = std::fs::remove_file(path);

        saved.expect("save");
        assert_eq!(loaded.expect("load").expect("some").pose_margin_mm, 10);
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "voice_program = \"\"\nlanguage = \"polish\"\n").unwrap();

        let cfg = load_from(&path).unwrap().unwrap();
        assert_eq!(cfg.language, Language::Polish);
        assert_eq!(cfg.gender, Gender::Female);
        assert_eq!(cfg.http_timeout_ms, 3000);
    }

    #[test]
    fn garbage_file_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "host = [").unwrap();
        assert!(matches!(load_from(&path), Err(RoarmError::Config(_))));
    }

    #[test]
    fn config_path_points_to_roarm_dir() {
        let p = config_path_for_home("/home/operator");
        assert!(p.to_string_lossy().contains(".roarm"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn roarm_host_wins_over_legacy_variable() {
        let mut cfg = Config::default();
        apply_overrides(
            &mut cfg,
            env(&[("ROARM_HOST", "10.0.0.7"), ("HTTPIPADDRESS", "10.0.0.8")]),
        );
        assert_eq!(cfg.host, "10.0.0.7");

        let mut cfg = Config::default();
        apply_overrides(&mut cfg, env(&[("HTTPIPADDRESS", " 10.0.0.8 ")]));
        assert_eq!(cfg.host, "10.0.0.8");
    }

    #[test]
    fn invalid_poll_override_is_ignored() {
        let mut cfg = Config::default();
        apply_overrides(&mut cfg, env(&[("ROARM_POLL_MS", "soon")]));
        assert_eq!(cfg.poll_interval_ms, 100);

        apply_overrides(&mut cfg, env(&[("ROARM_POLL_MS", "40")]));
        assert_eq!(cfg.poll_interval_ms, 40);
    }

    #[test]
    fn empty_voice_program_override_disables_speech() {
        let mut cfg = Config::default();
        apply_overrides(&mut cfg, env(&[("ROARM_VOICE_PROGRAM", "")]));
        assert!(cfg.voice_program.is_empty());
    }

    #[test]
    fn robot_settings_carry_margins_and_media() {
        let mut cfg = Config::default();
        cfg.pose_margin_mm = 15;
        cfg.poll_interval_ms = 50;
        cfg.dance_media = Some("  ".to_string());
        let settings = cfg.robot_settings();
        assert_eq!(settings.margin.pose_mm, 15);
        assert_eq!(settings.poll_interval, Duration::from_millis(50));
        assert!(settings.dance_media.is_none());
    }
}
