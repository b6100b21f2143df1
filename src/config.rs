/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// The per-game tables expose the empirically tuned pacing constants;
/// everything else about the games is fixed behavior.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct CabinetConfig {
    pub scores_dir: Option<PathBuf>,
    pub gamepad: GamepadConfig,
    pub serpent: SerpentTuning,
    pub swarm: SwarmTuning,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub fire: Vec<String>,
    pub pause: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct SerpentTuning {
    pub base_tps: f32,
    pub max_tps: f32,
    pub tps_ramp: f32,
    pub jitter: f32,
    pub rage_chance: f64,
    pub slowmo_chance: f64,
}

#[derive(Clone, Debug)]
pub struct SwarmTuning {
    pub shoot_base: f32,
    pub shoot_per_wave: f32,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    serpent: TomlSerpent,
    #[serde(default)]
    swarm: TomlSwarm,
}

#[derive(Deserialize, Debug, Default)]
struct TomlGeneral {
    #[serde(default)]
    scores_dir: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_fire")]
    fire: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlSerpent {
    #[serde(default = "default_base_tps")]
    base_tps: f32,
    #[serde(default = "default_max_tps")]
    max_tps: f32,
    #[serde(default = "default_tps_ramp")]
    tps_ramp: f32,
    #[serde(default = "default_jitter")]
    jitter: f32,
    #[serde(default = "default_rage_chance")]
    rage_chance: f64,
    #[serde(default = "default_slowmo_chance")]
    slowmo_chance: f64,
}

#[derive(Deserialize, Debug)]
struct TomlSwarm {
    #[serde(default = "default_shoot_base")]
    shoot_base: f32,
    #[serde(default = "default_shoot_per_wave")]
    shoot_per_wave: f32,
}

// ── Defaults ──

fn default_confirm() -> Vec<String> { vec!["Start".into(), "A".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into(), "B".into()] }
fn default_fire() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_pause() -> Vec<String> { vec!["Start".into()] }

fn default_base_tps() -> f32 { 10.0 }
fn default_max_tps() -> f32 { 28.0 }
fn default_tps_ramp() -> f32 { 0.20 }
fn default_jitter() -> f32 { 0.12 }
fn default_rage_chance() -> f64 { 0.10 }
fn default_slowmo_chance() -> f64 { 0.20 }

fn default_shoot_base() -> f32 { 0.55 }
fn default_shoot_per_wave() -> f32 { 0.05 }

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            fire: default_fire(),
            pause: default_pause(),
        }
    }
}

impl Default for TomlSerpent {
    fn default() -> Self {
        TomlSerpent {
            base_tps: default_base_tps(),
            max_tps: default_max_tps(),
            tps_ramp: default_tps_ramp(),
            jitter: default_jitter(),
            rage_chance: default_rage_chance(),
            slowmo_chance: default_slowmo_chance(),
        }
    }
}

impl Default for TomlSwarm {
    fn default() -> Self {
        TomlSwarm {
            shoot_base: default_shoot_base(),
            shoot_per_wave: default_shoot_per_wave(),
        }
    }
}

// ── Loading ──

impl CabinetConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg, &search_dirs)
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let scores_dir = toml_cfg.general.scores_dir.as_ref().map(|s| {
            let p = PathBuf::from(s);
            if p.is_absolute() {
                p
            } else {
                search_dirs
                    .iter()
                    .map(|d| d.join(s))
                    .find(|c| c.is_dir())
                    .unwrap_or(p)
            }
        });

        CabinetConfig {
            scores_dir,
            gamepad: GamepadConfig {
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
                fire: toml_cfg.gamepad.fire,
                pause: toml_cfg.gamepad.pause,
            },
            serpent: SerpentTuning {
                base_tps: toml_cfg.serpent.base_tps,
                max_tps: toml_cfg.serpent.max_tps,
                tps_ramp: toml_cfg.serpent.tps_ramp,
                jitter: toml_cfg.serpent.jitter,
                // Probabilities must land in [0, 1]; random_bool panics
                // outside that range.
                rage_chance: toml_cfg.serpent.rage_chance.clamp(0.0, 1.0),
                slowmo_chance: toml_cfg.serpent.slowmo_chance.clamp(0.0, 1.0),
            },
            swarm: SwarmTuning {
                shoot_base: toml_cfg.swarm.shoot_base,
                shoot_per_wave: toml_cfg.swarm.shoot_per_wave,
            },
        }
    }

    #[cfg(test)]
    pub fn defaults() -> Self {
        Self::from_toml(TomlConfig::default(), &[])
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
pub fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Resolve symlinks so data lands next to the real binary.
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: TomlConfig = toml::from_str(
            r#"
            [serpent]
            base_tps = 12.0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.serpent.base_tps, 12.0);
        assert_eq!(cfg.serpent.max_tps, default_max_tps());
        assert_eq!(cfg.swarm.shoot_base, default_shoot_base());
        assert_eq!(cfg.gamepad.confirm, default_confirm());
    }

    #[test]
    fn powerup_chances_are_clamped_to_probabilities() {
        // Out-of-range chances would panic in the serpent session's
        // powerup roll; the loader pins them to [0, 1].
        let cfg: TomlConfig = toml::from_str(
            r#"
            [serpent]
            rage_chance = 1.5
            slowmo_chance = -0.3
            "#,
        )
        .unwrap();
        let config = CabinetConfig::from_toml(cfg, &[]);
        assert_eq!(config.serpent.rage_chance, 1.0);
        assert_eq!(config.serpent.slowmo_chance, 0.0);
    }

    #[test]
    fn empty_toml_is_all_defaults() {
        let cfg: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.serpent.jitter, default_jitter());
        assert!(cfg.general.scores_dir.is_none());
    }
}
