//! Command-line configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable consulted for the seed when `--seed` is absent.
pub const SEED_ENV: &str = "STRATA_SEED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: String,
    pub seed: u32,
    pub world_dir: PathBuf,
    /// Horizontal chunk radius generated around the origin before serving.
    pub preload_radius: i32,
    pub autosave: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".into(),
            seed: 1337,
            world_dir: "world".into(),
            preload_radius: 2,
            autosave: Duration::from_secs(300),
        }
    }
}

impl ServerConfig {
    /// Read flags from the process arguments and `STRATA_SEED`.
    pub fn from_env() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let env_seed = std::env::var(SEED_ENV).ok();
        Self::from_args(&args, env_seed.as_deref())
    }

    /// Flags win over `env_seed`; unparsable values fall back to defaults.
    pub fn from_args(args: &[String], env_seed: Option<&str>) -> Self {
        let defaults = Self::default();
        let flag = |name: &str| args.iter().skip_while(|a| *a != name).nth(1).cloned();

        let seed = flag("--seed")
            .or_else(|| env_seed.map(str::to_owned))
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.seed);

        Self {
            bind: flag("--bind").unwrap_or(defaults.bind),
            seed,
            world_dir: flag("--world").map(PathBuf::from).unwrap_or(defaults.world_dir),
            preload_radius: flag("--preload")
                .and_then(|s| s.parse().ok())
                .filter(|r: &i32| *r >= 0)
                .unwrap_or(defaults.preload_radius),
            autosave: flag("--autosave-secs")
                .and_then(|s| s.parse().ok())
                .filter(|s: &u64| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.autosave),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("strata-server")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn no_flags_gives_defaults() {
        assert_eq!(ServerConfig::from_args(&args(&[]), None), ServerConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cfg = ServerConfig::from_args(
            &args(&[
                "--bind", "127.0.0.1:9000", "--seed", "42", "--world", "/tmp/w",
                "--preload", "0", "--autosave-secs", "10",
            ]),
            None,
        );
        assert_eq!(cfg.bind, "127.0.0.1:9000");
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.world_dir, PathBuf::from("/tmp/w"));
        assert_eq!(cfg.preload_radius, 0);
        assert_eq!(cfg.autosave, Duration::from_secs(10));
    }

    #[test]
    fn seed_from_env_unless_flagged() {
        assert_eq!(ServerConfig::from_args(&args(&[]), Some("7")).seed, 7);
        assert_eq!(ServerConfig::from_args(&args(&["--seed", "8"]), Some("7")).seed, 8);
    }

    #[test]
    fn bad_values_fall_back() {
        let cfg = ServerConfig::from_args(
            &args(&["--seed", "banana", "--preload", "-3", "--autosave-secs", "0"]),
            Some("also-bad"),
        );
        assert_eq!(cfg.seed, 1337);
        assert_eq!(cfg.preload_radius, 2);
        assert_eq!(cfg.autosave, Duration::from_secs(300));
    }
}
