use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::color::ColorMode;
use crate::policy::TerminationPolicy;

pub const CONFIG_FILE: &str = "foreline.toml";

pub const ENV_PROCFILE: &str = "FORELINE_PROCFILE";
pub const ENV_ENV_FILE: &str = "FORELINE_ENV_FILE";
pub const ENV_KILL_MODE: &str = "FORELINE_KILL_MODE";
pub const ENV_COLORS: &str = "FORELINE_COLORS";

// ── Settings (foreline.toml, then FORELINE_* overrides) ─────────────────────

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Settings {
	#[serde(default = "default_procfile")]
	pub procfile: PathBuf,
	#[serde(default = "default_env_file")]
	pub env_file: PathBuf,
	#[serde(default)]
	pub kill_mode: TerminationPolicy,
	#[serde(default)]
	pub colors: ColorMode,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			procfile: default_procfile(),
			env_file: default_env_file(),
			kill_mode: TerminationPolicy::default(),
			colors: ColorMode::default(),
		}
	}
}

fn default_procfile() -> PathBuf { PathBuf::from("Procfile") }
fn default_env_file() -> PathBuf { PathBuf::from(".env") }

impl Settings {
	/// Defaults, then `foreline.toml` in `dir`, then the process environment.
	pub fn load(dir: &Path) -> Self {
		let mut settings = load_file(&dir.join(CONFIG_FILE));
		settings.apply_env(|key| std::env::var(key).ok());
		settings
	}

	pub fn apply_env<F>(&mut self, lookup: F)
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(path) = lookup(ENV_PROCFILE).filter(|v| !v.is_empty()) {
			self.procfile = PathBuf::from(path);
		}
		if let Some(path) = lookup(ENV_ENV_FILE).filter(|v| !v.is_empty()) {
			self.env_file = PathBuf::from(path);
		}
		if let Some(mode) = lookup(ENV_KILL_MODE) {
			match mode.parse() {
				Ok(policy) => self.kill_mode = policy,
				Err(e) => eprintln!("warning: ignoring {}: {}", ENV_KILL_MODE, e),
			}
		}
		if let Some(mode) = lookup(ENV_COLORS) {
			match mode.parse() {
				Ok(colors) => self.colors = colors,
				Err(e) => eprintln!("warning: ignoring {}: {}", ENV_COLORS, e),
			}
		}
	}
}

fn load_file(path: &Path) -> Settings {
	if path.exists() {
		match std::fs::read_to_string(path) {
			Ok(content) => match toml::from_str(&content) {
				Ok(settings) => return settings,
				Err(e) => eprintln!("warning: failed to parse {}: {}", path.display(), e),
			},
			Err(e) => eprintln!("warning: failed to read {}: {}", path.display(), e),
		}
	}
	Settings::default()
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		move |key| map.get(key).cloned()
	}

	#[test]
	fn test_defaults() {
		let settings = Settings::default();
		assert_eq!(settings.procfile, PathBuf::from("Procfile"));
		assert_eq!(settings.env_file, PathBuf::from(".env"));
		assert_eq!(settings.kill_mode, TerminationPolicy::GroupWide);
		assert_eq!(settings.colors, ColorMode::Auto);
	}

	#[test]
	fn test_toml_partial() {
		let settings: Settings = toml::from_str("kill_mode = \"selective\"\n").unwrap();
		assert_eq!(settings.kill_mode, TerminationPolicy::Selective);
		assert_eq!(settings.procfile, PathBuf::from("Procfile"));
	}

	#[test]
	fn test_toml_full() {
		let settings: Settings = toml::from_str(
			"procfile = \"Procfile.dev\"\nenv_file = \"dev.env\"\nkill_mode = \"group\"\ncolors = \"never\"\n",
		)
		.unwrap();
		assert_eq!(settings.procfile, PathBuf::from("Procfile.dev"));
		assert_eq!(settings.env_file, PathBuf::from("dev.env"));
		assert_eq!(settings.colors, ColorMode::Never);
	}

	#[test]
	fn test_env_overrides() {
		let mut settings = Settings::default();
		settings.apply_env(lookup(&[
			(ENV_PROCFILE, "Procfile.test"),
			(ENV_KILL_MODE, "selective"),
			(ENV_COLORS, "always"),
		]));
		assert_eq!(settings.procfile, PathBuf::from("Procfile.test"));
		assert_eq!(settings.env_file, PathBuf::from(".env"));
		assert_eq!(settings.kill_mode, TerminationPolicy::Selective);
		assert_eq!(settings.colors, ColorMode::Always);
	}

	#[test]
	fn test_invalid_env_is_ignored() {
		let mut settings = Settings::default();
		settings.apply_env(lookup(&[(ENV_KILL_MODE, "bogus"), (ENV_PROCFILE, "")]));
		assert_eq!(settings, Settings::default());
	}

	#[test]
	fn test_missing_file_gives_defaults() {
		let settings = load_file(Path::new("/nonexistent/foreline.toml"));
		assert_eq!(settings, Settings::default());
	}
}
