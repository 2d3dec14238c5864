use std::io::IsTerminal;
use std::str::FromStr;

use owo_colors::{AnsiColors, Style};
use serde::Deserialize;

const PALETTE: [AnsiColors; 6] = [
	AnsiColors::Red,
	AnsiColors::Green,
	AnsiColors::Yellow,
	AnsiColors::Blue,
	AnsiColors::Magenta,
	AnsiColors::Cyan,
];

pub const PALETTE_SIZE: usize = PALETTE.len();

/// Style for the `index`-th launched process. Wraps around the palette.
pub fn pick(index: usize) -> Style {
	Style::new().color(PALETTE[index % PALETTE_SIZE])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
	#[default]
	Auto,
	Always,
	Never,
}

impl ColorMode {
	/// Whether tagged output should carry color escapes.
	pub fn enabled(self) -> bool {
		match self {
			ColorMode::Always => true,
			ColorMode::Never => false,
			ColorMode::Auto => std::io::stdout().is_terminal(),
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			ColorMode::Auto => "auto",
			ColorMode::Always => "always",
			ColorMode::Never => "never",
		}
	}
}

impl FromStr for ColorMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"auto" => Ok(ColorMode::Auto),
			"always" | "1" | "true" => Ok(ColorMode::Always),
			"never" | "0" | "false" => Ok(ColorMode::Never),
			other => Err(format!("unknown color mode '{}'", other)),
		}
	}
}
