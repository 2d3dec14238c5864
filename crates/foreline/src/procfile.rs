use std::path::Path;

use crate::codec;
use crate::error::{Error, Result};

/// One line of a Procfile.
///
/// Comment and blank lines carry neither a name nor a command. A line with a
/// name but no `": "` separator has no command and is never started.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Declaration {
	pub name: Option<String>,
	/// Command text after [`codec::encode`].
	pub command: Option<String>,
}

impl Declaration {
	pub fn parse(line: &str) -> Self {
		let trimmed = line.trim_start();
		if trimmed.is_empty() || trimmed.starts_with('#') {
			return Self::default();
		}

		let name = match line.find(':') {
			Some(pos) => &line[..pos],
			None => line,
		};
		let command = line
			.find(": ")
			.map(|pos| codec::encode(&line[pos + 2..]));

		Self {
			name: Some(name.to_string()),
			command,
		}
	}

	/// Decoded argument vector, if this declaration has a command.
	pub fn argv(&self) -> Option<Result<Vec<String>>> {
		let name = self.name.as_deref()?;
		let command = self.command.as_deref()?;
		Some(codec::parse_encoded(name, command))
	}
}

#[derive(Debug, Clone, Default)]
pub struct Procfile {
	pub declarations: Vec<Declaration>,
}

impl Procfile {
	pub fn load(path: &Path) -> Result<Self> {
		if !path.is_file() {
			return Err(Error::ProcfileMissing(path.to_path_buf()));
		}
		let content = std::fs::read_to_string(path)?;
		Ok(Self::parse(&content))
	}

	pub fn parse(content: &str) -> Self {
		let declarations = content
			.lines()
			.map(|line| Declaration::parse(line.strip_suffix('\r').unwrap_or(line)))
			.collect();
		Self { declarations }
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.declarations.iter().filter_map(|d| d.name.as_deref())
	}

	/// Encoded command of the first declaration called `name`.
	pub fn command_for(&self, name: &str) -> Option<&str> {
		self.declarations
			.iter()
			.find(|d| d.name.as_deref() == Some(name))
			.and_then(|d| d.command.as_deref())
	}

	/// Width every name is padded to so tagged lines line up.
	pub fn prefix_pad(&self) -> usize {
		self.names().map(|n| n.chars().count()).max().unwrap_or(0)
	}
}
