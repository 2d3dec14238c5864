use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
	#[error("Procfile does not exist: {}", .0.display())]
	ProcfileMissing(PathBuf),
	#[error("no process named '{0}' in the Procfile")]
	NameNotFound(String),
	#[error("start takes at most one process name")]
	TooManyNames,
	#[error("{name}: cannot parse command: {reason}")]
	BadCommand { name: String, reason: String },
	#[error("{0}: empty command")]
	EmptyCommand(String),
	#[error("{program}: {source}")]
	Spawn {
		program: String,
		#[source]
		source: io::Error,
	},
	#[error("failed to read env file {}: {source}", path.display())]
	EnvFile {
		path: PathBuf,
		#[source]
		source: dotenvy::Error,
	},
	#[error("io error: {0}")]
	Io(#[from] io::Error),
	#[error("system call failed: {0}")]
	Nix(#[from] nix::Error),
}

impl Error {
	/// Process exit code the CLI reports for this error.
	///
	/// Configuration problems exit 2; a command that cannot be started exits
	/// the way a shell would (127 when it does not exist, 126 otherwise).
	pub fn exit_code(&self) -> i32 {
		match self {
			Error::ProcfileMissing(_)
			| Error::NameNotFound(_)
			| Error::TooManyNames
			| Error::BadCommand { .. }
			| Error::EmptyCommand(_)
			| Error::EnvFile { .. } => 2,
			Error::Spawn { source, .. } if source.kind() == io::ErrorKind::NotFound => 127,
			Error::Spawn { .. } => 126,
			Error::Io(_) | Error::Nix(_) => 1,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_configuration_errors_exit_2() {
		assert_eq!(Error::ProcfileMissing("Procfile".into()).exit_code(), 2);
		assert_eq!(Error::NameNotFound("web".into()).exit_code(), 2);
		assert_eq!(Error::TooManyNames.exit_code(), 2);
	}

	#[test]
	fn test_spawn_errors_follow_shell_codes() {
		let missing = Error::Spawn {
			program: "nope".into(),
			source: io::Error::from(io::ErrorKind::NotFound),
		};
		assert_eq!(missing.exit_code(), 127);

		let denied = Error::Spawn {
			program: "./script".into(),
			source: io::Error::from(io::ErrorKind::PermissionDenied),
		};
		assert_eq!(denied.exit_code(), 126);
	}

	#[test]
	fn test_messages() {
		let err = Error::NameNotFound("db".into());
		assert_eq!(err.to_string(), "no process named 'db' in the Procfile");
		let err = Error::ProcfileMissing("/tmp/x/Procfile".into());
		assert_eq!(err.to_string(), "Procfile does not exist: /tmp/x/Procfile");
	}
}
