use std::path::Path;

use crate::error::{Error, Result};

/// Reads `KEY=VALUE` pairs from an env file.
///
/// A missing file is not an error and yields no pairs. The pairs are meant
/// for [`tokio::process::Command::envs`]; the current process environment is
/// left untouched.
pub fn load(path: &Path) -> Result<Vec<(String, String)>> {
	let iter = match dotenvy::from_path_iter(path) {
		Ok(iter) => iter,
		Err(e) if e.not_found() => return Ok(Vec::new()),
		Err(source) => {
			return Err(Error::EnvFile {
				path: path.to_path_buf(),
				source,
			})
		}
	};

	let pairs = iter
		.collect::<std::result::Result<Vec<_>, _>>()
		.map_err(|source| Error::EnvFile {
			path: path.to_path_buf(),
			source,
		})?;
	tracing::debug!(path = %path.display(), count = pairs.len(), "loaded env file");
	Ok(pairs)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicU32, Ordering};

	static COUNTER: AtomicU32 = AtomicU32::new(0);

	fn write_env(content: &str) -> std::path::PathBuf {
		let n = COUNTER.fetch_add(1, Ordering::SeqCst);
		let dir = std::env::temp_dir().join(format!("foreline-env-{}-{}", std::process::id(), n));
		let _ = std::fs::create_dir_all(&dir);
		let path = dir.join(".env");
		std::fs::write(&path, content).unwrap();
		path
	}

	#[test]
	fn test_missing_file_is_empty() {
		let pairs = load(Path::new("/nonexistent/foreline/.env")).unwrap();
		assert!(pairs.is_empty());
	}

	#[test]
	fn test_pairs_and_comments() {
		let path = write_env("# leading comment\nPORT=5000\nGREETING=hi # trailing\n\nQUOTED=\"a b\"\n");
		let pairs = load(&path).unwrap();
		assert_eq!(
			pairs,
			vec![
				("PORT".to_string(), "5000".to_string()),
				("GREETING".to_string(), "hi".to_string()),
				("QUOTED".to_string(), "a b".to_string()),
			]
		);
		let _ = std::fs::remove_dir_all(path.parent().unwrap());
	}

	#[test]
	fn test_malformed_line_is_an_error() {
		let path = write_env("NOT A PAIR\n");
		assert!(matches!(load(&path), Err(Error::EnvFile { .. })));
		let _ = std::fs::remove_dir_all(path.parent().unwrap());
	}
}
