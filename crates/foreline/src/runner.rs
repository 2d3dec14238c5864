//! The child runner: one process per Procfile entry.
//!
//! The supervisor starts `foreline exec -- ARGV...` for every declaration and
//! hands over the display settings through `FORELINE_*` variables. The runner
//! starts the real command with stdout and stderr sharing one pipe, tags what
//! comes out of it, and applies the termination policy if it is signalled.

use std::os::unix::process::ExitStatusExt;
use std::process::ExitStatus;

use nix::sys::signal::Signal;
use nix::fcntl::OFlag;
use nix::unistd::{getpgrp, pipe2, Pid};
use owo_colors::Style;
use tokio::io::AsyncWrite;
use tokio::net::unix::pipe as async_pipe;
use tokio::process::{Child, Command};

use crate::color::{self, ColorMode};
use crate::error::{Error, Result};
use crate::output::{self, Tagger};
use crate::policy::TerminationPolicy;
use crate::signals::{self, ShutdownSignals};

pub const ENV_NAME: &str = "FORELINE_NAME";
pub const ENV_PAD: &str = "FORELINE_PAD";
pub const ENV_COLOR: &str = "FORELINE_COLOR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
	pub name: String,
	pub pad: usize,
	pub color: usize,
	pub policy: TerminationPolicy,
	pub colors: bool,
}

impl RunnerConfig {
	/// Reads the settings the supervisor passed down. A runner started by
	/// hand falls back to the program name and default settings.
	pub fn from_env(argv: &[String]) -> Self {
		Self::from_lookup(argv, |key| std::env::var(key).ok())
	}

	pub fn from_lookup<F>(argv: &[String], lookup: F) -> Self
	where
		F: Fn(&str) -> Option<String>,
	{
		// an empty name is a real declaration name, only absence falls back
		let name = lookup(ENV_NAME)
			.or_else(|| argv.first().map(|p| program_name(p)))
			.unwrap_or_else(|| "exec".to_string());
		let pad = lookup(ENV_PAD)
			.and_then(|p| p.parse().ok())
			.unwrap_or_else(|| name.chars().count());
		let color = lookup(ENV_COLOR).and_then(|c| c.parse().ok()).unwrap_or(0);
		let policy = lookup(crate::config::ENV_KILL_MODE)
			.and_then(|m| m.parse().ok())
			.unwrap_or_default();
		let colors = lookup(crate::config::ENV_COLORS)
			.and_then(|m| m.parse::<ColorMode>().ok())
			.unwrap_or_default()
			.enabled();

		Self { name, pad, color, policy, colors }
	}

	/// Exports these settings to a runner about to be spawned.
	pub fn apply_to(&self, cmd: &mut Command) {
		let colors = if self.colors { ColorMode::Always } else { ColorMode::Never };
		cmd.env(ENV_NAME, &self.name)
			.env(ENV_PAD, self.pad.to_string())
			.env(ENV_COLOR, self.color.to_string())
			.env(crate::config::ENV_KILL_MODE, self.policy.as_str())
			.env(crate::config::ENV_COLORS, colors.as_str());
	}

	pub fn style(&self) -> Option<Style> {
		self.colors.then(|| color::pick(self.color))
	}
}

fn program_name(program: &str) -> String {
	std::path::Path::new(program)
		.file_name()
		.map(|n| n.to_string_lossy().into_owned())
		.unwrap_or_else(|| program.to_string())
}

pub struct Runner {
	config: RunnerConfig,
	tagger: Tagger,
}

impl Runner {
	pub fn new(config: RunnerConfig) -> Self {
		let tagger = Tagger::new(&config.name, config.pad, config.style());
		Self { config, tagger }
	}

	/// Runs `argv` to completion, writing its tagged output to `out`, and
	/// returns the exit code to report for it.
	pub async fn run<W>(&self, argv: &[String], out: &mut W) -> Result<i32>
	where
		W: AsyncWrite + Unpin,
	{
		let (program, args) = argv
			.split_first()
			.ok_or_else(|| Error::EmptyCommand(self.config.name.clone()))?;

		let mut signals = ShutdownSignals::install()?;
		let (read_end, write_end) = pipe2(OFlag::O_CLOEXEC)?;

		let mut child = {
			let mut cmd = Command::new(program);
			cmd.args(args)
				.stdout(write_end.try_clone()?)
				.stderr(write_end);
			let child = cmd.spawn().map_err(|source| Error::Spawn {
				program: program.clone(),
				source,
			})?;
			// dropping cmd closes our copies of the write end
			child
		};
		let pid = child.id().map(|id| Pid::from_raw(id as i32));
		tracing::debug!(name = %self.config.name, pid = ?pid, program = %program, "started command");

		let reader = async_pipe::Receiver::from_owned_fd(read_end)?;
		let pump = output::pump_lines(reader, &self.tagger, out);
		let wait = self.wait(&mut child, pid, &mut signals);
		let (pumped, status) = tokio::join!(pump, wait);

		if let Err(e) = pumped {
			tracing::warn!(name = %self.config.name, error = %e, "output stream failed");
		}
		let status = status?;
		tracing::debug!(name = %self.config.name, ?status, "command exited");
		Ok(exit_code(status))
	}

	async fn wait(
		&self,
		child: &mut Child,
		pid: Option<Pid>,
		signals: &mut ShutdownSignals,
	) -> std::io::Result<ExitStatus> {
		tokio::select! {
			status = child.wait() => return status,
			signal = signals.recv() => {
				let tracked: Vec<Pid> = pid.into_iter().collect();
				let target = self.config.policy.targets(getpgrp(), &tracked);
				tracing::info!(name = %self.config.name, ?signal, ?target, "stopping");
				target.deliver(Signal::SIGTERM);
			}
		}
		// later signals stay queued and are never acted on
		child.wait().await
	}
}

/// Exit code to report for a finished process, shell style.
pub fn exit_code(status: ExitStatus) -> i32 {
	match (status.code(), status.signal()) {
		(Some(code), _) => code,
		(None, Some(sig)) => match Signal::try_from(sig) {
			Ok(signal) => signals::exit_code_for(signal),
			Err(_) => 128 + sig,
		},
		(None, None) => 1,
	}
}
