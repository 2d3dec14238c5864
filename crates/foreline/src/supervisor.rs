use std::convert::Infallible;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;

use nix::sys::signal::Signal;
use nix::unistd::{getpgrp, Pid};
use tokio::process::Command;
use tokio::task::JoinSet;

use crate::codec;
use crate::error::{Error, Result};
use crate::policy::TerminationPolicy;
use crate::procfile::Procfile;
use crate::runner::{self, RunnerConfig};
use crate::signals::{self, ShutdownSignals};

pub struct SupervisorConfig {
	pub procfile: PathBuf,
	/// Executable started as `<runner_exe> exec -- ARGV...` for each process.
	pub runner_exe: PathBuf,
	pub policy: TerminationPolicy,
	pub colors: bool,
	/// Extra environment for every process, usually from the env file.
	pub env: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
	#[default]
	Idle,
	Loaded,
	PadComputed,
	Spawning,
	Supervising,
	Draining,
	Done,
}

/// A declaration ready to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
	pub name: String,
	pub argv: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RunningChild {
	pub index: usize,
	pub name: String,
	pub argv: Vec<String>,
	pub pid: Pid,
	pub color: usize,
}

#[derive(Debug, Default)]
pub struct RunState {
	/// Runners not yet reaped, in spawn order.
	pub children: Vec<RunningChild>,
	next_color: usize,
	phase: Phase,
}

impl RunState {
	pub fn allocate_color(&mut self) -> usize {
		let color = self.next_color;
		self.next_color += 1;
		color
	}

	pub fn tracked_pids(&self) -> Vec<Pid> {
		self.children.iter().map(|c| c.pid).collect()
	}

	pub fn forget(&mut self, index: usize) -> Option<RunningChild> {
		let pos = self.children.iter().position(|c| c.index == index)?;
		Some(self.children.remove(pos))
	}
}

pub struct Supervisor {
	config: SupervisorConfig,
	procfile: Procfile,
	state: RunState,
}

impl Supervisor {
	pub fn load(config: SupervisorConfig) -> Result<Self> {
		let procfile = Procfile::load(&config.procfile)?;
		let mut sup = Self {
			config,
			procfile,
			state: RunState::default(),
		};
		sup.advance(Phase::Loaded);
		Ok(sup)
	}

	pub fn procfile(&self) -> &Procfile {
		&self.procfile
	}

	/// Every runnable declaration, decoded. Fails on the first bad command so
	/// nothing is started from a half-valid Procfile.
	pub fn units(&self) -> Result<Vec<Unit>> {
		let mut units = Vec::new();
		for decl in &self.procfile.declarations {
			let Some(name) = decl.name.as_deref() else {
				continue;
			};
			match decl.argv() {
				Some(argv) => units.push(Unit {
					name: name.to_string(),
					argv: argv?,
				}),
				None => tracing::warn!(name, "no command (expected `name: command`), skipping"),
			}
		}
		Ok(units)
	}

	/// Starts every process and blocks until all of them have exited, or
	/// until a shutdown signal has been passed on and they have drained.
	/// Returns the exit code for the whole run.
	pub async fn run(mut self) -> Result<i32> {
		let pad = self.procfile.prefix_pad();
		let units = self.units()?;
		self.advance(Phase::PadComputed);

		// registered before the first spawn so nothing is lost, acted on
		// only after every pid is recorded
		let mut signals = ShutdownSignals::install()?;

		self.advance(Phase::Spawning);
		let mut codes: Vec<Option<i32>> = vec![None; units.len()];
		let mut waits = JoinSet::new();

		for (index, unit) in units.into_iter().enumerate() {
			let color = self.state.allocate_color();
			let runner = RunnerConfig {
				name: unit.name.clone(),
				pad,
				color,
				policy: self.config.policy,
				colors: self.config.colors,
			};

			let mut cmd = Command::new(&self.config.runner_exe);
			cmd.arg("exec").arg("--").args(&unit.argv);
			cmd.envs(self.config.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
			runner.apply_to(&mut cmd);

			let mut child = match cmd.spawn() {
				Ok(child) => child,
				Err(e) => {
					tracing::error!(name = %unit.name, error = %e, "failed to start runner");
					codes[index] = Some(127);
					continue;
				}
			};
			let Some(pid) = child.id().map(|id| Pid::from_raw(id as i32)) else {
				continue;
			};

			tracing::info!(
				name = %unit.name,
				pid = pid.as_raw(),
				color,
				command = %codec::join(&unit.argv),
				"spawned"
			);
			self.state.children.push(RunningChild {
				index,
				name: unit.name,
				argv: unit.argv,
				pid,
				color,
			});
			waits.spawn(async move { (index, child.wait().await) });
		}

		self.advance(Phase::Supervising);
		let mut shutdown: Option<Signal> = None;

		loop {
			tokio::select! {
				joined = waits.join_next() => {
					let Some(joined) = joined else { break };
					match joined {
						Ok((index, status)) => {
							let code = match status {
								Ok(status) => runner::exit_code(status),
								Err(e) => {
									tracing::warn!(index, error = %e, "wait failed");
									1
								}
							};
							codes[index] = Some(code);
							if let Some(child) = self.state.forget(index) {
								tracing::info!(name = %child.name, pid = child.pid.as_raw(), code, "exited");
							}
						}
						Err(e) => tracing::warn!(error = %e, "wait task failed"),
					}
				}
				signal = signals.recv(), if shutdown.is_none() => {
					shutdown = Some(signal);
					self.advance(Phase::Draining);
					self.terminate(signal);
				}
			}
		}

		if shutdown.is_none() {
			self.advance(Phase::Draining);
			// catches anything the runners left behind in our group
			self.terminate_remaining();
		}
		self.advance(Phase::Done);

		Ok(match shutdown {
			Some(signal) => signals::exit_code_for(signal),
			None => overall_exit_code(&codes),
		})
	}

	fn terminate(&self, signal: Signal) {
		let target = self
			.config
			.policy
			.targets(getpgrp(), &self.state.tracked_pids());
		tracing::info!(?signal, ?target, "shutting down");
		target.deliver(Signal::SIGTERM);
	}

	fn terminate_remaining(&self) {
		let target = self
			.config
			.policy
			.targets(getpgrp(), &self.state.tracked_pids());
		tracing::debug!(?target, "final sweep");
		target.deliver(Signal::SIGTERM);
	}

	/// Replaces the current process with the command declared as `name`.
	/// Only returns on failure.
	pub fn exec_one(&self, name: &str) -> Result<Infallible> {
		let encoded = self
			.procfile
			.command_for(name)
			.ok_or_else(|| Error::NameNotFound(name.to_string()))?;
		let argv = codec::parse_encoded(name, encoded)?;
		exec(&argv, &self.config.env)
	}

	fn advance(&mut self, phase: Phase) {
		tracing::debug!(from = ?self.state.phase, to = ?phase, "phase");
		self.state.phase = phase;
	}
}

/// Replaces the current process with `argv`, adding `env` to its
/// environment. Only returns on failure.
pub fn exec(argv: &[String], env: &[(String, String)]) -> Result<Infallible> {
	let (program, args) = argv
		.split_first()
		.ok_or_else(|| Error::EmptyCommand("exec".to_string()))?;
	let source = std::process::Command::new(program)
		.args(args)
		.envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
		.exec();
	Err(Error::Spawn {
		program: program.clone(),
		source,
	})
}

/// 0 when every process succeeded, otherwise the code of the first one (in
/// Procfile order) that failed.
pub fn overall_exit_code(codes: &[Option<i32>]) -> i32 {
	codes
		.iter()
		.flatten()
		.copied()
		.find(|code| *code != 0)
		.unwrap_or(0)
}
