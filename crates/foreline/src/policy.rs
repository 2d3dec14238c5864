//! How a shutdown reaches the processes we started.

use std::fmt;
use std::str::FromStr;

use nix::errno::Errno;
use nix::sys::signal::{kill, killpg, Signal};
use nix::unistd::Pid;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum TerminationPolicy {
	/// Signal the whole process group we share with every descendant. Also
	/// reaches processes we never tracked, and our caller if it shares the
	/// group.
	#[default]
	#[serde(rename = "group", alias = "group-wide")]
	GroupWide,
	/// Signal only the pids we recorded. Grandchildren orphaned by a crashed
	/// command are not tracked and can be left behind.
	#[serde(rename = "selective")]
	Selective,
}

impl TerminationPolicy {
	pub fn targets(self, group: Pid, tracked: &[Pid]) -> KillTarget {
		match self {
			TerminationPolicy::GroupWide => KillTarget::Group(group),
			TerminationPolicy::Selective => KillTarget::Pids(tracked.to_vec()),
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			TerminationPolicy::GroupWide => "group",
			TerminationPolicy::Selective => "selective",
		}
	}
}

impl fmt::Display for TerminationPolicy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for TerminationPolicy {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"group" | "group-wide" | "groupwide" => Ok(TerminationPolicy::GroupWide),
			"selective" => Ok(TerminationPolicy::Selective),
			other => Err(format!("unknown kill mode '{}'", other)),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KillTarget {
	Group(Pid),
	Pids(Vec<Pid>),
}

impl KillTarget {
	/// Sends `signal`, ignoring processes that are already gone. Returns how
	/// many deliveries succeeded.
	pub fn deliver(&self, signal: Signal) -> usize {
		match self {
			KillTarget::Group(pgid) => match killpg(*pgid, signal) {
				Ok(()) => {
					tracing::debug!(pgid = pgid.as_raw(), ?signal, "signalled process group");
					1
				}
				Err(Errno::ESRCH) => 0,
				Err(e) => {
					tracing::warn!(pgid = pgid.as_raw(), error = %e, "killpg failed");
					0
				}
			},
			KillTarget::Pids(pids) => pids
				.iter()
				.filter(|pid| match kill(**pid, signal) {
					Ok(()) => {
						tracing::debug!(pid = pid.as_raw(), ?signal, "signalled process");
						true
					}
					Err(Errno::ESRCH) => false,
					Err(e) => {
						tracing::warn!(pid = pid.as_raw(), error = %e, "kill failed");
						false
					}
				})
				.count(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn pids(raw: &[i32]) -> Vec<Pid> {
		raw.iter().copied().map(Pid::from_raw).collect()
	}

	#[test]
	fn test_group_wide_targets_group() {
		let target = TerminationPolicy::GroupWide.targets(Pid::from_raw(40), &pids(&[41, 42]));
		assert_eq!(target, KillTarget::Group(Pid::from_raw(40)));
	}

	#[test]
	fn test_selective_stays_inside_tracked_set() {
		let tracked = pids(&[41, 42]);
		let target = TerminationPolicy::Selective.targets(Pid::from_raw(40), &tracked);
		assert_eq!(target, KillTarget::Pids(pids(&[41, 42])));
		assert_ne!(target, KillTarget::Group(Pid::from_raw(40)));
	}

	#[test]
	fn test_selective_with_nothing_tracked_sends_nothing() {
		let target = TerminationPolicy::Selective.targets(Pid::from_raw(40), &[]);
		assert_eq!(target.deliver(Signal::SIGTERM), 0);
	}

	#[test]
	fn test_default_is_group_wide() {
		assert_eq!(TerminationPolicy::default(), TerminationPolicy::GroupWide);
	}

	#[test]
	fn test_parse_round_trip() {
		for policy in [TerminationPolicy::GroupWide, TerminationPolicy::Selective] {
			assert_eq!(policy.to_string().parse::<TerminationPolicy>(), Ok(policy));
		}
		assert_eq!("group-wide".parse::<TerminationPolicy>(), Ok(TerminationPolicy::GroupWide));
		assert!("everyone".parse::<TerminationPolicy>().is_err());
	}
}
