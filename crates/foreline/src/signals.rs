use nix::sys::signal::Signal;
use tokio::signal::unix::{signal, Signal as SignalStream, SignalKind};

/// SIGINT and SIGTERM, registered once.
///
/// Once registered, neither signal terminates the process by default any
/// more, so a group-wide kill we send ourselves is only seen here.
pub struct ShutdownSignals {
	interrupt: SignalStream,
	terminate: SignalStream,
}

impl ShutdownSignals {
	pub fn install() -> std::io::Result<Self> {
		Ok(Self {
			interrupt: signal(SignalKind::interrupt())?,
			terminate: signal(SignalKind::terminate())?,
		})
	}

	/// Waits for the next shutdown signal.
	pub async fn recv(&mut self) -> Signal {
		tokio::select! {
			Some(()) = self.interrupt.recv() => Signal::SIGINT,
			Some(()) = self.terminate.recv() => Signal::SIGTERM,
			else => std::future::pending().await,
		}
	}
}

/// Conventional exit status of a process ended by `signal`.
pub fn exit_code_for(signal: Signal) -> i32 {
	128 + signal as i32
}
