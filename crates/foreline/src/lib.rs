//! # foreline
//!
//! Procfile runner for development machines.
//!
//! Starts every process declared in a Procfile, tags each line of their
//! output with a timestamp and a coloured, aligned name, and makes sure
//! stopping the supervisor stops everything it started.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use foreline::{Supervisor, SupervisorConfig, TerminationPolicy};
//!
//! # #[tokio::main]
//! # async fn main() -> foreline::Result<()> {
//! let sup = Supervisor::load(SupervisorConfig {
//!     procfile: "Procfile".into(),
//!     runner_exe: std::env::current_exe()?,
//!     policy: TerminationPolicy::GroupWide,
//!     colors: true,
//!     env: foreline::env_file::load(".env".as_ref())?,
//! })?;
//!
//! let code = sup.run().await?;
//! std::process::exit(code);
//! # }
//! ```
//!
//! `runner_exe` must understand `exec -- ARGV...` and hand it to
//! [`Runner::run`]; the `foreline` binary does.

pub mod codec;
pub mod color;
pub mod config;
pub mod env_file;
pub mod error;
pub mod output;
pub mod policy;
pub mod procfile;
pub mod runner;
pub mod signals;
pub mod supervisor;

pub use color::ColorMode;
pub use config::Settings;
pub use error::{Error, Result};
pub use output::Tagger;
pub use policy::{KillTarget, TerminationPolicy};
pub use procfile::{Declaration, Procfile};
pub use runner::{Runner, RunnerConfig};
pub use supervisor::{RunningChild, Supervisor, SupervisorConfig};
