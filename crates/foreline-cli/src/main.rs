mod logs;

use std::path::{Path, PathBuf};

use foreline::supervisor;
use foreline::{env_file, Error, Runner, RunnerConfig, Settings, Supervisor, SupervisorConfig};
use owo_colors::OwoColorize;

/// Options accepted before the subcommand.
#[derive(Debug, Default)]
struct GlobalOpts {
	procfile: Option<PathBuf>,
	env_file: Option<PathBuf>,
}

fn main() {
	logs::init();
	let args: Vec<String> = std::env::args().skip(1).collect();

	let (opts, rest) = parse_global(&args);
	let Some(command) = rest.first() else {
		print_usage();
		std::process::exit(1);
	};

	match command.as_str() {
		"help" | "--help" | "-h" => print_usage(),
		"version" | "--version" | "-V" => println!("foreline {}", env!("CARGO_PKG_VERSION")),
		"start" => cmd_start(&opts, &rest[1..]),
		"exec" => cmd_exec(&rest[1..]),
		"run" => cmd_run(&opts, &rest[1..]),
		"export" | "check" => {
			eprintln!("{}: not supported", command);
			std::process::exit(1);
		}
		other => {
			eprintln!("unknown command: {}", other);
			eprintln!();
			print_usage();
			std::process::exit(1);
		}
	}
}

fn parse_global(args: &[String]) -> (GlobalOpts, &[String]) {
	let mut opts = GlobalOpts::default();
	let mut i = 0;
	while i < args.len() {
		let arg = args[i].as_str();
		let (flag, inline) = match arg.split_once('=') {
			Some((flag, value)) if flag.starts_with("--") => (flag, Some(value.to_string())),
			_ => (arg, None),
		};
		let slot = match flag {
			"-f" | "--procfile" => &mut opts.procfile,
			"-e" | "--env" => &mut opts.env_file,
			_ => break,
		};
		let value = match inline {
			Some(value) => value,
			None => {
				i += 1;
				match args.get(i) {
					Some(value) => value.clone(),
					None => {
						eprintln!("error: {} needs a path", flag);
						std::process::exit(2);
					}
				}
			}
		};
		*slot = Some(PathBuf::from(value));
		i += 1;
	}
	(opts, &args[i..])
}

fn print_usage() {
	eprintln!("{} {}: run the processes in a Procfile", "foreline".bold(), env!("CARGO_PKG_VERSION"));
	eprintln!();
	eprintln!("usage: {} [options] <command> [args]", "foreline".bold());
	eprintln!();

	eprintln!("{}", "commands".cyan().bold());
	eprintln!("  {} [name]                 Run every process, or exec just one", "start".bold());
	eprintln!("  {} <command...>             Run a command with the env file applied", "run".bold());
	eprintln!("  {} -- <command...>         Run one command with tagged output", "exec".bold());
	eprintln!("  {} / {}                Not supported", "export".bold(), "check".bold());
	eprintln!();

	eprintln!("{}", "options".cyan().bold());
	eprintln!("  {} <path>         Procfile to read (default ./Procfile)", "-f, --procfile".bold());
	eprintln!("  {} <path>              Env file to apply (default ./.env)", "-e, --env".bold());
	eprintln!();

	eprintln!("{}", "environment".cyan().bold());
	eprintln!("  FORELINE_KILL_MODE   group (default) or selective");
	eprintln!("  FORELINE_COLORS      auto (default), always or never");
	eprintln!("  FORELINE_LOG         diagnostics filter, e.g. debug");
}

fn fail(err: Error) -> ! {
	eprintln!("error: {}", err);
	eprintln!();
	std::process::exit(err.exit_code());
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
	let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
		Ok(rt) => rt,
		Err(e) => fail(Error::Io(e)),
	};
	rt.block_on(future)
}

fn settings(opts: &GlobalOpts) -> Settings {
	let mut settings = Settings::load(Path::new("."));
	if let Some(path) = &opts.procfile {
		settings.procfile = path.clone();
	}
	if let Some(path) = &opts.env_file {
		settings.env_file = path.clone();
	}
	tracing::debug!(?settings, "settings");
	settings
}

fn supervisor_config(settings: &Settings) -> foreline::Result<SupervisorConfig> {
	Ok(SupervisorConfig {
		procfile: settings.procfile.clone(),
		runner_exe: std::env::current_exe()?,
		policy: settings.kill_mode,
		colors: settings.colors.enabled(),
		env: env_file::load(&settings.env_file)?,
	})
}

fn cmd_start(opts: &GlobalOpts, names: &[String]) {
	if names.len() > 1 {
		fail(Error::TooManyNames);
	}
	let settings = settings(opts);
	let sup = match supervisor_config(&settings).and_then(Supervisor::load) {
		Ok(sup) => sup,
		Err(e) => fail(e),
	};

	if let Some(name) = names.first() {
		match sup.exec_one(name) {
			Ok(never) => match never {},
			Err(e) => fail(e),
		}
	}

	match block_on(sup.run()) {
		Ok(code) => std::process::exit(code),
		Err(e) => fail(e),
	}
}

fn cmd_exec(args: &[String]) {
	let argv = match args.first().map(|s| s.as_str()) {
		Some("--") => &args[1..],
		_ => args,
	};
	if argv.is_empty() {
		fail(Error::EmptyCommand("exec".to_string()));
	}

	let runner = Runner::new(RunnerConfig::from_env(argv));
	let result = block_on(async {
		let mut stdout = tokio::io::stdout();
		runner.run(argv, &mut stdout).await
	});
	match result {
		Ok(code) => std::process::exit(code),
		Err(e) => fail(e),
	}
}

fn cmd_run(opts: &GlobalOpts, args: &[String]) {
	let argv = match args.first().map(|s| s.as_str()) {
		Some("--") => &args[1..],
		_ => args,
	};
	let settings = settings(opts);
	let env = match env_file::load(&settings.env_file) {
		Ok(env) => env,
		Err(e) => fail(e),
	};
	match supervisor::exec(argv, &env) {
		Ok(never) => match never {},
		Err(e) => fail(e),
	}
}
