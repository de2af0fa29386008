use javacv_install::installation::staging::PendingOperation;
use javacv_install::{Config, EngineContext, InstallRequest, Version, VersionRequirement};

fn main() {
	let mut opts;

	/* Parse console input */
	let parsed_options = {
		let args: Vec<String> = std::env::args().collect();

		opts = getopts::Options::new();
		opts.optflag( "h", "help",       "Show help");
		opts.optflag( "v", "verbose",    "Increased verbosity");
		opts.optopt(  "r", "root",       "ImageJ or Fiji installation to work on", "PATH");
		opts.optopt(  "j", "javacv",     "JavaCV version to install", "VERSION");
		opts.optflag( "f", "force",      "Copy files even when they are already installed");
		opts.optflag( "m", "at-least",   "Treat the requested version as a minimum");
		opts.optflag( "s", "substitute", "Install the installed or newest version when the requested one is unknown");
		opts.parsing_style(getopts::ParsingStyle::FloatingFrees);

		let parsed_options = match opts.parse(&args[1..]) {
			Ok(m)  => { m }
			Err(e) => { println!("Unable to parse options: {}", e); return }
		};

		if parsed_options.opt_present("h") {
			eprintln!("{}", opts.usage("Usage: javacv-install [options] <versions|components VERSION|status|install COMPONENT...>"));
			return;
		}

		parsed_options
	};

	let level = if parsed_options.opt_present("v") { log::LevelFilter::Debug } else { log::LevelFilter::Info };
	env_logger::Builder::from_default_env().filter_level(level).init();

	let mut config = Config::load_from_disk().unwrap_or_else(|e| {
		log::warn!("Failed to read config file: {}", e);
		log::warn!("Using default config.");
		Config::default()
	});
	if let Some(root) = parsed_options.opt_str("r") {
		config.set_host_root(root.into());
	}

	let Some(command) = parsed_options.free.first() else {
		eprintln!("{}", opts.short_usage("javacv-install"));
		return;
	};

	let result = EngineContext::new(config).map_err(Error::from).and_then(|mut engine| {
		match command.as_str() {
			"versions" => list_versions(&mut engine),
			"components" => list_components(&mut engine, parsed_options.free.get(1)),
			"status" => show_status(&mut engine),
			"install" => {
				let request = InstallRequest::new(parsed_options.opt_str("j").as_deref(), parsed_options.free[1..].iter().cloned())
					.force_reinstall(parsed_options.opt_present("f"))
					.substitute_unknown_version(parsed_options.opt_present("s"))
					.requirement(if parsed_options.opt_present("m") { VersionRequirement::RequireAtLeast } else { VersionRequirement::RequireExact });
				install(&mut engine, &request)
			},
			other => Err(Error::UnknownCommand(other.to_string())),
		}
	});

	if let Err(e) = result {
		log::error!("{}", e);
		std::process::exit(1);
	}
}

fn list_versions(engine: &mut EngineContext) -> Result<(), Error> {
	for version in engine.available_versions()? {
		println!("{}", version);
	}
	Ok(())
}

fn list_components(engine: &mut EngineContext, version: Option<&String>) -> Result<(), Error> {
	let version = match version {
		Some(v) => Version::parse(v)?,
		None => engine.newest_version()?,
	};
	println!("Components of JavaCV {}:", version);
	for name in engine.components_for_version(&version)? {
		println!("\t{}", name);
	}
	Ok(())
}

fn show_status(engine: &mut EngineContext) -> Result<(), Error> {
	println!("Installer version: {}", engine.installer_version());
	println!("Host: {:?} at {}", engine.layout().kind(), engine.layout().root().display());
	println!("Platform: {}", engine.platform());
	match engine.installed_version()? {
		Some(version) => {
			println!("Installed JavaCV version: {}", version);
			println!("Installed components: {:?}", engine.installed_components()?);
		},
		None => println!("JavaCV is not installed"),
	}
	Ok(())
}

fn install(engine: &mut EngineContext, request: &InstallRequest) -> Result<(), Error> {
	let report = engine.install(request)?;
	println!("JavaCV {} with components {:?} ({:?} FFmpeg build)", report.version, report.components, report.codec);
	for conflict in &report.conflicts {
		println!("\tConflict: {} ({:?})", conflict.path.display(), conflict.reason);
	}
	for operation in &report.operations {
		match operation {
			PendingOperation::Copy { dst, .. } => println!("\tInstall: {}", dst.display()),
			PendingOperation::MarkRemoved { path } => println!("\tRemove: {}", path.display()),
		}
	}
	if report.operations.is_empty() {
		println!("Nothing to do.");
	}
	if report.restart_required {
		println!("Please restart the host application to complete the installation.");
	}
	Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{0}")]
	Install(#[from] javacv_install::Error),
	#[error("Unknown command: {0}")]
	UnknownCommand(String),
}
