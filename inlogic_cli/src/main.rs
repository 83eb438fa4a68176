use std::io::Read;
use std::path::Path;
use std::process;

use clap::Parser;
use inlogic_cli::InlogicCli;
use inlogic_core::AnyEmptyResult;
use inlogic_core::InlogicError;
use inlogic_core::LineIndex;
use inlogic_core::Preprocessed;
use inlogic_core::preprocess;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = InlogicCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	if args.verbose {
		tracing_subscriber::fmt()
			.with_env_filter(
				tracing_subscriber::EnvFilter::try_from_default_env()
					.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
			)
			.with_writer(std::io::stderr)
			.init();
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	if let Err(e) = run(&args) {
		eprintln!("{} {e}", colored!("error:", red));
		process::exit(2);
	}
}

fn run(args: &InlogicCli) -> AnyEmptyResult {
	let source = read_input(&args.input)?;
	tracing::debug!(bytes = source.len(), "read input");

	let result = match preprocess(&source) {
		Ok(result) => result,
		Err(error) => {
			print_location(&source, &error, &args.input);
			let report: miette::Report = error.into();
			eprintln!("{report:?}");
			process::exit(2);
		}
	};
	tracing::debug!(
		bytes = result.code.len(),
		segments = result.map.segments.len(),
		"transformed"
	);

	if args.check {
		return run_check(args, &source, &result.code);
	}

	write_result(args, &result)
}

fn write_result(args: &InlogicCli, result: &Preprocessed) -> AnyEmptyResult {
	if let Some(path) = &args.map {
		let json = serde_json::to_string_pretty(&result.map)?;
		std::fs::write(path, json)?;
		tracing::debug!(path = %path.display(), "wrote position map");
	}

	match &args.output {
		Some(path) => std::fs::write(path, &result.code)?,
		None => print!("{}", result.code),
	}

	Ok(())
}

fn run_check(args: &InlogicCli, source: &str, transformed: &str) -> AnyEmptyResult {
	if source == transformed {
		println!("Check passed: no marker attributes to rewrite.");
		return Ok(());
	}

	eprintln!(
		"{} marker attributes would rewrite {}",
		colored!("check failed:", red),
		args.input.display()
	);
	print_diff(source, transformed);
	process::exit(1);
}

fn read_input(path: &Path) -> std::io::Result<String> {
	if path == Path::new("-") {
		let mut buffer = String::new();
		std::io::stdin().read_to_string(&mut buffer)?;
		Ok(buffer)
	} else {
		std::fs::read_to_string(path)
	}
}

/// Point at the source location of a transform error, when it carries one.
fn print_location(source: &str, error: &InlogicError, input: &Path) {
	let Some(offset) = error.offset() else {
		return;
	};
	let (line, column) = LineIndex::new(source).line_col(offset);

	eprintln!(
		"{} {}:{line}:{column}",
		colored!("error in", bold),
		input.display()
	);
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}
