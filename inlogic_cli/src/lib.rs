use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Rewrite inline logic marker attributes into explicit block syntax.",
	long_about = "inlogic scans markup for marker attributes (`:if`, `:else`, `:else-if`, \
	              `:each`, `:as`, `:key`, `:await`, `:then`, `:catch`), rewrites the \
	              surrounding markup into explicit block constructs such as `{#if \
	              condition}...{:else}...{/if}`, deletes the marker attributes, and leaves \
	              every other byte of the document untouched.\n\nQuick start:\n  inlogic \
	              page.html              Preprocess a file to stdout\n  inlogic page.html -o \
	              out.html  Write the result to a file\n  inlogic page.html --check      Fail \
	              when markers would rewrite it\n  inlogic -                      Read from stdin"
)]
pub struct InlogicCli {
	/// Input markup file. Use `-` to read from stdin.
	pub input: PathBuf,

	/// Write the transformed markup to this file instead of stdout.
	#[arg(long, short)]
	pub output: Option<PathBuf>,

	/// Also write the output-to-input position map as JSON.
	#[arg(long)]
	pub map: Option<PathBuf>,

	/// Verify instead of writing: print a diff and exit with status 1 when
	/// the transform would change the input.
	#[arg(long, default_value_t = false)]
	pub check: bool,

	/// Enable verbose logging on stderr.
	#[arg(long, short, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, default_value_t = false)]
	pub no_color: bool,
}
