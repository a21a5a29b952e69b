use clap::Parser;
use emit_py::translate;
use emit_py::TranslateOptions;
use std::fs::read_to_string;
use std::io::stdout;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
  name = "emit-py",
  about = "Translate a JavaScript file into Python for the js2py runtime"
)]
struct Cli {
  /// JavaScript file to translate.
  input: PathBuf,

  /// Omit the runtime import preamble.
  #[arg(long)]
  no_preamble: bool,
}

/// Logs go to stderr so stdout only ever carries the translation. Set `RUST_LOG` to see more
/// than errors.
fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
  fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_ansi(false)
    .init();
}

fn exit_with_error(message: impl std::fmt::Display) -> ! {
  eprintln!("error: {message}");
  process::exit(1);
}

fn main() {
  let args = Cli::parse();
  init_tracing();

  let source = match read_to_string(&args.input) {
    Ok(source) => source,
    Err(err) => exit_with_error(format!("failed to read {}: {err}", args.input.display())),
  };
  let options = TranslateOptions::new().with_preamble(!args.no_preamble);
  let translation = match translate(&source, options) {
    Ok(translation) => translation,
    Err(err) => exit_with_error(format!("{}: {err}", args.input.display())),
  };
  for placeholder in translation.placeholders() {
    tracing::info!(
      line = placeholder.line,
      column = placeholder.column,
      construct = placeholder.construct,
      "left a placeholder"
    );
  }
  if let Err(err) = stdout().write_all(translation.render().as_bytes()) {
    exit_with_error(format!("failed to write output: {err}"));
  };
}
