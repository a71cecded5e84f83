extern crate mixology;

use std::process;

use mixology::driver::options::MixologyOptions;
use mixology::driver::prepare;
use mixology::driver::source::SourceLoader;
use tracing_subscriber::{fmt, EnvFilter};

pub fn main() {
    let opt = MixologyOptions::from_args();

    init_logging(opt.debug);

    let mut loader = SourceLoader::new();

    // Errors in reading or configuration are reported as diagnostics
    // against the loaded files
    if let Err(e) = prepare::prepare(&opt, &mut loader) {
        let diag = e.to_diagnostic();
        loader.diagnose_to_stderr(&diag);
        process::exit(1);
    }

    process::exit(0);
}

/// Use `RUST_LOG` if set, otherwise `warn` (or `debug` with `--debug`)
fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
