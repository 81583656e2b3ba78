//! # Kirana Till Entry Point
//!
//! The actual setup is in lib.rs so the commands can be driven from tests.

use clap::Parser;

use kirana_till::cli::Cli;

fn main() {
    kirana_till::init_tracing();
    let cli = Cli::parse();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if let Err(err) = kirana_till::run(cli, &mut out) {
        eprintln!("{}", err);
        std::process::exit(err.code.exit_code());
    }
}
