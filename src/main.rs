use clap::Parser;
use tickets::cli::{self, Cli};
use tickets::logging;

fn main() {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.quiet);

    if let Err(e) = cli::execute(&cli) {
        // User mistakes go to stderr as-is; infrastructure failures also hit
        // the log stream where the full error chain is captured.
        if !e.is_user_recoverable() {
            tracing::error!(error = %e, "command failed");
        }
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
