// Entrypoint for the CLI application.
// - Keeps `main` small: parse the command line, build the API client and
//   token store, run the one requested command.
// - Returns `anyhow::Result` so transport faults surface with their full
//   error chain; handled API rejections exit normally.

use chirp_cli::{api::ApiClient, cli::Cli, token::TokenStore};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    // Logging is off unless RUST_LOG asks for it.
    env_logger::init();

    let cli = Cli::parse();
    let api = ApiClient::new()?;
    cli.run(&api, &TokenStore::new())
}
