use clap::Parser;
use paramfs_cli::Command;

/// ParamFS - parameter-level version control for model checkpoints
#[derive(Parser, Debug)]
#[command(name = "paramfs")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log every file and command touched
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = paramfs_cli::run(args.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
