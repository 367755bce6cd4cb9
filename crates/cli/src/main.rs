//! sc: command-line client for the Stratus cloud backend

mod commands;
mod exit_code;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use output::{Formatter, OutputConfig};

#[derive(Parser, Debug)]
#[command(
    name = "sc",
    version,
    about = "Client for the Stratus multi-tenant cloud backend",
    propagate_version = true
)]
struct Cli {
    /// Emit strict JSON output
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage stored application profiles
    #[command(subcommand)]
    Profile(commands::profile::ProfileCommands),

    /// Log in and print a session token
    Login(commands::login::LoginArgs),

    /// Inspect a stratus:// address
    Uri(commands::uri::UriArgs),

    /// Work with objects
    Object(commands::object::ObjectArgs),

    /// Manage groups and their members
    Group(commands::group::GroupArgs),

    /// Invoke a server-code endpoint
    Call(commands::call::CallArgs),

    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_config = OutputConfig {
        json: cli.json,
        quiet: cli.quiet,
        no_color: cli.no_color,
    };
    let formatter = Formatter::new(output_config);

    let code = match cli.command {
        Commands::Profile(cmd) => commands::profile::execute(cmd, &formatter),
        Commands::Login(args) => commands::login::execute(args, &formatter).await,
        Commands::Uri(args) => commands::uri::execute(args, &formatter),
        Commands::Object(args) => commands::object::execute(args, &formatter).await,
        Commands::Group(args) => commands::group::execute(args, &formatter).await,
        Commands::Call(args) => commands::call::execute(args, &formatter).await,
        Commands::Completions(args) => commands::completions::execute::<Cli>(args),
    };

    std::process::exit(code.code());
}
