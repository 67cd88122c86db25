//! CLI for the HelloWorld gRPC service
//!
//! One subcommand per RPC, plus `describe` for the service map:
//! - say: SayHello, once per name
//! - replies: LotsOfReplies, printing each streamed reply
//! - greetings: LotsOfGreetings, streaming every name in one call
//! - bidi: BidiHello, printing replies as they arrive

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "hello")]
#[command(about = "Client for the pb.hello.HelloWorld gRPC service", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call SayHello
    Say(commands::say::SayArgs),

    /// Call LotsOfReplies and print the reply stream
    Replies(commands::replies::RepliesArgs),

    /// Stream requests to LotsOfGreetings and print the collected reply
    Greetings(commands::greetings::GreetingsArgs),

    /// Exchange greetings over BidiHello
    Bidi(commands::bidi::BidiArgs),

    /// Print the service's methods or its service map
    Describe(commands::describe::DescribeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Say(args) => commands::say::run(args).await,
        Commands::Replies(args) => commands::replies::run(args).await,
        Commands::Greetings(args) => commands::greetings::run(args).await,
        Commands::Bidi(args) => commands::bidi::run(args).await,
        Commands::Describe(args) => commands::describe::run(args),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // Logs go to stderr so `--json` output on stdout stays parseable
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
