use anyhow::Result;
use clap::Command;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cmd;
mod config;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let matches = Command::new("vitrine")
        .about("Render storefront microsites from a project document")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(cmd::init::make_subcommand())
        .subcommand(cmd::build::make_subcommand())
        .subcommand(cmd::serve::make_subcommand())
        .subcommand(cmd::set::make_subcommand())
        .get_matches();

    match matches.subcommand() {
        Some(("init", args)) => cmd::init::execute(args),
        Some(("build", args)) => cmd::build::execute(args),
        Some(("serve", args)) => cmd::serve::execute(args).await,
        Some(("set", args)) => cmd::set::execute(args),
        _ => unreachable!("subcommand_required"),
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,vitrine=debug,vitrine_core=debug,vitrine_dev_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
