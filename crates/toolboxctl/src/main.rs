//! Toolbox Control - CLI front end for the Linux Toolbox engine
//!
//! Passes an action key and parameters to the engine and prints the result.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "toolboxctl")]
#[command(
    about = "Linux Toolbox - common administration tasks on any distribution",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.config/linux-toolbox/engine.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the detected host and package family
    Host,

    /// List actions and whether this host supports them
    Actions,

    /// Print the command an action resolves to, without running it
    Resolve {
        /// Action key, e.g. install_pkg
        action: String,

        /// Parameter as key=value (repeatable)
        #[arg(short, long = "param", value_parser = commands::parse_param)]
        params: Vec<(String, String)>,
    },

    /// Resolve and run an action
    Run {
        /// Action key, e.g. update_system
        action: String,

        /// Parameter as key=value (repeatable)
        #[arg(short, long = "param", value_parser = commands::parse_param)]
        params: Vec<(String, String)>,

        /// Capture output here instead of opening a terminal
        #[arg(long)]
        background: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run an arbitrary command through the dispatcher
    Exec {
        /// Command line, passed to the shell as-is
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,

        /// Title shown in the terminal and result
        #[arg(long, default_value = "Command")]
        title: String,

        /// Run with superuser rights
        #[arg(long)]
        sudo: bool,

        /// Capture output here instead of opening a terminal
        #[arg(long)]
        background: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Count pending package updates
    Updates,

    /// Run host diagnostics (all summary probes when none given)
    Info {
        /// Diagnostic key, e.g. memory
        diagnostic: Option<String>,

        /// Run the network checks (ping, DNS, route, sockets, addresses)
        #[arg(long, conflicts_with = "diagnostic")]
        network: bool,
    },

    /// Manage the engine config file
    Config {
        /// Write the default config file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    toolbox_core::logging::init(cli.verbose);

    let config = commands::load_config(cli.config.as_deref());

    let succeeded = match cli.command {
        Commands::Host => commands::host(&config),
        Commands::Actions => commands::actions(&config),
        Commands::Resolve { action, params } => commands::resolve(&config, &action, params)?,
        Commands::Run {
            action,
            params,
            background,
            json,
        } => commands::run(config, &action, params, background, json).await?,
        Commands::Exec {
            command,
            title,
            sudo,
            background,
            json,
        } => commands::exec(config, &command.join(" "), &title, sudo, background, json).await?,
        Commands::Updates => commands::updates(&config).await,
        Commands::Info {
            diagnostic,
            network,
        } => commands::info(&config, diagnostic.as_deref(), network).await?,
        Commands::Config { init } => commands::config(cli.config.as_deref(), init)?,
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
