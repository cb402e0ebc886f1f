//! Config command - configuration management.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::style;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved sign-in configuration
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Show the user configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Which => cmd_which(ctx),
        ConfigCommand::Path => cmd_path(),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;

    println!("{}\n", style("# Sign-in Configuration").bold());

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    let config = loaded.config.sign_in_config()?;
    println!("  client_id:              {}", config.client_id);
    println!("  redirect_uri:           {}", config.redirect_uri);
    if !config.has_secure_redirect() {
        println!(
            "  {}",
            style("redirect_uri must be an https universal/app link").yellow()
        );
    }
    println!("  scopes:                 {}", config.scope());
    println!(
        "  authorization_endpoint: {}",
        config
            .discovery
            .authorization_endpoint
            .as_deref()
            .unwrap_or("(not set)")
    );
    println!(
        "  token_endpoint:         {}",
        config.discovery.token_endpoint.as_deref().unwrap_or("(not set)")
    );

    if ctx.verbose {
        println!();
        println!("{}", loaded.config.to_toml()?);
    }

    Ok(())
}

fn cmd_which(ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;

    println!("Config file search order (later overrides earlier):\n");

    for source in &loaded.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else {
            "· not found"
        };
        println!("  {} {}", status, source.path.display());
    }

    println!();
    let loaded_count = loaded.loaded_from().len();
    if loaded_count == 0 {
        println!("No config files found.");
    } else {
        println!("{} config file(s) loaded.", loaded_count);
    }

    Ok(())
}

fn cmd_path() -> Result<()> {
    if let Some(path) = signin_config::xdg_config_path() {
        println!("{}", path.display());
    } else {
        eprintln!("Could not determine config directory");
    }
    Ok(())
}
