//! Authorize-url command - print an authorization URL without signing in.

use anyhow::Result;
use clap::Args;
use signin_oauth::AuthRequest;

use super::Context;

/// Arguments for the authorize-url command.
#[derive(Args, Debug)]
pub struct AuthorizeUrlArgs {
    /// Also print the generated CSRF state
    #[arg(long)]
    pub show_state: bool,
}

/// Run the authorize-url command.
pub async fn run(args: AuthorizeUrlArgs, ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;
    let config = loaded.config.sign_in_config()?;

    let request = AuthRequest::generate(&config);
    let url = request
        .authorization_url(&config.discovery)
        .ok_or_else(|| anyhow::anyhow!("No discovery authorization endpoint configured"))?;

    println!("{}", url);
    if args.show_state
        && let Some(state) = &request.state
    {
        println!("state: {}", state);
    }

    Ok(())
}
