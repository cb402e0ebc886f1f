//! Login command - interactive sign-in through the browser.

use anyhow::Result;
use async_trait::async_trait;
use clap::Args;
use console::style;
use signin_oauth::{PkceAuthSession, Presenter, PromptError, PromptResult, SignInOAuth};
use url::Url;

use super::Context;

/// Arguments for the login command.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Only print the authorization URL, do not try to open a browser
    #[arg(long)]
    pub no_browser: bool,
}

/// Run the login command.
pub async fn run(args: LoginArgs, ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config()?;
    let config = loaded.config.sign_in_config()?;

    if ctx.verbose {
        for path in loaded.loaded_from() {
            println!("Using config: {}", path.display());
        }
    }

    let presenter = TerminalPresenter {
        open_browser: !args.no_browser,
    };
    let sign_in = SignInOAuth::new(config, PkceAuthSession::new(presenter));

    match sign_in.sign_in().await {
        Ok(data) => {
            println!();
            println!("{}", style("Sign-in successful!").green().bold());
            println!("{}", data.access_token);
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            println!("Sign-in cancelled.");
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context("Sign-in failed")),
    }
}

/// Presents the login page in the system browser and reads back the URL the
/// browser was redirected to.
struct TerminalPresenter {
    open_browser: bool,
}

#[async_trait]
impl Presenter for TerminalPresenter {
    async fn present(
        &self,
        authorization_url: &str,
        redirect_uri: &str,
    ) -> Result<PromptResult, PromptError> {
        println!("{}", style("OAuth Sign-in").bold());
        println!("=============");
        println!();
        println!("Open this URL in your browser:");
        println!();
        println!("  {}", authorization_url);
        println!();
        println!("After signing in you will be redirected to {}", redirect_uri);
        println!("Paste the full URL of that page here (empty input cancels):");
        println!();

        if self.open_browser && open_url(authorization_url).is_err() {
            println!("(Could not open browser automatically)");
            println!();
        }

        let input = tokio::task::spawn_blocking(|| -> std::io::Result<String> {
            use std::io::Write;
            print!("redirect url> ");
            std::io::stdout().flush()?;
            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;
            Ok(input)
        })
        .await??;

        parse_pasted_redirect(&input, redirect_uri)
    }
}

/// Turn what the user pasted into a prompt outcome.
fn parse_pasted_redirect(input: &str, redirect_uri: &str) -> Result<PromptResult, PromptError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(PromptResult::Dismiss);
    }
    if !same_endpoint(&Url::parse(input)?, &Url::parse(redirect_uri)?) {
        return Err(format!(
            "Pasted URL does not match the redirect URI {}",
            redirect_uri
        )
        .into());
    }
    Ok(PromptResult::from_redirect_url(input)?)
}

fn same_endpoint(pasted: &Url, expected: &Url) -> bool {
    pasted.scheme() == expected.scheme()
        && pasted.host_str() == expected.host_str()
        && pasted.port_or_known_default() == expected.port_or_known_default()
        && pasted.path() == expected.path()
}

/// Try to open a URL in the default browser.
fn open_url(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).status()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).status()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .status()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REDIRECT: &str = "https://example-domain.com/oauth/callback";

    #[test]
    fn test_empty_input_dismisses() {
        assert_eq!(
            parse_pasted_redirect("  \n", REDIRECT).unwrap(),
            PromptResult::Dismiss
        );
    }

    #[test]
    fn test_pasted_redirect_success() {
        let result =
            parse_pasted_redirect(&format!("{REDIRECT}?code=abc&state=xyz\n"), REDIRECT).unwrap();
        assert_eq!(result, PromptResult::success("abc", "xyz"));
    }

    #[test]
    fn test_pasted_foreign_url_rejected() {
        let err = parse_pasted_redirect("https://evil.example.com/?code=abc&state=xyz", REDIRECT)
            .unwrap_err();
        assert!(err.to_string().contains("redirect URI"));
    }

    #[test]
    fn test_pasted_lookalike_host_rejected() {
        let err = parse_pasted_redirect(
            "https://example-domain.com/oauth/callback.evil.com/x?code=a&state=b",
            REDIRECT,
        )
        .unwrap_err();
        assert!(err.to_string().contains("redirect URI"));
    }

    #[test]
    fn test_pasted_other_scheme_rejected() {
        let err = parse_pasted_redirect(
            "http://example-domain.com/oauth/callback?code=a&state=b",
            REDIRECT,
        )
        .unwrap_err();
        assert!(err.to_string().contains("redirect URI"));
    }
}
