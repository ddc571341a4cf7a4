/*
[INPUT]:  Parsed subcommand and an auth session
[OUTPUT]: Results printed to stdout, errors with context
[POS]:    Command layer - maps subcommands onto session operations
[UPDATE]: When adding subcommands or changing their output
*/

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use fused_auth::{AuthSession, Chain, FusedError, LoginOutcome, SessionState};

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Register and wait for the emailed magic link to be followed
    Login {
        /// Also print the magic link (for opening on this device)
        #[arg(long)]
        show_link: bool,
    },
    /// Delete the stored token
    Logout,
    /// Show whether a valid token is stored
    Status,
    /// Print the wallet address
    Address {
        /// Ask the service instead of reading the token
        #[arg(long)]
        remote: bool,
    },
    /// Print the native coin balance
    Balance { chain: Chain },
    /// Print ERC-20 holdings as JSON
    Erc20 { chain: Chain },
    /// Print NFT holdings as JSON
    Nfts { chain: Chain },
}

/// Execute one subcommand against `session`
pub async fn run(
    command: Command,
    session: &mut AuthSession,
    shutdown: CancellationToken,
) -> Result<()> {
    match command {
        Command::Login { show_link } => login(session, show_link, shutdown).await,
        Command::Logout => {
            session.logout().context("logout")?;
            println!("logged out");
            Ok(())
        }
        Command::Status => {
            match session.state() {
                SessionState::Authenticated => {
                    let address = session.address().unwrap_or_default();
                    println!("authenticated {address}");
                }
                SessionState::Registered { .. } => println!("registered"),
                SessionState::Unregistered => {
                    if let Err(err) = session.bearer_token() {
                        if !matches!(err, FusedError::NotAuthenticated) {
                            warn!(error = %err, "stored token not usable");
                        }
                    }
                    println!("unregistered");
                }
            }
            Ok(())
        }
        Command::Address { remote } => {
            let address = if remote {
                session.fetch_address().await.context("fetch address")?
            } else {
                session.address().context("read address from token")?
            };
            println!("{address}");
            Ok(())
        }
        Command::Balance { chain } => {
            let balance = session
                .native_balance(chain)
                .await
                .with_context(|| format!("query {chain} balance"))?;
            println!("{balance}");
            Ok(())
        }
        Command::Erc20 { chain } => {
            let tokens = session
                .erc20_tokens(chain)
                .await
                .with_context(|| format!("query {chain} erc20 tokens"))?;
            print_json(&tokens)
        }
        Command::Nfts { chain } => {
            let nfts = session
                .nft_tokens(chain)
                .await
                .with_context(|| format!("query {chain} nfts"))?;
            print_json(&nfts)
        }
    }
}

async fn login(
    session: &mut AuthSession,
    show_link: bool,
    shutdown: CancellationToken,
) -> Result<()> {
    if session.is_authenticated() {
        println!("already authenticated");
        return Ok(());
    }

    session.register().await.context("register")?;
    info!("registration accepted; check your inbox for the sign-in link");

    if show_link {
        match session.magic_link().await {
            Ok(link) => println!("{link}"),
            Err(err) => warn!(error = %err, "could not fetch magic link"),
        }
    }

    match session.await_login_with_cancel(&shutdown).await {
        Ok(LoginOutcome::AlreadyAuthenticated) => println!("already authenticated"),
        Ok(LoginOutcome::Authenticated) => {
            let address = session.address().unwrap_or_default();
            println!("authenticated {address}");
        }
        Err(FusedError::Cancelled) => bail!("login cancelled"),
        Err(err) => return Err(err).context("wait for login"),
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("render json")?;
    println!("{rendered}");
    Ok(())
}
