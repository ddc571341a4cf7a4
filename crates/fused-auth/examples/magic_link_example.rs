/*
[INPUT]:  Email address and application id from the command line
[OUTPUT]: Stored bearer token and the wallet's native balance
[POS]:    Examples - magic-link sign-in demonstration
[UPDATE]: When auth flow changes
*/

use std::sync::Arc;

use fused_auth::*;

/// Example: magic-link sign-in
///
/// 1. Create HTTP client and credential store
/// 2. Register the email address (the service emails a link)
/// 3. Print the magic link so it can be opened on this device
/// 4. Wait for the link to be followed
/// 5. Query the wallet balance
#[tokio::main]
async fn main() {
    let mut args = std::env::args().skip(1);
    let (Some(email), Some(app_id)) = (args.next(), args.next()) else {
        eprintln!("usage: magic_link_example <email> <app-id>");
        return;
    };

    let client = match FusedClient::new() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {e}");
            return;
        }
    };
    let store = Arc::new(FileCredentialStore::new(".fused-auth"));
    let mut session = AuthSession::new(client, store, Identity::email(email, app_id));

    if !session.is_authenticated() {
        if let Err(e) = session.register().await {
            eprintln!("Registration failed: {e}");
            return;
        }
        match session.magic_link().await {
            Ok(link) => println!("Open this link to sign in: {link}"),
            Err(e) => eprintln!("Could not fetch magic link ({e}); check your inbox instead"),
        }
    }

    println!("Waiting for sign-in (Ctrl-C to abort)...");
    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    match session.await_login_with_cancel(&cancel).await {
        Ok(outcome) => println!("Signed in ({outcome:?})"),
        Err(e) => {
            eprintln!("Login failed: {e}");
            return;
        }
    }

    match session.address() {
        Ok(address) => println!("Wallet address: {address}"),
        Err(e) => eprintln!("No address in token: {e}"),
    }
    match session.native_balance(Chain::Eth).await {
        Ok(balance) => println!("ETH balance: {balance}"),
        Err(e) => eprintln!("Balance query failed: {e}"),
    }
}
