//! Gatehouse - interactive client for an email-verified identity service.
//!
//! The auth core (gateway, flow, guard, credential store) lives in the
//! `api` and `auth` modules; this binary is a thin line-oriented front-end
//! that prompts, dispatches into the core, and prints whatever state comes
//! back. Navigation is driven entirely by the session guard.

mod api;
mod auth;
mod config;
mod models;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use api::{ApiError, AuthClient};
use auth::{user_message, AuthFlow, AuthState, FlowState, KeyringStore, SessionGuard, TokenStore};
use config::Config;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG to control log level (e.g. RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    info!("gatehouse starting");

    let config = Config::load()?;
    let store = Arc::new(KeyringStore::new());
    let client = Arc::new(AuthClient::new(&config.api_url, Arc::clone(&store))?);

    // Determine the session state before anything renders.
    let mut guard = SessionGuard::new(store);
    guard.initialize().await;

    let mut flow = AuthFlow::new(Arc::clone(&client));

    loop {
        let keep_going = match guard.state() {
            AuthState::Unknown => unreachable!("guard is initialized before the loop"),
            AuthState::Unauthenticated => auth_screen(&mut flow, &mut guard).await?,
            AuthState::Authenticated => home_screen(&client, &mut guard, &mut flow).await?,
        };
        if !keep_going {
            break;
        }
    }

    info!("gatehouse shutting down");
    Ok(())
}

/// Entry point of the unauthenticated flow. Returns false to quit.
async fn auth_screen<S: TokenStore>(
    flow: &mut AuthFlow<S>,
    guard: &mut SessionGuard<S>,
) -> Result<bool> {
    println!("\n=== Gatehouse ===");
    let Some(choice) = prompt("[l]ogin  [s]ignup  [q]uit: ")? else {
        return Ok(false);
    };
    match choice.as_str() {
        "l" | "login" => login_screen(flow, guard).await?,
        "s" | "signup" => signup_screen(flow).await?,
        "q" | "quit" => return Ok(false),
        _ => {}
    }
    Ok(true)
}

async fn login_screen<S: TokenStore>(
    flow: &mut AuthFlow<S>,
    guard: &mut SessionGuard<S>,
) -> Result<()> {
    let Some(email) = prompt("Email: ")? else {
        return Ok(());
    };
    let password = rpassword::prompt_password("Password: ")?;

    println!("Signing in...");
    flow.submit_login(&email, &password).await;

    match flow.state().clone() {
        FlowState::Authenticated => {
            guard.on_login();
            flow.reset();
            println!("Login successful!");
        }
        FlowState::Failed(message) => {
            println!("Error: {}", message);
            flow.dismiss();
        }
        _ => {}
    }
    Ok(())
}

async fn signup_screen<S: TokenStore>(flow: &mut AuthFlow<S>) -> Result<()> {
    let Some(name) = prompt("Name: ")? else {
        return Ok(());
    };
    let Some(email) = prompt("Email: ")? else {
        return Ok(());
    };
    let password = rpassword::prompt_password("Password: ")?;

    println!("Creating account...");
    flow.submit_signup(&name, &email, &password).await;

    if let FlowState::Failed(message) = flow.state().clone() {
        println!("Error: {}", message);
        flow.dismiss();
        return Ok(());
    }

    // Confirmation loop: runs until the code is accepted or the user backs out.
    while let Some(pending) = flow.pending_email().map(String::from) {
        println!("We sent a verification code to {}.", pending);
        let Some(code) = prompt("Code ([r]esend, [b]ack): ")? else {
            flow.reset();
            return Ok(());
        };
        match code.as_str() {
            "r" | "resend" => println!("{}", flow.resend_code().await),
            "b" | "back" => {
                flow.reset();
                return Ok(());
            }
            _ => {
                flow.submit_confirmation(&code).await;
                match flow.state().clone() {
                    FlowState::Idle => println!("Email verified - you can log in now."),
                    FlowState::Failed(message) => {
                        println!("Error: {}", message);
                        flow.dismiss();
                    }
                    _ => {}
                }
            }
        }
    }
    Ok(())
}

/// Protected screen: fetches and renders the profile. Returns false to quit.
async fn home_screen<S: TokenStore>(
    client: &AuthClient<S>,
    guard: &mut SessionGuard<S>,
    flow: &mut AuthFlow<S>,
) -> Result<bool> {
    println!("\n=== Home ===");
    match client.get_user_info().await {
        Ok(profile) => {
            println!("Name:           {}", profile.name);
            println!("Email:          {}", profile.email);
            println!(
                "Email verified: {}",
                if profile.is_email_verified() { "Yes" } else { "No" }
            );
            println!("User ID:        {}", profile.sub);
            println!("Username:       {}", profile.username);
        }
        Err(ApiError::SessionExpired) => {
            println!("Your session has expired. Please log in again.");
            // Drop the stale token and fall back to the login screen.
            if let Err(e) = client.logout().await {
                warn!(error = %e, "failed to clear stale token");
            }
            guard.on_session_expired();
            flow.reset();
            return Ok(true);
        }
        Err(e) => println!("Error: {}", user_message(&e)),
    }

    let Some(choice) = prompt("[r]efresh  [o] log out  [q]uit: ")? else {
        return Ok(false);
    };
    match choice.as_str() {
        "o" | "logout" => {
            client.logout().await?;
            guard.on_logout();
            flow.reset();
            println!("Logged out.");
        }
        "q" | "quit" => return Ok(false),
        // Anything else re-renders, which re-fetches the profile.
        _ => {}
    }
    Ok(true)
}

/// Prompt for a line of input. `None` means stdin is closed, which screens
/// treat as a request to leave rather than re-prompting forever.
fn prompt(label: &str) -> Result<Option<String>> {
    print!("{}", label);
    io::stdout().flush()?;
    read_trimmed_line(&mut io::stdin().lock())
}

fn read_trimmed_line(reader: &mut impl BufRead) -> Result<Option<String>> {
    let mut input = String::new();
    if reader.read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}
