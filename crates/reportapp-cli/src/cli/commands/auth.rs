//! Session command handlers.

use anyhow::{Context, Result};
use reportapp_core::navigation::GateState;

use super::App;

pub async fn login(app: &App, email: &str, password: &str) -> Result<()> {
    app.gate()
        .sign_in(&app.auth(), email, password)
        .await
        .context("login failed")?;
    println!("Logged in as {}", email.trim());
    Ok(())
}

pub async fn logout(app: &App) -> Result<()> {
    app.gate().logout().await.context("logout failed")?;
    println!("Logged out.");
    Ok(())
}

pub async fn status(app: &App) -> Result<()> {
    let state = app.gate().restore().await.context("read session")?;
    match state {
        GateState::Authenticated => println!("Logged in ({})", app.api_base_url()),
        GateState::Unauthenticated => println!("Not logged in."),
    }
    Ok(())
}

pub async fn register(
    app: &App,
    name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<()> {
    app.auth()
        .register(name, email, password, confirm_password)
        .await
        .context("registration failed")?;
    println!("Account created. You can now log in.");
    Ok(())
}

pub async fn reset_password(app: &App, email: &str) -> Result<()> {
    app.auth()
        .request_password_reset(email)
        .await
        .context("password reset failed")?;
    println!("Password reset email sent to {}", email.trim());
    Ok(())
}
