//! Profile command handlers.

use anyhow::{Context, Result};

use super::App;

pub async fn show(app: &App) -> Result<()> {
    let profile = app.profile().fetch().await.context("load profile")?;
    println!("Name:  {}", profile.name);
    println!("Email: {}", profile.email);
    Ok(())
}

pub async fn update(app: &App, name: &str, password: &str, confirm_password: &str) -> Result<()> {
    app.profile()
        .update(name, password, confirm_password)
        .await
        .context("update profile")?;
    println!("Profile updated.");
    Ok(())
}
