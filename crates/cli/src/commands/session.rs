//! Admin session commands.

use secrecy::SecretString;

use emporium_admin::{AdminConfig, AdminWorkspace, AuthState};

use super::{CommandError, client};

/// Sign in and store a new session in the backend.
pub async fn login(
    config: &AdminConfig,
    email: &str,
    password: &SecretString,
) -> Result<(), CommandError> {
    let workspace = AdminWorkspace::new(client(config)?);
    workspace.login(email, password).await?;

    let state = workspace.snapshot().await;
    println!("Signed in as {}.", state.display_name());
    match &state.product_error {
        Some(message) => println!("{message}"),
        None => println!("{} products in the catalog.", state.products.len()),
    }
    Ok(())
}

/// End the adopted session.
pub async fn logout(config: &AdminConfig) -> Result<(), CommandError> {
    let workspace = AdminWorkspace::new(client(config)?);
    if workspace.check_session().await != AuthState::Authenticated {
        println!("Not signed in.");
        return Ok(());
    }
    workspace.logout().await;
    println!("Signed out.");
    Ok(())
}

/// Show who is signed in and what the catalog holds.
pub async fn status(config: &AdminConfig) -> Result<(), CommandError> {
    let workspace = AdminWorkspace::mount(client(config)?).await;
    let state = workspace.snapshot().await;

    println!("Backend: {}", config.api_base_url);
    if !state.is_authenticated() {
        println!("Not signed in.");
        return Ok(());
    }

    let session = state
        .session_id
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_default();
    println!("Signed in as {} (session {session}).", state.display_name());
    match &state.product_error {
        Some(message) => println!("{message}"),
        None => println!(
            "{} products in {} categories.",
            state.products.len(),
            state.hierarchy.len()
        ),
    }
    Ok(())
}
