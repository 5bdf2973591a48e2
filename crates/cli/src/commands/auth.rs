//! Session and account commands.

use lpg_core::Role;
use secrecy::{ExposeSecret, SecretString};

use super::session::SavedSession;
use super::{CliError, Context};

/// `lpg health`
pub async fn health(ctx: &Context) -> Result<(), CliError> {
    let health = ctx.client.health().await?;
    println!("{}: {}", health.status, health.message);
    Ok(())
}

/// `lpg init`
pub async fn init(ctx: &Context) -> Result<(), CliError> {
    let message = ctx.client.initialize().await?;
    println!("{message}");
    Ok(())
}

/// `lpg login -u <username> -p <password>`
pub async fn login(ctx: &Context, username: &str, password: String) -> Result<(), CliError> {
    let password = SecretString::from(password);
    let user = ctx.client.sign_in(username, &password).await?;
    let token = ctx.client.token().await.ok_or(CliError::NotSignedIn)?;

    ctx.session.save(&SavedSession {
        access_token: token.expose_secret().to_owned(),
        user: user.clone(),
    })?;

    tracing::debug!(path = %ctx.session.path().display(), "Session saved");
    println!("Signed in as {} ({})", user.username, user.role);
    Ok(())
}

/// `lpg logout`
pub async fn logout(ctx: &Context) -> Result<(), CliError> {
    if ctx.client.is_signed_in().await {
        ctx.client.sign_out().await?;
    }
    ctx.session.clear()?;
    println!("Signed out");
    Ok(())
}

/// `lpg whoami`
pub async fn whoami(ctx: &Context) -> Result<(), CliError> {
    ctx.require_session().await?;

    match ctx.client.check_session().await {
        Ok(user) => {
            println!("{} ({}) id={}", user.username, user.role, user.id);
            Ok(())
        }
        Err(e) if e.is_unauthorized() => {
            ctx.session.clear()?;
            Err(CliError::NotSignedIn)
        }
        Err(e) => Err(e.into()),
    }
}

/// `lpg signup -u <username> -p <password> [-r <role>]`
pub async fn signup(
    ctx: &Context,
    username: &str,
    password: String,
    role: &str,
) -> Result<(), CliError> {
    let password = SecretString::from(password);
    let user = ctx.client.sign_up(username, &password, role).await?;

    let note = if Role::from(role).is_admin() {
        " with admin access"
    } else {
        ""
    };
    println!("Created {}{note} (id {})", user.username, user.id);
    Ok(())
}
