//! User administration commands. The server only allows these for admins.

use lpg_core::{UserId, UserPatch};

use super::{CliError, Context};

/// `lpg users list`
pub async fn list(ctx: &Context) -> Result<(), CliError> {
    ctx.require_session().await?;

    let mut users = ctx.client.users().await?;
    users.sort_by(|a, b| a.username.cmp(&b.username));

    println!("{:<38} {:<20} {:<8} CREATED", "ID", "USERNAME", "ROLE");
    for u in &users {
        println!(
            "{:<38} {:<20} {:<8} {}",
            u.id,
            u.username,
            u.role,
            u.created_at.format("%Y-%m-%d %H:%M")
        );
    }
    println!("{} user(s)", users.len());
    Ok(())
}

/// `lpg users update <id> [--username <name>] [--role <role>]`
pub async fn update(ctx: &Context, id: String, patch: &UserPatch) -> Result<(), CliError> {
    ctx.require_session().await?;
    let user = ctx.client.update_user(&UserId::new(id), patch).await?;
    println!("Updated {} ({})", user.username, user.role);
    Ok(())
}

/// `lpg users delete <id>`
pub async fn delete(ctx: &Context, id: String) -> Result<(), CliError> {
    ctx.require_session().await?;
    let id = UserId::new(id);
    ctx.client.delete_user(&id).await?;
    println!("Deleted user {id}");
    Ok(())
}
