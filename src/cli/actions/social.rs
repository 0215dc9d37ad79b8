use crate::{
    cli::actions::{Action, Context},
    error::AuthError,
    models::AddFriend,
    notify::Severity,
    schema::registry,
};
use anyhow::{anyhow, Result};
use serde_json::json;

/// Handle user directory and friend actions
pub async fn handle(action: Action, context: &Context) -> Result<()> {
    match action {
        Action::Users => {
            for user in context.gateway.users().await? {
                println!("{:>6}  {}", user.id, user.username);
            }
        }
        Action::Friends => {
            let friends = context.gateway.friends().await?;
            if friends.is_empty() {
                context.announce("No friends yet", Severity::Info);
            }
            for friend in friends {
                let status = if friend.online { "online" } else { "offline" };
                println!("{:>6}  {:<20} {status}", friend.user.id, friend.user.username);
            }
        }
        Action::AddFriend { username } => {
            let form = registry::add_friend_form()
                .validate(&json!({ "username": username }))
                .map_err(AuthError::invalid_request)?;
            let username = form["username"].as_str().unwrap_or_default();

            let user = context
                .gateway
                .users()
                .await?
                .into_iter()
                .find(|user| user.username == username)
                .ok_or_else(|| anyhow!("User {username} not found"))?;

            context
                .gateway
                .add_friend(&AddFriend { user_id: user.id })
                .await?;
            context.announce(format!("{} added as a friend", user.username), Severity::Success);
        }
        _ => return Err(anyhow!("not a social action")),
    }

    Ok(())
}
