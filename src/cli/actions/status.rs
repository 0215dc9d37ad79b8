use crate::{
    cli::actions::{Action, Context},
    notify::Severity,
    GIT_COMMIT_HASH,
};
use anyhow::{anyhow, Result};

/// Handle session and upstream status actions
pub async fn handle(action: Action, context: &Context) -> Result<()> {
    match action {
        Action::Validate => {
            let check = context.gateway.validate_session().await?;
            match context.session.user() {
                Some(user) if user.id == check.user_id => {
                    context.announce(
                        format!("Session valid for {}", user.username),
                        Severity::Success,
                    );
                }
                _ => {
                    context.announce(
                        format!("Token belongs to user {}", check.user_id),
                        Severity::Info,
                    );
                }
            }
        }
        Action::Health => {
            println!(
                "idgate {} ({GIT_COMMIT_HASH})",
                env!("CARGO_PKG_VERSION")
            );
            if context.gateway.health().await {
                context.announce("API is reachable", Severity::Success);
            } else {
                return Err(anyhow!("API is unreachable"));
            }
        }
        _ => return Err(anyhow!("not a status action")),
    }

    Ok(())
}
