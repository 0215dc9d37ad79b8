use crate::{
    cli::actions::{Action, Context},
    error::AuthError,
    flow::LoginState,
    models::{CreateUser, UpdateUser, UserProfile},
    notify::Severity,
    schema::registry,
};
use anyhow::{anyhow, Result};
use secrecy::ExposeSecret;
use serde_json::json;

pub(crate) fn print_profile(user: &UserProfile) {
    println!("id:         {}", user.id);
    println!("username:   {}", user.username);
    println!("email:      {}", user.email);
    println!("avatar:     {}", user.avatar.as_deref().unwrap_or("-"));
    println!("2fa:        {}", if user.two_fa { "enabled" } else { "disabled" });
    println!("created at: {}", user.created_at);
}

fn report_state(context: &Context, state: &LoginState) {
    match state {
        LoginState::Authenticated(user) => {
            context.announce(format!("Logged in as {}", user.username), Severity::Success);
        }
        LoginState::CredentialsAccepted { session_token } => {
            context.announce(
                "Two-factor code required, run `idgate code`",
                Severity::Info,
            );
            println!("session token: {}", session_token.expose_secret());
        }
        LoginState::Anonymous => context.announce("Logged out", Severity::Info),
    }
}

/// Handle account actions
pub async fn handle(action: Action, context: &Context) -> Result<()> {
    match action {
        Action::Register {
            username,
            email,
            avatar,
            password,
            confirm_password,
        } => {
            let form = json!({
                "username": username,
                "email": email,
                "avatar": avatar,
                "password": password.expose_secret(),
                "confirmPassword": confirm_password.expose_secret(),
            });
            let user: CreateUser = registry::create_user_form()
                .parse(&form)
                .map_err(AuthError::invalid_request)?;
            let profile = context.gateway.register(&user).await?;
            context.announce(
                format!("Account {} created, you can now log in", profile.username),
                Severity::Success,
            );
        }
        Action::Login {
            identifier,
            password,
        } => {
            let state = context
                .flow
                .login(&identifier, password.expose_secret())
                .await?;
            report_state(context, &state);
        }
        Action::Code {
            session_token,
            code,
        } => {
            let state = context.flow.submit_code(&session_token, &code).await?;
            report_state(context, &state);
        }
        Action::Logout => {
            let state = context.flow.logout().await?;
            report_state(context, &state);
        }
        Action::Me => {
            let user = context.gateway.profile().await?;
            print_profile(&user);
        }
        Action::UpdateProfile {
            username,
            email,
            avatar,
            clear_avatar,
        } => {
            let current = context.gateway.profile().await?;
            let avatar = if clear_avatar {
                None
            } else {
                avatar.or(current.avatar)
            };
            let update = UpdateUser {
                username: username.unwrap_or(current.username),
                email: email.unwrap_or(current.email),
                avatar,
            };
            let user = context.gateway.update_profile(&update).await?;
            context.announce("Profile updated", Severity::Success);
            print_profile(&user);
        }
        Action::Password {
            old_password,
            new_password,
            confirm_password,
        } => {
            let form = json!({
                "oldPassword": old_password.expose_secret(),
                "newPassword": new_password.expose_secret(),
                "confirmNewPassword": confirm_password.expose_secret(),
            });
            let passwords = registry::update_password_form()
                .validate(&form)
                .map_err(AuthError::invalid_request)?;
            let (Some(old), Some(new)) = (
                passwords["oldPassword"].as_str(),
                passwords["newPassword"].as_str(),
            ) else {
                return Err(anyhow!("password form lost its fields"));
            };
            context.flow.change_password(old, new).await?;
            context.announce("Password changed", Severity::Success);
        }
        Action::DeleteAccount => {
            context.flow.delete_account().await?;
            context.announce("Account deleted", Severity::Success);
        }
        _ => return Err(anyhow!("not an account action")),
    }

    Ok(())
}
