use crate::{
    cli::actions::{Action, Context},
    notify::Severity,
};
use anyhow::{anyhow, Result};
use secrecy::ExposeSecret;

/// Handle two-factor actions
pub async fn handle(action: Action, context: &Context) -> Result<()> {
    match action {
        Action::TwoFaSetup => {
            let setup = context.flow.request_setup().await?;
            println!("secret:      {}", setup.two_fa_secret);
            println!("uri:         {}", setup.two_fa_uri);
            println!("setup token: {}", setup.setup_token);
            context.announce(
                "Add the secret to an authenticator app, then run `idgate 2fa confirm`",
                Severity::Info,
            );
        }
        Action::TwoFaConfirm { setup_token, code } => {
            context
                .flow
                .confirm_setup(setup_token.expose_secret(), &code)
                .await?;
            context.announce("Two-factor authentication enabled", Severity::Success);
        }
        Action::TwoFaDisable { password } => {
            context
                .flow
                .disable_two_factor(password.expose_secret())
                .await?;
            context.announce("Two-factor authentication disabled", Severity::Success);
        }
        _ => return Err(anyhow!("not a two-factor action")),
    }

    Ok(())
}
