//! Named schemas for every request, response and form payload of the users API.
//!
//! Each accessor returns a process-wide schema built on first use.

use super::{ObjectSchema, Schema, StringRule};
use std::sync::LazyLock;

/// Literal carried by the pending-login body of a 428 response.
pub const TWO_FA_REQUIRED: &str = "2FA_REQUIRED";

fn username() -> StringRule {
    StringRule::default()
        .trim()
        .min(3)
        .max(50)
        .refine(
            |value| !value.chars().any(char::is_whitespace),
            "Username cannot contain spaces",
        )
        .pattern(
            r"^[a-zA-Z0-9._-]+$",
            "Username may only contain letters, numbers, \".\", \"_\" or \"-\"",
        )
}

fn password() -> StringRule {
    StringRule::default().trim().min(3).max(20).pattern(
        r"^[A-Za-z0-9,.#$%@^;|_!*&?]+$",
        "Password may only contain letters, numbers, and the following symbols: ,.#$%@^;|_!*&?",
    )
}

fn email() -> StringRule {
    StringRule::default().trim().email()
}

fn url() -> StringRule {
    StringRule::default().trim().url()
}

fn two_fa_code() -> StringRule {
    StringRule::default()
        .trim()
        .exact(6)
        .pattern(r"^[0-9]+$", "Code may only contain digits")
}

fn opaque_token() -> StringRule {
    StringRule::default().min(1)
}

fn user_fields() -> ObjectSchema {
    ObjectSchema::new()
        .field("username", username())
        .field("email", email())
        .field("avatar", Schema::optional(url()))
}

fn profile_fields() -> ObjectSchema {
    ObjectSchema::new()
        .field("id", Schema::Integer)
        .field("twoFa", Schema::Boolean)
        .field("email", email())
        .field(
            "googleOauthId",
            Schema::optional(StringRule::default().trim()),
        )
        .field("createdAt", Schema::Integer)
}

fn create_user_fields() -> ObjectSchema {
    user_fields().field("password", password())
}

fn update_password_fields() -> ObjectSchema {
    ObjectSchema::new()
        .field("oldPassword", password())
        .field("newPassword", password())
}

fn user_without_token_fields() -> ObjectSchema {
    user_fields().merge(profile_fields())
}

fn user_summary_fields() -> ObjectSchema {
    ObjectSchema::new()
        .field("id", Schema::Integer)
        .field("username", username())
        .field("avatar", Schema::nullable(url()))
}

macro_rules! registry {
    ($($(#[$meta:meta])* $name:ident => $build:expr;)+) => {
        $(
            $(#[$meta])*
            pub fn $name() -> &'static Schema {
                static SCHEMA: LazyLock<Schema> = LazyLock::new(|| $build);
                &SCHEMA
            }
        )+
    };
}

registry! {
    /// Public profile fields a user may edit.
    user => user_fields().into();
    create_user => create_user_fields().into();
    /// Registration form: `confirmPassword` must equal `password`.
    create_user_form => create_user_fields()
        .field("confirmPassword", StringRule::default().trim())
        .refine("confirmPassword", "Passwords do not match", |fields| {
            fields.get("password") == fields.get("confirmPassword")
        })
        .into();
    update_password => update_password_fields().into();
    update_password_form => update_password_fields()
        .field("confirmNewPassword", StringRule::default().trim())
        .refine("confirmNewPassword", "New passwords do not match", |fields| {
            fields.get("newPassword") == fields.get("confirmNewPassword")
        })
        .refine(
            "newPassword",
            "New password must be different from old password",
            |fields| fields.get("oldPassword") != fields.get("newPassword"),
        )
        .into();
    login_by_username => ObjectSchema::new()
        .field("username", username())
        .field("password", password())
        .into();
    login_by_email => ObjectSchema::new()
        .field("email", email())
        .field("password", password())
        .into();
    /// Identifier is a username or an email address.
    login_by_identifier => ObjectSchema::new()
        .field(
            "identifier",
            Schema::union(vec![username().into(), email().into()]),
        )
        .field("password", password())
        .into();
    user_without_token => user_without_token_fields().into();
    user_with_token => user_without_token_fields()
        .field("token", opaque_token())
        .into();
    update_user => user_fields().into();
    update_avatar_form => ObjectSchema::new()
        .field("avatar", Schema::nullable(url()))
        .into();
    username_request => ObjectSchema::new().field("username", username()).into();
    user_summary => user_summary_fields().into();
    users => Schema::array(user_summary_fields());
    two_fa_setup => ObjectSchema::new()
        .field("twoFaSecret", opaque_token())
        .field("setupToken", opaque_token())
        .field("twoFaUri", opaque_token())
        .into();
    two_fa_confirm_form => ObjectSchema::new().field("twoFaCode", two_fa_code()).into();
    two_fa_confirm => ObjectSchema::new()
        .field("twoFaCode", two_fa_code())
        .field("setupToken", opaque_token())
        .into();
    two_fa_disable => ObjectSchema::new().field("password", password()).into();
    two_fa_challenge => ObjectSchema::new()
        .field("twoFaCode", two_fa_code())
        .field("sessionToken", opaque_token())
        .into();
    /// Body of the 428 response to a login that needs a second factor.
    two_fa_pending => ObjectSchema::new()
        .field("message", Schema::Literal(TWO_FA_REQUIRED))
        .field("sessionToken", opaque_token())
        .into();
    friend => user_summary_fields().field("online", Schema::Boolean).into();
    friends => Schema::array(user_summary_fields().field("online", Schema::Boolean));
    add_friend => ObjectSchema::new().field("userId", Schema::Integer).into();
    add_friend_form => ObjectSchema::new().field("username", username()).into();
    validate_session => ObjectSchema::new().field("userId", Schema::Integer).into();
    /// Error body the server sends with non-2xx responses.
    error_body => ObjectSchema::new().field("error", StringRule::default()).into();
}
