use serde::Serialize;
use tickr_core::{User, UtcDateTime};

use crate::cli::{LoginArgs, RegisterArgs, WhoamiArgs};
use crate::error::CliError;

use super::{CommandResult, Context};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionData<'a> {
    user: &'a User,
    expires_at: Option<UtcDateTime>,
}

pub async fn login(context: &mut Context, args: &LoginArgs) -> Result<CommandResult, CliError> {
    if !context.session.login(&args.email, &args.password).await {
        return Err(auth_failure(context));
    }
    session_result(context)
}

pub async fn register(
    context: &mut Context,
    args: &RegisterArgs,
) -> Result<CommandResult, CliError> {
    let registered = context
        .session
        .register(&args.name, &args.email, &args.password)
        .await;
    if !registered {
        return Err(auth_failure(context));
    }
    session_result(context)
}

pub fn logout(context: &mut Context) -> CommandResult {
    let was_logged_in = context.session.user().is_some();
    context.session.logout();
    CommandResult::ok(serde_json::json!({ "loggedOut": was_logged_in }))
        .with_lines(vec![String::from("Logged out.")])
}

pub async fn whoami(context: &Context, args: &WhoamiArgs) -> Result<CommandResult, CliError> {
    context.require_login()?;
    if args.remote {
        let user = context.gateway.current_user().await?;
        let lines = vec![format!("{} <{}>", user.name, user.email)];
        return Ok(CommandResult::ok(serde_json::to_value(&user)?).with_lines(lines));
    }
    session_result(context)
}

fn session_result(context: &Context) -> Result<CommandResult, CliError> {
    let user = context
        .session
        .user()
        .ok_or_else(|| CliError::Auth(String::from("no active session")))?;
    let data = serde_json::to_value(SessionData {
        user,
        expires_at: context.session.expires_at(),
    })?;
    let lines = vec![format!("Signed in as {} <{}>", user.name, user.email)];
    Ok(CommandResult::ok(data).with_lines(lines))
}

fn auth_failure(context: &Context) -> CliError {
    CliError::Auth(
        context
            .session
            .last_error()
            .unwrap_or("authentication failed")
            .to_owned(),
    )
}
