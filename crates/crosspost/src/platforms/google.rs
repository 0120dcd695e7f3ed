//! "Continue with Google" sign-in shared by LinkedIn and X.

use std::time::Duration;

use super::PosterContext;
use crate::browser::Locator;
use crate::config::Login;
use crate::error::PosterError;
use crate::executor::Action;

const SIGNIN_URL: &str = "https://accounts.google.com/signin";

/// Google account security pages.
const CHALLENGE_MARKERS: &[&str] = &["challenge", "speedbump"];

/// Buttons offering Google sign-in on a platform login page.
pub(crate) fn continue_buttons() -> Vec<Locator> {
    vec![
        Locator::text("button", "Continue with Google"),
        Locator::text("button", "Continuer avec Google"),
        Locator::text("div[role=\"button\"]", "Continue with Google"),
        Locator::text("div[role=\"button\"]", "Continuer avec Google"),
        Locator::aria_contains("Google"),
    ]
}

/// Sign into Google in the current tab, then pick Google on `login_url`.
pub(crate) async fn sign_in(
    ctx: &PosterContext<'_>,
    login: &Login,
    login_url: &str,
    continue_candidates: Vec<Locator>,
) -> Result<(), PosterError> {
    tracing::info!(platform = %ctx.platform, "Signing in with Google");

    ctx.page.goto(SIGNIN_URL).await?;
    ctx.executor.settle().await;

    ctx.act(
        &Action::type_text("google email field", &login.username).candidates([
            Locator::css("input[type=\"email\"]"),
            Locator::css("#identifierId"),
        ]),
    )
    .await?;
    ctx.executor.pause().await;
    ctx.act(&Action::click("google next button").candidates([
        Locator::css("#identifierNext"),
        Locator::text("button", "Next"),
        Locator::text("button", "Suivant"),
    ]))
    .await?;
    ctx.executor.settle().await;

    ctx.act(
        &Action::type_text("google password field", &login.password)
            .candidates([
                Locator::css("input[type=\"password\"]"),
                Locator::css("input[name=\"Passwd\"]"),
            ])
            .timeout(Duration::from_secs(10)),
    )
    .await?;
    ctx.executor.pause().await;
    ctx.act(&Action::click("google password next").candidates([
        Locator::css("#passwordNext"),
        Locator::text("button", "Next"),
        Locator::text("button", "Suivant"),
    ]))
    .await?;
    ctx.executor.settle().await;
    ctx.detect_challenge(CHALLENGE_MARKERS).await?;

    ctx.page.goto(login_url).await?;
    ctx.executor.settle().await;
    ctx.act(
        &Action::click("continue with google")
            .candidates(continue_candidates)
            .fallback(["Continue with Google", "Continuer avec Google"]),
    )
    .await?;
    ctx.executor.settle().await;

    // Account chooser shows up when Google already has a session.
    let chooser = Action::click("google account chooser").candidates([Locator::css(format!(
        "div[data-identifier=\"{}\"]",
        login.username
    ))]);
    if ctx.try_act(&chooser).await.is_some() {
        ctx.executor.settle().await;
    }
    Ok(())
}
