//! X (Twitter) poster.

use std::time::Duration;

use async_trait::async_trait;

use super::{common_popups, ensure_exists, google, Platform, PostContent, Poster, PosterContext};
use crate::browser::Locator;
use crate::config::{Credentials, Login};
use crate::error::PosterError;
use crate::executor::Action;
use crate::post::truncate_for_twitter;

const LOGIN_URL: &str = "https://x.com/i/flow/login";
const HOME_URL: &str = "https://x.com/home";

/// Character limit of a post.
pub const MAX_CHARS: usize = 280;

const CHALLENGE_MARKERS: &[&str] = &["challenge", "verify", "suspicious"];

/// Publishes on x.com.
pub struct TwitterPoster {
    login: Option<Login>,
    google: Option<Login>,
    verification_email: Option<String>,
}

impl TwitterPoster {
    /// Create a poster from the configured credentials.
    #[must_use]
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            login: credentials.twitter.clone(),
            google: credentials.google_for(Platform::Twitter).cloned(),
            verification_email: credentials.twitter_email.clone(),
        }
    }

    fn popups() -> Vec<Locator> {
        let mut popups = vec![
            Locator::css("div[data-testid=\"confirmationSheetConfirm\"]"),
            Locator::text("button", "Maybe later"),
            Locator::text("button", "Skip for now"),
        ];
        popups.extend(common_popups());
        popups
    }

    fn logged_in_indicators() -> Vec<Locator> {
        vec![
            Locator::css("[data-testid=\"SideNav_NewTweet_Button\"]"),
            Locator::aria("Post"),
            Locator::aria("Poster"),
            Locator::css("[data-testid=\"tweetTextarea_0\"]"),
            Locator::css("a[href=\"/compose/tweet\"]"),
        ]
    }

    fn next_button() -> Action {
        Action::click("next button").candidates([
            Locator::text("button", "Next"),
            Locator::text("button", "Suivant"),
            Locator::text("div[role=\"button\"]", "Next"),
        ])
    }

    fn composer(text: &str) -> Action {
        Action::type_text("tweet box", text)
            .candidates([Locator::css("[data-testid=\"tweetTextarea_0\"]")])
    }

    async fn login_with_password(
        &self,
        ctx: &PosterContext<'_>,
        login: &Login,
    ) -> Result<(), PosterError> {
        ctx.page.goto(LOGIN_URL).await?;
        ctx.executor.settle().await;

        ctx.act(
            &Action::type_text("username field", &login.username).candidates([
                Locator::css("input[autocomplete=\"username\"]"),
                Locator::css("input[name=\"text\"]"),
                Locator::css("input[type=\"text\"]"),
            ]),
        )
        .await?;
        ctx.executor.pause().await;
        ctx.act(&Self::next_button()).await?;
        ctx.executor.pause().await;

        let verification = Locator::css("input[data-testid=\"ocfEnterTextTextInput\"]");
        if ctx
            .executor
            .any_visible(ctx.page, std::slice::from_ref(&verification), Duration::from_secs(2))
            .await
        {
            tracing::warn!("X asks for an additional verification");
            let answer = self
                .verification_email
                .as_deref()
                .unwrap_or(&login.username);
            ctx.act(&Action::type_text("verification field", answer).candidates([verification]))
                .await?;
            ctx.executor.pause().await;
            ctx.act(&Self::next_button()).await?;
            ctx.executor.pause().await;
        }

        ctx.act(
            &Action::type_text("password field", &login.password)
                .candidates([Locator::css("input[type=\"password\"]")])
                .timeout(Duration::from_secs(10)),
        )
        .await?;
        ctx.executor.pause().await;

        ctx.act(&Action::click("login button").candidates([
            Locator::css("button[data-testid=\"LoginForm_Login_Button\"]"),
            Locator::text("button", "Log in"),
            Locator::text("button", "Se connecter"),
        ]))
        .await?;
        ctx.executor.settle().await;
        Ok(())
    }
}

#[async_trait]
impl Poster for TwitterPoster {
    fn platform(&self) -> Platform {
        Platform::Twitter
    }

    fn entry_url(&self) -> &'static str {
        HOME_URL
    }

    async fn check_logged_in(&self, ctx: &PosterContext<'_>) -> Result<bool, PosterError> {
        ctx.page.goto(HOME_URL).await?;
        ctx.executor.pause().await;

        let url = ctx.url().await;
        if url.contains("login") || url.contains("flow") {
            return Ok(false);
        }
        Ok(ctx
            .executor
            .any_present(ctx.page, &Self::logged_in_indicators())
            .await)
    }

    async fn login(&self, ctx: &PosterContext<'_>) -> Result<(), PosterError> {
        tracing::info!("Logging in to X");
        match (&self.login, &self.google) {
            (Some(login), _) => self.login_with_password(ctx, login).await?,
            (None, Some(google_login)) => {
                google::sign_in(ctx, google_login, LOGIN_URL, google::continue_buttons()).await?;
            }
            (None, None) => {
                return Err(PosterError::MissingCredentials(
                    Platform::Twitter.display_name().to_string(),
                ))
            }
        }

        ctx.detect_challenge(CHALLENGE_MARKERS).await?;
        ctx.dismiss(&Self::popups()).await;
        ctx.executor.pause().await;

        if self.check_logged_in(ctx).await? {
            tracing::info!("X login succeeded");
            Ok(())
        } else {
            Err(PosterError::LoginFailed(
                "X still shows the login flow".to_string(),
            ))
        }
    }

    async fn publish(
        &self,
        ctx: &PosterContext<'_>,
        content: &PostContent,
    ) -> Result<(), PosterError> {
        let text = truncate_for_twitter(&content.text, MAX_CHARS);
        let original = content.text.chars().count();
        if text.chars().count() < original {
            tracing::info!(from = original, to = text.chars().count(), "Text truncated for X");
        }

        ctx.page.goto(HOME_URL).await?;
        ctx.executor.settle().await;
        ctx.dismiss(&Self::popups()).await;

        if ctx.try_act(&Self::composer(&text)).await.is_none() {
            ctx.act(&Action::click("new post button").candidates([
                Locator::css("[data-testid=\"SideNav_NewTweet_Button\"]"),
                Locator::css("a[href=\"/compose/tweet\"]"),
            ]))
            .await?;
            ctx.executor.pause().await;
            ctx.act(&Self::composer(&text)).await?;
        }
        ctx.executor.pause().await;

        let attachments = [Locator::css("[data-testid=\"attachments\"]")];
        if let Some(image) = &content.image {
            ensure_exists(image)?;
            tracing::info!(path = %image.display(), "Attaching image");
            let attached = ctx
                .try_act(
                    &Action::attach("image input", vec![image.clone()]).candidates([
                        Locator::css("[data-testid=\"fileInput\"]"),
                        Locator::css("input[type=\"file\"][accept*=\"image\"]"),
                        Locator::css("input[type=\"file\"]"),
                    ]),
                )
                .await;
            if attached.is_some() {
                ctx.executor.settle().await;
                if !ctx
                    .executor
                    .any_visible(ctx.page, &attachments, Duration::from_secs(10))
                    .await
                {
                    tracing::warn!("Image may not have finished loading");
                }
            } else {
                tracing::warn!("File input not found, posting without image");
            }
        } else if let Some(video) = &content.video {
            ensure_exists(video)?;
            tracing::info!(path = %video.display(), "Attaching video");
            let attached = ctx
                .try_act(
                    &Action::attach("video input", vec![video.clone()])
                        .candidates([Locator::css("input[type=\"file\"]")]),
                )
                .await;
            if attached.is_some() {
                ctx.executor.settle().await;
                ctx.executor.settle().await;
                if !ctx
                    .executor
                    .any_visible(ctx.page, &attachments, Duration::from_secs(60))
                    .await
                {
                    tracing::warn!("Video may not have finished processing");
                }
            } else {
                tracing::warn!("File input not found, posting without video");
            }
        }
        ctx.executor.pause().await;

        ctx.act(
            &Action::click("post button")
                .candidates([
                    Locator::css("[data-testid=\"tweetButtonInline\"]"),
                    Locator::css("[data-testid=\"tweetButton\"]"),
                    Locator::css("button[data-testid=\"tweetButtonInline\"]"),
                    Locator::css("div[data-testid=\"tweetButtonInline\"]"),
                ])
                .timeout(Duration::from_secs(3))
                .require_enabled(),
        )
        .await?;
        ctx.executor.settle().await;

        if ctx
            .executor
            .any_visible(
                ctx.page,
                &[Locator::css("[data-testid=\"toast\"]")],
                Duration::from_secs(5),
            )
            .await
        {
            tracing::info!("Confirmation toast detected");
        }

        ctx.screenshot("published").await;
        tracing::info!("X publish finished");
        Ok(())
    }
}
