//! LinkedIn poster.

use std::time::Duration;

use async_trait::async_trait;

use super::{ensure_exists, google, Platform, PostContent, Poster, PosterContext};
use crate::browser::{Locator, Probe};
use crate::config::{Credentials, Login};
use crate::error::{ActionError, PosterError};
use crate::executor::Action;

const LOGIN_URL: &str = "https://www.linkedin.com/login";
const FEED_URL: &str = "https://www.linkedin.com/feed/";

const CHALLENGE_MARKERS: &[&str] = &["checkpoint", "challenge"];

/// Publishes on the LinkedIn feed.
pub struct LinkedInPoster {
    login: Option<Login>,
    google: Option<Login>,
}

impl LinkedInPoster {
    /// Create a poster from the configured credentials.
    #[must_use]
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            login: credentials.linkedin.clone(),
            google: credentials.google_for(Platform::LinkedIn).cloned(),
        }
    }

    fn feed_indicators() -> Vec<Locator> {
        vec![
            Locator::css("button[aria-label*=\"Start a post\"]"),
            Locator::css(".share-box-feed-entry__trigger"),
        ]
    }

    async fn login_with_password(
        &self,
        ctx: &PosterContext<'_>,
        login: &Login,
    ) -> Result<(), PosterError> {
        if !ctx.url().await.contains("login") {
            ctx.page.goto(LOGIN_URL).await?;
            ctx.executor.pause().await;
        }

        ctx.act(
            &Action::fill("email field", &login.username).candidates([Locator::css("#username")]),
        )
        .await?;
        ctx.executor.pause().await;
        ctx.act(
            &Action::fill("password field", &login.password)
                .candidates([Locator::css("#password")]),
        )
        .await?;
        ctx.executor.pause().await;
        ctx.act(&Action::click("sign in button").candidates([Locator::css("button[type=\"submit\"]")]))
            .await?;
        ctx.executor.settle().await;
        Ok(())
    }

    async fn form_error(&self, ctx: &PosterContext<'_>) -> Option<String> {
        let errors = Locator::css("#error-for-username, #error-for-password, .form__label--error");
        match ctx.page.find(&errors, Probe::ATTACHED).await {
            Ok(Some(handle)) => ctx
                .page
                .text_of(&handle)
                .await
                .ok()
                .flatten()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            Ok(None) => None,
            Err(e) => {
                tracing::debug!(error = %e, "Form error lookup failed");
                None
            }
        }
    }
}

#[async_trait]
impl Poster for LinkedInPoster {
    fn platform(&self) -> Platform {
        Platform::LinkedIn
    }

    fn entry_url(&self) -> &'static str {
        FEED_URL
    }

    async fn check_logged_in(&self, ctx: &PosterContext<'_>) -> Result<bool, PosterError> {
        ctx.page.goto(FEED_URL).await?;
        ctx.executor.pause().await;

        let url = ctx.url().await;
        if url.contains("login") || url.contains("checkpoint") {
            return Ok(false);
        }
        Ok(ctx.executor.any_present(ctx.page, &Self::feed_indicators()).await)
    }

    async fn login(&self, ctx: &PosterContext<'_>) -> Result<(), PosterError> {
        tracing::info!("Logging in to LinkedIn");
        match (&self.login, &self.google) {
            (Some(login), _) => self.login_with_password(ctx, login).await?,
            (None, Some(google_login)) => {
                let mut candidates = vec![Locator::css("button[data-litms-control-urn*=\"google\"]")];
                candidates.extend(google::continue_buttons());
                google::sign_in(ctx, google_login, LOGIN_URL, candidates).await?;
            }
            (None, None) => {
                return Err(PosterError::MissingCredentials(
                    Platform::LinkedIn.display_name().to_string(),
                ))
            }
        }

        ctx.detect_challenge(CHALLENGE_MARKERS).await?;

        if ctx.url().await.contains("feed") {
            tracing::info!("LinkedIn login succeeded");
            return Ok(());
        }
        if let Some(message) = self.form_error(ctx).await {
            return Err(PosterError::LoginFailed(message));
        }

        ctx.executor.pause().await;
        if self.check_logged_in(ctx).await? {
            tracing::info!("LinkedIn login succeeded");
            Ok(())
        } else {
            Err(PosterError::LoginFailed(
                "feed not reachable after sign in".to_string(),
            ))
        }
    }

    async fn publish(
        &self,
        ctx: &PosterContext<'_>,
        content: &PostContent,
    ) -> Result<(), PosterError> {
        ctx.page.goto(FEED_URL).await?;
        ctx.executor.settle().await;

        ctx.act(
            &Action::click("start a post")
                .candidates([
                    Locator::css("button[aria-label*=\"Start a post\"]"),
                    Locator::css("button[aria-label*=\"Commencer un post\"]"),
                    Locator::css(".share-box-feed-entry__trigger"),
                    Locator::css("[data-control-name=\"share_box_feed\"]"),
                    Locator::text("button", "Commencer un post"),
                ])
                .fallback(["Start a post", "Commencer un post"]),
        )
        .await?;
        ctx.executor.pause().await;

        ctx.act(&Action::type_text("post editor", &content.text).candidates([
            Locator::css(".ql-editor"),
            Locator::css("[role=\"textbox\"]"),
            Locator::css(".share-creation-state__text-editor"),
            Locator::css("[data-placeholder*=\"parler\"]"),
        ]))
        .await?;
        ctx.executor.pause().await;

        if let Some(image) = &content.image {
            ensure_exists(image)?;
            tracing::info!(path = %image.display(), "Attaching image");
            let opened = ctx
                .try_act(&Action::click("add media button").candidates([
                    Locator::css("button[aria-label*=\"Add media\"]"),
                    Locator::css("button[aria-label*=\"Ajouter un média\"]"),
                    Locator::css("button[aria-label*=\"photo\"]"),
                    Locator::css("[data-control-name=\"share_add_photo\"]"),
                ]))
                .await;
            if opened.is_some() {
                ctx.executor.pause().await;
                ctx.act(
                    &Action::attach("image input", vec![image.clone()])
                        .candidates([Locator::css("input[type=\"file\"]")]),
                )
                .await?;
                ctx.executor.settle().await;
                tracing::info!("Image attached");
            } else {
                tracing::warn!("Media button not found, posting without image");
            }
        } else if let Some(video) = &content.video {
            ensure_exists(video)?;
            tracing::info!(path = %video.display(), "Attaching video");
            let attached: Result<_, ActionError> = async {
                ctx.act(&Action::click("add video button").candidates([
                    Locator::css("button[aria-label*=\"video\"]"),
                    Locator::css("button[aria-label*=\"vidéo\"]"),
                ]))
                .await?;
                ctx.executor.pause().await;
                ctx.act(
                    &Action::attach("video input", vec![video.clone()])
                        .candidates([Locator::css("input[type=\"file\"]")]),
                )
                .await
            }
            .await;
            match attached {
                Ok(_) => {
                    ctx.executor.settle().await;
                    ctx.executor.settle().await;
                    tracing::info!("Video attached");
                }
                Err(e) => tracing::warn!(error = %e, "Video attach failed, posting without video"),
            }
        }
        ctx.executor.pause().await;

        ctx.act(
            &Action::click("publish button")
                .candidates([
                    Locator::css("button.share-actions__primary-action"),
                    Locator::css("button[aria-label*=\"Post\"]"),
                    Locator::css("button[aria-label*=\"Publier\"]"),
                    Locator::text("button", "Publier"),
                    Locator::text("button", "Post"),
                ])
                .timeout(Duration::from_secs(3))
                .require_enabled(),
        )
        .await?;
        ctx.executor.settle().await;
        ctx.executor.pause().await;

        ctx.screenshot("published").await;
        tracing::info!("LinkedIn publish finished");
        Ok(())
    }
}
