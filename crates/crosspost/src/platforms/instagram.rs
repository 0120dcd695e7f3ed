//! Instagram poster. Instagram refuses text-only posts.

use std::time::Duration;

use async_trait::async_trait;

use super::{common_popups, ensure_exists, Platform, PostContent, Poster, PosterContext};
use crate::browser::Locator;
use crate::config::{Credentials, Login};
use crate::error::PosterError;
use crate::executor::Action;

const LOGIN_URL: &str = "https://www.instagram.com/accounts/login/";
const HOME_URL: &str = "https://www.instagram.com/";

const CHALLENGE_MARKERS: &[&str] = &["challenge", "suspicious"];

/// Publishes on instagram.com.
pub struct InstagramPoster {
    login: Option<Login>,
}

impl InstagramPoster {
    /// Create a poster from the configured credentials.
    #[must_use]
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            login: credentials.instagram.clone(),
        }
    }

    fn popups() -> Vec<Locator> {
        let mut popups = common_popups();
        popups.extend([
            Locator::text("button", "Plus tard"),
            Locator::text("button", "Cancel"),
            Locator::text("button", "Annuler"),
        ]);
        popups
    }

    fn cookie_banner() -> Action {
        Action::click("cookie banner")
            .candidates([
                Locator::text("button", "Accept"),
                Locator::text("button", "Accepter"),
                Locator::text("button", "Allow"),
                Locator::text("button", "Autoriser"),
            ])
            .timeout(Duration::from_secs(2))
    }

    fn next_button(timeout: Duration) -> Action {
        Action::click("next button")
            .candidates([
                Locator::text("button", "Next"),
                Locator::text("button", "Suivant"),
                Locator::aria("Next"),
                Locator::aria("Suivant"),
            ])
            .timeout(timeout)
    }
}

#[async_trait]
impl Poster for InstagramPoster {
    fn platform(&self) -> Platform {
        Platform::Instagram
    }

    fn entry_url(&self) -> &'static str {
        HOME_URL
    }

    async fn check_logged_in(&self, ctx: &PosterContext<'_>) -> Result<bool, PosterError> {
        ctx.page.goto(HOME_URL).await?;
        ctx.executor.pause().await;
        ctx.dismiss(&Self::popups()).await;

        if ctx.url().await.contains("login") {
            return Ok(false);
        }
        let indicators = [
            Locator::css("svg[aria-label=\"New post\"]"),
            Locator::css("svg[aria-label=\"Nouvelle publication\"]"),
            Locator::aria("Home"),
            Locator::aria("Accueil"),
            Locator::css("a[href*=\"/direct/inbox\"]"),
        ];
        Ok(ctx.executor.any_present(ctx.page, &indicators).await)
    }

    async fn login(&self, ctx: &PosterContext<'_>) -> Result<(), PosterError> {
        let login = self.login.as_ref().ok_or_else(|| {
            PosterError::MissingCredentials(Platform::Instagram.display_name().to_string())
        })?;
        tracing::info!("Logging in to Instagram");

        ctx.page.goto(LOGIN_URL).await?;
        ctx.executor.pause().await;
        if ctx.try_act(&Self::cookie_banner()).await.is_some() {
            ctx.executor.pause().await;
        }

        ctx.act(
            &Action::type_text("username field", &login.username)
                .candidates([Locator::css("input[name=\"username\"]")]),
        )
        .await?;
        ctx.executor.pause().await;
        ctx.act(
            &Action::type_text("password field", &login.password)
                .candidates([Locator::css("input[name=\"password\"]")]),
        )
        .await?;
        ctx.executor.pause().await;
        ctx.act(&Action::click("login button").candidates([Locator::css("button[type=\"submit\"]")]))
            .await?;
        ctx.executor.settle().await;

        ctx.detect_challenge(CHALLENGE_MARKERS).await?;
        ctx.dismiss(&Self::popups()).await;

        // "Save your login info?" shows up a moment later.
        ctx.executor.pause().await;
        ctx.try_act(
            &Action::click("save login info")
                .candidates([
                    Locator::text("button", "Not Now"),
                    Locator::text("button", "Pas maintenant"),
                ])
                .timeout(Duration::from_secs(3)),
        )
        .await;

        ctx.executor.pause().await;
        if self.check_logged_in(ctx).await? {
            tracing::info!("Instagram login succeeded");
            Ok(())
        } else {
            Err(PosterError::LoginFailed(
                "Instagram still shows the login page".to_string(),
            ))
        }
    }

    async fn publish(
        &self,
        ctx: &PosterContext<'_>,
        content: &PostContent,
    ) -> Result<(), PosterError> {
        let media = content
            .media()
            .ok_or_else(|| PosterError::MissingMedia(Platform::Instagram.display_name().to_string()))?
            .to_path_buf();
        ensure_exists(&media)?;

        ctx.page.goto(HOME_URL).await?;
        ctx.executor.settle().await;
        ctx.dismiss(&Self::popups()).await;

        ctx.act(
            &Action::click("create button")
                .candidates([
                    Locator::css("svg[aria-label=\"New post\"]"),
                    Locator::css("svg[aria-label=\"Nouvelle publication\"]"),
                    Locator::aria("Create"),
                    Locator::aria("Créer"),
                    Locator::css("a[href=\"/create/select/\"]"),
                    Locator::text("span", "Créer"),
                    Locator::text("span", "Create"),
                ])
                .timeout(Duration::from_secs(2)),
        )
        .await?;
        ctx.executor.pause().await;

        // Newer layouts ask "Post / Reel / Live" first.
        if ctx
            .try_act(
                &Action::click("post option")
                    .candidates([
                        Locator::text("button", "Post"),
                        Locator::text("button", "Publication"),
                    ])
                    .timeout(Duration::from_secs(2)),
            )
            .await
            .is_some()
        {
            ctx.executor.pause().await;
        }

        if content.media_is_video() {
            let script = r#"(function () {
                const input = document.querySelector('input[type="file"]');
                if (input) input.setAttribute('accept', 'video/*');
                return !!input;
            })()"#;
            if let Err(e) = ctx.page.evaluate(script).await {
                tracing::debug!(error = %e, "Could not widen file input accept attribute");
            }
        }

        ctx.act(
            &Action::attach("media input", vec![media])
                .candidates([Locator::css("input[type=\"file\"]")]),
        )
        .await?;
        ctx.executor.settle().await;

        // Crop, then filters.
        ctx.try_act(&Self::next_button(Duration::from_secs(5))).await;
        ctx.executor.pause().await;
        ctx.try_act(&Self::next_button(Duration::from_secs(3))).await;
        ctx.executor.pause().await;

        if !content.text.is_empty() {
            ctx.act(&Action::type_text("caption field", &content.text).candidates([
                Locator::css("textarea[aria-label*=\"caption\"]"),
                Locator::css("textarea[aria-label*=\"légende\"]"),
                Locator::css("textarea[placeholder*=\"Write a caption\"]"),
                Locator::css("textarea[placeholder*=\"Écrivez une légende\"]"),
                Locator::css("[contenteditable=\"true\"]"),
            ]))
            .await?;
            ctx.executor.pause().await;
        }

        ctx.act(
            &Action::click("share button")
                .candidates([
                    Locator::text("button", "Share"),
                    Locator::text("button", "Partager"),
                    Locator::aria("Share"),
                    Locator::aria("Partager"),
                ])
                .timeout(Duration::from_secs(3))
                .fallback(["Share", "Partager"]),
        )
        .await?;
        ctx.executor.settle().await;
        ctx.executor.settle().await;

        let shared = [
            Locator::text("span", "Your post has been shared"),
            Locator::text("span", "Votre publication a été partagée"),
            Locator::text("span", "Post shared"),
        ];
        if ctx
            .executor
            .any_visible(ctx.page, &shared, Duration::from_secs(5))
            .await
        {
            tracing::info!("Instagram confirmation message detected");
        }

        ctx.screenshot("published").await;
        tracing::info!("Instagram publish finished");
        Ok(())
    }
}
