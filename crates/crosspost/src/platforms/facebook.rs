//! Facebook poster, on the profile or on a managed page.

use std::time::Duration;

use async_trait::async_trait;

use super::{common_popups, ensure_exists, Platform, PostContent, Poster, PosterContext};
use crate::browser::Locator;
use crate::config::{Credentials, Login};
use crate::error::PosterError;
use crate::executor::Action;

const LOGIN_URL: &str = "https://www.facebook.com/login";
const HOME_URL: &str = "https://www.facebook.com/";
const PAGES_URL: &str = "https://www.facebook.com/pages/?category=your_pages";

const CHALLENGE_MARKERS: &[&str] = &["checkpoint", "challenge", "two_step_verification"];

/// Publishes on facebook.com.
pub struct FacebookPoster {
    login: Option<Login>,
    page_name: Option<String>,
}

impl FacebookPoster {
    /// Create a poster from the configured credentials.
    #[must_use]
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            login: credentials.facebook.clone(),
            page_name: credentials.facebook_page_name.clone(),
        }
    }

    fn popups() -> Vec<Locator> {
        let mut popups = vec![
            Locator::css("button[data-cookiebanner=\"accept_button\"]"),
            Locator::text("button", "Allow"),
            Locator::text("button", "Autoriser"),
            Locator::css("div[aria-label=\"Close\"]"),
        ];
        popups.extend(common_popups());
        popups
    }

    /// Open the managed page when one is configured. Falls back to the profile.
    async fn open_target(&self, ctx: &PosterContext<'_>) -> Result<(), PosterError> {
        let Some(name) = &self.page_name else {
            ctx.page.goto(HOME_URL).await?;
            return Ok(());
        };

        tracing::info!(page = %name, "Opening Facebook page");
        ctx.page.goto(PAGES_URL).await?;
        ctx.executor.pause().await;

        let link = Action::click("page link")
            .candidates([Locator::text("a", name)])
            .timeout(Duration::from_secs(5));
        if ctx.try_act(&link).await.is_some() {
            ctx.executor.pause().await;
            tracing::info!(page = %name, "Facebook page selected");
        } else {
            tracing::warn!(page = %name, "Facebook page not found, posting on the profile");
            ctx.page.goto(HOME_URL).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Poster for FacebookPoster {
    fn platform(&self) -> Platform {
        Platform::Facebook
    }

    fn entry_url(&self) -> &'static str {
        HOME_URL
    }

    async fn check_logged_in(&self, ctx: &PosterContext<'_>) -> Result<bool, PosterError> {
        ctx.page.goto(HOME_URL).await?;
        ctx.executor.pause().await;
        ctx.dismiss(&Self::popups()).await;

        let url = ctx.url().await;
        if url.contains("login") || url.contains("checkpoint") {
            return Ok(false);
        }
        let indicators = [
            Locator::aria("Create a post"),
            Locator::aria("Créer une publication"),
            Locator::aria("Your profile"),
            Locator::aria("Votre profil"),
            Locator::aria("Account"),
            Locator::aria("Compte"),
            Locator::css("div[role=\"navigation\"]"),
        ];
        Ok(ctx.executor.any_present(ctx.page, &indicators).await)
    }

    async fn login(&self, ctx: &PosterContext<'_>) -> Result<(), PosterError> {
        let login = self.login.as_ref().ok_or_else(|| {
            PosterError::MissingCredentials(Platform::Facebook.display_name().to_string())
        })?;
        tracing::info!("Logging in to Facebook");

        ctx.page.goto(LOGIN_URL).await?;
        ctx.executor.pause().await;
        let cookies = Action::click("cookie banner")
            .candidates([
                Locator::css("button[data-cookiebanner=\"accept_button\"]"),
                Locator::text("button", "Accept All"),
                Locator::text("button", "Tout accepter"),
                Locator::text("button", "Allow"),
            ])
            .timeout(Duration::from_secs(2));
        if ctx.try_act(&cookies).await.is_some() {
            ctx.executor.pause().await;
        }

        ctx.act(&Action::type_text("email field", &login.username).candidates([Locator::css("#email")]))
            .await?;
        ctx.executor.pause().await;
        ctx.act(&Action::type_text("password field", &login.password).candidates([Locator::css("#pass")]))
            .await?;
        ctx.executor.pause().await;
        ctx.act(&Action::click("login button").candidates([
            Locator::css("button[name=\"login\"]"),
            Locator::css("button[type=\"submit\"]"),
            Locator::css("#loginbutton"),
        ]))
        .await?;
        ctx.executor.settle().await;

        ctx.detect_challenge(CHALLENGE_MARKERS).await?;
        ctx.dismiss(&Self::popups()).await;

        ctx.executor.pause().await;
        if self.check_logged_in(ctx).await? {
            tracing::info!("Facebook login succeeded");
            Ok(())
        } else {
            Err(PosterError::LoginFailed(
                "Facebook still shows the login page".to_string(),
            ))
        }
    }

    async fn publish(
        &self,
        ctx: &PosterContext<'_>,
        content: &PostContent,
    ) -> Result<(), PosterError> {
        self.open_target(ctx).await?;
        ctx.executor.settle().await;
        ctx.dismiss(&Self::popups()).await;

        ctx.act(
            &Action::click("create post")
                .candidates([
                    Locator::aria("Create a post"),
                    Locator::aria("Créer une publication"),
                    Locator::text("div[role=\"button\"]", "What's on your mind"),
                    Locator::text("div[role=\"button\"]", "À quoi pensez-vous"),
                    Locator::text("div[role=\"button\"]", "Quoi de neuf"),
                    Locator::text("span", "What's on your mind"),
                    Locator::text("span", "À quoi pensez-vous"),
                ])
                .timeout(Duration::from_secs(3)),
        )
        .await?;
        ctx.executor.pause().await;

        ctx.act(&Action::type_text("post text", &content.text).candidates([
            Locator::css("div[contenteditable=\"true\"][role=\"textbox\"]"),
            Locator::css("div[aria-label*=\"What's on your mind\"]"),
            Locator::css("div[aria-label*=\"quoi pensez-vous\"]"),
            Locator::css("div[data-contents=\"true\"]"),
        ]))
        .await?;
        ctx.executor.pause().await;

        if let Some(image) = &content.image {
            ensure_exists(image)?;
            tracing::info!(path = %image.display(), "Attaching image");
            let opened = ctx
                .try_act(
                    &Action::click("photo/video button")
                        .candidates([
                            Locator::aria("Photo/video"),
                            Locator::aria("Photo/vidéo"),
                            Locator::css("div[role=\"button\"]:has(svg[mask*=\"photo\"])"),
                        ])
                        .timeout(Duration::from_secs(3)),
                )
                .await;
            if opened.is_some() {
                ctx.executor.pause().await;
            } else {
                tracing::warn!("Media button not found, trying the file input directly");
            }
            let attach = Action::attach("image input", vec![image.clone()]).candidates([
                Locator::css("input[type=\"file\"][accept*=\"image\"]"),
                Locator::css("input[type=\"file\"]"),
            ]);
            if ctx.try_act(&attach).await.is_some() {
                ctx.executor.settle().await;
                tracing::info!("Image attached");
            } else {
                tracing::warn!("File input not found, posting without image");
            }
        } else if let Some(video) = &content.video {
            ensure_exists(video)?;
            tracing::info!(path = %video.display(), "Attaching video");
            let attach = Action::attach("video input", vec![video.clone()]).candidates([
                Locator::css("input[type=\"file\"][accept*=\"video\"]"),
                Locator::css("input[type=\"file\"]"),
            ]);
            if ctx.try_act(&attach).await.is_some() {
                ctx.executor.settle().await;
                ctx.executor.settle().await;
                tracing::info!("Video attached");
            } else {
                tracing::warn!("File input not found, posting without video");
            }
        }
        ctx.executor.pause().await;

        // The composer dialog renders above the feed, so its button is the last match.
        ctx.act(
            &Action::click("post button")
                .candidates([
                    Locator::css("div[aria-label=\"Post\"][role=\"button\"]").last(),
                    Locator::css("div[aria-label=\"Publier\"][role=\"button\"]").last(),
                    Locator::text("span", "Post").last(),
                    Locator::text("span", "Publier").last(),
                ])
                .timeout(Duration::from_secs(3))
                .fallback(["Post", "Publier"]),
        )
        .await?;
        ctx.executor.settle().await;
        ctx.executor.settle().await;

        ctx.screenshot("published").await;
        tracing::info!("Facebook publish finished");
        Ok(())
    }
}
