//! Publish attempts driven against the scripted page.

mod common;

use common::{instant_executor, FakeElement, FakeLauncher, FakePage};
use crosspost::browser::StoredCookie;
use crosspost::config::Login;
use crosspost::platforms::{poster_for, run_attempt, AttemptOptions};
use crosspost::{Credentials, Locator, Platform, PostContent, SessionStore};
use tempfile::TempDir;

fn long_text() -> String {
    "lorem ipsum ".repeat(25).trim_end().to_string()
}

fn cookie() -> StoredCookie {
    StoredCookie {
        name: "auth_token".to_string(),
        value: "abc".to_string(),
        domain: ".x.com".to_string(),
        path: "/".to_string(),
        secure: true,
        http_only: true,
    }
}

#[tokio::test]
async fn test_twitter_publish_failure_screenshots_and_truncates() {
    let dir = TempDir::new().unwrap();
    let screenshots = dir.path().join("screenshots");
    let sessions = SessionStore::new(dir.path().join("browser_data"));
    let executor = instant_executor();

    let launcher = FakeLauncher::new(FakePage::permissive().hide_containing("tweetButton"));
    let poster = poster_for(Platform::Twitter, &Credentials::default());
    let content = PostContent {
        text: long_text(),
        ..PostContent::default()
    };
    assert!(content.text.chars().count() > 280);

    let options = AttemptOptions {
        headless: true,
        executor: &executor,
        screenshots_dir: &screenshots,
        sessions: &sessions,
    };
    let result = run_attempt(&launcher, poster.as_ref(), &content, &options).await;

    assert!(!result.success);
    let error = result.error.unwrap();
    assert!(error.contains("publish failed"), "{error}");
    assert!(error.contains("post button"), "{error}");

    let composer = Locator::css("[data-testid=\"tweetTextarea_0\"]").to_string();
    launcher.page().log(|log| {
        let typed = log.typed.get(&composer).expect("composer typed into");
        assert!(typed.chars().count() <= 280);
        assert!(typed.ends_with("..."));
        assert_eq!(log.closed, 1);
        assert!(log
            .screenshots
            .iter()
            .any(|p| p.to_string_lossy().contains("twitter_error_")));
    });

    let files: Vec<_> = std::fs::read_dir(&screenshots).unwrap().collect();
    assert_eq!(files.len(), 1);
}

#[tokio::test]
async fn test_twitter_publish_success_with_saved_session() {
    let dir = TempDir::new().unwrap();
    let sessions = SessionStore::new(dir.path());
    sessions
        .save(&crosspost::session::SessionState::new(
            Platform::Twitter,
            vec![cookie()],
        ))
        .unwrap();
    let executor = instant_executor();

    let launcher = FakeLauncher::new(FakePage::permissive());
    let poster = poster_for(Platform::Twitter, &Credentials::default());
    let content = PostContent {
        text: "Hello #world".to_string(),
        ..PostContent::default()
    };
    let options = AttemptOptions {
        headless: true,
        executor: &executor,
        screenshots_dir: dir.path(),
        sessions: &sessions,
    };

    let result = run_attempt(&launcher, poster.as_ref(), &content, &options).await;

    assert!(result.success, "{:?}", result.error);
    assert_eq!(result.platform, "twitter");
    launcher.page().log(|log| {
        assert_eq!(log.restored_cookies, vec![cookie()]);
        assert_eq!(log.visited.first().map(String::as_str), Some("https://x.com/home"));
        assert!(log
            .clicks
            .contains(&Locator::css("[data-testid=\"tweetButtonInline\"]").to_string()));
    });
}

#[tokio::test]
async fn test_login_without_credentials_fails() {
    let dir = TempDir::new().unwrap();
    let sessions = SessionStore::new(dir.path());
    let executor = instant_executor();

    // A login URL keeps the session check negative.
    let launcher = FakeLauncher::new(FakePage::strict().at_url("https://x.com/i/flow/login"));
    let poster = poster_for(Platform::Twitter, &Credentials::default());
    let options = AttemptOptions {
        headless: true,
        executor: &executor,
        screenshots_dir: dir.path(),
        sessions: &sessions,
    };

    let result = run_attempt(&launcher, poster.as_ref(), &PostContent::default(), &options).await;

    assert!(!result.success);
    assert!(!result.error.unwrap().contains("publish failed"));
    launcher.page().log(|log| assert_eq!(log.closed, 1));
}

#[tokio::test]
async fn test_browser_launch_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let sessions = SessionStore::new(dir.path());
    let executor = instant_executor();
    let launcher = FakeLauncher::failing();
    let poster = poster_for(Platform::LinkedIn, &Credentials::default());
    let options = AttemptOptions {
        headless: true,
        executor: &executor,
        screenshots_dir: dir.path(),
        sessions: &sessions,
    };

    let result = run_attempt(&launcher, poster.as_ref(), &PostContent::default(), &options).await;

    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("browser launch failed"));
    assert_eq!(launcher.launches(), 1);
}

#[tokio::test]
async fn test_instagram_without_media_fails_publish() {
    let dir = TempDir::new().unwrap();
    let sessions = SessionStore::new(dir.path());
    let executor = instant_executor();
    let launcher = FakeLauncher::new(FakePage::permissive());
    let poster = poster_for(Platform::Instagram, &Credentials::default());
    let content = PostContent {
        text: "Caption only".to_string(),
        ..PostContent::default()
    };
    let options = AttemptOptions {
        headless: true,
        executor: &executor,
        screenshots_dir: dir.path(),
        sessions: &sessions,
    };

    let result = run_attempt(&launcher, poster.as_ref(), &content, &options).await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("publish failed"));
}

#[tokio::test]
async fn test_security_challenge_stops_login() {
    let dir = TempDir::new().unwrap();
    let sessions = SessionStore::new(dir.path().join("browser_data"));
    let screenshots = dir.path().join("screenshots");
    let executor = instant_executor();

    // Hide every logged-in indicator so the session check fails.
    let page = FakePage::permissive()
        .at_url("https://x.com/account/access?challenge=1")
        .hide_containing("SideNav")
        .hide_containing("aria")
        .hide_containing("tweetTextarea")
        .hide_containing("compose");
    let launcher = FakeLauncher::new(page);
    let credentials = Credentials {
        twitter: Some(Login {
            username: "budget_famille".to_string(),
            password: "secret".to_string(),
        }),
        ..Credentials::default()
    };
    let poster = poster_for(Platform::Twitter, &credentials);
    let options = AttemptOptions {
        headless: true,
        executor: &executor,
        screenshots_dir: &screenshots,
        sessions: &sessions,
    };

    let result = run_attempt(&launcher, poster.as_ref(), &PostContent::default(), &options).await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("security challenge"));
    launcher.page().log(|log| {
        let names: Vec<String> = log
            .screenshots
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|n| n.starts_with("twitter_security_challenge_")));
        assert!(names.iter().any(|n| n.starts_with("twitter_error_")));
        assert!(log.typed.values().any(|t| t == "secret"));
    });
    // No session is saved for a failed login.
    assert!(!sessions.path_for(Platform::Twitter).exists());
}

fn login(username: &str, password: &str) -> Option<Login> {
    Some(Login {
        username: username.to_string(),
        password: password.to_string(),
    })
}

#[tokio::test]
async fn test_linkedin_google_sign_in_fallback() {
    let dir = TempDir::new().unwrap();
    let sessions = SessionStore::new(dir.path().join("browser_data"));
    let executor = instant_executor();

    let continue_button = Locator::text("button", "Continue with Google");
    let chooser = Locator::css("div[data-identifier=\"me@gmail.com\"]");
    let start_post = Locator::css("button[aria-label*=\"Start a post\"]");
    let page = FakePage::strict()
        .with(&Locator::css("input[type=\"email\"]"), FakeElement::READY)
        .with(&Locator::css("#identifierNext"), FakeElement::READY)
        .with(&Locator::css("input[type=\"password\"]"), FakeElement::READY)
        .with(&Locator::css("#passwordNext"), FakeElement::READY)
        .with(&continue_button, FakeElement::READY)
        .with(&chooser, FakeElement::READY)
        .with(&Locator::css(".ql-editor"), FakeElement::READY)
        .with(
            &Locator::css("button.share-actions__primary-action"),
            FakeElement::READY,
        )
        // The feed only shows up once the Google account is picked.
        .reveal_on_click(&chooser, &start_post)
        .with_cookies(vec![cookie()]);
    let launcher = FakeLauncher::new(page);
    let credentials = Credentials {
        google: login("me@gmail.com", "hunter2"),
        ..Credentials::default()
    };
    let poster = poster_for(Platform::LinkedIn, &credentials);
    let content = PostContent {
        text: "Budget de la semaine".to_string(),
        ..PostContent::default()
    };
    let options = AttemptOptions {
        headless: true,
        executor: &executor,
        screenshots_dir: dir.path(),
        sessions: &sessions,
    };

    let result = run_attempt(&launcher, poster.as_ref(), &content, &options).await;

    assert!(result.success, "{:?}", result.error);
    launcher.page().log(|log| {
        assert!(log
            .visited
            .iter()
            .any(|url| url == "https://accounts.google.com/signin"));
        assert!(log
            .visited
            .iter()
            .any(|url| url == "https://www.linkedin.com/login"));
        assert_eq!(
            log.typed[&Locator::css("input[type=\"email\"]").to_string()],
            "me@gmail.com"
        );
        assert_eq!(
            log.typed[&Locator::css("input[type=\"password\"]").to_string()],
            "hunter2"
        );
        let continue_at = log
            .clicks
            .iter()
            .position(|c| *c == continue_button.to_string())
            .expect("continue with google clicked");
        let chooser_at = log
            .clicks
            .iter()
            .position(|c| *c == chooser.to_string())
            .expect("account chosen");
        assert!(continue_at < chooser_at);
        assert_eq!(
            log.typed[&Locator::css(".ql-editor").to_string()],
            "Budget de la semaine"
        );
    });
    assert!(sessions.path_for(Platform::LinkedIn).exists());
}

#[tokio::test]
async fn test_linkedin_form_error_fails_login() {
    let dir = TempDir::new().unwrap();
    let sessions = SessionStore::new(dir.path().join("browser_data"));
    let executor = instant_executor();

    let page = FakePage::strict()
        .with(&Locator::css("#username"), FakeElement::READY)
        .with(&Locator::css("#password"), FakeElement::READY)
        .with(&Locator::css("button[type=\"submit\"]"), FakeElement::READY)
        .with_text(
            &Locator::css("#error-for-username, #error-for-password, .form__label--error"),
            "  Wrong email or password. ",
        );
    let launcher = FakeLauncher::new(page);
    let credentials = Credentials {
        linkedin: login("me@example.com", "bad"),
        ..Credentials::default()
    };
    let poster = poster_for(Platform::LinkedIn, &credentials);
    let options = AttemptOptions {
        headless: true,
        executor: &executor,
        screenshots_dir: dir.path(),
        sessions: &sessions,
    };

    let result = run_attempt(&launcher, poster.as_ref(), &PostContent::default(), &options).await;

    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("login failed: Wrong email or password.")
    );
    launcher.page().log(|log| {
        assert_eq!(log.typed[&Locator::css("#username").to_string()], "me@example.com");
        assert!(log
            .clicks
            .contains(&Locator::css("button[type=\"submit\"]").to_string()));
        assert!(log
            .screenshots
            .iter()
            .any(|p| p.to_string_lossy().contains("linkedin_error_")));
        assert_eq!(log.closed, 1);
    });
    assert!(!sessions.path_for(Platform::LinkedIn).exists());
}

const FB_PAGES_URL: &str = "https://www.facebook.com/pages/?category=your_pages";
const FB_HOME_URL: &str = "https://www.facebook.com/";

fn facebook_page_credentials() -> Credentials {
    Credentials {
        facebook_page_name: Some("Budget Famille".to_string()),
        ..Credentials::default()
    }
}

#[tokio::test]
async fn test_facebook_posts_on_managed_page_with_last_button() {
    let dir = TempDir::new().unwrap();
    let sessions = SessionStore::new(dir.path());
    let executor = instant_executor();
    let launcher = FakeLauncher::new(FakePage::permissive());
    let poster = poster_for(Platform::Facebook, &facebook_page_credentials());
    let content = PostContent {
        text: "Nouvelle semaine".to_string(),
        ..PostContent::default()
    };
    let options = AttemptOptions {
        headless: true,
        executor: &executor,
        screenshots_dir: dir.path(),
        sessions: &sessions,
    };

    let result = run_attempt(&launcher, poster.as_ref(), &content, &options).await;

    assert!(result.success, "{:?}", result.error);
    launcher.page().log(|log| {
        // The page was found, so the profile is never reopened afterwards.
        assert_eq!(log.visited.last().map(String::as_str), Some(FB_PAGES_URL));
        assert!(log
            .clicks
            .contains(&Locator::text("a", "Budget Famille").to_string()));
        let post_button = Locator::css("div[aria-label=\"Post\"][role=\"button\"]").last();
        assert_eq!(post_button.to_string(), "css(div[aria-label=\"Post\"][role=\"button\"]):last");
        assert_eq!(log.clicks.last(), Some(&post_button.to_string()));
        assert_eq!(
            log.typed[&Locator::css("div[contenteditable=\"true\"][role=\"textbox\"]").to_string()],
            "Nouvelle semaine"
        );
    });
}

#[tokio::test]
async fn test_facebook_falls_back_to_profile_and_keyword_scan() {
    let dir = TempDir::new().unwrap();
    let sessions = SessionStore::new(dir.path());
    let executor = instant_executor();
    // No page link, and none of the structured post buttons render.
    let page = FakePage::permissive()
        .hide_containing("Budget Famille")
        .hide_containing(":last");
    let launcher = FakeLauncher::new(page);
    let poster = poster_for(Platform::Facebook, &facebook_page_credentials());
    let content = PostContent {
        text: "Nouvelle semaine".to_string(),
        ..PostContent::default()
    };
    let options = AttemptOptions {
        headless: true,
        executor: &executor,
        screenshots_dir: dir.path(),
        sessions: &sessions,
    };

    let result = run_attempt(&launcher, poster.as_ref(), &content, &options).await;

    assert!(result.success, "{:?}", result.error);
    launcher.page().log(|log| {
        let tail: Vec<&str> = log.visited.iter().rev().take(2).map(String::as_str).collect();
        assert_eq!(tail, vec![FB_HOME_URL, FB_PAGES_URL]);
        assert!(!log
            .clicks
            .contains(&Locator::text("a", "Budget Famille").to_string()));
        assert_eq!(
            log.clicks.last(),
            Some(&Locator::probe(["Post", "Publier"]).to_string())
        );
    });
}

#[tokio::test]
async fn test_instagram_wizard_runs_in_order() {
    let dir = TempDir::new().unwrap();
    let sessions = SessionStore::new(dir.path());
    let executor = instant_executor();
    let image = dir.path().join("image.jpg");
    std::fs::write(&image, b"jpeg").unwrap();

    let launcher = FakeLauncher::new(FakePage::permissive());
    let poster = poster_for(Platform::Instagram, &Credentials::default());
    let content = PostContent {
        text: "Budget de la semaine #famille".to_string(),
        image: Some(image.clone()),
        ..PostContent::default()
    };
    let options = AttemptOptions {
        headless: true,
        executor: &executor,
        screenshots_dir: dir.path(),
        sessions: &sessions,
    };

    let result = run_attempt(&launcher, poster.as_ref(), &content, &options).await;

    assert!(result.success, "{:?}", result.error);
    let create = Locator::css("svg[aria-label=\"New post\"]").to_string();
    let next = Locator::text("button", "Next").to_string();
    let share = Locator::text("button", "Share").to_string();
    launcher.page().log(|log| {
        let wizard: Vec<&str> = log
            .clicks
            .iter()
            .filter(|c| **c == create || **c == next || **c == share)
            .map(String::as_str)
            .collect();
        assert_eq!(wizard, vec![create.as_str(), next.as_str(), next.as_str(), share.as_str()]);
        assert!(log
            .clicks
            .contains(&Locator::text("button", "Post").to_string()));
        assert_eq!(
            log.attached[&Locator::css("input[type=\"file\"]").to_string()],
            vec![image.clone()]
        );
        assert_eq!(
            log.typed[&Locator::css("textarea[aria-label*=\"caption\"]").to_string()],
            "Budget de la semaine #famille"
        );
        assert!(log
            .screenshots
            .iter()
            .any(|p| p.to_string_lossy().contains("instagram_published_")));
    });
}

#[tokio::test]
async fn test_twitter_verification_step_uses_contact_email() {
    let dir = TempDir::new().unwrap();
    let sessions = SessionStore::new(dir.path().join("browser_data"));
    let executor = instant_executor();

    let username = Locator::css("input[autocomplete=\"username\"]");
    let next = Locator::text("button", "Next");
    let verification = Locator::css("input[data-testid=\"ocfEnterTextTextInput\"]");
    let password = Locator::css("input[type=\"password\"]");
    let login_button = Locator::css("button[data-testid=\"LoginForm_Login_Button\"]");
    let composer = Locator::css("[data-testid=\"tweetTextarea_0\"]");
    let page = FakePage::strict()
        .with(&username, FakeElement::READY)
        .with(&next, FakeElement::READY)
        .with(&verification, FakeElement::READY)
        .with(&password, FakeElement::READY)
        .with(&login_button, FakeElement::READY)
        .with(&Locator::css("[data-testid=\"tweetButtonInline\"]"), FakeElement::READY)
        .reveal_on_click(
            &login_button,
            &Locator::css("[data-testid=\"SideNav_NewTweet_Button\"]"),
        )
        .reveal_on_click(&login_button, &composer)
        .with_cookies(vec![cookie()]);
    let launcher = FakeLauncher::new(page);
    let credentials = Credentials {
        twitter: login("budget_famille", "secret"),
        twitter_email: Some("contact@budget.fr".to_string()),
        ..Credentials::default()
    };
    let poster = poster_for(Platform::Twitter, &credentials);
    let content = PostContent {
        text: "Budget de la semaine".to_string(),
        ..PostContent::default()
    };
    let options = AttemptOptions {
        headless: true,
        executor: &executor,
        screenshots_dir: dir.path(),
        sessions: &sessions,
    };

    let result = run_attempt(&launcher, poster.as_ref(), &content, &options).await;

    assert!(result.success, "{:?}", result.error);
    launcher.page().log(|log| {
        assert_eq!(log.typed[&username.to_string()], "budget_famille");
        assert_eq!(log.typed[&verification.to_string()], "contact@budget.fr");
        assert_eq!(log.typed[&password.to_string()], "secret");
        assert_eq!(log.typed[&composer.to_string()], "Budget de la semaine");
        let next_clicks = log.clicks.iter().filter(|c| **c == next.to_string()).count();
        assert_eq!(next_clicks, 2);
    });
    assert!(sessions.path_for(Platform::Twitter).exists());
}
