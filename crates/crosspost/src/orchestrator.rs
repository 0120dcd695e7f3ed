//! Sequential publishing of posts across platforms.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::browser::BrowserLauncher;
use crate::config::{Config, Credentials};
use crate::executor::ActionExecutor;
use crate::pacing::Sleeper;
use crate::platforms::{poster_for, run_attempt, AttemptOptions, Platform, PostContent};
use crate::post::{archive_post, format_text_for_platform, Post};
use crate::results::{PublishResult, ResultsLog, RunSummary};
use crate::session::SessionStore;

/// Options for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Publish only on this platform, ignoring the post's own list.
    pub platform_override: Option<String>,
    /// Hide the browser window.
    pub headless: bool,
    /// Simulate: no browser, no waits, no archiving.
    pub dry_run: bool,
}

/// Progress notifications for the console.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// A post is about to be published on `targets`.
    PostStarted { date: String, targets: Vec<String> },
    /// One platform attempt finished.
    PlatformFinished { post_date: String, result: PublishResult },
    /// Waiting before the next platform or post.
    Waiting { duration: Duration, next: String },
    /// A fully published post was archived.
    Archived { post_date: String, path: PathBuf },
}

type EventHandler = Box<dyn Fn(&RunEvent) + Send + Sync>;

/// Publishes posts one platform at a time.
pub struct Orchestrator {
    config: Config,
    credentials: Credentials,
    launcher: Arc<dyn BrowserLauncher>,
    sleeper: Arc<dyn Sleeper>,
    executor: ActionExecutor,
    results_log: ResultsLog,
    sessions: SessionStore,
    on_event: Option<EventHandler>,
}

impl Orchestrator {
    /// Create an orchestrator. The executor shares `sleeper` and the configured pacing.
    pub fn new(
        config: Config,
        credentials: Credentials,
        launcher: Arc<dyn BrowserLauncher>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let executor = ActionExecutor::new(config.pacing, Arc::clone(&sleeper));
        let results_log = ResultsLog::new(&config.logs_dir);
        let sessions = SessionStore::new(&config.browser_data_dir);
        Self {
            config,
            credentials,
            launcher,
            sleeper,
            executor,
            results_log,
            sessions,
            on_event: None,
        }
    }

    /// Receive progress events.
    #[must_use]
    pub fn with_event_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&RunEvent) + Send + Sync + 'static,
    {
        self.on_event = Some(Box::new(handler));
        self
    }

    /// Results log written by [`run`](Self::run).
    #[must_use]
    pub fn results_log(&self) -> &ResultsLog {
        &self.results_log
    }

    fn emit(&self, event: RunEvent) {
        if let Some(handler) = &self.on_event {
            handler(&event);
        }
    }

    /// Platform names a post will be published on.
    ///
    /// Aliases of one platform (`twitter` and `x`) count once; the first
    /// spelling is kept.
    #[must_use]
    pub fn targets_for(&self, post: &Post, options: &RunOptions) -> Vec<String> {
        let names = match &options.platform_override {
            Some(name) => vec![name.clone()],
            None => post.target_names(),
        };

        let mut seen = Vec::new();
        let mut targets = Vec::with_capacity(names.len());
        for name in names {
            let key = Platform::parse(&name)
                .map_or_else(|| name.trim().to_lowercase(), |p| p.as_str().to_string());
            if seen.contains(&key) {
                tracing::warn!(post = %post.date, platform = %name, "Duplicate target skipped");
                continue;
            }
            seen.push(key);
            targets.push(name);
        }
        targets
    }

    /// Publish one post on each target platform, in order.
    pub async fn publish_post(
        &self,
        post: &Post,
        options: &RunOptions,
    ) -> BTreeMap<String, PublishResult> {
        let targets = self.targets_for(post, options);
        self.emit(RunEvent::PostStarted {
            date: post.date.clone(),
            targets: targets.clone(),
        });

        let attempt = AttemptOptions {
            headless: options.headless,
            executor: &self.executor,
            screenshots_dir: &self.config.screenshots_dir,
            sessions: &self.sessions,
        };

        let mut results = BTreeMap::new();
        for (index, name) in targets.iter().enumerate() {
            let result = match Platform::parse(name) {
                None => {
                    tracing::warn!(platform = %name, "Unknown platform");
                    PublishResult::unknown_platform(name)
                }
                Some(platform) if options.dry_run => {
                    tracing::info!(platform = %platform, "[DRY RUN] Simulated publication");
                    PublishResult::dry_run(name)
                }
                Some(platform) => {
                    let poster = poster_for(platform, &self.credentials);
                    let content = PostContent {
                        text: format_text_for_platform(&post.text, platform),
                        image: post.image.clone(),
                        video: post.video.clone(),
                    };
                    let span = tracing::info_span!("platform", platform = %platform);
                    let mut result = run_attempt(self.launcher.as_ref(), poster.as_ref(), &content, &attempt)
                        .instrument(span)
                        .await;
                    result.platform.clone_from(name);
                    result
                }
            };

            self.emit(RunEvent::PlatformFinished {
                post_date: post.date.clone(),
                result: result.clone(),
            });
            results.insert(name.clone(), result);

            if !options.dry_run && index + 1 < targets.len() {
                let delay = self.config.delay_between_platforms;
                self.emit(RunEvent::Waiting {
                    duration: delay,
                    next: targets[index + 1].clone(),
                });
                tracing::info!(seconds = delay.as_secs(), "Waiting before next platform");
                self.sleeper.sleep(delay).await;
            }
        }
        results
    }

    /// Publish every post, recording results in the daily log.
    pub async fn run(&self, posts: &[Post], options: &RunOptions) -> RunSummary {
        let mut summary = RunSummary::default();

        for (index, post) in posts.iter().enumerate() {
            let span = tracing::info_span!("post", post = %post.date);
            let results = self.publish_post(post, options).instrument(span).await;

            if let Err(e) = self.results_log.append(&post.date, &results) {
                tracing::error!(post = %post.date, error = %e, "Could not save results");
            }

            let all_ok = !results.is_empty() && results.values().all(|r| r.success);
            if all_ok && !options.dry_run && self.config.archive_published {
                match archive_post(&post.dir) {
                    Ok(path) => self.emit(RunEvent::Archived {
                        post_date: post.date.clone(),
                        path,
                    }),
                    Err(e) => tracing::warn!(post = %post.date, error = %e, "Archiving failed"),
                }
            }

            summary.record(&results);

            if !options.dry_run && index + 1 < posts.len() {
                let delay = self.config.delay_between_posts;
                self.emit(RunEvent::Waiting {
                    duration: delay,
                    next: posts[index + 1].date.clone(),
                });
                tracing::info!(seconds = delay.as_secs(), "Waiting before next post");
                self.sleeper.sleep(delay).await;
            }
        }

        tracing::info!(
            posts = summary.posts,
            successes = summary.successes,
            failures = summary.failures,
            "Run finished"
        );
        summary
    }
}
