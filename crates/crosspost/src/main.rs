//! crosspost CLI.
//!
//! Publishes the pending posts of the posts folder to the configured
//! platforms, one platform at a time.

mod ui;

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crosspost::post::{
    create_post_from_template, load_post, pending_posts, validate_for_targets, validate_post,
};
use crosspost::{
    ChromeLauncher, Config, ConfigError, Credentials, Orchestrator, Platform, Post, RunEvent,
    RunOptions, TokioSleeper,
};

/// crosspost - publish one post to several social networks
#[derive(Parser)]
#[command(name = "crosspost")]
#[command(about = "Publish posts to LinkedIn, Instagram, Facebook and X through a browser")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish pending posts (default)
    Run(RunArgs),

    /// Create a post folder from a caption template
    NewPost {
        /// Template name (file `<TEMPLATES_DIR>/<name>.txt`)
        #[arg(short, long)]
        template: String,

        /// Post folder name, usually a date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Template variable, repeatable
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,
    },
}

#[derive(Args, Clone, Default)]
struct RunArgs {
    /// Publish only on this platform (linkedin, instagram, facebook, twitter)
    #[arg(short, long)]
    platform: Option<String>,

    /// Publish only this post folder
    #[arg(long, value_name = "POST_ID")]
    post: Option<String>,

    /// Show the browser window
    #[arg(long)]
    visible: bool,

    /// Simulate publication without opening a browser
    #[arg(long)]
    dry_run: bool,

    /// List pending posts and exit
    #[arg(short, long)]
    list: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected KEY=VALUE, got `{raw}`"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(&config, cli.verbose || config.debug)?;

    match cli.command {
        Some(Commands::NewPost {
            template,
            date,
            vars,
        }) => new_post(&config, &template, &date, vars),
        Some(Commands::Run(args)) => run(config, args).await,
        None => run(config, cli.run).await,
    }
}

fn init_tracing(config: &Config, verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("crosspost=debug,info")
    } else {
        EnvFilter::new("crosspost=info,warn")
    };

    std::fs::create_dir_all(&config.logs_dir)
        .with_context(|| format!("failed to create {}", config.logs_dir.display()))?;
    let log_path = config
        .logs_dir
        .join(format!("{}.log", Local::now().format("%Y-%m-%d")));
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .with(filter)
        .init();
    Ok(())
}

fn new_post(config: &Config, template: &str, date: &str, vars: Vec<(String, String)>) -> Result<()> {
    let vars: BTreeMap<String, String> = vars.into_iter().collect();
    let dir = create_post_from_template(&config.templates_dir, &config.posts_dir, template, date, &vars)?;
    ui::print_success(&format!("Post created in {}", dir.display()));
    ui::print_info("Add an image or video to the folder, then run `crosspost --list`");
    Ok(())
}

fn load_queue(config: &Config, args: &RunArgs) -> Result<Vec<Post>> {
    let Some(id) = &args.post else {
        return Ok(pending_posts(&config.posts_dir, Local::now())?);
    };

    let dir = config.posts_dir.join(id);
    if !dir.is_dir() {
        return Err(ConfigError::PostNotFound(dir).into());
    }
    let post = load_post(&dir)?;
    let issues = match &args.platform {
        Some(name) => {
            let targets: Vec<Platform> = Platform::parse(name).into_iter().collect();
            validate_for_targets(&post, &targets)
        }
        None => validate_post(&post),
    };
    if !issues.is_empty() {
        for issue in &issues {
            ui::print_error(&issue.to_string());
        }
        anyhow::bail!("post {id} is not valid");
    }
    Ok(vec![post])
}

fn target_platforms(posts: &[Post], args: &RunArgs) -> Vec<Platform> {
    let mut platforms: Vec<Platform> = match &args.platform {
        Some(name) => Platform::parse(name).into_iter().collect(),
        None => posts
            .iter()
            .flat_map(Post::target_names)
            .filter_map(|name| Platform::parse(&name))
            .collect(),
    };
    platforms.sort_by_key(|p| Platform::all().iter().position(|q| q == p));
    platforms.dedup();
    platforms
}

async fn run(config: Config, args: RunArgs) -> Result<()> {
    ui::print_banner();

    let posts = load_queue(&config, &args)?;
    if posts.is_empty() {
        ui::print_info(&format!(
            "No pending posts in {}",
            config.posts_dir.display()
        ));
        return Ok(());
    }

    if args.list {
        ui::print_queue(&posts, config.delay_between_platforms);
        return Ok(());
    }

    let credentials = Credentials::from_env();
    if !args.dry_run {
        let missing = credentials.missing_for(&target_platforms(&posts, &args));
        if !missing.is_empty() {
            ui::print_error("Missing credentials in .env:");
            for entry in &missing {
                println!("    {entry}");
            }
            std::process::exit(1);
        }
    }

    ui::print_queue(&posts, config.delay_between_platforms);
    if args.dry_run {
        ui::print_warning("Dry run: nothing will be published");
    } else if !args.yes {
        let proceed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Publish {} post(s)?", posts.len()))
            .default(true)
            .interact()?;
        if !proceed {
            ui::print_info("Cancelled");
            return Ok(());
        }
    }

    let options = RunOptions {
        platform_override: args.platform.clone(),
        headless: !args.visible,
        dry_run: args.dry_run,
    };

    let orchestrator = Orchestrator::new(
        config,
        credentials,
        Arc::new(ChromeLauncher::new()),
        Arc::new(TokioSleeper),
    )
    .with_event_handler(print_event);

    let summary = orchestrator.run(&posts, &options).await;
    ui::print_summary(&summary);
    Ok(())
}

fn print_event(event: &RunEvent) {
    match event {
        RunEvent::PostStarted { date, targets } => {
            ui::print_section(&format!("📤 {date} → {}", targets.join(", ")));
        }
        RunEvent::PlatformFinished { result, .. } => ui::print_result(result),
        RunEvent::Waiting { duration, next } => ui::print_wait(*duration, next),
        RunEvent::Archived { post_date, path } => {
            ui::print_info(&format!("{post_date} archived to {}", path.display()));
        }
    }
}
