//! Console output helpers for the crosspost CLI.

use std::time::Duration;

use colored::Colorize;

use crosspost::post::{estimate_publish_time, extract_hashtags, optimal_posting_time};
use crosspost::{Platform, Post, PublishResult, RunSummary};

/// Print the tool banner.
pub fn print_banner() {
    println!();
    println!("{}", "═".repeat(60).bright_black());
    println!("{}", "  crosspost · social media publisher".cyan().bold());
    println!("{}", "═".repeat(60).bright_black());
    println!();
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
    println!("{}", "─".repeat(60).bright_black());
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message.yellow());
}

/// Print an error message.
pub fn print_error(message: &str) {
    println!("{} {}", "✗".red().bold(), message.red());
}

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

fn platform_label(name: &str) -> String {
    match Platform::parse(name) {
        Some(p) => format!("{} {}", p.emoji(), p.display_name()),
        None => name.to_string(),
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{secs}s")
    }
}

/// Print the queue of pending posts.
pub fn print_queue(posts: &[Post], delay_between_platforms: Duration) {
    print_section(&format!("📋 {} pending post(s)", posts.len()));
    for post in posts {
        let media = match (&post.image, &post.video) {
            (Some(_), _) => "🖼  image",
            (None, Some(_)) => "🎬 video",
            (None, None) => "📝 text only",
        };
        let targets = post.target_names();
        println!(
            "  {} {}  {}",
            "▶".cyan(),
            post.date.bold(),
            media.bright_black()
        );
        println!(
            "    {} {}",
            "platforms:".bright_black(),
            targets
                .iter()
                .map(|t| platform_label(t))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let preview: String = post.text.chars().take(80).collect();
        let ellipsis = if post.text.chars().count() > 80 { "…" } else { "" };
        println!("    {} {preview}{ellipsis}", "text:".bright_black());

        let tags = extract_hashtags(&post.text);
        if !tags.is_empty() {
            println!("    {} {}", "hashtags:".bright_black(), tags.join(" "));
        }
        if let Some(at) = post.scheduled_at() {
            println!("    {} {}", "scheduled:".bright_black(), at.format("%Y-%m-%d %H:%M"));
        }

        let best: Vec<String> = targets
            .iter()
            .filter_map(|t| Platform::parse(t))
            .map(|p| format!("{} {}", p.as_str(), optimal_posting_time(p)))
            .collect();
        if !best.is_empty() {
            println!("    {} {}", "best times:".bright_black(), best.join(", "));
        }
        println!(
            "    {} ~{}",
            "estimated:".bright_black(),
            format_duration(estimate_publish_time(targets.len(), delay_between_platforms))
        );
    }
    println!();
}

/// Print one platform outcome.
pub fn print_result(result: &PublishResult) {
    let label = platform_label(&result.platform);
    if result.success {
        let suffix = if result.dry_run == Some(true) {
            " (dry run)"
        } else {
            ""
        };
        print_success(&format!("{label}: published{suffix}"));
    } else {
        let reason = result.error.as_deref().unwrap_or("unknown error");
        print_error(&format!("{label}: {reason}"));
    }
}

/// Print a wait notice.
pub fn print_wait(duration: Duration, next: &str) {
    println!(
        "  {} waiting {} before {}",
        "⏳".bright_black(),
        format_duration(duration),
        platform_label(next)
    );
}

/// Print the final tally.
pub fn print_summary(summary: &RunSummary) {
    print_section("📊 Summary");
    println!("  posts processed: {}", summary.posts);
    println!("  {} {}", "successes:".green(), summary.successes);
    println!("  {} {}", "failures:".red(), summary.failures);
    println!();
    if summary.all_succeeded() {
        print_success("All publications succeeded");
    } else {
        print_warning("Some publications failed, check the logs and screenshots folders");
    }
}
