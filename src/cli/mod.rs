//! CLI command handling
//!
//! Sends each command to the daemon and formats the output. Transport
//! failures are returned as errors; a daemon answering `ok: false` is
//! printed and turned into a failing exit code.

use std::process::ExitCode;
use std::time::Duration;

use colored::Colorize;
use serde::de::DeserializeOwned;

use crate::commands::{Commands, GlobalOptions};
use crate::common::{config::Config, paths, Result};
use crate::ipc::protocol::{
    decode_result, parse_params, CreateIssueParams, CreatedIssue, HealthResult, IssuesResult,
    ListParams, Method, NotificationsParams, NotificationsResult, Params, PrParams, PullDetails,
    PullsResult, ReposParams, ReposResult, UserInfo,
};
use crate::ipc::{ClientConfig, DaemonClient, DaemonError, Reply};

/// Build a client from the config file and command-line overrides
pub fn build_client(options: &GlobalOptions) -> Result<DaemonClient> {
    build_client_from(&Config::load()?, options)
}

/// Build a client from a loaded config and command-line overrides
pub fn build_client_from(config: &Config, options: &GlobalOptions) -> Result<DaemonClient> {
    let mut client_config = ClientConfig::from_config(config)?;

    if let Some(socket) = &options.socket {
        client_config.socket_path = paths::expand_tilde(socket);
    }
    if let Some(secs) = options.timeout {
        client_config = client_config.with_read_timeout(Duration::from_secs(secs));
    }

    tracing::debug!(socket = %client_config.socket_path.display(), "using daemon socket");
    Ok(DaemonClient::new(client_config))
}

/// Dispatch a CLI command
pub async fn dispatch(options: &GlobalOptions, command: Commands) -> Result<ExitCode> {
    let client = build_client(options)?;
    let json = options.json;

    match command {
        Commands::Health => run(&client, &Method::Health, json, print_health).await,

        Commands::User => run(&client, &Method::User, json, print_user).await,

        Commands::Repos { user, limit } => {
            let method = Method::Repos(ReposParams { user, limit });
            run(&client, &method, json, print_repos).await
        }

        Commands::Issues { repo, state, limit } => {
            let method = Method::Issues(ListParams { repo, state, limit });
            run(&client, &method, json, print_issues).await
        }

        Commands::Prs { repo, state, limit } => {
            let method = Method::Prs(ListParams { repo, state, limit });
            run(&client, &method, json, print_prs).await
        }

        Commands::Pr { repo, number } => {
            let method = Method::Pr(PrParams { repo, number });
            run(&client, &method, json, print_pr).await
        }

        Commands::Notifications { limit } => {
            let method = Method::Notifications(NotificationsParams { limit });
            run(&client, &method, json, print_notifications).await
        }

        Commands::CreateIssue {
            repo,
            title,
            body,
            labels,
        } => {
            let method = Method::CreateIssue(CreateIssueParams {
                repo,
                title,
                body,
                labels,
            });
            run(&client, &method, json, print_created_issue).await
        }

        Commands::Call { method, params } => {
            let params = match params {
                Some(text) => parse_params(&text)?,
                None => Params::new(),
            };
            let response = client.invoke(&method, params).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(if response.ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Commands::Overview { repo, limit } => overview(&client, &repo, limit).await,
    }
}

/// Call one method and print its result
async fn run<T, F>(client: &DaemonClient, method: &Method, json: bool, print: F) -> Result<ExitCode>
where
    T: DeserializeOwned,
    F: FnOnce(&T),
{
    let response = client.call(method).await?;
    match response.into_result() {
        Ok(result) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                let view: T = decode_result(result)?;
                print(&view);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            print_daemon_error(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Run the whole tour against one repository
///
/// A transport failure aborts the batch; a daemon-side failure is printed
/// and the next section still runs.
async fn overview(client: &DaemonClient, repo: &str, limit: u32) -> Result<ExitCode> {
    if !client.ping().await? {
        println!(
            "{} GitHub daemon not running at {}. Start with: fgp start github",
            "✗".red(),
            client.socket_path().display()
        );
        return Ok(ExitCode::FAILURE);
    }
    println!("{} GitHub daemon is healthy", "✓".green());

    let mut failures = 0;

    section(&format!("Repositories (top {})", limit));
    let repos = ReposParams {
        user: None,
        limit: Some(limit),
    };
    failures += report(client.repos(repos).await?, print_repos);

    let list = ListParams {
        repo: repo.to_string(),
        state: None,
        limit: Some(limit),
    };

    section(&format!("Issues for {}", repo));
    failures += report(client.issues(list.clone()).await?, print_issues);

    section(&format!("Pull requests for {}", repo));
    failures += report(client.prs(list).await?, print_prs);

    section("Notifications");
    failures += report(client.notifications(Some(limit)).await?, print_notifications);

    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn report<T>(reply: Reply<T>, print: impl FnOnce(&T)) -> usize {
    match reply {
        Ok(view) => {
            print(&view);
            0
        }
        Err(e) => {
            print_daemon_error(&e);
            1
        }
    }
}

fn section(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "-".repeat(40));
}

fn print_daemon_error(e: &DaemonError) {
    println!("  {} Error: {}", "✗".red(), e);
}

fn print_health(health: &HealthResult) {
    println!("{} GitHub daemon is healthy", "✓".green());
    if let Some(status) = &health.status {
        println!("  Status:  {}", status);
    }
    if let Some(connected) = health.api_connected {
        println!("  API:     {}", if connected { "connected" } else { "unreachable" });
    }
    if let Some(version) = &health.version {
        println!("  Version: {}", version);
    }
}

fn print_user(user: &UserInfo) {
    match &user.name {
        Some(name) => println!("{} ({})", user.login.bold(), name),
        None => println!("{}", user.login.bold()),
    }
    if let Some(email) = &user.email {
        println!("  Email:     {}", email);
    }
    if let Some(repos) = user.public_repos {
        println!("  Repos:     {}", repos);
    }
    if let (Some(followers), Some(following)) = (user.followers, user.following) {
        println!("  Followers: {}  Following: {}", followers, following);
    }
}

fn print_repos(result: &ReposResult) {
    if result.repos.is_empty() {
        println!("  No repositories found");
        return;
    }
    for repo in &result.repos {
        let name = if repo.full_name.is_empty() {
            &repo.name
        } else {
            &repo.full_name
        };
        println!("  • {}", name);
        println!(
            "    ⭐ {} stars | {}",
            repo.stargazers_count,
            repo.language.as_deref().unwrap_or("Unknown")
        );
        if let Some(description) = repo.description.as_deref().filter(|d| !d.is_empty()) {
            println!("    {}", truncate(description, 60));
        }
    }
}

fn print_issues(result: &IssuesResult) {
    if result.issues.is_empty() {
        println!("  No {} issues found", state_label(&result.state));
        return;
    }
    for issue in &result.issues {
        println!("  #{} {}", issue.number, issue.title);
        if !issue.labels.is_empty() {
            let labels: Vec<&str> = issue.labels.iter().map(|l| l.name.as_str()).collect();
            println!("    Labels: {}", labels.join(", "));
        }
        println!("    Author: {}", issue.author_login().unwrap_or("unknown"));
    }
}

fn print_prs(result: &PullsResult) {
    if result.prs.is_empty() {
        println!("  No {} pull requests found", state_label(&result.state));
        return;
    }
    for pr in &result.prs {
        println!("  #{} {}", pr.number, pr.title);
        println!("    Author: {}", pr.author_login().unwrap_or("unknown"));
        println!("    Branch: {}", pr.head_ref.as_deref().unwrap_or("unknown"));
    }
}

fn print_pr(pr: &PullDetails) {
    println!("#{} {} [{}]", pr.number, pr.title.bold(), pr.state);
    if let (Some(head), Some(base)) = (&pr.head_ref, &pr.base_ref) {
        println!("  {} -> {}", head, base);
    }
    match pr.mergeable {
        Some(true) => println!("  Mergeable: {}", "yes".green()),
        Some(false) => println!("  Mergeable: {}", "no".red()),
        None => {}
    }
    if !pr.reviews.is_empty() {
        println!("  Reviews:");
        for review in &pr.reviews {
            println!("    {} {}", review.author, review.state);
        }
    }
    if !pr.status_checks.is_empty() {
        println!("  Checks:");
        for check in &pr.status_checks {
            println!("    {} {}", check.context, check.state);
        }
    }
}

fn print_notifications(result: &NotificationsResult) {
    if result.notifications.is_empty() {
        println!("  No unread notifications");
        return;
    }
    for notification in &result.notifications {
        println!(
            "  • {}",
            notification.subject_title.as_deref().unwrap_or("(no title)")
        );
        println!(
            "    Repo: {}",
            notification.repo_full_name.as_deref().unwrap_or("unknown")
        );
        println!(
            "    Type: {}",
            notification.subject_type.as_deref().unwrap_or("unknown")
        );
    }
}

fn print_created_issue(result: &CreatedIssue) {
    match &result.issue {
        Some(issue) => {
            println!("{} Issue #{} created", "✓".green(), issue.number);
            if let Some(url) = &issue.url {
                println!("  URL: {}", url);
            }
        }
        None => println!("{} Issue created", "✓".green()),
    }
}

fn state_label(state: &str) -> &str {
    if state.is_empty() {
        "open"
    } else {
        state
    }
}

/// Shorten to at most `max` characters, marking the cut with an ellipsis
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}
