use dotenv::dotenv;
use std::env;

use jira_export::{Credentials, ExportConfig, ExportService, ExportTarget, LogProgress};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("jira_export=debug")),
        )
        .init();

    let credentials = Credentials::from_env()?;
    let project_key = env::var("JIRA_PROJECT_KEY").unwrap_or_else(|_| "PROJ".to_string());
    let repo_url = env::var("GITHUB_REPO")
        .unwrap_or_else(|_| "https://github.com/your-org/your-repo".to_string());
    let token = env::var("GITHUB_TOKEN").unwrap_or_default();
    let branch = env::var("GITHUB_BRANCH").ok();

    println!("Domain: {}", credentials.domain);
    println!("Repository: {}", repo_url);

    let mut service = ExportService::new();
    service.connect(credentials).await?;
    println!("Connected to JIRA");

    let config = ExportConfig::new(project_key).target(ExportTarget::GitHub {
        repo_url,
        branch,
        token,
    });

    let summary = service.export(&config, &LogProgress).await?;

    println!("Exported {} issues to GitHub", summary.issues_exported);
    for artifact in &summary.artifacts {
        println!("  -> {}", artifact);
    }

    Ok(())
}
