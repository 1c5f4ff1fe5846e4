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

    // Get configuration from environment variables
    let credentials = Credentials::from_env()?;
    let project_key = env::var("JIRA_PROJECT_KEY").unwrap_or_else(|_| "PROJ".to_string());

    println!("Domain: {}", credentials.domain);
    println!("Project: {}", project_key);

    let mut service = ExportService::new();
    service.connect(credentials).await?;
    println!("Connected to JIRA");

    let config = ExportConfig::new(project_key).target(ExportTarget::Download {
        output_dir: ".".into(),
    });

    let summary = service.export(&config, &LogProgress).await?;

    println!("Exported {} issues", summary.issues_exported);
    println!("Archived {} attachments", summary.attachments_archived);
    for artifact in &summary.artifacts {
        println!("  -> {}", artifact);
    }

    Ok(())
}
