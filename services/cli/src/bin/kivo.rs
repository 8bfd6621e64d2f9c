//! services/cli/src/bin/kivo.rs

use std::sync::Arc;

use async_openai::{config::OpenAIConfig, Client};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use clap::{Parser, Subcommand};
use cli_lib::{
    adapters::{FileStore, OpenAiVisionAdapter, TerminalToastAdapter},
    auth::SessionManager,
    config::Config,
    error::AppError,
};
use kivo_core::{
    domain::{CategoryStatus, Project},
    orchestrator::AnalysisOrchestrator,
    store::ProjectStore,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Kivo - photograph a space, get an accessibility report.
#[derive(Parser, Debug)]
#[command(name = "kivo", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Record who is using the tool (no password, replaces any previous profile).
    Login {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
    },
    /// Clear the stored user profile.
    Logout,
    /// Manage projects.
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Analyze an image of a space and attach the findings to a project.
    Analyze {
        project_id: Uuid,
        /// Path to a JPEG image of the space.
        image: std::path::PathBuf,
    },
    /// Print the full Markdown report of a settled analysis.
    Report {
        project_id: Uuid,
        analysis_id: Uuid,
    },
}

#[derive(Subcommand, Debug)]
enum ProjectCommands {
    /// Create a new project.
    Create {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List all projects, newest first.
    List,
    /// Show one project and the state of its analyses.
    Show { id: Uuid },
    /// Replace a project's title and description.
    Rename {
        id: Uuid,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a project and everything in it.
    Delete { id: Uuid },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // --- 2. Wire the Persistence and Notification Adapters ---
    let storage = Arc::new(FileStore::new(config.data_dir.clone()));
    let notifier = Arc::new(TerminalToastAdapter::new());
    let sessions = SessionManager::new(storage.clone());
    let store = Arc::new(ProjectStore::new(storage.clone(), notifier.clone()));
    store.load().await?;

    match cli.command {
        Commands::Login { name, email } => {
            let user = sessions.login(&name, &email).await?;
            println!("Logged in as {} <{}>.", user.name, user.email);
        }
        Commands::Logout => {
            sessions.logout().await?;
            println!("Logged out.");
        }
        Commands::Project { command } => {
            require_login(&sessions).await?;
            match command {
                ProjectCommands::Create { title, description } => {
                    let project = store.create_project(title, description).await;
                    println!("Created project {} ({}).", project.title, project.id);
                }
                ProjectCommands::List => {
                    let projects = store.snapshot().await;
                    if projects.is_empty() {
                        println!("No projects yet.");
                    }
                    for project in &projects {
                        println!(
                            "{}  {}  ({} analyses, created {})",
                            project.id,
                            project.title,
                            project.analyses.len(),
                            project.created_at.format("%Y-%m-%d")
                        );
                    }
                }
                ProjectCommands::Show { id } => {
                    let project = store
                        .find_project(id)
                        .await
                        .ok_or_else(|| AppError::Internal(format!("No project with id {id}")))?;
                    print_project(&project);
                }
                ProjectCommands::Rename {
                    id,
                    title,
                    description,
                } => {
                    if store.rename_project(id, &title, &description).await {
                        println!("Renamed project {id}.");
                    } else {
                        println!("No project with id {id}; nothing changed.");
                    }
                }
                ProjectCommands::Delete { id } => {
                    if store.delete_project(id).await {
                        println!("Deleted project {id}.");
                    } else {
                        println!("No project with id {id}; nothing changed.");
                    }
                }
            }
        }
        Commands::Analyze { project_id, image } => {
            require_login(&sessions).await?;
            let api_key = config
                .openai_api_key
                .as_ref()
                .ok_or_else(|| AppError::Internal("OPENAI_API_KEY is required".to_string()))?;
            let openai_config = OpenAIConfig::new().with_api_key(api_key);
            let vision_adapter = Arc::new(OpenAiVisionAdapter::new(
                Client::with_config(openai_config),
                config.vision_model.clone(),
            ));
            let orchestrator = Arc::new(AnalysisOrchestrator::new(
                vision_adapter,
                store.clone(),
                notifier.clone(),
            ));

            let bytes = tokio::fs::read(&image).await?;
            info!(image = %image.display(), size = bytes.len(), "Read image for analysis.");
            let image_source = format!("data:image/jpeg;base64,{}", BASE64.encode(&bytes));

            let item = orchestrator
                .begin_analysis(project_id, image_source)
                .await
                .ok_or_else(|| {
                    AppError::Internal(format!("No project with id {project_id}"))
                })?;

            // Settlement runs detached from this call site; the binary just
            // has nothing else to do, so it waits for the task to finish.
            let handle = orchestrator.spawn_analysis(project_id, item.id, bytes);
            handle
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;

            if let Some(project) = store.find_project(project_id).await {
                if let Some(settled) = project.analyses.iter().find(|a| a.id == item.id) {
                    match (&settled.result, &settled.error) {
                        (Some(result), _) => {
                            println!("Verdict: {}", result.verdict);
                            println!("{}", result.summary);
                            for category in &result.categories {
                                println!(
                                    "  [{}] {}",
                                    status_label(category.status),
                                    category.title
                                );
                            }
                            println!("Analysis id: {}", settled.id);
                        }
                        (None, Some(error)) => println!("{error}"),
                        (None, None) => println!("Analysis is still pending."),
                    }
                }
            }
        }
        Commands::Report {
            project_id,
            analysis_id,
        } => {
            require_login(&sessions).await?;
            let project = store.find_project(project_id).await.ok_or_else(|| {
                AppError::Internal(format!("No project with id {project_id}"))
            })?;
            let item = project
                .analyses
                .iter()
                .find(|a| a.id == analysis_id)
                .ok_or_else(|| {
                    AppError::Internal(format!("No analysis with id {analysis_id}"))
                })?;
            match &item.result {
                Some(result) => println!("{}", result.full_report_markdown),
                None => match &item.error {
                    Some(error) => println!("Analysis failed: {error}"),
                    None => println!("Analysis is still pending."),
                },
            }
        }
    }

    Ok(())
}

async fn require_login(sessions: &SessionManager) -> Result<(), AppError> {
    match sessions.current_user().await? {
        Some(_) => Ok(()),
        None => Err(AppError::Internal(
            "No user is logged in. Run `kivo login` first.".to_string(),
        )),
    }
}

fn print_project(project: &Project) {
    println!("{}  {}", project.id, project.title);
    if !project.description.is_empty() {
        println!("{}", project.description);
    }
    println!("Created {}", project.created_at.format("%Y-%m-%d %H:%M"));
    if project.analyses.is_empty() {
        println!("No analyses yet.");
    }
    for item in &project.analyses {
        let state = if item.loading {
            "pending".to_string()
        } else if let Some(result) = &item.result {
            result.verdict.clone()
        } else {
            format!("failed: {}", item.error.as_deref().unwrap_or("unknown"))
        };
        println!("  {}  {}", item.id, state);
    }
}

fn status_label(status: CategoryStatus) -> &'static str {
    match status {
        CategoryStatus::Positive => "positive",
        CategoryStatus::Warning => "warning",
        CategoryStatus::Negative => "negative",
    }
}
