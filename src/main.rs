use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Arg, ArgMatches, Command, ValueHint};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storm_report::config::AppConfig;
use storm_report::export::{
    DeliveryChannel, DownloadSink, ExportFormat, Exporter, OutboxMailer, Receipt,
};
use storm_report::media::import_folder;
use storm_report::state::{ProjectRecord, ReportConfiguration, MAX_PHOTO_SIZE};
use storm_report::ProjectSession;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("STORM_REPORT_LOG")
                .unwrap_or_else(|_| "storm_report=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("check", sub_m)) => handle_check(sub_m),
        Some(("generate", sub_m)) => handle_generate(sub_m).await,
        _ => unreachable!("Subcommand is required by CLI configuration"),
    }
}

fn cli() -> Command {
    let project_arg = Arg::new("project")
        .short('p')
        .long("project")
        .help("Path to the project record (JSON)")
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
        .value_hint(ValueHint::FilePath);

    Command::new("storm-report")
        .version(clap::crate_version!())
        .about("\u{26C8} Storm damage report generator")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("check")
                .about("Check that a project record has every required field")
                .arg(project_arg.clone()),
        )
        .subcommand(
            Command::new("generate")
                .about("Generate a report from a project record and a folder of photos")
                .arg(project_arg)
                .arg(
                    Arg::new("photos")
                        .long("photos")
                        .help("Folder of photos to include, searched recursively")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("photo_notes")
                        .long("photo-notes")
                        .help("JSON object mapping photo file names to their notes")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("settings")
                        .short('s')
                        .long("settings")
                        .help("Report settings (JSON). Defaults include everything.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::FilePath),
                )
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .help("Output format")
                        .value_parser(["bundle", "html", "json"])
                        .default_value("bundle"),
                )
                .arg(
                    Arg::new("out")
                        .short('o')
                        .long("out")
                        .help("Directory to save the report in. Overrides the configured output directory.")
                        .value_parser(clap::value_parser!(PathBuf))
                        .value_hint(ValueHint::DirPath),
                )
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("E-mail the report to this address instead of saving it")
                        .value_parser(clap::builder::NonEmptyStringValueParser::new())
                        .value_hint(ValueHint::EmailAddress),
                ),
        )
}

fn handle_check(matches: &ArgMatches) -> Result<()> {
    let project_path = required_path(matches, "project")?;
    let project = load_project(project_path)?;

    match project.validate() {
        Ok(()) => {
            println!("✅ {} is complete", project_path.display());
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("{} is incomplete", project_path.display())),
    }
}

async fn handle_generate(matches: &ArgMatches) -> Result<()> {
    let app_config = AppConfig::load().context("Failed to load application config")?;
    tracing::info!(
        output_dir = %app_config.output_dir.display(),
        reduced_max_edge = app_config.reduced_max_edge,
        "Loaded configuration"
    );

    let project_path = required_path(matches, "project")?;
    let project = load_project(project_path)?;

    let mut settings = match matches.get_one::<PathBuf>("settings") {
        Some(path) => {
            let json = read_text(path)?;
            ReportConfiguration::from_json(&json)
                .with_context(|| format!("Invalid report settings in {}", path.display()))?
        }
        None => ReportConfiguration::for_project(&project),
    };
    if settings.letterhead.is_none() {
        settings.letterhead = app_config.company.clone();
    }

    let mut session = ProjectSession::new(project, app_config.reduced_max_edge);
    session.set_config(settings);

    if let Some(folder) = matches.get_one::<PathBuf>("photos") {
        let import = import_folder(folder, MAX_PHOTO_SIZE)
            .await
            .with_context(|| format!("Failed to read photos from {}", folder.display()))?;
        for skipped in &import.skipped {
            tracing::warn!(file = %skipped.display(), "Skipped non-image file");
        }

        let added = session.add_photos(import.photos)?;

        if let Some(notes_path) = matches.get_one::<PathBuf>("photo_notes") {
            let notes: HashMap<String, String> = serde_json::from_str(&read_text(notes_path)?)
                .with_context(|| format!("Invalid photo notes in {}", notes_path.display()))?;
            for photo in &added {
                if let Some(text) = notes.get(&photo.file_name) {
                    session.update_notes(photo.id, text.as_str())?;
                }
            }
        }

        session.wait_for_ingest().await;
        for photo in session.photos().iter().filter(|p| !p.is_ready()) {
            tracing::warn!(
                file = %photo.file_name,
                reason = photo.failure.as_deref().unwrap_or("unknown"),
                "⚠️  Photo left out of the report"
            );
        }
    }

    let document = session.generate_report(Utc::now())?;
    tracing::info!(
        title = %document.title,
        sections = document.sections.len(),
        photos = document.photo_count(),
        "📄 Report assembled"
    );

    let format: ExportFormat = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("bundle")
        .parse()
        .map_err(anyhow::Error::msg)?;
    let artifact = format.encoder().artifact(&document)?;

    let output_dir = matches
        .get_one::<PathBuf>("out")
        .cloned()
        .unwrap_or(app_config.output_dir);
    let exporter = Exporter::new(
        DownloadSink::new(output_dir),
        OutboxMailer::new(app_config.outbox_dir),
    );

    let channel = match matches.get_one::<String>("email") {
        Some(recipient) => DeliveryChannel::Email {
            recipient: recipient.clone(),
        },
        None => DeliveryChannel::Download,
    };

    match exporter.deliver(&artifact, &channel).await? {
        Receipt::Downloaded { path } => println!("✅ Report saved to {}", path.display()),
        Receipt::Queued {
            recipient,
            message_dir,
        } => println!(
            "📧 Report for {} queued in {}",
            recipient,
            message_dir.display()
        ),
    }
    Ok(())
}

fn required_path<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a PathBuf> {
    matches
        .get_one::<PathBuf>(id)
        .with_context(|| format!("Missing --{}", id))
}

fn load_project(path: &Path) -> Result<ProjectRecord> {
    let json = read_text(path)?;
    ProjectRecord::from_json(&json)
        .with_context(|| format!("Invalid project record in {}", path.display()))
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
