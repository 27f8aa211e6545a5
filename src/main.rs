use std::path::PathBuf;
use std::sync::Arc;

use acenext_lib::backend::BackendClient;
use acenext_lib::config::Settings;
use acenext_lib::interview::QuestionCategory;
use acenext_lib::media::{FileDevices, MediaDevices, TestPatternDevices};
use acenext_lib::navigation::{self, Page};
use acenext_lib::notifications::{NotificationKind, Notifier};
use acenext_lib::practice::{FormError, FormField, PracticeFormHandler};
use acenext_lib::report::{ReportViewer, View};
use acenext_lib::session::{InterviewSession, SessionOutcome};
use acenext_lib::storage::{DraftStore, LocalStorage};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about = "AceNext mock-interview practice client")]
struct Cli {
    /// Path to a TOML settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend origin (overrides the settings file)
    #[arg(long, global = true, env = "ACENEXT_BACKEND_URL")]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Landing page
    Start,
    /// Fill in and submit the practice setup form
    Practice {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        skills: Option<String>,
        #[arg(long)]
        experience: Option<String>,
        #[arg(long)]
        interview_type: Option<String>,
        /// Discard the saved draft first
        #[arg(long)]
        reset: bool,
    },
    /// Inspect or discard the saved practice form draft
    Draft {
        #[command(subcommand)]
        action: DraftAction,
    },
    /// Run a live interview session (commands are read from stdin)
    Session {
        /// Directory of images used as camera frames
        #[arg(long)]
        camera_dir: Option<PathBuf>,
        /// WAV file used as the microphone
        #[arg(long)]
        microphone_wav: Option<PathBuf>,
        /// Use generated camera and microphone sources
        #[arg(long, conflicts_with_all = ["camera_dir", "microphone_wav"])]
        test_pattern: bool,
    },
    /// Fetch and display the interview report
    Report {
        /// Show the raw text instead of the formatted sections
        #[arg(long)]
        raw: bool,
        /// Save the report into the configured report directory
        #[arg(long)]
        download: bool,
    },
}

#[derive(Subcommand, Debug)]
enum DraftAction {
    Show,
    Clear,
}

/// Prints toasts to the terminal.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Error | NotificationKind::Warning => eprintln!("[{}] {}", kind, message),
            NotificationKind::Success | NotificationKind::Info => println!("[{}] {}", kind, message),
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(url) = cli.backend_url {
        settings.backend_url = url;
        settings.validate()?;
    }
    info!("AceNext client using backend {}", settings.backend_url);

    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);
    let backend = BackendClient::from_settings(&settings).context("Invalid backend URL")?;

    match cli.command {
        Command::Start => {
            let page = navigation::start_practice(notifier.as_ref(), settings.landing_delay()).await;
            println!("Next: acenext {}", page_command(page));
        }
        Command::Practice {
            name,
            role,
            company,
            description,
            skills,
            experience,
            interview_type,
            reset,
        } => {
            let drafts = open_drafts(&settings);
            let mut handler = PracticeFormHandler::new(drafts, backend, notifier, settings.redirect_delay());
            if reset {
                handler.reset()?;
            } else {
                handler.load_draft();
            }

            let updates = [
                (FormField::Name, name),
                (FormField::Role, role),
                (FormField::Company, company),
                (FormField::JobDescription, description),
                (FormField::Skills, skills),
                (FormField::ExperienceLevel, experience),
                (FormField::InterviewType, interview_type),
            ];
            for (field, value) in updates {
                if let Some(value) = value {
                    if let Err(e) = handler.set_field(field, &value) {
                        eprintln!("  {}", e);
                    }
                }
            }

            match handler.submit().await {
                Ok(page) => println!("Next: acenext {}", page_command(page)),
                Err(FormError::Invalid(errors)) => {
                    for e in &errors {
                        eprintln!("  {}", e);
                    }
                    anyhow::bail!("practice form has {} invalid field(s); the draft was kept", errors.len());
                }
                Err(e) => return Err(e).context("Submitting the practice form failed; the draft was kept"),
            }
        }
        Command::Draft { action } => {
            let drafts = open_drafts(&settings);
            match action {
                DraftAction::Show => match drafts.load() {
                    Some(form) => {
                        for field in FormField::ALL {
                            println!("{:>16}: {}", field.id(), form.get(field));
                        }
                    }
                    None => println!("No saved draft"),
                },
                DraftAction::Clear => {
                    drafts.clear()?;
                    println!("Draft cleared");
                }
            }
        }
        Command::Session {
            camera_dir,
            microphone_wav,
            test_pattern,
        } => {
            let devices: Arc<dyn MediaDevices> = if test_pattern {
                Arc::new(TestPatternDevices::default())
            } else {
                Arc::new(FileDevices::new(camera_dir, microphone_wav))
            };
            let session = InterviewSession::new(settings, backend, devices, notifier);
            run_session(&session).await?;
        }
        Command::Report { raw, download } => {
            let mut viewer = ReportViewer::new(backend, notifier);
            viewer.generate().await?;
            if raw {
                viewer.toggle_view(View::Raw);
            }
            println!("{}", viewer.render());
            if download {
                if let Some(path) = viewer.download(&settings.report_dir)? {
                    println!("Saved {}", path.display());
                }
            }
        }
    }

    Ok(())
}

fn open_drafts(settings: &Settings) -> DraftStore {
    DraftStore::new(Arc::new(LocalStorage::open(&settings.storage_path)))
}

fn page_command(page: Page) -> &'static str {
    match page {
        Page::Landing => "start",
        Page::Practice => "practice --role <ROLE>",
        Page::Session => "session",
        Page::Report => "report",
    }
}

const SESSION_HELP: &str = "commands: questions <category> | select <n> | record | frame | status | end | quit";

async fn run_session(session: &InterviewSession) -> Result<()> {
    session.initialize().await?;
    println!("{}", session.state().greeting);
    println!("{}", SESSION_HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };
        let argument = words.collect::<Vec<_>>().join(" ");

        match command {
            "questions" => {
                let category: QuestionCategory = if argument.is_empty() {
                    QuestionCategory::Technical
                } else {
                    argument.parse().unwrap_or(QuestionCategory::Technical)
                };
                match session.generate_questions(&category).await {
                    Ok(batch) => {
                        for (i, question) in batch.questions.iter().enumerate() {
                            println!("  {}. {}", i + 1, question);
                        }
                    }
                    Err(e) => eprintln!("{} (try again)", e),
                }
            }
            "select" => match argument.parse::<usize>() {
                Ok(n) if n >= 1 => match session.select_question(n - 1) {
                    Ok(question) => println!("> {}", question),
                    Err(e) => eprintln!("{}", e),
                },
                _ => eprintln!("usage: select <n>"),
            },
            "record" => {
                if let Err(e) = session.toggle_recording().await {
                    eprintln!("{}", e);
                }
            }
            "frame" => println!("{:?}", session.capture_and_send_frame().await),
            "status" => print_status(session),
            "end" => match session.end_session().await {
                Ok(outcome) => {
                    print_outcome(&outcome);
                    break;
                }
                Err(e) => eprintln!("{}", e),
            },
            "quit" | "exit" => {
                session.shutdown();
                break;
            }
            _ => println!("{}", SESSION_HELP),
        }
    }

    Ok(())
}

fn print_status(session: &InterviewSession) {
    let state = session.state();
    println!("  elapsed:   {}", state.elapsed_display);
    println!("  camera:    {:?}", state.camera);
    println!("  emotion:   {}", state.emotion_label);
    println!("  recording: {}", state.recording);
    println!("  audio processed: {}, video processed: {}", state.audio_processed, state.video_processed);
    if let Some(question) = state.selected_text() {
        println!("  question:  {}", question);
    }
    println!("  ready to end: {}", state.can_end());
}

fn print_outcome(outcome: &SessionOutcome) {
    let summary = &outcome.summary;
    println!("Interview report{}", if outcome.report.is_local() { " (local)" } else { "" });
    println!("  Session Duration:   {}", summary.duration);
    println!("  Questions Answered: {}", summary.questions);
    println!("  Overall Score:      {}", summary.overall_score);
    println!("  Audio Quality:      {}", summary.audio_quality);
    println!("  Video Quality:      {}", summary.video_quality);
    println!("  Session Completion: {}", summary.completion);
    if let Some(text) = outcome.report.report_text() {
        println!("\n{}", text);
    }
}
