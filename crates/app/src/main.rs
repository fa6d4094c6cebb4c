use std::fmt;
use std::io::{self, BufRead, Write};

use services::{
    AppServices, ClientConfig, Clock, LearningPath, QuizError, QuizPhase, QuizSession,
    StartOutcome,
};
use sprint_core::AggregatedSkillView;
use sprint_core::model::{RewardEvent, SkillId};
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidSkillId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required for this command"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSkillId { raw } => write!(f, "invalid --skill-id value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  skillsprint dashboard [options]");
    eprintln!("  skillsprint path   --skill-id <id> [options]");
    eprintln!("  skillsprint toggle --skill-id <id> --subskill <name> [options]");
    eprintln!("  skillsprint start  --skill-id <id> [options]");
    eprintln!("  skillsprint quiz   --skill-id <id> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --api-url <url>    learning server base URL");
    eprintln!("  --db <sqlite_url>  resource cache database");
    eprintln!("  --token <token>    bearer credential");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SKILLSPRINT_API_URL, SKILLSPRINT_TOKEN, SKILLSPRINT_TIMEOUT_SECS, SKILLSPRINT_DB_URL");
    eprintln!("  RUST_LOG (default: info)");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Dashboard,
    Path,
    Toggle,
    Start,
    Quiz,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "dashboard" => Some(Self::Dashboard),
            "path" => Some(Self::Path),
            "toggle" => Some(Self::Toggle),
            "start" => Some(Self::Start),
            "quiz" => Some(Self::Quiz),
            _ => None,
        }
    }

    fn needs_skill(self) -> bool {
        !matches!(self, Self::Dashboard)
    }
}

struct Args {
    config: ClientConfig,
    skill_id: Option<SkillId>,
    subskill: Option<String>,
}

impl Args {
    fn parse(
        command: Command,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut config = ClientConfig::from_env();
        let mut skill_id = None;
        let mut subskill = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api-url" => config.api_url = require_value(args, "--api-url")?,
                "--token" => config.token = Some(require_value(args, "--token")?),
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    config.db_url = value;
                }
                "--skill-id" => {
                    let value = require_value(args, "--skill-id")?;
                    let parsed: SkillId = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSkillId { raw: value.clone() })?;
                    skill_id = Some(parsed);
                }
                "--subskill" => subskill = Some(require_value(args, "--subskill")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if command.needs_skill() && skill_id.is_none() {
            return Err(ArgsError::MissingFlag { flag: "--skill-id" });
        }
        if command == Command::Toggle && subskill.is_none() {
            return Err(ArgsError::MissingFlag { flag: "--subskill" });
        }
        config.db_url = normalize_sqlite_url(config.db_url);

        Ok(Self {
            config,
            skill_id,
            subskill,
        })
    }

    fn skill_id(&self) -> Result<SkillId, ArgsError> {
        self.skill_id
            .ok_or(ArgsError::MissingFlag { flag: "--skill-id" })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Log reward events as they arrive, the way a dashboard would refresh on them.
fn spawn_reward_listener(mut events: broadcast::Receiver<RewardEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::info!(
                    skill_id = %event.skill_id(),
                    xp = event.reward().xp_earned,
                    streak = event.reward().current_streak,
                    "reward earned"
                ),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "reward listener lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            io::Error::new(io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let mut iter = argv.into_iter().skip(1);
    let parsed = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&parsed.config.db_url)?;
    let clock = Clock::default();
    let app = AppServices::new_sqlite(&parsed.config, clock).await?;
    spawn_reward_listener(app.events().subscribe());

    match cmd {
        Command::Dashboard => show_dashboard(&app).await,
        Command::Path => {
            let path = app.learning_paths().open(parsed.skill_id()?).await?;
            print_path(&path);
            Ok(())
        }
        Command::Toggle => {
            let subskill = parsed
                .subskill
                .as_deref()
                .ok_or(ArgsError::MissingFlag { flag: "--subskill" })?;
            let path = app.learning_paths().open(parsed.skill_id()?).await?;
            let outcome = path.tracker.toggle(subskill).await?;
            let mark = if outcome.state.is_completed() { "completed" } else { "not completed" };
            println!("{} is now {mark} ({} overall)", outcome.subskill, outcome.percent);
            if let Some(reward) = outcome.reward {
                println!("+{} XP, streak {}", reward.xp_earned, reward.current_streak);
            }
            Ok(())
        }
        Command::Start => {
            match app.learning_paths().start_learning(parsed.skill_id()?).await? {
                StartOutcome::Started(reward) => {
                    println!("Learning started. +{} XP", reward.xp_earned);
                }
                StartOutcome::AlreadyStarted => println!("You have already started this skill."),
            }
            Ok(())
        }
        Command::Quiz => take_quiz(&app, clock, parsed.skill_id()?).await,
    }
}

async fn show_dashboard(app: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let dashboard = app.dashboard().load().await?;
    println!("Total XP: {}", dashboard.total_xp);
    if dashboard.overview.is_empty() {
        println!("No skills started yet.");
        return Ok(());
    }
    print_section("In progress", &dashboard.overview.in_progress);
    print_section("Completed", &dashboard.overview.completed);
    Ok(())
}

fn print_section(title: &str, views: &[AggregatedSkillView]) {
    if views.is_empty() {
        return;
    }
    println!("{title}:");
    for view in views {
        println!("  [{}] {:<32} {:>4}", view.skill.id(), view.skill.name(), view.progress);
    }
}

fn print_path(path: &LearningPath) {
    let skill = path.detail.skill();
    println!("{} ({})", skill.name(), path.percent());
    if !path.has_started {
        println!("Not started yet. Run `skillsprint start --skill-id {}`.", skill.id());
    }
    let progress = path.progress();
    for subskill in path.detail.subskills() {
        let mark = if progress.completed().contains(subskill) { "x" } else { " " };
        println!("[{mark}] {subskill}");
        let resources = path.resources_for(subskill);
        if resources.is_empty() {
            println!("      (no resources available)");
        }
        for resource in resources {
            println!("      - {} <{}>", resource.title(), resource.url());
        }
    }
    if path.resources.is_partial() {
        println!("Some resources could not be loaded; they will be retried next time.");
    }
}

async fn take_quiz(
    app: &AppServices,
    clock: Clock,
    skill_id: SkillId,
) -> Result<(), Box<dyn std::error::Error>> {
    let quizzes = app.quizzes();
    let mut session = match quizzes.start(skill_id).await {
        Ok(session) => session,
        Err(err @ (QuizError::AuthRequired | QuizError::AuthExpired)) => {
            eprintln!("Please sign in again (set SKILLSPRINT_TOKEN or pass --token).");
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };
    println!("Quiz: {} ({} questions)", session.skill_name(), session.total_questions());

    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        answer_questions(&mut session, &mut input)?;
        println!("You answered {}/{} correctly.", session.score(), session.total_questions());
        if session.passed() || !ask_yes_no(&mut input, "Below the pass mark. Retake? [y/N] ")? {
            break;
        }
        session.retake(clock.now())?;
    }

    let result = quizzes.submit(&mut session).await?;
    println!(
        "Score: {:.0}% ({}) +{} XP",
        result.score_percentage, result.performance_level, result.xp_earned
    );
    for tip in &result.recommendations {
        println!("  * {tip}");
    }
    Ok(())
}

fn answer_questions(
    session: &mut QuizSession,
    input: &mut impl BufRead,
) -> Result<(), Box<dyn std::error::Error>> {
    while session.phase() == QuizPhase::InProgress {
        let Some(question) = session.current_question().cloned() else {
            break;
        };
        println!();
        println!(
            "Q{}/{}: {}",
            session.current_index() + 1,
            session.total_questions(),
            question.question
        );
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}. {option}", i + 1);
        }

        let choice = loop {
            let line = prompt(input, "> ")?;
            match line.trim().parse::<usize>() {
                Ok(n) if (1..=question.options.len()).contains(&n) => {
                    break question.options[n - 1].clone();
                }
                _ => println!("Enter a number between 1 and {}.", question.options.len()),
            }
        };
        let outcome = session.answer(choice)?;
        if outcome.correct {
            println!("Correct!");
        } else {
            println!("Incorrect. Answer: {}", question.correct_answer);
        }
        if let Some(explanation) = &question.explanation {
            println!("{explanation}");
        }
    }
    Ok(())
}

fn ask_yes_no(input: &mut impl BufRead, message: &str) -> io::Result<bool> {
    let line = prompt(input, message)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

fn prompt(input: &mut impl BufRead, message: &str) -> io::Result<String> {
    print!("{message}");
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
    }
    Ok(line)
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
