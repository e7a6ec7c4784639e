use std::fmt;
use std::path::PathBuf;

use storage::repository::{OptionRecord, QuestionRecord, QuestionSetRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    set_id: u64,
    title: String,
    questions: u32,
    file: Option<PathBuf>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSetId { raw: String },
    InvalidQuestions { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSetId { raw } => write!(f, "invalid --set-id value: {raw}"),
            ArgsError::InvalidQuestions { raw } => {
                write!(f, "invalid --questions value (expected 1..=500): {raw}")
            }
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:quiz.sqlite3?mode=rwc".into());
        let mut set_id = std::env::var("QUIZ_SET_ID")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(1);
        let mut title = "Sample Trial Questions".to_string();
        let mut questions = 20;
        let mut file = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--set-id" => {
                    let value = require_value(&mut args, "--set-id")?;
                    set_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSetId { raw: value.clone() })?;
                }
                "--title" => {
                    title = require_value(&mut args, "--title")?;
                }
                "--questions" => {
                    let value = require_value(&mut args, "--questions")?;
                    questions = value
                        .parse::<u32>()
                        .ok()
                        .filter(|n| (1..=500).contains(n))
                        .ok_or_else(|| ArgsError::InvalidQuestions { raw: value.clone() })?;
                }
                "--file" => {
                    file = Some(PathBuf::from(require_value(&mut args, "--file")?));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            set_id,
            title,
            questions,
            file,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>     SQLite URL (default: sqlite:quiz.sqlite3?mode=rwc)");
    eprintln!("  --file <path>         Import a question set from JSON instead of the sample");
    eprintln!("  --set-id <id>         Question set id for the sample (default: 1)");
    eprintln!("  --title <text>        Title for the sample set");
    eprintln!("  --questions <n>       Number of sample questions (default: 20)");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Environment (same as flags): QUIZ_DB_URL, QUIZ_SET_ID");
}

/// Arithmetic questions whose correct option rotates between positions.
fn sample_set(id: u64, title: &str, count: u32) -> QuestionSetRecord {
    let questions = (1..=u64::from(count))
        .map(|n| {
            let a = n * 3;
            let b = n + 7;
            let answer = a + b;
            let correct_slot = n % 4;
            let options = (0..4)
                .map(|slot| {
                    let value = answer + slot;
                    let value = value.saturating_sub(correct_slot);
                    OptionRecord {
                        id: Some(slot + 1),
                        label: None,
                        text: Some(value.to_string()),
                    }
                })
                .collect();
            QuestionRecord {
                id: Some(n),
                prompt: Some(format!("What is {a} + {b}?")),
                options,
                correct_option_id: Some(correct_slot + 1),
                explanation: Some(format!("{a} + {b} = {answer}")),
            }
        })
        .collect();

    QuestionSetRecord {
        id,
        title: Some(title.to_owned()),
        description: Some("Generated practice set".into()),
        questions,
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let record = match &args.file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str::<QuestionSetRecord>(&raw)?
        }
        None => sample_set(args.set_id, &args.title, args.questions),
    };

    let storage = Storage::sqlite(&args.db_url).await?;
    let set_id = storage.question_sets.upsert_question_set(&record).await?;

    println!(
        "Seeded question set {} ({} questions) into {}",
        set_id,
        record.questions.len(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
