//! Line-oriented driver for a quiz run on stdin/stdout.

use quiz_core::model::{OptionId, Question, QuestionId, QuizResult, Verdict};
use quiz_core::session::{AnswerFeedback, QuizEvent, Rejection};
use services::{FinishedQuiz, PendingRecord, QuizRun, RunOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, PartialEq, Eq)]
enum OptionChoice {
    Id(u64),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Select(QuestionId, OptionChoice),
    Submit(QuestionId),
    Next,
    Prev,
    Finish,
    Close,
    Retake,
    Show,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Ok(Input::Show);
    };
    let question = |raw: Option<&str>| -> Result<QuestionId, String> {
        let raw = raw.ok_or("missing question id")?;
        raw.parse().map_err(|_| format!("not a question id: {raw}"))
    };

    let input = match head.to_ascii_lowercase().as_str() {
        "a" | "answer" => {
            let q = question(parts.next())?;
            let raw = parts.next().ok_or("missing option")?;
            let choice = raw
                .parse::<u64>()
                .map_or_else(|_| OptionChoice::Label(raw.to_string()), OptionChoice::Id);
            Input::Select(q, choice)
        }
        "s" | "submit" => Input::Submit(question(parts.next())?),
        "n" | "next" => Input::Next,
        "p" | "prev" => Input::Prev,
        "f" | "finish" => Input::Finish,
        "c" | "close" => Input::Close,
        "r" | "retake" => Input::Retake,
        "l" | "show" => Input::Show,
        "h" | "help" | "?" => Input::Help,
        "q" | "quit" | "exit" => Input::Quit,
        other => return Err(format!("unknown command: {other}")),
    };
    if parts.next().is_some() {
        return Err("too many arguments".into());
    }
    Ok(input)
}

/// Page moves wait until the result is closed or the quiz retaken.
fn navigation_blocked(input: &Input, result_showing: bool) -> bool {
    result_showing && matches!(input, Input::Next | Input::Prev)
}

fn resolve_option(question: &Question, choice: &OptionChoice) -> Option<OptionId> {
    match choice {
        OptionChoice::Id(id) => Some(OptionId::new(*id)),
        OptionChoice::Label(label) => question
            .options()
            .iter()
            .find(|o| o.label.eq_ignore_ascii_case(label))
            .map(|o| o.id),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  a <question> <option>  select an option (by label or id)");
    println!("  s <question>           submit and reveal the answer");
    println!("  n / p                  next or previous page");
    println!("  f                      finish the quiz");
    println!("  c                      close the result");
    println!("  r                      retake the quiz");
    println!("  l                      show the current page");
    println!("  q                      quit");
}

/// Marks answers revealed since the last page change with "(new)".
fn verdict_line(question: &Question, feedback: &AnswerFeedback<'_>, fresh: bool) -> String {
    let mut line = if feedback.is_correct {
        "correct".to_string()
    } else {
        let label = question
            .option(feedback.correct_option)
            .map_or_else(|| feedback.correct_option.to_string(), |o| o.label.clone());
        format!("incorrect, the answer is {label}")
    };
    if fresh {
        line.push_str(" (new)");
    }
    line
}

fn print_page(run: &QuizRun) {
    let session = run.session();
    let progress = session.progress();
    println!();
    println!(
        "{}  page {}/{}  ({} of {} complete)",
        session.question_set().meta().title,
        progress.page,
        progress.total_pages,
        progress.completed,
        progress.total
    );

    for question in session.current_page_questions() {
        println!();
        println!("[{}] {}", question.id(), question.prompt());
        let selected = session.selected(question.id());
        for option in question.options() {
            let marker = if selected == Some(option.id) { '*' } else { ' ' };
            println!("   {marker} {}) {}", option.label, option.text);
        }
        if let Some(feedback) = session.feedback(question.id()) {
            let fresh = session.was_just_revealed(question.id());
            println!("   {}", verdict_line(question, &feedback, fresh));
            if let Some(explanation) = feedback.explanation {
                println!("   {explanation}");
            }
        }
    }
    println!();
}

fn print_result(result: &QuizResult) {
    println!();
    println!(
        "Score: {:.2}%  ({} correct, {} incorrect of {})",
        result.score_percentage(),
        result.correct_answers(),
        result.incorrect_answers(),
        result.total_questions()
    );
    match result.verdict() {
        Verdict::Passed => println!("Passed. Type c to close or r to retake."),
        Verdict::Failed => println!("Failed. Type c to close or r to retake."),
        Verdict::ForcedRetake => println!("Score too low. You must retake the quiz (r)."),
    }
}

fn print_rejection(rejection: Rejection) {
    println!("! {rejection}");
}

/// Read commands until quit or end of input, then wait for pending writes.
///
/// # Errors
///
/// Returns an I/O error if stdin cannot be read.
pub async fn drive(mut run: QuizRun) -> std::io::Result<()> {
    let mut pending: Vec<PendingRecord> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_help();
    print_page(&run);

    while let Some(line) = lines.next_line().await? {
        let input = match parse_input(&line) {
            Ok(input) => input,
            Err(message) => {
                println!("! {message}");
                continue;
            }
        };

        let event = match input {
            Input::Select(question, choice) => {
                let Some(q) = run.session().question_set().question(question) else {
                    print_rejection(Rejection::UnknownQuestion(question));
                    continue;
                };
                let Some(option) = resolve_option(q, &choice) else {
                    println!("! question {question} has no such option");
                    continue;
                };
                QuizEvent::Select { question, option }
            }
            Input::Submit(question) => QuizEvent::Submit(question),
            ref nav if navigation_blocked(nav, run.session().result_view().is_some()) => {
                println!("! close the result (c) or retake (r) first");
                continue;
            }
            Input::Next => QuizEvent::AdvancePage,
            Input::Prev => QuizEvent::RetreatPage,
            Input::Finish => QuizEvent::Finish,
            Input::Close => QuizEvent::DismissResult,
            Input::Retake => QuizEvent::Retake,
            Input::Show => {
                print_page(&run);
                continue;
            }
            Input::Help => {
                print_help();
                continue;
            }
            Input::Quit => break,
        };

        let refresh = matches!(
            event,
            QuizEvent::Submit(_)
                | QuizEvent::AdvancePage
                | QuizEvent::RetreatPage
                | QuizEvent::Retake
        );
        match run.apply(event) {
            RunOutcome::Applied if refresh => print_page(&run),
            RunOutcome::Applied | RunOutcome::Unchanged => {}
            RunOutcome::Finished(FinishedQuiz { result, record }) => {
                print_result(&result);
                pending.push(record);
            }
            RunOutcome::Rejected(rejection) => print_rejection(rejection),
        }
    }

    if run
        .session()
        .result_view()
        .is_some_and(|view| !view.is_dismissible())
    {
        println!("Leaving with a forced retake pending.");
    }

    // Failures are logged by `wait`; the result was already shown.
    for record in pending {
        if let Err(err) = record.wait().await {
            tracing::debug!(error = %err, "attempt not recorded");
        }
    }
    Ok(())
}
