//! Line-oriented terminal front end for one timed attempt.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use qudratak_core::model::{Category, Question};
use qudratak_core::scoring::{ExamResult, ReviewItem};
use qudratak_core::timer::{CompletionReason, format_remaining};
use services::{ExamService, ExamSession, Navigation, SessionError, TimedExam, TimerEvent};

/// Remaining-time marks (seconds) at which a warning is printed.
const WARN_AT: [u32; 3] = [300, 60, 10];

/// Which questions the text result lists after the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewScope {
    #[default]
    Errors,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Choose(usize),
    Next,
    Prev,
    Finish,
    Quit,
    Unknown,
}

fn parse_input(line: &str) -> Input {
    match line.trim().to_lowercase().as_str() {
        "n" | "next" | "" => Input::Next,
        "p" | "prev" => Input::Prev,
        "f" | "finish" => Input::Finish,
        "q" | "quit" => Input::Quit,
        other => other
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .map_or(Input::Unknown, |n| Input::Choose(n - 1)),
    }
}

fn render(session: &ExamSession, remaining: u32) {
    let progress = session.progress();
    let question = session.current_question();
    println!();
    match session.current_section() {
        Some(section) => println!(
            "[{}] section {}: {}  question {}/{}",
            format_remaining(remaining),
            section.number,
            section.category,
            progress.position,
            progress.total
        ),
        None => println!(
            "[{}] {}  question {}/{}",
            format_remaining(remaining),
            question.category(),
            progress.position,
            progress.total
        ),
    }
    println!("{}", question.text());
    let chosen = session.current_answer();
    for (index, option) in question.options().iter().enumerate() {
        let marker = if chosen == Some(index) { '*' } else { ' ' };
        println!(" {marker}{}. {option}", index + 1);
    }
    println!("(1-{} choose, n next, p prev, f finish, q quit)", question.option_count());
}

/// Drive one attempt from `input` until completion or abandonment.
///
/// Returns `None` when the user quit or the input closed before finishing;
/// the countdown is released and nothing is scored. Once finishing was asked
/// for, no further input is read.
pub async fn run_attempt<R>(
    service: &ExamService,
    mut exam: TimedExam,
    input: R,
) -> Result<Option<(ExamSession, ExamResult)>, SessionError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    // Finish requested after the countdown already stopped: wait for its event.
    let mut finishing = false;
    render(&exam.session, exam.timer.remaining());

    let reason = loop {
        tokio::select! {
            event = exam.events.recv() => match event {
                Some(TimerEvent::Tick { remaining }) => {
                    if WARN_AT.contains(&remaining) {
                        println!("-- {} left --", format_remaining(remaining));
                    }
                }
                Some(TimerEvent::Completed(reason)) => break reason,
                None => break CompletionReason::TimeExpired,
            },
            line = lines.next_line(), if !finishing => {
                let Ok(Some(line)) = line else {
                    exam.abandon();
                    return Ok(None);
                };
                let wants_finish = match parse_input(&line) {
                    Input::Choose(option) if option < exam.session.current_question().option_count() => {
                        exam.session.select_current(option)?;
                        render(&exam.session, exam.timer.remaining());
                        false
                    }
                    Input::Choose(_) | Input::Unknown => {
                        println!("?");
                        false
                    }
                    Input::Next => match exam.session.move_next() {
                        Navigation::AtLastQuestion => true,
                        _ => {
                            render(&exam.session, exam.timer.remaining());
                            false
                        }
                    },
                    Input::Prev => {
                        exam.session.move_prev();
                        render(&exam.session, exam.timer.remaining());
                        false
                    }
                    Input::Finish => true,
                    Input::Quit => {
                        exam.abandon();
                        return Ok(None);
                    }
                };
                if wants_finish {
                    if exam.finish_now() {
                        break CompletionReason::FinishedEarly;
                    }
                    finishing = true;
                }
            }
        }
    };

    if reason == CompletionReason::TimeExpired {
        println!("time is up");
    }
    service.finish_timed(exam, reason).map(Some)
}

fn option_text(question: &Question, option: Option<usize>) -> String {
    option
        .and_then(|index| question.option(index).map(|text| format!("{}. {text}", index + 1)))
        .unwrap_or_else(|| String::from("none"))
}

pub fn print_result(session: &ExamSession, result: &ExamResult, scope: ReviewScope) {
    println!();
    println!("questions:  {}", result.total());
    println!("correct:    {}", result.correct());
    println!("unanswered: {}", result.unanswered());
    println!("score:      {}%", result.percentage());
    for category in Category::ALL {
        let part = result.category(category);
        if part.total > 0 {
            println!("  {:<13} {}/{}", category.as_str(), part.correct, part.total);
        }
    }
    println!("{}", if result.passed() { "PASSED" } else { "NOT PASSED" });

    let items: Vec<&ReviewItem> = match scope {
        ReviewScope::Errors => result.review_errors().collect(),
        ReviewScope::All => result.review_all().iter().collect(),
    };
    if items.is_empty() {
        return;
    }
    println!();
    println!("review:");
    for item in items {
        let question = &session.questions()[item.position];
        let mark = if item.is_correct { '+' } else { '-' };
        println!("{mark} {}/{}  {}", item.position + 1, result.total(), question.text());
        println!("  correct: {}", option_text(question, Some(item.correct_option)));
        println!("  chosen:  {}", option_text(question, item.chosen_option));
    }
}
