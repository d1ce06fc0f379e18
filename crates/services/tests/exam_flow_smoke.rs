use std::collections::HashSet;
use std::sync::Arc;

use qudratak_core::model::{Category, QuestionId, TestConfiguration};
use qudratak_core::time::fixed_now;
use qudratak_core::timer::CompletionReason;
use services::blob::{parse_configuration, parse_question_bank};
use services::{Clock, ExamService, Navigation, SelectionPolicy, TimerEvent};

fn bank_json(verbal: u64, quantitative: u64) -> String {
    let entry = |id: u64| {
        format!(r#"{{"id":{id},"text":"Q{id}","options":["a","b","c","d"],"correctOptionIndex":{}}}"#, id % 4)
    };
    let verbal: Vec<String> = (1..=verbal).map(entry).collect();
    let quantitative: Vec<String> = (1..=quantitative).map(|i| entry(500 + i)).collect();
    format!(
        r#"{{"verbal":[{}],"quantitative":[{}]}}"#,
        verbal.join(","),
        quantitative.join(",")
    )
}

#[test]
fn custom_blob_attempt_scores_sixty_percent() {
    let pool = parse_question_bank(&bank_json(5, 5)).unwrap();
    let config = parse_configuration(
        r#"{"type":"custom","verbalQuestions":5,"quantitativeQuestions":5,"duration":15}"#,
    )
    .unwrap();
    let service = ExamService::new(Clock::fixed(fixed_now()), Arc::new(pool));

    let mut session = service.start(&config).unwrap();
    assert_eq!(session.total_questions(), 10);
    assert_eq!(session.current_question().category(), Category::Verbal);

    // 6 right, 2 wrong, 2 left unset.
    let mut position = 0;
    loop {
        let correct = session.current_question().correct_option();
        match position {
            0..=5 => session.select_current(correct).unwrap(),
            6 | 7 => session.select_current((correct + 1) % 4).unwrap(),
            _ => {}
        }
        match session.move_next() {
            Navigation::Moved(next) => position = next,
            Navigation::AtLastQuestion => break,
            Navigation::AtFirstQuestion => unreachable!(),
        }
    }

    let result = service
        .finish(&mut session, CompletionReason::FinishedEarly)
        .unwrap();
    assert_eq!(result.correct(), 6);
    assert_eq!(result.percentage(), 60);
    assert!(result.passed());
    assert_eq!(result.review_errors().count(), 4);
    assert_eq!(
        result.review_errors().filter(|item| item.chosen_option.is_none()).count(),
        2
    );
}

#[test]
fn qiyas_preset_runs_against_full_bank() {
    let pool = parse_question_bank(&bank_json(65, 55)).unwrap();
    let service = ExamService::new(Clock::fixed(fixed_now()), Arc::new(pool));

    let mut session = service.start(&TestConfiguration::qiyas()).unwrap();
    assert_eq!(session.total_questions(), 120);
    assert_eq!(session.remaining_at(fixed_now()), 120 * 60);

    let first = session.current_section().unwrap();
    assert_eq!((first.number, first.category, first.questions), (1, Category::Verbal, 13));

    for _ in 0..13 {
        session.move_next();
    }
    let second = session.current_section().unwrap();
    assert_eq!(second.number, 2);
    assert_eq!(second.category, Category::Quantitative);
}

#[test]
fn repeated_practice_avoids_previous_attempt() {
    let pool = parse_question_bank(&bank_json(10, 0)).unwrap();
    let service = ExamService::new(Clock::fixed(fixed_now()), Arc::new(pool));
    let config = TestConfiguration::custom(5, 0, 5).unwrap();

    let mut first = service.start(&config).unwrap();
    let first_result = service.finish(&mut first, CompletionReason::FinishedEarly).unwrap();
    let seen: HashSet<QuestionId> = first_result.question_ids().collect();

    let second = service.start_practice(&config, &seen).unwrap();
    assert_eq!(second.total_questions(), 5);
    assert!(second.questions().iter().all(|q| !seen.contains(&q.id())));
}

#[tokio::test(start_paused = true)]
async fn manual_finish_stops_the_countdown() {
    let pool = parse_question_bank(&bank_json(3, 0)).unwrap();
    let service = ExamService::new(Clock::fixed(fixed_now()), Arc::new(pool));
    let config = TestConfiguration::custom(3, 0, 2).unwrap();

    let mut exam = service
        .start_timed(&config, SelectionPolicy::InPoolOrder)
        .unwrap();
    assert_eq!(exam.events.recv().await, Some(TimerEvent::Tick { remaining: 119 }));

    assert!(exam.finish_now());
    assert_eq!(
        exam.events.recv().await,
        Some(TimerEvent::Completed(CompletionReason::FinishedEarly))
    );
    assert_eq!(exam.events.recv().await, None);

    let (session, result) = service
        .finish_timed(exam, CompletionReason::FinishedEarly)
        .unwrap();
    assert!(session.is_complete());
    assert_eq!(result.correct(), 0);
    assert!(!result.passed());
}
