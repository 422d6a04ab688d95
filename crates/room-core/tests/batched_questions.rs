//! Batched question schedule tests
//!
//! A fixed number of questions spread over every `question_interval`-th
//! observation of the episode.

use room_core::{Action, ConfigError, EnvConfig, QuestionSchedule, RoomEnv, RoomEnvError};

fn batched_config(num_total_questions: u64, question_interval: u64) -> EnvConfig {
    EnvConfig::default()
        .with_terminates_at(19)
        .with_questions(QuestionSchedule::Batched {
            num_total_questions,
            question_interval,
        })
}

#[test]
fn test_invalid_schedules_rejected() {
    assert!(matches!(
        RoomEnv::new(batched_config(99, 1)),
        Err(RoomEnvError::Config(ConfigError::QuestionTotal { .. }))
    ));
    assert!(matches!(
        RoomEnv::new(batched_config(100, 3)),
        Err(RoomEnvError::Config(ConfigError::QuestionInterval { .. }))
    ));
}

#[test]
fn test_total_questions_over_episode() {
    let mut env = RoomEnv::new(batched_config(100, 2)).unwrap();
    let (observation, _) = env.reset(None).unwrap();
    assert!(observation.questions.is_empty());

    let mut total = 0;
    loop {
        let num_questions = env.pending_answers().len();
        total += num_questions;

        let answers = vec!["nowhere"; num_questions];
        let outcome = env.step(&answers, Action::Stay).unwrap();
        assert_eq!(outcome.reward, -(num_questions as f64));

        if outcome.done {
            break;
        }
        let t = env.current_time();
        let expected = if (t + 1) % 2 == 0 { 10 } else { 0 };
        assert_eq!(outcome.observation.questions.len(), expected, "time {}", t);
    }

    assert_eq!(total, 100);
}

#[test]
fn test_wrong_answer_count_rejected() {
    let mut env = RoomEnv::new(batched_config(100, 1)).unwrap();
    let (observation, _) = env.reset(None).unwrap();
    assert_eq!(observation.questions.len(), 5);

    let err = env.step(&["kitchen"], Action::Stay).unwrap_err();
    assert!(matches!(
        err,
        RoomEnvError::InvalidAnswer {
            expected: 5,
            got: 1
        }
    ));

    let answers = vec!["kitchen"; 5];
    assert!(env.step(&answers, Action::Stay).is_ok());
}

#[test]
fn test_no_questions_means_zero_reward() {
    let mut env = RoomEnv::new(batched_config(20, 10)).unwrap();
    env.reset(None).unwrap();

    for _ in 0..9 {
        assert!(env.pending_answers().is_empty());
        let outcome = env.step::<&str>(&[], Action::North).unwrap();
        assert_eq!(outcome.reward, 0.0);
    }
    assert_eq!(env.pending_answers().len(), 10);
}
