use std::error::Error;
use std::time::Instant;

use chrono::Utc;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::from_str;
use tracing::warn;

use crate::stats::{practice_aggregate, PracticeResult, PracticeStats};
use crate::store::{Area, Store, PRACTICE_STATS_KEY};

static PROMPT_DIR: Dir = include_dir!("src/prompts");

#[derive(Deserialize, Clone, Debug)]
pub struct PromptSet {
    pub name: String,
    pub prompts: Vec<String>,
}

impl PromptSet {
    pub fn load(name: &str) -> Self {
        read_prompts_from_file(format!("{name}.json")).unwrap()
    }
}

pub fn default_prompts() -> Vec<String> {
    PromptSet::load("default").prompts
}

fn read_prompts_from_file(file_name: String) -> Result<PromptSet, Box<dyn Error>> {
    let file = PROMPT_DIR
        .get_file(file_name)
        .expect("Prompt file not found");

    let file_as_str = file
        .contents_utf8()
        .expect("Unable to interpret file as a string");

    let set = from_str(file_as_str).expect("Unable to deserialize prompt json");

    Ok(set)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Input {
    pub char: char,
    pub outcome: Outcome,
}

/// One drill over a fixed prompt. The clock starts on the first keystroke
/// and stops when the input reaches the prompt length.
#[derive(Debug, Clone)]
pub struct Drill {
    pub prompt: String,
    prompt_chars: Vec<char>,
    pub input: Vec<Input>,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    saved: bool,
}

impl Drill {
    pub fn new(prompt: String) -> Self {
        let prompt_chars = prompt.chars().collect();
        Self {
            prompt,
            prompt_chars,
            input: Vec::new(),
            started_at: None,
            finished_at: None,
            saved: false,
        }
    }

    pub fn random(prompts: &[String]) -> Self {
        let prompt = prompts
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default();
        Self::new(prompt)
    }

    /// A fresh drill over a prompt other than `current`, when the set has
    /// more than one.
    pub fn different(prompts: &[String], current: &str) -> Self {
        let others: Vec<String> = prompts.iter().filter(|p| *p != current).cloned().collect();
        if others.is_empty() {
            Self::random(prompts)
        } else {
            Self::random(&others)
        }
    }

    /// Same prompt, state wiped.
    pub fn restart(&mut self) {
        *self = Self::new(self.prompt.clone());
    }

    pub fn write(&mut self, c: char) {
        if self.has_finished() || self.input.len() >= self.prompt_chars.len() {
            return;
        }
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
        let expected = self.prompt_chars[self.input.len()];
        let outcome = if c == expected {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        };
        self.input.push(Input { char: c, outcome });
        if self.input.len() == self.prompt_chars.len() {
            self.finished_at = Some(Instant::now());
        }
    }

    pub fn backspace(&mut self) {
        if self.has_finished() {
            return;
        }
        self.input.pop();
    }

    pub fn cursor_pos(&self) -> usize {
        self.input.len()
    }

    pub fn expected_char(&self, idx: usize) -> char {
        self.prompt_chars.get(idx).copied().unwrap_or(' ')
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn has_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    pub fn elapsed_secs(&self) -> f64 {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => end.duration_since(start).as_secs_f64(),
            (Some(start), None) => start.elapsed().as_secs_f64(),
            _ => 0.0,
        }
    }

    /// Words per minute over the prompt's word count, the way the numbers
    /// are quoted on typing sites.
    pub fn wpm(&self) -> i64 {
        let minutes = self.elapsed_secs() / 60.0;
        if !self.has_started() || minutes <= 0.0 {
            return 0;
        }
        let words = self.prompt.split_whitespace().count() as f64;
        (words / minutes).round() as i64
    }

    pub fn accuracy(&self) -> i64 {
        if self.prompt_chars.is_empty() {
            return 0;
        }
        let correct = self
            .input
            .iter()
            .filter(|i| i.outcome == Outcome::Correct)
            .count();
        ((correct as f64 / self.prompt_chars.len() as f64) * 100.0).round() as i64
    }

    /// The result to persist, produced once per finished drill.
    pub fn finish_result(&mut self) -> Option<PracticeResult> {
        if !self.has_finished() || self.saved {
            return None;
        }
        self.saved = true;
        Some(PracticeResult {
            date: Utc::now(),
            wpm: self.wpm(),
            accuracy: self.accuracy(),
            text: self.prompt.clone(),
        })
    }
}

pub fn load_stats(store: &Store) -> PracticeStats {
    store.get_or(Area::Local, PRACTICE_STATS_KEY, PracticeStats::default())
}

/// Append a result and rewrite the stats blob. Returns the fresh stats;
/// a failed write is logged and the caller still gets them.
pub fn save_result(store: &Store, result: PracticeResult) -> PracticeStats {
    let mut results = load_stats(store).results;
    results.push(result);
    let stats = practice_aggregate(results);
    if let Err(err) = store.set(Area::Local, PRACTICE_STATS_KEY, &stats) {
        warn!(%err, "could not persist practice stats");
    }
    stats
}

pub fn clear_stats(store: &Store) {
    if let Err(err) = store.remove(Area::Local, PRACTICE_STATS_KEY) {
        warn!(%err, "could not clear practice stats");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn finished_drill(prompt: &str) -> Drill {
        let mut drill = Drill::new(prompt.to_string());
        for c in prompt.chars() {
            drill.write(c);
        }
        assert!(drill.has_finished());
        drill
    }

    #[test]
    fn default_prompt_set_loads() {
        let set = PromptSet::load("default");

        assert_eq!(set.name, "default");
        assert_eq!(set.prompts.len(), 4);
        assert!(set.prompts.iter().all(|p| !p.is_empty()));
    }

    #[test]
    #[should_panic(expected = "Prompt file not found")]
    fn missing_prompt_set_panics() {
        let _ = read_prompts_from_file("nonexistent.json".to_string());
    }

    #[test]
    fn clock_starts_on_first_keystroke() {
        let mut drill = Drill::new("ab".to_string());
        assert!(!drill.has_started());
        assert_eq!(drill.elapsed_secs(), 0.0);

        drill.write('a');
        assert!(drill.has_started());
        assert!(!drill.has_finished());
    }

    #[test]
    fn drill_finishes_at_prompt_length() {
        let mut drill = Drill::new("hi".to_string());
        drill.write('h');
        drill.write('i');

        assert!(drill.has_finished());
        assert_eq!(drill.accuracy(), 100);
    }

    #[test]
    fn input_after_finish_is_ignored() {
        let mut drill = finished_drill("hi");
        drill.write('x');
        drill.backspace();

        assert_eq!(drill.input.len(), 2);
        assert!(drill.has_finished());
    }

    #[test]
    fn outcomes_track_the_prompt() {
        let mut drill = Drill::new("ab".to_string());
        drill.write('a');
        drill.write('x');

        assert_eq!(drill.input[0].outcome, Outcome::Correct);
        assert_eq!(drill.input[1].outcome, Outcome::Incorrect);
        assert_eq!(drill.accuracy(), 50);
    }

    #[test]
    fn backspace_recovers_a_mistake() {
        let mut drill = Drill::new("ab".to_string());
        drill.write('x');
        drill.backspace();
        drill.write('a');
        drill.write('b');

        assert_eq!(drill.accuracy(), 100);
    }

    #[test]
    fn all_wrong_scores_zero() {
        let mut drill = Drill::new("ab".to_string());
        drill.write('x');
        drill.write('y');

        assert_eq!(drill.accuracy(), 0);
    }

    #[test]
    fn wpm_is_zero_before_start() {
        let drill = Drill::new("hello world".to_string());
        assert_eq!(drill.wpm(), 0);
    }

    #[test]
    fn wpm_counts_prompt_words_over_elapsed_time() {
        let mut drill = finished_drill("The quick brown fox jumps over the lazy dog.");
        let now = Instant::now();
        drill.started_at = Some(now - Duration::from_secs(60));
        drill.finished_at = Some(now);

        assert_eq!(drill.wpm(), 9);
    }

    #[test]
    fn finish_result_fires_once() {
        let mut drill = finished_drill("hi");

        let first = drill.finish_result();
        let second = drill.finish_result();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(first.unwrap().text, "hi");
    }

    #[test]
    fn unfinished_drill_has_no_result() {
        let mut drill = Drill::new("hi".to_string());
        drill.write('h');

        assert!(drill.finish_result().is_none());
    }

    #[test]
    fn restart_wipes_state_but_keeps_prompt() {
        let mut drill = finished_drill("hi");
        drill.restart();

        assert_eq!(drill.prompt, "hi");
        assert!(drill.input.is_empty());
        assert!(!drill.has_started());
        assert!(drill.finish_result().is_none());
    }

    #[test]
    fn different_picks_the_other_prompt() {
        let prompts = vec!["one".to_string(), "two".to_string()];
        for _ in 0..10 {
            let drill = Drill::different(&prompts, "one");
            assert_eq!(drill.prompt, "two");
        }
    }

    #[test]
    fn random_over_empty_set_is_empty() {
        let drill = Drill::random(&[]);
        assert!(drill.prompt.is_empty());
    }

    #[test]
    fn saves_accumulate_into_stats() {
        let store = Store::open_in_memory().unwrap();

        let mut first = finished_drill("hi");
        let mut result = first.finish_result().unwrap();
        result.wpm = 40;
        result.accuracy = 90;
        save_result(&store, result);

        let mut second = finished_drill("hi");
        let mut result = second.finish_result().unwrap();
        result.wpm = 60;
        result.accuracy = 80;
        let stats = save_result(&store, result);

        assert_eq!(stats.total_practices, 2);
        assert_eq!(stats.best_wpm, 60);
        assert_eq!(stats.best_accuracy, 90);
        assert_eq!(load_stats(&store), stats);
    }

    #[test]
    fn clear_then_load_returns_defaults() {
        let store = Store::open_in_memory().unwrap();
        let mut drill = finished_drill("hi");
        save_result(&store, drill.finish_result().unwrap());

        clear_stats(&store);

        assert_eq!(load_stats(&store), PracticeStats::default());
    }
}
