use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::from_str;

use super::{WordSource, WordSourceError};
use crate::difficulty::Difficulty;

static LANG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lang");

pub const DEFAULT_NUMBER_OF_WORDS: usize = 30;

#[derive(Deserialize, Clone, Debug)]
pub struct WordList {
    pub name: String,
    pub size: u32,
    pub words: Vec<String>,
}

impl WordList {
    pub fn for_difficulty(difficulty: Difficulty) -> Result<Self, WordSourceError> {
        let file_name = format!("{}.json", difficulty.to_string().to_lowercase());
        read_word_list(&file_name)
    }
}

fn read_word_list(file_name: &str) -> Result<WordList, WordSourceError> {
    let file = LANG_DIR
        .get_file(file_name)
        .ok_or_else(|| WordSourceError::WordList(format!("{file_name} not found")))?;

    let contents = file
        .contents_utf8()
        .ok_or_else(|| WordSourceError::WordList(format!("{file_name} is not utf-8")))?;

    from_str(contents).map_err(|e| WordSourceError::WordList(format!("{file_name}: {e}")))
}

/// Offline source drawing random words from the embedded lists.
#[derive(Debug, Clone, Copy)]
pub struct LocalWordSource {
    number_of_words: usize,
}

impl LocalWordSource {
    pub fn new(number_of_words: usize) -> Self {
        Self { number_of_words }
    }
}

impl Default for LocalWordSource {
    fn default() -> Self {
        Self::new(DEFAULT_NUMBER_OF_WORDS)
    }
}

impl WordSource for LocalWordSource {
    fn fetch_words(&self, difficulty: Difficulty) -> Result<Vec<String>, WordSourceError> {
        let list = WordList::for_difficulty(difficulty)?;
        if list.words.is_empty() {
            return Ok(vec![]);
        }

        let mut rng = rand::thread_rng();
        // lists can be shorter than the requested count, so sample with replacement
        Ok((0..self.number_of_words)
            .filter_map(|_| list.words.choose(&mut rng).cloned())
            .collect())
    }
}
