use clap::ValueEnum;
use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

static PRACTICE_DIR: Dir = include_dir!("src/practice");

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
    De,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::En, Language::Es, Language::Fr, Language::De];

    fn file_name(self) -> String {
        format!("{self}.json")
    }
}

#[derive(Deserialize, Clone, Debug)]
struct PracticeSet {
    #[allow(dead_code)]
    name: String,
    texts: Vec<String>,
}

fn read_practice_set(language: Language) -> Result<PracticeSet> {
    let file = PRACTICE_DIR
        .get_file(language.file_name())
        .ok_or_else(|| Error::UnknownLanguage(language.to_string()))?;
    let contents = file
        .contents_utf8()
        .ok_or_else(|| Error::UnknownLanguage(language.to_string()))?;
    Ok(serde_json::from_str(contents)?)
}

/// All built-in practice texts for `language`
pub fn practice_texts(language: Language) -> Result<Vec<String>> {
    Ok(read_practice_set(language)?.texts)
}

pub fn random_practice_text(language: Language) -> Result<String> {
    let texts = practice_texts(language)?;
    texts
        .choose(&mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| Error::UnknownLanguage(language.to_string()))
}
