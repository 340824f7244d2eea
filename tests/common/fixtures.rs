use std::fs;
use std::path::Path;

use serde_json::{json, Value};

pub const EN_WORDS: [&str; 12] = [
    "dog", "cat", "bird", "red", "blue", "green", "one", "two", "three", "bread", "milk",
    "water",
];
pub const ES_WORDS: [&str; 12] = [
    "perro", "gato", "pájaro", "rojo", "azul", "verde", "uno", "dos", "tres", "pan", "leche",
    "agua",
];

fn dictionary(words: &[&str]) -> Value {
    Value::Array(
        words
            .iter()
            .enumerate()
            .map(|(i, word)| {
                json!({
                    "id": i + 1,
                    "word": word,
                    "partOfSpeech": "noun",
                    "definition": format!("definition of {word}"),
                })
            })
            .collect(),
    )
}

/// Writes a two-language catalog under `dir`:
/// level 100 = groups 10 (words 1-3), 11 (4-6); level 200 = groups 20 (7-9), 21 (10-12).
/// The `fr` dictionary only translates words 1-6.
pub fn write_catalog(dir: &Path) {
    let dict_dir = dir.join("dictionaries");
    fs::create_dir_all(&dict_dir).expect("create dictionaries dir");

    fs::write(dict_dir.join("en.json"), dictionary(&EN_WORDS).to_string()).expect("write en");
    fs::write(dict_dir.join("es.json"), dictionary(&ES_WORDS).to_string()).expect("write es");

    let mut fr: Vec<Value> = ["chien", "chat", "oiseau", "rouge", "bleu", "vert"]
        .iter()
        .enumerate()
        .map(|(i, word)| json!({ "id": i + 1, "word": word }))
        .collect();
    fr.extend((7..=12).map(|id| json!({ "id": id, "word": null })));
    fs::write(dict_dir.join("fr.json"), Value::Array(fr).to_string()).expect("write fr");

    let group = |id: u32, words: std::ops::RangeInclusive<u32>| {
        json!({
            "id": id,
            "name": format!("group-{id}"),
            "words": words.map(|w| json!({ "id": w })).collect::<Vec<_>>(),
        })
    };
    let groups = json!([group(10, 1..=3), group(11, 4..=6), group(20, 7..=9), group(21, 10..=12)]);
    fs::write(dir.join("groups.json"), groups.to_string()).expect("write groups");

    let levels = json!([
        { "id": 100, "name": "basics", "groups": [10, 11] },
        { "id": 200, "name": "everyday", "groups": [20, 21] },
    ]);
    fs::write(dir.join("levels.json"), levels.to_string()).expect("write levels");
}

pub fn answer(word_id: u32, activity: &str, difficulty: &str, outcome: &str) -> Value {
    json!({
        "wordId": word_id,
        "activity": activity,
        "difficulty": difficulty,
        "outcome": outcome,
    })
}

/// Fill-in-the-blank, hard, correct: the largest single gain (+8).
pub fn strong_answer(word_id: u32) -> Value {
    answer(word_id, "fillInTheBlank", "hard", "correct")
}
