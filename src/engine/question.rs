//! Builds the presentable payload for a selected word.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::{ContentCatalog, DictionaryEntry, WordId};
use crate::engine::types::{
    ActivityType, Choice, Direction, Question, QuestionBody, Rank, WordDetails,
};
use crate::engine::EngineError;

pub struct QuestionSpec<'a> {
    pub word_id: WordId,
    pub target_lang: &'a str,
    pub native_lang: &'a str,
    pub activity: ActivityType,
    pub direction: Direction,
    pub rank: Rank,
    pub include_details: bool,
    pub mc_choice_count: usize,
}

pub fn build_question<R: Rng + ?Sized>(
    catalog: &ContentCatalog,
    spec: &QuestionSpec<'_>,
    rng: &mut R,
) -> Result<Question, EngineError> {
    let (prompt_lang, answer_lang) = match spec.direction {
        Direction::NativeToTarget => (spec.native_lang, spec.target_lang),
        Direction::TargetToNative => (spec.target_lang, spec.native_lang),
    };
    let prompt = text_of(catalog, prompt_lang, spec.word_id)?;
    let answer = text_of(catalog, answer_lang, spec.word_id)?;

    let body = match spec.activity {
        ActivityType::MultipleChoice => QuestionBody::MultipleChoice {
            choices: build_choices(
                catalog.entries(answer_lang),
                spec.word_id,
                &answer,
                spec.mc_choice_count,
                rng,
            )?,
        },
        ActivityType::FillInTheBlank => QuestionBody::FillInTheBlank { answer },
        ActivityType::Flashcard => QuestionBody::Flashcard {
            front: prompt.clone(),
            back: answer,
        },
    };

    let details = spec
        .include_details
        .then(|| catalog.word(spec.target_lang, spec.word_id).map(details_of))
        .flatten();

    Ok(Question {
        word_id: spec.word_id,
        activity: spec.activity,
        direction: spec.direction,
        rank: spec.rank,
        prompt,
        body,
        details,
    })
}

fn text_of(catalog: &ContentCatalog, lang: &str, word_id: WordId) -> Result<String, EngineError> {
    catalog
        .word_text(lang, word_id)
        .map(str::to_string)
        .ok_or_else(|| EngineError::UnknownWord {
            lang: lang.to_string(),
            word_id,
        })
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// One correct choice plus `count - 1` distractors with distinct texts,
/// shuffled.
fn build_choices<R: Rng + ?Sized>(
    entries: &[DictionaryEntry],
    word_id: WordId,
    answer: &str,
    count: usize,
    rng: &mut R,
) -> Result<Vec<Choice>, EngineError> {
    let wanted = count.saturating_sub(1);
    let mut seen: HashSet<String> = HashSet::from([normalize(answer)]);
    let pool: Vec<&str> = entries
        .iter()
        .filter(|entry| entry.id != word_id)
        .filter_map(DictionaryEntry::text)
        .filter(|text| seen.insert(normalize(text)))
        .collect();

    if pool.len() < wanted {
        return Err(EngineError::CannotBuildQuestion(format!(
            "word {word_id} needs {wanted} distractors, only {} available",
            pool.len()
        )));
    }

    let mut choices: Vec<Choice> = pool
        .choose_multiple(rng, wanted)
        .map(|text| Choice {
            text: text.to_string(),
            correct: false,
        })
        .collect();
    choices.push(Choice {
        text: answer.to_string(),
        correct: true,
    });
    choices.shuffle(rng);
    Ok(choices)
}

fn details_of(entry: &DictionaryEntry) -> WordDetails {
    WordDetails {
        part_of_speech: entry.part_of_speech.clone(),
        definition: entry.definition.clone(),
        examples: entry.examples.clone(),
        forms: entry.forms.clone(),
        synonyms: entry.synonyms.clone(),
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::catalog::fixtures::{catalog, entry, raw_catalog};

    fn spec(activity: ActivityType, direction: Direction) -> QuestionSpec<'static> {
        QuestionSpec {
            word_id: 1,
            target_lang: "es",
            native_lang: "en",
            activity,
            direction,
            rank: Rank::New,
            include_details: false,
            mc_choice_count: 4,
        }
    }

    #[test]
    fn multiple_choice_has_one_correct_and_distinct_distractors() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let q = build_question(
                &catalog,
                &spec(ActivityType::MultipleChoice, Direction::NativeToTarget),
                &mut rng,
            )
            .unwrap();
            assert_eq!(q.prompt, "dog");
            let QuestionBody::MultipleChoice { choices } = q.body else {
                panic!("expected multiple choice");
            };
            assert_eq!(choices.len(), 4);
            assert_eq!(choices.iter().filter(|c| c.correct).count(), 1);
            let correct = choices.iter().find(|c| c.correct).unwrap();
            assert_eq!(correct.text, "perro");
            let texts: HashSet<&str> = choices.iter().map(|c| c.text.as_str()).collect();
            assert_eq!(texts.len(), 4);
        }
    }

    #[test]
    fn distractors_skip_duplicate_and_untranslated_texts() {
        let mut raw = raw_catalog();
        let es = raw.dictionaries.get_mut("es").unwrap();
        es.truncate(4);
        es[1] = entry(2, Some("Perro "));
        es[2] = entry(3, None);
        let catalog = ContentCatalog::load(raw).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let mut small = spec(ActivityType::MultipleChoice, Direction::NativeToTarget);
        small.mc_choice_count = 2;
        let q = build_question(&catalog, &small, &mut rng).unwrap();
        let QuestionBody::MultipleChoice { choices } = q.body else {
            panic!("expected multiple choice");
        };
        let distractor = choices.iter().find(|c| !c.correct).unwrap();
        assert_eq!(distractor.text, "rojo");

        let err = build_question(
            &catalog,
            &spec(ActivityType::MultipleChoice, Direction::NativeToTarget),
            &mut rng,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::CannotBuildQuestion(_)));
    }

    #[test]
    fn direction_picks_prompt_side() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(3);

        let q = build_question(
            &catalog,
            &spec(ActivityType::FillInTheBlank, Direction::TargetToNative),
            &mut rng,
        )
        .unwrap();
        assert_eq!(q.prompt, "perro");
        assert!(matches!(q.body, QuestionBody::FillInTheBlank { ref answer } if answer == "dog"));

        let q = build_question(
            &catalog,
            &spec(ActivityType::Flashcard, Direction::NativeToTarget),
            &mut rng,
        )
        .unwrap();
        assert!(matches!(
            q.body,
            QuestionBody::Flashcard { ref front, ref back } if front == "dog" && back == "perro"
        ));
    }

    #[test]
    fn details_come_from_target_entry_when_requested() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(3);
        let mut with_details = spec(ActivityType::Flashcard, Direction::NativeToTarget);
        with_details.include_details = true;

        let q = build_question(&catalog, &with_details, &mut rng).unwrap();
        let details = q.details.unwrap();
        assert_eq!(details.definition.as_deref(), Some("definition of perro"));
        assert_eq!(details.part_of_speech.as_deref(), Some("noun"));

        let q = build_question(
            &catalog,
            &spec(ActivityType::Flashcard, Direction::NativeToTarget),
            &mut rng,
        )
        .unwrap();
        assert!(q.details.is_none());
    }
}
