use crate::store::StoreError;

const SEPARATOR: char = ':';

fn check_segment(kind: &str, value: &str) -> Result<(), StoreError> {
    if value.is_empty() || value.contains(SEPARATOR) {
        return Err(StoreError::Validation(format!(
            "invalid {kind} for key: {value:?}"
        )));
    }
    Ok(())
}

/// `learner_id:lang`
pub fn profile_key(learner_id: &str, lang: &str) -> Result<String, StoreError> {
    check_segment("learner id", learner_id)?;
    check_segment("language", lang)?;
    Ok(format!("{learner_id}{SEPARATOR}{lang}"))
}

/// Prefix shared by every profile of one learner.
pub fn learner_prefix(learner_id: &str) -> Result<String, StoreError> {
    check_segment("learner id", learner_id)?;
    Ok(format!("{learner_id}{SEPARATOR}"))
}
