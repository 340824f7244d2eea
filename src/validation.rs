//! 公共验证函数模块
//! Identifier checks shared by the catalog loader and the HTTP layer.

use crate::constants::MAX_LEARNER_ID_LEN;

/// Language code: 2-3 lowercase ASCII letters, optionally followed by a
/// `-` and a 2-8 character lowercase alphanumeric subtag (`pt`, `pt-br`, `yue`).
pub fn is_valid_lang_code(code: &str) -> bool {
    let (primary, subtag) = match code.split_once('-') {
        Some((primary, subtag)) => (primary, Some(subtag)),
        None => (code, None),
    };
    if !(2..=3).contains(&primary.len()) || !primary.bytes().all(|b| b.is_ascii_lowercase()) {
        return false;
    }
    match subtag {
        None => true,
        Some(sub) => {
            (2..=8).contains(&sub.len())
                && sub
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        }
    }
}

/// 学习者 id：1-64 字符，只允许字母、数字、下划线和连字符
pub fn validate_learner_id(learner_id: &str) -> Result<(), &'static str> {
    if learner_id.is_empty() || learner_id.len() > MAX_LEARNER_ID_LEN {
        return Err("learner id must be between 1 and 64 characters");
    }
    if !learner_id
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err("learner id may only contain letters, digits, '_' and '-'");
    }
    Ok(())
}
