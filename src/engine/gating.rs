//! Which groups and levels a learner may study.
//!
//! The first level is always open and level n+1 opens once level n is
//! unlocked. Inside an open level the first group is open and group k+1 opens
//! once group k is unlocked. An unlocked level stays open; an unlocked group
//! is open whenever its level is.

use crate::catalog::{ContentCatalog, GroupId, LevelId};
use crate::engine::profile::LearnerProfile;

pub fn is_level_open(catalog: &ContentCatalog, profile: &LearnerProfile, level_id: LevelId) -> bool {
    let Some(pos) = catalog.level_position(level_id) else {
        return false;
    };
    if pos == 0 || profile.level_unlocked(level_id) {
        return true;
    }
    profile.level_unlocked(catalog.levels()[pos - 1].id)
}

pub fn is_group_open(catalog: &ContentCatalog, profile: &LearnerProfile, group_id: GroupId) -> bool {
    let Some(level_id) = catalog.level_of_group(group_id) else {
        return false;
    };
    if !is_level_open(catalog, profile, level_id) {
        return false;
    }
    if profile.group_unlocked(group_id) {
        return true;
    }
    match (catalog.level(level_id), catalog.group_position(group_id)) {
        (Some(_), Some(0)) => true,
        (Some(level), Some(pos)) => profile.group_unlocked(level.groups[pos - 1]),
        _ => false,
    }
}

/// Open levels in catalog order.
pub fn open_levels(catalog: &ContentCatalog, profile: &LearnerProfile) -> Vec<LevelId> {
    catalog
        .levels()
        .iter()
        .filter(|level| is_level_open(catalog, profile, level.id))
        .map(|level| level.id)
        .collect()
}

/// Open groups in catalog order.
pub fn open_groups(catalog: &ContentCatalog, profile: &LearnerProfile) -> Vec<GroupId> {
    catalog
        .levels()
        .iter()
        .filter(|level| is_level_open(catalog, profile, level.id))
        .flat_map(|level| level.groups.iter().copied())
        .filter(|group_id| is_group_open(catalog, profile, *group_id))
        .collect()
}

/// The group that follows `group_id` inside its level.
pub fn next_group(catalog: &ContentCatalog, group_id: GroupId) -> Option<GroupId> {
    let level = catalog.level(catalog.level_of_group(group_id)?)?;
    let pos = catalog.group_position(group_id)?;
    level.groups.get(pos + 1).copied()
}

pub fn next_level(catalog: &ContentCatalog, level_id: LevelId) -> Option<LevelId> {
    let pos = catalog.level_position(level_id)?;
    catalog.levels().get(pos + 1).map(|level| level.id)
}
