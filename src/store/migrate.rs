use crate::engine::LearnerProfile;
use crate::store::{Store, StoreError};

const VERSION_KEY: &str = "_meta:version";

type MigrationFn = fn(&Store) -> Result<(), StoreError>;

fn migrations() -> Vec<(&'static str, MigrationFn)> {
    vec![
        ("001_initial", m001_initial),
        ("002_rederive_aggregates", m002_rederive_aggregates),
    ]
}

/// Runs every migration newer than the stored schema version.
///
/// Migrations must be idempotent: the process may stop after a migration ran
/// but before its version was recorded. The version only moves forward.
pub fn run(store: &Store) -> Result<(), StoreError> {
    let current = get_current_version(store)?;

    for (index, (name, func)) in migrations().iter().enumerate() {
        let version = (index + 1) as u32;
        if version > current {
            tracing::info!(version, name, "Running migration");
            func(store)?;
            set_version(store, version)?;
            tracing::info!(version, name, "Migration complete");
        } else {
            tracing::debug!(version, name, "Migration already applied, skipping");
        }
    }

    Ok(())
}

pub fn latest_version() -> u32 {
    migrations().len() as u32
}

pub fn get_current_version(store: &Store) -> Result<u32, StoreError> {
    match store.meta.get(VERSION_KEY.as_bytes())? {
        Some(raw) => {
            let bytes: [u8; 4] = raw.as_ref().try_into().map_err(|_| StoreError::Migration {
                version: 0,
                message: format!("corrupt schema version ({} bytes)", raw.len()),
            })?;
            Ok(u32::from_be_bytes(bytes))
        }
        None => Ok(0),
    }
}

pub fn set_version(store: &Store, version: u32) -> Result<(), StoreError> {
    let current = get_current_version(store)?;
    if version < current {
        return Err(StoreError::Migration {
            version,
            message: format!("Refuse to downgrade from {} to {}", current, version),
        });
    }

    store
        .meta
        .insert(VERSION_KEY.as_bytes(), &version.to_be_bytes())?;
    Ok(())
}

fn m001_initial(_store: &Store) -> Result<(), StoreError> {
    Ok(())
}

/// Recomputes cached averages from the stored sums.
fn m002_rederive_aggregates(store: &Store) -> Result<(), StoreError> {
    let mut batch = sled::Batch::default();
    let mut touched = 0usize;
    for item in store.learner_profiles.iter() {
        let (key, value) = item?;
        let mut profile: LearnerProfile = Store::deserialize(&value)?;
        profile.groups.values_mut().for_each(|g| g.rederive());
        profile.levels.values_mut().for_each(|l| l.rederive());
        batch.insert(key, Store::serialize(&profile)?);
        touched += 1;
    }
    store.learner_profiles.apply_batch(batch)?;
    tracing::info!(profiles = touched, "Aggregates re-derived");
    Ok(())
}
