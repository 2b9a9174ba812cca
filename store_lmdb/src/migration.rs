//! Schema versioning for the LMDB environment.
//!
//! The layout version lives in the `meta` database. Opening an environment
//! stamps a fresh one with [`SCHEMA_VERSION`], upgrades an older one step by
//! step and refuses one written by a newer build.

use tracing::{debug, info};

use crate::environment::LmdbEnvironment;
use crate::LmdbError;

/// Layout this build reads and writes.
///
/// v1: `users`, `users_by_email`, `signatures`, `signatures_by_owner`,
/// `history`, `history_seq`, `revoked_sessions`.
pub const SCHEMA_VERSION: u32 = 1;

const VERSION_KEY: &str = "schema_version";

/// Bring `env` to [`SCHEMA_VERSION`].
pub(crate) fn upgrade(env: &LmdbEnvironment) -> Result<(), LmdbError> {
    let found = stored_version(env)?;
    match found {
        v if v == SCHEMA_VERSION => {
            debug!(version = v, "schema current");
            return Ok(());
        }
        v if v > SCHEMA_VERSION => {
            return Err(LmdbError::SchemaTooNew {
                found: v,
                supported: SCHEMA_VERSION,
            })
        }
        _ => {}
    }

    for from in found..SCHEMA_VERSION {
        upgrade_step(from)?;
        info!(from, to = from + 1, "schema upgraded");
    }
    env.put_meta(VERSION_KEY, &SCHEMA_VERSION.to_be_bytes())
}

/// Stored layout version; 0 when the environment has never been stamped.
pub fn stored_version(env: &LmdbEnvironment) -> Result<u32, LmdbError> {
    let Some(bytes) = env.get_meta(VERSION_KEY)? else {
        return Ok(0);
    };
    let bytes: [u8; 4] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| LmdbError::Serialization(format!("{VERSION_KEY} is {} bytes", bytes.len())))?;
    Ok(u32::from_be_bytes(bytes))
}

fn upgrade_step(from: u32) -> Result<(), LmdbError> {
    match from {
        // Empty environment, the databases are created on open.
        0 => Ok(()),
        other => Err(LmdbError::NoUpgradePath(other)),
    }
}
