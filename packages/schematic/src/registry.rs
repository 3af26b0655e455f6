//! Collaborators supplied by the host: the block registry and the version
//! upgrader. Codecs receive them through a `CodecContext` rather than
//! reaching for any global, so that different pipelines (or tests) can use
//! different ones side by side.

use crate::{
    block::{
        BlockState,
        AIR,
    },
    error::{
        Result,
        Error,
        ErrorKind,
        error,
        bail,
    },
};
use quartz_nbt::NbtCompound;


/// Data version of Minecraft 1.12.2.
pub const DEFAULT_DATA_VERSION: i32 = 1343;

/// Highest legacy block metadata value.
pub const MAX_LEGACY_META: u8 = 15;

/// Host block registry.
///
/// Converts between stored block-state tags and `BlockState` values. A host
/// may normalize, validate or reject states here.
pub trait BlockRegistry: Send + Sync {
    /// Interpret a `{Name, Properties}` compound.
    fn resolve(&self, tag: &NbtCompound, path: &str) -> Result<BlockState>;

    /// Produce the `{Name, Properties}` compound for a state.
    fn serialize(&self, state: &BlockState) -> NbtCompound;

    /// Name of a legacy numeric block id, for files that store numeric ids
    /// without a name mapping.
    fn legacy_name(&self, id: u16) -> Option<String> {
        let _ = id;
        None
    }

    /// Interpret a legacy block name plus metadata value.
    fn resolve_legacy(&self, name: &str, meta: u8) -> Result<BlockState>;

    /// Produce the legacy block name plus metadata value for a state.
    fn serialize_legacy(&self, state: &BlockState) -> Result<(String, u8)>;
}

/// Block registry which accepts every state as stored.
///
/// Legacy metadata values are carried through a `meta` property, so legacy
/// files round-trip without a host.
#[derive(Debug, Copy, Clone, Default)]
pub struct PassthroughRegistry;

impl BlockRegistry for PassthroughRegistry {
    fn resolve(&self, tag: &NbtCompound, path: &str) -> Result<BlockState> {
        BlockState::from_tag(tag, path)
    }

    fn serialize(&self, state: &BlockState) -> NbtCompound {
        state.to_tag()
    }

    fn resolve_legacy(&self, name: &str, meta: u8) -> Result<BlockState> {
        let state = BlockState::new(name);
        Ok(if meta == 0 {
            state
        } else {
            state.with("meta", meta.to_string())
        })
    }

    fn serialize_legacy(&self, state: &BlockState) -> Result<(String, u8)> {
        let mut meta = 0;
        for (key, value) in &state.properties {
            if key != "meta" {
                bail!(
                    Unrepresentable, None,
                    "block state {} has properties with no legacy equivalent", state,
                );
            }
            meta = value.parse::<u8>()
                .ok()
                .filter(|&meta| meta <= MAX_LEGACY_META)
                .ok_or_else(|| error!(
                    Unrepresentable, None, "invalid legacy meta {:?} in {}", value, state,
                ))?;
        }
        Ok((state.name.clone(), meta))
    }
}

/// Host data fixer, which migrates stored block states between data
/// versions.
pub trait VersionUpgrader: Send + Sync {
    /// Migrate a `{Name, Properties}` compound from data version `from` to
    /// data version `to`. Only called with `from < to`.
    fn upgrade_block_state(
        &self,
        tag: NbtCompound,
        from: i32,
        to: i32,
    ) -> Result<NbtCompound>;
}

/// Upgrader which leaves everything as it is.
#[derive(Debug, Copy, Clone, Default)]
pub struct NoopUpgrader;

impl VersionUpgrader for NoopUpgrader {
    fn upgrade_block_state(
        &self,
        tag: NbtCompound,
        _from: i32,
        _to: i32,
    ) -> Result<NbtCompound> {
        Ok(tag)
    }
}

/// Everything a codec needs from its surroundings.
#[derive(Copy, Clone)]
pub struct CodecContext<'a> {
    pub registry: &'a dyn BlockRegistry,
    pub upgrader: &'a dyn VersionUpgrader,
    /// The host's current data version. Data stored at an older version is
    /// upgraded to this one, and files are written stamped with it.
    pub data_version: i32,
}

impl CodecContext<'static> {
    /// Context with the passthrough registry and no-op upgrader.
    pub fn passthrough(data_version: i32) -> Self {
        CodecContext {
            registry: &PassthroughRegistry,
            upgrader: &NoopUpgrader,
            data_version,
        }
    }
}

impl Default for CodecContext<'static> {
    fn default() -> Self {
        CodecContext::passthrough(DEFAULT_DATA_VERSION)
    }
}

impl<'a> CodecContext<'a> {
    /// Resolve a stored palette entry, first upgrading it if it was stored at
    /// an older data version.
    ///
    /// `stored_version` of `None` means the file carries no version and is
    /// taken to be current.
    pub fn resolve_stored(
        &self,
        tag: &NbtCompound,
        stored_version: Option<i32>,
        path: &str,
    ) -> Result<BlockState> {
        match stored_version {
            Some(from) if from < self.data_version => {
                let upgraded = self.upgrader
                    .upgrade_block_state(tag.clone(), from, self.data_version)
                    .map_err(|e| upgrade_failure(e, path))?;
                self.registry.resolve(&upgraded, path)
            }
            _ => self.registry.resolve(tag, path),
        }
    }

    /// Log once per decode how a stored data version relates to the
    /// current one.
    pub fn note_stored_version(&self, stored_version: Option<i32>) {
        match stored_version {
            None => debug!("no data version stored, assuming current"),
            Some(v) if v < self.data_version => debug!(
                from = v, to = self.data_version, "upgrading stored block states",
            ),
            Some(v) if v > self.data_version => warn!(
                stored = v, current = self.data_version,
                "data was stored by a newer version, loading without upgrade",
            ),
            Some(_) => (),
        }
    }
}

// keep the upgrader's own error kind only if it already reports a failure to
// upgrade, otherwise wrap it as one
fn upgrade_failure(e: Error, path: &str) -> Error {
    if e.kind() == ErrorKind::UpgradeFailure {
        e.at(path)
    } else {
        Error::new(ErrorKind::UpgradeFailure, e, Some(path))
    }
}

/// Whether a legacy name refers to air.
pub fn is_legacy_air(name: &str) -> bool {
    name == AIR || name == "air"
}
