//! Block state values, as stored in a palette.

use crate::{
    error::{
        Result,
        Error,
        error,
        ensure,
    },
    nbt,
};
use quartz_nbt::{
    NbtCompound,
    NbtTag,
};
use std::{
    collections::BTreeMap,
    fmt::{self, Formatter, Display},
    str::FromStr,
};


/// Name of the air block, the default content of every new region.
pub const AIR: &'static str = "minecraft:air";

/// A block type plus its property values.
///
/// The codecs treat this as opaque: it is only ever compared, hashed, and
/// converted to and from its stored forms. Properties are kept sorted so that
/// two states with the same properties in different stored orders are equal.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct BlockState {
    pub name: String,
    pub properties: BTreeMap<String, String>,
}

impl BlockState {
    /// Construct without properties.
    pub fn new(name: impl Into<String>) -> Self {
        BlockState {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn air() -> Self {
        BlockState::new(AIR)
    }

    pub fn is_air(&self) -> bool {
        self.name == AIR
    }

    /// Builder-style property setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Read from a `{Name, Properties}` compound.
    pub fn from_tag(tag: &NbtCompound, path: &str) -> Result<Self> {
        let name = nbt::req_str(tag, "Name", path)?;
        let mut state = BlockState::new(name);
        if let Some(properties) = nbt::opt_compound(tag, "Properties") {
            for (key, value) in properties.inner() {
                match value {
                    &NbtTag::String(ref value) => {
                        state.properties.insert(key.clone(), value.clone());
                    }
                    _ => return Err(error!(
                        MalformedTag,
                        Some(&nbt::child(&nbt::child(path, "Properties"), key)),
                        "block property must be a string",
                    )),
                }
            }
        }
        Ok(state)
    }

    /// Write as a `{Name, Properties}` compound, omitting `Properties` when
    /// there are none.
    pub fn to_tag(&self) -> NbtCompound {
        let mut tag = NbtCompound::new();
        tag.insert("Name", NbtTag::String(self.name.clone()));
        if !self.properties.is_empty() {
            let mut properties = NbtCompound::new();
            for (key, value) in &self.properties {
                properties.insert(key.clone(), NbtTag::String(value.clone()));
            }
            tag.insert("Properties", NbtTag::Compound(properties));
        }
        tag
    }

    /// Whether the `name[key=value,...]` form represents this state
    /// unambiguously: no name, key or value contains a delimiter or has
    /// surrounding whitespace, and only values may be empty.
    pub fn has_string_form(&self) -> bool {
        const DELIMITERS: &[char] = &['[', ']', ',', '='];
        let clean = |s: &str| s.trim() == s && !s.contains(DELIMITERS);
        !self.name.is_empty()
        && clean(&self.name)
        && self.properties
            .iter()
            .all(|(key, value)| !key.is_empty() && clean(key) && clean(value))
    }
}

impl Default for BlockState {
    fn default() -> Self {
        BlockState::air()
    }
}

/// Formats as `name[key=value,...]`, the form used as sponge palette keys.
impl Display for BlockState {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.properties.is_empty() {
            f.write_str("[")?;
            for (i, (key, value)) in self.properties.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}={}", key, value)?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

impl FromStr for BlockState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (name, rest) = match s.find('[') {
            Some(i) => (&s[..i], Some(&s[i + 1..])),
            None => (s, None),
        };
        ensure!(!name.is_empty(), MalformedTag, None, "empty block name in {:?}", s);
        let mut state = BlockState::new(name);
        if let Some(rest) = rest {
            let inner = rest.strip_suffix(']')
                .ok_or_else(|| error!(MalformedTag, None, "unclosed block state {:?}", s))?;
            for pair in inner.split(',').filter(|pair| !pair.is_empty()) {
                let (key, value) = pair.split_once('=')
                    .ok_or_else(|| error!(
                        MalformedTag, None, "bad block property {:?} in {:?}", pair, s,
                    ))?;
                state.properties.insert(key.trim().to_owned(), value.trim().to_owned());
            }
        }
        Ok(state)
    }
}

impl From<&str> for BlockState {
    fn from(name: &str) -> Self {
        BlockState::new(name)
    }
}
