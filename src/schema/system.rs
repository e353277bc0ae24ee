//! Records of the composition sections of a `.top` file.

use std::fmt;

use smol_str::SmolStr;

use super::error::RecordError;
use super::fields::Fields;

/// One line of `[ system ]`; the system name is all of them joined.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemName(pub String);

impl SystemName {
    pub fn parse(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        Ok(Self(fields.text().to_string()))
    }
}

impl fmt::Display for SystemName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One line of `[ molecules ]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoleculeCount {
    pub name: SmolStr,
    pub count: u32,
}

impl MoleculeCount {
    pub fn new(name: impl Into<SmolStr>, count: u32) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }

    pub fn parse(fields: &mut Fields<'_>) -> Result<Self, RecordError> {
        Ok(Self {
            name: fields.required("name")?,
            count: fields.required("count")?,
        })
    }
}

impl fmt::Display for MoleculeCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<10} {:>8}", self.name, self.count)
    }
}
