//! Type information structs for dynamic resources.
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// Core information about a family of API Resources
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupVersion {
    /// API group
    pub group: String,
    /// Version
    pub version: String,
}

impl GroupVersion {
    /// Construct from explicit group and version
    pub fn gv(group_: &str, version_: &str) -> Self {
        let version = version_.to_string();
        let group = group_.to_string();
        Self { group, version }
    }

    /// The core `v1` group version
    pub fn core_v1() -> Self {
        Self::gv("", "v1")
    }

    /// Generate the apiVersion string used in a kind's yaml
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Name of the directory holding this group in a dump
    pub fn dump_dir(&self) -> &str {
        if self.group.is_empty() {
            "core"
        } else {
            &self.group
        }
    }
}

impl FromStr for GroupVersion {
    type Err = Error;

    fn from_str(gv: &str) -> Result<Self, Self::Err> {
        let gvsplit = gv.splitn(2, '/').collect::<Vec<_>>();
        let (group, version) = match *gvsplit.as_slice() {
            [g, v] if !g.is_empty() && !v.is_empty() => (g.to_string(), v.to_string()), // standard case
            [v] if !v.is_empty() => ("".to_string(), v.to_string()),                     // core v1 case
            _ => return Err(Error::GroupVersion(gv.into())),
        };
        Ok(Self { group, version })
    }
}

impl fmt::Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.api_version())
    }
}
