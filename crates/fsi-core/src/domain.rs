//! Physical domains and the named boundary patches they expose.

use core::fmt;
use core::str::FromStr;

use crate::CoreError;

/// Physical body a mesh discretizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Domain {
    Solid,
    Fluid,
}

impl Domain {
    pub const ALL: [Domain; 2] = [Domain::Solid, Domain::Fluid];

    pub fn label(self) -> &'static str {
        match self {
            Domain::Solid => "solid",
            Domain::Fluid => "fluid",
        }
    }

    /// Capitalized prefix used for topology, basis and variable names.
    pub fn name_prefix(self) -> &'static str {
        match self {
            Domain::Solid => "Solid",
            Domain::Fluid => "Fluid",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Domain {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solid" => Ok(Domain::Solid),
            "fluid" => Ok(Domain::Fluid),
            other => Err(CoreError::UnknownTag {
                what: "domain",
                value: other.to_string(),
            }),
        }
    }
}

/// Role of a labelled boundary patch on a domain mesh.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PatchRole {
    Apex,
    Inlet,
    /// Fluid–solid interface.
    Interface,
}

impl PatchRole {
    pub const ALL: [PatchRole; 3] = [PatchRole::Apex, PatchRole::Inlet, PatchRole::Interface];

    pub fn label(self) -> &'static str {
        match self {
            PatchRole::Apex => "apex",
            PatchRole::Inlet => "inlet",
            PatchRole::Interface => "interface",
        }
    }
}

impl fmt::Display for PatchRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PatchRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PatchRole::ALL
            .into_iter()
            .find(|role| role.label() == s)
            .ok_or_else(|| CoreError::UnknownTag {
                what: "patch role",
                value: s.to_string(),
            })
    }
}
