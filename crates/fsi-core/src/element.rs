//! Supported element kinds.

use core::fmt;
use core::str::FromStr;

use crate::CoreError;

/// Element shape of a mesh, as named by the solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ElementKind {
    #[cfg_attr(feature = "serde", serde(rename = "POINT_ELEMENT"))]
    Point,
    #[cfg_attr(feature = "serde", serde(rename = "LINE_ELEMENT"))]
    Line,
    #[cfg_attr(feature = "serde", serde(rename = "TRIANGLE_ELEMENT"))]
    Triangle,
    #[cfg_attr(feature = "serde", serde(rename = "QUADRILATERAL_ELEMENT"))]
    Quadrilateral,
    #[cfg_attr(feature = "serde", serde(rename = "TETRAHEDRAL_ELEMENT"))]
    Tetrahedral,
    #[cfg_attr(feature = "serde", serde(rename = "HEXAHEDRAL_ELEMENT"))]
    Hexahedral,
}

impl ElementKind {
    pub const ALL: [ElementKind; 6] = [
        ElementKind::Point,
        ElementKind::Line,
        ElementKind::Triangle,
        ElementKind::Quadrilateral,
        ElementKind::Tetrahedral,
        ElementKind::Hexahedral,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            ElementKind::Point => "POINT_ELEMENT",
            ElementKind::Line => "LINE_ELEMENT",
            ElementKind::Triangle => "TRIANGLE_ELEMENT",
            ElementKind::Quadrilateral => "QUADRILATERAL_ELEMENT",
            ElementKind::Tetrahedral => "TETRAHEDRAL_ELEMENT",
            ElementKind::Hexahedral => "HEXAHEDRAL_ELEMENT",
        }
    }

    /// Topological dimension of the element.
    pub fn dimension(self) -> u8 {
        match self {
            ElementKind::Point => 0,
            ElementKind::Line => 1,
            ElementKind::Triangle | ElementKind::Quadrilateral => 2,
            ElementKind::Tetrahedral | ElementKind::Hexahedral => 3,
        }
    }

    /// Element kind of the boundary facets, `None` for points.
    pub fn boundary(self) -> Option<ElementKind> {
        match self {
            ElementKind::Point => None,
            ElementKind::Line => Some(ElementKind::Point),
            ElementKind::Triangle | ElementKind::Quadrilateral => Some(ElementKind::Line),
            ElementKind::Tetrahedral => Some(ElementKind::Triangle),
            ElementKind::Hexahedral => Some(ElementKind::Quadrilateral),
        }
    }
}

impl FromStr for ElementKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ElementKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == s)
            .ok_or_else(|| CoreError::UnknownTag {
                what: "element kind",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for kind in ElementKind::ALL {
            assert_eq!(kind.tag().parse::<ElementKind>(), Ok(kind));
        }
    }

    #[test]
    fn unknown_tag_rejected() {
        let err = "PRISM_ELEMENT".parse::<ElementKind>().unwrap_err();
        assert!(err.to_string().contains("PRISM_ELEMENT"));
    }

    #[test]
    fn boundary_drops_one_dimension() {
        for kind in ElementKind::ALL {
            if let Some(bnd) = kind.boundary() {
                assert_eq!(bnd.dimension() + 1, kind.dimension());
            }
        }
    }
}
