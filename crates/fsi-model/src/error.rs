//! Construction invariant violations.
//!
//! These indicate a mismatch between the validated configuration and the
//! model graph the assembler builds from it. They abort assembly before any
//! file is written and carry the context needed to locate the defect.

use fsi_core::{CoreError, Domain, ElementKind, OrderLevel, PatchRole};

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// A domain has no mesh registered for an order level the builder needs.
    MissingOrder { domain: Domain, order: OrderLevel },

    /// A boundary patch referenced during construction is absent from the mesh description.
    MissingPatch {
        context: String,
        domain: Domain,
        role: PatchRole,
    },

    /// A boundary-restricted topology or nested interface disagrees with the mesh description.
    NestMismatch {
        what: String,
        expected: u32,
        actual: u32,
    },

    /// The element kind has no lower-dimensional boundary element.
    NoBoundaryElement { elem: ElementKind },

    /// The loading curve has no segments.
    EmptyLoading,

    /// Two model objects of the same category share a name.
    DuplicateName { what: &'static str, name: String },

    /// An object refers to another object that is not part of the model.
    DanglingReference {
        from: String,
        what: &'static str,
        name: String,
    },

    /// A boundary curve depends on itself, directly or transitively.
    DependencyCycle { curve: String },

    /// A field variable's order level differs from its topology's.
    OrderMismatch {
        variable: String,
        topology: String,
    },
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::MissingOrder { domain, order } => {
                write!(f, "{} mesh has no entry for order level {}", domain, order)
            }
            ModelError::MissingPatch {
                context,
                domain,
                role,
            } => {
                write!(
                    f,
                    "{} requires the {} {} boundary patch, which the mesh description does not define",
                    context, domain, role
                )
            }
            ModelError::NestMismatch {
                what,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "{} is nested in boundary {} but the mesh description says {}",
                    what, actual, expected
                )
            }
            ModelError::NoBoundaryElement { elem } => {
                write!(f, "{} has no boundary element kind", elem)
            }
            ModelError::EmptyLoading => write!(f, "loading curve has no segments"),
            ModelError::DuplicateName { what, name } => {
                write!(f, "duplicate {} name '{}'", what, name)
            }
            ModelError::DanglingReference { from, what, name } => {
                write!(f, "{} refers to unknown {} '{}'", from, what, name)
            }
            ModelError::DependencyCycle { curve } => {
                write!(f, "boundary curve '{}' depends on itself", curve)
            }
            ModelError::OrderMismatch { variable, topology } => {
                write!(
                    f,
                    "variable '{}' does not share the order level of topology '{}'",
                    variable, topology
                )
            }
        }
    }
}

impl std::error::Error for ModelError {}

impl From<ModelError> for CoreError {
    fn from(err: ModelError) -> Self {
        CoreError::Invariant {
            what: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_patch_names_context_and_id() {
        let err = ModelError::MissingPatch {
            context: "fluid inlet velocity".to_string(),
            domain: Domain::Fluid,
            role: PatchRole::Inlet,
        };
        let msg = err.to_string();
        assert!(msg.contains("fluid inlet velocity"));
        assert!(msg.contains("fluid inlet"));
    }

    #[test]
    fn converts_to_core_invariant() {
        let core: CoreError = ModelError::EmptyLoading.into();
        assert!(matches!(core, CoreError::Invariant { .. }));
    }
}
