//! Validation of untyped configuration trees into a [`ProblemDescription`].
//!
//! Every field is checked for presence, primitive type and (for variants) a
//! recognized `type` tag before it is used. The first failure wins and is
//! reported with its path-qualified key, e.g. `time.step is not a float`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fsi_core::{Domain, ElementKind, OrderLevel, PatchRole};
use serde_json::{Map, Value};

use crate::schema::{
    AssemblyOptions, BoundaryPatches, CurveSegment, ExportFrequency, LoadingDescription,
    MaterialDescription, MeshDescription, MeshFileDef, ProblemDescription, SpaceProfile,
    StabilizationPolicy, TimeDef,
};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{path} is missing")]
    Missing { path: String },

    #[error("{path} is not {expected}")]
    WrongType {
        path: String,
        expected: &'static str,
    },

    #[error("{path} {reason}")]
    InvalidValue { path: String, reason: String },

    #[error("{path} must be {expected}")]
    UnknownVariant {
        path: String,
        expected: &'static str,
    },

    #[error("{path} for {variant} must hold exactly {expected} number(s), found {found}")]
    Arity {
        path: String,
        variant: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{path} directory does not exist: {}", dir.display())]
    NoSuchDirectory { path: String, dir: PathBuf },

    #[error("{path} must not be empty")]
    Empty { path: String },

    #[error("{path} is not a recognized key")]
    UnknownKey { path: String },

    #[error("{path} is missing order level {order}")]
    MissingOrder { path: String, order: OrderLevel },
}

type VResult<T> = Result<T, ValidationError>;

/// Upper bound on `time.end - time.start`.
const MAX_TIME_STEPS: i64 = 100_000_000;

const ROOT_KEYS: &[&str] = &[
    "prefix",
    "output_dir",
    "time",
    "mesh",
    "loading",
    "material",
    "options",
];
const OPTION_KEYS: &[&str] = &[
    "viscosity",
    "fluid_density",
    "solid_density",
    "ale_penalty",
    "stabilization",
    "stabilization_weight",
    "export_frequency",
    "binary_output",
    "lm_pinned_patch",
    "subiterations",
    "l2_tolerance",
    "scale_first_residual",
    "cores",
];

/// Validate a raw configuration tree into a typed problem description.
pub fn validate(raw: &Value) -> VResult<ProblemDescription> {
    let root = Fields::new(Some(raw), "")?;
    root.only(ROOT_KEYS)?;

    let prefix = parse_prefix(&root)?;

    let output_dir = match root.get("output_dir") {
        Some(value) => parse_dir(value, &root.path("output_dir"))?,
        None => PathBuf::from("."),
    };

    let time = parse_time(root.get("time"), &root.path("time"))?;

    let mesh = match root.get("mesh") {
        Some(value) => parse_mesh(value, &root.path("mesh"))?,
        None => MeshDescription::standard(output_dir.join("mesh")),
    };

    let loading = parse_loading(root.get("loading"), &root.path("loading"))?;
    let material = parse_material(root.get("material"), &root.path("material"))?;

    let options = match root.get("options") {
        Some(value) => parse_options(value, &root.path("options"))?,
        None => AssemblyOptions::default(),
    };

    Ok(ProblemDescription {
        prefix,
        output_dir,
        time,
        mesh,
        loading,
        material,
        options,
    })
}

/// Borrowed view over one JSON object with its path for diagnostics.
struct Fields<'a> {
    path: String,
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    fn new(value: Option<&'a Value>, path: &str) -> VResult<Self> {
        let label = if path.is_empty() { "configuration root" } else { path };
        match value {
            Some(Value::Object(map)) => Ok(Self {
                path: path.to_string(),
                map,
            }),
            Some(_) => Err(ValidationError::WrongType {
                path: label.to_string(),
                expected: "an object",
            }),
            None => Err(ValidationError::Missing {
                path: label.to_string(),
            }),
        }
    }

    fn path(&self, key: &str) -> String {
        join(&self.path, key)
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key)
    }

    fn require(&self, key: &str) -> VResult<&'a Value> {
        self.get(key).ok_or_else(|| ValidationError::Missing {
            path: self.path(key),
        })
    }

    fn string(&self, key: &str) -> VResult<&'a str> {
        self.require(key)?
            .as_str()
            .ok_or_else(|| ValidationError::WrongType {
                path: self.path(key),
                expected: "a string",
            })
    }

    fn int(&self, key: &str) -> VResult<i64> {
        as_int(self.require(key)?, &self.path(key))
    }

    fn real(&self, key: &str) -> VResult<f64> {
        as_real(self.require(key)?, &self.path(key))
    }

    fn positive_real(&self, key: &str) -> VResult<f64> {
        let value = self.real(key)?;
        if value <= 0.0 {
            return Err(ValidationError::InvalidValue {
                path: self.path(key),
                reason: format!("must be positive, got {value}"),
            });
        }
        Ok(value)
    }

    /// A positive real that may divide other quantities without overflow.
    fn positive_scale(&self, key: &str) -> VResult<f64> {
        let value = self.positive_real(key)?;
        if !value.recip().is_finite() {
            return Err(ValidationError::InvalidValue {
                path: self.path(key),
                reason: format!("is too small, got {value}"),
            });
        }
        Ok(value)
    }

    fn positive_int(&self, key: &str) -> VResult<u32> {
        let value = self.int(key)?;
        match u32::try_from(value) {
            Ok(v) if v > 0 => Ok(v),
            _ => Err(ValidationError::InvalidValue {
                path: self.path(key),
                reason: format!("must be a positive integer, got {value}"),
            }),
        }
    }

    fn optional_positive_real(&self, key: &str, default: f64) -> VResult<f64> {
        match self.get(key) {
            Some(_) => self.positive_real(key),
            None => Ok(default),
        }
    }

    fn optional_positive_int(&self, key: &str, default: u32) -> VResult<u32> {
        match self.get(key) {
            Some(_) => self.positive_int(key),
            None => Ok(default),
        }
    }

    /// Reject any key outside `allowed`.
    fn only(&self, allowed: &[&str]) -> VResult<()> {
        match self.map.keys().find(|k| !allowed.contains(&k.as_str())) {
            Some(key) => Err(ValidationError::UnknownKey {
                path: self.path(key),
            }),
            None => Ok(()),
        }
    }

    fn tag(&self) -> Option<&'a str> {
        self.get("type").and_then(Value::as_str)
    }
}

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn as_int(value: &Value, path: &str) -> VResult<i64> {
    value.as_i64().ok_or_else(|| ValidationError::WrongType {
        path: path.to_string(),
        expected: "an integer",
    })
}

/// Any JSON number is accepted where a real is expected.
fn as_real(value: &Value, path: &str) -> VResult<f64> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::WrongType {
            path: path.to_string(),
            expected: "a float",
        })
}

fn parse_prefix(root: &Fields<'_>) -> VResult<String> {
    let prefix = root.string("prefix")?;
    if prefix.trim().is_empty() {
        return Err(ValidationError::Empty {
            path: root.path("prefix"),
        });
    }
    if prefix == "." || prefix == ".." || prefix.contains(['/', '\\']) {
        return Err(ValidationError::InvalidValue {
            path: root.path("prefix"),
            reason: format!("must be a plain file name, got '{prefix}'"),
        });
    }
    Ok(prefix.to_string())
}

fn parse_dir(value: &Value, path: &str) -> VResult<PathBuf> {
    let raw = value.as_str().ok_or_else(|| ValidationError::WrongType {
        path: path.to_string(),
        expected: "a string",
    })?;
    let dir = PathBuf::from(raw);
    if !Path::new(raw).is_dir() {
        return Err(ValidationError::NoSuchDirectory {
            path: path.to_string(),
            dir,
        });
    }
    Ok(dir)
}

fn parse_time(value: Option<&Value>, path: &str) -> VResult<TimeDef> {
    let fields = Fields::new(value, path)?;
    fields.only(&["start", "end", "step"])?;
    let start = fields.int("start")?;
    let end = fields.int("end")?;
    let step = fields.real("step")?;
    if start < 0 {
        return Err(ValidationError::InvalidValue {
            path: fields.path("start"),
            reason: format!("must not be negative, got {start}"),
        });
    }
    if end < start {
        return Err(ValidationError::InvalidValue {
            path: fields.path("end"),
            reason: format!("must not precede time.start ({end} < {start})"),
        });
    }
    if end - start > MAX_TIME_STEPS {
        return Err(ValidationError::InvalidValue {
            path: fields.path("end"),
            reason: format!("spans more than {MAX_TIME_STEPS} steps after time.start"),
        });
    }
    if step <= 0.0 {
        return Err(ValidationError::InvalidValue {
            path: fields.path("step"),
            reason: format!("must be positive, got {step}"),
        });
    }
    if !(end as f64 * step).is_finite() {
        return Err(ValidationError::InvalidValue {
            path: fields.path("step"),
            reason: format!("puts the final time out of range, got {step}"),
        });
    }
    Ok(TimeDef { start, end, step })
}

fn parse_mesh(value: &Value, path: &str) -> VResult<MeshDescription> {
    let fields = Fields::new(Some(value), path)?;
    fields.only(&["home", "solid", "fluid", "solid_bcpatch", "fluid_bcpatch"])?;
    let home = parse_dir(fields.require("home")?, &fields.path("home"))?;
    let solid = parse_mesh_levels(fields.get("solid"), &fields.path("solid"), Domain::Solid)?;
    let fluid = parse_mesh_levels(fields.get("fluid"), &fields.path("fluid"), Domain::Fluid)?;
    let solid_patches = parse_patches(fields.get("solid_bcpatch"), &fields.path("solid_bcpatch"))?;
    let fluid_patches = parse_patches(fields.get("fluid_bcpatch"), &fields.path("fluid_bcpatch"))?;
    Ok(MeshDescription {
        home,
        solid,
        fluid,
        solid_patches,
        fluid_patches,
    })
}

fn parse_mesh_levels(
    value: Option<&Value>,
    path: &str,
    domain: Domain,
) -> VResult<BTreeMap<OrderLevel, MeshFileDef>> {
    let fields = Fields::new(value, path)?;
    let mut levels = BTreeMap::new();
    for (key, entry) in fields.map {
        let entry_path = fields.path(key);
        let order = OrderLevel::parse_key(key).ok_or_else(|| ValidationError::InvalidValue {
            path: entry_path.clone(),
            reason: "is not an order level (expected 0, 1 or 2)".to_string(),
        })?;
        levels.insert(order, parse_mesh_file(entry, &entry_path)?);
    }
    for order in MeshDescription::required_orders(domain) {
        if !levels.contains_key(order) {
            return Err(ValidationError::MissingOrder {
                path: path.to_string(),
                order: *order,
            });
        }
    }
    Ok(levels)
}

fn parse_mesh_file(value: &Value, path: &str) -> VResult<MeshFileDef> {
    let fields = Fields::new(Some(value), path)?;
    fields.only(&["name", "elem"])?;
    let name = fields.string("name")?;
    if name.is_empty() {
        return Err(ValidationError::Empty {
            path: fields.path("name"),
        });
    }
    let elem = fields
        .string("elem")?
        .parse::<ElementKind>()
        .map_err(|_| ValidationError::UnknownVariant {
            path: fields.path("elem"),
            expected: "a supported element type",
        })?;
    Ok(MeshFileDef {
        name: name.to_string(),
        elem,
    })
}

fn parse_patches(value: Option<&Value>, path: &str) -> VResult<BoundaryPatches> {
    let fields = Fields::new(value, path)?;
    if let Some(key) = fields.map.keys().find(|k| k.parse::<PatchRole>().is_err()) {
        return Err(ValidationError::UnknownKey {
            path: fields.path(key),
        });
    }
    let mut patches = BoundaryPatches::default();
    for role in PatchRole::ALL {
        let id = fields.int(role.label())?;
        let id = u32::try_from(id).map_err(|_| ValidationError::InvalidValue {
            path: fields.path(role.label()),
            reason: format!("must be a non-negative patch id, got {id}"),
        })?;
        patches.insert(role, id);
    }
    Ok(patches)
}

fn parse_loading(value: Option<&Value>, path: &str) -> VResult<LoadingDescription> {
    // A bare list is shorthand for `{"time": [...]}` with the default jet.
    if let Some(Value::Array(_)) = value {
        let time = parse_segments(value, &join(path, "time"))?;
        return Ok(LoadingDescription {
            time,
            space: SpaceProfile::default(),
        });
    }
    let fields = Fields::new(value, path)?;
    fields.only(&["time", "space"])?;
    let time = parse_segments(fields.get("time"), &fields.path("time"))?;
    let space = match fields.get("space") {
        Some(value) => parse_space(value, &fields.path("space"))?,
        None => SpaceProfile::default(),
    };
    Ok(LoadingDescription { time, space })
}

fn parse_segments(value: Option<&Value>, path: &str) -> VResult<Vec<CurveSegment>> {
    let items = match value {
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ValidationError::WrongType {
                path: path.to_string(),
                expected: "a list",
            });
        }
        None => {
            return Err(ValidationError::Missing {
                path: path.to_string(),
            });
        }
    };
    if items.is_empty() {
        return Err(ValidationError::Empty {
            path: path.to_string(),
        });
    }
    let mut segments = Vec::with_capacity(items.len());
    let mut end = 0.0_f64;
    for (i, item) in items.iter().enumerate() {
        let item_path = format!("{path}[{i}]");
        let segment = parse_segment(item, &item_path)?;
        end += segment.duration();
        if !end.is_finite() {
            return Err(ValidationError::InvalidValue {
                path: item_path,
                reason: "ends beyond the representable time range".to_string(),
            });
        }
        segments.push(segment);
    }
    Ok(segments)
}

fn parse_segment(value: &Value, path: &str) -> VResult<CurveSegment> {
    let fields = Fields::new(Some(value), path)?;
    match fields.tag() {
        Some("Sine") => {
            fields.only(&["type", "max_vel", "period", "cycles"])?;
            Ok(CurveSegment::Sine {
                max_vel: fields.real("max_vel")?,
                period: fields.positive_scale("period")?,
                cycles: fields.positive_int("cycles")?,
            })
        }
        Some("Hold") => {
            fields.only(&["type", "duration"])?;
            Ok(CurveSegment::Hold {
                duration: fields.positive_scale("duration")?,
            })
        }
        Some("Ramp") => {
            fields.only(&["type", "max_vel", "duration"])?;
            Ok(CurveSegment::Ramp {
                max_vel: fields.real("max_vel")?,
                duration: fields.positive_scale("duration")?,
            })
        }
        _ => Err(ValidationError::UnknownVariant {
            path: fields.path("type"),
            expected: "Sine, Hold or Ramp",
        }),
    }
}

fn parse_space(value: &Value, path: &str) -> VResult<SpaceProfile> {
    if let Value::String(tag) = value {
        return match tag.as_str() {
            "parabolic" => Ok(SpaceProfile::default()),
            _ => Err(ValidationError::UnknownVariant {
                path: path.to_string(),
                expected: "parabolic",
            }),
        };
    }
    let fields = Fields::new(Some(value), path)?;
    match fields.tag() {
        Some("parabolic") => {
            fields.only(&["type", "width"])?;
            let width = match fields.get("width") {
                Some(_) => fields.positive_scale("width")?,
                None => SpaceProfile::DEFAULT_JET_WIDTH,
            };
            Ok(SpaceProfile::ParabolicJet { width })
        }
        _ => Err(ValidationError::UnknownVariant {
            path: fields.path("type"),
            expected: "parabolic",
        }),
    }
}

fn parse_material(value: Option<&Value>, path: &str) -> VResult<MaterialDescription> {
    let fields = Fields::new(value, path)?;
    fields.only(&["type", "k"])?;
    match fields.tag() {
        Some("NeoHookean") => {
            let k = coefficients(&fields, "NeoHookean", 1)?;
            Ok(MaterialDescription::NeoHookean { k: k[0] })
        }
        Some("isotropic-exponential") => {
            let k = coefficients(&fields, "isotropic-exponential", 2)?;
            Ok(MaterialDescription::IsotropicExponential { k: k[0], b: k[1] })
        }
        _ => Err(ValidationError::UnknownVariant {
            path: fields.path("type"),
            expected: "NeoHookean or isotropic-exponential",
        }),
    }
}

fn coefficients(fields: &Fields<'_>, variant: &'static str, expected: usize) -> VResult<Vec<f64>> {
    let path = fields.path("k");
    let items = fields
        .require("k")?
        .as_array()
        .ok_or_else(|| ValidationError::WrongType {
            path: path.clone(),
            expected: "a list of numbers",
        })?;
    if items.len() != expected {
        return Err(ValidationError::Arity {
            path,
            variant,
            expected,
            found: items.len(),
        });
    }
    items
        .iter()
        .enumerate()
        .map(|(i, v)| as_real(v, &format!("{path}[{i}]")))
        .collect()
}

fn parse_options(value: &Value, path: &str) -> VResult<AssemblyOptions> {
    let fields = Fields::new(Some(value), path)?;
    fields.only(OPTION_KEYS)?;
    let defaults = AssemblyOptions::default();

    let stabilization = match fields.get("stabilization") {
        None => defaults.stabilization,
        Some(value) => match value.as_str() {
            Some("orders-equal") => StabilizationPolicy::OrdersEqual,
            Some("always") => StabilizationPolicy::Always,
            Some("never") => StabilizationPolicy::Never,
            _ => {
                return Err(ValidationError::UnknownVariant {
                    path: fields.path("stabilization"),
                    expected: "orders-equal, always or never",
                });
            }
        },
    };

    let export_frequency = match fields.get("export_frequency") {
        None => defaults.export_frequency,
        Some(_) => {
            let raw = fields.int("export_frequency")?;
            ExportFrequency::from_value(raw).ok_or_else(|| ValidationError::InvalidValue {
                path: fields.path("export_frequency"),
                reason: format!("must be -1 or a positive integer, got {raw}"),
            })?
        }
    };

    let binary_output = match fields.get("binary_output") {
        None => defaults.binary_output,
        Some(value) => value.as_bool().ok_or_else(|| ValidationError::WrongType {
            path: fields.path("binary_output"),
            expected: "a boolean",
        })?,
    };

    let lm_pinned_patch = match fields.get("lm_pinned_patch") {
        None => defaults.lm_pinned_patch,
        Some(_) => {
            let raw = fields.int("lm_pinned_patch")?;
            u32::try_from(raw).map_err(|_| ValidationError::InvalidValue {
                path: fields.path("lm_pinned_patch"),
                reason: format!("must be a non-negative patch id, got {raw}"),
            })?
        }
    };

    Ok(AssemblyOptions {
        viscosity: fields.optional_positive_real("viscosity", defaults.viscosity)?,
        fluid_density: fields.optional_positive_real("fluid_density", defaults.fluid_density)?,
        solid_density: fields.optional_positive_real("solid_density", defaults.solid_density)?,
        ale_penalty: fields.optional_positive_real("ale_penalty", defaults.ale_penalty)?,
        stabilization,
        stabilization_weight: fields
            .optional_positive_real("stabilization_weight", defaults.stabilization_weight)?,
        export_frequency,
        binary_output,
        lm_pinned_patch,
        subiterations: fields.optional_positive_int("subiterations", defaults.subiterations)?,
        l2_tolerance: fields.optional_positive_real("l2_tolerance", defaults.l2_tolerance)?,
        scale_first_residual: fields
            .optional_positive_real("scale_first_residual", defaults.scale_first_residual)?,
        cores: fields.optional_positive_int("cores", defaults.cores)?,
    })
}
