use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type ParamMap = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gating {
    Gated,
    Ungated,
}

impl Gating {
    pub fn from_is_gated(is_gated: bool) -> Self {
        if is_gated {
            Gating::Gated
        } else {
            Gating::Ungated
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            Gating::Gated => "gated_",
            Gating::Ungated => "ungated_",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gating::Gated => "gated",
            Gating::Ungated => "ungated",
        }
    }

    /// Splits a raw candidate name such as "ungated_conv_deriv" into its
    /// gating class and public name. Returns `None` when the name carries
    /// neither prefix.
    pub fn split_raw_name(raw: &str) -> Option<(Gating, &str)> {
        if let Some(name) = raw.strip_prefix("ungated_") {
            Some((Gating::Ungated, name))
        } else if let Some(name) = raw.strip_prefix("gated_") {
            Some((Gating::Gated, name))
        } else {
            None
        }
    }
}

/// A raw count trace. Gated traces carry one row per measurement gate.
#[derive(Debug, Clone, PartialEq)]
pub enum CountData {
    Ungated(Vec<f64>),
    Gated(Vec<Vec<f64>>),
}

impl CountData {
    pub fn gating(&self) -> Gating {
        match self {
            CountData::Ungated(_) => Gating::Ungated,
            CountData::Gated(_) => Gating::Gated,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPulses {
    pub rising_ind: Vec<usize>,
    pub falling_ind: Vec<usize>,
}

#[derive(thiserror::Error, Debug)]
pub enum MethodError {
    #[error("missing argument '{name}' for extraction method '{method}'")]
    MissingArgument { method: String, name: String },
    #[error("argument '{name}' for extraction method '{method}' is not a number")]
    InvalidArgument { method: String, name: String },
    #[error("extraction method '{method}' expects {expected} count data")]
    WrongDataShape {
        method: String,
        expected: &'static str,
    },
}

/// A tunable parameter of an extraction method. The first (data) argument
/// of a method is never declared here.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub default: Option<f64>,
}

pub type MethodFn = fn(&CountData, &ParamMap) -> Result<ExtractedPulses, MethodError>;

/// A statically declared extraction method candidate. The raw name carries
/// the `gated_` / `ungated_` prefix; the registry strips it to obtain the
/// public name.
#[derive(Debug, Clone, Copy)]
pub struct MethodDecl {
    pub raw_name: &'static str,
    pub params: &'static [ParamSpec],
    pub func: MethodFn,
}

pub trait MethodSource {
    fn source_name(&self) -> &str;
    fn method_decls(&self) -> Vec<MethodDecl>;
}

pub fn require_f64(kwargs: &ParamMap, method: &str, name: &str) -> Result<f64, MethodError> {
    match kwargs.get(name) {
        Some(value) => value.as_f64().ok_or_else(|| MethodError::InvalidArgument {
            method: method.to_string(),
            name: name.to_string(),
        }),
        None => Err(MethodError::MissingArgument {
            method: method.to_string(),
            name: name.to_string(),
        }),
    }
}
