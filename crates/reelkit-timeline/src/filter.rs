//! Visual adjustment filters attached to clips.

use reelkit_core::limits::FILTER_MAGNITUDE;
use reelkit_core::{ValidationError, ValidationResult};
use serde::Serialize;
use uuid::Uuid;

use crate::edit::Identified;

/// Kind of adjustment and its normalized magnitude in `[-1.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FilterKind {
    Brightness(f64),
    Contrast(f64),
    Saturation(f64),
}

impl FilterKind {
    /// The magnitude carried by this kind.
    pub fn value(self) -> f64 {
        match self {
            Self::Brightness(v) | Self::Contrast(v) | Self::Saturation(v) => v,
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Brightness(_) => "Brightness",
            Self::Contrast(_) => "Contrast",
            Self::Saturation(_) => "Saturation",
        }
    }

    /// Same kind with a different magnitude (unvalidated).
    fn with_magnitude(self, value: f64) -> Self {
        match self {
            Self::Brightness(_) => Self::Brightness(value),
            Self::Contrast(_) => Self::Contrast(value),
            Self::Saturation(_) => Self::Saturation(value),
        }
    }

    fn validate(self) -> ValidationResult<Self> {
        let value = self.value();
        if !(-FILTER_MAGNITUDE..=FILTER_MAGNITUDE).contains(&value) {
            return Err(ValidationError::new(format!(
                "{} value {} outside [-1.0, 1.0]",
                self.name().to_lowercase(),
                value
            )));
        }
        Ok(self)
    }
}

/// A filter instance with its own identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    id: Uuid,
    #[serde(flatten)]
    kind: FilterKind,
}

impl Filter {
    /// Create a filter, failing if the magnitude is out of range.
    pub fn new(kind: FilterKind) -> ValidationResult<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            kind: kind.validate()?,
        })
    }

    pub fn brightness(value: f64) -> ValidationResult<Self> {
        Self::new(FilterKind::Brightness(value))
    }

    pub fn contrast(value: f64) -> ValidationResult<Self> {
        Self::new(FilterKind::Contrast(value))
    }

    pub fn saturation(value: f64) -> ValidationResult<Self> {
        Self::new(FilterKind::Saturation(value))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn value(&self) -> f64 {
        self.kind.value()
    }

    /// Same filter (identity and kind) with a new magnitude.
    pub fn with_value(self, value: f64) -> ValidationResult<Self> {
        Ok(Self {
            kind: self.kind.with_magnitude(value).validate()?,
            ..self
        })
    }
}

impl Identified for Filter {
    const KIND: &'static str = "filter";

    fn id(&self) -> Uuid {
        self.id
    }
}
