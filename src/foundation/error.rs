/// Convenience result type used across drawsteps.
pub type DrawStepsResult<T> = Result<T, DrawStepsError>;

/// Top-level error taxonomy used by planner APIs.
///
/// Every variant is terminal for the current request. Outputs are deterministic functions of
/// the input, so callers retry only with different input or configuration.
#[derive(thiserror::Error, Debug)]
pub enum DrawStepsError {
    /// The image carries no usable luminance variation or no detectable edges.
    #[error("empty image: {0}")]
    EmptyImage(String),

    /// Edges were found but no contour survived noise filtering.
    #[error("no contours found: {0}")]
    NoContoursFound(String),

    /// Generation parameters are out of range or unknown.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Internal coverage/ordering invariant of an assembled plan was violated.
    #[error("plan integrity error: {0}")]
    PlanIntegrity(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DrawStepsError {
    /// Build a [`DrawStepsError::EmptyImage`] value.
    pub fn empty_image(msg: impl Into<String>) -> Self {
        Self::EmptyImage(msg.into())
    }

    /// Build a [`DrawStepsError::NoContoursFound`] value.
    pub fn no_contours(msg: impl Into<String>) -> Self {
        Self::NoContoursFound(msg.into())
    }

    /// Build a [`DrawStepsError::InvalidConfig`] value.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Build a [`DrawStepsError::PlanIntegrity`] value.
    pub fn plan_integrity(msg: impl Into<String>) -> Self {
        Self::PlanIntegrity(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
