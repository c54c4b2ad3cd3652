use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    #[error("Sales data unavailable: {message}")]
    DataUnavailable { message: String },

    #[error("Numeric capability unavailable: {message}")]
    DependencyUnavailable { message: String },

    #[error("Degenerate input: {message}")]
    DegenerateInput { message: String },

    #[error("Invalid parameter: {message}")]
    InvalidParameter { message: String },
}

impl ForecastError {
    pub fn data_unavailable(message: impl Into<String>) -> Self {
        Self::DataUnavailable {
            message: message.into(),
        }
    }

    pub fn dependency_unavailable(message: impl Into<String>) -> Self {
        Self::DependencyUnavailable {
            message: message.into(),
        }
    }

    pub fn degenerate_input(message: impl Into<String>) -> Self {
        Self::DegenerateInput {
            message: message.into(),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: message.into(),
        }
    }
}

pub fn ensure_horizon(horizon: usize) -> Result<(), ForecastError> {
    if horizon == 0 {
        return Err(ForecastError::invalid_parameter(
            "horizon must be at least one period",
        ));
    }

    Ok(())
}
