use async_trait::async_trait;

use crate::{Conditions, error::Result};

use super::Forecaster;

/// Offline forecaster: echoes the location back with fixed weather and never fails.
#[derive(Debug, Clone)]
pub struct MockForecaster {
    celsius: i32,
    description: String,
}

impl MockForecaster {
    pub fn with_conditions(celsius: i32, description: impl Into<String>) -> Self {
        Self {
            celsius,
            description: description.into(),
        }
    }
}

impl Default for MockForecaster {
    fn default() -> Self {
        Self::with_conditions(17, "comme ci comme ca")
    }
}

#[async_trait]
impl Forecaster for MockForecaster {
    async fn forecast(&self, location: &str) -> Result<Conditions> {
        Ok(Conditions::new(location, self.celsius, self.description.clone()))
    }
}
