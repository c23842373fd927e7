use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropagatorKind {
    /// W3C `traceparent` / `tracestate`.
    TraceContext,
    /// Datadog `x-datadog-*` headers.
    Datadog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationConfig {
    #[serde(default = "default_propagators")]
    pub propagators: Vec<PropagatorKind>,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            propagators: default_propagators(),
        }
    }
}

impl PropagationConfig {
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> crate::error::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::Config::try_from(&PropagationConfig::default())?)
            .add_source(
                config::File::from(config_path)
                    .required(false)
            )
            .add_source(
                config::Environment::with_prefix("OTELPROP")
                    .separator("_")
                    .list_separator(",")
                    .with_list_parse_key("propagators")
                    .try_parsing(true)
            );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("otelprop")
            .join("config.toml")
    }
}

fn default_propagators() -> Vec<PropagatorKind> {
    vec![PropagatorKind::TraceContext, PropagatorKind::Datadog]
}
