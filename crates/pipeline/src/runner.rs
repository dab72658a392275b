// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Parsing and execution of pipeline documents.
//!
//! Two YAML forms are accepted: a plain sequence of steps, or a mapping
//! `{pipes: [...], config: {...}}`. A step is a single-key mapping whose
//! value is a sequence of string arguments:
//!
//! ```yaml
//! - set-fetch-options: ["max-depth:1"]
//! - load: ["https://lists.example/root.xml"]
//! - select: ["reference-depth:1"]
//! ```

use std::sync::Arc;

use serde::Deserialize;
use serde_yaml::Value;
use tracing::{debug, warn};

use crate::context::Context;
use crate::error::Error;
use crate::registry;
use crate::signer::{Signer, Transformer};

/// One `name: [args...]` entry of a pipeline document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepEntry {
    name: String,
    args: Vec<String>,
}

impl StepEntry {
    /// Creates an entry.
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// The step name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The step arguments, in document order.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

/// The `config.logging` section of a structured pipeline document.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// `debug`, `info`, `warn`, `error` or `fatal`.
    #[serde(default = "default_level")]
    pub level: String,
    /// `text` or `json`.
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

/// A parsed pipeline: the ordered steps plus the document's `config` block
/// and the externally injected signer/transformer collaborators.
pub struct Pipeline {
    steps: Vec<StepEntry>,
    logging: LoggingConfig,
    config: Value,
    signer: Option<Arc<dyn Signer>>,
    transformer: Option<Arc<dyn Transformer>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.steps)
            .field("logging", &self.logging)
            .field("config", &self.config)
            .field("signer", &self.signer.as_ref().map(|_| "<dyn Signer>"))
            .field(
                "transformer",
                &self.transformer.as_ref().map(|_| "<dyn Transformer>"),
            )
            .finish()
    }
}

impl Pipeline {
    /// Parses a pipeline document, validating every step name against the
    /// process-wide registry.
    pub fn from_yaml(text: &str) -> Result<Self, Error> {
        let value: Value =
            serde_yaml::from_str(text).map_err(|e| Error::Config(format!("invalid YAML: {e}")))?;

        let (step_values, config) = match value {
            Value::Null => (Vec::new(), Value::Null),
            Value::Sequence(seq) => (seq, Value::Null),
            Value::Mapping(map) => {
                let mut pipes = None;
                let mut config = Value::Null;
                for (key, entry) in map {
                    match key {
                        Value::String(key) if key == "pipes" => pipes = Some(entry),
                        Value::String(key) if key == "config" => config = entry,
                        other => {
                            return Err(Error::Config(format!(
                                "unknown top-level key {other:?} in pipeline document"
                            )));
                        }
                    }
                }
                let pipes = pipes
                    .ok_or_else(|| Error::Config("structured document lacks `pipes`".to_string()))?;
                let Value::Sequence(seq) = pipes else {
                    return Err(Error::Config("`pipes` must be a sequence".to_string()));
                };
                (seq, config)
            }
            _ => {
                return Err(Error::Config(
                    "pipeline document must be a sequence or a mapping".to_string(),
                ));
            }
        };

        let mut steps = Vec::with_capacity(step_values.len());
        for (index, step) in step_values.into_iter().enumerate() {
            steps.push(parse_step(index, step)?);
        }

        let registry = registry::global();
        for entry in &steps {
            if !registry.contains(entry.name()) {
                return Err(Error::Config(format!("unknown step {:?}", entry.name())));
            }
        }

        let logging = match config.get("logging") {
            Some(section) => LoggingConfig::deserialize(section.clone())
                .map_err(|e| Error::Config(format!("invalid logging config: {e}")))?,
            None => LoggingConfig::default(),
        };

        Ok(Self {
            steps,
            logging,
            config,
            signer: None,
            transformer: None,
        })
    }

    /// Attaches a signer consulted by the publish step.
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Attaches a transformer consulted by the transform step.
    pub fn with_transformer(mut self, transformer: Arc<dyn Transformer>) -> Self {
        self.transformer = Some(transformer);
        self
    }

    /// The parsed steps, in document order.
    pub fn steps(&self) -> &[StepEntry] {
        &self.steps
    }

    /// The `config.logging` section, or its defaults.
    pub fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    /// The raw `config` block of a structured document, `Null` otherwise.
    /// Sections beyond `logging` are interpreted by the server layer.
    pub fn config_value(&self) -> &Value {
        &self.config
    }

    /// The configured signer, if any.
    pub fn signer(&self) -> Option<&Arc<dyn Signer>> {
        self.signer.as_ref()
    }

    /// The configured transformer, if any.
    pub fn transformer(&self) -> Option<&Arc<dyn Transformer>> {
        self.transformer.as_ref()
    }

    /// Runs the steps strictly in order, threading the context through.
    ///
    /// The first run seals the step registry. A failing step aborts the run
    /// with [`Error::Step`] carrying its index and name.
    pub async fn run(&self, mut context: Context) -> Result<Context, Error> {
        let registry = registry::global();
        registry.seal();

        for (index, entry) in self.steps.iter().enumerate() {
            if context.cancellation().is_cancelled() {
                return Err(Error::Cancelled);
            }
            let (step, overridden) = registry.lookup(entry.name()).ok_or_else(|| {
                Error::Config(format!("unknown step {:?}", entry.name()))
            })?;
            if overridden {
                warn!(
                    step = entry.name(),
                    "step name was registered more than once; running the latest registration"
                );
            }
            debug!(index, step = entry.name(), "running pipeline step");
            context = step
                .run(self, context, entry.args())
                .await
                .map_err(|e| Error::Step {
                    index,
                    name: entry.name().to_string(),
                    source: Box::new(e),
                })?;
        }
        Ok(context)
    }

    /// Emits the canonical form: a flat YAML sequence of
    /// `name: [args...]` entries.
    pub fn to_yaml(&self) -> Result<String, Error> {
        let sequence: Vec<Value> = self
            .steps
            .iter()
            .map(|entry| {
                let mut map = serde_yaml::Mapping::new();
                map.insert(
                    Value::String(entry.name.clone()),
                    Value::Sequence(
                        entry
                            .args
                            .iter()
                            .map(|arg| Value::String(arg.clone()))
                            .collect(),
                    ),
                );
                Value::Mapping(map)
            })
            .collect();
        serde_yaml::to_string(&Value::Sequence(sequence))
            .map_err(|e| Error::Config(e.to_string()))
    }
}

fn parse_step(index: usize, value: Value) -> Result<StepEntry, Error> {
    let Value::Mapping(map) = value else {
        return Err(Error::Config(format!(
            "step {index} must be a single-key mapping"
        )));
    };
    if map.len() != 1 {
        return Err(Error::Config(format!(
            "step {index} must have exactly one key, found {}",
            map.len()
        )));
    }
    let Some((name, args)) = map.into_iter().next() else {
        return Err(Error::Config(format!("step {index} is empty")));
    };
    let Value::String(name) = name else {
        return Err(Error::Config(format!("step {index} name must be a string")));
    };

    let args = match args {
        Value::Null => Vec::new(),
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|arg| scalar_to_string(&name, arg))
            .collect::<Result<_, _>>()?,
        _ => {
            return Err(Error::Config(format!(
                "arguments of step {name:?} must be a sequence"
            )));
        }
    };

    Ok(StepEntry { name, args })
}

fn scalar_to_string(step: &str, value: Value) -> Result<String, Error> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(Error::Config(format!(
            "argument of step {step:?} must be a scalar, found {other:?}"
        ))),
    }
}
