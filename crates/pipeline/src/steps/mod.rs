// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The built-in pipeline steps.
//!
//! | name | effect |
//! |---|---|
//! | `load` | fetch a TSL and its references into a tree on the context |
//! | `select` | derive the trusted certificate pool from the loaded trees |
//! | `set-fetch-options` | configure fetcher/resolver behavior and filters |
//! | `echo` | no-op, logs its arguments |
//! | `log` | emit a log line with `${key}` interpolation |
//! | `generate` | synthesize a TSL from a directory of YAML and PEM files |
//! | `publish` | serialize every loaded TSL to XML files, optionally signed |
//! | `transform` | feed documents through the configured transformer |

use std::sync::Arc;

use crate::registry::{Step, StepRegistry};

mod generate;
mod load;
mod misc;
mod options;
mod publish;
mod select;
mod transform;

pub(crate) fn install_builtins(registry: &StepRegistry) {
    let builtins: [(&str, Arc<dyn Step>); 8] = [
        ("load", Arc::new(load::LoadStep)),
        ("select", Arc::new(select::SelectStep)),
        ("set-fetch-options", Arc::new(options::SetFetchOptionsStep)),
        ("echo", Arc::new(misc::EchoStep)),
        ("log", Arc::new(misc::LogStep)),
        ("generate", Arc::new(generate::GenerateStep)),
        ("publish", Arc::new(publish::PublishStep)),
        ("transform", Arc::new(transform::TransformStep)),
    ];
    for (name, step) in builtins {
        registry
            .register(name, step)
            .expect("builtin registration precedes sealing");
    }
}
