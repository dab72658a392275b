// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The `echo` and `log` steps.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, error, info, trace, warn};

use crate::context::Context;
use crate::error::Error;
use crate::registry::Step;
use crate::runner::Pipeline;

/// Does nothing beyond logging its arguments at debug.
pub(crate) struct EchoStep;

#[async_trait]
impl Step for EchoStep {
    async fn run(
        &self,
        _pipeline: &Pipeline,
        context: Context,
        args: &[String],
    ) -> Result<Context, Error> {
        debug!(args = ?args, "echo");
        Ok(context)
    }
}

/// Emits one log line.
///
/// If the first argument is a level name it selects the level; otherwise
/// everything logs at info. `${key}` tokens in the message are replaced
/// from the context's data map; unknown keys are left verbatim.
pub(crate) struct LogStep;

#[async_trait]
impl Step for LogStep {
    async fn run(
        &self,
        _pipeline: &Pipeline,
        context: Context,
        args: &[String],
    ) -> Result<Context, Error> {
        let (level, rest) = match args.first().map(String::as_str) {
            Some(level @ ("trace" | "debug" | "info" | "warn" | "error" | "fatal")) => {
                (level, &args[1..])
            }
            _ => ("info", args),
        };
        let message = interpolate(&rest.join(" "), context.data());
        match level {
            "trace" => trace!("{message}"),
            "debug" => debug!("{message}"),
            "warn" => warn!("{message}"),
            "error" | "fatal" => error!("{message}"),
            _ => info!("{message}"),
        }
        Ok(context)
    }
}

fn interpolate(template: &str, data: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match data.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("${");
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
