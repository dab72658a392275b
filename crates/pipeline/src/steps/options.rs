// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The `set-fetch-options` step.

use async_trait::async_trait;
use tracing::debug;

use crate::context::Context;
use crate::error::Error;
use crate::registry::Step;
use crate::runner::Pipeline;

/// Installs `key:value` fetch options on the context for subsequent load
/// steps.
///
/// Recognized keys: `user-agent`, `timeout` (humantime, `[1s, 10m]`),
/// `max-depth` (`[0, 64]`), `accept`, and repeatable `filter` entries such
/// as `filter:territory=SE` or `filter:exclude-scheme-type=<URI>`.
pub(crate) struct SetFetchOptionsStep;

#[async_trait]
impl Step for SetFetchOptionsStep {
    async fn run(
        &self,
        _pipeline: &Pipeline,
        mut context: Context,
        args: &[String],
    ) -> Result<Context, Error> {
        let options = context.ensure_fetch_options();
        for arg in args {
            options
                .apply(arg)
                .map_err(|e| Error::Config(e.to_string()))?;
        }
        debug!(
            user_agent = options.user_agent(),
            timeout = ?options.timeout(),
            max_depth = options.max_depth(),
            filters = options.filters().iter().count(),
            "fetch options updated"
        );
        Ok(context)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    async fn run(args: &[&str]) -> Result<Context, Error> {
        let pipeline = Pipeline::from_yaml("[]").unwrap();
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        SetFetchOptionsStep.run(&pipeline, Context::new(), &args).await
    }

    #[tokio::test]
    async fn installs_options_on_the_context() {
        let context = run(&["max-depth:2", "timeout:90s", "filter:territory=SE"])
            .await
            .unwrap();
        let options = context.fetch_options().unwrap();
        assert_eq!(options.max_depth(), 2);
        assert_eq!(options.timeout(), Duration::from_secs(90));
        assert_eq!(options.filters().iter().count(), 1);
    }

    #[tokio::test]
    async fn bad_option_is_a_config_error() {
        let err = run(&["max-depth:65"]).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{err}");
    }
}
