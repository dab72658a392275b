// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Options governing the fetcher and the reference resolver.

use std::time::Duration;

use crate::error::Error;
use crate::filter::{Filter, FilterSet};

/// Upper bound on reference dereference depth.
pub const MAX_DEREFERENCE_DEPTH: usize = 64;

/// Bounds on the per-request timeout.
pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);
/// See [`MIN_TIMEOUT`].
pub const MAX_TIMEOUT: Duration = Duration::from_secs(10 * 60);

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MAX_DEPTH: usize = 1;
const DEFAULT_ACCEPT: &str =
    "application/vnd.etsi.tsl+xml, application/xml, text/xml, */*;q=0.5";

/// Resolver worker-pool bounds.
const WORKERS_FLOOR: usize = 4;
const WORKERS_CEILING: usize = 32;

/// Behavior knobs for the [`Fetcher`](crate::Fetcher) and
/// [`resolve`](crate::resolve).
///
/// Bounds are enforced when options are applied: the dereference depth is
/// limited to `[0, 64]`, the timeout to `[1s, 10m]`, and the user agent must
/// be non-empty.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchOptions {
    user_agent: String,
    timeout: Duration,
    max_depth: usize,
    accept: String,
    filters: FilterSet,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: format!("trustl/{}", env!("CARGO_PKG_VERSION")),
            timeout: DEFAULT_TIMEOUT,
            max_depth: DEFAULT_MAX_DEPTH,
            accept: DEFAULT_ACCEPT.to_string(),
            filters: FilterSet::default(),
        }
    }
}

impl FetchOptions {
    /// The HTTP User-Agent header value.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// The per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// How many reference edges the resolver follows. 0 means root only.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The HTTP Accept header value.
    pub fn accept(&self) -> &str {
        &self.accept
    }

    /// The filters applied to referenced TSLs.
    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Adds a filter to be applied during resolution.
    pub fn add_filter(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    /// Sets the dereference depth, bounded to `[0, 64]`.
    pub fn set_max_depth(&mut self, depth: usize) -> Result<(), Error> {
        if depth > MAX_DEREFERENCE_DEPTH {
            return Err(Error::Options {
                option: format!("max-depth:{depth}"),
                reason: format!("depth must be at most {MAX_DEREFERENCE_DEPTH}"),
            });
        }
        self.max_depth = depth;
        Ok(())
    }

    /// Size of the resolver worker pool: `max_depth * 8`, floored at 4 and
    /// capped at 32.
    pub fn worker_count(&self) -> usize {
        (self.max_depth.saturating_mul(8)).clamp(WORKERS_FLOOR, WORKERS_CEILING)
    }

    /// Applies one `key:value` option as accepted by the
    /// `set-fetch-options` pipeline step.
    ///
    /// Recognized keys: `user-agent`, `timeout`, `max-depth`, `accept`,
    /// `filter`.
    pub fn apply(&mut self, option: &str) -> Result<(), Error> {
        let (key, value) = option.split_once(':').ok_or_else(|| Error::Options {
            option: option.to_string(),
            reason: "expected key:value".to_string(),
        })?;

        match key {
            "user-agent" => {
                if value.is_empty() {
                    return Err(Error::Options {
                        option: option.to_string(),
                        reason: "user agent must not be empty".to_string(),
                    });
                }
                self.user_agent = value.to_string();
            }
            "timeout" => {
                let timeout = humantime::parse_duration(value).map_err(|e| Error::Options {
                    option: option.to_string(),
                    reason: e.to_string(),
                })?;
                if timeout < MIN_TIMEOUT || timeout > MAX_TIMEOUT {
                    return Err(Error::Options {
                        option: option.to_string(),
                        reason: "timeout must be between 1s and 10m".to_string(),
                    });
                }
                self.timeout = timeout;
            }
            "max-depth" => {
                let depth = value.parse::<usize>().map_err(|e| Error::Options {
                    option: option.to_string(),
                    reason: e.to_string(),
                })?;
                self.set_max_depth(depth)?;
            }
            "accept" => {
                self.accept = value.to_string();
            }
            "filter" => {
                self.filters.push(Filter::parse(value)?);
            }
            _ => {
                return Err(Error::Options {
                    option: option.to_string(),
                    reason: "unknown option".to_string(),
                });
            }
        }
        Ok(())
    }
}
