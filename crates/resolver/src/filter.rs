// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Retention filters for referenced TSLs.
//!
//! A referenced list is retained iff it matches at least one include filter
//! of every kind that has include filters, and matches no exclude filter.
//! A kind with no include filters is permissive. Filters are evaluated on
//! the fetched document, since territory and scheme type are only known
//! after parsing.

use trustl_tsl::StatusList;

use crate::error::Error;

/// The attribute a filter matches on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// The scheme territory, e.g. `SE`.
    Territory,
    /// A service-type URI present anywhere in the list.
    ServiceType,
    /// The TSL type URI of the scheme.
    SchemeType,
}

impl FilterKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Territory => "territory",
            Self::ServiceType => "service-type",
            Self::SchemeType => "scheme-type",
        }
    }
}

/// One `(kind, value)` filter tuple, include or exclude.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    kind: FilterKind,
    exclude: bool,
    value: String,
}

impl Filter {
    /// Creates an include filter.
    pub fn include(kind: FilterKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            exclude: false,
            value: value.into(),
        }
    }

    /// Creates an exclude filter.
    pub fn exclude(kind: FilterKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            exclude: true,
            value: value.into(),
        }
    }

    /// Parses expressions of the form `territory=XX`,
    /// `exclude-service-type=<URI>`, `scheme-type=<URI>`, ...
    pub fn parse(expression: &str) -> Result<Self, Error> {
        let (name, value) = expression.split_once('=').ok_or_else(|| Error::Filter {
            expression: expression.to_string(),
            reason: "expected kind=value".to_string(),
        })?;
        if value.is_empty() {
            return Err(Error::Filter {
                expression: expression.to_string(),
                reason: "empty value".to_string(),
            });
        }

        let (exclude, kind_name) = match name.strip_prefix("exclude-") {
            Some(rest) => (true, rest),
            None => (false, name),
        };
        let kind = match kind_name {
            "territory" => FilterKind::Territory,
            "service-type" => FilterKind::ServiceType,
            "scheme-type" => FilterKind::SchemeType,
            _ => {
                return Err(Error::Filter {
                    expression: expression.to_string(),
                    reason: format!("unknown filter kind {kind_name:?}"),
                });
            }
        };

        Ok(Self {
            kind,
            exclude,
            value: value.to_string(),
        })
    }

    /// The attribute this filter matches on.
    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// Whether this is an exclude filter.
    pub fn is_exclude(&self) -> bool {
        self.exclude
    }

    /// The value to match.
    pub fn value(&self) -> &str {
        &self.value
    }

    fn matches(&self, tsl: &StatusList) -> bool {
        match self.kind {
            FilterKind::Territory => tsl.scheme().territory() == self.value,
            FilterKind::SchemeType => tsl.scheme().type_uri() == self.value,
            FilterKind::ServiceType => tsl
                .services()
                .any(|(_, service)| service.type_uri() == self.value),
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.exclude {
            write!(f, "exclude-{}={}", self.kind.as_str(), self.value)
        } else {
            write!(f, "{}={}", self.kind.as_str(), self.value)
        }
    }
}

/// An ordered collection of filters evaluated together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    /// Creates an empty, fully permissive set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter.
    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    /// True when no filters are configured.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Iterates the filters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    /// Whether a referenced list passes the set.
    pub fn retains(&self, tsl: &StatusList) -> bool {
        for filter in self.filters.iter().filter(|f| f.is_exclude()) {
            if filter.matches(tsl) {
                return false;
            }
        }

        for kind in [
            FilterKind::Territory,
            FilterKind::ServiceType,
            FilterKind::SchemeType,
        ] {
            let mut includes = self
                .filters
                .iter()
                .filter(|f| !f.is_exclude() && f.kind() == kind)
                .peekable();
            if includes.peek().is_some() && !includes.any(|f| f.matches(tsl)) {
                return false;
            }
        }
        true
    }
}

impl FromIterator<Filter> for FilterSet {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}
