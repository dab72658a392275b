// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The `generate` step: synthesize a TSL from a directory layout.
//!
//! ```text
//! <dir>/scheme.yaml                      territory, operator, type,
//!                                        sequence_number, next_update_days
//! <dir>/providers/<name>/provider.yaml   name
//! <dir>/providers/<name>/<cert>.pem      the service certificate
//! <dir>/providers/<name>/<cert>.yaml     name, type, status
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use time::{Duration, OffsetDateTime};
use tracing::info;
use trustl_tsl::{
    CertificateDer, DigitalIdentity, SchemeInformation, Source, StatusList, TrustServiceProvider,
    TslTree, TspService,
};
use url::Url;

use crate::context::Context;
use crate::error::Error;
use crate::registry::Step;
use crate::runner::Pipeline;

const DEFAULT_TSL_TYPE: &str = "http://uri.etsi.org/TrstSvc/TrustedList/TSLType/EUgeneric";

/// Reads a directory of YAML metadata and PEM certificates and pushes the
/// synthesized status list as a singleton tree.
pub(crate) struct GenerateStep;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemeSpec {
    territory: String,
    #[serde(default)]
    operator: Option<String>,
    #[serde(rename = "type", default)]
    type_uri: Option<String>,
    #[serde(default)]
    sequence_number: Option<u64>,
    #[serde(default)]
    next_update_days: Option<i64>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ProviderSpec {
    name: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ServiceSpec {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type")]
    type_uri: String,
    status: String,
}

#[async_trait]
impl Step for GenerateStep {
    async fn run(
        &self,
        _pipeline: &Pipeline,
        mut context: Context,
        args: &[String],
    ) -> Result<Context, Error> {
        let dir = args
            .first()
            .map(PathBuf::from)
            .ok_or_else(|| Error::Config("generate requires a directory argument".to_string()))?;

        let scheme: SchemeSpec = read_yaml(&dir.join("scheme.yaml")).await?;
        let providers = read_providers(&dir.join("providers")).await?;

        let issue_date = OffsetDateTime::now_utc();
        let next_update = scheme
            .next_update_days
            .map(|days| issue_date + Duration::days(days));

        let canonical = tokio::fs::canonicalize(&dir).await?;
        let source = Url::from_file_path(&canonical)
            .map_err(|()| Error::Config(format!("cannot express {} as a URI", dir.display())))?;

        let list = StatusList::new(
            SchemeInformation::new(
                scheme.territory,
                scheme.type_uri.unwrap_or_else(|| DEFAULT_TSL_TYPE.to_string()),
                scheme.sequence_number.unwrap_or(1),
                Some(issue_date),
                next_update,
                scheme.operator.into_iter().collect(),
            ),
            providers,
            Source::from(&source),
            vec![],
        );

        info!(
            source = %list.source(),
            provider_count = list.provider_count(),
            service_count = list.service_count(),
            territory = list.scheme().territory(),
            "generated TSL"
        );
        context.add_tree(TslTree::singleton(std::sync::Arc::new(list)));
        Ok(context)
    }
}

async fn read_providers(dir: &Path) -> Result<Vec<TrustServiceProvider>, Error> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut provider_dirs = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            provider_dirs.push(entry.path());
        }
    }
    provider_dirs.sort();

    let mut providers = Vec::with_capacity(provider_dirs.len());
    for provider_dir in provider_dirs {
        let spec: ProviderSpec = read_yaml(&provider_dir.join("provider.yaml")).await?;
        let services = read_services(&provider_dir).await?;
        providers.push(TrustServiceProvider::new(vec![spec.name], services));
    }
    Ok(providers)
}

async fn read_services(dir: &Path) -> Result<Vec<TspService>, Error> {
    let mut pem_paths = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "pem") {
            pem_paths.push(path);
        }
    }
    pem_paths.sort();

    let mut services = Vec::with_capacity(pem_paths.len());
    for pem_path in pem_paths {
        let spec_path = pem_path.with_extension("yaml");
        let spec: ServiceSpec = read_yaml(&spec_path).await?;

        let pem_bytes = tokio::fs::read(&pem_path).await?;
        let (_, pem) = x509_parser::pem::parse_x509_pem(&pem_bytes).map_err(|e| {
            Error::Config(format!("{}: not a PEM certificate: {e}", pem_path.display()))
        })?;

        let name = spec.name.unwrap_or_else(|| {
            pem_path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        services.push(TspService::new(
            spec.type_uri,
            spec.status,
            vec![name],
            vec![DigitalIdentity::X509(CertificateDer::new(pem.contents))],
        ));
    }
    Ok(services)
}

async fn read_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Error> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::Config(format!("{}: {e}", path.display()))
    })?;
    serde_yaml::from_str(&text).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use rcgen::{CertificateParams, KeyPair};

    use super::*;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn synthesizes_a_tsl_from_the_directory_layout() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("scheme.yaml"),
            "territory: SE\noperator: Example Operator\nsequence_number: 4\nnext_update_days: 90\n",
        );
        write(
            &dir.path().join("providers/example-ca/provider.yaml"),
            "name: Example Provider\n",
        );
        write(
            &dir.path().join("providers/example-ca/root.yaml"),
            "name: Example Root CA\ntype: http://uri.etsi.org/TrstSvc/Svctype/CA/QC\nstatus: granted\n",
        );

        let key = KeyPair::generate().unwrap();
        let cert = CertificateParams::new(Vec::new())
            .unwrap()
            .self_signed(&key)
            .unwrap();
        write(&dir.path().join("providers/example-ca/root.pem"), &cert.pem());

        let pipeline = Pipeline::from_yaml("[]").unwrap();
        let context = GenerateStep
            .run(
                &pipeline,
                Context::new(),
                &[dir.path().display().to_string()],
            )
            .await
            .unwrap();

        assert_eq!(context.trees().len(), 1);
        let list = context.trees()[0].root().tsl();
        assert_eq!(list.scheme().territory(), "SE");
        assert_eq!(list.scheme().sequence_number(), 4);
        assert!(list.scheme().next_update().is_some());
        assert_eq!(list.provider_count(), 1);
        assert_eq!(list.service_count(), 1);

        let service = &list.providers()[0].services()[0];
        assert_eq!(service.names(), ["Example Root CA"]);
        assert_eq!(service.certificates().next().unwrap().as_bytes(), cert.der().as_ref());
    }

    #[tokio::test]
    async fn missing_scheme_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::from_yaml("[]").unwrap();
        let err = GenerateStep
            .run(
                &pipeline,
                Context::new(),
                &[dir.path().display().to_string()],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{err}");
    }

    #[tokio::test]
    async fn certificate_without_metadata_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("scheme.yaml"), "territory: SE\n");
        write(
            &dir.path().join("providers/p/provider.yaml"),
            "name: Provider\n",
        );
        let key = KeyPair::generate().unwrap();
        let cert = CertificateParams::new(Vec::new())
            .unwrap()
            .self_signed(&key)
            .unwrap();
        write(&dir.path().join("providers/p/orphan.pem"), &cert.pem());

        let pipeline = Pipeline::from_yaml("[]").unwrap();
        let err = GenerateStep
            .run(
                &pipeline,
                Context::new(),
                &[dir.path().display().to_string()],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{err}");
    }
}
