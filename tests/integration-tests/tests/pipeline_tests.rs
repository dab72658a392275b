// Copyright 2024-2026 the trustl contributors
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// https://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// https://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! End-to-end pipeline scenarios: loading fixture TSLs from disk,
//! depth-bounded selection and the publish/load round trip.

use trustl_integration::{
    subscribe, write_tsl, FixtureService, TestCa, CA_QC, GRANTED, WITHDRAWN,
};
use trustl_pipeline::{Context, Pipeline};
use trustl_tsl::CertificateDer;

#[tokio::test]
async fn empty_pipeline_produces_an_empty_snapshot() {
    subscribe();
    let pipeline = Pipeline::from_yaml("[]").unwrap();
    let context = pipeline.run(Context::new()).await.unwrap();
    assert!(context.trees().is_empty());
    assert!(context.pool().is_empty());
}

#[tokio::test]
async fn load_and_select_pools_the_root_certificates() {
    subscribe();
    let dir = tempfile::tempdir().unwrap();
    let ca = TestCa::new("fixture root CA");
    let url = write_tsl(
        dir.path(),
        "tsl.xml",
        "SE",
        1,
        vec![FixtureService::granted_ca(ca.der())],
        &[],
    );

    let pipeline =
        Pipeline::from_yaml(&format!("- load: [\"{url}\"]\n- select: []")).unwrap();
    let context = pipeline.run(Context::new()).await.unwrap();

    assert_eq!(context.tsl_count(), 1);
    assert_eq!(context.pool().len(), 1);
    assert!(context.pool().contains(&CertificateDer::new(ca.der())));
}

/// A root referencing two leaves: `reference-depth` governs which layers
/// contribute certificates, and `max-depth:0` never fetches the leaves.
#[tokio::test]
async fn reference_depth_bounds_the_pool() {
    subscribe();
    let dir = tempfile::tempdir().unwrap();
    let root_ca = TestCa::new("root CA");
    let leaf_a_ca = TestCa::new("leaf A CA");
    let leaf_b_ca = TestCa::new("leaf B CA");

    let leaf_a = write_tsl(
        dir.path(),
        "a.xml",
        "DK",
        1,
        vec![FixtureService::granted_ca(leaf_a_ca.der())],
        &[],
    );
    let leaf_b = write_tsl(
        dir.path(),
        "b.xml",
        "NO",
        1,
        vec![FixtureService::granted_ca(leaf_b_ca.der())],
        &[],
    );
    let root = write_tsl(
        dir.path(),
        "root.xml",
        "SE",
        1,
        vec![FixtureService::granted_ca(root_ca.der())],
        &[leaf_a, leaf_b],
    );

    let yaml = format!(
        "- set-fetch-options: [\"max-depth:1\"]\n- load: [\"{root}\"]\n- select: [\"reference-depth:1\"]"
    );
    let context = Pipeline::from_yaml(&yaml).unwrap().run(Context::new()).await.unwrap();
    assert_eq!(context.trees()[0].size(), 3);
    assert_eq!(context.pool().len(), 3);

    let yaml = format!(
        "- set-fetch-options: [\"max-depth:1\"]\n- load: [\"{root}\"]\n- select: [\"reference-depth:0\"]"
    );
    let context = Pipeline::from_yaml(&yaml).unwrap().run(Context::new()).await.unwrap();
    assert_eq!(context.pool().len(), 1);
    assert!(context.pool().contains(&CertificateDer::new(root_ca.der())));

    // with max-depth 0 the leaves are never fetched at all
    let yaml = format!(
        "- set-fetch-options: [\"max-depth:0\"]\n- load: [\"{root}\"]\n- select: [\"include-referenced\"]"
    );
    let context = Pipeline::from_yaml(&yaml).unwrap().run(Context::new()).await.unwrap();
    assert_eq!(context.trees()[0].size(), 1);
    assert_eq!(context.pool().len(), 1);
}

#[tokio::test]
async fn select_predicates_gate_the_pool() {
    subscribe();
    let dir = tempfile::tempdir().unwrap();
    let granted_ca = TestCa::new("granted CA");
    let withdrawn_ca = TestCa::new("withdrawn CA");
    let other_type_ca = TestCa::new("other type CA");

    let url = write_tsl(
        dir.path(),
        "tsl.xml",
        "SE",
        1,
        vec![
            FixtureService::granted_ca(granted_ca.der()),
            FixtureService {
                type_uri: CA_QC.to_string(),
                status: WITHDRAWN.to_string(),
                certificate: withdrawn_ca.der(),
            },
            FixtureService {
                type_uri: "http://uri.etsi.org/TrstSvc/Svctype/TSA".to_string(),
                status: GRANTED.to_string(),
                certificate: other_type_ca.der(),
            },
        ],
        &[],
    );

    let yaml = format!(
        "- load: [\"{url}\"]\n- select: [\"service-type:{CA_QC}\", \"status:{GRANTED}\"]"
    );
    let context = Pipeline::from_yaml(&yaml).unwrap().run(Context::new()).await.unwrap();

    assert_eq!(context.pool().len(), 1);
    assert!(context.pool().contains(&CertificateDer::new(granted_ca.der())));
}

/// The publish/load round trip: a published document fetched back yields
/// an equal status list.
#[tokio::test]
async fn published_documents_load_back_equal() {
    subscribe();
    let fixture_dir = tempfile::tempdir().unwrap();
    let publish_dir = tempfile::tempdir().unwrap();
    let ca = TestCa::new("round trip CA");

    let url = write_tsl(
        fixture_dir.path(),
        "tsl.xml",
        "SE",
        7,
        vec![FixtureService::granted_ca(ca.der())],
        &[],
    );

    let yaml = format!(
        "- load: [\"{url}\"]\n- publish: [\"{}\"]",
        publish_dir.path().display()
    );
    let context = Pipeline::from_yaml(&yaml).unwrap().run(Context::new()).await.unwrap();
    let original = context.trees()[0].root().tsl().clone();

    let republished = publish_dir.path().join("se-7.xml");
    let yaml = format!("- load: [\"{}\"]", republished.display());
    let reloaded = Pipeline::from_yaml(&yaml).unwrap().run(Context::new()).await.unwrap();
    let reloaded = reloaded.trees()[0].root().tsl().clone();

    assert_eq!(reloaded.scheme(), original.scheme());
    assert_eq!(reloaded.providers(), original.providers());
}

#[tokio::test]
async fn step_failures_carry_their_position() {
    subscribe();
    let pipeline = Pipeline::from_yaml("- echo: []\n- select: []").unwrap();
    let err = pipeline.run(Context::new()).await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("step 1"), "{message}");
    assert!(message.contains("select"), "{message}");
}
