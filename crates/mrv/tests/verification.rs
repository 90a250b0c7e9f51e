//! End-to-end verification scenarios: a record written by a session, then
//! checked against the ledger the way a third party would.

use std::fs;

use serde_json::Value;

use mrv::core::canonical_pretty;
use mrv::store::RecordStore;
use mrv::{RecordId, VerificationOutcome};
use mrv_testkit::{sample_record, ScriptedMeter, TestFixture};

#[test]
fn saved_but_never_anchored_is_not_found() {
    let fx = TestFixture::new();
    let store = fx.store();
    let record = sample_record("MRV-unanchored");
    store.save(&record, None).unwrap();

    let report = fx
        .verifier()
        .verify_file(record.id.as_str(), &store.path_for(&record.id))
        .unwrap();

    assert_eq!(report.outcome, VerificationOutcome::NotFound);
    assert_eq!(report.outcome.exit_code(), 3);
    assert_eq!(report.local_digest, record.digest().unwrap());
    assert!(report.anchor.is_none());
}

#[test]
fn anchored_record_verifies() {
    let fx = TestFixture::new();
    let mut session = fx.session(fx.config("anchored"), ScriptedMeter::new(0.25));
    session.track(|| ()).unwrap();

    let id = session.mrv_id().unwrap().clone();
    let path = fx.store().path_for(&id);
    assert!(session.verify_on_blockchain());

    let report = fx.verifier().verify_file(id.as_str(), &path).unwrap();
    assert_eq!(report.outcome, VerificationOutcome::Valid);
    assert_eq!(report.outcome.exit_code(), 0);
    assert_eq!(Some(report.local_digest), session.get_hash());

    let anchor = report.anchor.as_ref().unwrap();
    assert_eq!(Some(anchor.submitter), fx.ledger().account());
    assert!(anchor.timestamp > 0);

    let text = report.to_string();
    assert!(text.contains("VALID"));
    assert!(text.contains(&report.local_digest.to_hex()));
}

#[test]
fn untouched_full_precision_record_verifies() {
    let fx = TestFixture::new();
    let store = fx.store();
    let mut record = sample_record("MRV-precise");
    record.energy_emissions.energy_kwh = 985.6906946328695;
    record.energy_emissions.co2_kg = 0.1 + 0.2;
    record.hardware.ram_gb = 15.532817840576172;
    store.save(&record, None).unwrap();

    let digest = record.digest().unwrap();
    assert!(fx.ledger().anchor(record.id.as_str(), &digest).is_some());

    let report = fx
        .verifier()
        .verify_file(record.id.as_str(), &store.path_for(&record.id))
        .unwrap();
    assert_eq!(report.outcome, VerificationOutcome::Valid);
    assert_eq!(report.local_digest, digest);
}

#[test]
fn edited_file_is_tampered() {
    let fx = TestFixture::new();
    let mut session = fx.session(fx.config("tamper"), ScriptedMeter::new(0.25));
    session.track(|| ()).unwrap();

    let id = session.mrv_id().unwrap().clone();
    let path = fx.store().path_for(&id);
    let original = session.get_hash().unwrap();

    let mut value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    value["energy_emissions"]["energy_kwh"] = serde_json::json!(0.01);
    fs::write(&path, canonical_pretty(&value).unwrap()).unwrap();

    let report = fx.verifier().verify_file(id.as_str(), &path).unwrap();
    match &report.outcome {
        VerificationOutcome::Tampered { local, on_chain } => {
            assert_eq!(*on_chain, original);
            assert_ne!(*local, original);
            assert_eq!(*local, report.local_digest);
        }
        other => panic!("expected tampered, got {:?}", other),
    }
    assert_eq!(report.outcome.exit_code(), 2);
    assert!(report.to_string().contains("TAMPERED"));
}

#[test]
fn whitespace_only_edits_still_verify() {
    let fx = TestFixture::new();
    let mut session = fx.session(fx.config("layout"), ScriptedMeter::new(0.5));
    session.track(|| ()).unwrap();

    let id = session.mrv_id().unwrap().clone();
    let path = fx.store().path_for(&id);
    let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();

    let report = fx.verifier().verify_file(id.as_str(), &path).unwrap();
    assert!(report.outcome.is_valid());
}

#[test]
fn offline_ledger_is_not_connected() {
    let fx = TestFixture::new();
    let mut session = fx.session(fx.config("offline"), ScriptedMeter::new(0.25));
    session.track(|| ()).unwrap();
    let id = session.mrv_id().unwrap().clone();

    fx.chain.set_online(false);
    let report = fx
        .verifier()
        .verify_file(id.as_str(), &fx.store().path_for(&id))
        .unwrap();

    assert_eq!(report.outcome, VerificationOutcome::NotConnected);
    assert_eq!(report.outcome.exit_code(), 4);
    assert!(!session.verify_on_blockchain());
}

#[test]
fn missing_file_is_an_error() {
    let fx = TestFixture::new();
    let path = fx.scratch().join("MRV-gone.json");
    assert!(fx.verifier().verify_file("MRV-gone", &path).is_err());
}

#[test]
fn unknown_id_loads_as_none() {
    let fx = TestFixture::new();
    let id = RecordId::parse("MRV-nonexistent").unwrap();
    assert!(fx.store().load(&id).unwrap().is_none());
    assert!(fx.reader().get(id.as_str()).is_none());
}
