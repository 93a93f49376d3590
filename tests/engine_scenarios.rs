//! End-to-end subscription and ingestion scenarios.

mod fixtures;

use fixtures::EngineRig;
use swarmlog::EngineConfig;

#[test]
fn fresh_object_snapshot_op_then_subscribe() {
    let mut rig = EngineRig::new("me");
    rig.seed_object();

    rig.deliver("/T#A.on", "", "peer");
    let responses = rig.responses();
    assert_eq!(responses.len(), 2);

    assert_eq!(responses[0].spec.to_string(), "/T#A.diff");
    assert_eq!(
        responses[0].value,
        "\t!10+X!10+X.state\ts0\n\t!11+X.set\tv\n"
    );
    assert_eq!(responses[1].spec.to_string(), "/T#A.on");
    assert_eq!(responses[1].value, "11+X");
}

#[test]
fn echo_of_latest_op_updates_echo_bookmark() {
    let mut rig = EngineRig::new("me");
    rig.seed_object();
    let before = rig.records("/T#A");

    rig.deliver("/T#A!11+X.set", "v", "Y");
    assert!(rig.responses().is_empty());

    assert_eq!(rig.record("/T#A", ".ebm&Y").as_deref(), Some("11+X"));
    assert_eq!(rig.tip("/T#A").as_deref(), Some("11+X"));
    // nothing but the echo bookmark changed
    assert_eq!(rig.records("/T#A").len(), before.len() + 1);
}

#[test]
fn in_order_op_from_second_source() {
    let mut rig = EngineRig::new("me");
    rig.seed_object();

    rig.deliver("/T#A!12+Z.set", "w", "Z");
    let responses = rig.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].spec.to_string(), "/T#A!12+Z.set");

    assert_eq!(rig.tip("/T#A").as_deref(), Some("12+Z"));
    assert_eq!(rig.record("/T#A", "!12+Z.set").as_deref(), Some("w"));
}

#[test]
fn reorder_writes_op_and_backreference() {
    let mut rig = EngineRig::new("me");
    rig.seed_object();
    rig.deliver("/T#A!12+Z.set", "w", "Z");
    let _ = rig.responses();

    rig.deliver("/T#A!09+W.set", "u", "W");
    let responses = rig.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].spec.to_string(), "/T#A!09+W.set");

    assert_eq!(rig.record("/T#A", "!09+W.set").as_deref(), Some("u"));
    assert_eq!(rig.record("/T#A", "!12+Z.~br").as_deref(), Some("!09+W"));
    // a reorder never lowers the tip
    assert_eq!(rig.tip("/T#A").as_deref(), Some("12+Z"));
}

#[test]
fn subscription_with_vector_base_resolves_backrefs() {
    let mut rig = EngineRig::new("me");
    rig.seed_object();
    rig.deliver("/T#A!12+Z.set", "w", "Z");
    rig.deliver("/T#A!09+W.set", "u", "W");
    let _ = rig.responses();

    rig.deliver("/T#A.on", "!11+X", "peer");
    let responses = rig.responses();
    assert_eq!(responses[0].spec.to_string(), "/T#A.diff");
    assert_eq!(responses[0].value, "\t!09+W.set\tu\n\t!12+Z.set\tw\n");
}

#[test]
fn causal_violation_is_reported_not_written() {
    let mut rig = EngineRig::new("me");
    rig.seed_object();
    let before = rig.records("/T#A");

    rig.deliver("/T#A!09+X.set", "bad", "P");
    let responses = rig.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].spec.to_string(), "/T#A.error");
    assert_eq!(responses[0].value, "op is out of order");
    assert_eq!(rig.records("/T#A"), before);
}

#[test]
fn op_without_prior_state_is_an_error() {
    let mut rig = EngineRig::new("me");
    rig.deliver("/T#A!11+X.set", "v", "X");
    let responses = rig.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].spec.to_string(), "/T#A.error");
    assert_eq!(responses[0].value, "no such object");
    assert!(rig.records("/T#A").is_empty());
}

#[test]
fn second_reorder_from_same_source_leaves_backref_alone() {
    let mut rig = EngineRig::new("me");
    rig.seed_object();
    rig.deliver("/T#A!12+Z.set", "w", "Z");
    rig.deliver("/T#A!09+W.set", "u", "W");
    let _ = rig.responses();

    rig.deliver("/T#A!10+W.set", "u2", "W");
    let responses = rig.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(rig.record("/T#A", "!10+W.set").as_deref(), Some("u2"));
    assert_eq!(rig.record("/T#A", "!12+Z.~br").as_deref(), Some("!09+W"));
}

#[test]
fn off_and_peer_error_are_consumed_silently() {
    let mut rig = EngineRig::new("me");
    rig.seed_object();

    rig.deliver("/T#A.off", "", "peer");
    rig.deliver("/T#A.error", "peer lost its marbles", "peer");
    assert!(rig.responses().is_empty());
}

#[test]
fn incoming_diff_is_flattened_in_order() {
    let mut rig = EngineRig::new("me");
    let payload = "\t!10+X!10+X.state\ts0\n\t!11+X.set\tv\n\t!12+X.set\tv2\n";
    rig.deliver("/T#A.diff", payload, "peer");

    let responses = rig.responses();
    // the snapshot is silent; both ops echo back in order
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[0].spec.to_string(), "/T#A!11+X.set");
    assert_eq!(responses[1].spec.to_string(), "/T#A!12+X.set");
    assert_eq!(rig.tip("/T#A").as_deref(), Some("12+X"));
}

#[test]
fn bookmarking_records_peer_positions() {
    let mut rig = EngineRig::with_config(
        "me",
        EngineConfig {
            bookmarking: true,
            ..EngineConfig::default()
        },
    );
    rig.seed_object();
    rig.deliver("/T#A!12+Z.set", "w", "Z");
    let _ = rig.responses();

    assert_eq!(rig.record("/T#A", ".bm&Z").as_deref(), Some("12+Z"));
    assert_eq!(rig.record("/T#A", ".bm&X").as_deref(), Some("11+X"));
}

#[test]
fn subscription_reciprocal_uses_stored_bookmark() {
    let mut rig = EngineRig::with_config(
        "me",
        EngineConfig {
            bookmarking: true,
            ..EngineConfig::default()
        },
    );
    rig.seed_object();
    rig.deliver("/T#A!12+peer.set", "p", "peer");
    let _ = rig.responses();

    rig.deliver("/T#A.on", "!11+X", "peer");
    let responses = rig.responses();
    let reciprocal = responses.last().unwrap();
    assert_eq!(reciprocal.spec.to_string(), "/T#A.on");
    assert_eq!(reciprocal.value, "12+peer");
}

#[test]
fn snapshot_from_foreign_author_is_rejected() {
    let mut rig = EngineRig::new("me");
    rig.seed_object();

    rig.deliver("/T#A!13+Q!13+Q.state", "s2", "Q");
    let responses = rig.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].spec.to_string(), "/T#A.error");
    assert_eq!(responses[0].value, "have state already");
}

#[test]
fn local_snapshot_compacts_the_recent_record() {
    let mut rig = EngineRig::new("me");
    rig.seed_object();

    rig.deliver("/T#A!20+me!20+me!11+X.state", "s1", "me");
    assert!(rig.responses().is_empty());

    assert!(rig.record("/T#A", "!10+X!10+X.state").is_none());
    assert_eq!(
        rig.record("/T#A", "!20+me!20+me!11+X.state").as_deref(),
        Some("s1")
    );
    assert_eq!(
        rig.record("/T#A", ".recent_state").as_deref(),
        Some("!20+me!20+me!11+X")
    );
    // base state is untouched
    assert_eq!(
        rig.record("/T#A", ".base_state").as_deref(),
        Some("!10+X!10+X")
    );
    assert_eq!(rig.tip("/T#A").as_deref(), Some("20+me"));
}

#[test]
fn objects_are_isolated_by_prefix() {
    let mut rig = EngineRig::new("me");
    rig.seed_object();
    rig.deliver("/T#B!01+Y!01+Y.state", "other", "Y");
    let _ = rig.responses();

    rig.deliver("/T#A.on", "", "peer");
    let responses = rig.responses();
    assert_eq!(
        responses[0].value,
        "\t!10+X!10+X.state\ts0\n\t!11+X.set\tv\n"
    );
    assert_eq!(rig.tip("/T#B").as_deref(), Some("01+Y"));
}
