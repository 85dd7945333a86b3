//! Tests for part copy and metadata semantics

use super::*;

#[derive(Debug, thiserror::Error)]
#[error("boom")]
struct Boom;

#[test]
fn payload_accessors() {
    let mut part = Part::from("hello");
    assert_eq!(part.as_bytes(), b"hello");
    assert_eq!(part.byte_size(), 5);

    part.set_payload(Bytes::from_static(b"world!"));
    assert_eq!(part.as_bytes(), b"world!");
    assert_eq!(part.byte_size(), 6);
}

#[test]
fn metadata_set_get_delete() {
    let mut part = Part::from("x");
    assert!(part.meta_get("foo").is_none());
    assert_eq!(part.meta_len(), 0);

    part.meta_set("foo", "bar");
    part.meta_set("count", 3);
    assert_eq!(part.meta_get("foo"), Some(&Value::from("bar")));
    assert_eq!(part.meta_get("count"), Some(&Value::from(3)));
    assert_eq!(part.meta_len(), 2);

    part.meta_delete("foo");
    assert!(part.meta_get("foo").is_none());
    assert_eq!(part.meta_len(), 1);

    // Deleting a missing key is a no-op.
    part.meta_delete("foo");
    assert_eq!(part.meta_len(), 1);
}

#[test]
fn shallow_copy_isolates_metadata_writes() {
    let mut original = Part::from("payload");
    original.meta_set("shared", "yes");

    let mut copy = original.clone();
    copy.meta_set("only_on_copy", 1);
    copy.meta_set("shared", "no");

    // The copy sees its own writes.
    assert_eq!(copy.meta_get("shared"), Some(&Value::from("no")));
    assert_eq!(copy.meta_get("only_on_copy"), Some(&Value::from(1)));

    // The original's visible metadata set is untouched.
    assert_eq!(original.meta_get("shared"), Some(&Value::from("yes")));
    assert!(original.meta_get("only_on_copy").is_none());

    // Writes on the original after the fork are invisible to the copy.
    original.meta_set("late", true);
    assert!(copy.meta_get("late").is_none());
}

#[test]
fn shallow_copy_shares_payload_storage() {
    let original = Part::from("shared-bytes");
    let copy = original.clone();
    // Bytes clones share the same backing allocation.
    assert_eq!(
        original.payload().as_ptr(),
        copy.payload().as_ptr(),
    );
}

#[test]
fn error_tag_is_advisory() {
    let mut part = Part::from("x");
    assert!(!part.is_errored());

    part.set_error(Boom);
    assert!(part.is_errored());
    assert_eq!(part.error().unwrap().to_string(), "boom");

    // The payload is still accessible and mutable.
    part.set_payload(Bytes::from_static(b"y"));
    assert_eq!(part.as_bytes(), b"y");

    part.clear_error();
    assert!(!part.is_errored());
}

#[test]
fn error_tag_survives_shallow_copy() {
    let mut part = Part::from("x");
    part.set_error(Boom);

    let mut copy = part.clone();
    assert!(copy.is_errored());

    copy.clear_error();
    assert!(!copy.is_errored());
    assert!(part.is_errored());
}
