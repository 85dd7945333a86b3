//! Tests for batch policy triggers

use std::time::Duration;

use super::*;

fn config(count: Option<usize>, byte_size: Option<usize>, period: Option<Duration>) -> BatchPolicyConfig {
    BatchPolicyConfig {
        count,
        byte_size,
        period,
        check: None,
    }
}

#[test]
fn noop_detection() {
    assert!(BatchPolicyConfig::default().is_noop());
    assert!(!config(Some(2), None, None).is_noop());
    assert!(!config(None, Some(10), None).is_noop());
    assert!(!config(None, None, Some(Duration::from_secs(1))).is_noop());
    assert!(!BatchPolicyConfig {
        check: Some("this.flush".into()),
        ..Default::default()
    }
    .is_noop());
}

#[test]
fn count_trigger() {
    let mut policy = BatchPolicy::new(&config(Some(3), None, None), None);

    assert!(!policy.add(Part::from("a")));
    assert!(!policy.add(Part::from("b")));
    assert!(policy.add(Part::from("c")));
    assert_eq!(policy.count(), 3);

    let batch = policy.flush().expect("accumulated batch");
    assert_eq!(batch.len(), 3);
    assert_eq!(policy.count(), 0);
    assert!(policy.flush().is_none());
}

#[test]
fn byte_size_trigger_counts_payload_only() {
    let mut policy = BatchPolicy::new(&config(None, Some(5), None), None);

    let mut fat_metadata = Part::from("ab");
    fat_metadata.meta_set("k", "a metadata value far larger than the payload");

    assert!(!policy.add(fat_metadata));
    assert_eq!(policy.accumulated_bytes(), 2);
    assert!(policy.add(Part::from("cde")));

    let batch = policy.flush().unwrap();
    assert_eq!(batch.byte_size(), 5);
    assert_eq!(policy.accumulated_bytes(), 0);
}

#[test]
fn condition_trigger_sees_accumulated_parts() {
    struct FlushOnMarker;

    impl BatchCondition for FlushOnMarker {
        fn test(&self, parts: &[Part]) -> bool {
            parts
                .last()
                .is_some_and(|p| p.as_bytes() == b"flush")
        }
    }

    let cfg = BatchPolicyConfig {
        check: Some("payload == flush".into()),
        ..Default::default()
    };
    let mut policy = BatchPolicy::new(&cfg, Some(std::sync::Arc::new(FlushOnMarker)));

    assert!(!policy.add(Part::from("a")));
    assert!(!policy.add(Part::from("b")));
    assert!(policy.add(Part::from("flush")));
    assert_eq!(policy.flush().unwrap().len(), 3);
}

#[test]
fn period_timer_resets_on_flush() {
    let mut policy = BatchPolicy::new(&config(None, None, Some(Duration::from_millis(50))), None);

    let remaining = policy.until_next().unwrap();
    assert!(remaining <= Duration::from_millis(50));

    std::thread::sleep(Duration::from_millis(60));
    assert_eq!(policy.until_next().unwrap(), Duration::ZERO);

    policy.add(Part::from("a"));
    policy.flush().unwrap();
    assert!(policy.until_next().unwrap() > Duration::ZERO);
}

#[test]
fn no_period_means_no_timer() {
    let policy = BatchPolicy::new(&config(Some(3), None, None), None);
    assert!(policy.until_next().is_none());
}

#[test]
fn simultaneous_triggers_flush_once() {
    // count and byte_size both fire on the same add; one flush resets both.
    let mut policy = BatchPolicy::new(&config(Some(2), Some(2), None), None);

    assert!(!policy.add(Part::from("a")));
    assert!(policy.add(Part::from("b")));

    assert_eq!(policy.flush().unwrap().len(), 2);
    assert_eq!(policy.count(), 0);
    assert_eq!(policy.accumulated_bytes(), 0);
    assert!(!policy.add(Part::from("c")));
}

#[test]
fn parts_flush_in_add_order() {
    let mut policy = BatchPolicy::new(&config(Some(10), None, None), None);
    for p in ["one", "two", "three"] {
        policy.add(Part::from(p));
    }
    let batch = policy.flush().unwrap();
    let payloads: Vec<&[u8]> = batch.iter().map(|p| p.as_bytes()).collect();
    assert_eq!(payloads, vec![b"one" as &[u8], b"two", b"three"]);
}

#[test]
fn empty_flush_still_resets_period() {
    let mut policy = BatchPolicy::new(&config(None, None, Some(Duration::from_millis(40))), None);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(policy.until_next().unwrap(), Duration::ZERO);

    assert!(policy.flush().is_none());
    assert!(policy.until_next().unwrap() > Duration::ZERO);
}
