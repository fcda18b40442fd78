use super::PresenceTracker;
use std::collections::HashMap;
use std::sync::{Arc, Barrier};
use std::thread;

fn tracker() -> PresenceTracker {
    PresenceTracker::new()
}

fn id(s: &str) -> String {
    s.to_string()
}

// Cross-references both indexes: every viewer of a topic lists the topic and
// every topic of a connection lists the connection. No empty entries.
fn assert_consistent(tracker: &PresenceTracker) {
    for topic in tracker.active_topics() {
        let viewers = tracker.viewers_of(&topic);
        assert!(!viewers.is_empty(), "empty viewer set left for {topic}");
        assert_eq!(tracker.viewer_count(&topic), viewers.len());
        for conn in viewers {
            assert!(
                tracker.topics_of(&conn).contains(&topic),
                "{conn} views {topic} but reverse index disagrees"
            );
        }
    }

    for conn in tracker.active_connections() {
        let topics = tracker.topics_of(&conn);
        assert!(!topics.is_empty(), "empty topic set left for {conn}");
        for topic in topics {
            assert!(
                tracker.is_viewing(&topic, &conn),
                "{conn} lists {topic} but viewer index disagrees"
            );
        }
    }
}

#[test]
fn test_tracker_new_is_empty() {
    let tracker = tracker();
    assert!(tracker.active_topics().is_empty());
    assert!(tracker.active_connections().is_empty());
    assert_eq!(tracker.viewer_count(&id("dish-1")), 0);
}

#[test]
fn test_start_viewing_returns_running_count() {
    let tracker = tracker();
    assert_eq!(tracker.start_viewing(id("dish-42"), id("c1")), 1);
    assert_eq!(tracker.start_viewing(id("dish-42"), id("c2")), 2);
    assert_eq!(tracker.start_viewing(id("dish-42"), id("c3")), 3);
    assert_eq!(tracker.viewer_count(&id("dish-42")), 3);
}

#[test]
fn test_start_viewing_is_idempotent() {
    let tracker = tracker();
    let first = tracker.start_viewing(id("dish-1"), id("c1"));
    let second = tracker.start_viewing(id("dish-1"), id("c1"));
    assert_eq!(first, 1);
    assert_eq!(second, first);
    assert_eq!(tracker.topics_of(&id("c1")), vec![id("dish-1")]);
}

#[test]
fn test_repeat_start_returns_current_count_not_one() {
    let tracker = tracker();
    tracker.start_viewing(id("dish-1"), id("c1"));
    tracker.start_viewing(id("dish-1"), id("c2"));
    assert_eq!(tracker.start_viewing(id("dish-1"), id("c1")), 2);
}

#[test]
fn test_one_connection_many_topics() {
    let tracker = tracker();
    tracker.start_viewing(id("dish-1"), id("c1"));
    tracker.start_viewing(id("dish-2"), id("c1"));

    let mut topics = tracker.topics_of(&id("c1"));
    topics.sort();
    assert_eq!(topics, vec![id("dish-1"), id("dish-2")]);
    assert_consistent(&tracker);
}

#[test]
fn test_stop_viewing_all_topics_reports_new_counts() {
    let tracker = tracker();
    tracker.start_viewing(id("dish-1"), id("c1"));
    tracker.start_viewing(id("dish-1"), id("c2"));
    tracker.start_viewing(id("dish-2"), id("c1"));

    let counts = tracker.stop_viewing_all_topics(&id("c1"));

    let expected: HashMap<String, usize> = [(id("dish-1"), 1), (id("dish-2"), 0)].into();
    assert_eq!(counts, expected);
    assert!(tracker.topics_of(&id("c1")).is_empty());
    assert_consistent(&tracker);
}

#[test]
fn test_last_viewer_leaving_removes_topic() {
    let tracker = tracker();
    tracker.start_viewing(id("dish-7"), id("c1"));

    let counts = tracker.stop_viewing_all_topics(&id("c1"));

    assert_eq!(counts.get("dish-7"), Some(&0));
    assert_eq!(tracker.viewer_count(&id("dish-7")), 0);
    assert!(!tracker.active_topics().contains(&id("dish-7")));
    assert!(!tracker.active_connections().contains(&id("c1")));
}

#[test]
fn test_disconnect_leaves_other_viewers_untouched() {
    let tracker = tracker();
    tracker.start_viewing(id("dish-1"), id("c1"));
    tracker.start_viewing(id("dish-1"), id("c2"));

    tracker.stop_viewing_all_topics(&id("c1"));

    assert_eq!(tracker.viewer_count(&id("dish-1")), 1);
    assert!(tracker.is_viewing(&id("dish-1"), &id("c2")));
    assert!(!tracker.is_viewing(&id("dish-1"), &id("c1")));
}

#[test]
fn test_stop_viewing_unknown_connection_is_noop() {
    let tracker = tracker();
    tracker.start_viewing(id("dish-1"), id("c1"));

    let counts = tracker.stop_viewing_all_topics(&id("never-seen"));

    assert!(counts.is_empty());
    assert_eq!(tracker.viewer_count(&id("dish-1")), 1);
    assert_eq!(tracker.counts(), HashMap::from([(id("dish-1"), 1)]));
}

#[test]
fn test_second_disconnect_returns_empty() {
    let tracker = tracker();
    tracker.start_viewing(id("dish-1"), id("c1"));
    assert_eq!(tracker.stop_viewing_all_topics(&id("c1")).len(), 1);
    assert!(tracker.stop_viewing_all_topics(&id("c1")).is_empty());
}

#[test]
fn test_empty_identifiers_are_accepted() {
    let tracker = tracker();
    assert_eq!(tracker.start_viewing(String::new(), String::new()), 1);
    assert_eq!(tracker.viewer_count(&String::new()), 1);
    assert_eq!(
        tracker.stop_viewing_all_topics(&String::new()),
        HashMap::from([(String::new(), 0)])
    );
}

#[test]
fn test_non_string_identifiers() {
    let tracker: PresenceTracker<u64, u32> = PresenceTracker::new();
    assert_eq!(tracker.start_viewing(42, 1), 1);
    assert_eq!(tracker.start_viewing(42, 2), 2);
    assert_eq!(tracker.stop_viewing_all_topics(&1), HashMap::from([(42, 1)]));
}

#[test]
fn test_dish_scenario() {
    let tracker = tracker();
    let dish = id("dish-42");

    assert_eq!(tracker.start_viewing(dish.clone(), id("c1")), 1);
    assert_eq!(tracker.start_viewing(dish.clone(), id("c2")), 2);
    assert_eq!(tracker.start_viewing(dish.clone(), id("c3")), 3);

    let counts = tracker.stop_viewing_all_topics(&id("c2"));
    assert_eq!(counts, HashMap::from([(dish.clone(), 2)]));
    assert_eq!(tracker.viewer_count(&dish), 2);

    tracker.stop_viewing_all_topics(&id("c1"));
    tracker.stop_viewing_all_topics(&id("c3"));

    assert!(!tracker.active_topics().contains(&dish));
    assert_eq!(tracker.viewer_count(&dish), 0);
    assert!(tracker.active_connections().is_empty());
}

#[test]
fn test_mixed_sequence_keeps_indexes_inverse() {
    let tracker = tracker();
    for round in 0..5 {
        for c in 0..6 {
            for t in 0..4 {
                if (c + t + round) % 3 != 0 {
                    tracker.start_viewing(format!("dish-{t}"), format!("c{c}"));
                }
            }
        }
        assert_consistent(&tracker);

        for c in (round % 2..6).step_by(2) {
            tracker.stop_viewing_all_topics(&format!("c{c}"));
            assert_consistent(&tracker);
        }
    }
}

#[test]
fn test_concurrent_starts_do_not_lose_updates() {
    const VIEWERS: usize = 64;
    let tracker = Arc::new(tracker());
    let barrier = Arc::new(Barrier::new(VIEWERS));

    let handles: Vec<_> = (0..VIEWERS)
        .map(|i| {
            let tracker = tracker.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                tracker.start_viewing(id("dish-42"), format!("c{i}"))
            })
        })
        .collect();

    let mut returned: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    returned.sort_unstable();

    assert_eq!(tracker.viewer_count(&id("dish-42")), VIEWERS);
    // Each add observed its own count atomically, so every value appears once.
    assert_eq!(returned, (1..=VIEWERS).collect::<Vec<_>>());
}

#[test]
fn test_concurrent_start_and_disconnect_stay_consistent() {
    let tracker = Arc::new(tracker());

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let tracker = tracker.clone();
            thread::spawn(move || {
                for i in 0..200 {
                    let conn = format!("w{worker}-c{}", i % 5);
                    tracker.start_viewing(format!("dish-{}", i % 7), conn.clone());
                    if i % 3 == 0 {
                        tracker.stop_viewing_all_topics(&conn);
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_consistent(&tracker);

    for conn in tracker.active_connections() {
        tracker.stop_viewing_all_topics(&conn);
    }
    assert!(tracker.active_topics().is_empty());
    assert!(tracker.counts().is_empty());
}
