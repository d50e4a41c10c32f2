use yata_core::{Doc, Event};

// Generate all permutations using Heap's algorithm
fn heap_permute(k: usize, items: &mut [Event], res: &mut Vec<Vec<Event>>) {
    if k == 1 {
        res.push(items.to_vec());
        return;
    }
    heap_permute(k - 1, items, res);
    for i in 0..(k - 1) {
        if k % 2 == 0 {
            items.swap(i, k - 1);
        } else {
            items.swap(0, k - 1);
        }
        heap_permute(k - 1, items, res);
    }
}

fn assert_permutations_converge(events: Vec<Event>) -> String {
    let mut permutations = Vec::new();
    heap_permute(events.len(), &mut events.clone(), &mut permutations);

    let mut baseline: Option<(String, Vec<_>)> = None;
    for perm in permutations {
        let mut doc = Doc::new(99);
        for event in &perm {
            doc.apply(event).unwrap();
        }
        doc.validate_invariants().unwrap();
        assert_eq!(doc.pending_len(), 0);
        let state = (doc.content(), doc.snapshot().into_blocks());
        if let Some(base) = &baseline {
            assert_eq!(state, *base);
        } else {
            baseline = Some(state);
        }
    }
    baseline.map(|(text, _)| text).unwrap_or_default()
}

#[test]
fn concurrent_inserts_from_three_clients_converge() {
    let mut base = Doc::new(1);
    let seed = base.insert_text(0, "ac").unwrap();

    let mut b = Doc::new(2);
    let mut c = Doc::new(3);
    b.apply(&seed).unwrap();
    c.apply(&seed).unwrap();

    let from_a = base.insert_text(1, "1").unwrap();
    let from_b = b.insert_text(1, "22").unwrap();
    let from_c = c.insert_text(1, "3").unwrap();
    let delete_b = b.delete_text(0, 1).unwrap();

    let text = assert_permutations_converge(vec![seed, from_a, from_b, from_c, delete_b]);
    assert_eq!(text, "1223c");
}

#[test]
fn concurrent_appends_converge() {
    let mut a = Doc::new(4);
    let mut b = Doc::new(2);
    let from_a = a.insert_text(0, "xy").unwrap();
    let from_b = b.insert_text(0, "pq").unwrap();
    let more_a = a.insert_text(2, "z").unwrap();

    let text = assert_permutations_converge(vec![from_a, from_b, more_a]);
    assert_eq!(text, "pqxyz");
}

#[test]
fn concurrent_inserts_inside_each_others_runs_converge() {
    let mut a = Doc::new(1);
    let seed = a.insert_text(0, "abcd").unwrap();
    let mut b = Doc::new(2);
    b.apply(&seed).unwrap();

    let from_a = a.insert_text(2, "X").unwrap();
    let from_b = b.insert_text(1, "Y").unwrap();
    let from_b_again = b.insert_text(4, "Z").unwrap();
    let delete_a = a.delete_text(3, 1).unwrap();

    let text = assert_permutations_converge(vec![seed, from_a, from_b, from_b_again, delete_a]);
    assert_eq!(text, "aYbXZd");
}

#[test]
fn replicas_converge_after_bidirectional_sync() {
    let mut a = Doc::new(1);
    let mut b = Doc::new(2);
    a.insert_text(0, "ABCDEF").unwrap();
    b.apply(&a.encode_state_as_update()).unwrap();

    a.delete_text(2, 2).unwrap();
    b.insert_text(2, "XY").unwrap();

    let to_b = a.encode_diff(b.state_vector());
    let to_a = b.encode_diff(a.state_vector());
    b.apply(&to_b).unwrap();
    a.apply(&to_a).unwrap();

    assert_eq!(a.content(), b.content());
    assert_eq!(a.snapshot(), b.snapshot());
    assert_eq!(a.content(), "ABXYEF");
    a.validate_invariants().unwrap();
    b.validate_invariants().unwrap();
}
