//! End-to-end scenarios exercising a full container lifecycle rather than
//! one operation at a time.

use flatcore::bvh::{BoundVolume, Bvh};
use flatcore::{BiMap, CollectionError, Dictionary, Set};

#[test]
fn dictionary_basic_lifecycle() {
    let mut d: Dictionary<String, i32> = Dictionary::new();
    assert!(d.insert("alice".to_string(), 30).unwrap());
    assert!(d.insert("bob".to_string(), 25).unwrap());
    assert!(!d.insert("alice".to_string(), 99).unwrap());

    assert_eq!(d.get(&"alice".to_string()), Some(&30));
    assert_eq!(d.remove(&"bob".to_string()), Some(25));
    assert_eq!(d.get(&"bob".to_string()), None);
    assert_eq!(d.get_required(&"missing".to_string()), Err(CollectionError::KeyNotFound));
}

#[test]
fn dictionary_survives_many_resizes_without_losing_entries() {
    let mut d: Dictionary<i32, i32> = Dictionary::with_capacity(8);
    for i in 0..5000 {
        assert!(d.insert(i, i * 3).unwrap());
    }
    assert_eq!(d.len(), 5000);
    for i in 0..5000 {
        assert_eq!(d.get(&i), Some(&(i * 3)));
    }
    // Delete a broad swath, then reinsert: exercises tombstone reuse across
    // multiple resize boundaries.
    for i in (0..5000).step_by(2) {
        d.remove(&i);
    }
    for i in (0..5000).step_by(2) {
        assert!(d.insert(i, i).unwrap());
    }
    assert_eq!(d.len(), 5000);
}

#[test]
fn set_survives_heavy_growth_with_or_without_a_rehash() {
    let capacity = 64usize;
    let mut s: Set<i64> = Set::with_capacity(capacity);
    for i in 0..500i64 {
        s.insert(i * capacity as i64).unwrap();
    }
    for i in 0..500i64 {
        assert!(s.contains(&(i * capacity as i64)));
    }
    assert_eq!(s.len(), 500);
}

#[test]
fn bimap_rejects_a_conflicting_reverse_mapping() {
    let mut m: BiMap<String, u32> = BiMap::new();
    m.insert("alice".to_string(), 1).unwrap();
    let err = m.insert("mallory".to_string(), 1).unwrap_err();
    assert_eq!(err, CollectionError::DuplicateValue);
    assert_eq!(m.get_by_right(&1), Some(&"alice".to_string()));

    m.remove_by_left(&"alice".to_string());
    assert!(m.insert("mallory".to_string(), 1).is_ok());
    assert_eq!(m.get_by_right(&1), Some(&"mallory".to_string()));
}

#[test]
fn bvh_query_finds_overlapping_volumes_among_many() {
    let tree: Bvh<u32> = Bvh::new();
    for i in 0..1000u32 {
        let f = i as f32;
        tree.insert(
            i,
            BoundVolume::new([f, 0.0, 0.0], [f + 0.5, 1.0, 1.0]),
        )
        .unwrap();
    }

    let mut hits = Vec::new();
    tree.query(
        &BoundVolume::new([100.0, 0.0, 0.0], [102.0, 1.0, 1.0]),
        &mut hits,
    );
    hits.sort();
    // Leaf 102 spans [102, 102.5] and touches the query's max at x=102;
    // intersects is inclusive of touching boundaries, so it is included.
    assert_eq!(hits, vec![100, 101, 102]);
}

#[test]
fn bvh_update_propagates_to_the_root_and_changes_query_results() {
    let tree: Bvh<&'static str> = Bvh::new();
    tree.insert("a", BoundVolume::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]))
        .unwrap();
    tree.insert("b", BoundVolume::new([5.0, 5.0, 5.0], [6.0, 6.0, 6.0]))
        .unwrap();
    tree.insert("c", BoundVolume::new([10.0, 10.0, 10.0], [11.0, 11.0, 11.0]))
        .unwrap();

    let original_root = tree.root_bounds().unwrap();

    tree.update_bounds(&"a", BoundVolume::new([-50.0, -50.0, -50.0], [-49.0, -49.0, -49.0]));
    let updated_root = tree.root_bounds().unwrap();
    assert!(updated_root.min[0] < original_root.min[0]);

    let mut hits = Vec::new();
    tree.query(
        &BoundVolume::new([-50.0, -50.0, -50.0], [-49.0, -49.0, -49.0]),
        &mut hits,
    );
    assert_eq!(hits, vec!["a"]);

    let mut stale = Vec::new();
    tree.query(&BoundVolume::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]), &mut stale);
    assert!(stale.is_empty());

    tree.check_subtree_size_integrity().unwrap();
}

#[test]
fn bvh_remove_then_reinsert_keeps_the_index_consistent() {
    let tree: Bvh<u32> = Bvh::new();
    for i in 0..30u32 {
        let f = i as f32;
        tree.insert(i, BoundVolume::new([f, f, f], [f + 1.0, f + 1.0, f + 1.0]))
            .unwrap();
    }
    for i in (0..30u32).step_by(2) {
        assert!(tree.remove(&i));
    }
    assert_eq!(tree.leaf_count(), 15);
    for i in (0..30u32).step_by(2) {
        let f = i as f32;
        assert!(tree
            .insert(i, BoundVolume::new([f, f, f], [f + 1.0, f + 1.0, f + 1.0]))
            .unwrap());
    }
    assert_eq!(tree.leaf_count(), 30);
    tree.check_subtree_size_integrity().unwrap();
}
