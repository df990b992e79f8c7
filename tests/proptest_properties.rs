use std::collections::HashSet;

use oxiblt::{Table, TableShape};
use proptest::prelude::*;

fn shape() -> TableShape {
    TableShape::new(120, 4, 2, 4)
}

fn table_with(records: &[[u8; 4]], deleted: &[[u8; 4]]) -> Table {
    let mut t = Table::new(shape()).unwrap();
    for r in records {
        t.insert(r).unwrap();
    }
    for r in deleted {
        t.delete(r).unwrap();
    }
    t
}

proptest! {
    #[test]
    fn prop_insert_then_delete_is_identity(
        base in proptest::collection::vec(any::<[u8; 4]>(), 0..40),
        extra in any::<[u8; 4]>(),
    ) {
        let before = table_with(&base, &[]);
        let mut after = before.clone();
        after.insert(&extra).unwrap();
        after.delete(&extra).unwrap();
        for i in 0..before.bucket_count() {
            match (before.bucket(i), after.bucket(i)) {
                (Some(a), Some(b)) => prop_assert_eq!(a, b),
                (None, Some(b)) => prop_assert!(b.is_empty()),
                (Some(_), None) => prop_assert!(false, "bucket {} disappeared", i),
                (None, None) => {}
            }
        }
    }

    #[test]
    fn prop_subtract_self_is_empty(
        records in proptest::collection::vec(any::<[u8; 4]>(), 0..200),
        deleted in proptest::collection::vec(any::<[u8; 4]>(), 0..20),
    ) {
        let mut t = table_with(&records, &deleted);
        let copy = t.clone();
        t.subtract(&copy).unwrap();
        prop_assert!(t.is_empty());
    }

    #[test]
    fn prop_serialize_roundtrip(
        records in proptest::collection::vec(any::<[u8; 4]>(), 0..200),
        deleted in proptest::collection::vec(any::<[u8; 4]>(), 0..50),
    ) {
        let t = table_with(&records, &deleted);
        let bytes = t.serialize().unwrap();
        let back = Table::deserialize(&bytes).unwrap();
        prop_assert_eq!(&back, &t);
        prop_assert_eq!(back.serialize().unwrap(), bytes);
    }

    #[test]
    fn prop_small_difference_decodes(
        ours in proptest::collection::hash_set(any::<[u8; 4]>(), 0..10),
        theirs in proptest::collection::hash_set(any::<[u8; 4]>(), 0..10),
        common in proptest::collection::vec(any::<[u8; 4]>(), 0..100),
    ) {
        let alpha: HashSet<[u8; 4]> = ours.difference(&theirs).copied().collect();
        let beta: HashSet<[u8; 4]> = theirs.difference(&ours).copied().collect();

        let mut a = Table::new(shape()).unwrap();
        let mut b = Table::new(shape()).unwrap();
        for r in ours.iter().chain(&common) {
            a.insert(r).unwrap();
        }
        for r in theirs.iter().chain(&common) {
            b.insert(r).unwrap();
        }
        a.subtract(&b).unwrap();
        let diff = a.decode().unwrap();

        let got_alpha: HashSet<[u8; 4]> =
            diff.alpha().iter().map(|r| r.as_slice().try_into().unwrap()).collect();
        let got_beta: HashSet<[u8; 4]> =
            diff.beta().iter().map(|r| r.as_slice().try_into().unwrap()).collect();
        prop_assert_eq!(got_alpha, alpha);
        prop_assert_eq!(got_beta, beta);
        prop_assert_eq!(diff.alpha_len() + diff.beta_len(), ours.symmetric_difference(&theirs).count());
    }
}
