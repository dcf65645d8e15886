//! Identity-based sequence synchronization
//!
//! Brings a live sequence (`left`) in line with a new sequence of
//! definitions (`right`):
//! - left items with no match are destroyed
//! - right items with no match get a new object, created in right order
//! - matched pairs update the existing left object in place
//!
//! Pairing is computed before any side effect. Each right item takes the
//! first unmatched left item satisfying the predicate, so a reorder moves
//! objects instead of recreating them. Side effects then run in one
//! left-to-right pass over `right`; an unmatched left item is destroyed just
//! before the first right item that follows it in the old order.

use tracing::trace;

/// Side effects of a synchronization
pub trait SyncHandler<L, R: ?Sized> {
    type Error;

    /// `left` has no counterpart in the new sequence
    fn left_only(&mut self, left: L) -> Result<(), Self::Error>;

    /// `right` is new; return the object to insert, or `None` to skip it
    fn right_only(&mut self, right: &R, index: usize) -> Result<Option<L>, Self::Error>;

    /// `left` survives and corresponds to `right`
    fn common(&mut self, left: &mut L, right: &R, index: usize) -> Result<(), Self::Error>;
}

/// Counts of side effects performed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub destroyed: usize,
}

impl SyncStats {
    /// Nothing was created or destroyed
    pub fn is_stable(&self) -> bool {
        self.created == 0 && self.destroyed == 0
    }

    pub fn merge(&mut self, other: SyncStats) {
        self.created += other.created;
        self.updated += other.updated;
        self.destroyed += other.destroyed;
    }
}

/// Pair each right item with the first unmatched left item
fn pair<L, R: ?Sized, F>(left: &[L], right: &[&R], matches: &F) -> Vec<Option<usize>>
where
    F: Fn(&L, &R) -> bool,
{
    let mut taken = vec![false; left.len()];
    right
        .iter()
        .map(|r| {
            let found = left
                .iter()
                .enumerate()
                .position(|(i, l)| !taken[i] && matches(l, *r));
            if let Some(i) = found {
                taken[i] = true;
            }
            found
        })
        .collect()
}

/// Synchronize `left` against `right`.
///
/// On success `left` holds exactly one object per kept right item, in right
/// order. If a handler call fails, `left` keeps the objects produced so far
/// followed by the untouched remainder of the old sequence, and the error is
/// returned.
pub fn synchronize<L, R, F, H>(
    left: &mut Vec<L>,
    right: &[&R],
    matches: F,
    handler: &mut H,
) -> Result<SyncStats, H::Error>
where
    R: ?Sized,
    F: Fn(&L, &R) -> bool,
    H: SyncHandler<L, R>,
{
    let pairing = pair(left, right, &matches);
    let mut matched = vec![false; left.len()];
    for i in pairing.iter().flatten() {
        matched[*i] = true;
    }

    let mut old: Vec<Option<L>> = std::mem::take(left).into_iter().map(Some).collect();
    let mut stats = SyncStats::default();
    let mut next_unvisited = 0usize;

    let result = (|| -> Result<(), H::Error> {
        for (index, r) in right.iter().enumerate() {
            match pairing[index] {
                Some(li) => {
                    // Destroy stale items that precede this one in the old order
                    while next_unvisited < li {
                        if !matched[next_unvisited] {
                            if let Some(stale) = old[next_unvisited].take() {
                                trace!(index = next_unvisited, "sync: destroy");
                                handler.left_only(stale)?;
                                stats.destroyed += 1;
                            }
                        }
                        next_unvisited += 1;
                    }
                    if let Some(mut item) = old[li].take() {
                        trace!(from = li, to = index, "sync: update");
                        let updated = handler.common(&mut item, *r, index);
                        next_unvisited = next_unvisited.max(li + 1);
                        left.push(item);
                        updated?;
                        stats.updated += 1;
                    }
                }
                None => {
                    trace!(index, "sync: create");
                    if let Some(item) = handler.right_only(*r, index)? {
                        left.push(item);
                        stats.created += 1;
                    }
                }
            }
        }
        for i in next_unvisited..old.len() {
            if !matched[i] {
                if let Some(stale) = old[i].take() {
                    trace!(index = i, "sync: destroy");
                    handler.left_only(stale)?;
                    stats.destroyed += 1;
                }
            }
        }
        Ok(())
    })();

    match result {
        Ok(()) => Ok(stats),
        Err(err) => {
            left.extend(old.into_iter().flatten());
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Obj {
        key: &'static str,
        serial: usize,
        updates: usize,
    }

    #[derive(Default)]
    struct Recorder {
        next_serial: usize,
        log: Vec<String>,
        fail_on: Option<&'static str>,
    }

    impl SyncHandler<Obj, str> for Recorder {
        type Error = String;

        fn left_only(&mut self, left: Obj) -> Result<(), String> {
            self.log.push(format!("destroy {}", left.key));
            Ok(())
        }

        fn right_only(&mut self, right: &str, _index: usize) -> Result<Option<Obj>, String> {
            if self.fail_on == Some(right) {
                return Err(format!("cannot create {}", right));
            }
            self.log.push(format!("create {}", right));
            self.next_serial += 1;
            let key: &'static str = Box::leak(right.to_string().into_boxed_str());
            Ok(Some(Obj {
                key,
                serial: self.next_serial + 100,
                updates: 0,
            }))
        }

        fn common(&mut self, left: &mut Obj, right: &str, _index: usize) -> Result<(), String> {
            if self.fail_on == Some(right) {
                return Err(format!("cannot update {}", right));
            }
            self.log.push(format!("update {}", right));
            left.updates += 1;
            Ok(())
        }
    }

    fn objs(keys: &[&'static str]) -> Vec<Obj> {
        keys.iter()
            .enumerate()
            .map(|(serial, key)| Obj {
                key,
                serial,
                updates: 0,
            })
            .collect()
    }

    fn run(left: &mut Vec<Obj>, right: &[&str], handler: &mut Recorder) -> SyncStats {
        synchronize(left, right, |l: &Obj, r: &str| l.key == r, handler).unwrap()
    }

    #[test]
    fn test_unchanged_sequence_is_stable() {
        let mut left = objs(&["a", "b", "c"]);
        let mut handler = Recorder::default();
        let stats = run(&mut left, &["a", "b", "c"], &mut handler);
        assert!(stats.is_stable());
        assert_eq!(stats.updated, 3);
        assert_eq!(left.iter().map(|o| o.serial).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_reorder_keeps_objects() {
        let mut left = objs(&["a", "b", "c"]);
        let mut handler = Recorder::default();
        let stats = run(&mut left, &["c", "a", "b"], &mut handler);
        assert!(stats.is_stable());
        let keys: Vec<_> = left.iter().map(|o| (o.key, o.serial)).collect();
        assert_eq!(keys, vec![("c", 2), ("a", 0), ("b", 1)]);
    }

    #[test]
    fn test_mixed_add_remove_single_pass() {
        let mut left = objs(&["a", "x", "b", "y"]);
        let mut handler = Recorder::default();
        let stats = run(&mut left, &["a", "n", "b"], &mut handler);
        assert_eq!(
            stats,
            SyncStats {
                created: 1,
                updated: 2,
                destroyed: 2
            }
        );
        assert_eq!(
            handler.log,
            vec!["update a", "create n", "destroy x", "update b", "destroy y"]
        );
        assert_eq!(left.iter().map(|o| o.key).collect::<Vec<_>>(), vec!["a", "n", "b"]);
    }

    #[test]
    fn test_duplicates_pair_in_order() {
        let mut left = objs(&["a", "a"]);
        let mut handler = Recorder::default();
        let stats = run(&mut left, &["a", "a", "a"], &mut handler);
        assert_eq!(stats.created, 1);
        assert_eq!(left.iter().map(|o| o.serial).collect::<Vec<_>>(), vec![0, 1, 101]);
    }

    #[test]
    fn test_right_only_may_skip() {
        struct Skipper;
        impl SyncHandler<Obj, str> for Skipper {
            type Error = ();
            fn left_only(&mut self, _: Obj) -> Result<(), ()> {
                Ok(())
            }
            fn right_only(&mut self, _: &str, _: usize) -> Result<Option<Obj>, ()> {
                Ok(None)
            }
            fn common(&mut self, _: &mut Obj, _: &str, _: usize) -> Result<(), ()> {
                Ok(())
            }
        }
        let mut left = objs(&["a"]);
        let stats = synchronize(&mut left, &["a", "b"], |l: &Obj, r: &str| l.key == r, &mut Skipper)
            .unwrap();
        assert_eq!(stats.created, 0);
        assert_eq!(left.len(), 1);
    }

    #[test]
    fn test_error_keeps_remaining_objects() {
        let mut left = objs(&["a", "b"]);
        let mut handler = Recorder {
            fail_on: Some("n"),
            ..Recorder::default()
        };
        let err = synchronize(&mut left, &["a", "n", "b"], |l: &Obj, r: &str| l.key == r, &mut handler)
            .unwrap_err();
        assert_eq!(err, "cannot create n");
        assert_eq!(left.iter().map(|o| o.key).collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_failed_update_keeps_object() {
        let mut left = objs(&["a", "b", "c"]);
        let mut handler = Recorder {
            fail_on: Some("b"),
            ..Recorder::default()
        };
        let err = synchronize(&mut left, &["a", "b", "c"], |l: &Obj, r: &str| l.key == r, &mut handler)
            .unwrap_err();
        assert_eq!(err, "cannot update b");
        let kept: Vec<_> = left.iter().map(|o| (o.key, o.serial)).collect();
        assert_eq!(kept, vec![("a", 0), ("b", 1), ("c", 2)]);
    }
}
