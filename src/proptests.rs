use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::{BTreeMap, BTreeSet};

/// Checks the arena-level invariants that `insert` must preserve.
fn validate_trie(t: &Trie) {
    let nodes = &t.nodes.nodes;
    assert!(!nodes.is_empty(), "root slot must exist");
    assert_eq!(nodes[0].edge, None, "root has no incoming edge");

    let mut seen = vec![false; nodes.len()];
    seen[0] = true;
    let mut stack = vec![NodeIdx::ROOT];
    let mut ends = 0usize;

    while let Some(idx) = stack.pop() {
        let node = t.nodes.get(idx);
        if node.is_end_of_query {
            ends += 1;
        }

        assert!(
            node.button_ids.windows(2).all(|w| w[0] < w[1]),
            "button ids must be sorted and unique"
        );
        assert!(
            node.children.windows(2).all(|w| w[0].0 < w[1].0),
            "child edges must be sorted and unique"
        );

        if idx != NodeIdx::ROOT {
            assert!(!node.button_ids.is_empty(), "non-root node without ids");
            if node.children.is_empty() {
                assert!(node.is_end_of_query, "leaf must end a query");
            }
        }

        for &(ch, child) in &node.children {
            assert!(child.get() < nodes.len(), "child index out of bounds");
            assert!(!seen[child.get()], "node reachable twice");
            seen[child.get()] = true;

            let child_node = t.nodes.get(child);
            assert_eq!(child_node.edge, Some(ch), "edge label mismatch");
            if idx != NodeIdx::ROOT {
                for id in &child_node.button_ids {
                    assert!(
                        node.button_ids.binary_search(id).is_ok(),
                        "child id {id} missing from parent"
                    );
                }
            }
            stack.push(child);
        }
    }

    assert!(seen.iter().all(|&s| s), "unreachable node in arena");
    assert_eq!(ends, t.len(), "end-of-query count must match Trie::len");
}

/// Order-independent rendering of the trie: one entry per node in pre-order.
fn shape(t: &Trie) -> Vec<(String, Vec<ButtonId>, bool)> {
    let mut out = Vec::new();
    let mut stack = vec![(String::new(), t.root())];
    while let Some((path, node)) = stack.pop() {
        out.push((path.clone(), node.button_ids().to_vec(), node.is_end_of_query()));
        let children: Vec<_> = node.children().collect();
        for (ch, child) in children.into_iter().rev() {
            let mut next = path.clone();
            next.push(ch);
            stack.push((next, child));
        }
    }
    out
}

fn query_strategy() -> impl Strategy<Value = String> + Clone {
    // Small alphabet so queries share prefixes often.
    "[a-cA-C ]{0,6}"
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    Insert {
        #[proptest(strategy = "query_strategy()")]
        query: String,
        #[proptest(strategy = "1u32..=6")]
        id: ButtonId,
    },
    Lookup {
        #[proptest(strategy = "query_strategy()")]
        prefix: String,
    },
}

#[derive(Default)]
struct Model {
    queries: BTreeMap<String, BTreeSet<ButtonId>>,
}

impl Model {
    fn insert(&mut self, query: &str, id: ButtonId) {
        self.queries.entry(query.to_lowercase()).or_default().insert(id);
    }

    /// `None` if no query starts with `prefix`, otherwise the expected id set
    /// and end-of-query flag of the node.
    fn lookup(&self, prefix: &str) -> Option<(Vec<ButtonId>, bool)> {
        let key = prefix.to_lowercase();
        let end = self.queries.contains_key(&key);
        if key.is_empty() {
            let ids: Option<Vec<ButtonId>> =
                self.queries.get("").map(|s| s.iter().copied().collect());
            return Some((ids.unwrap_or_default(), end));
        }

        let mut ids = BTreeSet::new();
        let mut found = false;
        for (q, owners) in &self.queries {
            if q.starts_with(key.as_str()) {
                found = true;
                ids.extend(owners.iter().copied());
            }
        }
        found.then(|| (ids.into_iter().collect(), end))
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 10_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_matches_model(ops in prop::collection::vec(any::<Op>(), 0..=300)) {
        let mut t = Trie::new();
        let mut m = Model::default();

        for op in ops {
            match op {
                Op::Insert { query, id } => {
                    t.insert(&query, id);
                    m.insert(&query, id);
                }
                Op::Lookup { prefix } => {
                    let got = t
                        .lookup_prefix(&prefix)
                        .map(|n| (n.button_ids().to_vec(), n.is_end_of_query()));
                    prop_assert_eq!(got, m.lookup(&prefix));
                }
            }
        }

        validate_trie(&t);
        prop_assert_eq!(t.len(), m.queries.len());
        let got: Vec<String> = t.root().completions().map(|(q, _)| q).collect();
        let expected: Vec<String> = m.queries.keys().cloned().collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn prop_insert_order_independent(
        (pairs, shuffled) in prop::collection::vec((query_strategy(), 1u32..=6), 0..=40)
            .prop_flat_map(|pairs| {
                let shuffled = Just(pairs.clone()).prop_shuffle();
                (Just(pairs), shuffled)
            })
    ) {
        let mut a = Trie::new();
        for (q, id) in &pairs {
            a.insert(q, *id);
        }
        let mut b = Trie::new();
        for (q, id) in &shuffled {
            b.insert(q, *id);
        }

        validate_trie(&a);
        validate_trie(&b);
        prop_assert_eq!(a.node_count(), b.node_count());
        prop_assert_eq!(shape(&a), shape(&b));
    }

    #[test]
    fn prop_reinsert_is_noop(
        pairs in prop::collection::vec((query_strategy(), 1u32..=6), 0..=40)
    ) {
        let mut once = Trie::new();
        for (q, id) in &pairs {
            once.insert(q, *id);
        }
        let mut twice = once.clone();
        for (q, id) in &pairs {
            twice.insert(q, *id);
        }

        prop_assert_eq!(once.node_count(), twice.node_count());
        prop_assert_eq!(once.len(), twice.len());
        prop_assert_eq!(shape(&once), shape(&twice));
    }

    #[test]
    fn prop_every_prefix_resolves(
        pairs in prop::collection::vec((query_strategy(), 1u32..=6), 1..=30)
    ) {
        let mut t = Trie::new();
        for (q, id) in &pairs {
            t.insert(q, *id);
        }

        for (q, id) in &pairs {
            let chars: Vec<char> = q.chars().collect();
            for end in 1..=chars.len() {
                let prefix: String = chars[..end].iter().collect();
                let node = t.lookup_prefix(&prefix);
                prop_assert!(node.is_some(), "missing prefix {:?}", prefix);
                prop_assert!(node.is_some_and(|n| n.contains_button(*id)));
            }
            prop_assert!(t.contains_query(q));
        }
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let pairs: Vec<(&str, ButtonId)> = vec![
        ("late", 1),
        ("late", 2),
        ("Late delivery", 2),
        ("lat", 3),
        ("", 4),
        ("track", 1),
    ];

    let mut reference = Trie::new();
    for (q, id) in &pairs {
        reference.insert(q, *id);
    }
    let expected = shape(&reference);

    for_each_permutation(&pairs, |perm| {
        let mut t = Trie::new();
        for (q, id) in perm {
            t.insert(q, id);
        }
        validate_trie(&t);
        assert_eq!(shape(&t), expected);
    });
}

#[test]
fn bundled_catalog_is_valid() {
    let t = Catalog::bundled().build_index();
    validate_trie(&t);
}
