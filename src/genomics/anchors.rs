use crate::genomics::{AnchorPair, WindowedReference};

/// Enumerate every placement of a walk whose post-anchor lies strictly
/// after its pre-anchor.
///
/// Pairs come out pre-occurrence major, post-occurrence minor. An empty
/// result means the walk does not anchor and yields no variants.
pub fn resolve_anchors(pre: &str, post: &str, windows: &WindowedReference) -> Vec<AnchorPair> {
    let pre_hits = windows.query(pre);
    let post_hits = windows.query(post);

    let mut pairs = Vec::with_capacity(pre_hits.len() * post_hits.len());
    for &pre in pre_hits {
        for &post in post_hits {
            if post.start > pre.end {
                pairs.push(AnchorPair { pre, post });
            }
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::Interval;

    #[test]
    fn unique_anchors_give_one_pair() {
        let windows = WindowedReference::build("c", "ATCGATATGGCGCA", 5).unwrap();
        let pairs = resolve_anchors("ATCGA", "ATGGC", &windows);
        assert_eq!(
            pairs,
            vec![AnchorPair {
                pre: Interval::new(1, 5),
                post: Interval::new(7, 11),
            }]
        );
    }

    #[test]
    fn repeated_anchors_fan_out_in_order() {
        // ACG at 1 and 7, TTT at 4 and 10
        let windows = WindowedReference::build("c", "ACGTTTACGTTTG", 3).unwrap();
        let pairs = resolve_anchors("ACG", "TTT", &windows);
        let starts: Vec<(usize, usize)> = pairs
            .iter()
            .map(|p| (p.pre.start, p.post.start))
            .collect();
        assert_eq!(starts, vec![(1, 4), (1, 10), (7, 10)]);
    }

    #[test]
    fn post_anchor_before_pre_anchor_is_dropped() {
        let windows = WindowedReference::build("c", "TTTACGA", 3).unwrap();
        assert!(resolve_anchors("ACG", "TTT", &windows).is_empty());
    }

    #[test]
    fn overlapping_anchors_are_dropped() {
        let windows = WindowedReference::build("c", "ACGTAA", 3).unwrap();
        // ACG at 1-3, GTA at 3-5
        assert!(resolve_anchors("ACG", "GTA", &windows).is_empty());
    }

    #[test]
    fn missing_anchor_gives_nothing() {
        let windows = WindowedReference::build("c", "ACGTAA", 3).unwrap();
        assert!(resolve_anchors("ACG", "CCC", &windows).is_empty());
    }
}
