#[path = "common/mod.rs"]
mod common;

use std::sync::Arc;

use common::{apply, revert, spell, walk};
use kmervar::genomics::{
    merge_deviants, suffix_prefix_overlap, ClassifierConfig, ReferenceIndex, VariantClassifier,
    VariantRow, VariantType,
};
use proptest::prelude::*;

const K: usize = 6;
const BASES: [char; 4] = ['A', 'C', 'G', 'T'];

fn dna(len: std::ops::Range<usize>) -> impl Strategy<Value = String> {
    proptest::collection::vec(prop_oneof![Just('A'), Just('C'), Just('G'), Just('T')], len)
        .prop_map(|bases| bases.into_iter().collect())
}

/// A simple event to plant in a reference.
#[derive(Debug, Clone)]
enum Planted {
    /// Substitute the base by rotating it this many places through ACGT.
    Snp(usize),
    /// Delete this many bases.
    Del(usize),
    /// Insert these (lowercase) bases.
    Ins(String),
}

impl Planted {
    /// Reference bases replaced by the event.
    fn span(&self) -> usize {
        match self {
            Planted::Snp(_) => 1,
            Planted::Del(len) => *len,
            Planted::Ins(_) => 0,
        }
    }

    fn replacement(&self, reference_base: char) -> String {
        match self {
            Planted::Snp(shift) => {
                let at = BASES.iter().position(|&b| b == reference_base).unwrap_or(0);
                BASES[(at + shift) % 4].to_ascii_lowercase().to_string()
            }
            Planted::Del(_) => String::new(),
            Planted::Ins(bases) => bases.clone(),
        }
    }

    fn expected(&self) -> VariantType {
        match self {
            Planted::Snp(_) => VariantType::Snp,
            Planted::Del(_) => VariantType::Del,
            Planted::Ins(_) => VariantType::Ins,
        }
    }
}

fn planted() -> impl Strategy<Value = Planted> {
    prop_oneof![
        (1usize..4).prop_map(Planted::Snp),
        (1usize..8).prop_map(Planted::Del),
        dna(1..8).prop_map(|bases| Planted::Ins(bases.to_lowercase())),
    ]
}

proptest! {
    #[test]
    fn planted_variant_is_called_and_reverts_to_the_reference(
        reference in dna(40..90),
        event in planted(),
        offset in 0usize..1024,
    ) {
        let span = event.span();
        // post anchor must stay clear of the unindexed final window
        let last_site = reference.len() - K - 1 - span;
        let site = K + offset % (last_site - K + 1);

        let pre = &reference[site - K..site];
        let post = &reference[site + span..site + span + K];
        let index =
            Arc::new(ReferenceIndex::build("prop", reference.as_str(), K).expect("index builds"));
        prop_assume!(index.query(pre).len() == 1 && index.query(post).len() == 1);

        let inserted = event.replacement(reference.as_bytes()[site] as char);
        let alt = format!("{pre}{inserted}{post}");
        let row = VariantRow::new("planted", 1, walk(&alt, K), K).expect("valid chain");
        let classifier = VariantClassifier::new(ClassifierConfig::new(K).expect("valid k"), index)
            .expect("classifier builds");

        let calls = classifier.classify(&row).expect("classification succeeds");
        prop_assert_eq!(calls.len(), 1, "expected one call: {:?}", calls);
        let call = &calls[0];
        prop_assert_eq!(call.variant_type, event.expected());

        let haplotype = apply(&reference, call);
        prop_assert!(
            haplotype.contains(&spell(&row.kmer_chain)),
            "walk not spelled by {}",
            haplotype
        );
        prop_assert_eq!(revert(&haplotype, call), reference);
    }

    #[test]
    fn every_interval_spells_its_kmer(
        sequence in dna(2..96),
        k in 1usize..8,
    ) {
        prop_assume!(k < sequence.len());
        let index = ReferenceIndex::build("prop", sequence.as_str(), k).expect("index builds");

        for start in 0..sequence.len() - k {
            let kmer = &sequence[start..start + k];
            let intervals = index.query(kmer);
            prop_assert!(!intervals.is_empty(), "indexed window {} missing", start);

            let mut previous = 0;
            for interval in intervals {
                prop_assert_eq!(interval.width(), k);
                prop_assert_eq!(&sequence[interval.start - 1..interval.end], kmer);
                prop_assert_eq!(index.query_range(interval.start, interval.end).unwrap(), kmer);
                prop_assert!(interval.start > previous, "occurrences out of order");
                previous = interval.start;
            }
        }
    }

    #[test]
    fn merge_spells_the_interior_of_a_walk(
        sequence in dna(6..64),
        k in 2usize..6,
    ) {
        prop_assume!(sequence.len() >= k + 2);
        let chain: Vec<String> = (0..=sequence.len() - k)
            .map(|i| sequence[i..i + k].to_string())
            .collect();

        let merged = merge_deviants(&chain, k).expect("chain has deviants");
        prop_assert_eq!(merged.len(), k + chain.len() - 3);
        prop_assert_eq!(merged.as_str(), &sequence[1..sequence.len() - 1]);
    }

    #[test]
    fn overlap_is_a_shared_suffix_and_prefix(a in dna(0..12), b in dna(0..12)) {
        let overlap = suffix_prefix_overlap(&a, &b);
        prop_assert!(a.ends_with(overlap));
        prop_assert!(b.starts_with(overlap));
        for len in overlap.len() + 1..=a.len().min(b.len()) {
            prop_assert_ne!(&a[a.len() - len..], &b[..len]);
        }
    }
}

#[test]
fn merge_of_documented_chain() {
    let chain: Vec<String> = ["AAA", "AAB", "ABC", "BCD", "CDE", "DEF", "EFG", "FGG", "GGG"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(merge_deviants(&chain, 3).unwrap(), "AABCDEFGG");
}
