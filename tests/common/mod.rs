#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use kmervar::genomics::{ClassifiedVariant, VariantType};

/// 36 bp toy reference; the trailing `AAAA` keeps every scenario's post
/// anchor clear of the unindexed final window.
pub const TOY_REFERENCE: &str = "ATCGATATGGCGCGCATTTAGATTCGATCGGGAAAA";

/// `(id, comma-separated k-mer chain)` rows classified against
/// [`TOY_REFERENCE`] with k = 5.
pub const TOY_ROWS: [(&str, &str); 8] = [
    ("1", "ATCGA,TCGAt,CGAtA,GAtAT,AtATG,tATGG,ATGGC"),
    ("2", "CGCAT,GCATT,CATTA,ATTAG,TTAGA,TAGAT"),
    ("3", "TTTAG,TTAGT,TAGTC,AGTCG,GTCGG,TCGGG"),
    ("4", "TGGCG,GGCGa,GCGaC,CGaCG,GaCGC,aCGCA,CGCAT"),
    ("5", "CGCAT,GCATa,CATab,ATabc,TabcT,abcTT,bcTTA,cTTAG,TTAGA"),
    ("6", "CGATA,GATAt,ATAtg,TAtgG,AtgGC,tgGCG,gGCGC,GCGCG"),
    ("7", "CGATA,GATAt,ATAtG,TAtGC,AtGCG,tGCGC,GCGCG"),
    ("8", "CGATA,GATAt,ATAtg,TAtgG,AtgGG,tgGGC,gGGCG,GGCGC"),
];

pub fn chain(kmers: &str) -> Vec<String> {
    kmers.split(',').map(str::to_string).collect()
}

/// Every k-mer of `sequence`, in order.
pub fn walk(sequence: &str, k: usize) -> Vec<String> {
    (0..=sequence.len() - k)
        .map(|i| sequence[i..i + k].to_string())
        .collect()
}

/// Sequence spelled by an overlapping chain.
pub fn spell(kmers: &[String]) -> String {
    let mut spelled = kmers[0].clone();
    for kmer in &kmers[1..] {
        spelled.push_str(&kmer[kmer.len() - 1..]);
    }
    spelled
}

/// Variant table text with the default two header lines.
pub fn variant_table(rows: &[(&str, &str)]) -> String {
    let mut table = String::from("#id\tlabel\tcount\tname\tlength\tkmers\n#generated\n");
    for (i, (id, kmers)) in rows.iter().enumerate() {
        let fields: Vec<&str> = kmers.split(',').collect();
        table.push_str(&format!(
            "{id}\tvariant\t{}\tcluster\t{}\t{}\n",
            (i + 1) * 10,
            fields.len(),
            fields.join("\t")
        ));
    }
    table
}

/// Haplotype carried by a SNP, DEL or INS call.
pub fn apply(reference: &str, variant: &ClassifiedVariant) -> String {
    let (start, end) = (variant.start, variant.end);
    match variant.variant_type {
        VariantType::Snp => format!(
            "{}{}{}",
            &reference[..start - 1],
            variant.alt_allele,
            &reference[end..]
        ),
        VariantType::Del => format!("{}{}", &reference[..start - 1], &reference[end..]),
        VariantType::Ins => format!(
            "{}{}{}",
            &reference[..start],
            variant.alt_allele,
            &reference[end - 1..]
        ),
        other => panic!("no haplotype rule for {other}"),
    }
}

/// Undo [`apply`] by putting the reference allele back.
pub fn revert(haplotype: &str, variant: &ClassifiedVariant) -> String {
    let (start, end) = (variant.start, variant.end);
    match variant.variant_type {
        VariantType::Snp => format!(
            "{}{}{}",
            &haplotype[..start - 1],
            variant.ref_allele,
            &haplotype[end..]
        ),
        VariantType::Del => format!(
            "{}{}{}",
            &haplotype[..start - 1],
            variant.ref_allele,
            &haplotype[start - 1..]
        ),
        VariantType::Ins => format!(
            "{}{}",
            &haplotype[..start],
            &haplotype[start + variant.alt_allele.len()..]
        ),
        other => panic!("no haplotype rule for {other}"),
    }
}

/// Per-process scratch directory under the system temp dir.
pub fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("kmervar-{}-{}", test, std::process::id()));
    fs::create_dir_all(&dir).expect("create scratch directory");
    dir
}

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("snapshots")
}

pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var("KMERVAR_UPDATE_SNAPSHOTS").is_ok() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected =
        fs::read_to_string(&path).unwrap_or_else(|_| panic!("snapshot {:?} not found", path));
    if normalize(&expected) != normalize(actual) {
        panic!(
            "Snapshot mismatch for {:?}. Set KMERVAR_UPDATE_SNAPSHOTS=1 to regenerate.\nExpected:\n{}\nActual:\n{}",
            path,
            expected,
            actual
        );
    }
}

fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n")
}
