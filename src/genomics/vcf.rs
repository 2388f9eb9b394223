use std::fmt;
use std::io::{self, Write};

use anyhow::{anyhow, Result};

use super::ClassifiedVariant;

/// `##INFO` declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoHeader {
    /// Key used in record INFO columns.
    pub id: String,
    /// Value arity (`1`, `.`, ...).
    pub number: String,
    /// Value type (`String`, `Integer`, ...).
    pub kind: String,
    /// Free-text description.
    pub description: String,
}

/// Meta-information lines and column header of the output file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcfHeader {
    reference: Option<String>,
    contigs: Vec<(String, usize)>,
    info: Vec<InfoHeader>,
}

impl VcfHeader {
    /// Empty header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Header declaring the contig and the INFO fields written by
    /// [`VcfRecord`].
    pub fn for_classification(reference: &str, contig: &str, length: usize) -> Self {
        Self::new()
            .reference(reference)
            .contig(contig, length)
            .info("VARTYPE", "1", "String", "Variant type.")
            .info("END", "1", "Integer", "End position (closed interval)")
            .info("COUNT", "1", "Integer", "Number of occurrences.")
            .info(
                "KMERS",
                ".",
                "String",
                "List of deviant kmer sequences bookended by the prev/next anchor sequences",
            )
    }

    /// Record the reference name or path.
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Declare a contig and its length.
    pub fn contig(mut self, id: impl Into<String>, length: usize) -> Self {
        self.contigs.push((id.into(), length));
        self
    }

    /// Declare an INFO field.
    pub fn info(
        mut self,
        id: impl Into<String>,
        number: impl Into<String>,
        kind: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.info.push(InfoHeader {
            id: id.into(),
            number: number.into(),
            kind: kind.into(),
            description: description.into(),
        });
        self
    }

    /// Write the header lines.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write!(writer, "{self}")
    }
}

impl fmt::Display for VcfHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "##fileformat=VCFv4.3")?;
        if let Some(reference) = &self.reference {
            writeln!(f, "##reference={reference}")?;
        }
        for info in &self.info {
            writeln!(
                f,
                "##INFO=<ID={},Number={},Type={},Description=\"{}\">",
                info.id, info.number, info.kind, info.description
            )?;
        }
        for (id, length) in &self.contigs {
            writeln!(f, "##contig=<ID={id},length={length}>")?;
        }
        writeln!(f, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO")
    }
}

/// One data line. INFO keys keep insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcfRecord {
    /// Contig name.
    pub chrom: String,
    /// 1-based position.
    pub pos: usize,
    /// Record identifier.
    pub id: String,
    /// Reference allele.
    pub reference: String,
    /// Alternate allele.
    pub alternate: String,
    /// Quality column.
    pub qual: String,
    /// Filter column.
    pub filter: String,
    /// INFO key/value-list pairs.
    pub info: Vec<(String, Vec<String>)>,
}

impl VcfRecord {
    /// Record for a classified variant, carrying the walk's k-mers.
    pub fn from_variant(contig: &str, variant: &ClassifiedVariant, kmer_chain: &[String]) -> Self {
        Self {
            chrom: contig.to_string(),
            pos: variant.start,
            id: variant.source_id.clone(),
            reference: variant.ref_allele.clone(),
            alternate: variant.alt_allele.clone(),
            qual: ".".to_string(),
            filter: ".".to_string(),
            info: vec![
                ("VARTYPE".to_string(), vec![variant.variant_type.to_string()]),
                ("END".to_string(), vec![variant.end.to_string()]),
                ("COUNT".to_string(), vec![variant.count.to_string()]),
                ("KMERS".to_string(), kmer_chain.to_vec()),
            ],
        }
    }

    /// Values stored under INFO key `key`.
    pub fn info_values(&self, key: &str) -> Option<&[String]> {
        self.info
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, values)| values.as_slice())
    }

    /// Parse a tab-delimited data line (INFO as `K=v1,v2;K2=v`).
    pub fn parse(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.trim_end().split('\t').collect();
        if fields.len() < 8 {
            return Err(anyhow!("expected 8 VCF columns, found {}", fields.len()));
        }
        let pos = fields[1]
            .parse()
            .map_err(|_| anyhow!("invalid position '{}'", fields[1]))?;

        let mut info = Vec::new();
        for entry in fields[7].split(';').filter(|e| !e.is_empty() && *e != ".") {
            let (key, values) = entry
                .split_once('=')
                .ok_or_else(|| anyhow!("INFO entry '{entry}' has no value"))?;
            info.push((
                key.to_string(),
                values.split(',').map(str::to_string).collect(),
            ));
        }

        Ok(Self {
            chrom: fields[0].to_string(),
            pos,
            id: fields[2].to_string(),
            reference: fields[3].to_string(),
            alternate: fields[4].to_string(),
            qual: fields[5].to_string(),
            filter: fields[6].to_string(),
            info,
        })
    }

    /// Write the record as one line.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writeln!(writer, "{self}")
    }
}

impl fmt::Display for VcfRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t",
            self.chrom, self.pos, self.id, self.reference, self.alternate, self.qual, self.filter
        )?;
        for (i, (key, values)) in self.info.iter().enumerate() {
            if i > 0 {
                f.write_str(";")?;
            }
            write!(f, "{}={}", key, values.join(","))?;
        }
        Ok(())
    }
}

/// Write `header` followed by one record per `(variant, kmer_chain)`.
pub fn write_vcf<'a, W, I>(writer: &mut W, header: &VcfHeader, contig: &str, calls: I) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = (&'a ClassifiedVariant, &'a [String])>,
{
    header.write_to(writer)?;
    for (variant, kmers) in calls {
        VcfRecord::from_variant(contig, variant, kmers).write_to(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Render a complete VCF document into a string (tests and snapshots).
pub fn render_vcf<'a, I>(header: &VcfHeader, contig: &str, calls: I) -> Result<String>
where
    I: IntoIterator<Item = (&'a ClassifiedVariant, &'a [String])>,
{
    let mut buffer = Vec::new();
    write_vcf(&mut buffer, header, contig, calls)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered VCF is not valid UTF-8"))
}
