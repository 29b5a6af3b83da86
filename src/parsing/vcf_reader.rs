
use flate2::read::MultiGzDecoder;
use indexmap::IndexMap;
use std::io::{BufRead, BufReader};

use crate::data_types::variants::{GenotypeCall, VariantError, VariantRecord};

/// Minimum number of fixed columns on a data line (through INFO)
const MIN_COLUMN_COUNT: usize = 8;
/// Index of the first sample column when a FORMAT column is present
const FIRST_SAMPLE_COLUMN: usize = 9;

/// A recoverable, per-line decode failure; the offending line is skipped and reported
#[derive(thiserror::Error, Debug)]
pub enum MalformedRecord {
    #[error("line {line}: expected at least {expected} fields, found {found}")]
    TooFewFields { line: usize, expected: usize, found: usize },
    #[error("line {line}: position {value:?} is not a positive integer")]
    InvalidPosition { line: usize, value: String },
    #[error("line {line}: alternate allele list is empty")]
    EmptyAlternates { line: usize },
    #[error("line {line}: {source}")]
    InvalidRecord {
        line: usize,
        #[source]
        source: VariantError
    }
}

impl MalformedRecord {
    /// The 1-based line number the failure was observed on
    pub fn line(&self) -> usize {
        match self {
            MalformedRecord::TooFewFields { line, .. } |
            MalformedRecord::InvalidPosition { line, .. } |
            MalformedRecord::EmptyAlternates { line } |
            MalformedRecord::InvalidRecord { line, .. } => *line
        }
    }
}

/// A fatal, file-level decode failure
#[derive(thiserror::Error, Debug)]
pub enum VcfError {
    #[error("file is empty or contains no decodable variant records")]
    EmptyOrUnparsableFile,
    #[error("I/O error while decoding variant file")]
    Io(#[from] std::io::Error)
}

/// File-level metadata collected from the header section
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VcfMetadata {
    /// Declared format version from a "##fileformat=" line
    file_format: Option<String>,
    /// All other "##key=value" header pairs; last value wins on repeats
    header_fields: IndexMap<String, String>,
    /// Sample names from the column header line, in declared order
    sample_names: Vec<String>,
    /// The declared column count; data lines with fewer fields are malformed
    column_count: usize
}

impl VcfMetadata {
    /// Returns the index of a sample by name, if present
    /// # Arguments
    /// * `sample_name` - the sample name to search for
    pub fn sample_index(&self, sample_name: &str) -> Option<usize> {
        self.sample_names.iter().position(|s| s == sample_name)
    }

    // getters
    pub fn file_format(&self) -> Option<&str> {
        self.file_format.as_deref()
    }

    pub fn header_fields(&self) -> &IndexMap<String, String> {
        &self.header_fields
    }

    pub fn sample_names(&self) -> &[String] {
        &self.sample_names
    }

    pub fn column_count(&self) -> usize {
        self.column_count
    }
}

/// Streaming decoder for the tab-delimited variant file format.
/// Makes a single forward pass: the header section is consumed at construction,
/// and each call to `next()` decodes one data line, so peak memory stays bounded
/// regardless of file size.
pub struct VcfReader<R: BufRead> {
    /// The underlying line source
    reader: R,
    /// Header metadata, fully parsed at construction
    metadata: VcfMetadata,
    /// 1-based number of the last line read
    line_number: usize,
    /// A data line encountered while scanning the header, queued for the first `next()`
    pending_line: Option<(usize, String)>,
    /// An I/O failure observed mid-stream; iteration stops when this is set
    io_error: Option<std::io::Error>
}

impl<R: BufRead> VcfReader<R> {
    /// Creates a new reader, consuming the metadata and column header lines.
    /// # Arguments
    /// * `reader` - the line source; typically a slice or a gzip decoder
    /// # Errors
    /// * if reading from the source fails
    pub fn new(mut reader: R) -> Result<Self, VcfError> {
        let mut metadata = VcfMetadata {
            column_count: MIN_COLUMN_COUNT,
            ..Default::default()
        };
        let mut line_number = 0;
        let mut pending_line = None;

        let mut buffer = String::new();
        loop {
            buffer.clear();
            if reader.read_line(&mut buffer)? == 0 {
                break;
            }
            line_number += 1;

            let line = buffer.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                continue;
            }

            if let Some(meta_line) = line.strip_prefix("##") {
                match meta_line.split_once('=') {
                    Some(("fileformat", value)) => {
                        metadata.file_format = Some(value.to_string());
                    },
                    Some((key, value)) => {
                        metadata.header_fields.insert(key.to_string(), value.to_string());
                    },
                    None => {
                        metadata.header_fields.insert(meta_line.to_string(), String::new());
                    }
                }
            } else if line.starts_with('#') {
                // column header line; declares the field count and any sample columns
                let columns: Vec<&str> = line.split('\t').collect();
                metadata.column_count = columns.len().max(MIN_COLUMN_COUNT);
                if columns.len() > FIRST_SAMPLE_COLUMN {
                    metadata.sample_names = columns[FIRST_SAMPLE_COLUMN..].iter()
                        .map(|s| s.to_string())
                        .collect();
                }
                break;
            } else {
                // headerless file; treat this as the first data line
                pending_line = Some((line_number, line.to_string()));
                break;
            }
        }

        Ok(Self {
            reader, metadata, line_number, pending_line,
            io_error: None
        })
    }

    /// Surfaces an I/O failure that interrupted iteration, if any
    pub fn take_io_error(&mut self) -> Option<std::io::Error> {
        self.io_error.take()
    }

    // getters
    pub fn metadata(&self) -> &VcfMetadata {
        &self.metadata
    }

    /// Pulls the next non-blank data line, or None at end of input
    fn next_data_line(&mut self) -> std::io::Result<Option<(usize, String)>> {
        if let Some(pending) = self.pending_line.take() {
            return Ok(Some(pending));
        }

        let mut buffer = String::new();
        loop {
            buffer.clear();
            if self.reader.read_line(&mut buffer)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = buffer.trim_end_matches(['\r', '\n']);
            // stray header lines after the data started are ignored rather than malformed
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            return Ok(Some((self.line_number, line.to_string())));
        }
    }
}

impl<R: BufRead> Iterator for VcfReader<R> {
    type Item = Result<VariantRecord, MalformedRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.io_error.is_some() {
            return None;
        }

        let (line_number, line) = match self.next_data_line() {
            Ok(Some(pair)) => pair,
            Ok(None) => return None,
            Err(e) => {
                self.io_error = Some(e);
                return None;
            }
        };

        Some(parse_data_line(line_number, &line, self.metadata.column_count))
    }
}

/// Decodes one tab-delimited data line into a record.
/// # Arguments
/// * `line_number` - the 1-based line number, for error reporting
/// * `line` - the data line with the terminator already stripped
/// * `column_count` - the declared column count from the header
fn parse_data_line(line_number: usize, line: &str, column_count: usize) -> Result<VariantRecord, MalformedRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < column_count {
        return Err(MalformedRecord::TooFewFields {
            line: line_number,
            expected: column_count,
            found: fields.len()
        });
    }

    let position: u64 = match fields[1].parse() {
        Ok(p) if p > 0 => p,
        _ => {
            return Err(MalformedRecord::InvalidPosition {
                line: line_number,
                value: fields[1].to_string()
            });
        }
    };

    let identifier = match fields[2] {
        "" | "." => None,
        id => Some(id.to_string())
    };

    if fields[4].is_empty() || fields[4] == "." {
        return Err(MalformedRecord::EmptyAlternates { line: line_number });
    }
    let alternates: Vec<String> = fields[4].split(',').map(|s| s.to_string()).collect();

    // an unparsable quality is tolerated as absent rather than failing the line
    let quality: Option<f64> = match fields[5] {
        "" | "." => None,
        q => q.parse().ok()
    };

    let info = parse_info_field(fields[7]);

    let genotypes = if fields.len() > FIRST_SAMPLE_COLUMN {
        let n_alleles = alternates.len() + 1;
        let gt_position = fields[FIRST_SAMPLE_COLUMN - 1].split(':').position(|key| key == "GT");
        fields[FIRST_SAMPLE_COLUMN..].iter()
            .map(|sample_field| {
                gt_position.and_then(|gt_index| {
                    let raw_call = sample_field.split(':').nth(gt_index)?;
                    parse_genotype(raw_call, n_alleles)
                })
            })
            .collect()
    } else {
        vec![]
    };

    VariantRecord::new(
        fields[0].to_string(), position, identifier,
        fields[3].to_string(), alternates, quality,
        fields[6].to_string(), info, genotypes
    ).map_err(|source| MalformedRecord::InvalidRecord { line: line_number, source })
}

/// Parses the semicolon-delimited INFO field into an ordered key/value map
/// # Arguments
/// * `raw` - the raw INFO field
fn parse_info_field(raw: &str) -> IndexMap<String, String> {
    let mut info = IndexMap::new();
    if raw == "." || raw.is_empty() {
        return info;
    }

    for token in raw.split(';') {
        match token.split_once('=') {
            Some((key, value)) => {
                info.insert(key.to_string(), value.to_string());
            },
            None => {
                // flag-style annotation without a value
                info.insert(token.to_string(), String::new());
            }
        }
    }
    info
}

/// Parses a raw GT token into a call.
/// Returns None for missing ('.'), haploid, partially missing, or out-of-range calls;
/// absence of a call is preserved as distinct from homozygous reference.
/// # Arguments
/// * `raw` - the raw GT token, e.g. "0/1" or "1|0"
/// * `n_alleles` - the number of alleles on the record, REF included
fn parse_genotype(raw: &str, n_alleles: usize) -> Option<GenotypeCall> {
    let phased = raw.contains('|');
    let mut indices = raw.split(['/', '|']);

    let allele0: usize = indices.next()?.parse().ok()?;
    let allele1: usize = indices.next()?.parse().ok()?;
    if indices.next().is_some() {
        // more than two alleles called; not a diploid call we can use
        return None;
    }
    if allele0 >= n_alleles || allele1 >= n_alleles {
        return None;
    }

    Some(GenotypeCall::new(allele0, allele1, phased))
}

/// A fully decoded variant file: everything from one streaming pass
#[derive(Debug)]
pub struct DecodedVariantFile {
    /// The header metadata
    pub metadata: VcfMetadata,
    /// All successfully decoded records, in file order
    pub records: Vec<VariantRecord>,
    /// All per-line failures, in file order
    pub errors: Vec<MalformedRecord>
}

/// Wraps raw bytes in a buffered line source, transparently decompressing gzip.
/// # Arguments
/// * `content` - the raw file content
fn byte_reader(content: &[u8]) -> Box<dyn BufRead + '_> {
    if content.starts_with(&[0x1f, 0x8b]) {
        Box::new(BufReader::new(MultiGzDecoder::new(content)))
    } else {
        Box::new(content)
    }
}

/// Decodes a complete variant file from raw bytes, collecting records and per-line errors.
/// # Arguments
/// * `content` - the raw file content, plain text or gzipped
/// # Errors
/// * if the content yields zero decodable records
/// * if an I/O failure (e.g. a truncated gzip stream) interrupts decoding
pub fn decode_variant_file(content: &[u8]) -> Result<DecodedVariantFile, VcfError> {
    let mut reader = VcfReader::new(byte_reader(content))?;

    let mut records = vec![];
    let mut errors = vec![];
    for result in reader.by_ref() {
        match result {
            Ok(record) => records.push(record),
            Err(e) => errors.push(e)
        }
    }
    if let Some(io_error) = reader.take_io_error() {
        return Err(VcfError::Io(io_error));
    }

    if records.is_empty() {
        return Err(VcfError::EmptyOrUnparsableFile);
    }

    Ok(DecodedVariantFile {
        metadata: reader.metadata,
        records, errors
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BASIC_FILE: &str = "\
##fileformat=VCFv4.2
##source=unit-test
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tPATIENT1
chr22\t42126611\trs3892097\tC\tT\t48.0\tPASS\tGENE=CYP2D6\tGT:DP\t1/1:30
chr10\t94781859\trs4244285\tG\tA\t.\tPASS\t.\tGT:DP\t0|1:22
chr1\t12345\t.\tA\tC,G\t10.5\tq10\tAF=0.5;DB\tGT:DP\t1/2:15
";

    #[test]
    fn test_basic_decoding() {
        let decoded = decode_variant_file(BASIC_FILE.as_bytes()).unwrap();
        assert_eq!(decoded.metadata.file_format(), Some("VCFv4.2"));
        assert_eq!(decoded.metadata.header_fields().get("source").unwrap(), "unit-test");
        assert_eq!(decoded.metadata.sample_names(), &["PATIENT1".to_string()]);
        assert_eq!(decoded.records.len(), 3);
        assert!(decoded.errors.is_empty());

        let first = &decoded.records[0];
        assert_eq!(first.identifier(), Some("rs3892097"));
        assert_eq!(first.quality(), Some(48.0));
        assert_eq!(first.sample_call(0), Some(GenotypeCall::new(1, 1, false)));

        let second = &decoded.records[1];
        assert_eq!(second.quality(), None);
        assert_eq!(second.sample_call(0), Some(GenotypeCall::new(0, 1, true)));

        let third = &decoded.records[2];
        assert_eq!(third.identifier(), None);
        assert_eq!(third.alternates(), &["C".to_string(), "G".to_string()]);
        assert_eq!(third.info().get("AF").unwrap(), "0.5");
        assert_eq!(third.info().get("DB").unwrap(), "");
        assert_eq!(third.sample_call(0), Some(GenotypeCall::new(1, 2, false)));
    }

    #[test]
    fn test_malformed_lines_are_skipped_not_fatal() {
        let content = "\
##fileformat=VCFv4.2
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tPATIENT1
chr22\t42126611\trs3892097\tC\tT\t48.0\tPASS\t.\tGT\t0/1
chr22\tnotanumber\trs1\tC\tT\t.\tPASS\t.\tGT\t0/1
chr22\t0\trs2\tC\tT\t.\tPASS\t.\tGT\t0/1
chr22\t100\trs3\tC\t.\t.\tPASS\t.\tGT\t0/1
short\tline
chr10\t94781859\trs4244285\tG\tA\t.\tPASS\t.\tGT\t1/1
";
        let decoded = decode_variant_file(content.as_bytes()).unwrap();
        assert_eq!(decoded.records.len(), 2);
        assert_eq!(decoded.errors.len(), 4);

        // valid records keep their file order
        assert_eq!(decoded.records[0].identifier(), Some("rs3892097"));
        assert_eq!(decoded.records[1].identifier(), Some("rs4244285"));

        // errors carry the 1-based line numbers of the offending lines
        assert!(matches!(decoded.errors[0], MalformedRecord::InvalidPosition { line: 4, .. }));
        assert!(matches!(decoded.errors[1], MalformedRecord::InvalidPosition { line: 5, .. }));
        assert!(matches!(decoded.errors[2], MalformedRecord::EmptyAlternates { line: 6 }));
        assert!(matches!(decoded.errors[3], MalformedRecord::TooFewFields { line: 7, expected: 10, found: 2 }));
    }

    #[test]
    fn test_empty_inputs_are_fatal() {
        assert!(matches!(decode_variant_file(b""), Err(VcfError::EmptyOrUnparsableFile)));

        let header_only = "##fileformat=VCFv4.2\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
        assert!(matches!(decode_variant_file(header_only.as_bytes()), Err(VcfError::EmptyOrUnparsableFile)));

        let all_malformed = "\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO
chr1\tbad\t.\tA\tC\t.\tPASS\t.
chr1\t0\t.\tA\tC\t.\tPASS\t.
";
        assert!(matches!(decode_variant_file(all_malformed.as_bytes()), Err(VcfError::EmptyOrUnparsableFile)));
    }

    #[test]
    fn test_missing_genotypes_preserved() {
        let content = "\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tPATIENT1\tPATIENT2
chr22\t100\t.\tC\tT\t.\tPASS\t.\tGT\t./.\t0/0
chr22\t200\t.\tC\tT\t.\tPASS\t.\tGT\t5/1\t0/1
";
        let decoded = decode_variant_file(content.as_bytes()).unwrap();
        let first = &decoded.records[0];
        // missing is not the same as homozygous reference
        assert_eq!(first.sample_call(0), None);
        assert_eq!(first.sample_call(1), Some(GenotypeCall::new(0, 0, false)));

        // out-of-range index degrades to a missing call, the record survives
        let second = &decoded.records[1];
        assert_eq!(second.sample_call(0), None);
        assert_eq!(second.sample_call(1), Some(GenotypeCall::new(0, 1, false)));
    }

    #[test]
    fn test_headerless_file_still_decodes() {
        let content = "chr22\t42126611\trs3892097\tC\tT\t.\tPASS\t.\n";
        let decoded = decode_variant_file(content.as_bytes()).unwrap();
        assert_eq!(decoded.records.len(), 1);
        assert!(decoded.metadata.sample_names().is_empty());
        assert_eq!(decoded.metadata.file_format(), None);
    }

    #[test]
    fn test_gzip_input() {
        let mut encoder = flate2::write::GzEncoder::new(vec![], flate2::Compression::default());
        encoder.write_all(BASIC_FILE.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        let decoded = decode_variant_file(&compressed).unwrap();
        assert_eq!(decoded.records.len(), 3);
        assert_eq!(decoded.metadata.file_format(), Some("VCFv4.2"));
    }

    #[test]
    fn test_streaming_iteration() {
        let mut reader = VcfReader::new(BASIC_FILE.as_bytes()).unwrap();
        assert_eq!(reader.metadata().sample_names().len(), 1);

        // records come back one at a time, in file order
        let first = reader.next().unwrap().unwrap();
        assert_eq!(first.position(), 42126611);
        let remaining: Vec<_> = reader.collect();
        assert_eq!(remaining.len(), 2);
    }
}
