//! Sparse, symmetric in-memory contact matrix.
//!
//! Pixels are stored per chromosome as a CSR matrix holding both triangles, so a
//! window read is a binary search per row. Only intra-chromosomal contacts are
//! kept.

use std::io::BufRead;
use std::ops::Range;
use std::path::Path;

use fxhash::FxHashMap as HashMap;
use log::{debug, warn};
use ndarray::Array2;
use sprs::{CsMat, TriMat};

use stripes_core::{Chromosome, MatrixSource, StripeError};

use crate::error::{ContactMapError, Result};
use crate::reader::get_dynamic_reader;

///
/// Layout of a pixel dump in the `cooler dump --join` style:
/// `chrom1 start1 end1 chrom2 start2 end2 count [balanced ...]`.
///
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PixelFormat {
    /// Bin size; taken from `end1 - start1` of the first pixel when unset.
    pub resolution: Option<u32>,
    /// 0-based column holding the contact value; the last column when unset.
    pub value_column: Option<usize>,
}

const MIN_PIXEL_FIELDS: usize = 7;

pub struct ContactMapBuilder {
    resolution: u32,
    chromosomes: Vec<Chromosome>,
    triplets: HashMap<String, TriMat<f64>>,
}

impl ContactMapBuilder {
    pub fn new(resolution: u32, chromosomes: Vec<Chromosome>) -> Self {
        let triplets = chromosomes
            .iter()
            .map(|chrom| {
                let n = chrom.n_bins(resolution);
                (chrom.name.clone(), TriMat::new((n, n)))
            })
            .collect();

        ContactMapBuilder {
            resolution,
            chromosomes,
            triplets,
        }
    }

    ///
    /// Add one contact. The mirrored pixel is added as well; repeated pixels are
    /// summed. Zero, negative and non-finite values are ignored.
    ///
    pub fn add_pixel(&mut self, chrom: &str, bin1: usize, bin2: usize, value: f64) -> Result<()> {
        let tri = self
            .triplets
            .get_mut(chrom)
            .ok_or_else(|| ContactMapError::UnknownChromosome(chrom.to_string()))?;

        let n_bins = tri.rows();
        for bin in [bin1, bin2] {
            if bin >= n_bins {
                return Err(ContactMapError::BinOutOfRange {
                    chrom: chrom.to_string(),
                    bin,
                    n_bins,
                });
            }
        }

        if !value.is_finite() || value <= 0.0 {
            return Ok(());
        }

        tri.add_triplet(bin1, bin2, value);
        if bin1 != bin2 {
            tri.add_triplet(bin2, bin1, value);
        }

        Ok(())
    }

    ///
    /// Add a whole dense matrix for one chromosome. Only the upper triangle is
    /// read; the lower one is mirrored from it.
    ///
    pub fn add_dense(&mut self, chrom: &str, matrix: &Array2<f64>) -> Result<()> {
        let (rows, cols) = matrix.dim();
        if rows != cols {
            return Err(ContactMapError::NotSquare(rows, cols));
        }
        for i in 0..rows {
            for j in i..cols {
                self.add_pixel(chrom, i, j, matrix[[i, j]])?;
            }
        }
        Ok(())
    }

    pub fn build(self) -> ContactMap {
        let matrices = self
            .triplets
            .into_iter()
            .map(|(name, tri)| (name, tri.to_csr::<usize>()))
            .collect();

        ContactMap {
            resolution: self.resolution,
            chromosomes: self.chromosomes,
            matrices,
        }
    }
}

///
/// Contact matrix of a whole genome, one sparse symmetric matrix per chromosome.
///
pub struct ContactMap {
    resolution: u32,
    chromosomes: Vec<Chromosome>,
    matrices: HashMap<String, CsMat<f64>>,
}

impl ContactMap {
    pub fn builder(resolution: u32, chromosomes: Vec<Chromosome>) -> ContactMapBuilder {
        ContactMapBuilder::new(resolution, chromosomes)
    }

    ///
    /// Contact map with a single chromosome of `n x resolution` bp built from a
    /// dense square matrix.
    ///
    pub fn from_dense(chrom: &str, resolution: u32, matrix: &Array2<f64>) -> Result<Self> {
        if resolution == 0 {
            return Err(ContactMapError::InvalidResolution);
        }
        let length = matrix.nrows() as u64 * resolution as u64;
        let mut builder = ContactMapBuilder::new(resolution, vec![Chromosome::new(chrom, length)]);
        builder.add_dense(chrom, matrix)?;
        Ok(builder.build())
    }

    ///
    /// Load a contact map from a pixel dump.
    ///
    /// # Arguments
    /// - path: pixel file, optionally gzipped
    /// - chromosomes: chromosome sizes, in matrix order
    /// - format: resolution and value column overrides
    pub fn from_pixels<P: AsRef<Path>>(
        path: P,
        chromosomes: Vec<Chromosome>,
        format: &PixelFormat,
    ) -> Result<Self> {
        let reader = get_dynamic_reader(path.as_ref())?;

        let mut builder: Option<ContactMapBuilder> = None;
        let mut n_trans: usize = 0;
        let mut n_unknown: usize = 0;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_num = idx + 1;
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            let start1 = fields.get(1).and_then(|s| s.parse::<u64>().ok());
            if builder.is_none() && start1.is_none() {
                // header line
                continue;
            }
            if fields.len() < MIN_PIXEL_FIELDS {
                return Err(ContactMapError::Parse {
                    line: line_num,
                    reason: format!(
                        "expected at least {} fields, found {}",
                        MIN_PIXEL_FIELDS,
                        fields.len()
                    ),
                });
            }

            let start1 = parse_field::<u64>(&fields, 1, line_num)?;
            let end1 = parse_field::<u64>(&fields, 2, line_num)?;
            let start2 = parse_field::<u64>(&fields, 4, line_num)?;

            let value_column = format.value_column.unwrap_or(fields.len() - 1);
            let raw_value = fields
                .get(value_column)
                .ok_or(ContactMapError::InvalidValueColumn(value_column))?;
            // balanced dumps write NaN or nothing for masked bins
            let value = raw_value.parse::<f64>().unwrap_or(f64::NAN);

            if builder.is_none() {
                let resolution = match format.resolution {
                    Some(resolution) => resolution,
                    None => end1.saturating_sub(start1) as u32,
                };
                if resolution == 0 {
                    return Err(ContactMapError::InvalidResolution);
                }
                builder = Some(ContactMapBuilder::new(resolution, chromosomes.clone()));
            }
            let Some(builder) = builder.as_mut() else {
                continue;
            };

            let (chrom1, chrom2) = (fields[0], fields[3]);
            if chrom1 != chrom2 {
                n_trans += 1;
                continue;
            }
            if !builder.triplets.contains_key(chrom1) {
                n_unknown += 1;
                continue;
            }

            let resolution = builder.resolution as u64;
            builder.add_pixel(
                chrom1,
                (start1 / resolution) as usize,
                (start2 / resolution) as usize,
                value,
            )?;
        }

        if n_trans > 0 {
            debug!("Skipped {} inter-chromosomal pixels", n_trans);
        }
        if n_unknown > 0 {
            warn!(
                "Skipped {} pixels on chromosomes missing from the chrom sizes",
                n_unknown
            );
        }

        match builder {
            Some(builder) => Ok(builder.build()),
            None => match format.resolution {
                Some(resolution) if resolution > 0 => {
                    Ok(ContactMapBuilder::new(resolution, chromosomes).build())
                }
                _ => Err(ContactMapError::InvalidResolution),
            },
        }
    }

    /// Number of stored pixels (both triangles) of a chromosome.
    pub fn nnz(&self, chrom: &str) -> Option<usize> {
        self.matrices.get(chrom).map(|mat| mat.nnz())
    }
}

fn parse_field<T: std::str::FromStr>(fields: &[&str], idx: usize, line: usize) -> Result<T> {
    fields
        .get(idx)
        .and_then(|s| s.parse::<T>().ok())
        .ok_or_else(|| ContactMapError::Parse {
            line,
            reason: format!("invalid value in column {}", idx + 1),
        })
}

impl MatrixSource for ContactMap {
    fn resolution(&self) -> u32 {
        self.resolution
    }

    fn chromosomes(&self) -> Vec<Chromosome> {
        self.chromosomes.clone()
    }

    fn fetch(
        &self,
        chrom: &str,
        rows: Range<usize>,
        cols: Range<usize>,
    ) -> stripes_core::Result<Array2<f64>> {
        let mat = self
            .matrices
            .get(chrom)
            .ok_or_else(|| StripeError::MissingChromosome(chrom.to_string()))?;

        let n_bins = mat.rows();
        if rows.start > rows.end || cols.start > cols.end || rows.end > n_bins || cols.end > n_bins
        {
            return Err(StripeError::OutOfBounds {
                chrom: chrom.to_string(),
                rows,
                cols,
                n_bins,
            });
        }

        let mut window = Array2::<f64>::zeros((rows.len(), cols.len()));
        for (i, row) in rows.clone().enumerate() {
            let Some(view) = mat.outer_view(row) else {
                continue;
            };
            let indices = view.indices();
            let data = view.data();
            let lo = indices.partition_point(|&c| c < cols.start);
            let hi = indices.partition_point(|&c| c < cols.end);
            for k in lo..hi {
                window[[i, indices[k] - cols.start]] = data[k];
            }
        }

        Ok(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use pretty_assertions::assert_eq;
    use rstest::*;

    #[fixture]
    fn chromosomes() -> Vec<Chromosome> {
        vec![
            Chromosome::new("chr1", 1_000_000),
            Chromosome::new("chr2", 600_000),
        ]
    }

    fn pixel_lines() -> Vec<&'static str> {
        vec![
            "chrom1\tstart1\tend1\tchrom2\tstart2\tend2\tcount\tbalanced",
            "chr1\t0\t10000\tchr1\t0\t10000\t10\t0.5",
            "chr1\t0\t10000\tchr1\t20000\t30000\t4\t0.2",
            "chr1\t0\t10000\tchr2\t20000\t30000\t7\t0.1",
            "chr2\t50000\t60000\tchr2\t70000\t80000\t3\tnan",
            "chr2\t50000\t60000\tchr2\t50000\t60000\t9\t0.9",
        ]
    }

    #[rstest]
    fn test_from_pixels_reads_balanced_column(chromosomes: Vec<Chromosome>) {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("pixels.tsv");
        std::fs::write(&path, pixel_lines().join("\n")).unwrap();

        let map = ContactMap::from_pixels(&path, chromosomes, &PixelFormat::default()).unwrap();

        assert_eq!(map.resolution(), 10_000);
        // diagonal once, off-diagonal mirrored, trans and NaN skipped
        assert_eq!(map.nnz("chr1"), Some(3));
        assert_eq!(map.nnz("chr2"), Some(1));

        let window = map.fetch("chr1", 0..3, 0..3).unwrap();
        assert_eq!(window[[0, 0]], 0.5);
        assert_eq!(window[[0, 2]], 0.2);
        assert_eq!(window[[2, 0]], 0.2);
        assert_eq!(window[[1, 1]], 0.0);
    }

    #[rstest]
    fn test_from_pixels_gz_with_count_column(chromosomes: Vec<Chromosome>) {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("pixels.tsv.gz");
        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        for line in pixel_lines() {
            writeln!(encoder, "{}", line).unwrap();
        }
        encoder.finish().unwrap();

        let format = PixelFormat {
            resolution: None,
            value_column: Some(6),
        };
        let map = ContactMap::from_pixels(&path, chromosomes, &format).unwrap();

        let window = map.fetch("chr2", 5..8, 5..8).unwrap();
        assert_eq!(window[[0, 0]], 9.0);
        assert_eq!(window[[0, 2]], 3.0);
        assert_eq!(window[[2, 0]], 3.0);
    }

    #[rstest]
    fn test_from_dense_is_symmetric() {
        let matrix =
            Array2::from_shape_fn((4, 4), |(i, j)| if i <= j { (i + j) as f64 } else { 0.0 });
        let map = ContactMap::from_dense("chr1", 1000, &matrix).unwrap();

        let (full, resolution) = map.get("chr1").unwrap();
        assert_eq!(resolution, 1000);
        assert_eq!(full, full.t());
        assert_eq!(full[[3, 1]], 4.0);
    }

    #[rstest]
    fn test_fetch_offset_window() {
        let matrix =
            Array2::from_shape_fn((6, 6), |(i, j)| (10 * i.min(j) + i.max(j)) as f64 + 1.0);
        let map = ContactMap::from_dense("chr1", 1000, &matrix).unwrap();

        let window = map.fetch("chr1", 1..3, 3..6).unwrap();
        assert_eq!(window.dim(), (2, 3));
        assert_eq!(window[[0, 0]], matrix[[1, 3]]);
        assert_eq!(window[[1, 2]], matrix[[2, 5]]);
    }

    #[rstest]
    fn test_fetch_out_of_bounds() {
        let matrix = Array2::<f64>::ones((4, 4));
        let map = ContactMap::from_dense("chr1", 1000, &matrix).unwrap();

        assert!(matches!(
            map.fetch("chr1", 0..5, 0..2),
            Err(StripeError::OutOfBounds { .. })
        ));
        assert!(matches!(
            map.fetch("chrX", 0..1, 0..1),
            Err(StripeError::MissingChromosome(_))
        ));
    }

    #[rstest]
    fn test_add_pixel_out_of_range(chromosomes: Vec<Chromosome>) {
        let mut builder = ContactMap::builder(10_000, chromosomes);
        let result = builder.add_pixel("chr2", 0, 60, 1.0);
        assert!(matches!(result, Err(ContactMapError::BinOutOfRange { .. })));
        let result = builder.add_pixel("chr3", 0, 1, 1.0);
        assert!(matches!(result, Err(ContactMapError::UnknownChromosome(_))));
    }
}
