use std::io::BufRead;
use std::path::Path;

use stripes_core::Chromosome;

use crate::error::{ContactMapError, Result};
use crate::reader::get_dynamic_reader;

///
/// Read a chrom sizes file (`name<TAB>length` per line) keeping file order.
/// Empty lines and lines starting with `#` are ignored.
///
pub fn read_chrom_sizes<P: AsRef<Path>>(path: P) -> Result<Vec<Chromosome>> {
    let reader = get_dynamic_reader(path.as_ref())?;
    let mut chromosomes: Vec<Chromosome> = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = line.split_whitespace();
        let name = fields.next().ok_or_else(|| ContactMapError::Parse {
            line: idx + 1,
            reason: "missing chromosome name".to_string(),
        })?;
        let length = fields
            .next()
            .and_then(|s| s.parse::<u64>().ok())
            .ok_or_else(|| ContactMapError::Parse {
                line: idx + 1,
                reason: format!("missing or invalid length for {}", name),
            })?;

        chromosomes.push(Chromosome::new(name, length));
    }

    Ok(chromosomes)
}
