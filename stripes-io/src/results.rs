use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;

use stripes_core::{ResultRow, ResultTable};

pub trait ResultWrite {
    ///
    /// Write the table to disk as a tab separated file with a header line.
    /// Paths ending in `.gz` are gzipped.
    ///
    /// # Arguments
    /// - path: the path to the file to dump to
    fn write_tsv<T: AsRef<Path>>(&self, path: T) -> std::io::Result<()>;

    ///
    /// Write the table to disk as a gzipped tab separated file
    ///
    /// # Arguments
    /// - path: the path to the file to dump to
    fn write_tsv_gz<T: AsRef<Path>>(&self, path: T) -> std::io::Result<()>;
}

fn write_rows<W: Write>(table: &ResultTable, writer: &mut W) -> std::io::Result<()> {
    writeln!(writer, "{}", ResultRow::HEADER.join("\t"))?;
    for row in table.iter() {
        writeln!(writer, "{}", row.as_string())?;
    }
    Ok(())
}

impl ResultWrite for ResultTable {
    fn write_tsv<T: AsRef<Path>>(&self, path: T) -> std::io::Result<()> {
        let path = path.as_ref();
        if path.extension().is_some_and(|ext| ext == "gz") {
            return self.write_tsv_gz(path);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        write_rows(self, &mut writer)?;
        writer.flush()
    }

    fn write_tsv_gz<T: AsRef<Path>>(&self, path: T) -> std::io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::best());
        write_rows(self, &mut encoder)?;

        encoder.finish()?;
        Ok(())
    }
}
