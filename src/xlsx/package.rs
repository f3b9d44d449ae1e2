use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Raw OOXML package: every zip entry kept as-is so untouched parts round-trip byte for byte.
pub struct XlsxPackage {
    pub entries: Vec<XlsxEntry>,
}

pub struct XlsxEntry {
    pub name: String,
    pub data: Vec<u8>,
    pub compression: CompressionMethod,
    pub last_modified: zip::DateTime,
    pub unix_mode: Option<u32>,
    pub is_dir: bool,
}

impl XlsxPackage {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let f = File::open(path).with_context(|| format!("open xlsx: {}", path.display()))?;
        Self::from_reader(f)
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> anyhow::Result<Self> {
        let mut zip = ZipArchive::new(reader).context("read zip")?;
        let mut entries = Vec::new();
        for i in 0..zip.len() {
            let mut file = zip.by_index(i).context("zip entry")?;
            let mut data = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut data).context("read zip entry")?;
            entries.push(XlsxEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                last_modified: file.last_modified().unwrap_or_default(),
                unix_mode: file.unix_mode(),
                is_dir: file.is_dir(),
            });
        }
        Ok(Self { entries })
    }

    pub fn entry(&self, name: &str) -> Option<&XlsxEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn write_to<W: Write + Seek>(
        &self,
        writer: W,
        replacements: &HashMap<String, Vec<u8>>,
    ) -> anyhow::Result<W> {
        let mut zout = ZipWriter::new(writer);
        for ent in &self.entries {
            let data = replacements.get(&ent.name).unwrap_or(&ent.data);
            let mut opts = SimpleFileOptions::default()
                .compression_method(ent.compression)
                .last_modified_time(ent.last_modified);
            if let Some(mode) = ent.unix_mode {
                opts = opts.unix_permissions(mode);
            }
            if ent.is_dir || ent.name.ends_with('/') {
                zout.add_directory(ent.name.as_str(), opts)
                    .with_context(|| format!("add zip dir: {}", ent.name))?;
            } else {
                zout.start_file(ent.name.as_str(), opts)
                    .with_context(|| format!("start zip file: {}", ent.name))?;
                zout.write_all(data)
                    .with_context(|| format!("write zip file: {}", ent.name))?;
            }
        }
        zout.finish().context("finish zip")
    }

    /// Write next to `output_path` first and rename over it, so a failed run never leaves a
    /// truncated workbook behind.
    pub fn write_with_replacements(
        &self,
        output_path: &Path,
        replacements: &HashMap<String, Vec<u8>>,
    ) -> anyhow::Result<()> {
        if let Some(dir) = output_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create output dir: {}", dir.display()))?;
        }
        let tmp = partial_path(output_path);
        let result = File::create(&tmp)
            .with_context(|| format!("create output xlsx: {}", tmp.display()))
            .and_then(|f| self.write_to(f, replacements))
            .and_then(|f| f.sync_all().context("flush output xlsx"))
            .and_then(|_| {
                std::fs::rename(&tmp, output_path)
                    .with_context(|| format!("move output into place: {}", output_path.display()))
            });
        if result.is_err() {
            let _ = std::fs::remove_file(&tmp);
        }
        result
    }
}

fn partial_path(output_path: &Path) -> PathBuf {
    let name = output_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.xlsx".to_string());
    output_path.with_file_name(format!(".{name}.partial"))
}
