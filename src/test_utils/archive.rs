//! Chart archive fixtures.

use flate2::Compression;
use flate2::write::GzEncoder;

/// Build a gzip'd tarball containing `<name>/<path>` for every file.
///
/// # Panics
///
/// Panics if the in-memory archive cannot be written.
pub fn chart_archive(name: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{name}/{path}"), content.as_bytes())
            .expect("append archive entry");
    }
    builder.into_inner().and_then(|encoder| encoder.finish()).expect("finish archive")
}
