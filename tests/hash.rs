// ABOUTME: Integration tests for package content hashing.
// ABOUTME: files_hash ignores entry order and metadata; package_hash tracks raw bytes.

use edgeship::package::{files_hash, package_hash};
use flate2::Compression;
use flate2::write::GzEncoder;
use proptest::prelude::*;
use std::path::Path;

/// Write a tar.gz holding `entries` in the given order with the given mtime.
fn write_archive(path: &Path, entries: &[(String, Vec<u8>)], mtime: u64) {
    let file = std::fs::File::create(path).unwrap();
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(mtime);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("pkg/{name}"), data.as_slice())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap();
}

fn sample() -> Vec<(String, Vec<u8>)> {
    vec![
        ("fastly.toml".to_string(), b"name = \"edge\"\n".to_vec()),
        ("bin/main.wasm".to_string(), vec![0, 0x61, 0x73, 0x6d, 1, 0, 0, 0]),
        ("src/main.rs".to_string(), b"fn main() {}\n".to_vec()),
    ]
}

#[test]
fn files_hash_ignores_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.tar.gz");
    let b = dir.path().join("b.tar.gz");
    write_archive(&a, &sample(), 0);
    write_archive(&b, &sample(), 1_700_000_000);

    assert_eq!(files_hash(&a).unwrap(), files_hash(&b).unwrap());
    assert_ne!(package_hash(&a).unwrap(), package_hash(&b).unwrap());
}

#[test]
fn files_hash_changes_with_content() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.tar.gz");
    let b = dir.path().join("b.tar.gz");
    let mut changed = sample();
    changed[2].1 = b"fn main() { edge() }\n".to_vec();
    write_archive(&a, &sample(), 0);
    write_archive(&b, &changed, 0);

    assert_ne!(files_hash(&a).unwrap(), files_hash(&b).unwrap());
}

#[test]
fn hashes_are_hex_sha512() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a.tar.gz");
    write_archive(&path, &sample(), 0);

    let hash = package_hash(&path).unwrap();
    assert_eq!(hash.len(), 128);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn missing_archive_is_an_error() {
    assert!(files_hash(Path::new("/nonexistent/pkg.tar.gz")).is_err());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn files_hash_is_order_independent(
        files in prop::collection::btree_map("[a-z]{1,8}", prop::collection::vec(any::<u8>(), 0..64), 1..6),
        rotate in 0usize..6,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let ordered: Vec<(String, Vec<u8>)> = files.into_iter().collect();
        let mut permuted = ordered.clone();
        permuted.rotate_left(rotate % ordered.len());
        permuted.reverse();

        let a = dir.path().join("a.tar.gz");
        let b = dir.path().join("b.tar.gz");
        write_archive(&a, &ordered, 0);
        write_archive(&b, &permuted, 0);

        prop_assert_eq!(files_hash(&a).unwrap(), files_hash(&b).unwrap());
    }
}

#[test]
fn oversized_entry_header_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.tar.gz");
    let mut header = tar::Header::new_gnu();
    header.set_path("pkg/bin/main.wasm").unwrap();
    header.set_size(1 << 45);
    header.set_mode(0o644);
    header.set_cksum();
    let mut encoder = GzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::default());
    std::io::Write::write_all(&mut encoder, header.as_bytes()).unwrap();
    std::io::Write::write_all(&mut encoder, &[0u8; 512]).unwrap();
    encoder.finish().unwrap();

    let err = files_hash(&path).unwrap_err();

    assert!(err.to_string().contains("failed to read package"));
}
