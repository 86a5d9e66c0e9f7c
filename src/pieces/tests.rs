use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha1::{Digest, Sha1};
use tempfile::TempDir;
use tokio::io::{AsyncRead, ReadBuf};

use super::*;
use crate::error::TorrentError;
use crate::manifest::{FileManifest, ManifestBuilder, ManifestEntry};

// ============================================================================
// Test content source
// ============================================================================

/// Serves file content from memory and counts open readers.
#[derive(Clone, Default)]
struct MemorySource {
    files: HashMap<PathBuf, Bytes>,
    /// Fail reads of this file once this many bytes have been returned.
    fail: Option<(PathBuf, usize)>,
    /// Reads of this file never complete.
    stall: Option<PathBuf>,
    /// Randomly return `Pending` to shuffle reader completion order.
    jitter: bool,
    open: Arc<AtomicUsize>,
    opened: Arc<AtomicUsize>,
    /// Reads that returned data.
    reads: Arc<AtomicUsize>,
}

impl MemorySource {
    fn open_handles(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    fn opened_total(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    fn reads_total(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

struct MemoryReader {
    data: Bytes,
    pos: usize,
    fail_at: Option<usize>,
    stall: bool,
    rng: Option<StdRng>,
    open: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
}

impl AsyncRead for MemoryReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.stall {
            return Poll::Pending;
        }
        if let Some(rng) = self.rng.as_mut() {
            if rng.random_bool(0.5) {
                cx.waker().wake_by_ref();
                return Poll::Pending;
            }
        }
        if self.fail_at.is_some_and(|at| self.pos >= at) {
            return Poll::Ready(Err(io::Error::other("injected read failure")));
        }

        let mut end = self.data.len().min(self.pos + buf.remaining());
        if let Some(at) = self.fail_at {
            end = end.min(at.max(self.pos));
        }
        let start = self.pos;
        buf.put_slice(&self.data[start..end]);
        self.pos = end;
        if end > start {
            self.reads.fetch_add(1, Ordering::SeqCst);
        }
        Poll::Ready(Ok(()))
    }
}

impl Drop for MemoryReader {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ContentSource for MemorySource {
    type Reader = MemoryReader;

    async fn open(&self, entry: &ManifestEntry) -> io::Result<MemoryReader> {
        let path = entry.absolute_path();
        let data = self
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))?;

        self.open.fetch_add(1, Ordering::SeqCst);
        self.opened.fetch_add(1, Ordering::SeqCst);
        let seed = self.opened.load(Ordering::SeqCst) as u64;

        Ok(MemoryReader {
            data,
            pos: 0,
            fail_at: self
                .fail
                .as_ref()
                .filter(|(p, _)| p == path)
                .map(|(_, at)| *at),
            stall: self.stall.as_deref() == Some(path),
            rng: self.jitter.then(|| StdRng::seed_from_u64(seed)),
            open: Arc::clone(&self.open),
            reads: Arc::clone(&self.reads),
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn memory_fixture(files: &[(&str, Vec<u8>)]) -> (FileManifest, MemorySource) {
    let mut builder = ManifestBuilder::new("/mem");
    let mut source = MemorySource::default();
    for (name, data) in files {
        let path = Path::new("/mem").join(name);
        builder.add_file(&path, data.len() as i64).unwrap();
        source.files.insert(path, Bytes::from(data.clone()));
    }
    (builder.finalize().unwrap(), source)
}

fn concatenated(manifest: &FileManifest, source: &MemorySource) -> Vec<u8> {
    manifest
        .entries()
        .iter()
        .flat_map(|e| source.files[e.absolute_path()].iter().copied())
        .collect()
}

fn reference_hashes(data: &[u8], piece_length: u64) -> Vec<[u8; 20]> {
    data.chunks(piece_length as usize)
        .map(|chunk| Sha1::digest(chunk).into())
        .collect()
}

fn patterned(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

fn sha1(data: &[u8]) -> [u8; 20] {
    Sha1::digest(data).into()
}

// ============================================================================
// Piece length selection
// ============================================================================

#[test]
fn test_select_zero_total_size() {
    assert_eq!(select_piece_length(0), PieceLength::MIN);
    assert_eq!(select_piece_length(0).get(), 16 * 1024);
}

#[test]
fn test_select_small_totals_stay_at_minimum() {
    assert_eq!(select_piece_length(1).get(), 16384);
    // Exactly 1000 pieces does not trigger doubling.
    assert_eq!(select_piece_length(16384 * 1000).get(), 16384);
    assert_eq!(select_piece_length(16384 * 1001).get(), 32768);
}

#[test]
fn test_select_bounds_piece_count() {
    assert_eq!(select_piece_length(1 << 30).get(), 2 * 1024 * 1024);

    for total in [1u64 << 20, 700 << 20, 5 << 30, 15 << 30] {
        let length = select_piece_length(total);
        assert!(length.get().is_power_of_two());
        assert!(total / length.get() <= 1000);
    }
}

#[test]
fn test_select_caps_at_maximum() {
    assert_eq!(select_piece_length(1 << 50), PieceLength::MAX);
    assert_eq!(select_piece_length(u64::MAX).get(), 16 * 1024 * 1024);
}

#[test]
fn test_piece_length_validation() {
    assert!(PieceLength::new(16384).is_ok());
    assert!(PieceLength::new(1 << 24).is_ok());
    assert!(matches!(PieceLength::new(0), Err(TorrentError::PieceLength(0))));
    assert!(PieceLength::new(8192).is_err());
    assert!(PieceLength::new(1 << 25).is_err());
    assert!(PieceLength::new(16384 + 1).is_err());
}

#[test]
fn test_piece_count_and_size() {
    let length = PieceLength::new(16384).unwrap();
    assert_eq!(length.piece_count(0), 0);
    assert_eq!(length.piece_count(1), 1);
    assert_eq!(length.piece_count(16384), 1);
    assert_eq!(length.piece_count(16385), 2);

    assert_eq!(length.piece_size(0, 16385), 16384);
    assert_eq!(length.piece_size(1, 16385), 1);
    assert_eq!(length.piece_size(1, 32768), 16384);
    assert_eq!(length.piece_size(2, 32768), 0);
}

// ============================================================================
// Digest stage
// ============================================================================

#[test]
fn test_digester_slicing_does_not_matter() {
    let data = patterned(1000, 7);
    let length = PieceLength::new_unchecked(64);
    let expected = reference_hashes(&data, 64);

    for slice in [1, 3, 63, 64, 65, 1000] {
        let mut digester = PieceDigester::new(length);
        for part in data.chunks(slice) {
            digester.update(part);
        }
        assert_eq!(digester.completed(), 15);
        assert_eq!(digester.finish(), PieceHashList::new(expected.clone()));
    }
}

#[test]
fn test_digester_exact_multiple_has_no_empty_tail() {
    let data = patterned(128, 1);
    let mut digester = PieceDigester::new(PieceLength::new_unchecked(64));
    digester.update(&data);
    let hashes = digester.finish();

    assert_eq!(hashes.len(), 2);
    assert_eq!(hashes[1], sha1(&data[64..]));
}

#[test]
fn test_hash_list_concatenated() {
    let list = PieceHashList::new(vec![[1u8; 20], [2u8; 20]]);
    let bytes = list.concatenated();
    assert_eq!(bytes.len(), 40);
    assert_eq!(&bytes[..20], &[1u8; 20]);
    assert_eq!(&bytes[20..], &[2u8; 20]);
}

// ============================================================================
// Pipeline
// ============================================================================

#[tokio::test]
async fn test_cross_file_boundary() {
    let (manifest, source) = memory_fixture(&[("A", vec![0x00; 10]), ("B", vec![0x01; 10])]);
    let hasher = PieceHasher::with_source(source, HasherOptions::default().chunk_size(3));

    let pieces = hasher
        .hash(&manifest, PieceLength::new_unchecked(16))
        .await
        .unwrap();

    let mut first = vec![0x00u8; 10];
    first.extend_from_slice(&[0x01; 6]);
    assert_eq!(pieces.len(), 2);
    assert_eq!(pieces[0], sha1(&first));
    assert_eq!(pieces[1], sha1(&[0x01; 4]));
}

#[tokio::test]
async fn test_piece_accounting() {
    let length = 64u64;
    for total in [1usize, 63, 64, 65, 127, 128, 129, 1000] {
        let (manifest, source) = memory_fixture(&[
            ("a", patterned(total / 2, 1)),
            ("b", patterned(total - total / 2, 2)),
        ]);
        let data = concatenated(&manifest, &source);
        let hasher = PieceHasher::with_source(source, HasherOptions::default().chunk_size(10));

        let pieces = hasher
            .hash(&manifest, PieceLength::new_unchecked(length))
            .await
            .unwrap();

        assert_eq!(pieces.len(), (total as u64).div_ceil(length) as usize);
        let tail = match total as u64 % length {
            0 => length as usize,
            rem => rem as usize,
        };
        assert_eq!(pieces[pieces.len() - 1], sha1(&data[total - tail..]));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_deterministic_across_pool_sizes() {
    let files: Vec<(String, Vec<u8>)> = (0..24)
        .map(|i| (format!("dir{}/file{:02}", i % 3, i), patterned(97 * i + 13, i as u8)))
        .collect();
    let files: Vec<(&str, Vec<u8>)> = files.iter().map(|(n, d)| (n.as_str(), d.clone())).collect();
    let (manifest, mut source) = memory_fixture(&files);
    source.jitter = true;

    let length = PieceLength::new_unchecked(256);
    let expected = reference_hashes(&concatenated(&manifest, &source), 256);

    for workers in [1, 2, 3, 8, 32] {
        for (chunk_size, window) in [(7, 1), (64, 4), (1000, 64)] {
            let options = HasherOptions::default()
                .workers(workers)
                .chunk_size(chunk_size)
                .window(window);
            let hasher = PieceHasher::with_source(source.clone(), options);
            let pieces = hasher.hash(&manifest, length).await.unwrap();
            assert_eq!(
                pieces,
                PieceHashList::new(expected.clone()),
                "workers={workers} chunk_size={chunk_size} window={window}"
            );
        }
    }
    assert_eq!(source.open_handles(), 0);
}

#[tokio::test]
async fn test_zero_length_files() {
    let (manifest, source) = memory_fixture(&[
        ("a", vec![]),
        ("b", patterned(50, 3)),
        ("c", vec![]),
        ("d", patterned(30, 4)),
        ("e", vec![]),
    ]);
    let data = concatenated(&manifest, &source);
    let hasher = PieceHasher::with_source(source.clone(), HasherOptions::default().workers(3));

    let pieces = hasher
        .hash(&manifest, PieceLength::new_unchecked(32))
        .await
        .unwrap();
    assert_eq!(pieces, PieceHashList::new(reference_hashes(&data, 32)));
    assert_eq!(source.opened_total(), 5);
}

#[tokio::test]
async fn test_only_empty_files_yield_no_pieces() {
    let (manifest, source) = memory_fixture(&[("a", vec![]), ("b", vec![])]);
    let hasher = PieceHasher::with_source(source, HasherOptions::default());

    let pieces = hasher.hash(&manifest, PieceLength::MIN).await.unwrap();
    assert!(pieces.is_empty());
}

#[tokio::test]
async fn test_read_failure_after_first_file_consumed() {
    for workers in [1, 4] {
        let (manifest, mut source) = memory_fixture(&[
            ("A", patterned(5000, 1)),
            ("B", patterned(5000, 2)),
            ("C", patterned(5000, 3)),
        ]);
        source.fail = Some((PathBuf::from("/mem/B"), 100));
        let hasher = PieceHasher::with_source(
            source.clone(),
            HasherOptions::default().workers(workers).chunk_size(64),
        );

        let err = hasher
            .hash(&manifest, PieceLength::new_unchecked(1024))
            .await
            .unwrap_err();

        match err {
            TorrentError::FileRead { path, source: cause } => {
                assert_eq!(path, PathBuf::from("/mem/B"));
                assert_eq!(cause.to_string(), "injected read failure");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(source.open_handles(), 0, "workers={workers}");
    }
}

#[tokio::test]
async fn test_missing_file_fails() {
    let (manifest, mut source) = memory_fixture(&[("a", patterned(10, 1)), ("b", patterned(10, 2))]);
    source.files.remove(Path::new("/mem/b"));
    let hasher = PieceHasher::with_source(source.clone(), HasherOptions::default());

    let err = hasher.hash(&manifest, PieceLength::MIN).await.unwrap_err();
    assert!(matches!(err, TorrentError::FileRead { ref path, .. } if path == Path::new("/mem/b")));
    assert_eq!(source.open_handles(), 0);
}

#[tokio::test]
async fn test_missing_trailing_empty_file_fails() {
    let (manifest, mut source) = memory_fixture(&[("a", patterned(10, 1)), ("z", vec![])]);
    source.files.remove(Path::new("/mem/z"));
    let hasher = PieceHasher::with_source(source, HasherOptions::default().workers(2));

    let err = hasher.hash(&manifest, PieceLength::MIN).await.unwrap_err();
    assert!(matches!(err, TorrentError::FileRead { ref path, .. } if path == Path::new("/mem/z")));
}

#[tokio::test]
async fn test_timeout_cancels_cleanly() {
    let (manifest, mut source) = memory_fixture(&[
        ("a", patterned(100, 1)),
        ("b", patterned(100, 2)),
        ("c", patterned(100, 3)),
    ]);
    source.stall = Some(PathBuf::from("/mem/b"));
    let hasher = PieceHasher::with_source(source.clone(), HasherOptions::default().workers(3));

    let result = tokio::time::timeout(
        Duration::from_millis(50),
        hasher.hash(&manifest, PieceLength::MIN),
    )
    .await;
    assert!(result.is_err());

    for _ in 0..100 {
        if source.open_handles() == 0 {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(source.open_handles(), 0);
}

#[tokio::test]
async fn test_read_ahead_bounded_by_window() {
    let mut files = vec![("a000".to_string(), patterned(64, 0))];
    files.extend((0..500).map(|i| (format!("b{i:03}"), vec![i as u8])));
    let files: Vec<(&str, Vec<u8>)> = files
        .iter()
        .map(|(name, data)| (name.as_str(), data.clone()))
        .collect();
    let (manifest, mut source) = memory_fixture(&files);
    source.stall = Some(PathBuf::from("/mem/a000"));

    let options = HasherOptions::default().workers(4).chunk_size(64).window(2);
    let hasher = PieceHasher::with_source(source.clone(), options);

    let result = tokio::time::timeout(
        Duration::from_millis(300),
        hasher.hash(&manifest, PieceLength::MIN),
    )
    .await;
    assert!(result.is_err());

    // The stalled first chunk is never read; everything else needs a permit.
    assert!(
        source.reads_total() <= 2,
        "read {} chunks ahead with a window of 2",
        source.reads_total()
    );
}

#[tokio::test]
async fn test_extreme_options_are_clamped() {
    let (manifest, source) = memory_fixture(&[("a", patterned(5000, 1)), ("b", patterned(300, 2))]);
    let expected = reference_hashes(&concatenated(&manifest, &source), 1024);

    let options = HasherOptions::default()
        .workers(usize::MAX)
        .chunk_size(usize::MAX)
        .window(usize::MAX);
    let pieces = PieceHasher::with_source(source, options)
        .hash(&manifest, PieceLength::new_unchecked(1024))
        .await
        .unwrap();
    assert_eq!(pieces.iter().copied().collect::<Vec<_>>(), expected);

    let options = HasherOptions::default().workers(0).chunk_size(0).window(0);
    let (manifest, source) = memory_fixture(&[("a", patterned(100, 3))]);
    let expected = reference_hashes(&concatenated(&manifest, &source), 64);
    let pieces = PieceHasher::with_source(source, options)
        .hash(&manifest, PieceLength::new_unchecked(64))
        .await
        .unwrap();
    assert_eq!(pieces.iter().copied().collect::<Vec<_>>(), expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_small_files_with_minimal_window() {
    let files: Vec<(String, Vec<u8>)> = (0..300)
        .map(|i| (format!("f{i:03}"), patterned(i % 7 + 1, i as u8)))
        .collect();
    let files: Vec<(&str, Vec<u8>)> = files
        .iter()
        .map(|(name, data)| (name.as_str(), data.clone()))
        .collect();
    let (manifest, mut source) = memory_fixture(&files);
    source.jitter = true;
    let expected = reference_hashes(&concatenated(&manifest, &source), 16);

    let options = HasherOptions::default().workers(8).chunk_size(3).window(1);
    let pieces = PieceHasher::with_source(source.clone(), options)
        .hash(&manifest, PieceLength::new_unchecked(16))
        .await
        .unwrap();

    assert_eq!(pieces.iter().copied().collect::<Vec<_>>(), expected);
    assert_eq!(source.open_handles(), 0);
}

// ============================================================================
// Disk-backed pipeline
// ============================================================================

fn disk_fixture(temp: &TempDir, files: &[(&str, Vec<u8>)]) -> FileManifest {
    let mut builder = ManifestBuilder::new(temp.path());
    for (name, data) in files {
        let path = temp.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, data).unwrap();
        builder.add_file(&path, data.len() as i64).unwrap();
    }
    builder.finalize().unwrap()
}

#[tokio::test]
async fn test_disk_matches_reference() {
    let temp = TempDir::new().unwrap();
    let a = patterned(40_000, 1);
    let b = patterned(25_000, 2);
    let c = patterned(70_001, 3);
    let manifest = disk_fixture(&temp, &[("x/c.bin", c.clone()), ("a.bin", a.clone()), ("b.bin", b.clone())]);

    let mut data = a;
    data.extend_from_slice(&b);
    data.extend_from_slice(&c);

    let hasher = PieceHasher::new(HasherOptions::default().workers(3).chunk_size(4096));
    let pieces = hasher.hash(&manifest, PieceLength::MIN).await.unwrap();

    assert_eq!(pieces, PieceHashList::new(reference_hashes(&data, 16384)));
}

#[tokio::test]
async fn test_disk_truncated_file() {
    let temp = TempDir::new().unwrap();
    let manifest = disk_fixture(&temp, &[("a.bin", patterned(1000, 1)), ("b.bin", patterned(1000, 2))]);
    std::fs::write(temp.path().join("b.bin"), patterned(500, 2)).unwrap();

    let hasher = PieceHasher::default();
    let err = hasher.hash(&manifest, PieceLength::MIN).await.unwrap_err();

    match err {
        TorrentError::FileRead { path, source } => {
            assert_eq!(path, temp.path().join("b.bin"));
            assert_eq!(source.kind(), io::ErrorKind::UnexpectedEof);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_disk_deleted_file() {
    let temp = TempDir::new().unwrap();
    let manifest = disk_fixture(&temp, &[("a.bin", patterned(1000, 1)), ("b.bin", patterned(1000, 2))]);
    std::fs::remove_file(temp.path().join("b.bin")).unwrap();

    let err = PieceHasher::default()
        .hash(&manifest, PieceLength::MIN)
        .await
        .unwrap_err();
    assert!(matches!(err, TorrentError::FileRead { .. }));
}
