//! Content and modification-time drift between the working copy and the
//! deployed instance. Nothing here is cached: every answer reflects the
//! filesystem at call time.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DriftResult {
    pub path: String,
    pub exists_in_instance: bool,
    pub content_differs: bool,
    pub locally_newer: bool,
}

impl DriftResult {
    pub fn diverges(&self) -> bool {
        self.content_differs
    }

    /// Candidate for copying into the instance.
    pub fn needs_sync(&self) -> bool {
        self.content_differs && (!self.exists_in_instance || self.locally_newer)
    }
}

fn same_bytes(a: &Path, b: &Path) -> std::io::Result<bool> {
    let (ma, mb) = (fs::metadata(a)?, fs::metadata(b)?);
    if !ma.is_file() || !mb.is_file() {
        return Ok(false);
    }
    if ma.len() != mb.len() {
        return Ok(false);
    }

    let mut ra = BufReader::new(File::open(a)?);
    let mut rb = BufReader::new(File::open(b)?);
    let mut ba = [0u8; 8192];
    let mut bb = [0u8; 8192];
    loop {
        let na = read_full(&mut ra, &mut ba)?;
        let nb = read_full(&mut rb, &mut bb)?;
        if na != nb || ba[..na] != bb[..nb] {
            return Ok(false);
        }
        if na == 0 {
            return Ok(true);
        }
    }
}

fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Byte-for-byte comparison. A side that is missing or unreadable differs
/// from one that exists; two missing sides are equal.
pub fn files_differ(a: &Path, b: &Path) -> bool {
    match (a.exists(), b.exists()) {
        (false, false) => false,
        (true, true) => !same_bytes(a, b).unwrap_or(false),
        _ => true,
    }
}

/// `a` was modified strictly after `b`. False when either side is missing.
pub fn is_newer(a: &Path, b: &Path) -> bool {
    let modified = |p: &Path| fs::metadata(p).and_then(|m| m.modified()).ok();
    match (modified(a), modified(b)) {
        (Some(ta), Some(tb)) => ta > tb,
        _ => false,
    }
}

pub fn drift_for(working_copy: &Path, instance_root: &Path, rel: &str) -> DriftResult {
    let local = working_copy.join(rel);
    let deployed = instance_root.join(rel);
    let exists_in_instance = deployed.is_file();
    DriftResult {
        path: rel.to_string(),
        exists_in_instance,
        content_differs: files_differ(&local, &deployed),
        locally_newer: exists_in_instance && is_newer(&local, &deployed),
    }
}

pub fn drift_all(working_copy: &Path, instance_root: &Path, tracked: &[String]) -> Vec<DriftResult> {
    tracked
        .iter()
        .map(|rel| drift_for(working_copy, instance_root, rel))
        .collect()
}

pub fn sha256_hex(path: &Path) -> Option<String> {
    let mut reader = BufReader::new(File::open(path).ok()?);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = reader.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Some(format!("{:x}", hasher.finalize()))
}

pub fn modified_rfc3339(path: &Path) -> Option<String> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    let at: DateTime<Utc> = modified.into();
    Some(at.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    pub(crate) fn write_with_mtime(path: &Path, body: &str, mtime: SystemTime) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, body).expect("write");
        File::options()
            .write(true)
            .open(path)
            .expect("open")
            .set_modified(mtime)
            .expect("set mtime");
    }

    pub(crate) fn epoch(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn identical_files_do_not_differ() {
        let tmp = tempdir().expect("tempdir");
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        fs::write(&a, "same\n").expect("write a");
        fs::write(&b, "same\n").expect("write b");
        assert!(!files_differ(&a, &b));
    }

    #[test]
    fn differ_is_symmetric_for_every_pairing() {
        let tmp = tempdir().expect("tempdir");
        let one = tmp.path().join("one");
        let two = tmp.path().join("two");
        let longer = tmp.path().join("longer");
        let missing = tmp.path().join("missing");
        fs::write(&one, "alpha").expect("write");
        fs::write(&two, "alphb").expect("write");
        fs::write(&longer, "alpha-and-more").expect("write");

        let all: [&PathBuf; 4] = [&one, &two, &longer, &missing];
        for a in all {
            for b in all {
                assert_eq!(files_differ(a, b), files_differ(b, a), "{a:?} vs {b:?}");
            }
        }
        assert!(files_differ(&one, &two));
        assert!(files_differ(&one, &longer));
        assert!(files_differ(&one, &missing));
        assert!(!files_differ(&missing, &missing));
    }

    #[test]
    fn large_files_compare_past_first_block() {
        let tmp = tempdir().expect("tempdir");
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        let mut body = vec![b'x'; 20_000];
        fs::write(&a, &body).expect("write a");
        body[19_999] = b'y';
        fs::write(&b, &body).expect("write b");
        assert!(files_differ(&a, &b));
    }

    #[test]
    fn is_newer_needs_both_sides() {
        let tmp = tempdir().expect("tempdir");
        let old = tmp.path().join("old");
        let new = tmp.path().join("new");
        write_with_mtime(&old, "o", epoch(1_000));
        write_with_mtime(&new, "n", epoch(2_000));
        assert!(is_newer(&new, &old));
        assert!(!is_newer(&old, &new));
        assert!(!is_newer(&new, &new));
        assert!(!is_newer(&new, &tmp.path().join("missing")));
        assert!(!is_newer(&tmp.path().join("missing"), &old));
    }

    #[test]
    fn drift_for_reports_every_flag() {
        let tmp = tempdir().expect("tempdir");
        let local = tmp.path().join("local");
        let inst = tmp.path().join("inst");
        write_with_mtime(&local.join("utils/brand.env"), "A=2\n", epoch(2_000));
        write_with_mtime(&inst.join("utils/brand.env"), "A=1\n", epoch(1_000));
        write_with_mtime(&local.join(".config.sh"), "X=1\n", epoch(2_000));

        let brand = drift_for(&local, &inst, "utils/brand.env");
        assert!(brand.exists_in_instance);
        assert!(brand.content_differs);
        assert!(brand.locally_newer);
        assert!(brand.needs_sync());

        let cfg = drift_for(&local, &inst, ".config.sh");
        assert!(!cfg.exists_in_instance);
        assert!(cfg.content_differs);
        assert!(!cfg.locally_newer);
        assert!(cfg.needs_sync());
    }

    #[test]
    fn drift_is_recomputed_on_each_call() {
        let tmp = tempdir().expect("tempdir");
        let local = tmp.path().join("local");
        let inst = tmp.path().join("inst");
        write_with_mtime(&local.join("f"), "v1", epoch(1_000));
        write_with_mtime(&inst.join("f"), "v1", epoch(1_000));
        assert!(!drift_for(&local, &inst, "f").diverges());

        write_with_mtime(&local.join("f"), "v2", epoch(3_000));
        assert!(drift_for(&local, &inst, "f").diverges());
    }

    #[test]
    fn digest_and_mtime_render() {
        let tmp = tempdir().expect("tempdir");
        let f = tmp.path().join("f");
        write_with_mtime(&f, "abc", epoch(0));
        assert_eq!(
            sha256_hex(&f).as_deref(),
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
        assert_eq!(
            modified_rfc3339(&f).as_deref(),
            Some("1970-01-01T00:00:00Z")
        );
        assert_eq!(sha256_hex(&tmp.path().join("missing")), None);
    }
}
