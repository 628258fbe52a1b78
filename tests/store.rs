use formspool::{decode, UploadStore};
use std::fs;

const FORM_BODY: &[u8] = b"--XYZ\r\n\
Content-Disposition: form-data; name=\"files\"; filename=\"report.txt\"\r\n\
Content-Type: text/plain\r\n\
\r\n\
quarterly numbers\r\n\
--XYZ\r\n\
Content-Disposition: form-data; name=\"files\"; filename=\"../escape.bin\"\r\n\
Content-Type: application/octet-stream\r\n\
\r\n\
\x00\x01\r\n\
--XYZ\r\n\
Content-Disposition: form-data; name=\"files\"; filename=\"\"\r\n\
Content-Type: application/octet-stream\r\n\
\r\n\
\r\n\
--XYZ\r\n\
Content-Disposition: form-data; name=\"text\"\r\n\
\r\n\
some notes\r\n\
--XYZ\r\n\
Content-Disposition: form-data; name=\"submit\"\r\n\
\r\n\
Upload\r\n\
--XYZ--\r\n";

#[test]
fn test_accept_applies_field_policy() {
    let dir = tempfile::tempdir().unwrap();
    let store = UploadStore::open(dir.path().join("uploads")).unwrap();

    let parts = decode(FORM_BODY, "XYZ").unwrap();
    assert_eq!(parts.len(), 5);

    let stored = store.accept(parts).unwrap();
    let names: Vec<_> = stored.iter().map(|upload| upload.name.as_str()).collect();

    assert_eq!(names.len(), 3);
    assert_eq!(names[0], "report.txt");
    assert_eq!(names[1], "escape.bin");
    assert!(names[2].starts_with("text_") && names[2].ends_with(".txt"));

    assert_eq!(fs::read(store.dir().join("report.txt")).unwrap(), b"quarterly numbers");
    assert_eq!(fs::read(store.dir().join("escape.bin")).unwrap(), b"\x00\x01");
    assert_eq!(fs::read(&stored[2].path).unwrap(), b"some notes");
    assert!(!dir.path().join("escape.bin").exists());

    assert_eq!(stored[0].size, 17);
    assert_eq!(stored[1].size, 2);
}

#[test]
fn test_empty_text_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let store = UploadStore::open(dir.path()).unwrap();

    let body = "--XYZ\r\nContent-Disposition: form-data; name=\"text\"\r\n\r\n\r\n--XYZ--\r\n";
    let parts = decode(body.as_bytes(), "XYZ").unwrap();

    assert!(store.accept(parts).unwrap().is_empty());
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_list_and_find() {
    let dir = tempfile::tempdir().unwrap();
    let store = UploadStore::open(dir.path()).unwrap();

    fs::write(dir.path().join("b.txt"), b"bb").unwrap();
    fs::write(dir.path().join("a.txt"), b"a").unwrap();
    fs::write(dir.path().join(".hidden"), b"secret").unwrap();
    fs::create_dir(dir.path().join("subdir")).unwrap();

    let listed = store.list().unwrap();
    let names: Vec<_> = listed.iter().map(|upload| upload.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
    assert_eq!(listed[1].size, 2);

    let found = store.find("b.txt").unwrap().unwrap();
    assert_eq!(found.path, dir.path().join("b.txt"));
    assert!(store.find(".hidden").unwrap().is_none());
    assert!(store.find("missing.txt").unwrap().is_none());
}

#[test]
fn test_same_name_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let store = UploadStore::open(dir.path()).unwrap();

    let first = "--XYZ\r\nContent-Disposition: form-data; name=\"files\"; filename=\"a.txt\"\r\n\r\nfirst version\r\n--XYZ--\r\n";
    let second = "--XYZ\r\nContent-Disposition: form-data; name=\"files\"; filename=\"a.txt\"\r\n\r\nv2\r\n--XYZ--\r\n";

    store.accept(decode(first.as_bytes(), "XYZ").unwrap()).unwrap();
    store.accept(decode(second.as_bytes(), "XYZ").unwrap()).unwrap();

    assert_eq!(fs::read(dir.path().join("a.txt")).unwrap(), b"v2");
    assert_eq!(store.list().unwrap().len(), 1);
}
