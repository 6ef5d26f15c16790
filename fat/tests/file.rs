mod common;

use fat::Error;

use self::common::formatted;

#[test]
fn position_follows_reads_and_writes() {
    let fs = formatted(128);
    fs.create_file(None, "f", 0).unwrap();
    let mut file = fs.open_file(None, "f").unwrap();

    assert_eq!(11, file.write(b"hello world"));
    assert_eq!(11, file.tell());
    file.seek(6);

    let mut buf = [0; 16];
    assert_eq!(5, file.read(&mut buf));
    assert_eq!(b"world", &buf[..5]);
    assert_eq!(11, file.tell());
    assert_eq!(0, file.read(&mut buf));

    assert_eq!(5, file.read_at(&mut buf, 0));
    assert_eq!(b"hello", &buf[..5]);
    assert_eq!(11, file.tell());
}

#[test]
fn seek_past_end_extends_on_write() {
    let fs = formatted(128);
    fs.create_file(None, "f", 0).unwrap();
    let mut file = fs.open_file(None, "f").unwrap();

    file.seek(2000);
    assert_eq!(10, file.write(b"0123456789"));
    assert_eq!(2010, file.length());

    file.seek(0);
    let bytes = file.read_all();
    assert_eq!(2010, bytes.len());
    assert!(bytes[..2000].iter().all(|&b| b == 0));
}

#[test]
fn deny_write_released_on_drop() {
    let fs = formatted(128);
    fs.create_file(None, "exe", 0).unwrap();
    let writer = fs.open_file(None, "exe").unwrap();

    let mut running = fs.open_file(None, "exe").unwrap();
    running.deny_write().unwrap();
    running.deny_write().unwrap();
    assert_eq!(0, writer.write_at(b"patch", 0));

    let dup = running.duplicate();
    drop(running);
    // 复制出的文件仍禁止写入
    assert_eq!(0, writer.write_at(b"patch", 0));

    drop(dup);
    assert_eq!(5, writer.write_at(b"patch", 0));
}

#[test]
fn duplicate_copies_position() {
    let fs = formatted(128);
    fs.create_file(None, "f", 0).unwrap();
    let mut file = fs.open_file(None, "f").unwrap();
    file.write(b"abcdef");
    file.seek(2);

    let mut dup = file.duplicate();
    assert_eq!(2, dup.tell());
    let mut buf = [0; 2];
    dup.read(&mut buf);
    assert_eq!(b"cd", &buf);

    let mut fresh = file.reopen();
    assert_eq!(0, fresh.tell());
    fresh.read(&mut buf);
    assert_eq!(b"ab", &buf);
    assert_eq!(2, file.tell());
}

#[test]
fn seek_to_usize_max_writes_nothing() {
    let fs = formatted(128);
    fs.create_file(None, "f", 0).unwrap();
    let mut file = fs.open_file(None, "f").unwrap();
    let free = fs.fat().free_clusters();

    file.seek(usize::MAX);
    assert_eq!(0, file.write(b"ab"));
    assert_eq!(usize::MAX, file.tell());
    assert_eq!(0, file.length());
    assert_eq!(free, fs.fat().free_clusters());
}

#[test]
fn directories_refuse_deny_write() {
    let fs = formatted(128);
    fs.create_file(None, "victim", 0).unwrap();

    let mut root = fs.open_file(None, "/").unwrap();
    assert_eq!(Err(Error::IsADirectory), root.deny_write());
    let dup = root.duplicate();

    // 目录仍可增删目录项
    fs.create_file(None, "another", 0).unwrap();
    fs.remove_file(None, "victim").unwrap();
    assert_eq!(Err(Error::NotFound), fs.open_file(None, "victim").map(|_| ()));
    assert!(fs.open_file(None, "another").is_ok());

    drop(dup);
    drop(root);
}
