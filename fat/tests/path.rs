mod common;

use fat::{Dir, Error, FatFileSystem};

use self::common::{MemDisk, formatted};

#[test]
fn nested_create_and_open() {
    let fs = formatted(512);
    fs.mkdir(None, "/usr").unwrap();
    fs.mkdir(None, "/usr/lib").unwrap();
    fs.create_file(None, "/usr/lib/libc.a", 1234).unwrap();

    let file = fs.open_file(None, "/usr/lib/libc.a").unwrap();
    assert_eq!(1234, file.length());
    assert!(!file.inode().is_dir());

    assert_eq!(Err(Error::AlreadyExists), fs.create_file(None, "/usr/lib/libc.a", 0));
    assert_eq!(Err(Error::NotFound), fs.open_file(None, "/usr/bin/ls").map(|_| ()));
    assert_eq!(Err(Error::NotFound), fs.mkdir(None, "/opt/x"));
}

#[test]
fn root_path() {
    let fs = formatted(128);
    let root = fs.open_file(None, "/").unwrap();
    assert_eq!(fs.root_sector(), root.inode().sector());
    assert!(root.inode().is_dir());

    assert_eq!(Err(Error::InvalidName), fs.create_file(None, "/", 0));
    assert_eq!(Err(Error::InvalidName), fs.remove_file(None, "/"));
    assert_eq!(Err(Error::NotFound), fs.open_file(None, "").map(|_| ()));
}

#[test]
fn file_as_intermediate() {
    let fs = formatted(128);
    fs.create_file(None, "plain", 0).unwrap();
    assert_eq!(
        Err(Error::NotADirectory),
        fs.open_file(None, "plain/x").map(|_| ())
    );
    assert_eq!(Err(Error::NotADirectory), fs.chdir(&mut None, "plain"));
}

#[test]
fn relative_to_cwd() {
    let fs = formatted(256);
    fs.mkdir(None, "home").unwrap();
    fs.mkdir(None, "home/user").unwrap();

    let mut cwd = None;
    fs.chdir(&mut cwd, "home").unwrap();
    fs.chdir(&mut cwd, "user").unwrap();
    fs.create_file(cwd.as_ref(), "notes", 0).unwrap();

    assert!(fs.open_file(None, "/home/user/notes").is_ok());
    assert!(fs.open_file(cwd.as_ref(), "notes").is_ok());
    // 绝对路径不受当前目录影响
    assert!(fs.open_file(cwd.as_ref(), "/home").is_ok());
    assert_eq!(Err(Error::NotFound), fs.open_file(None, "notes").map(|_| ()));
}

#[test]
fn removed_cwd_falls_back_to_root() {
    let fs = formatted(256);
    fs.mkdir(None, "tmp").unwrap();
    fs.create_file(None, "top", 0).unwrap();

    let mut cwd = None;
    fs.chdir(&mut cwd, "/tmp").unwrap();
    fs.remove_file(None, "/tmp").unwrap();

    let cwd = cwd.unwrap();
    assert!(cwd.inode().is_removed());
    // 相对路径从根目录解析
    assert!(fs.open_file(Some(&cwd), "top").is_ok());
}

#[test]
fn remove_rules() {
    let fs = formatted(256);
    let free = fs.fat().free_clusters();

    fs.mkdir(None, "d").unwrap();
    fs.create_file(None, "d/f", 2000).unwrap();
    assert_eq!(Err(Error::DirectoryNotEmpty), fs.remove_file(None, "d"));

    let mut open = fs.open_file(None, "d/f").unwrap();
    fs.remove_file(None, "d/f").unwrap();
    assert_eq!(Err(Error::NotFound), fs.open_file(None, "d/f").map(|_| ()));

    // 仍然打开的文件照常可读
    assert_eq!(2000, open.read_all().len());
    drop(open);

    fs.remove_file(None, "d").unwrap();
    assert_eq!(free, fs.fat().free_clusters());
    assert!(Dir::open_root(&fs).is_empty());
}

#[test]
fn persists_across_mount() {
    let dev = MemDisk::new(256);
    {
        let fs = FatFileSystem::format(&dev);
        fs.mkdir(None, "etc").unwrap();
        fs.create_file(None, "etc/motd", 0).unwrap();
        let mut motd = fs.open_file(None, "etc/motd").unwrap();
        assert_eq!(5, motd.write(b"hello"));
        drop(motd);
        fs.unmount();
    }

    let fs = FatFileSystem::mount(&dev);
    let mut motd = fs.open_file(None, "/etc/motd").unwrap();
    assert_eq!(b"hello".to_vec(), motd.read_all());

    let mut etc = fs.open_dir(None, "etc").unwrap();
    assert_eq!(Some("motd".to_owned()), etc.readdir());
    assert_eq!(None, etc.readdir());
}

#[test]
fn failed_create_rolls_back() {
    let fs = formatted(32);
    let free = fs.fat().free_clusters();

    assert_eq!(
        Err(Error::NoSpace),
        fs.create_file(None, "huge", (free + 1) * 512)
    );
    assert_eq!(free, fs.fat().free_clusters());
    assert!(Dir::open_root(&fs).lookup("huge").is_none());

    assert_eq!(Err(Error::InvalidName), fs.create_file(None, "a-very-long-file-name", 0));
    assert_eq!(free, fs.fat().free_clusters());
}
