mod block_file;
mod cli;

use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind};
use std::sync::Arc;

use block_dev::BlockDevice;
use clap::Parser;
use fat::{Error, FatFileSystem, Inode, SECTOR_SIZE};
use typed_bytesize::ByteSizeIec;

pub use self::{
    block_file::BlockFile,
    cli::{Cli, Command},
};

fn main() -> io::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    log::debug!("image={:?}", cli.image);

    if let Command::Format { size_mib } = cli.command {
        let disk_size = ByteSizeIec::mib(size_mib).0;
        let fd = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&cli.image)?;
        fd.set_len(disk_size)?;

        let block_dev: Arc<dyn BlockDevice> = Arc::new(BlockFile::new(fd)?);
        FatFileSystem::format(&block_dev).unmount();
        println!("formatted {:?} ({size_mib} MiB, {disk_size} bytes)", cli.image);
        return Ok(());
    }

    let fd = OpenOptions::new().read(true).write(true).open(&cli.image)?;
    let block_dev: Arc<dyn BlockDevice> = Arc::new(BlockFile::new(fd)?);
    let fs = FatFileSystem::mount(&block_dev);

    let result = run(&fs, cli.command);
    fs.unmount();
    result
}

fn run(fs: &Arc<FatFileSystem>, command: Command) -> io::Result<()> {
    match command {
        Command::Format { .. } => unreachable!("handled before mounting"),
        Command::Ls { path } => {
            let dir = fs.open_dir(None, &path).map_err(to_io)?;
            for entry in dir.entries() {
                let inode = Inode::open(fs, entry.inode_sector());
                let kind = if inode.is_dir() { 'd' } else { '-' };
                println!("{kind} {:>10} {}", inode.length(), entry.name());
            }
        }
        Command::Mkdir { path } => fs.mkdir(None, &path).map_err(to_io)?,
        Command::Put { source, path } => {
            let data = fs::read(&source)?;
            fs.create_file(None, &path, 0).map_err(to_io)?;
            let mut file = fs.open_file(None, &path).map_err(to_io)?;
            let written = file.write(&data);
            if written != data.len() {
                log::error!("{path:?}: only {written} of {} bytes written", data.len());
                return Err(to_io(Error::NoSpace));
            }
            log::info!("put {source:?} -> {path:?} ({written} bytes)");
        }
        Command::Get { path, dest } => {
            let mut file = open_regular(fs, &path)?;
            fs::write(&dest, file.read_all())?;
        }
        Command::Cat { path } => {
            let mut file = open_regular(fs, &path)?;
            hex_dump(&file.read_all());
        }
        Command::Rm { path } => fs.remove_file(None, &path).map_err(to_io)?,
        Command::Info => {
            let boot = fs.boot_record();
            let fat = fs.fat();
            println!("total sectors:   {}", boot.total_sectors());
            println!("FAT sectors:     {}", boot.fat_sectors());
            println!("data area:       sector {}", boot.data_area());
            println!("root directory:  sector {}", fs.root_sector());
            println!(
                "clusters:        {} free / {} usable",
                fat.free_clusters(),
                fat.usable_clusters()
            );
            println!(
                "free space:      {} bytes",
                fat.free_clusters() * SECTOR_SIZE
            );
        }
    }

    Ok(())
}

fn open_regular(fs: &Arc<FatFileSystem>, path: &str) -> io::Result<fat::File> {
    let file = fs.open_file(None, path).map_err(to_io)?;
    if file.inode().is_dir() {
        return Err(to_io(Error::IsADirectory));
    }
    Ok(file)
}

fn hex_dump(bytes: &[u8]) {
    for (i, line) in bytes.chunks(16).enumerate() {
        let hex: String = line.iter().map(|b| format!("{b:02x} ")).collect();
        let ascii: String = line
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        println!("{:08x}  {hex:<48} |{ascii}|", i * 16);
    }
}

fn to_io(e: Error) -> io::Error {
    let kind = match e {
        Error::NoSpace => ErrorKind::StorageFull,
        Error::NotFound => ErrorKind::NotFound,
        Error::AlreadyExists => ErrorKind::AlreadyExists,
        Error::NotADirectory => ErrorKind::NotADirectory,
        Error::IsADirectory => ErrorKind::IsADirectory,
        Error::DirectoryNotEmpty => ErrorKind::DirectoryNotEmpty,
        Error::InvalidName => ErrorKind::InvalidInput,
    };
    io::Error::new(kind, e.to_string())
}
