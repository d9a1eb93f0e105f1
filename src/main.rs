use bankmem::device::{MemAttrs, MemDevice, MemKind};
use bankmem::error::MemResult;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

//===========================================================================//

#[derive(Parser)]
#[clap(author, about, long_about = None, version)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Args)]
struct DeviceArgs {
    /// Number of address bits (2-24).
    #[clap(long, default_value_t = 8)]
    addr_width: u32,
    /// Number of data bits (1-32).
    #[clap(long, default_value_t = 8)]
    data_width: u32,
    /// Treat the memory as ROM rather than RAM.
    #[clap(long)]
    rom: bool,
}

impl DeviceArgs {
    fn blank_device(&self) -> MemResult<MemDevice> {
        let kind = if self.rom { MemKind::Rom } else { MemKind::Ram };
        MemDevice::with_widths(kind, self.addr_width, self.data_width)
    }

    fn load_device(&self, image: &Path) -> MemResult<MemDevice> {
        let mut device = self.blank_device()?;
        device.load_image(image)?;
        Ok(device)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Describes an image and counts its non-zero cells.
    Info {
        /// The image file to inspect.
        image: PathBuf,
        #[clap(flatten)]
        device: DeviceArgs,
    },
    /// Prints a range of cells from an image.
    Dump {
        /// The image file to print.
        image: PathBuf,
        /// First address to print (hex).
        #[clap(long, default_value = "0", value_parser = parse_hex)]
        start: u32,
        /// Number of cells to print.
        #[clap(long, default_value_t = 256)]
        len: u64,
        #[clap(flatten)]
        device: DeviceArgs,
    },
    /// Writes one cell of an image and saves it back.
    Poke {
        /// The image file to modify.
        image: PathBuf,
        /// The address to write (hex).
        #[clap(value_parser = parse_hex)]
        addr: u32,
        /// The value to write (hex).
        #[clap(value_parser = parse_hex)]
        value: u32,
        #[clap(flatten)]
        device: DeviceArgs,
    },
    /// Converts an image between hex-text and raw binary (`.bin`) formats.
    Convert {
        /// The image file to read.
        input: PathBuf,
        /// The image file to write.
        output: PathBuf,
        #[clap(flatten)]
        device: DeviceArgs,
    },
    /// Writes an image with every cell cleared.
    Clear {
        /// The image file to write.
        image: PathBuf,
        #[clap(flatten)]
        device: DeviceArgs,
    },
}

fn parse_hex(text: &str) -> Result<u32, String> {
    let digits = text.trim_start_matches("0x").trim_start_matches('$');
    u32::from_str_radix(digits, 16).map_err(|error| error.to_string())
}

//===========================================================================//

fn main() -> MemResult<()> {
    env_logger::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Info { image, device } => {
            let device = device.load_device(&image)?;
            let (pages, cells) = device.store().with_store(|store| {
                let cells = store
                    .pages()
                    .map(|(_, page)| page.iter().filter(|&&v| v != 0).count())
                    .sum::<usize>();
                (store.allocated_pages(), cells)
            });
            println!("{}: {}", image.display(), device.description());
            println!("{cells} non-zero cell(s) in {pages} page(s)");
        }
        Command::Dump { image, start, len, device } => {
            let device = device.load_device(&image)?;
            let attrs: &MemAttrs = device.attrs();
            let addr_digits = attrs.addr_width.hex_digits();
            let data_digits = attrs.data_width.hex_digits();
            let values = device.store().copy_range(start, len)?;
            for (row, chunk) in values.chunks(16).enumerate() {
                let addr = start as usize + row * 16;
                let cells: Vec<String> = chunk
                    .iter()
                    .map(|value| format!("{value:0data_digits$x}"))
                    .collect();
                println!("{addr:0addr_digits$x}: {}", cells.join(" "));
            }
        }
        Command::Poke { image, addr, value, device } => {
            let mut device = device.load_device(&image)?;
            device.store().set(addr, value)?;
            device.save_image(&image)?;
        }
        Command::Convert { input, output, device } => {
            let mut device = device.load_device(&input)?;
            device.save_image(&output)?;
        }
        Command::Clear { image, device } => {
            device.blank_device()?.save_image(&image)?;
        }
    }
    Ok(())
}

//===========================================================================//
