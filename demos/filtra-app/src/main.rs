use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use argh::FromArgs;

use filtra::image::{Image, ImageSize};
use filtra::imgproc::filter::apply_convolution;
use filtra::imgproc::parallel::PartitionStrategy;

#[derive(FromArgs)]
/// Apply a convolution filter to a PNG image
struct Args {
    /// path to the input png image
    #[argh(option)]
    input: PathBuf,

    /// path to write the filtered png image to
    #[argh(option, default = "PathBuf::from(\"output.png\")")]
    output: PathBuf,

    /// the filter to apply: identity, edge, sharpen, blur, gaussian or emboss
    #[argh(option)]
    filter: String,

    /// the number of worker threads, defaults to the available parallelism
    #[argh(option)]
    threads: Option<usize>,

    /// the partition strategy: static or dynamic
    #[argh(option, default = "String::from(\"static\")")]
    strategy: String,

    /// rows per work unit for the dynamic strategy
    #[argh(option, default = "1")]
    chunk_rows: usize,
}

fn read_png(path: &Path) -> Result<Image, Box<dyn std::error::Error>> {
    let decoder = png::Decoder::new(File::open(path)?);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;

    if info.bit_depth != png::BitDepth::Eight {
        return Err(format!("only 8-bit png images are supported, got {:?}", info.bit_depth).into());
    }
    if info.color_type == png::ColorType::Indexed {
        return Err("indexed png images are not supported".into());
    }

    buf.truncate(info.buffer_size());
    let image = Image::new(
        ImageSize {
            width: info.width as usize,
            height: info.height as usize,
        },
        info.color_type.samples(),
        buf,
    )?;

    Ok(image)
}

fn write_png(path: &Path, image: &Image) -> Result<(), Box<dyn std::error::Error>> {
    let color_type = match image.num_channels() {
        1 => png::ColorType::Grayscale,
        2 => png::ColorType::GrayscaleAlpha,
        3 => png::ColorType::Rgb,
        4 => png::ColorType::Rgba,
        channels => return Err(format!("cannot encode {channels} channels as png").into()),
    };

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let mut encoder = png::Encoder::new(writer, image.width() as u32, image.height() as u32);
    encoder.set_color(color_type);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.write_header()?.write_image_data(image.as_slice())?;

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();

    let src = read_png(&args.input)?;
    log::info!(
        "loaded image: {}x{} with {} channels",
        src.width(),
        src.height(),
        src.num_channels()
    );

    let num_threads = match args.threads {
        Some(n) => n,
        None => std::thread::available_parallelism()?.get(),
    };
    let strategy = match args.strategy.as_str() {
        "static" => PartitionStrategy::StaticRows,
        "dynamic" => PartitionStrategy::DynamicChunks(args.chunk_rows),
        other => return Err(format!("unknown strategy: {other}").into()),
    };

    log::info!(
        "applying {} filter using the {} strategy with {} threads...",
        args.filter,
        args.strategy,
        num_threads
    );
    let dst = apply_convolution(&src, &args.filter, num_threads, strategy)?;

    write_png(&args.output, &dst)?;
    log::info!("output saved to {}", args.output.display());

    Ok(())
}
