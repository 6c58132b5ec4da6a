use std::fs;
use std::path::PathBuf;

use ambient_palette::{
    Orientation, PaletteExtractor, Raster, Swatch, XyzColor, decode, slice_columns, to_hex,
};
use anyhow::{Context, Result, bail};
use clap::Parser;
use serde_json::{Value, json};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Extract dominant colors from images to drive ambient lights.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Number of colors to extract
    #[arg(short = 'k', long, default_value_t = 5)]
    count: usize,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Thumbnail bound (longest side) used before clustering
    #[arg(short, long, default_value_t = ambient_palette::THUMBNAIL_SIZE)]
    size: u32,

    /// EXIF orientation (1-8) of the inputs, overriding any stored in the files
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..=8))]
    orientation: Option<u16>,

    /// Cut each image into this many vertical strips, one palette per strip
    #[arg(long)]
    slices: Option<u32>,

    /// Emit JSON instead of plain hex lines
    #[arg(long)]
    json: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn swatch_json(swatch: &Swatch) -> Value {
    let c = swatch.color;
    let xy = XyzColor::from_rgb(c).chromaticity().map(|(x, y)| [x, y]);
    json!({
        "hex": to_hex(c),
        "rgb": [c.red, c.green, c.blue],
        "xy": xy,
        "population": swatch.population,
    })
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    if args.count == 0 {
        bail!("--count must be at least 1");
    }

    let orientation = args.orientation.and_then(Orientation::from_exif);
    let extractor = PaletteExtractor::new(args.count)
        .with_optional_seed(args.seed)
        .with_thumbnail_size(args.size);

    let mut documents = Vec::new();
    for input in &args.inputs {
        let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
        let raster = decode(&bytes, orientation)
            .with_context(|| format!("decoding {}", input.display()))?;
        debug!("{}: {}x{}", input.display(), raster.width(), raster.height());

        let regions: Vec<Raster> = match args.slices {
            Some(n) => slice_columns(&raster, n).context("slicing image")?,
            None => vec![raster],
        };

        let mut palettes = Vec::with_capacity(regions.len());
        for region in &regions {
            let swatches = extractor
                .swatches(region)
                .with_context(|| format!("extracting palette from {}", input.display()))?;
            palettes.push(swatches);
        }

        info!("{}: {} palette(s)", input.display(), palettes.len());

        if args.json {
            documents.push(json!({
                "input": input.display().to_string(),
                "palettes": palettes
                    .iter()
                    .map(|p| p.iter().map(swatch_json).collect::<Vec<_>>())
                    .collect::<Vec<_>>(),
            }));
        } else {
            for palette in &palettes {
                let line: Vec<String> = palette.iter().map(|s| to_hex(s.color)).collect();
                println!("{}\t{}", input.display(), line.join(" "));
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&Value::Array(documents))?);
    }

    Ok(())
}
