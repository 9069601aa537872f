use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use framecombine_core::combine::CombineOptions;
use framecombine_core::config::{CombineConfig, FrameEntry, OutputFormat};
use framecombine_core::io::image_io::{load_image, load_mask, save_result};
use framecombine_core::normalize::Normalization;
use framecombine_core::stack::minmax::MinMaxParams;
use framecombine_core::stack::sigma_clip::SigmaClipParams;
use framecombine_core::stack::CombineMethod;
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::Array2;
use tracing::info;

use crate::summary::print_combine_summary;

#[derive(Clone, Copy, ValueEnum)]
pub enum MethodArg {
    Mean,
    Median,
    SigmaClip,
    MinMax,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum NormalizeArg {
    None,
    Zero,
    Scale,
    Unit,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Tiff,
    Png,
}

#[derive(Args)]
pub struct CombineArgs {
    /// Input frames
    #[arg(required_unless_present = "config")]
    pub files: Vec<PathBuf>,

    /// TOML job manifest (replaces all other options)
    #[arg(short, long, conflicts_with = "files")]
    pub config: Option<PathBuf>,

    /// Mask image; nonzero pixels are excluded. Give once for all frames or once per frame
    #[arg(long = "mask")]
    pub masks: Vec<PathBuf>,

    /// Per-frame weights, comma separated
    #[arg(long, value_delimiter = ',')]
    pub weights: Vec<f64>,

    /// Combine method
    #[arg(long, value_enum, default_value = "mean")]
    pub method: MethodArg,

    /// Low rejection threshold in standard deviations (sigma-clip)
    #[arg(long, default_value = "3.0")]
    pub sigma_low: f32,

    /// High rejection threshold in standard deviations (sigma-clip)
    #[arg(long, default_value = "3.0")]
    pub sigma_high: f32,

    /// Maximum rejection passes (sigma-clip)
    #[arg(long, default_value = "3")]
    pub iterations: usize,

    /// Lowest samples dropped per pixel (min-max)
    #[arg(long, default_value = "1")]
    pub nlow: usize,

    /// Highest samples dropped per pixel (min-max)
    #[arg(long, default_value = "1")]
    pub nhigh: usize,

    /// Level matching applied before combining
    #[arg(long, value_enum, default_value = "none")]
    pub normalize: NormalizeArg,

    /// Output image format
    #[arg(long, value_enum, default_value = "tiff")]
    pub format: FormatArg,

    /// Output prefix; writes <prefix>_value, <prefix>_variance, <prefix>_count
    #[arg(short, long, default_value = "combined")]
    pub output: PathBuf,
}

pub fn run(args: &CombineArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => config_from_args(args)?,
    };
    config.validate()?;
    print_combine_summary(&config);

    let (frames, masks) = load_stack(&config)?;
    let images: Vec<_> = frames.iter().map(|f| f.view()).collect();
    let mask_views: Vec<_> = masks.iter().map(|m| m.view()).collect();

    let factors = config.resolve_factors(&images, &mask_views)?;
    info!(normalization = %config.normalization, "Frame factors resolved");

    println!("Combining ({})...", config.method);
    let result =
        config
            .method
            .combine_owned(&images, &mask_views, &factors, &CombineOptions::default())?;

    if result.blank > 0 {
        println!("{} pixels had no unmasked samples", result.blank);
    }

    let paths = save_result(&result, &config.output, config.format.extension())?;
    for path in &paths {
        println!("Saved to {}", path.display());
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<CombineConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let mut config: CombineConfig = toml::from_str(&text)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    if let Some(base) = path.parent() {
        config.resolve_paths(base);
    }
    Ok(config)
}

fn config_from_args(args: &CombineArgs) -> Result<CombineConfig> {
    let n = args.files.len();
    if n == 0 {
        bail!("No input frames given");
    }
    if !(args.masks.is_empty() || args.masks.len() == 1 || args.masks.len() == n) {
        bail!(
            "Got {} masks for {} frames; give one shared mask or one per frame",
            args.masks.len(),
            n
        );
    }
    if !(args.weights.is_empty() || args.weights.len() == n) {
        bail!("Got {} weights for {} frames", args.weights.len(), n);
    }

    let frames = args
        .files
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let mut entry = FrameEntry::new(path.clone());
            entry.mask = match args.masks.len() {
                0 => None,
                1 => Some(args.masks[0].clone()),
                _ => Some(args.masks[i].clone()),
            };
            if let Some(&w) = args.weights.get(i) {
                entry.weight = w;
            }
            entry
        })
        .collect();

    let method = match args.method {
        MethodArg::Mean => CombineMethod::Mean,
        MethodArg::Median => CombineMethod::Median,
        MethodArg::SigmaClip => CombineMethod::SigmaClip(SigmaClipParams {
            sigma_low: args.sigma_low,
            sigma_high: args.sigma_high,
            iterations: args.iterations,
        }),
        MethodArg::MinMax => CombineMethod::MinMax(MinMaxParams {
            nlow: args.nlow,
            nhigh: args.nhigh,
        }),
    };

    let normalization = match args.normalize {
        NormalizeArg::None => Normalization::None,
        NormalizeArg::Zero => Normalization::Zero,
        NormalizeArg::Scale => Normalization::Scale,
        NormalizeArg::Unit => Normalization::Unit,
    };

    let format = match args.format {
        FormatArg::Tiff => OutputFormat::Tiff,
        FormatArg::Png => OutputFormat::Png,
    };

    Ok(CombineConfig {
        output: args.output.clone(),
        format,
        normalization,
        method,
        frames,
    })
}

fn load_stack(config: &CombineConfig) -> Result<(Vec<Array2<f32>>, Vec<Array2<bool>>)> {
    let total = config.frames.len();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("Loading [{bar:40}] {pos}/{len}")?
            .progress_chars("=> "),
    );

    let mut frames = Vec::with_capacity(total);
    let mut masks = Vec::with_capacity(total);
    let mut mask_cache: HashMap<PathBuf, Array2<bool>> = HashMap::new();

    for (i, entry) in config.frames.iter().enumerate() {
        let frame = load_image(&entry.path)
            .with_context(|| format!("Failed to load frame {}", entry.path.display()))?;

        let mask = match &entry.mask {
            Some(path) => {
                if !mask_cache.contains_key(path) {
                    let loaded = load_mask(path)
                        .with_context(|| format!("Failed to load mask {}", path.display()))?;
                    mask_cache.insert(path.clone(), loaded);
                }
                mask_cache[path].clone()
            }
            None => Array2::from_elem(frame.raw_dim(), false),
        };

        frames.push(frame);
        masks.push(mask);
        pb.set_position(i as u64 + 1);
    }
    pb.finish();

    Ok((frames, masks))
}
