use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use framecombine_core::io::image_io::{load_image, load_mask};
use framecombine_core::normalize::masked_median;
use ndarray::Array2;

#[derive(Args)]
pub struct InfoArgs {
    /// Input frames
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Mask applied when measuring levels
    #[arg(long)]
    pub mask: Option<PathBuf>,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let mask = args.mask.as_deref().map(load_mask).transpose()?;

    for path in &args.files {
        let frame =
            load_image(path).with_context(|| format!("Failed to load {}", path.display()))?;
        let (h, w) = frame.dim();
        let mask = match &mask {
            Some(m) => m.clone(),
            None => Array2::from_elem((h, w), false),
        };
        let masked = mask.iter().filter(|&&m| m).count();
        let median = masked_median(&frame.view(), &mask.view())
            .with_context(|| format!("Mask does not fit {}", path.display()))?;

        println!("File:        {}", path.display());
        println!("Dimensions:  {}x{}", w, h);
        println!("Masked:      {} px", masked);
        match median {
            Some(m) => println!("Median:      {:.6}", m),
            None => println!("Median:      n/a (fully masked)"),
        }
        println!();
    }

    Ok(())
}
