use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use framecombine_core::config::{CombineConfig, FrameEntry};
use framecombine_core::stack::sigma_clip::SigmaClipParams;
use framecombine_core::stack::CombineMethod;

#[derive(Args)]
pub struct ConfigArgs {
    /// Write config to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print or save an example job manifest as TOML.
pub fn run(args: &ConfigArgs) -> Result<()> {
    let config = CombineConfig {
        output: PathBuf::from("master_dark"),
        method: CombineMethod::SigmaClip(SigmaClipParams::default()),
        frames: vec![
            FrameEntry::new("dark_001.tiff"),
            FrameEntry::new("dark_002.tiff"),
            FrameEntry::new("dark_003.tiff").with_mask("bad_pixels.png"),
        ],
        ..Default::default()
    };
    let toml_str = toml::to_string_pretty(&config)?;

    if let Some(ref path) = args.output {
        std::fs::write(path, &toml_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Default config saved to {}", path.display());
    } else {
        print!("{}", toml_str);
    }

    Ok(())
}
