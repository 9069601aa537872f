use std::fmt::Display;

use console::Style;
use framecombine_core::config::CombineConfig;
use framecombine_core::stack::CombineMethod;

/// Indented label/value printer for the pre-run banner.
struct Printer {
    heading: Style,
    label: Style,
    emphasis: Style,
    muted: Style,
}

impl Printer {
    fn new() -> Self {
        Self {
            heading: Style::new().cyan().bold(),
            label: Style::new().dim(),
            emphasis: Style::new().bold(),
            muted: Style::new().dim().yellow(),
        }
    }

    fn banner(&self, text: &str) {
        println!();
        println!("  {}", self.heading.apply_to(text));
        println!("  {}", self.heading.apply_to("\u{2550}".repeat(text.len())));
        println!();
    }

    fn section(&self, name: &str) {
        println!("  {}", self.heading.apply_to(name));
    }

    fn row(&self, label: &str, value: impl Display) {
        println!("    {:<12}{}", self.label.apply_to(label), self.emphasis.apply_to(value));
    }

    fn muted_row(&self, label: &str, value: impl Display) {
        println!("    {:<12}{}", self.label.apply_to(label), self.muted.apply_to(value));
    }
}

pub fn print_combine_summary(config: &CombineConfig) {
    let p = Printer::new();
    p.banner("Frame Combine");

    p.section("Output");
    p.row("Prefix", config.output.display());
    p.row("Format", config.format);
    println!();

    p.section("Method");
    p.row("Function", &config.method);
    for (label, value) in method_rows(&config.method) {
        p.row(label, value);
    }
    p.row("Normalize", config.normalization);
    println!();

    let total = config.frames.len();
    let masked = config.frames.iter().filter(|f| f.mask.is_some()).count();
    p.section("Frames");
    p.row("Count", total);
    match masked {
        0 => p.muted_row("Masks", "none"),
        n => p.row("Masks", format!("{n} of {total}")),
    }
    if config.frames.iter().any(|f| f.weight != 1.0) {
        let weights: Vec<String> = config
            .frames
            .iter()
            .map(|f| format!("{:.2}", f.weight))
            .collect();
        p.row("Weights", weights.join(", "));
    }
    println!();
}

/// Parameter rows shown under the method name.
fn method_rows(method: &CombineMethod) -> Vec<(&'static str, String)> {
    match method {
        CombineMethod::SigmaClip(params) => vec![
            (
                "Sigma",
                format!("-{:.1} / +{:.1}", params.sigma_low, params.sigma_high),
            ),
            ("Iterations", params.iterations.to_string()),
        ],
        CombineMethod::MinMax(params) => vec![(
            "Reject",
            format!("{} low, {} high", params.nlow, params.nhigh),
        )],
        CombineMethod::Mean | CombineMethod::Median => Vec::new(),
    }
}
