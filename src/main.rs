//! pagecraft – command-line front end for the pagination engine.
//!
//! Usage:
//!   pagecraft <input> [output.html] [--no-page-breaks] [--font-size N] [--quality N]
//!
//! Markup inputs (.html/.htm) run through the classifier and optimizer;
//! raster inputs (.png/.jpg/.jpeg) run through the analyzer and slicer.
//! The prepared document is written next to the input (`.print.html` suffix)
//! unless an output path is given; resolved backend options and any
//! diagnostics go to stderr.

use std::{env, fs, path::PathBuf, process};

use pagecraft::optimize::Overrides;
use pagecraft::pipeline::{convert_html_bytes, convert_image};

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut overrides = Overrides::default();
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1).peekable();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--no-page-breaks" => overrides.add_page_breaks = Some(false),
            "--font-size" => match iter.next().and_then(|v| v.parse().ok()) {
                Some(v) => overrides.font_size = Some(v),
                None => {
                    eprintln!("--font-size expects a number");
                    process::exit(1);
                }
            },
            "--quality" => match iter.next().and_then(|v| v.parse().ok()) {
                Some(v) => overrides.quality = Some(v),
                None => {
                    eprintln!("--quality expects a number 0-100");
                    process::exit(1);
                }
            },
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if positional == 0 {
                    input_path = Some(PathBuf::from(path));
                } else if positional == 1 {
                    output_path = Some(PathBuf::from(path));
                } else {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                positional += 1;
            }
        }
    }

    let input = match input_path {
        Some(p) => p,
        None => {
            eprintln!("Error: no input file specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    // Default output: same directory + same stem, with a .print.html suffix.
    let output = output_path.unwrap_or_else(|| {
        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        input.with_file_name(format!("{stem}.print.html"))
    });

    let data = match fs::read(&input) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", input.display());
            process::exit(1);
        }
    };

    let name = input
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("input")
        .to_string();

    let extension = input
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    let result = match extension.as_str() {
        "png" | "jpg" | "jpeg" => convert_image(&data, &overrides),
        _ => convert_html_bytes(&data, &name, &overrides),
    };

    match result {
        Ok(directive) => {
            if let Err(e) = fs::write(&output, &directive.html) {
                eprintln!("Error writing '{}': {e}", output.display());
                process::exit(1);
            }
            for diagnostic in &directive.diagnostics {
                eprintln!("note: {diagnostic}");
            }
            let options = serde_json::to_string_pretty(&directive.options)
                .unwrap_or_else(|e| format!("<options serialization failed: {e}>"));
            eprintln!("Backend options:\n{options}");
            eprintln!(
                "Wrote '{}' ({} bytes)",
                output.display(),
                directive.html.len()
            );
        }
        Err(e) => {
            eprintln!("Error preparing '{name}': {e}");
            process::exit(1);
        }
    }
}

fn print_usage(prog: &str) {
    eprintln!("pagecraft – prepare markup or images for A4 print rendering");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <input> [output.html] [--no-page-breaks] [--font-size N] [--quality N]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <input>         Markup (.html/.htm) or image (.png/.jpg/.jpeg) file");
    eprintln!("  [output.html]   Output path  (default: input stem + .print.html)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --no-page-breaks   Disable page-break marker insertion");
    eprintln!("  --font-size N      Base font size in px (overrides the derived default)");
    eprintln!("  --quality N        Re-encode quality 0-100 for image inputs");
    eprintln!("  --help             Print this message");
}
