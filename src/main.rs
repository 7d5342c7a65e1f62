use std::io::Read;

use clap::Parser;

use mda::RenderConfig;

#[derive(Parser)]
#[command(
    name = "mda",
    about = "Render Mermaid graph and sequence diagrams as ASCII/Unicode text"
)]
struct Cli {
    /// Input file (reads from stdin if not provided)
    file: Option<std::path::PathBuf>,

    /// Use plain ASCII glyphs only
    #[arg(long)]
    ascii: bool,

    /// Overlay column/row indices for debugging
    #[arg(long)]
    coords: bool,

    /// Horizontal spacing between node levels
    #[arg(long = "padding-x")]
    padding_x: Option<usize>,

    /// Vertical spacing between node levels
    #[arg(long = "padding-y")]
    padding_y: Option<usize>,

    /// Padding between a node label and its border
    #[arg(long = "border-padding")]
    border_padding: Option<usize>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let input = match cli.file {
        Some(path) => std::fs::read_to_string(&path).unwrap_or_else(|e| {
            eprintln!("ERROR: failed to read {}: {e}", path.display());
            std::process::exit(1);
        }),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).unwrap_or_else(|e| {
                eprintln!("ERROR: failed to read stdin: {e}");
                std::process::exit(1);
            });
            buf
        }
    };

    let defaults = RenderConfig::default();
    let config = RenderConfig {
        use_ascii: cli.ascii,
        show_coords: cli.coords,
        padding_between_x: cli.padding_x.unwrap_or(defaults.padding_between_x),
        padding_between_y: cli.padding_y.unwrap_or(defaults.padding_between_y),
        box_border_padding: cli.border_padding.unwrap_or(defaults.box_border_padding),
        ..defaults
    };

    match mda::try_render(&input, &config) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    }
}
