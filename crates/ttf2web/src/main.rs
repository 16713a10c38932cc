//! CLI for `ttf2web`.

use std::{error::Error as StdError, io::Write, path::PathBuf, process};

use clap::Parser;
use log::LevelFilter;
use ttf2web::{FontStyle, Options, Ttf2Web};

/// Splits a TrueType font into WOFF2 subsets for the web and generates a CSS stylesheet
/// referencing them.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// TrueType font to split into WOFF2 subsets.
    #[arg(value_name = "FONT")]
    font: PathBuf,
    /// File with Unicode subsets. Each line of the file should contain 2 fields separated
    /// by whitespace: the subset name and its Unicode ranges, e.g. `greek U+0370-03FF,U+1F00-1FFF`.
    /// If not specified, a built-in set of subsets for common scripts is used.
    #[arg(long, value_name = "PATH")]
    unicode_ranges: Option<PathBuf>,
    /// Print more details, such as the number of glyphs in each subset.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,
    /// Do not print generated files.
    #[arg(short, long)]
    quiet: bool,
    /// Directory to write WOFF2 files to.
    #[arg(long, value_name = "DIR", default_value = Options::DEFAULT_ASSET_DIR)]
    asset_dir: PathBuf,
    /// Path to the generated CSS file. By default, it's the font file name with the `.css`
    /// extension, placed in the working directory.
    #[arg(long = "css", value_name = "PATH")]
    css_path: Option<PathBuf>,
    /// Value of the `font-style` descriptor. By default, it's derived from the font subfamily.
    #[arg(long, value_enum)]
    font_style: Option<FontStyle>,
    /// Value of the `font-weight` descriptor, e.g. `300`. By default, it's derived
    /// from the font subfamily.
    #[arg(long, value_name = "WEIGHT")]
    font_weight: Option<String>,
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Off
        } else if self.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        }
    }

    fn init_logging(&self) {
        env_logger::Builder::new()
            .filter_level(self.log_level())
            .parse_default_env()
            .format(|buf, record| writeln!(buf, "{}", record.args()))
            .target(env_logger::Target::Stdout)
            .init();
    }

    fn into_options(self) -> Options {
        let mut options = Options::new(self.font);
        options.catalog_path = self.unicode_ranges;
        options.asset_dir = self.asset_dir;
        options.css_path = self.css_path;
        options.font_style = self.font_style;
        options.font_weight = self.font_weight;
        options
    }
}

fn report_error(err: &dyn StdError) {
    eprintln!("error: {err}");
    let mut source = err.source();
    while let Some(err) = source {
        eprintln!("caused by: {err}");
        source = err.source();
    }
}

fn main() {
    let cli = Cli::parse();
    cli.init_logging();

    let result = Ttf2Web::new(cli.into_options()).and_then(|converter| converter.run());
    if let Err(err) = result {
        report_error(&err);
        process::exit(1);
    }
}
