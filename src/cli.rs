use clap::Parser;

use crate::asar::{HeaderBoundary, OpenOptions};

#[derive(Parser, Debug)]
#[command(name = "asarfs")]
#[command(version)]
#[command(about = "List and extract files from ASAR archives", long_about = None)]
#[command(after_help = "Examples:\n  \
  asarfs app.asar -x node_modules      extract everything except node_modules\n  \
  asarfs -p app.asar package.json      print package.json to stdout\n  \
  asarfs -l -e ks app.asar             list every .ks script in the archive")]
pub struct Cli {
    /// ASAR archive path
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Files to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely (size, offset, flags)
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Only files with this extension
    #[arg(short = 'e', long = "ext", value_name = "EXT")]
    pub extension: Option<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Data section starts right after the header (conventional layout)
    #[arg(long = "exact-boundary")]
    pub exact_boundary: bool,

    /// Build the entry tree on a single thread
    #[arg(long = "sequential")]
    pub sequential: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Archive open options selected on the command line
    pub fn open_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        if self.exact_boundary {
            options.boundary(HeaderBoundary::Exact);
        }
        if self.sequential {
            options.parallel(false);
        }
        options
    }
}
