use clap::Parser;

use crate::aa01::OverwritePolicy;

#[derive(Parser, Debug)]
#[command(name = "aa01")]
#[command(version)]
#[command(about = "AA01 firmware-patch archive lister and extractor", long_about = None)]
#[command(after_help = "Examples:\n  \
  aa01 patch.aa                       list every record in patch.aa\n  \
  aa01 -d out patch.aa                extract file contents into out/\n  \
  aa01 -p patch.aa | less             send file contents via pipe into less\n  \
  aa01 https://example.com/patch.aa   list a remote archive")]
pub struct Cli {
    /// AA01 file paths or HTTP URLs
    #[arg(value_name = "FILES", required = true)]
    pub files: Vec<String>,

    /// Extract files into savedir
    #[arg(short = 'd', long = "savedir", value_name = "DIR")]
    pub savedir: Option<String>,

    /// Extract files to pipe, no messages
    #[arg(short = 'p', conflicts_with = "savedir")]
    pub pipe: bool,

    /// Exclude archive paths matching a pattern (repeatable)
    #[arg(short = 'x', value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Verbose log output (-vv => trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn is_http_url(file: &str) -> bool {
        file.starts_with("http://") || file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    pub fn overwrite_policy(&self) -> OverwritePolicy {
        if self.never_overwrite {
            OverwritePolicy::Never
        } else {
            OverwritePolicy::Always
        }
    }

    /// Default log filter, used when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        match (self.verbose, self.quiet) {
            (0, 0) => "warn",
            (0, _) => "error",
            (1, _) => "debug",
            _ => "trace",
        }
    }
}
