use clap::{Parser, Subcommand, ValueEnum};
use diary_gal::config::{self, GalleryMode, SourceConfig};
use diary_gal::error::Error;
use diary_gal::export::{self, ImportOptions};
use diary_gal::gallery::{self, CreateOptions, GalleryOptions};
use diary_gal::imaging::{self, NativeBackend};
use diary_gal::index::DateSelection;
use diary_gal::output;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "diary-gal")]
#[command(about = "Static photo galleries from a markdown diary and a media directory")]
#[command(long_about = "\
Static photo galleries from a markdown diary and a media directory

The gallery root holds the diary and its configuration; pages and
thumbnails are written next to them unless --dest says otherwise.

  trip/
  ├── index.md                     # Diary (records separated by ______)
  ├── config.toml                  # Optional, see 'diary-gal gen-config'
  ├── 2020-01-12-1.jpg             # Images written in the diary
  ├── index.htm                    # Generated page
  ├── Lisbonne.htm                 # Generated subdirectory page (--by-dir)
  ├── photobox/                    # Viewer assets (photobox.css, jquery)
  └── .thumbnails/                 # Thumbnail cache

Diary records:

  [2020/01/12]                     # Optional date marker
  ###### Dimanche 12 janvier       # Title, gives day and month
  Text of the post, in markdown.
  ![](2020-01-12-1.jpg)            # Image, optionally followed by a caption
  [](2020-01-12-2.mp4)             # Video
  ______

Posts without a date take the date of the previous one. The year comes
from the photos' capture dates, or from --year.")]
#[command(version = version_string())]
struct Cli {
    /// Gallery root (holds index.md and config.toml)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    /// Diary records, merged with the media directory if any
    Diary,
    /// One post per date of the media directory
    Bydate,
    /// All media of the directory in one post
    Flat,
}

impl From<Mode> for GalleryMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Diary => GalleryMode::Diary,
            Mode::Bydate => GalleryMode::ByDate,
            Mode::Flat => GalleryMode::Flat,
        }
    }
}

#[derive(clap::Args)]
struct GalleryArgs {
    /// Media directory
    #[arg(long)]
    source_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "diary")]
    mode: Mode,

    /// One page per subdirectory (bydate and flat modes)
    #[arg(long)]
    by_dir: bool,

    /// Include media of subdirectories
    #[arg(long)]
    recursive: bool,

    /// Media dates to show: diary, source, or YYYYMMDD-YYYYMMDD
    #[arg(long, default_value = "source")]
    dates: String,

    /// Output directory (defaults to the gallery root)
    #[arg(long)]
    dest: Option<PathBuf>,

    /// Regenerate every thumbnail
    #[arg(long)]
    force_thumb: bool,

    /// Rebuild with the [source] settings saved by the previous run
    #[arg(long)]
    update: bool,

    /// Year of the diary posts
    #[arg(long)]
    year: Option<i32>,

    /// Every diary record must start with a [YYYY/MM/DD] marker
    #[arg(long)]
    require_dates: bool,
}

impl GalleryArgs {
    fn source(&self) -> SourceConfig {
        SourceConfig {
            source_dir: self.source_dir.clone(),
            mode: self.mode.into(),
            by_dir: self.by_dir,
            recursive: self.recursive,
            dates: self.dates.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Build the gallery pages and thumbnails
    Gallery(GalleryArgs),
    /// Write a diary skeleton with one record per media date
    Create {
        /// Media directory
        #[arg(long)]
        source_dir: PathBuf,
        /// Dates to include: source or YYYYMMDD-YYYYMMDD
        #[arg(long, default_value = "source")]
        dates: String,
        /// Include media of subdirectories
        #[arg(long)]
        recursive: bool,
    },
    /// Convert a structured JSON export (posts/*.json) into a diary
    Import {
        /// Export directory
        input: PathBuf,
        /// Diary directory (defaults to the gallery root)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Year of the posts
        #[arg(long)]
        year: Option<i32>,
        /// Give the copied media their sequential names
        #[arg(long)]
        rename: bool,
    },
    /// Give the diary images their sequential names and rewrite the diary
    Rename {
        /// Year of the posts
        #[arg(long)]
        year: Option<i32>,
    },
    /// Parse the diary and print it back (round-trip check)
    Idem {
        /// Output directory (defaults to the gallery root)
        #[arg(long)]
        dest: Option<PathBuf>,
        /// Every record must start with a [YYYY/MM/DD] marker
        #[arg(long)]
        require_dates: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("diary-gal: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let root = cli.root;
    match cli.command {
        Command::Gallery(args) => {
            let mut config = config::load_config(&root)?;
            if !args.update {
                config.source = args.source();
                config.validate()?;
                config::save_source(&root, &config.source)?;
            }
            config.diary.require_dates |= args.require_dates;
            init_thread_pool(&config.processing);
            imaging::check_tools()?;

            let options = GalleryOptions {
                dest: args.dest.unwrap_or_else(|| root.clone()),
                root,
                year: args.year,
                force_thumbnails: args.force_thumb,
            };
            let report = gallery::build(&NativeBackend::new(), &options, &config)?;
            output::print_gallery_report(&report, &options.dest);
        }
        Command::Create {
            source_dir,
            dates,
            recursive,
        } => {
            let config = config::load_config(&root)?;
            init_thread_pool(&config.processing);
            let (path, records) = gallery::create_diary(&CreateOptions {
                source_dir,
                root,
                dates: dates.parse::<DateSelection>()?,
                recursive,
                locale: config.diary.locale,
            })?;
            output::print_created_diary(&path, records);
        }
        Command::Import {
            input,
            output: dest,
            year,
            rename,
        } => {
            let config = config::load_config(&root)?;
            let report = export::import(&ImportOptions {
                input,
                output: dest.unwrap_or(root),
                year,
                rename,
                locale: config.diary.locale,
            })?;
            output::print_import_report(&report);
        }
        Command::Rename { year } => {
            let config = config::load_config(&root)?;
            init_thread_pool(&config.processing);
            let report = gallery::rename_diary_media(&root, year, &config.diary)?;
            output::print_rename_report(&report);
        }
        Command::Idem {
            dest,
            require_dates,
        } => {
            let config = config::load_config(&root)?;
            let dest = dest.unwrap_or_else(|| root.clone());
            let strict = require_dates || config.diary.require_dates;
            let path = gallery::idem(&root, &dest, strict)?;
            output::print_idem(&path);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }
    Ok(())
}

/// Log to stderr, `diary_gal=info` unless `RUST_LOG` says otherwise.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("diary_gal=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// `max_processes` can lower the thread count below the core count, never raise it.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
