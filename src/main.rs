//! leocolor - color a file with Leo/jEdit mode rules and print it

use std::env;
use std::path::{Path, PathBuf};
use std::process;

use log::{info, LevelFilter, Metadata, Record};

use leocolor::display::Display;
use leocolor::error::{ColorizerError, Result};
use leocolor::syntax::{language_for_path, ModeRegistry, NodeId, Outline, BUILTIN_LANGUAGES};
use leocolor::terminal::Terminal;
use leocolor::{Colorizer, Config, HighlightBuffer};

/// Log records go to stderr, filtered by the global max level
struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("leocolor: {}: {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

/// Command line options
#[derive(Debug, Default)]
struct Args {
    file: Option<PathBuf>,
    language: Option<String>,
    modes_dir: Option<PathBuf>,
    config: Option<PathBuf>,
    states: bool,
    line_numbers: bool,
    force_color: bool,
    verbosity: u8,
    help: bool,
    version: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .ok_or_else(|| ColorizerError::Message(format!("{} needs a value", name)))
        };
        match arg.as_str() {
            "--help" | "-h" => parsed.help = true,
            "--version" | "-V" => parsed.version = true,
            "--language" | "-l" => parsed.language = Some(value(arg.as_str())?),
            "--modes-dir" | "-m" => parsed.modes_dir = Some(PathBuf::from(value(arg.as_str())?)),
            "--config" | "-c" => parsed.config = Some(PathBuf::from(value(arg.as_str())?)),
            "--states" => parsed.states = true,
            "--line-numbers" | "-n" => parsed.line_numbers = true,
            "--color" => parsed.force_color = true,
            "-v" | "--verbose" => parsed.verbosity += 1,
            "-vv" => parsed.verbosity += 2,
            "-vvv" => parsed.verbosity += 3,
            _ if arg.starts_with('-') && arg != "-" => {
                return Err(ColorizerError::Message(format!("unknown option {}", arg)));
            }
            _ => {
                if parsed.file.replace(PathBuf::from(&arg)).is_some() {
                    return Err(ColorizerError::Message("only one FILE can be colored".to_string()));
                }
            }
        }
    }
    Ok(parsed)
}

/// A whole file seen as a single outline node
struct FileNode {
    body: String,
    language: Option<String>,
}

impl Outline for FileNode {
    fn body(&self, _node: NodeId) -> &str {
        &self.body
    }

    fn parent(&self, _node: NodeId) -> Option<NodeId> {
        None
    }

    fn file_language(&self, _node: NodeId) -> Option<String> {
        self.language.clone()
    }

    /// Sections defined in the file with `<< name >>=`
    fn section_names(&self, _node: NodeId) -> Vec<String> {
        self.body
            .lines()
            .filter_map(|line| {
                let line = line.trim();
                let name = line.strip_prefix("<<")?.strip_suffix(">>=")?;
                Some(name.trim().to_string())
            })
            .collect()
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    if args.help {
        print_usage();
        return Ok(());
    }
    if args.version {
        print_version();
        return Ok(());
    }
    init_logging(args.verbosity);

    let Some(path) = args.file.as_deref() else {
        print_usage();
        return Err(ColorizerError::Message("no FILE given".to_string()));
    };

    let mut config = match &args.config {
        Some(config_path) => Config::load_from(config_path)?,
        None => Config::load(),
    };
    if args.modes_dir.is_some() {
        config.modes_dir = args.modes_dir.clone();
    }
    if args.line_numbers {
        config.show_line_numbers = true;
    }

    let registry = ModeRegistry::new(config.registry_options());
    let mut colorizer = Colorizer::new(registry, config.scan_options(), &config.default_language);
    let mut buffer = read_buffer(path)?;

    let node = FileNode {
        body: buffer.lines().join("\n"),
        language: args
            .language
            .clone()
            .or_else(|| language_for_path(path).map(str::to_string)),
    };
    colorizer.node_selection_changed(&node, 0);
    info!("coloring {} as {}", path.display(), colorizer.language());
    buffer.recolor_all(&mut colorizer);

    let mut display = Display::new(config.theme());
    display.show_line_numbers = config.show_line_numbers;
    display.show_states = args.states;
    display.tab_width = config.tab_width;

    let mut terminal = Terminal::stdout();
    if args.force_color {
        terminal.set_styled(true);
    }
    display.render(&mut terminal, &buffer, Some(colorizer.states()))
}

/// Read the file to color; `-` reads stdin
fn read_buffer(path: &Path) -> Result<HighlightBuffer> {
    if path == Path::new("-") {
        let text = std::io::read_to_string(std::io::stdin())?;
        return Ok(HighlightBuffer::new(&text));
    }
    Ok(HighlightBuffer::from_file(path)?)
}

fn print_usage() {
    println!("leocolor {} - Leo-style syntax colorizer", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: leocolor [OPTIONS] FILE");
    println!();
    println!("Options:");
    println!("  -l, --language LANG  Language when the file has no @language directive");
    println!("  -m, --modes-dir DIR  Directory of <language>.toml rule tables");
    println!("  -c, --config FILE    Read settings from FILE instead of ~/.leocolor.conf");
    println!("  -n, --line-numbers   Show line numbers");
    println!("      --states         Show each line's ending state");
    println!("      --color          Emit colors even when stdout is not a terminal");
    println!("  -v, --verbose        More diagnostics on stderr (repeat for more)");
    println!("  -h, --help           Show this help message");
    println!("  -V, --version        Show version information");
    println!();
    println!("Built-in languages: {}", BUILTIN_LANGUAGES.join(", "));
}

fn print_version() {
    println!("leocolor {}", env!("CARGO_PKG_VERSION"));
}
