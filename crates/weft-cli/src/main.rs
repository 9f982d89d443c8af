use clap::{Parser, Subcommand};
use std::path::Path;
use weft_engine::Config;
use weft_syntax::MapMode;

#[derive(Parser)]
#[command(name = "weft")]
#[command(about = "weft — directive-driven stylesheet compiler")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile an input stylesheet to CSS (+ optional source map)
    Build {
        /// Input .css file containing directive markers
        path: String,

        /// Newline-separated utility candidates observed in content
        #[arg(short = 'C', long)]
        candidates: Option<String>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Output path (defaults to <input>.out.css)
        #[arg(short, long)]
        out: Option<String>,

        /// Write an external source map next to the output
        #[arg(long)]
        map: bool,

        /// Embed the source map inline in the output
        #[arg(long)]
        map_inline: bool,

        /// Source map the input arrived with; emitted mappings chain
        /// through it back to the original file
        #[arg(long)]
        prev: Option<String>,
    },

    /// Check an input stylesheet for errors without writing output
    Check {
        /// Input .css file
        path: String,

        /// Newline-separated utility candidates observed in content
        #[arg(short = 'C', long)]
        candidates: Option<String>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            path,
            candidates,
            config,
            out,
            map,
            map_inline,
            prev,
        } => cmd_build(
            &path,
            candidates.as_deref(),
            config.as_deref(),
            out,
            map,
            map_inline,
            prev.as_deref(),
        ),
        Command::Check {
            path,
            candidates,
            config,
        } => cmd_check(&path, candidates.as_deref(), config.as_deref()),
    }
}

fn read_source(path: &str) -> String {
    let p = Path::new(path);
    if !p.exists() {
        eprintln!("Error: file not found: {path}");
        std::process::exit(1);
    }
    match std::fs::read_to_string(p) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error reading {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn read_candidates(path: Option<&str>) -> Vec<String> {
    let Some(path) = path else {
        return Vec::new();
    };
    read_source(path)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

fn read_config(path: Option<&str>) -> Config {
    let Some(path) = path else {
        return Config::default();
    };
    match Config::from_json(&read_source(path)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error parsing config {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn read_prev_map(path: Option<&str>) -> Option<weft_syntax::SourceMap> {
    let path = path?;
    match weft_syntax::SourceMap::from_json(&read_source(path)) {
        Ok(map) => Some(map),
        Err(e) => {
            eprintln!("Error parsing source map {path}: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_build(
    path: &str,
    candidates_path: Option<&str>,
    config_path: Option<&str>,
    out: Option<String>,
    map: bool,
    map_inline: bool,
    prev: Option<&str>,
) {
    let source = read_source(path);
    let candidates = read_candidates(candidates_path);
    let mut config = read_config(config_path);
    let prev_map = read_prev_map(prev);

    // CLI flags win over the config file.
    if map_inline {
        config.map = MapMode::Inline;
    } else if map {
        config.map = MapMode::File;
    }

    let stem = Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("out");
    let dir = Path::new(path).parent().unwrap_or(Path::new("."));
    let out_path = out
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| dir.join(format!("{stem}.out.css")));
    let map_path = out_path.with_extension("css.map");

    let sheet = match weft_syntax::Parser::parse_with_prev(&source, path, prev_map) {
        Ok(sheet) => sheet,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let expanded = match weft_engine::compile(sheet, &candidates, &config) {
        Ok(expanded) => expanded,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let map_file = map_path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string);
    let result = weft_syntax::Printer::print(
        &expanded,
        &weft_syntax::MapOptions {
            mode: config.map,
            file: map_file,
        },
    );

    if let Err(e) = std::fs::write(&out_path, &result.css) {
        eprintln!("Error writing {}: {e}", out_path.display());
        std::process::exit(1);
    }

    if config.map == MapMode::File {
        if let Err(e) = std::fs::write(&map_path, result.map.to_json()) {
            eprintln!("Error writing {}: {e}", map_path.display());
            std::process::exit(1);
        }
    }

    eprintln!("Built: {}", out_path.display());
}

fn cmd_check(path: &str, candidates_path: Option<&str>, config_path: Option<&str>) {
    let source = read_source(path);
    let candidates = read_candidates(candidates_path);
    let config = read_config(config_path);

    if let Err(e) = weft_engine::build(&source, path, &candidates, &config) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    eprintln!("OK: {path}");
}
