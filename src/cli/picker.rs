//! Interactive price CSV picker.
//!
//! Used when a simulation command runs in a terminal with neither `--data`
//! nor `SPD_DATA`. Candidates are `*.csv` files below the working directory;
//! each one's header is sniffed so files without `date`/close columns are
//! listed but cannot be chosen.

use std::fs::{self, File};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::io::ingest::check_price_header;

const SEARCH_DEPTH: usize = 4;
const SKIP_DIRS: [&str; 3] = [".git", "target", "node_modules"];

/// A CSV file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceFile {
    pub path: PathBuf,
    pub bytes: u64,
    /// Header has a `date` column and a close column.
    pub usable: bool,
}

impl PriceFile {
    fn inspect(path: PathBuf) -> Self {
        let bytes = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let usable = File::open(&path)
            .map_err(|e| AppError::new(2, e.to_string()))
            .and_then(check_price_header)
            .is_ok();
        Self { path, bytes, usable }
    }

    fn label(&self) -> String {
        let shown = self.path.strip_prefix("./").unwrap_or(&self.path).display();
        let size = if self.bytes >= 1 << 20 {
            format!("{:.1} MiB", self.bytes as f64 / f64::from(1u32 << 20))
        } else {
            format!("{:.1} KiB", self.bytes as f64 / 1024.0)
        };
        let note = if self.usable { "" } else { "  (no date/close columns)" };
        format!("{shown:<48} {size:>10}{note}")
    }
}

/// Ask for a price file on stdin/stdout.
pub fn prompt_for_csv_path() -> Result<PathBuf, AppError> {
    let files = discover_price_files(Path::new("."), SEARCH_DEPTH);
    log::debug!(
        "picker: {} csv files, {} usable",
        files.len(),
        files.iter().filter(|f| f.usable).count()
    );
    if !files.iter().any(|f| f.usable) {
        return Err(AppError::new(
            2,
            "No price CSV found here. Pass `--data <prices.csv>` or set SPD_DATA.",
        ));
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    choose(&files, &mut stdin.lock(), &mut stdout)
}

/// Menu loop over any input/output pair.
fn choose<R: BufRead, W: Write>(files: &[PriceFile], input: &mut R, out: &mut W) -> Result<PathBuf, AppError> {
    let io_err = |e: io::Error| AppError::new(2, format!("Terminal I/O failed: {e}"));

    writeln!(out, "Price files:").map_err(io_err)?;
    for (n, file) in files.iter().enumerate() {
        writeln!(out, "{:>3}) {}", n + 1, file.label()).map_err(io_err)?;
    }

    loop {
        write!(out, "Pick 1-{} or enter a path (q quits): ", files.len()).map_err(io_err)?;
        out.flush().map_err(io_err)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(io_err)? == 0 {
            return Err(AppError::new(2, "No selection made (end of input)."));
        }
        let answer = line.trim();
        if answer.is_empty() {
            continue;
        }
        if answer.eq_ignore_ascii_case("q") {
            return Err(AppError::new(2, "Canceled."));
        }

        let picked = match answer.parse::<usize>() {
            Ok(n) => match n.checked_sub(1).and_then(|i| files.get(i)) {
                Some(file) => validate_csv_path(&file.path),
                None => Err(AppError::new(2, format!("No entry {n}."))),
            },
            Err(_) => validate_csv_path(Path::new(answer)),
        };
        match picked {
            Ok(path) => return Ok(path),
            Err(err) => writeln!(out, "{err}").map_err(io_err)?,
        }
    }
}

/// A path is acceptable when it is a `.csv` file with price columns.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !has_csv_extension(path) {
        return Err(AppError::new(
            2,
            format!("Not a .csv file: {}", path.display()),
        ));
    }
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Cannot open {}: {e}", path.display())))?;
    check_price_header(file).map_err(|e| AppError::new(2, format!("{}: {e}", path.display())))?;
    Ok(path.to_path_buf())
}

/// CSV files below `root`, sorted by path.
pub fn discover_price_files(root: &Path, max_depth: usize) -> Vec<PriceFile> {
    let mut paths = Vec::new();
    walk(root, max_depth, &mut paths);
    paths.sort();
    paths.into_iter().map(PriceFile::inspect).collect()
}

fn walk(dir: &Path, depth_left: usize, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(kind) = entry.file_type() else {
            continue;
        };
        if kind.is_dir() {
            let skip = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| SKIP_DIRS.contains(&n));
            if depth_left > 0 && !skip {
                walk(&path, depth_left - 1, out);
            }
        } else if kind.is_file() && has_csv_extension(&path) {
            out.push(path);
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
