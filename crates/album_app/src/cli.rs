use std::path::PathBuf;

use clap::Parser;

/// Download every photo of a VK album into a resumable run directory.
#[derive(Debug, Parser)]
#[command(name = "album_grabber", version, about)]
pub struct Cli {
    /// Album link, desktop or mobile (e.g. https://vk.com/album-1_2).
    #[arg(short = 'u', long = "album-link")]
    pub album_link: String,

    /// Run directory. Defaults to album_<owner>_<album> in the working directory.
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,

    /// RON file with pipeline settings.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Listing page size.
    #[arg(long, value_parser = parse_positive::<u64>)]
    pub page_size: Option<u64>,

    /// Maximum simultaneous downloads.
    #[arg(long, value_parser = parse_positive::<usize>)]
    pub concurrency: Option<usize>,

    /// Attempts per request, first try included.
    #[arg(long, value_parser = parse_positive::<u32>)]
    pub max_attempts: Option<u32>,

    /// Log debug output.
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_positive<T>(s: &str) -> Result<T, String>
where
    T: std::str::FromStr + PartialEq + Default,
{
    let value: T = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value == T::default() {
        return Err("value must be at least 1".to_string());
    }
    Ok(value)
}
