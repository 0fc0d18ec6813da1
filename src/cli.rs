use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "bookchapters",
    version,
    about = "Extract chapter page ranges from PDF books"
)]
pub struct Cli {
    pub pdf_file: PathBuf,

    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
