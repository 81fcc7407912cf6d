//! Build script for generating the `docker-machine-driver-selectel` man page.
//!
//! Packaging picks the page up from the build output directory.

use std::env;
use std::fs::File;
use std::io::Write;

use camino::Utf8PathBuf;
use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

use cli::Cli;

const MAN_PAGE: &str = "docker-machine-driver-selectel.1";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = std::io::stdout();
    writeln!(stdout, "cargo:rerun-if-changed=build.rs")?;
    writeln!(stdout, "cargo:rerun-if-changed=src/cli/mod.rs")?;

    let out_dir = Utf8PathBuf::from(env::var("OUT_DIR")?);

    let mut buffer = Vec::new();
    Man::new(Cli::command()).render(&mut buffer)?;

    let mut file = File::create(out_dir.join(MAN_PAGE))?;
    file.write_all(&buffer)?;

    Ok(())
}
