//! Command line interface.
//!
//! `merge` is the standalone tool, `post-build` and `describe` are the hooks
//! a build orchestrator calls after and before compiling.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use flashmerge::{
    DefinesFormat, Error, Git, Layout, MetadataOptions, Version, describe_with, merge_files,
    sources_from_build_dir, sources_from_paths,
};

use super::parse_util::parse_size;

pub const DEFAULT_OUTPUT: &str = "merged_firmware.bin";

#[derive(clap::Parser)]
#[clap(
    name = "flashmerge",
    about = "Merge bootloader, partition table and application into one flashable image",
    version
)]
pub struct Cli {
    /// Only report warnings and errors
    #[clap(short, long, global = true)]
    pub quiet: bool,

    /// More output; repeat for trace level
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand)]
pub enum Command {
    /// Merge segment files into a single image
    #[clap(
        override_usage = "flashmerge merge [OPTIONS] <BOOTLOADER> <PARTITION_TABLE> <APPLICATION> [OUTPUT]"
    )]
    Merge(MergeCmd),
    /// Merge the artifacts of a finished build (post-build hook)
    PostBuild(PostBuildCmd),
    /// Print build metadata as compiler definitions (pre-build hook)
    Describe(DescribeCmd),
}

impl Cli {
    pub fn run(self) -> Result<(), Error> {
        match self.command {
            Command::Merge(cmd) => cmd.run(),
            Command::PostBuild(cmd) => cmd.run(),
            Command::Describe(cmd) => cmd.run(),
        }
    }

    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "flashmerge=warn";
        }
        match self.verbose {
            0 => "flashmerge=info",
            1 => "flashmerge=debug",
            _ => "flashmerge=trace",
        }
    }
}

#[derive(clap::Args)]
pub struct LayoutOpts {
    /// Segment layout in TOML; defaults to bootloader@0x0, partition table@0x8000, application@0x10000
    #[clap(long, env = "FLASHMERGE_LAYOUT", value_name = "FILE")]
    pub layout: Option<PathBuf>,

    /// Total flash size, e.g. 16M, 4MiB or 0x400000
    #[clap(long, env = "FLASHMERGE_FLASH_SIZE", value_parser = parse_size, value_name = "SIZE")]
    pub flash_size: Option<u32>,

    /// Erase sector size the output is padded to
    #[clap(long, value_parser = parse_size, value_name = "SIZE")]
    pub sector_size: Option<u32>,
}

impl LayoutOpts {
    pub fn resolve(&self) -> Result<Layout, Error> {
        let mut layout = match &self.layout {
            Some(path) => Layout::load(path)?,
            None => Layout::default(),
        };
        if let Some(capacity) = self.flash_size {
            layout.capacity = capacity;
        }
        if let Some(sector_size) = self.sector_size {
            layout.sector_size = sector_size;
        }
        layout.validate()?;
        log::debug!(
            "Layout: {} segments, capacity {:#X}, sector {:#X}",
            layout.slots.len(),
            layout.capacity,
            layout.sector_size
        );
        Ok(layout)
    }
}

#[derive(clap::Args)]
pub struct MergeCmd {
    #[clap(flatten)]
    pub layout: LayoutOpts,

    /// One file per layout segment in layout order, then an optional output path
    #[clap(required = true, num_args = 1.., value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

impl MergeCmd {
    fn run(self) -> Result<(), Error> {
        let layout = self.layout.resolve()?;
        let (inputs, output) = split_output(&self.files, layout.slots.len());
        let sources = sources_from_paths(&layout, inputs)?;
        let report = merge_files(&sources, layout.geometry(), &output)?;
        log::info!("Success! Merged firmware: {}", report.output.display());
        Ok(())
    }
}

/// Trailing path beyond the segment count is the output.
fn split_output(files: &[PathBuf], segments: usize) -> (&[PathBuf], PathBuf) {
    if files.len() == segments + 1 {
        let (inputs, output) = files.split_at(segments);
        (inputs, output[0].clone())
    } else {
        (files, PathBuf::from(DEFAULT_OUTPUT))
    }
}

#[derive(clap::Args)]
pub struct PostBuildCmd {
    #[clap(flatten)]
    pub layout: LayoutOpts,

    /// Directory holding the build artifacts
    #[clap(long, value_name = "DIR")]
    pub build_dir: PathBuf,

    /// Project root; the image goes to <project-dir>/build/<name>_merged.bin
    #[clap(long, value_name = "DIR")]
    pub project_dir: PathBuf,

    /// Image name
    #[clap(long, default_value = "firmware")]
    pub name: String,

    /// Bootloader used when the build did not produce one
    #[clap(long, value_name = "FILE")]
    pub fallback_bootloader: Option<PathBuf>,

    /// Write the image here instead
    #[clap(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl PostBuildCmd {
    fn run(self) -> Result<(), Error> {
        let layout = self.layout.resolve()?;
        let mut sources = sources_from_build_dir(&layout, &self.build_dir);
        if let Some(fallback) = &self.fallback_bootloader {
            for source in sources.iter_mut().filter(|s| s.slot.label == "bootloader") {
                source.candidates.push(fallback.clone());
            }
        }

        let output = self
            .output
            .clone()
            .unwrap_or_else(|| default_post_build_output(&self.project_dir, &self.name));
        let report = merge_files(&sources, layout.geometry(), &output)?;
        log::info!(
            "[{}] Merged firmware created: {}",
            self.name,
            report.output.display()
        );
        Ok(())
    }
}

fn default_post_build_output(project_dir: &Path, name: &str) -> PathBuf {
    project_dir.join("build").join(format!("{name}_merged.bin"))
}

#[derive(clap::Args)]
pub struct DescribeCmd {
    /// cflags, cargo, header or env
    #[clap(long, default_value = "cflags")]
    pub format: DefinesFormat,

    /// Prefix for define names
    #[clap(long, default_value = flashmerge::metadata::DEFAULT_PREFIX)]
    pub prefix: String,

    /// Firmware version triple
    #[clap(long, default_value = "1.0.0", value_name = "MAJOR.MINOR.PATCH")]
    pub firmware_version: Version,

    /// Repository to query; defaults to the working directory
    #[clap(long, value_name = "DIR")]
    pub repo: Option<PathBuf>,

    /// Write to a file instead of stdout
    #[clap(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl DescribeCmd {
    fn run(self) -> Result<(), Error> {
        let options = MetadataOptions {
            prefix: self.prefix,
            version: self.firmware_version,
        };
        options.validate()?;

        let git = self.repo.as_deref().map(Git::in_dir).unwrap_or_default();
        let metadata = describe_with(&git, Local::now(), &options);
        metadata.log_summary();

        match &self.output {
            Some(path) => metadata.write_to(path, self.format)?,
            None => std::io::stdout().write_all(metadata.render(self.format).as_bytes())?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn test_split_output_with_output() {
        let files: Vec<PathBuf> = ["b.bin", "p.bin", "a.bin", "out.bin"]
            .iter()
            .map(PathBuf::from)
            .collect();
        let (inputs, output) = split_output(&files, 3);
        assert_eq!(inputs.len(), 3);
        assert_eq!(output, PathBuf::from("out.bin"));
    }

    #[test]
    fn test_split_output_default() {
        let files: Vec<PathBuf> = ["b.bin", "p.bin", "a.bin"].iter().map(PathBuf::from).collect();
        let (inputs, output) = split_output(&files, 3);
        assert_eq!(inputs.len(), 3);
        assert_eq!(output, PathBuf::from(DEFAULT_OUTPUT));
    }

    #[test]
    fn test_default_post_build_output() {
        assert_eq!(
            default_post_build_output(Path::new("/proj"), "badge"),
            PathBuf::from("/proj/build/badge_merged.bin")
        );
    }

    #[test]
    fn test_parse_merge_args() {
        let cli = Cli::try_parse_from([
            "flashmerge",
            "merge",
            "--flash-size",
            "4M",
            "b.bin",
            "p.bin",
            "a.bin",
        ])
        .unwrap();
        let Command::Merge(cmd) = cli.command else {
            panic!("expected merge");
        };
        assert_eq!(cmd.layout.flash_size, Some(4 * 1024 * 1024));
        assert_eq!(cmd.files.len(), 3);
        assert_eq!(cmd.layout.resolve().unwrap().capacity, 4 * 1024 * 1024);
    }

    #[test]
    fn test_parse_describe_args() {
        let cli = Cli::try_parse_from([
            "flashmerge",
            "-q",
            "describe",
            "--format",
            "header",
            "--firmware-version",
            "2.1.0",
        ])
        .unwrap();
        assert_eq!(cli.log_filter(), "flashmerge=warn");
        let Command::Describe(cmd) = cli.command else {
            panic!("expected describe");
        };
        assert_eq!(cmd.format, DefinesFormat::Header);
        assert_eq!(cmd.firmware_version, Version::new(2, 1, 0));
        assert_eq!(cmd.prefix, "FIRMWARE");
    }

    #[test]
    fn test_parse_rejects_bad_size() {
        assert!(
            Cli::try_parse_from(["flashmerge", "merge", "--flash-size", "lots", "a.bin"]).is_err()
        );
    }

    #[test]
    fn test_resolve_rejects_unaligned_flash_size() {
        let opts = LayoutOpts {
            layout: None,
            flash_size: Some(0x10001),
            sector_size: None,
        };
        assert!(opts.resolve().is_err());
    }
}
