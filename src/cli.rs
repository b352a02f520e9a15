use crate::config::{LogLevel, Settings};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdfsplit")]
#[command(about = "Split PDF documents into page-range sub-documents, interactively over MCP or from the shell")]
#[command(version)]
pub struct Cli {
    /// Log verbosity (written to stderr)
    #[arg(long, global = true, value_enum, env = "PDFSPLIT_LOG", default_value = "warn")]
    pub log_level: LogLevel,

    /// Delay between saves when downloading every split, in milliseconds
    #[arg(long, global = true, env = "PDFSPLIT_DOWNLOAD_DELAY_MS", default_value = "300")]
    pub download_delay_ms: u64,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        Settings::new(self.log_level, self.download_delay_ms)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a split session as an MCP server (primary mode)
    Mcp,

    /// Display page count and metadata of a PDF
    Info {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Split page ranges out of a PDF, one output file per range
    Split {
        /// PDF file to split
        path: PathBuf,

        /// Page ranges, one split each (e.g., "1-5,6,7-end")
        ranges: String,

        /// Output directory
        #[arg(short, long)]
        output_dir: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_split_command() {
        let cli = Cli::try_parse_from([
            "pdfsplit",
            "split",
            "book.pdf",
            "1-3,4-end",
            "-o",
            "out",
            "--download-delay-ms",
            "0",
        ])
        .unwrap();
        assert_eq!(cli.download_delay_ms, 0);
        match cli.command {
            Commands::Split {
                path,
                ranges,
                output_dir,
            } => {
                assert_eq!(path, PathBuf::from("book.pdf"));
                assert_eq!(ranges, "1-3,4-end");
                assert_eq!(output_dir, PathBuf::from("out"));
            }
            _ => panic!("expected split command"),
        }
    }

    #[test]
    fn test_log_level_flag() {
        let cli = Cli::try_parse_from(["pdfsplit", "--log-level", "debug", "mcp"]).unwrap();
        assert_eq!(cli.log_level, LogLevel::Debug);
    }
}
