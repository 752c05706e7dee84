use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::compress::raster::parse_max_kb;
use crate::compress::{CompressionLevel, CompressionTarget};
use crate::config::defaults::DEFAULT_WORKSPACE;
use crate::error::ConfigError;
use crate::pdf::{PageSelection, RotationAngle};
use crate::task::Task;

#[derive(Parser, Debug)]
#[command(name = "pdf-toolkit")]
#[command(
    author,
    version,
    about = "Batch PDF and image toolkit: watermark, merge, split, compress, rotate, convert"
)]
pub struct Args {
    /// Workspace folder holding the per-feature input/output folders
    #[arg(short, long, global = true, default_value = DEFAULT_WORKSPACE)]
    pub workspace: PathBuf,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Feature to run; opens the interactive menu when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Stamp every PDF with the template for its page format, or with text
    Watermark {
        /// Text for pages without a matching template image
        #[arg(short, long)]
        text: Option<String>,
    },

    /// Merge all PDFs into one, in file-name order
    Merge {
        /// Output file name (defaults to merged.pdf)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Split each PDF into single pages or the given ranges
    Split {
        /// Page ranges (e.g., "1-3,5"); every page on its own when omitted
        #[arg(short, long)]
        pages: Option<PageSelection>,
    },

    /// Reduce PDF or image file size
    Compress {
        #[command(subcommand)]
        kind: CompressCommand,
    },

    /// Rotate every page of each PDF clockwise
    Rotate {
        /// Angle in degrees: 90, 180 or 270
        #[arg(short, long)]
        angle: RotationAngle,
    },

    /// Convert between formats
    Convert {
        #[command(subcommand)]
        kind: ConvertCommand,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CompressCommand {
    /// Re-encode embedded images and compress streams
    Pdf {
        /// Compression level, 1 (light) to 9 (strongest)
        #[arg(short, long)]
        level: CompressionLevel,

        /// Render every page to a JPEG instead (needs the `render` feature)
        #[arg(long)]
        rasterize: bool,
    },

    /// Shrink JPEG/PNG images below a target size
    Image {
        /// Target size in KB
        #[arg(short, long, value_parser = parse_max_kb)]
        max_kb: u32,

        /// Never reduce resolution, only quality
        #[arg(long)]
        keep_resolution: bool,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConvertCommand {
    /// Render each PDF page to a JPEG at 200 dpi (needs the `render` feature)
    PdfToImages,

    /// Combine all images into one PDF, one page per image
    ImagesToPdf {
        /// Output file name (defaults to images.pdf)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Lay out the paragraphs of each .docx as PDF text pages
    WordToPdf,

    /// List the rows of each .xlsx's active sheet as PDF text pages
    ExcelToPdf,
}

impl Command {
    /// Turn parsed arguments into a runnable task
    pub fn into_task(self) -> Result<Task, ConfigError> {
        Ok(match self {
            Command::Watermark { text } => Task::Watermark { text },
            Command::Merge { name } => Task::Merge { name },
            Command::Split { pages } => Task::Split {
                pages: pages.map(|selection| selection.0),
            },
            Command::Compress { kind } => match kind {
                CompressCommand::Pdf { level, rasterize } => {
                    Task::CompressPdf { level, rasterize }
                }
                CompressCommand::Image {
                    max_kb,
                    keep_resolution,
                } => Task::CompressImage {
                    target: CompressionTarget::new(max_kb, !keep_resolution)?,
                },
            },
            Command::Rotate { angle } => Task::Rotate { angle },
            Command::Convert { kind } => match kind {
                ConvertCommand::PdfToImages => Task::PdfToImages,
                ConvertCommand::ImagesToPdf { name } => Task::ImagesToPdf { name },
                ConvertCommand::WordToPdf => Task::WordToPdf,
                ConvertCommand::ExcelToPdf => Task::ExcelToPdf,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::PageRange;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("pdf-toolkit").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_subcommand_opens_menu() {
        let args = parse(&[]);
        assert!(args.command.is_none());
        assert_eq!(args.workspace, PathBuf::from("workspace"));
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["merge", "--name", "all.pdf", "-w", "/tmp/ws", "-vv"]);
        assert_eq!(args.workspace, PathBuf::from("/tmp/ws"));
        assert_eq!(args.verbose, 2);
        assert_eq!(
            args.command.unwrap().into_task().unwrap(),
            Task::Merge {
                name: Some("all.pdf".to_string())
            }
        );
    }

    #[test]
    fn test_split_pages() {
        let task = parse(&["split", "--pages", "1-3, 5"])
            .command
            .unwrap()
            .into_task()
            .unwrap();
        assert_eq!(
            task,
            Task::Split {
                pages: Some(vec![PageRange::new(1, 3), PageRange::single(5)])
            }
        );

        assert!(Args::try_parse_from(["pdf-toolkit", "split", "--pages", "3-1"]).is_err());
    }

    #[test]
    fn test_compress_image() {
        let task = parse(&["compress", "image", "--max-kb", "200", "--keep-resolution"])
            .command
            .unwrap()
            .into_task()
            .unwrap();
        assert_eq!(
            task,
            Task::CompressImage {
                target: CompressionTarget {
                    max_size_kb: 200,
                    allow_resize: false
                }
            }
        );

        for bad in ["0", "abc"] {
            let args = ["pdf-toolkit", "compress", "image", "--max-kb", bad];
            assert!(Args::try_parse_from(args).is_err());
        }
    }

    #[test]
    fn test_compress_pdf_level_bounds() {
        let task = parse(&["compress", "pdf", "--level", "7"])
            .command
            .unwrap()
            .into_task()
            .unwrap();
        assert_eq!(
            task,
            Task::CompressPdf {
                level: CompressionLevel::new(7).unwrap(),
                rasterize: false
            }
        );
        let args = ["pdf-toolkit", "compress", "pdf", "--level", "10"];
        assert!(Args::try_parse_from(args).is_err());

        let task = parse(&["compress", "pdf", "--level", "3", "--rasterize"])
            .command
            .unwrap()
            .into_task()
            .unwrap();
        assert_eq!(
            task,
            Task::CompressPdf {
                level: CompressionLevel::new(3).unwrap(),
                rasterize: true
            }
        );
    }

    #[test]
    fn test_rotate_angle() {
        let args = parse(&["rotate", "--angle", "270"]);
        assert_eq!(
            args.command,
            Some(Command::Rotate {
                angle: RotationAngle::ThreeQuarter
            })
        );
        assert!(Args::try_parse_from(["pdf-toolkit", "rotate", "--angle", "45"]).is_err());
    }

    #[test]
    fn test_convert_images() {
        let args = parse(&["convert", "images-to-pdf"]);
        assert_eq!(
            args.command.unwrap().into_task().unwrap(),
            Task::ImagesToPdf { name: None }
        );
    }

    #[test]
    fn test_convert_documents() {
        for (name, expected) in [
            ("pdf-to-images", Task::PdfToImages),
            ("word-to-pdf", Task::WordToPdf),
            ("excel-to-pdf", Task::ExcelToPdf),
        ] {
            let task = parse(&["convert", name]).command.unwrap().into_task().unwrap();
            assert_eq!(task, expected);
        }
    }
}
