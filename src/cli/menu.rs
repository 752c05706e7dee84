//! Interactive numbered menu
//!
//! Reads choices line by line so it can be driven from stdin or from a test
//! buffer. End of input leaves the menu.

use std::io::{self, BufRead, Write};

use crate::batch::input::{COMPRESSIBLE_IMAGE_EXTENSIONS, PDF_EXTENSIONS};
use crate::batch::list_inputs;
use crate::compress::raster::parse_max_kb;
use crate::compress::{CompressionLevel, CompressionTarget};
use crate::config::{Feature, Settings};
use crate::error::ConfigError;
use crate::pdf::{parse_page_ranges, RotationAngle};
use crate::task::Task;
use crate::watermark::templates_present;

const MAIN_MENU: &[(&str, &str)] = &[
    ("1", "Watermark PDF"),
    ("2", "Merge PDF"),
    ("3", "Split PDF"),
    ("4", "Compress PDF / Image"),
    ("5", "Rotate PDF"),
    ("6", "Convert PDF / Image / Word / Excel"),
    ("0", "Exit"),
];

const CONVERT_MENU: &[(&str, &str)] = &[
    ("1", "PDF to Image"),
    ("2", "Image to PDF"),
    ("4", "Word to PDF"),
    ("6", "Excel to PDF"),
    ("0", "Back"),
];

/// What the user picked from a menu screen
enum Selection {
    Run(Task),
    Back,
    Invalid(String),
    Quit,
}

/// Print `label` and read one trimmed line; `None` at end of input
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
) -> io::Result<Option<String>> {
    write!(output, "{}", label)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn optional(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn from_config(result: Result<Task, ConfigError>) -> Selection {
    match result {
        Ok(task) => Selection::Run(task),
        Err(e) => Selection::Invalid(e.to_string()),
    }
}

/// False, with a notice, when the compress input folder has nothing to offer
fn has_compress_inputs<W: Write>(
    settings: &Settings,
    output: &mut W,
    extensions: &[&str],
) -> io::Result<bool> {
    let dir = settings.input_dir(Feature::Compress);
    let found = match list_inputs(&dir, extensions) {
        Ok(inputs) => !inputs.is_empty(),
        Err(e) => {
            log::warn!("Cannot list {}: {}", dir.display(), e);
            false
        }
    };
    if !found {
        writeln!(output, "No input files in {}", dir.display())?;
    }
    Ok(found)
}

fn compress_menu<R: BufRead, W: Write>(
    settings: &Settings,
    input: &mut R,
    output: &mut W,
) -> io::Result<Selection> {
    writeln!(output, "\n=== Compress ===")?;
    writeln!(output, "1. Compress PDF")?;
    writeln!(output, "2. Compress Image")?;
    writeln!(output, "0. Back")?;
    let Some(choice) = prompt(input, output, "Choose: ")? else {
        return Ok(Selection::Quit);
    };

    match choice.as_str() {
        "1" => {
            if !has_compress_inputs(settings, output, PDF_EXTENSIONS)? {
                return Ok(Selection::Back);
            }
            let Some(level) = prompt(input, output, "Compression level (1-9): ")? else {
                return Ok(Selection::Quit);
            };
            Ok(from_config(level.parse::<CompressionLevel>().map(|level| {
                Task::CompressPdf {
                    level,
                    rasterize: false,
                }
            })))
        }
        "2" => {
            if !has_compress_inputs(settings, output, COMPRESSIBLE_IMAGE_EXTENSIONS)? {
                return Ok(Selection::Back);
            }
            let Some(max_kb) = prompt(input, output, "Target size (KB): ")? else {
                return Ok(Selection::Quit);
            };
            let max_kb = match parse_max_kb(&max_kb) {
                Ok(kb) => kb,
                Err(e) => return Ok(Selection::Invalid(e.to_string())),
            };
            let Some(resize) = prompt(input, output, "Allow resolution reduction? [Y/n]: ")?
            else {
                return Ok(Selection::Quit);
            };
            let allow_resize = !matches!(resize.to_ascii_lowercase().as_str(), "n" | "no");
            Ok(from_config(
                CompressionTarget::new(max_kb, allow_resize)
                    .map(|target| Task::CompressImage { target }),
            ))
        }
        "0" => Ok(Selection::Back),
        other => Ok(Selection::Invalid(format!("Unknown choice: {}", other))),
    }
}

fn convert_menu<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Selection> {
    writeln!(output, "\n=== Convert ===")?;
    for (key, label) in CONVERT_MENU {
        writeln!(output, "{}. {}", key, label)?;
    }
    let Some(choice) = prompt(input, output, "Choose: ")? else {
        return Ok(Selection::Quit);
    };

    let selection = match choice.as_str() {
        "1" => Selection::Run(Task::PdfToImages),
        "2" => match prompt(input, output, "Output file name (blank for images.pdf): ")? {
            Some(name) => Selection::Run(Task::ImagesToPdf {
                name: optional(name),
            }),
            None => Selection::Quit,
        },
        "4" => Selection::Run(Task::WordToPdf),
        "6" => Selection::Run(Task::ExcelToPdf),
        "0" => Selection::Back,
        other => Selection::Invalid(format!("Unknown choice: {}", other)),
    };
    Ok(selection)
}

/// Text is only needed when no template image is there to use
fn watermark_selection<R: BufRead, W: Write>(
    settings: &Settings,
    input: &mut R,
    output: &mut W,
) -> io::Result<Selection> {
    let template_dir = settings.template_dir();
    if templates_present(&template_dir) {
        writeln!(output, "Using templates from {}", template_dir.display())?;
        return Ok(Selection::Run(Task::Watermark { text: None }));
    }
    Ok(
        match prompt(input, output, "Watermark text (blank for WATERMARK): ")? {
            Some(text) => Selection::Run(Task::Watermark {
                text: optional(text),
            }),
            None => Selection::Quit,
        },
    )
}

fn read_selection<R: BufRead, W: Write>(
    choice: &str,
    settings: &Settings,
    input: &mut R,
    output: &mut W,
) -> io::Result<Selection> {
    let selection = match choice {
        "1" => watermark_selection(settings, input, output)?,
        "2" => match prompt(input, output, "Output file name (blank for merged.pdf): ")? {
            Some(name) => Selection::Run(Task::Merge {
                name: optional(name),
            }),
            None => Selection::Quit,
        },
        "3" => match prompt(input, output, "Page ranges, e.g. 1-3,5 (blank for every page): ")? {
            Some(pages) if pages.is_empty() => Selection::Run(Task::Split { pages: None }),
            Some(pages) => from_config(parse_page_ranges(&pages).map(|ranges| Task::Split {
                pages: Some(ranges),
            })),
            None => Selection::Quit,
        },
        "4" => compress_menu(settings, input, output)?,
        "5" => match prompt(input, output, "Rotation angle (90, 180, 270): ")? {
            Some(angle) => from_config(
                angle
                    .parse::<RotationAngle>()
                    .map(|angle| Task::Rotate { angle }),
            ),
            None => Selection::Quit,
        },
        "6" => convert_menu(input, output)?,
        "0" => Selection::Quit,
        other => Selection::Invalid(format!("Unknown choice: {}", other)),
    };
    Ok(selection)
}

/// Run the menu until the user exits or input ends
pub fn run_menu<R: BufRead, W: Write>(
    settings: &Settings,
    input: &mut R,
    output: &mut W,
) -> io::Result<()> {
    loop {
        writeln!(output, "\n=== PDF TOOLKIT ===")?;
        writeln!(output, "Workspace: {}", settings.workspace().display())?;
        for (key, label) in MAIN_MENU {
            writeln!(output, "{}. {}", key, label)?;
        }

        let Some(choice) = prompt(input, output, "Choose: ")? else {
            return Ok(());
        };

        match read_selection(&choice, settings, input, output)? {
            Selection::Run(task) => match task.run(settings) {
                Ok(report) => write!(output, "\n{}", report)?,
                Err(e) => {
                    log::warn!("{} failed: {}", task, e);
                    writeln!(output, "\nError: {}", e)?;
                }
            },
            Selection::Invalid(message) => writeln!(output, "Invalid input: {}", message)?,
            Selection::Back => {}
            Selection::Quit => return Ok(()),
        }
    }
}
