use std::io::Write;
use std::path::{Path, PathBuf};

use xmindcanvas::{
    CanvasMaterializer, ConversionOptions, Direction, TreeLayoutEngine,
    convert_xmind_to_canvas_with,
};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Convert(xmindcanvas::ConvertError),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Convert(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<xmindcanvas::ConvertError> for CliError {
    fn from(value: xmindcanvas::ConvertError) -> Self {
        Self::Convert(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Default)]
struct Args {
    input: Option<String>,
    out: Option<String>,
    algorithm: Option<String>,
    direction: Option<Direction>,
    node_spacing: Option<f64>,
    layer_spacing: Option<f64>,
    pretty: bool,
}

fn usage() -> &'static str {
    "xmindcanvas-cli\n\
\n\
USAGE:\n\
  xmindcanvas-cli [--out <path.canvas>] [--algorithm mrtree|layered] [--direction RIGHT|LEFT|DOWN|UP] [--node-spacing <px>] [--layer-spacing <px>] [--pretty] <path.xmind>\n\
\n\
NOTES:\n\
  - The canvas JSON is written to --out, defaulting to the input path with a .canvas extension.\n\
  - Embedded images are extracted next to the output into <output-basename>_images/ and\n\
    referenced from the canvas file nodes.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "--pretty" => args.pretty = true,
            "--out" | "-o" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--algorithm" => {
                let Some(algorithm) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.algorithm = Some(algorithm.clone());
            }
            "--direction" => {
                let Some(direction) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.direction = Some(
                    direction
                        .parse::<Direction>()
                        .map_err(|_| CliError::Usage(usage()))?,
                );
            }
            "--node-spacing" => {
                let Some(spacing) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.node_spacing =
                    Some(spacing.parse::<f64>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--layer-spacing" => {
                let Some(spacing) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.layer_spacing =
                    Some(spacing.parse::<f64>().map_err(|_| CliError::Usage(usage()))?);
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    if args.input.is_none() {
        return Err(CliError::Usage(usage()));
    }
    Ok(args)
}

fn output_path(input: &Path, out: Option<&str>) -> PathBuf {
    match out {
        Some(out) => PathBuf::from(out),
        None => input.with_extension("canvas"),
    }
}

fn images_folder_name(output: &Path) -> String {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("canvas");
    format!("{stem}_images")
}

fn run(args: Args) -> Result<(), CliError> {
    let input = PathBuf::from(args.input.as_deref().expect("validated in parse_args"));
    let bytes = std::fs::read(&input)?;

    let mut options = ConversionOptions::default();
    if let Some(algorithm) = args.algorithm {
        options.layout_algorithm = algorithm;
    }
    if let Some(direction) = args.direction {
        options.direction = direction;
    }
    if let Some(spacing) = args.node_spacing {
        options.node_spacing = spacing;
    }
    if let Some(spacing) = args.layer_spacing {
        options.layer_spacing = spacing;
    }

    let output = output_path(&input, args.out.as_deref());
    let images_folder = images_folder_name(&output);
    let materializer = CanvasMaterializer::new().with_image_folder(images_folder.clone());

    let conversion =
        convert_xmind_to_canvas_with(&bytes, &options, &TreeLayoutEngine, &materializer)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&conversion.canvas)?
    } else {
        serde_json::to_string(&conversion.canvas)?
    };
    let mut file = std::fs::File::create(&output)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;

    if !conversion.workbook.images.is_empty() {
        let images_dir = output
            .parent()
            .map(|p| p.join(&images_folder))
            .unwrap_or_else(|| PathBuf::from(&images_folder));
        std::fs::create_dir_all(&images_dir)?;
        for image in conversion.workbook.images.values() {
            let target = images_dir.join(&image.name);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(target, &image.data)?;
        }
    }

    eprintln!(
        "wrote {} ({} nodes, {} edges, {} images)",
        output.display(),
        conversion.canvas.nodes.len(),
        conversion.canvas.edges.len(),
        conversion.workbook.images.len()
    );
    Ok(())
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    match run(args) {
        Ok(()) => {}
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
