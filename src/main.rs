mod color;
mod config;
mod descriptor;
mod field;
mod geometry;
mod pdf;
mod synth;


use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use clap::error::ErrorKind;
use lopdf::Document;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::synth::{FormSynthesizer, SynthesisReport};


/// Adds interactive form fields, described in a JSON file, to an existing PDF document.
#[derive(Parser)]
#[command(version)]
struct Opts {
    /// The PDF document to add the fields to.
    pub input_file: PathBuf,

    /// Where to write the resulting PDF document.
    pub output_file: PathBuf,

    /// JSON file containing an array of field descriptors.
    pub descriptors_file: PathBuf,

    /// Text color for fields without their own, as six hex digits with optional leading '#'.
    #[arg(requires = "default_background_color")]
    pub default_text_color: Option<String>,

    /// Background color for fields without their own, as six hex digits with optional leading '#'.
    #[arg(requires = "default_text_color")]
    pub default_background_color: Option<String>,

    /// TOML file with default colors and appearance settings.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}


#[derive(Debug)]
enum Error {
    Config(config::Error),
    Descriptors(descriptor::Error),
    Load { path: PathBuf, error: lopdf::Error },
    Synthesis(synth::Error),
    Serialize { reason: String },
    Write { path: PathBuf, error: io::Error },
}
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e)
                => write!(f, "configuration error: {}", e),
            Self::Descriptors(e)
                => write!(f, "{}", e),
            Self::Load { path, error }
                => write!(f, "failed to load PDF document {}: {}", path.display(), error),
            Self::Synthesis(e)
                => write!(f, "{}", e),
            Self::Serialize { reason }
                => write!(f, "failed to serialize PDF document: {}", reason),
            Self::Write { path, error }
                => write!(f, "failed to write {}: {}", path.display(), error),
        }
    }
}
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Descriptors(e) => Some(e),
            Self::Load { error, .. } => Some(error),
            Self::Synthesis(e) => Some(e),
            Self::Serialize { .. } => None,
            Self::Write { error, .. } => Some(error),
        }
    }
}
impl From<config::Error> for Error {
    fn from(value: config::Error) -> Self { Self::Config(value) }
}
impl From<descriptor::Error> for Error {
    fn from(value: descriptor::Error) -> Self { Self::Descriptors(value) }
}
impl From<synth::Error> for Error {
    fn from(value: synth::Error) -> Self { Self::Synthesis(value) }
}


/// Assembles the run configuration from the optional config file and the command line.
fn effective_config(opts: &Opts) -> Result<Config, Error> {
    let base = match &opts.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };
    Ok(base.with_default_colors(opts.default_text_color.clone(), opts.default_background_color.clone()))
}


/// Performs a complete run.
///
/// The output file is only written once every descriptor has been processed successfully.
fn run(opts: &Opts) -> Result<SynthesisReport, Error> {
    let config = effective_config(opts)?;
    let descriptors = descriptor::load_descriptors(&opts.descriptors_file)?;

    let mut doc = Document::load(&opts.input_file)
        .map_err(|error| Error::Load { path: opts.input_file.clone(), error })?;
    info!("loaded {} ({} pages)", opts.input_file.display(), doc.get_pages().len());

    let report = FormSynthesizer::new(&config)
        .synthesize(&mut doc, &descriptors)?;

    // serialize completely before touching the output path
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| Error::Serialize { reason: e.to_string() })?;
    std::fs::write(&opts.output_file, &buffer)
        .map_err(|error| Error::Write { path: opts.output_file.clone(), error })?;

    Ok(report)
}


fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let opts = match Opts::try_parse() {
        Ok(o) => o,
        Err(e) => {
            if matches!(e.kind(), ErrorKind::DisplayHelp|ErrorKind::DisplayVersion) {
                e.exit();
            }
            println!("{}", Opts::command().render_usage());
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        },
    };

    match run(&opts) {
        Ok(_) => {
            println!("PDF with form fields created successfully: {}", opts.output_file.display());
            ExitCode::SUCCESS
        },
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        },
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::tests::make_document;
    use std::path::Path;

    struct Workspace {
        dir: tempfile::TempDir,
    }
    impl Workspace {
        fn new(descriptors: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let mut doc = make_document(1);
            doc.save(dir.path().join("in.pdf")).unwrap();
            std::fs::write(dir.path().join("fields.json"), descriptors).unwrap();
            Self { dir }
        }

        fn path(&self, name: &str) -> PathBuf { self.dir.path().join(name) }

        fn opts(&self, extra: &[&str]) -> Opts {
            let mut args: Vec<String> = vec![
                "pdfforms".to_owned(),
                self.path("in.pdf").display().to_string(),
                self.path("out.pdf").display().to_string(),
                self.path("fields.json").display().to_string(),
            ];
            args.extend(extra.iter().map(|s| (*s).to_owned()));
            Opts::try_parse_from(args).unwrap()
        }
    }

    fn field_count(path: &Path) -> usize {
        let doc = Document::load(path).unwrap();
        let catalog_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
        match doc.get_dictionary(catalog_id).unwrap().get(b"AcroForm") {
            Ok(acroform) => doc.dereference(acroform).unwrap().1
                .as_dict().unwrap()
                .get(b"Fields").unwrap()
                .as_array().unwrap()
                .len(),
            Err(_) => 0,
        }
    }

    #[test]
    fn argument_counts() {
        assert!(Opts::try_parse_from(["pdfforms", "a.pdf", "b.pdf"]).is_err());
        assert!(Opts::try_parse_from(["pdfforms", "a.pdf", "b.pdf", "f.json"]).is_ok());
        assert!(Opts::try_parse_from(["pdfforms", "a.pdf", "b.pdf", "f.json", "#000000"]).is_err());
        assert!(Opts::try_parse_from(["pdfforms", "a.pdf", "b.pdf", "f.json", "#000000", "#ffffff"]).is_ok());
        assert!(Opts::try_parse_from(["pdfforms", "a.pdf", "b.pdf", "f.json", "#000000", "#ffffff", "x"]).is_err());
    }

    #[test]
    fn successful_run_writes_output() {
        let ws = Workspace::new(r##"[
            {"type": "text", "page": 0, "name": "f1", "position": {"x": 10, "y": 10, "width": 100, "height": 20}, "textColor": "#ff0000"},
            {"type": "checkbox", "page": 0, "name": "c1", "position": {"x": 10, "y": 40, "width": 12, "height": 12}}
        ]"##);
        let report = run(&ws.opts(&["000000", "#ffffff"])).unwrap();
        assert_eq!(report.fields, vec!["f1", "c1"]);
        assert_eq!(field_count(&ws.path("out.pdf")), 2);
    }

    #[test]
    fn empty_descriptor_list() {
        let ws = Workspace::new("[]");
        run(&ws.opts(&[])).unwrap();
        assert_eq!(field_count(&ws.path("out.pdf")), 0);
    }

    #[test]
    fn fatal_condition_leaves_no_output() {
        let ws = Workspace::new(r#"[
            {"type": "text", "page": 0, "name": "f1", "position": {"x": 10, "y": 10, "width": 100, "height": 20}},
            {"type": "combo", "page": 0, "name": "f2", "position": {"x": 10, "y": 40, "width": 100, "height": 20}}
        ]"#);
        let err = run(&ws.opts(&[])).unwrap_err();
        assert!(matches!(err, Error::Synthesis(synth::Error::UnsupportedFieldType { .. })));
        assert!(!ws.path("out.pdf").exists());
    }

    #[test]
    fn malformed_descriptor_file() {
        let ws = Workspace::new(r#"{"not": "a list"}"#);
        let err = run(&ws.opts(&[])).unwrap_err();
        assert!(matches!(err, Error::Descriptors(descriptor::Error::MalformedDescriptorFile(_))));
        assert!(!ws.path("out.pdf").exists());
    }

    #[test]
    fn unreadable_input_document() {
        let ws = Workspace::new("[]");
        std::fs::write(ws.path("in.pdf"), b"this is not a PDF").unwrap();
        let err = run(&ws.opts(&[])).unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
    }

    #[test]
    fn config_file_supplies_defaults() {
        let ws = Workspace::new(r#"[
            {"type": "text", "page": 0, "name": "f1", "position": {"x": 10, "y": 10, "width": 100, "height": 20}}
        ]"#);
        std::fs::write(ws.path("pdfforms.toml"), "default_text_color = \"#00ff00\"\n[appearance]\nfont_size = 10.0\n").unwrap();
        let config_path = ws.path("pdfforms.toml").display().to_string();

        let config = effective_config(&ws.opts(&["--config", &config_path])).unwrap();
        assert_eq!(config.default_text_color.as_deref(), Some("#00ff00"));
        assert_eq!(config.appearance.font_size, 10.0);

        let config = effective_config(&ws.opts(&["--config", &config_path, "#ff0000", "#ffffff"])).unwrap();
        assert_eq!(config.default_text_color.as_deref(), Some("#ff0000"));
        assert_eq!(config.default_background_color.as_deref(), Some("#ffffff"));
    }
}
