use std::path::PathBuf;

use clap::Parser;
use refcheck::{
    document_id, emit_report, enumerate_documents, load_config, read_document, report_fingerprint, DocumentError, Registry, RegistryShape,
    ScanConfig, Scanner, Variant,
};

/// Audit extracted document text for outdated standard and decree citations.
#[derive(Parser, Debug)]
#[command(name = "refcheck")]
struct Args {
    /// Registry table (.csv or .json); overrides registry.path from the config
    #[arg(long)]
    registry: Option<PathBuf>,

    /// YAML scan config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Registry status columns (3 or 5)
    #[arg(long)]
    shape: Option<usize>,

    /// 0-based key column of a CSV registry
    #[arg(long)]
    key_column: Option<usize>,

    /// Standard families only, substring registry matching
    #[arg(long)]
    legacy: bool,

    #[arg(long)]
    workers: Option<usize>,

    /// Write one <doc>.refs.json per document here instead of printing
    #[arg(long)]
    out: Option<PathBuf>,

    /// Text documents or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // 1) Config: file, then flag overrides
    let mut config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(c) => c,
            Err(e) => fail("load_config", Some(path.display().to_string()), e.to_string(), 2),
        },
        None => ScanConfig::default(),
    };
    if args.legacy {
        config.variant = Variant::Legacy;
    }
    if let Some(shape) = args.shape {
        config.registry.shape = shape;
    }
    if let Some(col) = args.key_column {
        config.registry.key_column = col;
    }
    if let Some(path) = &args.registry {
        config.registry.path = Some(path.clone());
    }
    if args.workers.is_some() {
        config.workers = args.workers;
    }
    if let Err(e) = config.validate() {
        fail("load_config", None, e.to_string(), 2);
    }

    // 2) Registry: fail fast, never scan against an empty table
    let Some(registry_path) = config.registry.path.clone() else {
        fail("load_registry", None, "no registry given (--registry or registry.path)".into(), 3);
    };
    let registry = match RegistryShape::try_from(config.registry.shape)
        .and_then(|shape| Registry::from_path(&registry_path, shape, config.registry.key_column))
    {
        Ok(r) => r,
        Err(e) => fail("load_registry", Some(registry_path.display().to_string()), e.to_string(), 3),
    };
    eprintln!(
        "{}",
        serde_json::json!({
            "tool": "load_registry",
            "file": registry_path,
            "records": registry.len(),
            "shape": registry.shape().width()
        })
    );

    let scanner = match Scanner::new(&config) {
        Ok(s) => s,
        Err(e) => fail("scan", None, e.to_string(), 2),
    };

    // 3) Documents
    let mut documents: Vec<PathBuf> = Vec::new();
    for input in &args.inputs {
        if input.contains(&['*', '?', '['][..]) {
            match enumerate_documents(input) {
                Ok(found) => documents.extend(found),
                Err(DocumentError::NoFilesFound { pattern }) => fail("enumerate_documents", Some(pattern), "NoFilesFound".into(), 1),
                Err(e) => fail("enumerate_documents", Some(input.clone()), e.to_string(), 1),
            }
        } else {
            documents.push(PathBuf::from(input));
        }
    }

    // 4) Scan each document
    for path in documents {
        let text = match read_document(&path) {
            Ok(t) => t,
            Err(e) => fail("read_document", Some(path.display().to_string()), e.to_string(), 1),
        };
        let report = match scanner.scan(&text, &registry) {
            Ok(r) => r,
            Err(e) => fail("scan", Some(path.display().to_string()), e.to_string(), 4),
        };
        eprintln!(
            "{}",
            serde_json::json!({
                "tool": "scan",
                "file": path,
                "references": report.results.len(),
                "resolved": report.results.iter().filter(|r| r.is_resolved()).count(),
                "het_hieu_luc_count": report.expired_count
            })
        );

        match &args.out {
            Some(outdir) => match emit_report(&report, outdir, &document_id(&path)) {
                Ok(written) => eprintln!(
                    "{}",
                    serde_json::json!({
                        "tool": "emit_report",
                        "file": path,
                        "report_path": written,
                        "fingerprint": report_fingerprint(&report).unwrap_or_default()
                    })
                ),
                Err(e) => fail("emit_report", Some(path.display().to_string()), e.to_string(), 5),
            },
            None => match serde_json::to_string(&report) {
                Ok(json) => println!("{}", json),
                Err(e) => fail("emit_report", Some(path.display().to_string()), e.to_string(), 5),
            },
        }
    }
}

fn fail(tool: &str, file: Option<String>, error: String, code: i32) -> ! {
    eprintln!(
        "{}",
        serde_json::json!({
            "tool": tool,
            "file": file,
            "error": error,
            "error_code": code
        })
    );
    std::process::exit(code);
}
