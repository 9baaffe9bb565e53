//! `ldview` — render RDF graphs from the command line.
//!
//! Provides three subcommands, each reading a JSON graph (an array of
//! triples) from a file path or from stdin (`-`):
//!
//! - **`render`** — run the full pipeline and print HTML.
//! - **`redact`** — apply contact redaction and print the graph as JSON.
//! - **`serialize`** — print the graph as RDF/XML.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use http::header::{HeaderMap, CONTENT_LANGUAGE, CONTENT_TYPE, ETAG};
use ldview::{
    ApplicationMode, DescriptionListStylesheet, EntityTag, Graph, MediaType, PrivacyFilter,
    RdfXmlSerializer, RedactionPolicy, RenderPipeline, RenderRequest, Sha1Digest, Viewer,
};

/// ldview — render RDF graphs as HTML
#[derive(Parser)]
#[command(name = "ldview", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a graph as an HTML page.
    ///
    /// The page goes to stdout. The resulting `Content-Type`, `Content-Language`
    /// and `ETag` response headers are printed to stderr.
    ///
    /// Examples:
    ///   ldview render person.json
    ///   ldview render person.json --agent urn:agent42 --etag '"1a"'
    Render {
        /// Path to a JSON graph, or `-` for stdin.
        file: PathBuf,

        /// URI of the authenticated agent; anonymous when absent.
        #[arg(long, value_name = "URI", env = "LDVIEW_AGENT")]
        agent: Option<String>,

        /// Application mode: admin | end-user
        #[arg(long, default_value = "admin", env = "LDVIEW_MODE")]
        mode: ApplicationMode,

        /// Redaction policy: standard | disabled
        #[arg(long, default_value = "standard", env = "LDVIEW_REDACTION")]
        redaction: RedactionPolicy,

        /// Output media type: html | xhtml
        #[arg(long, default_value = "html")]
        media_type: MediaType,

        /// Upstream entity tag, e.g. '"1a"' or 'W/"1a"'.
        #[arg(long, value_name = "TAG")]
        etag: Option<String>,

        /// Page title.
        #[arg(long, default_value = "Linked Data", env = "LDVIEW_TITLE")]
        title: String,

        /// Document language, sent as `Content-Language`.
        #[arg(long, value_name = "LANG")]
        lang: Option<String>,

        /// Fail on malformed IRIs instead of serializing them as-is.
        #[arg(long)]
        strict: bool,
    },

    /// Print the graph a viewer is allowed to see, as JSON.
    Redact {
        /// Path to a JSON graph, or `-` for stdin.
        file: PathBuf,

        /// URI of the authenticated agent; anonymous when absent.
        #[arg(long, value_name = "URI", env = "LDVIEW_AGENT")]
        agent: Option<String>,

        /// Application mode: admin | end-user
        #[arg(long, default_value = "admin", env = "LDVIEW_MODE")]
        mode: ApplicationMode,

        /// Redaction policy: standard | disabled
        #[arg(long, default_value = "standard", env = "LDVIEW_REDACTION")]
        redaction: RedactionPolicy,
    },

    /// Print a graph as RDF/XML.
    Serialize {
        /// Path to a JSON graph, or `-` for stdin.
        file: PathBuf,

        /// Fail on malformed IRIs instead of serializing them as-is.
        #[arg(long)]
        strict: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ldview=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Render {
            file,
            agent,
            mode,
            redaction,
            media_type,
            etag,
            title,
            lang,
            strict,
        } => {
            let graph = parse_graph(&read_input(&file));

            let mut headers = HeaderMap::new();
            if let Some(raw) = etag {
                let value = EntityTag::parse(&raw)
                    .and_then(|tag| tag.to_header_value())
                    .unwrap_or_else(|| {
                        fatal(&format!(
                            "invalid --etag {:?}: expected \"value\" or W/\"value\"",
                            raw
                        ))
                    });
                headers.insert(ETAG, value);
            }

            let pipeline = RenderPipeline::new(
                Arc::new(DescriptionListStylesheet::new(title)),
                Arc::new(Sha1Digest),
            )
            .with_policy(redaction)
            .with_serializer(serializer(strict));

            let mut request = RenderRequest::new(viewer(agent), mode, media_type);
            if let Some(lang) = lang {
                request = request.with_param("lang", lang);
            }

            let mut stdout = io::stdout().lock();
            pipeline
                .render(&graph, &request, &mut headers, &mut stdout)
                .unwrap_or_else(|e| fatal(&e.to_string()));

            for name in [CONTENT_TYPE, CONTENT_LANGUAGE, ETAG] {
                if let Some(value) = headers.get(&name).and_then(|v| v.to_str().ok()) {
                    eprintln!("{}: {}", name, value);
                }
            }
        }

        Command::Redact {
            file,
            agent,
            mode,
            redaction,
        } => {
            let graph = parse_graph(&read_input(&file));
            let visible = redact(&graph, agent, mode, redaction);
            let json = serde_json::to_string_pretty(&visible)
                .unwrap_or_else(|e| fatal(&format!("failed to encode graph: {}", e)));
            println!("{}", json);
        }

        Command::Serialize { file, strict } => {
            let graph = parse_graph(&read_input(&file));
            let xml = serializer(strict)
                .serialize(&graph)
                .unwrap_or_else(|e| fatal(&e.to_string()));
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(&xml)
                .and_then(|_| stdout.flush())
                .unwrap_or_else(|e| fatal(&format!("failed to write output: {}", e)));
        }
    }
}

fn viewer(agent: Option<String>) -> Viewer {
    agent.map(Viewer::agent).unwrap_or_default()
}

/// The graph `agent` may see in `mode` under `redaction`.
fn redact(graph: &Graph, agent: Option<String>, mode: ApplicationMode, redaction: RedactionPolicy) -> Graph {
    PrivacyFilter::default()
        .with_policy(redaction)
        .filter(graph, &viewer(agent), mode)
        .into_owned()
}

fn serializer(strict: bool) -> RdfXmlSerializer {
    if strict {
        RdfXmlSerializer::strict()
    } else {
        RdfXmlSerializer::permissive()
    }
}

/// Read the full contents of a file, or stdin when the path is `"-"`.
fn read_input(path: &PathBuf) -> String {
    if path.to_str() == Some("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .unwrap_or_else(|e| fatal(&format!("failed to read stdin: {}", e)));
        buf
    } else {
        fs::read_to_string(path).unwrap_or_else(|e| {
            fatal(&format!("failed to read {}: {}", path.display(), e))
        })
    }
}

fn parse_graph(json: &str) -> Graph {
    serde_json::from_str(json)
        .unwrap_or_else(|e| fatal(&format!("failed to parse input as a graph: {}", e)))
}

/// Print an error message to stderr and exit with code 2.
fn fatal(msg: &str) -> ! {
    eprintln!("ldview: {}", msg);
    process::exit(2);
}

// --- tests -------------------------------------------------------------------
