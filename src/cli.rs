use std::error::Error;
use std::fs;
use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use decsfinder_rs::dispatch::{DEFAULT_BASE_URL, Dispatcher, LoadedPage, SyntheticForm};
use decsfinder_rs::export::{DEFAULT_EXPORT_PREFIX, export_terms};
use decsfinder_rs::page::{
    ANNOTATED_REGION, INPUT_LANGUAGE_SELECT, OUTPUT_LANGUAGE_SELECT, SelectOption,
    TERM_TYPES_SELECT,
};
use decsfinder_rs::{ALL_LANGUAGES, PageSnapshot, build_payload, reset_page};

#[derive(Parser, Debug)]
#[command(name = "decsfinder-rs", about = "Drive the DeCS terminology finder", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable output.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a term lookup to the finder route.
    Lookup {
        /// Text to process. May be omitted for an empty lookup.
        text: Option<String>,
        /// Read the text from a plain-text file instead.
        #[arg(long, conflicts_with = "text")]
        input_file: Option<PathBuf>,
        /// Source language selector value.
        #[arg(long, default_value = ALL_LANGUAGES)]
        input_lang: String,
        /// Output language selector value.
        #[arg(long, default_value = ALL_LANGUAGES)]
        output_lang: String,
        /// Display language for the result page.
        #[arg(long, default_value = "en")]
        lang: String,
        /// Term-type code to select; repeatable.
        #[arg(short = 't', long = "term-type")]
        term_types: Vec<String>,
        /// Ask the result page for the summaries panel.
        #[arg(long)]
        show_summaries: bool,
        /// Current content of the annotated region. Defaults to the text
        /// itself, modeling a page that has not been annotated yet.
        #[arg(long)]
        rendered: Option<String>,
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,
        /// Print the form instead of submitting it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Clear the page state and re-request a rendering in LANGUAGE.
    Reset {
        language: String,
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,
        /// Print the form instead of submitting it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Switch the site language through the simplified route.
    Site {
        language: String,
        #[arg(long, default_value = DEFAULT_BASE_URL)]
        base_url: String,
        /// Print the form instead of submitting it.
        #[arg(long)]
        dry_run: bool,
    },
    /// Save text to a timestamped export file.
    Export {
        /// Text to export. Blank text is skipped.
        text: Option<String>,
        /// Read the text from a plain-text file instead.
        #[arg(long, conflicts_with = "text")]
        input_file: Option<PathBuf>,
        /// Directory to write the export into.
        #[arg(long, default_value = ".")]
        dir: PathBuf,
        /// Filename prefix.
        #[arg(long, default_value = DEFAULT_EXPORT_PREFIX)]
        prefix: String,
    },
}

pub fn run() -> Result<(), Box<dyn Error>> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Lookup {
            text,
            input_file,
            input_lang,
            output_lang,
            lang,
            term_types,
            show_summaries,
            rendered,
            base_url,
            dry_run,
        } => {
            let raw_text = read_input(text, input_file)?;
            let rendered = rendered.unwrap_or_else(|| raw_text.clone());
            let page = finder_page(&input_lang, &output_lang, &term_types, &rendered);
            let flag = if show_summaries { "true" } else { "false" };
            let payload = build_payload(&page, &raw_text, &lang, flag)?;
            let form = SyntheticForm::for_lookup(payload);
            send_or_print(form, &base_url, dry_run, cli.json)
        }
        Command::Reset {
            language,
            base_url,
            dry_run,
        } => {
            let mut page = PageSnapshot::finder_template();
            let payload = reset_page(&mut page, &language)?;
            let form = SyntheticForm::for_lookup(payload);
            send_or_print(form, &base_url, dry_run, cli.json)
        }
        Command::Site {
            language,
            base_url,
            dry_run,
        } => send_or_print(SyntheticForm::for_site(&language), &base_url, dry_run, cli.json),
        Command::Export {
            text,
            input_file,
            dir,
            prefix,
        } => {
            let text = read_input(text, input_file)?;
            handle_export(&prefix, &text, dir, cli.json)
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_input(text: Option<String>, input_file: Option<PathBuf>) -> Result<String, Box<dyn Error>> {
    match input_file {
        Some(path) => fs::read_to_string(&path)
            .map_err(|err| format!("Failed to read {}: {err}", path.display()).into()),
        None => Ok(text.unwrap_or_default()),
    }
}

/// Builds the snapshot of the page this submission would run against:
/// canonical term-type options first, extra codes appended in the order
/// given, selectors and the annotated region set from the flags.
fn finder_page(
    input_lang: &str,
    output_lang: &str,
    term_types: &[String],
    rendered: &str,
) -> PageSnapshot {
    let mut page = PageSnapshot::finder_template();
    // The template declares every control, so these lookups cannot fail.
    page.selector_mut(INPUT_LANGUAGE_SELECT).unwrap().value = input_lang.to_string();
    page.selector_mut(OUTPUT_LANGUAGE_SELECT).unwrap().value = output_lang.to_string();
    let options = page.multi_select_mut(TERM_TYPES_SELECT).unwrap();
    for code in term_types {
        match options.iter_mut().find(|option| option.value == *code) {
            Some(option) => option.selected = true,
            None => options.push(SelectOption::new(code.clone(), true)),
        }
    }
    page.region_mut(ANNOTATED_REGION).unwrap().markup = rendered.to_string();
    page
}

fn send_or_print(
    form: SyntheticForm,
    base_url: &str,
    dry_run: bool,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    if dry_run {
        print_form(&form, as_json)?;
        return Ok(());
    }
    let landed = Dispatcher::new(base_url).post(form)?;
    print_landed(&landed, as_json)
}

fn print_form(form: &SyntheticForm, as_json: bool) -> Result<(), Box<dyn Error>> {
    if as_json {
        let fields: Vec<_> = form
            .fields()
            .iter()
            .map(|(name, value)| json!({ "name": name, "value": value }))
            .collect();
        let payload = json!({
            "route": form.route().path(),
            "fields": fields,
            "body": form.encoded_body(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!("POST /{}", form.route());
        for (name, value) in form.fields() {
            println!("  {name} = {value:?}");
        }
        println!("body: {}", form.encoded_body());
    }
    Ok(())
}

fn print_landed(landed: &LoadedPage, as_json: bool) -> Result<(), Box<dyn Error>> {
    if as_json {
        let payload = json!({
            "finalUrl": landed.final_url,
            "status": landed.status,
            "body": landed.body,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        eprintln!("Landed on {} ({})", landed.final_url, landed.status);
        println!("{}", landed.body);
    }
    Ok(())
}

fn handle_export(
    prefix: &str,
    text: &str,
    dir: PathBuf,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let written = export_terms(prefix, text, &dir)?;
    if as_json {
        let payload = json!({
            "exported": written.is_some(),
            "path": written.as_ref().map(|path| path.display().to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        match written {
            Some(path) => println!("Exported to {}", path.display()),
            None => println!("Nothing to export."),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use decsfinder_rs::TERM_TYPE_OPTIONS;

    #[test]
    fn lookup_defaults_model_an_unannotated_page() {
        let cli = Cli::try_parse_from(["decsfinder-rs", "lookup", "diabetes"]).expect("parse");
        let Command::Lookup {
            text,
            input_lang,
            output_lang,
            lang,
            term_types,
            show_summaries,
            rendered,
            dry_run,
            ..
        } = cli.command
        else {
            panic!("expected a lookup command");
        };
        assert_eq!(text.as_deref(), Some("diabetes"));
        assert_eq!(input_lang, ALL_LANGUAGES);
        assert_eq!(output_lang, ALL_LANGUAGES);
        assert_eq!(lang, "en");
        assert!(term_types.is_empty());
        assert!(!show_summaries);
        assert!(rendered.is_none());
        assert!(!dry_run);
    }

    #[test]
    fn text_and_input_file_are_mutually_exclusive() {
        let result = Cli::try_parse_from([
            "decsfinder-rs",
            "lookup",
            "diabetes",
            "--input-file",
            "terms.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn finder_page_keeps_canonical_option_order_and_appends_extras() {
        let selected = ["QD".to_string(), "PA".to_string(), "DE".to_string()];
        let page = finder_page("es", "pt", &selected, "");
        let options = page.multi_select(TERM_TYPES_SELECT).expect("options");
        let declared: Vec<_> = options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(declared, vec!["DE", "QD", "PA"]);
        assert!(options.iter().all(|option| option.selected));
        // Selections read back in declaration order, not flag order.
        let selections = page.selections().expect("selections");
        assert_eq!(selections.term_types, vec!["DE", "QD", "PA"]);
        assert_eq!(selections.input_language, "es");
        assert_eq!(selections.output_language, "pt");
    }

    #[test]
    fn lookup_page_feeds_the_payload_builder() {
        let page = finder_page("en", "en", &[], "plain rendered text");
        let payload = build_payload(&page, "ignored", "pt", "false").expect("payload");
        // No annotation marker, so the rendered region is authoritative.
        assert_eq!(payload.input_text, "plain rendered text");
        assert_eq!(payload.lang, "pt");
    }

    #[test]
    fn missing_text_defaults_to_an_empty_lookup() {
        assert_eq!(read_input(None, None).expect("read"), "");
    }

    #[test]
    fn unreadable_input_file_is_an_error() {
        let err = read_input(None, Some(PathBuf::from("/nonexistent/terms.txt"))).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read"));
    }

    #[test]
    fn template_codes_stay_in_sync_with_the_page() {
        let page = finder_page(ALL_LANGUAGES, ALL_LANGUAGES, &[], "");
        let declared: Vec<_> = page
            .multi_select(TERM_TYPES_SELECT)
            .expect("options")
            .iter()
            .map(|o| o.value.as_str())
            .collect();
        assert_eq!(declared, TERM_TYPE_OPTIONS);
    }
}
