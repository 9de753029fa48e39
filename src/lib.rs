pub mod dispatch;
pub mod export;
pub mod page;

use serde::Serialize;

use page::{
    ANNIF_REGION, ANNOTATED_REGION, INPUT_LANGUAGE_SELECT, OUTPUT_LANGUAGE_SELECT, SUMMARY_REGION,
};
pub use page::{FieldSelections, PageError, PageSnapshot};

/// Sentinel the language selectors carry when no specific language is chosen.
pub const ALL_LANGUAGES: &str = "All languages";
/// Term-type codes the finder page declares, in option order.
pub const TERM_TYPE_OPTIONS: &[&str] = &["DE", "QD"];
/// Marker the server wraps around recognized terms in the rendered region.
pub const TOOLTIP_MARKER: &str = "tooltip-link";
/// Separator for the multi-valued term-type field.
pub const TERM_TYPE_SEPARATOR: &str = "|";

/// Which of the two candidate text buffers a submission transmits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    /// The raw typed buffer, chosen while the rendered region still carries
    /// server annotations.
    RawInput,
    /// The rendered region content, markup and all, chosen once the region
    /// shows no annotations (the user has been editing it in place).
    RenderedRegion,
}

/// Picks the authoritative buffer for a submission by scanning the rendered
/// region's markup for the annotation marker.
pub fn authoritative_source(rendered_markup: &str) -> TextSource {
    if rendered_markup.contains(TOOLTIP_MARKER) {
        TextSource::RawInput
    } else {
        TextSource::RenderedRegion
    }
}

// The page inlines the raw value into a backtick-quoted context, so embedded
// backticks would truncate it; they travel as plain apostrophes instead.
fn sanitize_raw_text(raw: &str) -> String {
    raw.replace('`', "'")
}

/// A flag is on only when it is exactly the string "true". Every other shape
/// the caller might hand over ("True", "1", empty) is off.
pub fn flag_is_true(flag: &str) -> bool {
    flag == "true"
}

/// The seven-field record a lookup submission carries.
///
/// Built fresh for each submission, consumed by the dispatcher, never reused.
/// Serialized names match the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupPayload {
    #[serde(rename = "inputLang")]
    pub input_lang: String,
    #[serde(rename = "outLang")]
    pub out_lang: String,
    #[serde(rename = "inputText")]
    pub input_text: String,
    #[serde(rename = "termTypes")]
    pub term_types: Vec<String>,
    pub lang: String,
    #[serde(rename = "isFirstLoad")]
    pub is_first_load: bool,
    #[serde(rename = "showSR")]
    pub show_sr: bool,
}

impl LookupPayload {
    /// Joins the term-type codes for the wire: N codes, exactly N-1
    /// separators, no leading or trailing one. Empty selection yields the
    /// empty string.
    pub fn term_types_field(&self) -> String {
        self.term_types.join(TERM_TYPE_SEPARATOR)
    }
}

/// Builds the submission payload from the current page snapshot.
///
/// `raw_text` is the text the user originally typed; `display_language`
/// drives the result page chrome; `show_sr_flag` is accepted in whatever
/// shape the caller has and normalized strictly.
pub fn build_payload(
    page: &PageSnapshot,
    raw_text: &str,
    display_language: &str,
    show_sr_flag: &str,
) -> Result<LookupPayload, PageError> {
    let rendered = &page.region(ANNOTATED_REGION)?.markup;
    let input_text = match authoritative_source(rendered) {
        TextSource::RawInput => sanitize_raw_text(raw_text),
        TextSource::RenderedRegion => rendered.clone(),
    };
    let selections = page.selections()?;
    Ok(LookupPayload {
        input_lang: selections.input_language,
        out_lang: selections.output_language,
        input_text,
        term_types: selections.term_types,
        lang: display_language.to_string(),
        is_first_load: false,
        show_sr: flag_is_true(show_sr_flag),
    })
}

/// Clears the rendered regions, re-arms them for editing, rewinds the
/// language selectors, and rebuilds the submission with the input text forced
/// empty, so the page can re-request a fresh language-scoped rendering.
pub fn reset_page(page: &mut PageSnapshot, language: &str) -> Result<LookupPayload, PageError> {
    page.selector_mut(INPUT_LANGUAGE_SELECT)?.value = ALL_LANGUAGES.to_string();
    page.selector_mut(OUTPUT_LANGUAGE_SELECT)?.value = language.to_string();
    for id in [ANNOTATED_REGION, ANNIF_REGION] {
        let region = page.region_mut(id)?;
        region.markup.clear();
        region.editable = true;
    }
    page.region_mut(SUMMARY_REGION)?.markup.clear();
    build_payload(page, "", language, "false")
}
