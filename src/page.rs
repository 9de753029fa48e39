use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use crate::ALL_LANGUAGES;

/// Element id of the source-language selector.
pub const INPUT_LANGUAGE_SELECT: &str = "inputTextLanguage";
/// Element id of the output-language selector.
pub const OUTPUT_LANGUAGE_SELECT: &str = "outputTextLanguage";
/// Element id of the term-type multi-select.
pub const TERM_TYPES_SELECT: &str = "termTypes";
/// Element id of the editable region showing the annotated lookup text.
pub const ANNOTATED_REGION: &str = "textWithTooltips";
/// Element id of the editable region showing automated-indexing results.
pub const ANNIF_REGION: &str = "textWithTooltipsAnnif";
/// Element id of the summary panel.
pub const SUMMARY_REGION: &str = "superResumos";

/// One control on the finder page, keyed in the snapshot by its element id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// Single-choice dropdown.
    Selector(SelectorState),
    /// Multi-choice list; options keep their declaration order.
    MultiSelect(Vec<SelectOption>),
    /// Rich-text region holding rendered markup.
    Region(RegionState),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectorState {
    pub value: String,
}

impl SelectorState {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub selected: bool,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            selected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegionState {
    pub markup: String,
    pub editable: bool,
}

/// A control lookup that did not resolve the way the caller expected.
///
/// Both variants mean the snapshot no longer matches the page layout this
/// controller was written against, so callers treat them as fatal instead of
/// falling back to defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    MissingControl { id: String },
    ControlKind { id: String, expected: &'static str },
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageError::MissingControl { id } => write!(f, "page control #{id} is missing"),
            PageError::ControlKind { id, expected } => {
                write!(f, "page control #{id} is not a {expected}")
            }
        }
    }
}

impl Error for PageError {}

/// The language selectors and term-type choices a submission reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelections {
    pub input_language: String,
    pub output_language: String,
    pub term_types: Vec<String>,
}

/// Snapshot of the finder page's controls, replacing live element access.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageSnapshot {
    controls: BTreeMap<String, Control>,
}

impl PageSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The finder page as first rendered: both language selectors on the
    /// "All languages" sentinel, no term-type selection, empty regions with
    /// the text areas armed for editing.
    pub fn finder_template() -> Self {
        let mut page = Self::new();
        page.insert(
            INPUT_LANGUAGE_SELECT,
            Control::Selector(SelectorState::new(ALL_LANGUAGES)),
        );
        page.insert(
            OUTPUT_LANGUAGE_SELECT,
            Control::Selector(SelectorState::new(ALL_LANGUAGES)),
        );
        page.insert(
            TERM_TYPES_SELECT,
            Control::MultiSelect(
                crate::TERM_TYPE_OPTIONS
                    .iter()
                    .map(|code| SelectOption::new(*code, false))
                    .collect(),
            ),
        );
        page.insert(
            ANNOTATED_REGION,
            Control::Region(RegionState {
                markup: String::new(),
                editable: true,
            }),
        );
        page.insert(
            ANNIF_REGION,
            Control::Region(RegionState {
                markup: String::new(),
                editable: true,
            }),
        );
        page.insert(SUMMARY_REGION, Control::Region(RegionState::default()));
        page
    }

    pub fn insert(&mut self, id: impl Into<String>, control: Control) {
        self.controls.insert(id.into(), control);
    }

    pub fn control(&self, id: &str) -> Result<&Control, PageError> {
        self.controls.get(id).ok_or_else(|| PageError::MissingControl { id: id.to_string() })
    }

    fn control_mut(&mut self, id: &str) -> Result<&mut Control, PageError> {
        self.controls
            .get_mut(id)
            .ok_or_else(|| PageError::MissingControl { id: id.to_string() })
    }

    pub fn selector(&self, id: &str) -> Result<&SelectorState, PageError> {
        match self.control(id)? {
            Control::Selector(state) => Ok(state),
            _ => Err(PageError::ControlKind {
                id: id.to_string(),
                expected: "selector",
            }),
        }
    }

    pub fn selector_mut(&mut self, id: &str) -> Result<&mut SelectorState, PageError> {
        match self.control_mut(id)? {
            Control::Selector(state) => Ok(state),
            _ => Err(PageError::ControlKind {
                id: id.to_string(),
                expected: "selector",
            }),
        }
    }

    pub fn multi_select(&self, id: &str) -> Result<&[SelectOption], PageError> {
        match self.control(id)? {
            Control::MultiSelect(options) => Ok(options),
            _ => Err(PageError::ControlKind {
                id: id.to_string(),
                expected: "multi-select",
            }),
        }
    }

    pub fn multi_select_mut(&mut self, id: &str) -> Result<&mut Vec<SelectOption>, PageError> {
        match self.control_mut(id)? {
            Control::MultiSelect(options) => Ok(options),
            _ => Err(PageError::ControlKind {
                id: id.to_string(),
                expected: "multi-select",
            }),
        }
    }

    pub fn region(&self, id: &str) -> Result<&RegionState, PageError> {
        match self.control(id)? {
            Control::Region(state) => Ok(state),
            _ => Err(PageError::ControlKind {
                id: id.to_string(),
                expected: "region",
            }),
        }
    }

    pub fn region_mut(&mut self, id: &str) -> Result<&mut RegionState, PageError> {
        match self.control_mut(id)? {
            Control::Region(state) => Ok(state),
            _ => Err(PageError::ControlKind {
                id: id.to_string(),
                expected: "region",
            }),
        }
    }

    /// Reads the language selectors and the chosen term types.
    ///
    /// Term types come back in the order the options are declared, not the
    /// order the user picked them.
    pub fn selections(&self) -> Result<FieldSelections, PageError> {
        let input_language = self.selector(INPUT_LANGUAGE_SELECT)?.value.clone();
        let output_language = self.selector(OUTPUT_LANGUAGE_SELECT)?.value.clone();
        let term_types = self
            .multi_select(TERM_TYPES_SELECT)?
            .iter()
            .filter(|option| option.selected)
            .map(|option| option.value.clone())
            .collect();
        Ok(FieldSelections {
            input_language,
            output_language,
            term_types,
        })
    }
}
