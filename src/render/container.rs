use super::Element;

pub const RESULTS_ID: &str = "results";
pub const ERROR_CLASS: &str = "results_error";

/// The results region of a page: rendered items appended in arrival order,
/// plus an error slot shown when a page load fails.
#[derive(Clone, Debug, Default)]
pub struct ResultsContainer {
    markup: String,
    appended: usize,
    error: Option<String>,
}

impl ResultsContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from markup already present on the page (the initial window).
    pub fn with_initial_markup(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            ..Self::default()
        }
    }

    pub fn append(&mut self, element: &Element) {
        element.write_html(&mut self.markup);
        self.appended += 1;
    }

    pub fn appended(&self) -> usize {
        self.appended
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Serializes the whole region, error notice included.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("<div id=\"{RESULTS_ID}\">"));
        out.push_str(&self.markup);
        out.push_str("</div>");
        if let Some(error) = self.error.as_deref() {
            Element::new("p")
                .attr("class", ERROR_CLASS)
                .text(error)
                .write_html(&mut out);
        }
        out
    }
}
