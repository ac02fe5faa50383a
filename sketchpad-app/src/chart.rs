//! Probability bar chart rendered as plain DOM elements.

use sketchpad_core::{ChartViewModel, NUM_CLASSES};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::error::{AppError, AppResult};

const WINNER_BAR: &str = "winner-bar";
const WINNER_TEXT: &str = "winner-text";

struct ChartRow {
    label: HtmlElement,
    fill: HtmlElement,
}

/// Ten labelled bars inside a container element.
pub struct ChartView {
    rows: Vec<ChartRow>,
}

impl ChartView {
    /// Build the rows under `container`, replacing its children.
    ///
    /// # Errors
    ///
    /// Returns an error if element creation fails.
    pub fn mount(document: &Document, container: &Element) -> AppResult<Self> {
        container.set_inner_html("");
        let mut rows = Vec::with_capacity(NUM_CLASSES);

        for digit in 0..NUM_CLASSES {
            let row = create(document, "div", "chart-row")?;
            let label = create(document, "span", "digit-label")?;
            label.set_text_content(Some(&digit.to_string()));
            let track = create(document, "div", "bar-track")?;
            let fill = create(document, "div", "bar-fill")?;

            track.append_child(&fill).map_err(|e| AppError::dom(&e))?;
            row.append_child(&label).map_err(|e| AppError::dom(&e))?;
            row.append_child(&track).map_err(|e| AppError::dom(&e))?;
            container.append_child(&row).map_err(|e| AppError::dom(&e))?;

            rows.push(ChartRow { label, fill });
        }

        Ok(Self { rows })
    }

    /// Apply a view model: bar widths plus winner highlighting.
    pub fn render(&self, model: &ChartViewModel) {
        for (row, bar) in self.rows.iter().zip(&model.rows) {
            let _ = row
                .fill
                .style()
                .set_property("width", &format!("{:.1}%", bar.width_percent()));
            let _ = row
                .fill
                .class_list()
                .toggle_with_force(WINNER_BAR, bar.is_winner);
            let _ = row
                .label
                .class_list()
                .toggle_with_force(WINNER_TEXT, bar.is_winner);
        }
    }
}

fn create(document: &Document, tag: &str, class: &str) -> AppResult<HtmlElement> {
    let element = document
        .create_element(tag)
        .map_err(|e| AppError::dom(&e))?
        .dyn_into::<HtmlElement>()
        .map_err(|_| AppError::WrongElement(tag.to_string(), "HtmlElement"))?;
    element.set_class_name(class);
    Ok(element)
}
